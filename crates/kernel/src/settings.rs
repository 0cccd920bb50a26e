use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBRARY_ENV";
const CONFIG_DIR_ENV: &str = "LIBRARY_CONFIG_DIR";
const ENV_PREFIX: &str = "LIBRARY";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub lending: LendingSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from `config_dir` for the named environment.
    ///
    /// Sources, later ones winning: `base.toml`, `{environment}.toml`, then
    /// `LIBRARY_*` variables using `__` between nested keys
    /// (`LIBRARY_LENDING__LOAN_PERIOD_DAYS=21`).
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = parsed_environment;
        settings.lending.validate()?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Policy knobs for lending, penalties and depreciation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LendingSettings {
    /// Days between lending a book and its devolution date.
    #[serde(default = "LendingSettings::default_loan_period_days")]
    pub loan_period_days: i64,
    /// Late months that are not charged.
    #[serde(default = "LendingSettings::default_penalty_grace_months")]
    pub penalty_grace_months: i32,
    /// Fraction of the book cost charged per late month beyond the grace period.
    #[serde(default = "LendingSettings::default_penalty_monthly_rate")]
    pub penalty_monthly_rate: Decimal,
    /// Fraction of the book cost lost per calendar year since its edition.
    #[serde(default = "LendingSettings::default_depreciation_per_year")]
    pub depreciation_per_year: Decimal,
}

impl LendingSettings {
    fn default_loan_period_days() -> i64 {
        14
    }

    fn default_penalty_grace_months() -> i32 {
        6
    }

    fn default_penalty_monthly_rate() -> Decimal {
        Decimal::new(10, 2)
    }

    fn default_depreciation_per_year() -> Decimal {
        Decimal::new(1, 2)
    }

    /// Reject policies that would produce negative periods or rates.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.loan_period_days <= 0 {
            return Err(anyhow!(
                "lending.loan_period_days must be positive, got {}",
                self.loan_period_days
            ));
        }
        if self.penalty_grace_months < 0 {
            return Err(anyhow!(
                "lending.penalty_grace_months must not be negative, got {}",
                self.penalty_grace_months
            ));
        }
        if self.penalty_monthly_rate.is_sign_negative() {
            return Err(anyhow!(
                "lending.penalty_monthly_rate must not be negative, got {}",
                self.penalty_monthly_rate
            ));
        }
        if self.depreciation_per_year.is_sign_negative() {
            return Err(anyhow!(
                "lending.depreciation_per_year must not be negative, got {}",
                self.depreciation_per_year
            ));
        }
        Ok(())
    }
}

impl Default for LendingSettings {
    fn default() -> Self {
        Self {
            loan_period_days: Self::default_loan_period_days(),
            penalty_grace_months: Self::default_penalty_grace_months(),
            penalty_monthly_rate: Self::default_penalty_monthly_rate(),
            depreciation_per_year: Self::default_depreciation_per_year(),
        }
    }
}
