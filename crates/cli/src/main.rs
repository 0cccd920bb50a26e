use anyhow::Context;
use clap::{Parser, Subcommand};
use library_app::modules::books::models::Book;
use library_app::modules::users::models::User;
use library_app::utils::{Clock, SystemClock};
use library_app::LendingRules;
use library_kernel::settings::Settings;
use rust_decimal::Decimal;
use time::{macros::format_description, Date};

#[derive(Debug, Parser)]
#[command(name = "library-cli", version, about = "Library lending service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the resolved settings
    Settings,
    /// Quote the late-return penalty for one book
    Penalty {
        /// Book cost
        #[arg(long)]
        cost: Decimal,
        /// Devolution date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: Date,
        /// Reference date, defaults to today (UTC)
        #[arg(long, value_parser = parse_date)]
        today: Option<Date>,
        /// Quote for a user who is not punished
        #[arg(long)]
        pardoned: bool,
    },
    /// Quote the depreciated cost of a book
    Depreciate {
        /// Book cost
        #[arg(long)]
        cost: Decimal,
        /// Edition date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        edition: Date,
        /// Reference date, defaults to today (UTC)
        #[arg(long, value_parser = parse_date)]
        today: Option<Date>,
    },
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load library settings")?;

    match cli.command {
        Command::Serve => {
            library_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "starting library server from CLI");

            let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            runtime.block_on(library_app::run(settings))?;
        }
        Command::Settings => {
            println!("{:#?}", settings);
        }
        Command::Penalty {
            cost,
            due,
            today,
            pardoned,
        } => {
            let rules = LendingRules::new(settings.lending);
            let user = User {
                is_punished: !pardoned,
                ..User::new("cli")
            };
            let book = Book {
                cost: Some(cost),
                is_borrowed: Some(true),
                devolution_date: Some(due),
                user: Some(user.clone()),
                ..Book::new("quote", "cli")
            };

            let today = today.unwrap_or_else(|| SystemClock.today());
            let penalty = rules.penalty_for(&user, &[book], today)?;
            println!("{}", penalty.normalize());
        }
        Command::Depreciate {
            cost,
            edition,
            today,
        } => {
            let rules = LendingRules::new(settings.lending);
            let book = Book {
                cost: Some(cost),
                year_edition: Some(edition),
                ..Book::new("quote", "cli")
            };

            let today = today.unwrap_or_else(|| SystemClock.today());
            let cost = rules.depreciated_cost(&book, today)?;
            println!("{}", cost.normalize());
        }
    }

    Ok(())
}
