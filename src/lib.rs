//! Library lending application
//!
//! Book and user modules on top of the kernel/http crates, with the lending
//! rule engine in [`modules::books::rules`].

use std::sync::Arc;

use anyhow::Context;
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub mod modules;
pub mod utils;

pub use modules::books::rules::LendingRules;
pub use modules::LibraryServices;

/// Register modules, run their lifecycle and serve HTTP until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let services = LibraryServices::in_memory(&settings, Arc::new(utils::SystemClock));

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &services).context("failed to register modules")?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = library_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
