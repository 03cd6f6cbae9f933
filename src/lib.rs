#![doc(test(attr(deny(warnings))))]

//! Cashflow bundles the planner crates (domain model, forecasting engine, JSON
//! store and configuration) behind one facade and a command-line frontend.

pub mod cli;
pub mod errors;
pub mod utils;

pub use cashflow_config as config;
pub use cashflow_core as planner;
pub use cashflow_domain as domain;
pub use cashflow_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!(version = utils::build_info::CLI_VERSION, "cashflow tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }
}
