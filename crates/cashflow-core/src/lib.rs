//! cashflow-core
//!
//! Recurrence expansion and balance forecasting for the cashflow planner.
//! Depends on cashflow-domain. No CLI, no terminal I/O, no file access: persistence
//! is reached through the traits in [`storage`].

pub mod confirmation_service;
pub mod dashboard_service;
pub mod error;
pub mod forecast_service;
pub mod occurrence;
pub mod overlay;
pub mod public_api;
pub mod reconciliation_service;
pub mod recurrence_service;
pub mod rule_service;
pub mod storage;
pub mod time;


pub use confirmation_service::*;
pub use dashboard_service::*;
pub use error::CoreError;
pub use forecast_service::*;
pub use public_api::*;
pub use reconciliation_service::*;
pub use recurrence_service::*;
pub use rule_service::*;
pub use storage::{
    AccountQuery, AccountStore, CategoryStore, ExceptionStore, PlannerData, PlannerStore,
    ReconciliationStore, RuleStore, Transactional,
};
pub use time::{Clock, FixedClock, SystemClock};
