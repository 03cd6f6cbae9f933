//! cashflow-config
//!
//! Persistent planner preferences: default currency, data file location, the
//! active user and the window limits applied by frontends.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, PlannerLimits};
