//! cashflow-domain
//!
//! Pure domain models (rules, exceptions, instances, accounts, categories, reconciliations).
//! No I/O, no CLI, no storage. Only data types, validation and calendar helpers.

pub mod account;
pub mod category;
pub mod common;
pub mod error;
pub mod exception;
pub mod instance;
pub mod money;
pub mod reconciliation;
pub mod rule;
pub mod window;

pub use account::*;
pub use category::*;
pub use common::*;
pub use error::DomainError;
pub use exception::*;
pub use instance::*;
pub use money::*;
pub use reconciliation::*;
pub use rule::*;
pub use window::*;
