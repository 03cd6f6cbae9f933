use thiserror::Error;

use cashflow_config::ConfigError;
use cashflow_core::CoreError;
use cashflow_domain::DomainError;
use cashflow_storage_json::StorageError;

/// Failures surfaced by the command-line frontend, mapped to process exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("No user selected. Run `cashflow init` or pass --user")]
    NoUser,
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) | Self::Domain(_) | Self::NoUser => 2,
            Self::Core(CoreError::Validation(_))
            | Self::Core(CoreError::Domain(_))
            | Self::Core(CoreError::InvalidRange(_))
            | Self::Core(CoreError::RangeTooLarge { .. })
            | Self::Config(ConfigError::Invalid(_)) => 2,
            Self::Core(CoreError::Forbidden(_)) => 3,
            Self::Core(
                CoreError::RuleNotFound(_)
                | CoreError::AccountNotFound(_)
                | CoreError::CategoryNotFound(_)
                | CoreError::ReconciliationNotFound(_),
            )
            | Self::Config(ConfigError::BackupNotFound(_)) => 4,
            Self::Core(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::Io(_) => 10,
        }
    }
}

pub type CliResult<T = ()> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_usage_and_not_found_codes() {
        assert_eq!(CliError::Config(ConfigError::Invalid("locale".into())).exit_code(), 2);
        assert_eq!(
            CliError::Config(ConfigError::BackupNotFound("x.json".into())).exit_code(),
            4
        );
        assert_eq!(CliError::NoUser.exit_code(), 2);
    }
}
