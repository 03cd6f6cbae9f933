pub mod build_info;

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "cashflow=info,cashflow_core=info,cashflow_storage_json=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr so command output on stdout stays machine readable.
/// Call through [`crate::init`], which runs this once per process.
pub(crate) fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn second_install_is_ignored() {
        super::init_tracing();
        super::init_tracing();
        tracing::info!("still logging");
    }
}
