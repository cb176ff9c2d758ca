use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::ClientError;

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "gorb_client=debug,info"
    } else {
        "gorb_client=info,warn"
    }
}

/// Install the global subscriber: `RUST_LOG` if set, otherwise
/// [`default_filter`], formatted with targets.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), ClientError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into()))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| ClientError::Config(format!("failed to initialise logging: {e}")))
}
