#![forbid(unsafe_code)]

//! JSON log output for production hosts.
//!
//! Overlay internals emit `tracing` events; hosts that want structured logs
//! can install this subscriber once at startup. The filter honors
//! `RUST_LOG` and falls back to `popkit=info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "popkit=info";

/// Install a global JSON subscriber.
///
/// Returns an error if a global subscriber was already set.
pub fn init_json_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::prelude::*;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
}
