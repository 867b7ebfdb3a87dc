pub use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
};

const DEFAULT_DIRECTIVE: &str = "info";

/// Span close events are only printed at debug verbosity, so per-request
/// planning time shows up without flooding the default output.
fn span_events(filter: &EnvFilter) -> FmtSpan {
    let verbose = filter.to_string().contains("debug") || filter.to_string().contains("trace");
    if verbose { FmtSpan::CLOSE } else { FmtSpan::NONE }
}

pub fn init() {
    init_with_default(DEFAULT_DIRECTIVE);
}

/// Installs the global subscriber, using `RUST_LOG` when it is set and
/// `directive` otherwise. Calling it twice is a no-op.
pub fn init_with_default(directive: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events(&env_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
