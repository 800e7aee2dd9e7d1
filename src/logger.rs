//! Tracing subscriber for the calibration binary.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

const DEFAULT_FILTER: &str = "info";
const VERBOSE_FILTER: &str = "debug";

pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// `--verbose` on the command line; `RUST_LOG` still takes precedence.
pub fn init_verbose() {
    init_with_default(VERBOSE_FILTER);
}

/// Installs the global subscriber, reading `RUST_LOG` first and falling back
/// to `default_filter`.
///
/// At debug level and below every closed span is reported with its duration,
/// which gives a per-capture and per-band timing trace of the flight.
pub fn init_with_default(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let span_events = if reports_spans(&env_filter) {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    // Already installed (tests, embedding): keep the existing one.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn reports_spans(filter: &EnvFilter) -> bool {
    let directives = filter.to_string();
    directives.contains("debug") || directives.contains("trace")
}
