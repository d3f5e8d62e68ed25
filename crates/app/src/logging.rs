//! Tracing setup for the command line host.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Crates whose per-query or per-connection chatter is only useful when asked for.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper_util=warn", "reqwest=warn"];

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Filter directive used when `RUST_LOG` is unset.
///
/// `--verbose` raises the level to debug for this crate family only; the
/// quiet targets keep their caps either way.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let mut directive = level.to_string();
    for target in QUIET_TARGETS {
        directive.push(',');
        directive.push_str(target);
    }
    directive
}

/// Installs the global subscriber. Call once, before the app is built.
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config, verbose)));
    let registry = tracing_subscriber::registry().with(env_filter);

    match LogFormat::parse(&config.format).unwrap_or(LogFormat::Pretty) {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true),
            )
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr).with_target(false))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
    }
}
