//! Optional subscriber setup for hosts that want gitstamp's own logs.
//!
//! Collection emits debug events under the `gitstamp` target when a guarded
//! query fails, and wraps `extract` and `ancestors` in spans. Hosts that
//! already install a subscriber can ignore this module.

use std::env;

use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use super::metrics::GLOBAL_METRICS;

/// Extra filter directives appended by [`TelemetryConfig::with_env`].
pub const LOG_ENV: &str = "GITSTAMP_LOG";

/// Target of the guarded-query failure events.
const QUERY_TARGET: &str = "gitstamp::util::attempt";

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
}

/// How gitstamp's events reach the terminal.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level for the `gitstamp` target
    pub level: LevelFilter,
    /// Level for every other target
    pub others: LevelFilter,
    /// Show failed VCS queries even when `level` is above debug
    pub query_failures: bool,
    /// Emit the elapsed time when an `extract` or `ancestors` span closes
    pub operation_timings: bool,
    pub format: LogFormat,
    pub ansi: bool,
    /// Log the query metrics report when the guard drops
    pub report_on_drop: bool,
    /// Appended verbatim to the generated directives
    pub extra_directives: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            others: LevelFilter::WARN,
            query_failures: false,
            operation_timings: false,
            format: LogFormat::Compact,
            ansi: true,
            report_on_drop: false,
            extra_directives: None,
        }
    }
}

impl TelemetryConfig {
    /// Everything gitstamp knows: failed queries, operation timings and a
    /// metrics report on exit.
    pub fn debugging() -> Self {
        Self {
            level: LevelFilter::DEBUG,
            query_failures: true,
            operation_timings: true,
            format: LogFormat::Full,
            report_on_drop: true,
            ..Self::default()
        }
    }

    /// Only warnings from gitstamp, errors from the rest.
    pub fn quiet() -> Self {
        Self {
            level: LevelFilter::WARN,
            others: LevelFilter::ERROR,
            ansi: false,
            ..Self::default()
        }
    }

    /// Pick up extra directives from `GITSTAMP_LOG`, if set and non-empty.
    pub fn with_env(mut self) -> Self {
        if let Ok(value) = env::var(LOG_ENV) {
            if !value.trim().is_empty() {
                self.extra_directives = Some(value);
            }
        }
        self
    }

    /// The filter directives this configuration installs.
    pub fn directives(&self) -> String {
        let mut directives = format!("{},gitstamp={}", self.others, self.level);
        if self.query_failures && self.level < LevelFilter::DEBUG {
            directives.push_str(&format!(",{}=debug", QUERY_TARGET));
        }
        if let Some(ref extra) = self.extra_directives {
            directives.push(',');
            directives.push_str(extra);
        }
        directives
    }

    /// Parse [`directives`](Self::directives) into a filter.
    pub fn filter(&self) -> anyhow::Result<EnvFilter> {
        Ok(EnvFilter::try_new(self.directives())?)
    }
}

/// Returned by [`init_telemetry`]; hold it for the lifetime of the process.
#[must_use = "dropping the guard ends the session and emits the metrics report"]
pub struct TelemetryGuard {
    report_on_drop: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.report_on_drop {
            info!(target: "gitstamp::telemetry", "\n{}", GLOBAL_METRICS.snapshot().format_report());
        }
    }
}

/// Install a global fmt subscriber for gitstamp's events.
///
/// Fails on an unparsable directive or when a global subscriber is already set.
///
/// # Example
///
/// ```rust,ignore
/// use gitstamp::telemetry::{init_telemetry, TelemetryConfig};
///
/// fn main() -> anyhow::Result<()> {
///     let _guard = init_telemetry(&TelemetryConfig::debugging().with_env())?;
///     let info = gitstamp::extract_metadata(None);
///     Ok(())
/// }
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = config.filter()?;

    let span_events = if config.operation_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi)
        .with_target(true)
        .with_span_events(span_events);
    let fmt_layer = match config.format {
        LogFormat::Compact => fmt_layer.compact().boxed(),
        LogFormat::Full => fmt_layer.boxed(),
    };

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(filter).with(fmt_layer))?;

    Ok(TelemetryGuard {
        report_on_drop: config.report_on_drop,
    })
}
