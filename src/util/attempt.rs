//! Failure containment for best-effort queries
//!
//! Every fallible metadata query goes through [`attempt`] or
//! [`attempt_named`], so one unavailable fact turns into `None` instead of
//! aborting the whole extraction or reaching the host application.

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;
#[cfg(feature = "telemetry")]
use std::time::Instant;

/// Run `op`, turning any error or panic into `None`.
///
/// ```
/// use gitstamp::util::attempt;
///
/// assert_eq!(attempt(|| Ok::<_, String>("ok")), Some("ok"));
/// assert_eq!(attempt(|| Err::<&str, _>("boom")), None);
/// ```
pub fn attempt<T, E, F>(op: F) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(_)) | Err(_) => None,
    }
}

/// Like [`attempt`], but logs the contained failure under `name` and
/// records the outcome in the query metrics.
pub fn attempt_named<T, E, F>(name: &str, op: F) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    #[cfg(feature = "telemetry")]
    let start = Instant::now();

    let result = match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            debug!(query = name, error = %e, "query unavailable");
            None
        }
        Err(_) => {
            debug!(query = name, "query panicked");
            None
        }
    };

    #[cfg(feature = "telemetry")]
    GLOBAL_METRICS.record_query(name, start.elapsed(), result.is_some());

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_attempt_success_and_failure() {
        assert_eq!(attempt(|| Ok::<_, io::Error>("ok")), Some("ok"));
        assert_eq!(
            attempt(|| Err::<(), _>(io::Error::new(io::ErrorKind::Other, "nope"))),
            None
        );
    }

    #[test]
    fn test_attempt_handles_different_error_types() {
        let parse: Option<i32> = attempt(|| "not a number".parse::<i32>());
        assert!(parse.is_none());

        let utf8: Option<String> = attempt(|| String::from_utf8(vec![0xff, 0xfe]));
        assert!(utf8.is_none());
    }

    #[test]
    fn test_attempt_contains_panic() {
        let result: Option<u32> = attempt(|| -> Result<u32, String> { panic!("boom") });
        assert!(result.is_none());
    }

    #[test]
    fn test_attempt_named() {
        assert_eq!(attempt_named("ok_query", || Ok::<_, String>(7)), Some(7));
        assert_eq!(
            attempt_named("bad_query", || Err::<u8, _>("unavailable".to_string())),
            None
        );
    }

    #[cfg(feature = "telemetry")]
    #[test]
    fn test_attempt_named_records_metrics() {
        let _ = attempt_named("attempt_metrics_query", || Err::<(), _>("x"));
        let snapshot = GLOBAL_METRICS.snapshot();
        let metrics = snapshot
            .queries
            .get("attempt_metrics_query")
            .expect("query recorded");
        assert!(metrics.failures >= 1);
    }
}
