//! Wall-clock source for bid sample labels.

use chrono::{DateTime, Local};

/// Label format for bid samples (`HH:MM:SS`).
pub const SAMPLE_TIME_FORMAT: &str = "%H:%M:%S";

/// Source of local wall-clock time. Injected so tests can pin labels.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Format a wall-clock instant as a sample label.
pub fn sample_label(at: DateTime<Local>) -> String {
    at.format(SAMPLE_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_label_format() {
        let at = Local.with_ymd_and_hms(2026, 10, 17, 9, 5, 7).unwrap();
        assert_eq!(sample_label(at), "09:05:07");
    }

    #[test]
    fn test_mock_clock() {
        let at = Local.with_ymd_and_hms(2026, 10, 17, 23, 59, 58).unwrap();
        let mut clock = MockClock::new();
        clock.expect_now().times(1).return_const(at);
        assert_eq!(sample_label(clock.now()), "23:59:58");
    }

    #[test]
    fn test_system_clock_label_shape() {
        let label = sample_label(SystemClock.now());
        assert_eq!(label.len(), 8);
        assert_eq!(label.as_bytes()[2], b':');
        assert_eq!(label.as_bytes()[5], b':');
    }
}
