use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Source of "now" for prompt context. Injectable so tests can supply
/// fixed instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// Wall clock pinned to a reference timezone.
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Los_Angeles,
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Clock frozen at a fixed instant, for tests.
pub struct FixedClock(DateTime<Tz>);

impl FixedClock {
    pub fn at(instant: DateTime<Tz>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let instant = chrono_tz::America::Los_Angeles
            .with_ymd_and_hms(2025, 6, 1, 21, 45, 0)
            .unwrap();
        let clock = FixedClock::at(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_uses_reference_timezone() {
        let clock = SystemClock::new(chrono_tz::America::Los_Angeles);
        assert_eq!(clock.now().timezone(), chrono_tz::America::Los_Angeles);
    }
}
