//! Wall clock

use jiff::{Timestamp, Zoned, civil::Date};

/// Source of the current instant and the shop's calendar date.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;

    /// Today's date in the shop's time zone.
    fn today(&self) -> Date;
}

/// The system clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn today(&self) -> Date {
        Zoned::now().date()
    }
}

/// A clock stopped at one zoned instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    at: Zoned,
}

impl FixedClock {
    #[must_use]
    pub fn new(at: Zoned) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.at.timestamp()
    }

    fn today(&self) -> Date {
        self.at.date()
    }
}

#[cfg(test)]
mod tests {
    use jiff::{
        civil::date,
        tz::{TimeZone, offset},
    };
    use testresult::TestResult;

    use super::*;

    #[test]
    fn fixed_clock_reports_local_date() -> TestResult {
        let at = date(2026, 10, 15)
            .at(0, 30, 0, 0)
            .to_zoned(TimeZone::fixed(offset(1)))?;
        let clock = FixedClock::new(at);

        assert_eq!(clock.today(), date(2026, 10, 15));
        assert_eq!(clock.now().to_string(), "2026-10-14T23:30:00Z");

        Ok(())
    }
}
