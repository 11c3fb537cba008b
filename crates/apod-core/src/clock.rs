// # Publisher Clock
//
// The publisher rolls over to a new day at its own local midnight, not the
// caller's. A device in UTC+9 reaches "tomorrow" hours before the publisher
// has anything for it, so every date decision goes through a ClockResolver.
//
// The reference offset is fixed (no DST handling): UTC-04:00 by default.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::{Error, Result};

/// Default publisher offset from UTC, in seconds (UTC-04:00)
pub const DEFAULT_UTC_OFFSET_SECS: i32 = -4 * 60 * 60;

const DEFAULT_OFFSET: FixedOffset = match FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("default publisher offset out of range"),
};

/// Source of the publisher's current valid date
///
/// Implementations must re-evaluate on every call; real time advances and a
/// long-lived process crosses day boundaries.
pub trait ClockResolver: Send + Sync {
    /// The latest date the publisher can have content for
    fn current_valid_date(&self) -> NaiveDate;
}

/// Clock that reads the system time in the publisher's fixed offset
///
/// # Example
///
/// ```rust
/// use apod_core::clock::{ClockResolver, PublisherClock};
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// // 02:00 UTC is still the previous evening at UTC-04:00
/// let instant = Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap();
/// let clock = PublisherClock::default().at(instant);
///
/// assert_eq!(clock.current_valid_date(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PublisherClock {
    offset: FixedOffset,
    reference: Option<DateTime<Utc>>,
}

impl PublisherClock {
    /// Create a clock for the given offset east of UTC, in seconds
    ///
    /// Fails when the offset is outside ±24 hours.
    pub fn new(utc_offset_secs: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_secs).ok_or_else(|| {
            Error::config(format!("Invalid publisher UTC offset: {}s", utc_offset_secs))
        })?;

        Ok(Self {
            offset,
            reference: None,
        })
    }

    /// Pin the clock to a reference instant instead of the system time
    pub fn at(mut self, instant: DateTime<Utc>) -> Self {
        self.reference = Some(instant);
        self
    }

    /// The publisher offset in use
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn now(&self) -> DateTime<Utc> {
        self.reference.unwrap_or_else(Utc::now)
    }
}

impl Default for PublisherClock {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            reference: None,
        }
    }
}

impl ClockResolver for PublisherClock {
    fn current_valid_date(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }
}

/// Clock that always reports the same date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl ClockResolver for FixedClock {
    fn current_valid_date(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_before_publisher_midnight() {
        // 03:59 UTC = 23:59 the previous day at UTC-4
        let instant = Utc.with_ymd_and_hms(2024, 6, 2, 3, 59, 0).unwrap();
        let clock = PublisherClock::default().at(instant);
        assert_eq!(clock.current_valid_date(), day(2024, 6, 1));
    }

    #[test]
    fn test_at_publisher_midnight() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 2, 4, 0, 0).unwrap();
        let clock = PublisherClock::default().at(instant);
        assert_eq!(clock.current_valid_date(), day(2024, 6, 2));
    }

    #[test]
    fn test_custom_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        let tokyo = PublisherClock::new(9 * 3600).unwrap().at(instant);
        assert_eq!(tokyo.current_valid_date(), day(2025, 1, 1));
        assert_eq!(tokyo.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_invalid_offset() {
        assert!(PublisherClock::new(25 * 3600).is_err());
    }

    #[test]
    fn test_default_offset() {
        assert_eq!(
            PublisherClock::default().offset().local_minus_utc(),
            DEFAULT_UTC_OFFSET_SECS
        );
    }

    #[test]
    fn test_unpinned_clock_tracks_system_time() {
        let clock = PublisherClock::default();
        let expected = Utc::now().with_timezone(&clock.offset()).date_naive();
        let got = clock.current_valid_date();
        // Tolerate a day rollover between the two reads
        assert!(got == expected || got == expected.succ_opt().unwrap());
    }

    #[test]
    fn test_fixed_clock() {
        let clock: Box<dyn ClockResolver> = Box::new(FixedClock(day(2024, 1, 15)));
        assert_eq!(clock.current_valid_date(), day(2024, 1, 15));
    }
}
