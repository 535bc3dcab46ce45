//! Reminder look-ahead window

use chrono::{DateTime, TimeDelta, Utc};

use crate::shared::errors::DomainError;

/// Largest accepted look-ahead: ten years
pub const MAX_REMINDER_HOURS: i64 = 87_600;

/// Time range used to select reminder-eligible bookings.
///
/// For a look-ahead of `hours`, the naive window is
/// `[now + (hours - 1)h, now + (hours + 1)h]`. Bookings that already started
/// are never eligible, so the effective lower bound is clamped to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub now: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReminderWindow {
    /// Fails for a negative look-ahead, one above [`MAX_REMINDER_HOURS`], or
    /// one whose bounds fall outside the representable date range.
    pub fn new(now: DateTime<Utc>, hours: i64) -> Result<Self, DomainError> {
        if !(0..=MAX_REMINDER_HOURS).contains(&hours) {
            return Err(DomainError::Validation(format!(
                "Reminder hours must be between 0 and {}",
                MAX_REMINDER_HOURS
            )));
        }
        let offset = |h: i64| {
            TimeDelta::try_hours(h)
                .and_then(|d| now.checked_add_signed(d))
                .ok_or_else(|| {
                    DomainError::Validation("Reminder window is out of range".to_string())
                })
        };
        Ok(Self {
            now,
            start: offset(hours - 1)?,
            end: offset(hours + 1)?,
        })
    }

    /// Inclusive lower bound actually queried: `max(start, now)`
    pub fn query_from(&self) -> DateTime<Utc> {
        self.start.max(self.now)
    }

    /// Inclusive upper bound
    pub fn query_to(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.query_from() && t <= self.query_to()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn twenty_four_hour_window_bounds() {
        let w = ReminderWindow::new(at(2024, 1, 1, 0, 0), 24).unwrap();
        assert_eq!(w.start, at(2024, 1, 1, 23, 0));
        assert_eq!(w.end, at(2024, 1, 2, 1, 0));
    }

    #[test]
    fn twenty_four_hour_window_membership() {
        let w = ReminderWindow::new(at(2024, 1, 1, 0, 0), 24).unwrap();
        assert!(w.contains(at(2024, 1, 2, 0, 30)));
        assert!(!w.contains(at(2024, 1, 2, 2, 0)));
        assert!(w.contains(at(2024, 1, 2, 1, 0)));
        assert!(w.contains(at(2024, 1, 1, 23, 0)));
        assert!(!w.contains(at(2024, 1, 1, 22, 59)));
    }

    #[test]
    fn short_lookahead_excludes_past_bookings() {
        // hours = 0 gives [now - 1h, now + 1h]; anything before now is out.
        let now = at(2024, 1, 1, 12, 0);
        let w = ReminderWindow::new(now, 0).unwrap();
        assert_eq!(w.start, at(2024, 1, 1, 11, 0));
        assert_eq!(w.query_from(), now);
        assert!(!w.contains(at(2024, 1, 1, 11, 30)));
        assert!(w.contains(now));
        assert!(w.contains(at(2024, 1, 1, 12, 45)));
    }

    #[test]
    fn lookahead_is_bounded() {
        let now = at(2024, 1, 1, 0, 0);
        let w = ReminderWindow::new(now, MAX_REMINDER_HOURS).unwrap();
        assert_eq!(w.end - now, TimeDelta::hours(MAX_REMINDER_HOURS + 1));

        for hours in [-1, MAX_REMINDER_HOURS + 1, i64::MAX, i64::MIN] {
            assert!(matches!(
                ReminderWindow::new(now, hours),
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[test]
    fn window_past_the_end_of_time_is_rejected() {
        let w = ReminderWindow::new(DateTime::<Utc>::MAX_UTC, 24);
        assert!(matches!(w, Err(DomainError::Validation(_))));
    }
}
