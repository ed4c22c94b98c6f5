use chrono::{DateTime, Days, Duration, FixedOffset, NaiveTime, TimeZone, Utc};

/// Source of wall-clock time
///
/// Billing reads "now" through this trait so cycles and the scheduler can be
/// driven by a fixed or manually advanced clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Build the billing day offset from a number of minutes east of UTC
///
/// Returns `None` when the offset is outside ±24h.
pub fn billing_offset(utc_offset_minutes: i32) -> Option<FixedOffset> {
    utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

/// First instant strictly after `now` at which the local time in `offset` is 00:00
pub fn next_midnight(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    let local_midnight = (local_date + Days::new(1)).and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));

    Utc.from_utc_datetime(&utc_midnight)
}

/// Time left from `now` until `target`, zero if the target already passed
pub fn duration_until(now: DateTime<Utc>, target: DateTime<Utc>) -> std::time::Duration {
    (target - now).to_std().unwrap_or(std::time::Duration::ZERO)
}
