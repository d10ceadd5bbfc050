//! Helpers for converting canonical timezone names into UTC offsets.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset for a canonical timezone name such as
/// "Pacific/Auckland". Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Get today's date in the timezone `canonical_timezone`.
///
/// # Errors
/// Returns [crate::Error::InvalidTimezoneError] if `canonical_timezone` is
/// not a known timezone name.
pub fn local_date_today(canonical_timezone: &str) -> Result<time::Date, crate::Error> {
    get_local_offset(canonical_timezone)
        .map(|offset| OffsetDateTime::now_utc().to_offset(offset).date())
        .ok_or_else(|| crate::Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}
