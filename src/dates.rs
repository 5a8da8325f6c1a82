//! Date-window arithmetic for the "Specific Dates" search filter.

use chrono::{Datelike, Months, NaiveDate};

use crate::config::ConfigError;
use crate::models::DateWindow;

/// Format the site's date inputs expect.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Compute the date range to type into the search filter.
///
/// The window always ends at `today`. Its start is the first day of a
/// month chosen by `months`: `0` and `1` both mean the current month, and
/// larger values reach back `months - 1` additional calendar months, so
/// `3` in mid-April starts the window on February 1st. Year boundaries
/// are handled by the month arithmetic.
///
/// # Arguments
///
/// * `months` - Configured month count. Negative values are refused.
/// * `today` - The date the run is happening, injected for determinism.
///
/// # Returns
///
/// A [`DateWindow`] with both bounds formatted as `MM/DD/YYYY`, or a
/// [`ConfigError`] when `months` is negative or too large for the
/// calendar math.
pub fn compute_window(months: i64, today: NaiveDate) -> Result<DateWindow, ConfigError> {
    if months < 0 {
        return Err(ConfigError::NegativeMonths(months));
    }
    let effective = if months == 0 { 1 } else { months };

    // Day 1 exists in every month, so this never actually falls back.
    let first_of_month = today.with_day(1).unwrap_or(today);
    let back =
        u32::try_from(effective - 1).map_err(|_| ConfigError::MonthsOutOfRange(months))?;
    let start = first_of_month
        .checked_sub_months(Months::new(back))
        .ok_or(ConfigError::MonthsOutOfRange(months))?;

    Ok(DateWindow {
        start: start.format(DATE_FORMAT).to_string(),
        end: today.format(DATE_FORMAT).to_string(),
    })
}
