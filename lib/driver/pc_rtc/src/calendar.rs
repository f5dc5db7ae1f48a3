//! Calendar arithmetic and field validation for [`Time`].

use core::{cmp::Ordering, ops::RangeInclusive};

use uefi::time::{Daylight, Time};

use crate::error::TimeField;

/// Number of days in each month of a leap year.
const DAYS_IN_MONTH: [u8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Largest magnitude of a specified time zone, in minutes.
const MAX_TIME_ZONE_OFFSET: i16 = 1440;

/// Largest valid value of [`Time::nanosecond`].
const MAX_NANOSECOND: u32 = 999_999_999;

/// Returns `true` if `year` is a leap year in the Gregorian calendar.
pub const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns the number of days in `month` of `year`, or `None` if `month` is not within
/// `1..=12`.
pub const fn days_in_month(year: u16, month: u8) -> Option<u8> {
    if month < 1 || month > 12 {
        return None;
    }

    if month == 2 && !is_leap_year(year) {
        Some(28)
    } else {
        Some(DAYS_IN_MONTH[(month - 1) as usize])
    }
}

/// Returns `true` if the day of `time` exists in its month and year.
pub fn day_valid(time: &Time) -> bool {
    days_in_month(time.year, time.month).is_some_and(|days| (1..=days).contains(&time.day))
}

/// Validates every field of `time`, with the year restricted to `years`.
///
/// # Errors
///
/// Returns the first [`TimeField`] that is out of range, checked in order from year to
/// daylight flags.
pub fn validate(time: &Time, years: RangeInclusive<u16>) -> Result<(), TimeField> {
    if !years.contains(&time.year) {
        return Err(TimeField::Year);
    }
    if !(1..=12).contains(&time.month) {
        return Err(TimeField::Month);
    }
    if !day_valid(time) {
        return Err(TimeField::Day);
    }
    if time.hour > 23 {
        return Err(TimeField::Hour);
    }
    if time.minute > 59 {
        return Err(TimeField::Minute);
    }
    if time.second > 59 {
        return Err(TimeField::Second);
    }
    if time.nanosecond > MAX_NANOSECOND {
        return Err(TimeField::Nanosecond);
    }
    if time.time_zone != Time::UNSPECIFIED_TIMEZONE
        && !(-MAX_TIME_ZONE_OFFSET..=MAX_TIME_ZONE_OFFSET).contains(&time.time_zone)
    {
        return Err(TimeField::TimeZone);
    }
    if !Daylight::all().contains(time.daylight) {
        return Err(TimeField::Daylight);
    }

    Ok(())
}

/// Compares the hour, minute, and second of `from` and `to`, ignoring the date.
pub fn compare_hms(from: &Time, to: &Time) -> Ordering {
    (from.hour, from.minute, from.second).cmp(&(to.hour, to.minute, to.second))
}

/// Returns `true` if `to` lies no more than one day after `from`.
///
/// On the same day `to` may not be earlier than `from`. On the following calendar day, which
/// may be in the next month or year, `to` may not be later than `from`'s time of day.
pub fn is_within_one_day(from: &Time, to: &Time) -> bool {
    let hms = compare_hms(from, to);

    if from.year == to.year {
        if from.month == to.month {
            if u16::from(from.day) + 1 == u16::from(to.day) {
                hms.is_ge()
            } else if from.day == to.day {
                hms.is_le()
            } else {
                false
            }
        } else if u16::from(from.month) + 1 == u16::from(to.month) && to.day == 1 {
            days_in_month(from.year, from.month) == Some(from.day) && hms.is_ge()
        } else {
            false
        }
    } else if u32::from(from.year) + 1 == u32::from(to.year)
        && from.month == 12
        && from.day == 31
        && to.month == 1
        && to.day == 1
    {
        hms.is_ge()
    } else {
        false
    }
}
