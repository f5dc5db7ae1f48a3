//! Errors reported by the real-time clock driver.

use core::{error, fmt};

use uefi::data_type::Status;

use crate::persistence::PersistenceError;

/// A field of a [`Time`][t] that failed validation.
///
/// [t]: uefi::time::Time
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TimeField {
    /// The year lies outside of the supported range.
    Year,
    /// The month is not within `1..=12`.
    Month,
    /// The day does not exist in the given month.
    Day,
    /// The hour is not within `0..=23`.
    Hour,
    /// The minute is not within `0..=59`.
    Minute,
    /// The second is not within `0..=59`.
    Second,
    /// The nanosecond is not within `0..=999_999_999`.
    Nanosecond,
    /// The time zone is neither unspecified nor within `-1440..=1440`.
    TimeZone,
    /// The daylight flags contain unknown bits.
    Daylight,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Nanosecond => "nanosecond",
            Self::TimeZone => "time zone",
            Self::Daylight => "daylight",
        };

        f.pad(name)
    }
}

/// Various errors that can occur while operating the real-time clock.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum RtcError {
    /// A caller supplied time has an out of range field.
    InvalidTime(TimeField),
    /// A required argument was not supplied.
    MissingArgument,
    /// The clock did not finish updating within the configured timeout.
    UpdateTimeout,
    /// The clock reports that its battery backed contents are not valid.
    InvalidRamAndTime,
    /// The clock registers hold a time that cannot be decoded or is out of range.
    CorruptTime(TimeField),
    /// The requested alarm is not within one day of the current time.
    AlarmOutOfRange,
    /// Time zone, daylight, or alarm information could not be persisted.
    Persistence(PersistenceError),
}

impl RtcError {
    /// Returns `true` if the error originates from the hardware rather than the caller.
    pub const fn is_device_error(self) -> bool {
        matches!(
            self,
            Self::UpdateTimeout
                | Self::InvalidRamAndTime
                | Self::CorruptTime(_)
                | Self::Persistence(_)
        )
    }
}

impl From<PersistenceError> for RtcError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime(field) => write!(f, "supplied time has an invalid {field}"),
            Self::MissingArgument => write!(f, "required argument was not supplied"),
            Self::UpdateTimeout => write!(f, "real-time clock update did not complete in time"),
            Self::InvalidRamAndTime => write!(f, "real-time clock contents are not valid"),
            Self::CorruptTime(field) => write!(f, "real-time clock holds an invalid {field}"),
            Self::AlarmOutOfRange => write!(f, "alarm is not within one day of the current time"),
            Self::Persistence(error) => write!(f, "{error}"),
        }
    }
}

impl error::Error for RtcError {}

impl From<RtcError> for Status {
    fn from(value: RtcError) -> Self {
        match value {
            RtcError::InvalidTime(_) | RtcError::MissingArgument => Status::INVALID_PARAMETER,
            RtcError::AlarmOutOfRange => Status::UNSUPPORTED,
            RtcError::UpdateTimeout
            | RtcError::InvalidRamAndTime
            | RtcError::CorruptTime(_)
            | RtcError::Persistence(_) => Status::DEVICE_ERROR,
        }
    }
}
