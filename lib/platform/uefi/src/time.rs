//! Definitions related to the time services.

use bitflags::bitflags;

/// A snapshot of a moment in time and various options concerning its interpretation.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    /// The current year.
    pub year: u16,
    /// The current month.
    pub month: u8,
    /// The current day.
    pub day: u8,
    /// The current hour.
    pub hour: u8,
    /// The current minute.
    pub minute: u8,
    /// The current second.
    pub second: u8,
    /// Padding.
    pub _padding_0: u8,
    /// The current fraction of a second in the device.
    pub nanosecond: u32,
    /// The time's offset in minutes from UTC.
    ///
    /// If the value is [`Time::UNSPECIFIED_TIMEZONE`], the time should be interpreted as local
    /// time.
    pub time_zone: i16,
    /// A bitmask containing the daylight savings time information.
    pub daylight: Daylight,
    /// Padding.
    pub _padding_1: u8,
}

impl Time {
    /// The [`Time`] should be interpreted as a local time.
    pub const UNSPECIFIED_TIMEZONE: i16 = 0x7ff;

    /// The size, in bytes, of the serialized form of a [`Time`].
    pub const SIZE: usize = 16;

    /// Constructs a local [`Time`] with no daylight savings information and a zero nanosecond
    /// field.
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            _padding_0: 0,
            nanosecond: 0,
            time_zone: Self::UNSPECIFIED_TIMEZONE,
            daylight: Daylight::empty(),
            _padding_1: 0,
        }
    }

    /// Returns the serialized little-endian form of this [`Time`].
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];

        bytes[0..2].copy_from_slice(&self.year.to_le_bytes());
        bytes[2] = self.month;
        bytes[3] = self.day;
        bytes[4] = self.hour;
        bytes[5] = self.minute;
        bytes[6] = self.second;
        bytes[8..12].copy_from_slice(&self.nanosecond.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.time_zone.to_le_bytes());
        bytes[14] = self.daylight.bits();

        bytes
    }

    /// Reconstructs a [`Time`] from its serialized form.
    ///
    /// Unknown daylight bits are preserved so that validation can reject them.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            year: u16::from_le_bytes([bytes[0], bytes[1]]),
            month: bytes[2],
            day: bytes[3],
            hour: bytes[4],
            minute: bytes[5],
            second: bytes[6],
            _padding_0: 0,
            nanosecond: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            time_zone: i16::from_le_bytes([bytes[12], bytes[13]]),
            daylight: Daylight::from_bits_retain(bytes[14]),
            _padding_1: 0,
        }
    }
}

bitflags! {
    /// Daylight savings time information attached to a [`Time`].
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Daylight: u8 {
        /// The [`Time`] should be adjusted for daylight savings time.
        const ADJUST_DAYLIGHT = 0x01;
        /// The [`Time`] has been adjusted for daylight savings time.
        const IN_DAYLIGHT = 0x02;
    }
}

/// The capabilities of the real-time clock used to maintain the current time and date for the
/// system.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeCapabilities {
    /// The reporting resultion of the real-time clock device in counts per second.
    pub resolution: u32,
    /// Provides the timekeeping accuracy of the real-time clock in an error rate of 10^-6 per
    /// million.
    pub accuracy: u32,
    /// Set to `true` if a time set operation clears the device's time below the
    /// [`TimeCapabilities::resolution`] threshold.
    pub sets_to_zero: bool,
}
