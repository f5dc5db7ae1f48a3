//! Conversion between the register encoding of the clock and [`Time`].
//!
//! The clock keeps each field either as binary or as packed BCD, and the hour either in 24-hour
//! format or in 12-hour format with bit 7 marking the afternoon. Both choices are made through
//! [`RegisterB`].

use uefi::time::Time;

use crate::{error::TimeField, register::RegisterB};

/// Bit of a 12-hour encoded hour byte that marks a time after noon.
pub const PM_FLAG: u8 = 0x80;

/// Decodes a packed BCD byte, returning `None` if either nibble is not a decimal digit.
pub const fn bcd_to_decimal(value: u8) -> Option<u8> {
    let high = value >> 4;
    let low = value & 0x0F;
    if high > 9 || low > 9 {
        return None;
    }

    Some(high * 10 + low)
}

/// Encodes `value`, which must be less than 100, as a packed BCD byte.
pub const fn decimal_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// The raw contents of the time registers.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct RawTime {
    /// The seconds register.
    pub second: u8,
    /// The minutes register.
    pub minute: u8,
    /// The hours register, including the PM flag in 12-hour format.
    pub hour: u8,
    /// The day of the month register.
    pub day: u8,
    /// The month register.
    pub month: u8,
    /// The year within the century register.
    pub year: u8,
    /// The century register, if the clock implements one.
    pub century: Option<u8>,
}

/// The data mode selected through [`RegisterB`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Encoding {
    /// Fields are binary rather than BCD.
    pub binary: bool,
    /// Hours are in 24-hour format rather than 12-hour format.
    pub hour_24: bool,
}

impl Encoding {
    /// Returns the [`Encoding`] selected by `register_b`.
    pub const fn from_register_b(register_b: RegisterB) -> Self {
        Self {
            binary: register_b.binary(),
            hour_24: register_b.hour_24(),
        }
    }

    /// Decodes a single register value.
    pub const fn decode_value(self, raw: u8) -> Option<u8> {
        if self.binary {
            Some(raw)
        } else {
            bcd_to_decimal(raw)
        }
    }

    /// Encodes a single decimal value below 100.
    pub const fn encode_value(self, value: u8) -> u8 {
        if self.binary {
            value
        } else {
            decimal_to_bcd(value)
        }
    }

    /// Decodes an hour register into a 24-hour hour.
    ///
    /// The PM flag is always stripped before decoding. It only shifts the hour in 12-hour mode.
    pub const fn decode_hour(self, raw: u8) -> Option<u8> {
        let pm = raw & PM_FLAG != 0;
        let Some(hour) = self.decode_value(raw & !PM_FLAG) else {
            return None;
        };

        if self.hour_24 {
            return Some(hour);
        }

        if pm && hour < 12 {
            Some(hour + 12)
        } else if !pm && hour == 12 {
            Some(0)
        } else {
            Some(hour)
        }
    }

    /// Encodes a 24-hour hour into an hour register.
    pub const fn encode_hour(self, hour: u8) -> u8 {
        if self.hour_24 {
            return self.encode_value(hour);
        }

        let pm = hour >= 12;
        let hour_12 = if hour >= 13 {
            hour - 12
        } else if hour == 0 {
            12
        } else {
            hour
        };

        let encoded = self.encode_value(hour_12);
        if pm { encoded | PM_FLAG } else { encoded }
    }

    /// Decodes the time registers into a [`Time`] with an unspecified time zone.
    ///
    /// When `raw` carries no century, the century is inferred so that the resulting year is not
    /// below `minimal_valid_year`.
    ///
    /// # Errors
    ///
    /// Returns the [`TimeField`] whose register does not hold a valid encoding.
    pub fn decode_time(self, raw: &RawTime, minimal_valid_year: u16) -> Result<Time, TimeField> {
        let second = self.decode_value(raw.second).ok_or(TimeField::Second)?;
        let minute = self.decode_value(raw.minute).ok_or(TimeField::Minute)?;
        let hour = self.decode_hour(raw.hour).ok_or(TimeField::Hour)?;
        let day = self.decode_value(raw.day).ok_or(TimeField::Day)?;
        let month = self.decode_value(raw.month).ok_or(TimeField::Month)?;
        let year = u16::from(self.decode_value(raw.year).ok_or(TimeField::Year)?);

        let century = match raw.century {
            Some(century) => u16::from(self.decode_value(century).ok_or(TimeField::Year)?),
            None => {
                let century = minimal_valid_year / 100;
                if century * 100 + year < minimal_valid_year {
                    century + 1
                } else {
                    century
                }
            }
        };

        Ok(Time::new(century * 100 + year, month, day, hour, minute, second))
    }

    /// Encodes the calendar fields of `time` into register values.
    ///
    /// The century is always produced. The caller decides whether the clock can store it.
    pub fn encode_time(self, time: &Time) -> RawTime {
        RawTime {
            second: self.encode_value(time.second),
            minute: self.encode_value(time.minute),
            hour: self.encode_hour(time.hour),
            day: self.encode_value(time.day),
            month: self.encode_value(time.month),
            year: self.encode_value(two_digits(time.year)),
            century: Some(self.encode_value(two_digits(time.year / 100))),
        }
    }
}

/// Returns the last two decimal digits of `value`.
fn two_digits(value: u16) -> u8 {
    u8::try_from(value % 100).unwrap_or_default()
}
