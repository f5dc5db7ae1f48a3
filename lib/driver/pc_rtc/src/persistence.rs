//! Storage for the clock state that the CMOS registers cannot hold.
//!
//! The hardware keeps neither a time zone nor daylight savings flags, and its alarm only has an
//! hour, minute, and second. [`RtcPersistence`] lets the environment carry that state across
//! boots.

use core::{error, fmt};

use uefi::time::{Daylight, Time};

/// Errors reported by an [`RtcPersistence`] implementation.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum PersistenceError {
    /// The backing store has no room left.
    OutOfResources,
    /// The backing store refused the write.
    WriteRejected,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfResources => f.pad("clock state store is full"),
            Self::WriteRejected => f.pad("clock state store rejected the write"),
        }
    }
}

impl error::Error for PersistenceError {}

/// Persists the time zone, daylight flags, and alarm date of the clock.
pub trait RtcPersistence: Send {
    /// Returns the stored time zone and daylight flags, if any.
    fn load_time_zone(&mut self) -> Option<(i16, Daylight)>;

    /// Stores the time zone and daylight flags.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the values could not be stored.
    fn store_time_zone(&mut self, time_zone: i16, daylight: Daylight)
    -> Result<(), PersistenceError>;

    /// Returns the stored alarm, including the date the hardware cannot hold.
    fn load_alarm(&mut self) -> Option<Time>;

    /// Stores the alarm.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the alarm could not be stored.
    fn store_alarm(&mut self, alarm: &Time) -> Result<(), PersistenceError>;
}

/// An [`RtcPersistence`] that keeps nothing.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct NoPersistence;

impl RtcPersistence for NoPersistence {
    fn load_time_zone(&mut self) -> Option<(i16, Daylight)> {
        None
    }

    fn store_time_zone(
        &mut self,
        _time_zone: i16,
        _daylight: Daylight,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn load_alarm(&mut self) -> Option<Time> {
        None
    }

    fn store_alarm(&mut self, _alarm: &Time) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Packs a time zone and daylight flags into the 32-bit stored form.
///
/// The time zone occupies the low 16 bits and the daylight flags the next 8.
pub const fn pack_time_zone(time_zone: i16, daylight: Daylight) -> u32 {
    let [low, high] = time_zone.to_le_bytes();
    u32::from_le_bytes([low, high, daylight.bits(), 0])
}

/// Unpacks the 32-bit stored form produced by [`pack_time_zone`].
pub const fn unpack_time_zone(value: u32) -> (i16, Daylight) {
    let [low, high, daylight, _] = value.to_le_bytes();
    (
        i16::from_le_bytes([low, high]),
        Daylight::from_bits_retain(daylight),
    )
}

#[cfg(test)]
mod test {
    use uefi::time::{Daylight, Time};

    use super::{pack_time_zone, unpack_time_zone};

    #[test]
    fn time_zone_packing() {
        assert_eq!(
            pack_time_zone(Time::UNSPECIFIED_TIMEZONE, Daylight::empty()),
            0x0000_07FF
        );
        assert_eq!(pack_time_zone(-60, Daylight::IN_DAYLIGHT), 0x0002_FFC4);

        assert_eq!(
            unpack_time_zone(0x0003_FE20),
            (-480, Daylight::ADJUST_DAYLIGHT | Daylight::IN_DAYLIGHT)
        );
    }
}
