//! Addresses and bit definitions of the CMOS clock registers.
//!
//! The status registers are modelled as transparent wrappers over the raw byte with explicit
//! masks, so the layout never depends on compiler bit-field ordering.

/// I/O port that selects the CMOS register accessed through [`DATA_PORT`].
pub const ADDRESS_PORT: u16 = 0x70;
/// I/O port through which the selected CMOS register is transferred.
pub const DATA_PORT: u16 = 0x71;

/// Bit of the address latch that masks non-maskable interrupts. It is not part of the register
/// address.
pub const NMI_MASK: u8 = 0x80;

/// Current second.
pub const SECONDS: u8 = 0x00;
/// Second at which the alarm fires.
pub const SECONDS_ALARM: u8 = 0x01;
/// Current minute.
pub const MINUTES: u8 = 0x02;
/// Minute at which the alarm fires.
pub const MINUTES_ALARM: u8 = 0x03;
/// Current hour.
pub const HOURS: u8 = 0x04;
/// Hour at which the alarm fires.
pub const HOURS_ALARM: u8 = 0x05;
/// Current day of the week. Unused by the driver.
pub const DAY_OF_THE_WEEK: u8 = 0x06;
/// Current day of the month.
pub const DAY_OF_THE_MONTH: u8 = 0x07;
/// Current month.
pub const MONTH: u8 = 0x08;
/// Current year within the century.
pub const YEAR: u8 = 0x09;
/// Status register A.
pub const REGISTER_A: u8 = 0x0A;
/// Status register B.
pub const REGISTER_B: u8 = 0x0B;
/// Status register C.
pub const REGISTER_C: u8 = 0x0C;
/// Status register D.
pub const REGISTER_D: u8 = 0x0D;
/// Conventional location of the century byte in CMOS RAM.
pub const CENTURY: u8 = 0x32;

/// Status register A: divider chain, rate select, and the update-in-progress flag.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct RegisterA(pub u8);

impl RegisterA {
    /// Periodic interrupt rate select.
    pub const RATE_SELECT: u8 = 0x0F;
    /// Oscillator divider chain select.
    pub const DIVIDER_CHAIN: u8 = 0x70;
    /// Set while the clock is updating the time registers.
    pub const UPDATE_IN_PROGRESS: u8 = 0x80;

    /// Returns `true` if the time registers are currently being updated.
    pub const fn update_in_progress(self) -> bool {
        self.0 & Self::UPDATE_IN_PROGRESS != 0
    }
}

/// Status register B: data mode and interrupt enables.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct RegisterB(pub u8);

impl RegisterB {
    /// Daylight savings enable.
    pub const DAYLIGHT_SAVINGS: u8 = 0x01;
    /// Hours are kept in 24-hour format when set, 12-hour format otherwise.
    pub const HOUR_24: u8 = 0x02;
    /// Registers are binary when set, BCD otherwise.
    pub const BINARY: u8 = 0x04;
    /// Square wave output enable.
    pub const SQUARE_WAVE: u8 = 0x08;
    /// Update-ended interrupt enable.
    pub const UPDATE_INTERRUPT: u8 = 0x10;
    /// Alarm interrupt enable.
    pub const ALARM_INTERRUPT: u8 = 0x20;
    /// Periodic interrupt enable.
    pub const PERIODIC_INTERRUPT: u8 = 0x40;
    /// Inhibits updates of the time registers while set.
    pub const SET: u8 = 0x80;

    /// Returns `true` if hours are kept in 24-hour format.
    pub const fn hour_24(self) -> bool {
        self.0 & Self::HOUR_24 != 0
    }

    /// Returns `true` if the time registers hold binary values.
    pub const fn binary(self) -> bool {
        self.0 & Self::BINARY != 0
    }

    /// Returns `true` if the alarm interrupt is enabled.
    pub const fn alarm_interrupt_enabled(self) -> bool {
        self.0 & Self::ALARM_INTERRUPT != 0
    }

    /// Returns a copy with the update-inhibit bit set to `set`.
    #[must_use]
    pub const fn with_set(self, set: bool) -> Self {
        Self(with_bit(self.0, Self::SET, set))
    }

    /// Returns a copy with the alarm interrupt enable bit set to `enabled`.
    #[must_use]
    pub const fn with_alarm_interrupt(self, enabled: bool) -> Self {
        Self(with_bit(self.0, Self::ALARM_INTERRUPT, enabled))
    }
}

/// Status register C: interrupt flags. Reading the register clears it.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct RegisterC(pub u8);

impl RegisterC {
    /// Update-ended flag.
    pub const UPDATE_FLAG: u8 = 0x10;
    /// Alarm flag.
    pub const ALARM_FLAG: u8 = 0x20;
    /// Periodic interrupt flag.
    pub const PERIODIC_FLAG: u8 = 0x40;
    /// Set when any enabled interrupt flag is set.
    pub const INTERRUPT_REQUEST: u8 = 0x80;

    /// Returns `true` if the alarm has fired since the register was last read.
    pub const fn alarm_flag(self) -> bool {
        self.0 & Self::ALARM_FLAG != 0
    }
}

/// Status register D: battery state.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct RegisterD(pub u8);

impl RegisterD {
    /// Valid RAM and time.
    pub const VALID_RAM_AND_TIME: u8 = 0x80;

    /// Returns `true` if the battery backed contents are intact.
    pub const fn valid_ram_and_time(self) -> bool {
        self.0 & Self::VALID_RAM_AND_TIME != 0
    }
}

/// Returns `value` with `mask` set or cleared.
const fn with_bit(value: u8, mask: u8, set: bool) -> u8 {
    if set { value | mask } else { value & !mask }
}

#[cfg(test)]
mod test {
    use super::{RegisterA, RegisterB, RegisterC, RegisterD};

    #[test]
    fn register_b_accessors() {
        let register_b = RegisterB(0x02);
        assert!(register_b.hour_24());
        assert!(!register_b.binary());
        assert!(!register_b.alarm_interrupt_enabled());

        let register_b = register_b.with_set(true).with_alarm_interrupt(true);
        assert_eq!(register_b, RegisterB(0xA2));

        let register_b = register_b.with_set(false);
        assert_eq!(register_b, RegisterB(0x22));
    }

    #[test]
    fn status_flags() {
        assert!(RegisterA(0xA6).update_in_progress());
        assert!(!RegisterA(0x26).update_in_progress());
        assert!(RegisterC(0xA0).alarm_flag());
        assert!(!RegisterC(0x10).alarm_flag());
        assert!(RegisterD(0x80).valid_ram_and_time());
        assert!(!RegisterD(0x00).valid_ram_and_time());
    }
}
