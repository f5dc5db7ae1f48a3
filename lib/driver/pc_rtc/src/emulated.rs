//! An emulated MC146818 CMOS clock.
//!
//! [`EmulatedCmos`] answers the port protocol of the real part closely enough to run the driver
//! without hardware: register C clears when read, the update-in-progress and valid RAM bits are
//! read only, and the century byte can be removed to model clocks that lack one. The clock never
//! advances on its own.

use alloc::sync::Arc;

use spin::Mutex;

use crate::{
    encoding::RawTime,
    hardware::{Delay, PortIo},
    register::{self, ADDRESS_PORT, DATA_PORT, NMI_MASK, RegisterA, RegisterC, RegisterD},
};

/// Number of bytes of CMOS RAM, including the clock registers.
pub const CMOS_SIZE: usize = 128;

/// A shared handle to an emulated CMOS clock.
///
/// Clones refer to the same device, so a test can hand one clone to the driver and inspect or
/// tamper with the device through another.
#[derive(Clone, Debug)]
pub struct EmulatedCmos {
    /// The device state.
    state: Arc<Mutex<CmosState>>,
}

/// The state of an [`EmulatedCmos`].
#[derive(Debug)]
struct CmosState {
    /// The address latch, including the NMI mask bit.
    latch: u8,
    /// The contents of CMOS RAM.
    ram: [u8; CMOS_SIZE],
    /// Number of register A reads that still report an update in progress.
    update_polls: u32,
    /// Register A reports an update in progress forever.
    update_stuck: bool,
    /// The byte at [`register::CENTURY`] is backed by RAM.
    century_present: bool,
    /// Total time spent in [`Delay::delay_us`].
    delayed_us: u64,
}

impl EmulatedCmos {
    /// Creates a powered-on clock in 24-hour BCD mode with valid RAM and zeroed time registers.
    pub fn new() -> Self {
        let mut ram = [0; CMOS_SIZE];
        ram[usize::from(register::REGISTER_A)] = 0x26;
        ram[usize::from(register::REGISTER_B)] = register::RegisterB::HOUR_24;
        ram[usize::from(register::REGISTER_D)] = RegisterD::VALID_RAM_AND_TIME;

        Self {
            state: Arc::new(Mutex::new(CmosState {
                latch: 0,
                ram,
                update_polls: 0,
                update_stuck: false,
                century_present: true,
                delayed_us: 0,
            })),
        }
    }

    /// Returns the raw byte at `address` without any read side effects.
    pub fn register(&self, address: u8) -> u8 {
        self.state.lock().ram[usize::from(address) % CMOS_SIZE]
    }

    /// Overwrites the raw byte at `address`, bypassing the read only bits.
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.lock().ram[usize::from(address) % CMOS_SIZE] = value;
    }

    /// Returns the time registers, and the century byte if the clock has one.
    pub fn time_registers(&self) -> RawTime {
        let state = self.state.lock();
        let byte = |address: u8| state.ram[usize::from(address)];

        RawTime {
            second: byte(register::SECONDS),
            minute: byte(register::MINUTES),
            hour: byte(register::HOURS),
            day: byte(register::DAY_OF_THE_MONTH),
            month: byte(register::MONTH),
            year: byte(register::YEAR),
            century: state.century_present.then(|| byte(register::CENTURY)),
        }
    }

    /// Overwrites the time registers, and the century byte if both are present.
    pub fn set_time_registers(&self, raw: &RawTime) {
        let mut state = self.state.lock();
        let century_present = state.century_present;
        let ram = &mut state.ram;

        ram[usize::from(register::SECONDS)] = raw.second;
        ram[usize::from(register::MINUTES)] = raw.minute;
        ram[usize::from(register::HOURS)] = raw.hour;
        ram[usize::from(register::DAY_OF_THE_MONTH)] = raw.day;
        ram[usize::from(register::MONTH)] = raw.month;
        ram[usize::from(register::YEAR)] = raw.year;
        if let (true, Some(century)) = (century_present, raw.century) {
            ram[usize::from(register::CENTURY)] = century;
        }
    }

    /// Returns the alarm hour, minute, and second registers.
    pub fn alarm_registers(&self) -> (u8, u8, u8) {
        let state = self.state.lock();
        (
            state.ram[usize::from(register::HOURS_ALARM)],
            state.ram[usize::from(register::MINUTES_ALARM)],
            state.ram[usize::from(register::SECONDS_ALARM)],
        )
    }

    /// Makes the next `polls` reads of register A report an update in progress.
    pub fn set_update_in_progress(&self, polls: u32) {
        self.state.lock().update_polls = polls;
    }

    /// Makes register A report an update in progress until cleared.
    pub fn set_update_stuck(&self, stuck: bool) {
        self.state.lock().update_stuck = stuck;
    }

    /// Sets or clears the valid RAM and time bit of register D.
    pub fn set_valid_ram_and_time(&self, valid: bool) {
        let mut state = self.state.lock();
        let register_d = &mut state.ram[usize::from(register::REGISTER_D)];
        if valid {
            *register_d |= RegisterD::VALID_RAM_AND_TIME;
        } else {
            *register_d &= !RegisterD::VALID_RAM_AND_TIME;
        }
    }

    /// Removes the century byte: writes are dropped and reads return `0xFF`.
    pub fn remove_century_register(&self) {
        self.state.lock().century_present = false;
    }

    /// Latches the alarm flag in register C as if the alarm had fired.
    pub fn raise_alarm(&self) {
        self.state.lock().ram[usize::from(register::REGISTER_C)] |=
            RegisterC::ALARM_FLAG | RegisterC::INTERRUPT_REQUEST;
    }

    /// Returns the total time spent in [`Delay::delay_us`].
    pub fn delayed_us(&self) -> u64 {
        self.state.lock().delayed_us
    }

    /// Returns the current address latch.
    pub fn latch(&self) -> u8 {
        self.state.lock().latch
    }
}

impl Default for EmulatedCmos {
    fn default() -> Self {
        Self::new()
    }
}

impl CmosState {
    /// Performs a read of the selected register, applying its side effects.
    fn read_selected(&mut self) -> u8 {
        let address = self.latch & !NMI_MASK;
        let index = usize::from(address);

        match address {
            register::REGISTER_A => {
                let updating = self.update_stuck || self.update_polls > 0;
                self.update_polls = self.update_polls.saturating_sub(1);

                let value = self.ram[index] & !RegisterA::UPDATE_IN_PROGRESS;
                if updating {
                    value | RegisterA::UPDATE_IN_PROGRESS
                } else {
                    value
                }
            }
            register::REGISTER_C => core::mem::take(&mut self.ram[index]),
            register::CENTURY if !self.century_present => 0xFF,
            _ => self.ram[index],
        }
    }

    /// Performs a write of the selected register, honoring its read only bits.
    fn write_selected(&mut self, value: u8) {
        let address = self.latch & !NMI_MASK;
        let index = usize::from(address);

        match address {
            register::REGISTER_A => {
                self.ram[index] = value & !RegisterA::UPDATE_IN_PROGRESS;
            }
            register::REGISTER_C | register::REGISTER_D => {}
            register::CENTURY if !self.century_present => {}
            _ => self.ram[index] = value,
        }
    }
}

impl PortIo for EmulatedCmos {
    fn read_port(&mut self, port: u16) -> u8 {
        let mut state = self.state.lock();
        match port {
            ADDRESS_PORT => state.latch,
            DATA_PORT => state.read_selected(),
            _ => 0xFF,
        }
    }

    fn write_port(&mut self, port: u16, value: u8) {
        let mut state = self.state.lock();
        match port {
            ADDRESS_PORT => state.latch = value,
            DATA_PORT => state.write_selected(value),
            _ => {}
        }
    }
}

impl Delay for EmulatedCmos {
    fn delay_us(&mut self, micros: u32) {
        self.state.lock().delayed_us += u64::from(micros);
    }
}

#[cfg(test)]
mod test {
    use super::EmulatedCmos;
    use crate::{
        hardware::{PortIo, read_register, write_register},
        register::{self, ADDRESS_PORT, NMI_MASK, RegisterA, RegisterC},
    };

    #[test]
    fn register_c_clears_on_read() {
        let mut cmos = EmulatedCmos::new();
        cmos.raise_alarm();

        let first = RegisterC(read_register(&mut cmos, register::REGISTER_C));
        let second = RegisterC(read_register(&mut cmos, register::REGISTER_C));

        assert!(first.alarm_flag());
        assert!(!second.alarm_flag());
    }

    #[test]
    fn update_in_progress_counts_down() {
        let mut cmos = EmulatedCmos::new();
        cmos.set_update_in_progress(2);

        let mut reads = [false; 3];
        for read in &mut reads {
            *read = RegisterA(read_register(&mut cmos, register::REGISTER_A)).update_in_progress();
        }

        assert_eq!(reads, [true, true, false]);
    }

    #[test]
    fn missing_century_register_drops_writes() {
        let mut cmos = EmulatedCmos::new();
        cmos.remove_century_register();

        write_register(&mut cmos, register::CENTURY, 0x20);
        assert_eq!(read_register(&mut cmos, register::CENTURY), 0xFF);
        assert_eq!(cmos.time_registers().century, None);
    }

    #[test]
    fn nmi_bit_is_not_part_of_the_address() {
        let mut cmos = EmulatedCmos::new();
        cmos.set_register(register::YEAR, 0x24);
        cmos.write_port(ADDRESS_PORT, NMI_MASK);

        assert_eq!(read_register(&mut cmos, register::YEAR), 0x24);
        assert_eq!(cmos.latch(), NMI_MASK | register::YEAR);
    }

    #[test]
    fn valid_ram_bit_is_read_only() {
        let mut cmos = EmulatedCmos::new();

        write_register(&mut cmos, register::REGISTER_D, 0x00);
        assert_eq!(read_register(&mut cmos, register::REGISTER_D), 0x80);

        cmos.set_valid_ram_and_time(false);
        assert_eq!(read_register(&mut cmos, register::REGISTER_D), 0x00);
    }
}
