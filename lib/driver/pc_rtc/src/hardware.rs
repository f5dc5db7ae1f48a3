//! Seams through which the driver reaches the platform.

use crate::register::{ADDRESS_PORT, DATA_PORT, NMI_MASK};

/// Byte-wide access to the I/O port space.
pub trait PortIo: Send {
    /// Reads a byte from `port`.
    fn read_port(&mut self, port: u16) -> u8;

    /// Writes `value` to `port`.
    fn write_port(&mut self, port: u16, value: u8);
}

/// A busy-wait delay primitive.
pub trait Delay: Send {
    /// Stalls for at least `micros` microseconds.
    fn delay_us(&mut self, micros: u32);
}

impl<T: PortIo + ?Sized> PortIo for &mut T {
    fn read_port(&mut self, port: u16) -> u8 {
        T::read_port(self, port)
    }

    fn write_port(&mut self, port: u16, value: u8) {
        T::write_port(self, port, value);
    }
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_us(&mut self, micros: u32) {
        T::delay_us(self, micros);
    }
}

/// Selects `register` in the address latch without disturbing the NMI mask.
fn select<P: PortIo + ?Sized>(io: &mut P, register: u8) {
    let nmi = io.read_port(ADDRESS_PORT) & NMI_MASK;
    io.write_port(ADDRESS_PORT, (register & !NMI_MASK) | nmi);
}

/// Reads the CMOS register at `register`.
pub fn read_register<P: PortIo + ?Sized>(io: &mut P, register: u8) -> u8 {
    select(io, register);
    io.read_port(DATA_PORT)
}

/// Writes `value` to the CMOS register at `register`.
pub fn write_register<P: PortIo + ?Sized>(io: &mut P, register: u8, value: u8) {
    select(io, register);
    io.write_port(DATA_PORT, value);
}
