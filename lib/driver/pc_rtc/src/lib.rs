//! Driver for the PC-AT real-time clock (MC146818 compatible CMOS clock).
//!
//! The driver exposes the wall-clock time and a single wakeup alarm through [`PcRtc`], converting
//! between the register encoding selected by the hardware (BCD or binary, 12-hour or 24-hour)
//! and the canonical [`Time`][t] representation.
//!
//! [t]: uefi::time::Time

#![no_std]

extern crate alloc;

pub mod calendar;
pub mod config;
pub mod driver;
pub mod emulated;
pub mod encoding;
pub mod error;
pub mod hardware;
pub mod persistence;
pub mod register;

pub use config::{ConfigError, RtcConfig};
pub use driver::{AlarmState, PcRtc};
pub use error::{RtcError, TimeField};
pub use hardware::{Delay, PortIo};
pub use persistence::{NoPersistence, PersistenceError, RtcPersistence};
