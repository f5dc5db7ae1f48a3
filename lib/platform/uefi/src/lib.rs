//! Firmware data types shared by the PC-AT runtime drivers.
//!
//! The types mirror the layouts used by UEFI runtime services so that the drivers can be exposed
//! through a service table without conversion.

#![no_std]

extern crate alloc;

pub mod data_type;
pub mod phase;
pub mod time;
pub mod variable;
