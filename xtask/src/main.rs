//! Automation for linting, documenting, and testing the runtime service crates.

use anyhow::Result;

use crate::{
    action::{clippy::clippy, doc::doc, test::test},
    cli::Action,
};

pub mod action;
pub mod cli;
pub mod common;

/// The packages that make up the runtime services.
pub const PACKAGES: &[&str] = &["uefi", "pc_rtc", "emu_variable", "runtime_services"];

fn main() -> Result<()> {
    match cli::get_action() {
        Action::Clippy(config) => clippy(config)?,
        Action::Doc(config) => doc(config)?,
        Action::Test(config) => test(config)?,
    }

    Ok(())
}
