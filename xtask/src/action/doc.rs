//! Helper function to document all packages given a [`DocConfig`].

use anyhow::Result;

use crate::{action::run_cmd, cli::doc::DocConfig, common::select_packages};

/// Runs `cargo doc` on all packages.
///
/// # Errors
///
/// Returns errors if the `cargo doc` command fails.
pub fn doc(config: DocConfig) -> Result<()> {
    let mut cmd = std::process::Command::new("cargo");
    cmd.arg("doc");

    select_packages(&mut cmd, None);
    cmd.arg("--no-deps");

    if config.private_items {
        cmd.arg("--document-private-items");
    }
    if config.open {
        cmd.arg("--open");
    }

    run_cmd(cmd)?;

    Ok(())
}
