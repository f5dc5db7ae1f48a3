//! Helper function to run `cargo clippy` on all packages given a [`ClippyConfig`].

use anyhow::Result;

use crate::{action::run_cmd, cli::clippy::ClippyConfig, common::select_packages};

/// Runs `cargo clippy` on all packages, including their tests.
///
/// # Errors
///
/// Returns errors when the `cargo clippy` command fails.
pub fn clippy(config: ClippyConfig) -> Result<()> {
    let mut cmd = std::process::Command::new("cargo");
    cmd.arg("clippy");

    select_packages(&mut cmd, None);
    cmd.args(["--package", "xtask"]);
    cmd.arg("--all-targets");
    cmd.arg("--no-deps");

    if config.deny_warnings {
        cmd.args(["--", "-D", "warnings"]);
    }

    run_cmd(cmd)?;

    Ok(())
}
