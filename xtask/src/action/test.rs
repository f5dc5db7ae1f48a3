//! Helper function to test packages given a [`TestConfig`].

use anyhow::Result;

use crate::{action::run_cmd, cli::test::TestConfig, common::select_packages};

/// Runs `cargo test` on the selected packages.
///
/// # Errors
///
/// Returns errors if the `cargo test` command fails.
pub fn test(config: TestConfig) -> Result<()> {
    let mut cmd = std::process::Command::new("cargo");
    cmd.arg("test");

    select_packages(&mut cmd, config.package.as_deref());
    cmd.args(["--profile", config.profile.as_str()]);

    if let Some(filter) = config.filter {
        cmd.arg(filter);
    }

    run_cmd(cmd)?;

    Ok(())
}
