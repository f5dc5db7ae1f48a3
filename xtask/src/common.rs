//! Various items that are common between [`Action`][a] parsing and execution.
//!
//! [a]: crate::cli::Action

use clap::builder::PossibleValuesParser;

use crate::PACKAGES;

/// A `cargo` profile.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Profile {
    /// The `dev` cargo profile.
    #[default]
    Dev,
    /// The `release` cargo profile.
    Release,
}

impl Profile {
    /// Returns the textual representation of the [`Profile`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Release => "release",
        }
    }
}

impl clap::ValueEnum for Profile {
    fn value_variants<'a>() -> &'a [Self] {
        static PROFILES: &[Profile] = &[Profile::Dev, Profile::Release];

        PROFILES
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Returns a parser accepting the name of one of [`PACKAGES`].
pub fn package_parser() -> PossibleValuesParser {
    PossibleValuesParser::new(PACKAGES)
}

/// Appends `--package` arguments selecting `package`, or all of [`PACKAGES`] if `None`.
pub fn select_packages(cmd: &mut std::process::Command, package: Option<&str>) {
    match package {
        Some(package) => {
            cmd.args(["--package", package]);
        }
        None => {
            for package in PACKAGES {
                cmd.args(["--package", package]);
            }
        }
    }
}
