//! Command line parsing and [`Action`] construction.

use clap::Command;

use crate::cli::{clippy::ClippyConfig, doc::DocConfig, test::TestConfig};

pub mod clippy;
pub mod doc;

/// The action to carry out.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    /// Run `cargo clippy` with a specific configuration.
    Clippy(ClippyConfig),
    /// Run `cargo doc` with a specific configuration.
    Doc(DocConfig),
    /// Run `cargo test` with a specific configuration.
    Test(TestConfig),
}

/// Parses `xtask`'s arguments to construct an [`Action`].
pub fn get_action() -> Action {
    let matches = command_parser().get_matches();

    let Some((subcommand_name, subcommand_matches)) = matches.subcommand() else {
        unreachable!("subcommand is required");
    };
    match subcommand_name {
        "clippy" => Action::Clippy(clippy::parse_arguments(subcommand_matches)),
        "doc" => Action::Doc(doc::parse_arguments(subcommand_matches)),
        "test" => Action::Test(test::parse_arguments(subcommand_matches)),
        _ => unreachable!("unexpected subcommand: {subcommand_name:?}"),
    }
}

/// Returns the command parser for all [`Action`]s.
fn command_parser() -> Command {
    Command::new("xtask")
        .about("Developer utility for running various tasks on the runtime service crates")
        .subcommand(clippy::subcommand_parser())
        .subcommand(doc::subcommand_parser())
        .subcommand(test::subcommand_parser())
        .subcommand_required(true)
        .arg_required_else_help(true)
}
