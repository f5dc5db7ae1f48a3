//! Command line parsing and [`Action::Doc`][ac] construction.
//!
//! [ac]: crate::cli::Action::Doc

use clap::{Arg, ArgAction, ArgMatches, Command};

/// Description of various parameters used for `cargo doc`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct DocConfig {
    /// Whether private items should be documented.
    pub private_items: bool,
    /// Whether the documentation should be opened once built.
    pub open: bool,
}

/// Parses the arguments required to produce a valid [`DocConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> DocConfig {
    DocConfig {
        private_items: matches.get_flag("document-private-items"),
        open: matches.get_flag("open"),
    }
}

/// Returns the command parser for an [`Action::Doc`][ac].
///
/// [ac]: crate::cli::Action::Doc
pub fn subcommand_parser() -> Command {
    let private_items = Arg::new("document-private-items")
        .long("document-private-items")
        .help("Document private items")
        .action(ArgAction::SetTrue);

    let open = Arg::new("open")
        .long("open")
        .help("Open the documentation in a browser")
        .action(ArgAction::SetTrue);

    Command::new("doc")
        .about("Run doc on all packages")
        .arg(private_items)
        .arg(open)
}
