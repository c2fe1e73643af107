//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hb_core::{DomainPolicy, ProcessorKind};

/// Baby-care log analyzer.
///
/// Reads a tracking app's CSV export and turns its free-text diaper and feed
/// entries into hourly distributions and trends.
#[derive(Debug, Parser)]
#[command(name = "hb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// CSV export to analyze (overrides `input_path` from the config).
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the event types in the log with their entry counts.
    Types {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show hourly pee and poo amount distributions.
    Diaper {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Category domain of the amount tables (defaults to the config value).
        #[arg(long, value_enum)]
        domain: Option<DomainArg>,
    },

    /// Show feed amount trend and threshold estimates.
    Feed {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write one event type with its derived columns as CSV.
    Export {
        /// Event type to export (e.g., Diaper, Feed).
        #[arg(long = "type", value_name = "TYPE")]
        kind: ProcessorKind,

        /// Destination file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Category domain choices for distribution tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DomainArg {
    /// The four amount levels: none, small, medium, large.
    Fixed,
    /// Every distinct label seen, including unrecognized ones.
    Observed,
}

impl From<DomainArg> for DomainPolicy {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Fixed => Self::Fixed,
            DomainArg::Observed => Self::Observed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_parses_type_case_insensitively() {
        let cli = Cli::try_parse_from(["hb", "export", "--type", "diaper"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Export {
                kind: ProcessorKind::Diaper,
                output: None
            })
        ));
    }

    #[test]
    fn export_rejects_unknown_type() {
        let result = Cli::try_parse_from(["hb", "export", "--type", "Sleep"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_input_after_subcommand() {
        let cli = Cli::try_parse_from(["hb", "diaper", "--input", "log.csv", "--domain", "observed"])
            .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("log.csv")));
        assert!(matches!(
            cli.command,
            Some(Commands::Diaper {
                json: false,
                domain: Some(DomainArg::Observed)
            })
        ));
    }
}
