//! Command-line interface definitions.
//!
//! Two subcommands: `scrape` aggregates and exports to file, `list` prints a
//! bounded number of upcoming events to the terminal. Both run the full
//! aggregation.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Aggregate events from Fargo-Moorhead area websites.
#[derive(Parser, Debug)]
#[command(name = "fargo-haps", version, about)]
pub struct Cli {
    /// Directory for per-source debug JSON files
    #[arg(long, default_value = ".", global = true)]
    pub debug_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape and aggregate events from all sources, then export
    Scrape {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output filename (without extension)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List events without saving to file
    List {
        /// Limit number of events to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

impl OutputFormat {
    pub fn wants_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn wants_csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_defaults() {
        let cli = Cli::parse_from(["fargo-haps", "scrape"]);
        let Command::Scrape { format, output } = cli.command else {
            panic!("expected scrape command");
        };
        assert_eq!(format, OutputFormat::Json);
        assert!(output.is_none());
        assert_eq!(cli.debug_dir, PathBuf::from("."));
    }

    #[test]
    fn test_scrape_flags() {
        let cli = Cli::parse_from([
            "fargo-haps",
            "scrape",
            "--format",
            "both",
            "--output",
            "weekend",
            "--debug-dir",
            "/tmp/debug",
        ]);
        let Command::Scrape { format, output } = cli.command else {
            panic!("expected scrape command");
        };
        assert_eq!(format, OutputFormat::Both);
        assert_eq!(output.as_deref(), Some("weekend"));
        assert_eq!(cli.debug_dir, PathBuf::from("/tmp/debug"));
    }

    #[test]
    fn test_list_limit() {
        let cli = Cli::parse_from(["fargo-haps", "list", "--limit", "25"]);
        let Command::List { limit } = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(limit, 25);
    }

    #[test]
    fn test_format_selectors() {
        assert!(OutputFormat::Json.wants_json());
        assert!(!OutputFormat::Json.wants_csv());
        assert!(OutputFormat::Both.wants_json());
        assert!(OutputFormat::Both.wants_csv());
    }
}
