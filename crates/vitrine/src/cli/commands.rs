//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vitrine - bounded on-disk image store
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(about = "Bounded on-disk image store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the layered vitrine.toml lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store an image or PDF
    Upload {
        /// File to upload
        file: PathBuf,

        /// Declared mime type (sniffed from the content when omitted)
        #[arg(long)]
        mime: Option<String>,

        /// Display name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// List stored images
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Write a stored image to a file
    Get {
        /// Sequence number
        sequence: u64,

        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },

    /// Write the source document of a pdf-derived image to a file
    Source {
        /// Sequence number
        sequence: u64,

        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },

    /// Delete a stored image
    Delete {
        /// Sequence number
        sequence: u64,
    },

    /// Delete every stored image
    Clear,

    /// Show occupancy
    Status {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_options() {
        let cli = Cli::try_parse_from([
            "vitrine",
            "--verbose",
            "upload",
            "poster.png",
            "--mime",
            "image/png",
            "--name",
            "Poster",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Upload { file, mime, name } => {
                assert_eq!(file, PathBuf::from("poster.png"));
                assert_eq!(mime.as_deref(), Some("image/png"));
                assert_eq!(name.as_deref(), Some("Poster"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vitrine",
            "list",
            "--format",
            "json",
            "--config",
            "store.toml",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("store.toml")));
        assert!(cli.json_logs);
        assert!(matches!(
            cli.command,
            Commands::List {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn get_requires_out() {
        assert!(Cli::try_parse_from(["vitrine", "get", "3"]).is_err());

        let cli = Cli::try_parse_from(["vitrine", "get", "3", "--out", "x.jpg"]).unwrap();
        assert!(matches!(cli.command, Commands::Get { sequence: 3, .. }));
    }

    #[test]
    fn rejects_non_numeric_sequence() {
        assert!(Cli::try_parse_from(["vitrine", "delete", "first"]).is_err());
    }
}
