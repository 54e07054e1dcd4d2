//! CLI argument parsing for glyphmine

use crate::config::{GlyphmineConfig, MiningStrategy};
use crate::glyph::{ImageId, SymbolId};
use crate::linearizer::ReadingDirection;
use crate::report::ReportKind;
use crate::sequence::FinderKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    #[default]
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "glyphmine")]
#[command(version)]
#[command(about = "Repeated glyph-sequence mining for papyrus transcriptions", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// TOML configuration file (CLI flags override its values)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the reading-order sequence of an image
    Linearize {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Mine repeated patterns and store them
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        store: StoreArgs,

        /// Mining engine for persisted patterns
        #[arg(long, value_enum)]
        strategy: Option<MiningStrategy>,

        /// Longest closed n-gram considered
        #[arg(long = "ngram-max-length", value_name = "N")]
        ngram_max_length: Option<usize>,

        /// Shortest pattern to keep
        #[arg(long = "min-length", value_name = "N")]
        min_length: Option<usize>,
    },

    /// Count the occurrences of a symbol sequence
    Search {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        layout: LayoutArgs,

        /// Comma-separated symbol ids (e.g. 17,3,3)
        #[arg(long, value_delimiter = ',', required = true, value_name = "IDS")]
        pattern: Vec<SymbolId>,

        /// Index used to answer the query
        #[arg(long, value_enum)]
        finder: Option<FinderKind>,
    },

    /// Build a decorated report from stored patterns
    Report {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long, value_enum, default_value = "stable-sequences")]
        kind: ReportKind,

        /// Symbol catalog TOML for codes and characters
        #[arg(long = "symbols", value_name = "FILE")]
        symbols: Option<PathBuf>,
    },

    /// List stored patterns with occurrences and bounding boxes
    Patterns {
        #[arg(long = "image-id", value_name = "ID")]
        image_id: ImageId,
        #[command(flatten)]
        store: StoreArgs,

        /// Symbol catalog TOML for codes and characters
        #[arg(long = "symbols", value_name = "FILE")]
        symbols: Option<PathBuf>,
    },

    /// Delete an image's stored results
    Clear {
        #[arg(long = "image-id", value_name = "ID")]
        image_id: ImageId,
        #[command(flatten)]
        store: StoreArgs,
    },
}

/// Glyph annotation input
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Glyph JSON file ({"image_id", "glyphs": [...]})
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// Linearizer overrides
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Column clustering tolerance in pixels
    #[arg(long, value_name = "PX")]
    pub tolerance: Option<f64>,

    /// Column reading direction
    #[arg(long, value_enum)]
    pub direction: Option<ReadingDirection>,
}

impl LayoutArgs {
    pub fn apply(&self, config: &mut GlyphmineConfig) {
        if let Some(tolerance) = self.tolerance {
            config.linearizer.tolerance = tolerance;
        }
        if let Some(direction) = self.direction {
            config.linearizer.reading_direction = direction;
        }
    }
}

/// Pattern store location
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// JSON pattern store (created if missing)
    #[arg(long, value_name = "FILE", default_value = "glyphmine-store.json")]
    pub store: PathBuf,
}
