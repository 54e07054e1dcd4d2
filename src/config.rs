// Configuration for linearization, mining and stability reports
//
// Every knob has the value the papyrus viewer used; a TOML file overrides any
// subset of them, and CLI flags override the file.

use crate::linearizer::ReadingDirection;
use crate::sequence::{FinderKind, DEFAULT_MIN_LENGTH};
use crate::stability::{AffixFilter, DEFAULT_TOP_FRACTION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Which engine produces the patterns that get persisted
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MiningStrategy {
    /// Every repeated subsequence, from adjacent suffix-array LCPs
    #[default]
    SuffixArray,
    /// Right-maximal repeats, from suffix-tree internal nodes
    SuffixTree,
    /// Closed n-grams: repeats not covered by a longer repeat of equal count
    ClosedNgram,
}

impl fmt::Display for MiningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MiningStrategy::SuffixArray => "suffix-array",
            MiningStrategy::SuffixTree => "suffix-tree",
            MiningStrategy::ClosedNgram => "closed-ngram",
        };
        write!(f, "{}", name)
    }
}

/// Column clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearizerConfig {
    /// Horizontal distance (image pixels) a glyph centre may lie right of the
    /// column start and still join the column
    pub tolerance: f64,
    pub reading_direction: ReadingDirection,
}

impl Default for LinearizerConfig {
    fn default() -> Self {
        Self {
            tolerance: 100.0,
            reading_direction: ReadingDirection::Ltr,
        }
    }
}

/// Pattern mining parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    pub strategy: MiningStrategy,
    /// Shortest persisted pattern; the repository rejects anything below 2
    pub min_length: usize,
    /// Upper bound for closed n-gram length (always also capped at n/2)
    pub ngram_max_length: Option<usize>,
    /// Engine used for ad-hoc `search` queries
    pub search_finder: FinderKind,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            strategy: MiningStrategy::SuffixArray,
            min_length: DEFAULT_MIN_LENGTH,
            ngram_max_length: None,
            search_finder: FinderKind::SuffixArray,
        }
    }
}

/// Stability report parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub stem_max_length: usize,
    pub affix_max_length: usize,
    /// Fraction of the scored list kept by the sequence and stem filters
    pub top_fraction: f64,
    /// Fixed minimum count; `None` scales with the image's glyph count
    pub min_count: Option<usize>,
    /// Stored occurrences a pattern needs before it is scored
    pub min_occurrences: usize,
    /// Items in the `top-patterns` report
    pub top_patterns_limit: usize,
    pub prefix: AffixFilter,
    pub suffix: AffixFilter,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            stem_max_length: 6,
            affix_max_length: 5,
            top_fraction: DEFAULT_TOP_FRACTION,
            min_count: None,
            min_occurrences: 2,
            top_patterns_limit: 10,
            prefix: AffixFilter::prefix(),
            suffix: AffixFilter::suffix(),
        }
    }
}

/// Complete glyphmine configuration
///
/// # Example
/// ```
/// use glyphmine::config::GlyphmineConfig;
///
/// let config = GlyphmineConfig::default();
/// assert_eq!(config.linearizer.tolerance, 100.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphmineConfig {
    pub linearizer: LinearizerConfig,
    pub mining: MiningConfig,
    pub stability: StabilityConfig,
}

impl GlyphmineConfig {
    /// Load a configuration file; absent keys keep their defaults
    ///
    /// # Example TOML
    /// ```toml
    /// [linearizer]
    /// tolerance = 80.0
    /// reading_direction = "rtl"
    ///
    /// [mining]
    /// strategy = "closed-ngram"
    /// ngram_max_length = 8
    ///
    /// [stability.suffix]
    /// top_n = 12
    /// base_threshold = 2.0
    /// scale = 150.0
    /// max_length = 3
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let tolerance = self.linearizer.tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(format!(
                "linearizer.tolerance must be a positive number, got {}",
                tolerance
            ));
        }

        if self.mining.min_length < DEFAULT_MIN_LENGTH {
            return Err(format!(
                "mining.min_length must be >= {}, got {}",
                DEFAULT_MIN_LENGTH, self.mining.min_length
            ));
        }

        if self.mining.ngram_max_length == Some(0) {
            return Err("mining.ngram_max_length must be positive".to_string());
        }

        if self.stability.stem_max_length == 0 || self.stability.affix_max_length == 0 {
            return Err("stability max lengths must be positive".to_string());
        }

        if !(self.stability.top_fraction > 0.0 && self.stability.top_fraction <= 1.0) {
            return Err(format!(
                "stability.top_fraction must be in (0, 1], got {}",
                self.stability.top_fraction
            ));
        }

        if self.stability.min_occurrences == 0 {
            return Err("stability.min_occurrences must be positive".to_string());
        }

        for (name, filter) in [
            ("prefix", &self.stability.prefix),
            ("suffix", &self.stability.suffix),
        ] {
            if filter.base_threshold < 0.0 || filter.scale < 0.0 {
                return Err(format!(
                    "stability.{} thresholds must be non-negative",
                    name
                ));
            }
        }

        Ok(())
    }
}
