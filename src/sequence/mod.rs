// Repeated-Subsequence Mining over Linear Glyph Sequences
//
// This module finds every contiguous symbol subsequence that occurs at least
// twice in one image's reading-order sequence, and answers exact occurrence
// count queries.
//
// Three engines share the job:
// - suffix array + adjacent LCP (simple, O(n² log n) construction)
// - Ukkonen suffix tree (online O(n) construction, ground-truth counts)
// - closed n-gram miner (keeps only maximal repeats of equal support)
//
// Scientific Foundation:
// [1] Manber, U., & Myers, G. (1993). Suffix arrays: a new method for on-line
//     string searches. SIAM Journal on Computing, 22(5).
// [2] Ukkonen, E. (1995). On-line construction of suffix trees.
//     Algorithmica, 14(3).
// [3] Pasquier, N., Bastide, Y., Taouil, R., & Lakhal, L. (1999). Discovering
//     frequent closed itemsets for association rules. ICDT.

mod ngram;
mod suffix_array;
mod suffix_tree;

pub use ngram::{
    count_ngrams, filter_closed_patterns, find_ngram_occurrences, mine_closed_patterns,
    top_ngrams, NGram, NGramMap, OccurrenceMap, SymbolInterner,
};
pub use suffix_array::{lcp_length, SuffixArray};
pub use suffix_tree::{NodeId, SuffixTree};

use crate::glyph::SymbolId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default minimum pattern length for mining
pub const DEFAULT_MIN_LENGTH: usize = 2;

/// A repeated pattern and where it starts in the linear sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinedPattern {
    pub symbols: Vec<SymbolId>,
    /// Ascending, deduplicated start offsets
    pub starts: Vec<usize>,
}

impl MinedPattern {
    pub fn new(symbols: Vec<SymbolId>, mut starts: Vec<usize>) -> Self {
        starts.sort_unstable();
        starts.dedup();
        Self { symbols, starts }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn occurrence_count(&self) -> usize {
        self.starts.len()
    }
}

/// Ordering used for every mined result list: length desc, count desc, tuple asc
pub fn compare_mined(a: &MinedPattern, b: &MinedPattern) -> Ordering {
    b.len()
        .cmp(&a.len())
        .then_with(|| b.occurrence_count().cmp(&a.occurrence_count()))
        .then_with(|| a.symbols.cmp(&b.symbols))
}

/// Count starting positions of `pattern` by direct scan
///
/// Ground truth for the indexed engines. Empty pattern counts as zero.
pub fn naive_count(symbols: &[SymbolId], pattern: &[SymbolId]) -> usize {
    if pattern.is_empty() || pattern.len() > symbols.len() {
        return 0;
    }
    symbols.windows(pattern.len()).filter(|w| *w == pattern).count()
}

/// A repeated-substring index over one symbol sequence
///
/// Implementations must agree on `search` for identical input.
pub trait PatternFinder {
    /// Short engine name for logs and reports
    fn name(&self) -> &'static str;

    /// All repeated patterns of at least `min_length` symbols
    fn find_patterns(&self, min_length: usize) -> Vec<MinedPattern>;

    /// Exact number of occurrences of `pattern`
    fn search(&self, pattern: &[SymbolId]) -> usize;
}

/// Suffix-array backed finder
pub type SuffixArrayFinder = SuffixArray;

/// Suffix-tree backed finder
pub type SuffixTreeFinder = SuffixTree;

/// Selects a `PatternFinder` implementation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FinderKind {
    #[default]
    SuffixArray,
    SuffixTree,
}

impl FinderKind {
    pub fn build(self, symbols: &[SymbolId]) -> Box<dyn PatternFinder> {
        match self {
            FinderKind::SuffixArray => Box::new(SuffixArray::build(symbols)),
            FinderKind::SuffixTree => Box::new(SuffixTree::build(symbols)),
        }
    }
}

impl fmt::Display for FinderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinderKind::SuffixArray => write!(f, "suffix-array"),
            FinderKind::SuffixTree => write!(f, "suffix-tree"),
        }
    }
}
