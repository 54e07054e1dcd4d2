// Context Stability Scoring for Mined Patterns
//
// A repeated sequence is interesting when it is frequent and behaves like a
// unit: it appears next to many different neighbours (productivity) and those
// neighbours are spread out rather than fixed (boundary entropy). A pattern
// that always sits inside the same longer formula has one left and one right
// neighbour and scores low even when frequent.
//
//   stability = ln(1 + count) × (1 + productivity) × (1 + boundary_strength)
//
// Scored lists then feed four report filters: stable sequences, stable stems,
// prefixes and suffixes.
//
// Scientific Foundation:
// [1] Harris, Z. S. (1955). From phoneme to morpheme. Language, 31(2).
// [2] Shannon, C. E. (1948). A mathematical theory of communication. Bell
//     System Technical Journal, 27(3).
// [3] Tanaka-Ishii, K. (2005). Entropy as an indicator of context boundaries:
//     an experiment using a web search engine. IJCNLP.

mod context;
mod filter;
mod score;

pub use context::{entropy, occurrence_context, ContextDistribution, Neighbor};
pub use filter::{
    default_min_count, filter_prefixes, filter_stable_sequences, filter_stable_stems,
    filter_suffixes, AffixFilter, DEFAULT_TOP_FRACTION,
};
pub use score::{
    affix_counts, attach_share, compare_records, score_stems, score_stored_patterns,
    stability_score, AffixKind, AffixRecord, StabilityRecord,
};

#[cfg(test)]
mod tests;
