use super::context::{neighbor_after, neighbor_before, occurrence_context, ContextDistribution};
use crate::glyph::{GlyphIndex, LinearSequence, SymbolId, Token};
use crate::repository::{PatternId, StoredOccurrence, StoredPattern};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// `ln(1 + count) × (1 + productivity) × (1 + boundary_strength)`
pub fn stability_score(count: usize, productivity: usize, boundary_strength: f64) -> f64 {
    (count as f64).ln_1p() * (1.0 + productivity as f64) * (1.0 + boundary_strength)
}

/// A scored pattern or stem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityRecord {
    /// Stored pattern id, absent for stems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<PatternId>,
    pub symbols: Vec<SymbolId>,
    pub length: usize,
    pub count: usize,
    pub productivity: usize,
    pub boundary_strength: f64,
    pub stability_score: f64,
    pub left_types: usize,
    pub right_types: usize,
}

impl StabilityRecord {
    pub fn from_distribution(
        symbols: Vec<SymbolId>,
        distribution: &ContextDistribution,
        pattern_id: Option<PatternId>,
    ) -> Self {
        let count = distribution.occurrences();
        let productivity = distribution.productivity();
        let boundary_strength = distribution.boundary_strength();

        Self {
            pattern_id,
            length: symbols.len(),
            symbols,
            count,
            productivity,
            boundary_strength,
            stability_score: stability_score(count, productivity, boundary_strength),
            left_types: distribution.left_types(),
            right_types: distribution.right_types(),
        }
    }
}

/// Score desc, then length desc, then tuple asc
pub fn compare_records(a: &StabilityRecord, b: &StabilityRecord) -> Ordering {
    b.stability_score
        .total_cmp(&a.stability_score)
        .then_with(|| b.length.cmp(&a.length))
        .then_with(|| a.symbols.cmp(&b.symbols))
}

/// Score persisted patterns from the contexts of their stored occurrences
///
/// Occurrences that are not one contiguous run of the current sequence do not
/// contribute; `count` is the number that did. Patterns with fewer than
/// `min_occurrences` contributing occurrences are dropped.
pub fn score_stored_patterns(
    patterns: &[StoredPattern],
    occurrences: &[StoredOccurrence],
    linear: &LinearSequence,
    min_occurrences: usize,
) -> Vec<StabilityRecord> {
    let index = GlyphIndex::build(linear);
    let mut distributions: HashMap<PatternId, ContextDistribution> = HashMap::new();
    let mut skipped = 0usize;

    for occurrence in occurrences {
        match occurrence_context(linear, &index, &occurrence.glyph_ids) {
            Some((left, right)) => distributions
                .entry(occurrence.pattern_id)
                .or_default()
                .record(left, right),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "occurrences without a contiguous context");
    }

    let mut records: Vec<StabilityRecord> = patterns
        .iter()
        .filter_map(|pattern| {
            let distribution = distributions.get(&pattern.id)?;
            if distribution.occurrences() < min_occurrences {
                return None;
            }
            Some(StabilityRecord::from_distribution(
                pattern.symbol_sequence.clone(),
                distribution,
                Some(pattern.id),
            ))
        })
        .collect();

    records.sort_by(compare_records);
    records
}

/// Score every window of length `1..=max_len` seen at least `min_count` times
pub fn score_stems(symbols: &[SymbolId], max_len: usize, min_count: usize) -> Vec<StabilityRecord> {
    let linear = LinearSequence::new(
        symbols
            .iter()
            .enumerate()
            .map(|(i, &symbol_id)| Token {
                glyph_id: i as u64,
                symbol_id,
            })
            .collect(),
    );

    let mut table: HashMap<&[SymbolId], ContextDistribution> = HashMap::new();
    for length in 1..=max_len.min(symbols.len()) {
        for (start, window) in symbols.windows(length).enumerate() {
            table.entry(window).or_default().record(
                neighbor_before(&linear, start),
                neighbor_after(&linear, start + length - 1),
            );
        }
    }

    let mut records: Vec<StabilityRecord> = table
        .into_iter()
        .filter(|(_, distribution)| distribution.occurrences() >= min_count)
        .map(|(window, distribution)| {
            StabilityRecord::from_distribution(window.to_vec(), &distribution, None)
        })
        .collect();

    records.sort_by(compare_records);
    records
}

/// Which end of a pattern an affix is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffixKind {
    Prefix,
    Suffix,
}

/// An affix weighted by the occurrence counts of the patterns carrying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixRecord {
    pub symbols: Vec<SymbolId>,
    pub length: usize,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_percent: Option<f64>,
}

/// Weighted prefix or suffix counts over stored patterns
///
/// Each pattern adds its `occurrence_count` to every affix of length
/// `min_len..=min(max_len, pattern length)`. Sorted by count desc, then tuple.
pub fn affix_counts(
    patterns: &[StoredPattern],
    kind: AffixKind,
    min_len: usize,
    max_len: usize,
) -> Vec<AffixRecord> {
    let min_len = min_len.max(1);
    let mut counts: BTreeMap<Vec<SymbolId>, usize> = BTreeMap::new();

    for pattern in patterns {
        let sequence = &pattern.symbol_sequence;
        for length in min_len..=max_len.min(sequence.len()) {
            let affix = match kind {
                AffixKind::Prefix => &sequence[..length],
                AffixKind::Suffix => &sequence[sequence.len() - length..],
            };
            *counts.entry(affix.to_vec()).or_insert(0) += pattern.occurrence_count;
        }
    }

    let mut records: Vec<AffixRecord> = counts
        .into_iter()
        .map(|(symbols, count)| AffixRecord {
            length: symbols.len(),
            symbols,
            count,
            share_percent: None,
        })
        .collect();

    // BTreeMap order already breaks ties by tuple
    records.sort_by(|a, b| b.count.cmp(&a.count));
    records
}

/// Set `share_percent = count / Σcount × 100` on every record
pub fn attach_share(mut records: Vec<AffixRecord>) -> Vec<AffixRecord> {
    let total: usize = records.iter().map(|r| r.count).sum();
    let total = total.max(1) as f64;

    for record in &mut records {
        record.share_percent = Some(record.count as f64 / total * 100.0);
    }
    records
}
