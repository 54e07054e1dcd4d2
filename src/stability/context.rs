use crate::glyph::{GlyphId, GlyphIndex, LinearSequence, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Left or right neighbour of an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Neighbor {
    /// Occurrence starts the sequence
    Bos,
    Symbol(SymbolId),
    /// Occurrence ends the sequence
    Eos,
}

/// Shannon entropy (natural log) of a count distribution
///
/// Empty or all-zero input has entropy 0.
pub fn entropy<I>(counts: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    -counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Multisets of left and right neighbours of one pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextDistribution {
    left: BTreeMap<Neighbor, usize>,
    right: BTreeMap<Neighbor, usize>,
    occurrences: usize,
}

impl ContextDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, left: Neighbor, right: Neighbor) {
        *self.left.entry(left).or_insert(0) += 1;
        *self.right.entry(right).or_insert(0) += 1;
        self.occurrences += 1;
    }

    /// Number of recorded occurrences
    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    pub fn left_types(&self) -> usize {
        self.left.len()
    }

    pub fn right_types(&self) -> usize {
        self.right.len()
    }

    /// Distinct left plus distinct right neighbours
    pub fn productivity(&self) -> usize {
        self.left_types() + self.right_types()
    }

    /// Mean of left and right context entropy
    pub fn boundary_strength(&self) -> f64 {
        let left = entropy(self.left.values().copied());
        let right = entropy(self.right.values().copied());
        (left + right) / 2.0
    }
}

/// Neighbours of one stored occurrence, looked up by glyph position
///
/// Returns `None` when the occurrence is empty, references a glyph missing
/// from the sequence, or does not form one contiguous run.
pub fn occurrence_context(
    linear: &LinearSequence,
    index: &GlyphIndex,
    glyph_ids: &[GlyphId],
) -> Option<(Neighbor, Neighbor)> {
    if glyph_ids.is_empty() {
        return None;
    }

    let mut positions = glyph_ids
        .iter()
        .map(|&g| index.position(g))
        .collect::<Option<Vec<usize>>>()?;
    positions.sort_unstable();

    let start = *positions.first()?;
    let end = *positions.last()?;
    if end - start + 1 != glyph_ids.len() {
        return None;
    }

    Some((
        neighbor_before(linear, start),
        neighbor_after(linear, end),
    ))
}

pub(crate) fn neighbor_before(linear: &LinearSequence, start: usize) -> Neighbor {
    match start.checked_sub(1).and_then(|i| linear.symbol_at(i)) {
        Some(symbol) => Neighbor::Symbol(symbol),
        None => Neighbor::Bos,
    }
}

pub(crate) fn neighbor_after(linear: &LinearSequence, end: usize) -> Neighbor {
    match linear.symbol_at(end + 1) {
        Some(symbol) => Neighbor::Symbol(symbol),
        None => Neighbor::Eos,
    }
}
