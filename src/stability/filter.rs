use super::score::{AffixRecord, StabilityRecord};
use crate::glyph::SymbolId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Fraction of the scored list kept by the sequence and stem filters
pub const DEFAULT_TOP_FRACTION: f64 = 0.10;

/// Minimum occurrence count scaled to the glyph count of the image
///
/// `max(3, ceil(sqrt(n) / 6))`, and 3 for an empty image.
pub fn default_min_count(total_glyphs: usize) -> usize {
    if total_glyphs == 0 {
        return 3;
    }
    let scaled = ((total_glyphs as f64).sqrt() / 6.0).ceil() as usize;
    scaled.max(3)
}

fn top_share(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).ceil() as usize).max(1)
}

/// Keep records in order until each length bucket reaches its cap
fn cap_by_length(
    records: impl IntoIterator<Item = StabilityRecord>,
    cap: impl Fn(usize) -> usize,
) -> Vec<StabilityRecord> {
    let mut taken: HashMap<usize, usize> = HashMap::new();
    records
        .into_iter()
        .filter(|r| {
            let used = taken.entry(r.length).or_insert(0);
            if *used < cap(r.length) {
                *used += 1;
                true
            } else {
                false
            }
        })
        .collect()
}

fn by_score_desc(records: &mut [StabilityRecord]) {
    records.sort_by(|a, b| b.stability_score.total_cmp(&a.stability_score));
}

/// Frequent, productive multi-symbol sequences
///
/// Count at least `min_count`, length at least 2, productivity at least 3;
/// then the best-scoring `top_fraction` with per-length caps
/// (≤3: 20, ≤5: 10, longer: 5).
pub fn filter_stable_sequences(
    records: Vec<StabilityRecord>,
    min_count: usize,
    top_fraction: f64,
) -> Vec<StabilityRecord> {
    let mut kept: Vec<StabilityRecord> = records
        .into_iter()
        .filter(|r| r.count >= min_count && r.length >= 2 && r.productivity >= 3)
        .collect();
    if kept.is_empty() {
        return kept;
    }

    by_score_desc(&mut kept);
    kept.truncate(top_share(kept.len(), top_fraction));

    cap_by_length(kept, |length| match length {
        0..=1 => 0,
        2..=3 => 20,
        4..=5 => 10,
        _ => 5,
    })
}

/// Frequent stems of length 2 to 5 with at least median productivity
///
/// Then the best-scoring `top_fraction` with per-length caps
/// (2–3: 20, 4: 10, 5: 5).
pub fn filter_stable_stems(
    records: Vec<StabilityRecord>,
    min_count: usize,
    top_fraction: f64,
) -> Vec<StabilityRecord> {
    let candidates: Vec<StabilityRecord> = records
        .into_iter()
        .filter(|r| r.count >= min_count && (2..=5).contains(&r.length))
        .collect();
    if candidates.is_empty() {
        return candidates;
    }

    let threshold = median(candidates.iter().map(|r| r.productivity as f64).collect());
    let mut kept: Vec<StabilityRecord> = candidates
        .into_iter()
        .filter(|r| r.productivity as f64 >= threshold)
        .collect();

    by_score_desc(&mut kept);
    kept.truncate(top_share(kept.len(), top_fraction));

    cap_by_length(kept, |length| match length {
        2..=3 => 20,
        4 => 10,
        _ if length >= 5 => 5,
        _ => 0,
    })
}

/// Middle value; mean of the two middle values for even counts
fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Selection limits for prefix and suffix reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffixFilter {
    /// Always keep this many of the most frequent affixes
    pub top_n: usize,
    /// Share floor in percent
    pub base_threshold: f64,
    /// Share floor grows to `scale / total_glyphs` on small images
    pub scale: f64,
    pub max_length: usize,
}

impl AffixFilter {
    pub fn prefix() -> Self {
        Self {
            top_n: 15,
            base_threshold: 1.0,
            scale: 100.0,
            max_length: 3,
        }
    }

    pub fn suffix() -> Self {
        Self {
            top_n: 10,
            base_threshold: 2.0,
            scale: 150.0,
            max_length: 3,
        }
    }

    /// Share in percent an affix needs to be kept beyond the top-N
    pub fn threshold(&self, total_glyphs: usize) -> f64 {
        if total_glyphs == 0 {
            return self.base_threshold;
        }
        self.base_threshold.max(self.scale / total_glyphs as f64)
    }

    /// Union of the top-N by count and every affix above the share floor
    ///
    /// Records need `share_percent` set (see `attach_share`); missing shares
    /// count as zero. First occurrence wins when deduplicating.
    pub fn apply(&self, records: Vec<AffixRecord>, total_glyphs: usize) -> Vec<AffixRecord> {
        let mut short: Vec<AffixRecord> = records
            .into_iter()
            .filter(|r| r.length <= self.max_length)
            .collect();
        short.sort_by(|a, b| b.count.cmp(&a.count));

        let threshold = self.threshold(total_glyphs);
        let top = short.iter().take(self.top_n);
        let above = short
            .iter()
            .filter(|r| r.share_percent.unwrap_or(0.0) >= threshold);

        let mut seen: HashSet<(Vec<SymbolId>, usize)> = HashSet::new();
        top.chain(above)
            .filter(|r| seen.insert((r.symbols.clone(), r.length)))
            .cloned()
            .collect()
    }
}

impl Default for AffixFilter {
    fn default() -> Self {
        Self::prefix()
    }
}

pub fn filter_prefixes(records: Vec<AffixRecord>, total_glyphs: usize) -> Vec<AffixRecord> {
    AffixFilter::prefix().apply(records, total_glyphs)
}

pub fn filter_suffixes(records: Vec<AffixRecord>, total_glyphs: usize) -> Vec<AffixRecord> {
    AffixFilter::suffix().apply(records, total_glyphs)
}
