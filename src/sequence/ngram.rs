use crate::glyph::SymbolId;
use crate::sequence::{compare_mined, MinedPattern};
use fnv::FnvHashMap;
use std::collections::{BTreeMap, HashMap};

/// Type alias for N-gram sequences (vector of symbol ids)
pub type NGram = Vec<SymbolId>;

/// Type alias for N-gram frequency map
pub type NGramMap = FnvHashMap<NGram, usize>;

/// N-gram -> ascending start offsets
pub type OccurrenceMap = FnvHashMap<NGram, Vec<usize>>;

/// Counts the N-grams of one fixed size in a symbol sequence
///
/// For example, with N=2:
/// - Input: [1, 2, 1, 2, 3]
/// - Output: {[1, 2]: 2, [2, 1]: 1, [2, 3]: 1}
///
/// # Example
/// ```
/// use glyphmine::sequence::count_ngrams;
///
/// let ngrams = count_ngrams(&[1, 2, 1, 2, 3], 2);
///
/// assert_eq!(ngrams.len(), 3);
/// assert_eq!(ngrams.get(&vec![1, 2]), Some(&2));
/// ```
pub fn count_ngrams(symbols: &[SymbolId], n: usize) -> NGramMap {
    let mut ngrams = NGramMap::default();

    if n == 0 || symbols.len() < n {
        return ngrams; // Not enough symbols for N-gram
    }

    // Sliding window of size N
    for window in symbols.windows(n) {
        *ngrams.entry(window.to_vec()).or_insert(0) += 1;
    }

    ngrams
}

/// Find most frequent N-grams, ties broken by tuple order
pub fn top_ngrams(ngrams: &NGramMap, k: usize) -> Vec<(NGram, usize)> {
    let mut ngram_vec: Vec<_> = ngrams
        .iter()
        .map(|(ngram, count)| (ngram.clone(), *count))
        .collect();

    ngram_vec.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ngram_vec.into_iter().take(k).collect()
}

/// Start offsets of every N-gram with `min_length <= N <= max_length`
///
/// Inputs shorter than `min_length` give an empty map.
pub fn find_ngram_occurrences(
    symbols: &[SymbolId],
    min_length: usize,
    max_length: usize,
) -> OccurrenceMap {
    let mut occurrences = OccurrenceMap::default();
    let min_length = min_length.max(1);
    let total = symbols.len();

    if total < min_length {
        return occurrences;
    }

    let max_n = max_length.min(total);
    for n in min_length..=max_n {
        for (start, window) in symbols.windows(n).enumerate() {
            occurrences.entry(window.to_vec()).or_default().push(start);
        }
    }

    occurrences
}

/// Does every `[s, s+short_len)` lie inside some `[S, S+long_len)`?
///
/// Both start lists must be ascending.
fn intervals_fully_covered(
    short_starts: &[usize],
    short_len: usize,
    long_starts: &[usize],
    long_len: usize,
) -> bool {
    let mut idx = 0;
    for &start in short_starts {
        let short_end = start + short_len;
        while idx < long_starts.len() && long_starts[idx] + long_len < short_end {
            idx += 1;
        }
        if idx == long_starts.len() || long_starts[idx] > start {
            return false;
        }
    }
    true
}

/// Keep only closed patterns
///
/// Patterns seen fewer than twice are dropped. The rest are grouped by
/// occurrence count; inside a group, lengths are processed longest first and a
/// pattern survives unless an already accepted longer pattern of the same
/// group covers each of its occurrence intervals.
pub fn filter_closed_patterns(occurrences: &OccurrenceMap) -> OccurrenceMap {
    let mut by_count: BTreeMap<usize, BTreeMap<usize, Vec<(&NGram, &Vec<usize>)>>> =
        BTreeMap::new();

    for (ngram, starts) in occurrences {
        if starts.len() <= 1 {
            continue;
        }
        by_count
            .entry(starts.len())
            .or_default()
            .entry(ngram.len())
            .or_default()
            .push((ngram, starts));
    }

    let mut filtered = OccurrenceMap::default();

    for by_length in by_count.values() {
        let mut accepted_longer: Vec<(usize, &Vec<usize>)> = Vec::new();

        for (&length, candidates) in by_length.iter().rev() {
            let mut accepted_here = Vec::new();

            for &(ngram, starts) in candidates {
                let covered = accepted_longer.iter().any(|&(long_len, long_starts)| {
                    intervals_fully_covered(starts, length, long_starts, long_len)
                });
                if !covered {
                    filtered.insert(ngram.clone(), starts.clone());
                    accepted_here.push((length, starts));
                }
            }

            accepted_longer.extend(accepted_here);
        }
    }

    filtered
}

/// Closed repeated patterns of length 2..=max(2, min(cap, n/2))
pub fn mine_closed_patterns(symbols: &[SymbolId], max_length_cap: Option<usize>) -> Vec<MinedPattern> {
    let half = symbols.len() / 2;
    let max_length = max_length_cap.map_or(half, |cap| cap.min(half)).max(2);

    let occurrences = find_ngram_occurrences(symbols, 2, max_length);
    let closed = filter_closed_patterns(&occurrences);

    let mut patterns: Vec<MinedPattern> = closed
        .into_iter()
        .map(|(ngram, starts)| MinedPattern::new(ngram, starts))
        .collect();
    patterns.sort_by(compare_mined);

    tracing::debug!(
        sequence_len = symbols.len(),
        max_length,
        candidates = occurrences.len(),
        closed = patterns.len(),
        "closed n-gram mining complete"
    );

    patterns
}

/// Maps arbitrary sign codes to stable, order-of-appearance symbol ids
///
/// Useful for ad-hoc sequences typed as codes ("G17", "M17", ...) rather than
/// catalog ids. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct SymbolInterner {
    ids: HashMap<String, SymbolId>,
    codes: Vec<String>,
}

impl SymbolInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, code: &str) -> SymbolId {
        if let Some(&id) = self.ids.get(code) {
            return id;
        }
        self.codes.push(code.to_string());
        let id = self.codes.len() as SymbolId;
        self.ids.insert(code.to_string(), id);
        id
    }

    pub fn intern_all<'a, I>(&mut self, codes: I) -> Vec<SymbolId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        codes.into_iter().map(|c| self.intern(c)).collect()
    }

    pub fn code(&self, id: SymbolId) -> Option<&str> {
        let index = (id as usize).checked_sub(1)?;
        self.codes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_ngrams_basic() {
        let ngrams = count_ngrams(&[10, 20, 30, 40], 3);

        // Should have 2 trigrams
        assert_eq!(ngrams.len(), 2);
        assert_eq!(ngrams.get(&vec![10, 20, 30]), Some(&1));
        assert_eq!(ngrams.get(&vec![20, 30, 40]), Some(&1));
    }

    #[test]
    fn test_count_ngrams_repeated() {
        let ngrams = count_ngrams(&[1, 2, 3, 1, 2, 3], 3);

        // Repeated pattern should increase count
        assert_eq!(ngrams.get(&vec![1, 2, 3]), Some(&2));
    }

    #[test]
    fn test_count_ngrams_insufficient_length() {
        assert!(count_ngrams(&[1, 2], 3).is_empty());
        assert!(count_ngrams(&[1, 2], 0).is_empty());
    }

    #[test]
    fn test_top_ngrams() {
        let mut ngrams = NGramMap::default();
        ngrams.insert(vec![1, 2], 10);
        ngrams.insert(vec![2, 3], 5);
        ngrams.insert(vec![0, 9], 5);
        ngrams.insert(vec![3, 4], 1);

        let top = top_ngrams(&ngrams, 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0], (vec![1, 2], 10)); // Most frequent first
        assert_eq!(top[1], (vec![0, 9], 5));
        assert_eq!(top[2], (vec![2, 3], 5));
    }

    #[test]
    fn test_find_occurrences_all_lengths() {
        let occ = find_ngram_occurrences(&[1, 2, 1, 2, 3], 2, 3);

        assert_eq!(occ.get(&vec![1, 2]), Some(&vec![0, 2]));
        assert_eq!(occ.get(&vec![2, 1]), Some(&vec![1]));
        assert_eq!(occ.get(&vec![1, 2, 3]), Some(&vec![2]));
        assert!(!occ.contains_key(&vec![1, 2, 1, 2]));
    }

    #[test]
    fn test_find_occurrences_short_input() {
        assert!(find_ngram_occurrences(&[1], 2, 5).is_empty());
        assert!(find_ngram_occurrences(&[], 2, 5).is_empty());
    }

    #[test]
    fn test_intervals_fully_covered() {
        // [1,3) and [5,7) inside [0,3) and [4,7)
        assert!(intervals_fully_covered(&[1, 5], 2, &[0, 4], 3));
        // [2,4) sticks out of [0,3)
        assert!(!intervals_fully_covered(&[2], 2, &[0], 3));
        // second short interval has no cover
        assert!(!intervals_fully_covered(&[1, 9], 2, &[0, 4], 3));
    }

    #[test]
    fn test_closed_filter_drops_subsumed_repeats() {
        let occ = find_ngram_occurrences(&[1, 2, 3, 9, 1, 2, 3, 8], 2, 4);
        let closed = filter_closed_patterns(&occ);

        assert_eq!(closed.len(), 1);
        assert_eq!(closed.get(&vec![1, 2, 3]), Some(&vec![0, 4]));
    }

    #[test]
    fn test_closed_filter_keeps_more_frequent_subpattern() {
        let occ = find_ngram_occurrences(&[1, 2, 3, 1, 2, 9, 1, 2, 3], 2, 4);
        let closed = filter_closed_patterns(&occ);

        // (1,2) occurs 3 times, (1,2,3) only twice: both are closed
        assert_eq!(closed.get(&vec![1, 2]), Some(&vec![0, 3, 6]));
        assert_eq!(closed.get(&vec![1, 2, 3]), Some(&vec![0, 6]));
        assert!(!closed.contains_key(&vec![2, 3]));
    }

    #[test]
    fn test_mine_closed_spec_example() {
        let patterns = mine_closed_patterns(&[1, 2, 1, 2, 3], None);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].symbols, vec![1, 2]);
        assert_eq!(patterns[0].starts, vec![0, 2]);
    }

    #[test]
    fn test_mine_closed_respects_cap() {
        let seq = [1, 2, 3, 4, 1, 2, 3, 4];
        let capped = mine_closed_patterns(&seq, Some(2));
        assert!(capped.iter().all(|p| p.len() <= 2));

        let full = mine_closed_patterns(&seq, None);
        assert_eq!(full[0].symbols, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_symbol_interner() {
        let mut interner = SymbolInterner::new();
        let ids = interner.intern_all(["G17", "M17", "G17"]);

        assert_eq!(ids, vec![1, 2, 1]);
        assert_eq!(interner.code(2), Some("M17"));
        assert_eq!(interner.code(0), None);
        assert_eq!(interner.len(), 2);
    }
}
