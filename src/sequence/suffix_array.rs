use crate::glyph::SymbolId;
use crate::sequence::{compare_mined, MinedPattern, PatternFinder};
use fnv::FnvHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Sorted suffixes of a symbol sequence
///
/// Suffixes are stored as start offsets and compared as slices, so a proper
/// prefix sorts before any of its extensions.
///
/// Construction is the naive O(n² log n) comparison sort. That is fine for
/// the glyph count of a single papyrus image; it is not meant for corpora.
///
/// # Example
/// ```
/// use glyphmine::sequence::SuffixArray;
///
/// let sa = SuffixArray::build(&[1, 2, 1, 2, 3]);
/// assert_eq!(sa.search(&[1, 2]), 2);
/// assert_eq!(sa.search(&[2, 2]), 0);
/// ```
#[derive(Debug, Clone)]
pub struct SuffixArray {
    symbols: Vec<SymbolId>,
    order: Vec<usize>,
}

/// Length of the longest common prefix of two sequences
pub fn lcp_length(a: &[SymbolId], b: &[SymbolId]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl SuffixArray {
    pub fn build(symbols: &[SymbolId]) -> Self {
        let mut order: Vec<usize> = (0..symbols.len()).collect();
        order.sort_by(|&a, &b| symbols[a..].cmp(&symbols[b..]));

        debug_assert!(
            order
                .windows(2)
                .all(|w| symbols[w[0]..] <= symbols[w[1]..]),
            "suffix array out of order"
        );

        Self {
            symbols: symbols.to_vec(),
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Start offsets in sorted suffix order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The suffix at sorted rank `rank`
    pub fn suffix(&self, rank: usize) -> &[SymbolId] {
        &self.symbols[self.order[rank]..]
    }

    /// Every repeated pattern of length >= `min_length` with its start offsets
    ///
    /// Each adjacent sorted pair with common prefix length `L` contributes both
    /// start offsets to every prefix of length `min_length..=L`. Suffixes sharing
    /// a prefix form one contiguous block of the sorted order, so chaining
    /// adjacent pairs reaches every start of that prefix.
    pub fn mine(&self, min_length: usize) -> Vec<MinedPattern> {
        let min_length = min_length.max(1);
        let mut positions: FnvHashMap<Vec<SymbolId>, BTreeSet<usize>> = FnvHashMap::default();

        for pair in self.order.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let common = lcp_length(&self.symbols[left..], &self.symbols[right..]);

            for p in min_length..=common {
                let entry = positions
                    .entry(self.symbols[left..left + p].to_vec())
                    .or_default();
                entry.insert(left);
                entry.insert(right);
            }
        }

        let mut patterns: Vec<MinedPattern> = positions
            .into_iter()
            .filter(|(_, starts)| starts.len() >= 2)
            .map(|(symbols, starts)| MinedPattern::new(symbols, starts.into_iter().collect()))
            .collect();

        patterns.sort_by(compare_mined);

        tracing::debug!(
            sequence_len = self.symbols.len(),
            min_length,
            patterns = patterns.len(),
            "suffix array mining complete"
        );

        patterns
    }

    /// Distinct adjacent-LCP prefixes with their length
    ///
    /// Sorted by length (descending) then by tuple. Only the maximal common
    /// prefix of each adjacent pair is reported, not its shorter prefixes.
    pub fn longest_repeats(&self, min_length: usize) -> Vec<(usize, Vec<SymbolId>)> {
        let mut unique: BTreeSet<Vec<SymbolId>> = BTreeSet::new();

        for pair in self.order.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let common = lcp_length(&self.symbols[left..], &self.symbols[right..]);
            if common >= min_length && common > 0 {
                unique.insert(self.symbols[left..left + common].to_vec());
            }
        }

        let mut repeats: Vec<(usize, Vec<SymbolId>)> =
            unique.into_iter().map(|p| (p.len(), p)).collect();
        repeats.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        repeats
    }

    /// Number of suffixes that start with `pattern`
    ///
    /// Two binary searches bound the block of matching suffixes.
    pub fn search(&self, pattern: &[SymbolId]) -> usize {
        if pattern.is_empty() {
            return 0;
        }

        let first = self
            .order
            .partition_point(|&s| compare_prefix(&self.symbols[s..], pattern) == Ordering::Less);
        let end = self
            .order
            .partition_point(|&s| compare_prefix(&self.symbols[s..], pattern) != Ordering::Greater);

        end.saturating_sub(first)
    }
}

/// Three-way compare of a suffix against a pattern
///
/// `Equal` means the suffix starts with the pattern. A suffix that matches so
/// far but is shorter than the pattern sorts before it.
fn compare_prefix(suffix: &[SymbolId], pattern: &[SymbolId]) -> Ordering {
    let m = suffix.len().min(pattern.len());
    match suffix[..m].cmp(&pattern[..m]) {
        Ordering::Equal if suffix.len() < pattern.len() => Ordering::Less,
        other => other,
    }
}

impl PatternFinder for SuffixArray {
    fn name(&self) -> &'static str {
        "suffix-array"
    }

    fn find_patterns(&self, min_length: usize) -> Vec<MinedPattern> {
        self.mine(min_length)
    }

    fn search(&self, pattern: &[SymbolId]) -> usize {
        SuffixArray::search(self, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes_sorted_with_prefix_first() {
        let sa = SuffixArray::build(&[1, 2, 1, 2, 3]);
        assert_eq!(sa.order(), &[0, 2, 1, 3, 4]);
        assert_eq!(sa.suffix(0), &[1, 2, 1, 2, 3]);

        let sa = SuffixArray::build(&[5, 5, 5]);
        assert_eq!(sa.order(), &[2, 1, 0]);
    }

    #[test]
    fn test_lcp_length() {
        assert_eq!(lcp_length(&[1, 2, 3], &[1, 2, 4]), 2);
        assert_eq!(lcp_length(&[1, 2], &[1, 2, 4]), 2);
        assert_eq!(lcp_length(&[], &[1]), 0);
    }

    #[test]
    fn test_mine_spec_example() {
        let sa = SuffixArray::build(&[1, 2, 1, 2, 3]);
        let patterns = sa.mine(2);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].symbols, vec![1, 2]);
        assert_eq!(patterns[0].starts, vec![0, 2]);
    }

    #[test]
    fn test_mine_reports_every_prefix_length() {
        let sa = SuffixArray::build(&[1, 2, 3, 1, 2, 3]);
        let patterns = sa.mine(2);
        let tuples: Vec<Vec<SymbolId>> = patterns.iter().map(|p| p.symbols.clone()).collect();

        assert_eq!(tuples, vec![vec![1, 2, 3], vec![1, 2], vec![2, 3]]);
        assert!(patterns.iter().all(|p| p.starts.len() == 2));
    }

    #[test]
    fn test_mine_overlapping_repeats() {
        let sa = SuffixArray::build(&[7, 7, 7, 7]);
        let patterns = sa.mine(2);

        let pair = patterns.iter().find(|p| p.symbols == vec![7, 7]).unwrap();
        assert_eq!(pair.starts, vec![0, 1, 2]);
        let triple = patterns.iter().find(|p| p.symbols == vec![7, 7, 7]).unwrap();
        assert_eq!(triple.starts, vec![0, 1]);
    }

    #[test]
    fn test_mine_short_input() {
        assert!(SuffixArray::build(&[]).mine(2).is_empty());
        assert!(SuffixArray::build(&[4]).mine(2).is_empty());
        assert!(SuffixArray::build(&[1, 2, 3]).mine(2).is_empty());
    }

    #[test]
    fn test_longest_repeats() {
        let sa = SuffixArray::build(&[1, 2, 3, 1, 2, 3]);
        assert_eq!(
            sa.longest_repeats(2),
            vec![(3, vec![1, 2, 3]), (2, vec![2, 3])]
        );
        assert_eq!(sa.longest_repeats(1).last(), Some(&(1, vec![3])));
    }

    #[test]
    fn test_search_counts() {
        let sa = SuffixArray::build(&[1, 2, 1, 2, 3]);
        assert_eq!(sa.search(&[1, 2]), 2);
        assert_eq!(sa.search(&[2]), 2);
        assert_eq!(sa.search(&[3]), 1);
        assert_eq!(sa.search(&[1, 2, 3]), 1);
        assert_eq!(sa.search(&[4]), 0);
        assert_eq!(sa.search(&[2, 3, 9]), 0);
        assert_eq!(sa.search(&[1, 2, 1, 2, 3, 1]), 0);
        assert_eq!(sa.search(&[]), 0);
    }
}
