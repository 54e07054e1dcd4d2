// Stability scoring tests: metric values, report filters, affix weighting

use super::*;
use crate::glyph::{GlyphId, LinearSequence, SymbolId, Token};
use crate::repository::{StoredOccurrence, StoredPattern};

fn linear(symbols: &[SymbolId]) -> LinearSequence {
    LinearSequence::new(
        symbols
            .iter()
            .enumerate()
            .map(|(i, &symbol_id)| Token {
                glyph_id: i as GlyphId,
                symbol_id,
            })
            .collect(),
    )
}

fn stored(id: u64, symbols: &[SymbolId], count: usize) -> StoredPattern {
    StoredPattern {
        id,
        image_id: 1,
        symbol_sequence: symbols.to_vec(),
        length: symbols.len(),
        occurrence_count: count,
    }
}

fn occurrence(id: u64, pattern_id: u64, glyph_ids: &[GlyphId]) -> StoredOccurrence {
    StoredOccurrence {
        id,
        pattern_id,
        glyph_ids: glyph_ids.to_vec(),
    }
}

fn record(symbols: &[SymbolId], count: usize, productivity: usize, score: f64) -> StabilityRecord {
    StabilityRecord {
        pattern_id: None,
        symbols: symbols.to_vec(),
        length: symbols.len(),
        count,
        productivity,
        boundary_strength: 0.0,
        stability_score: score,
        left_types: productivity / 2,
        right_types: productivity - productivity / 2,
    }
}

fn affix(symbols: &[SymbolId], count: usize, share: f64) -> AffixRecord {
    AffixRecord {
        symbols: symbols.to_vec(),
        length: symbols.len(),
        count,
        share_percent: Some(share),
    }
}

#[test]
fn test_score_strictly_increasing_in_count() {
    for productivity in [0, 1, 4, 12] {
        for boundary in [0.0, 0.5, 1.7] {
            let mut previous = stability_score(0, productivity, boundary);
            assert_eq!(previous, 0.0);
            for count in 1..60 {
                let current = stability_score(count, productivity, boundary);
                assert!(current > previous, "count {} not above {}", count, count - 1);
                previous = current;
            }
        }
    }
}

#[test]
fn test_score_stored_patterns_uses_neighbours() {
    // 1 2 | 5 | 1 2 | 6 7 | 1 2
    let seq = linear(&[1, 2, 5, 1, 2, 6, 7, 1, 2]);
    let patterns = vec![stored(1, &[1, 2], 3)];
    let occurrences = vec![
        occurrence(1, 1, &[0, 1]),
        occurrence(2, 1, &[3, 4]),
        occurrence(3, 1, &[7, 8]),
    ];

    let records = score_stored_patterns(&patterns, &occurrences, &seq, 2);
    assert_eq!(records.len(), 1);

    let r = &records[0];
    assert_eq!(r.pattern_id, Some(1));
    assert_eq!(r.count, 3);
    assert_eq!(r.left_types, 3);
    assert_eq!(r.right_types, 3);
    assert_eq!(r.productivity, 6);

    let ln3 = 3f64.ln();
    assert!((r.boundary_strength - ln3).abs() < 1e-12);
    let expected = 4f64.ln() * 7.0 * (1.0 + ln3);
    assert!((r.stability_score - expected).abs() < 1e-9);
}

#[test]
fn test_non_contiguous_occurrences_do_not_count() {
    let seq = linear(&[1, 2, 5, 1, 2, 6, 7, 1, 2]);
    let patterns = vec![stored(1, &[1, 2], 3), stored(2, &[6, 7], 2)];
    let occurrences = vec![
        occurrence(1, 1, &[0, 1]),
        occurrence(2, 1, &[3, 4]),
        occurrence(3, 1, &[7, 8]),
        occurrence(4, 2, &[0, 2]),
        occurrence(5, 2, &[5, 6]),
    ];

    let strict = score_stored_patterns(&patterns, &occurrences, &seq, 2);
    assert_eq!(strict.len(), 1);

    let lenient = score_stored_patterns(&patterns, &occurrences, &seq, 1);
    let six_seven = lenient.iter().find(|r| r.symbols == vec![6, 7]).unwrap();
    assert_eq!(six_seven.count, 1);
    assert_eq!(six_seven.productivity, 2);
}

#[test]
fn test_scored_lists_sorted_by_score() {
    let symbols: Vec<SymbolId> = vec![1, 2, 3, 1, 2, 4, 1, 2, 3, 5, 1, 2, 3, 1, 9];
    let records = score_stems(&symbols, 4, 2);

    assert!(!records.is_empty());
    for pair in records.windows(2) {
        assert_ne!(
            compare_records(&pair[0], &pair[1]),
            std::cmp::Ordering::Greater
        );
    }
}

#[test]
fn test_score_stems_windows() {
    let records = score_stems(&[1, 2, 1, 2, 1, 2], 6, 3);
    let tuples: Vec<Vec<SymbolId>> = records.iter().map(|r| r.symbols.clone()).collect();

    assert_eq!(tuples.len(), 3);
    assert!(tuples.contains(&vec![1]));
    assert!(tuples.contains(&vec![2]));
    assert!(tuples.contains(&vec![1, 2]));

    let pair = records.iter().find(|r| r.symbols == vec![1, 2]).unwrap();
    assert_eq!(pair.count, 3);
    // left {BOS, 2}, right {1, EOS}
    assert_eq!(pair.productivity, 4);
    assert_eq!(pair.pattern_id, None);
}

#[test]
fn test_score_stems_empty_input() {
    assert!(score_stems(&[], 6, 1).is_empty());
    assert!(score_stems(&[1, 2], 0, 1).is_empty());
}

#[test]
fn test_affix_counts_weighted_by_occurrences() {
    let patterns = vec![
        stored(1, &[1, 2, 3], 4),
        stored(2, &[1, 2], 2),
        stored(3, &[5, 2, 3], 3),
    ];

    let prefixes = affix_counts(&patterns, AffixKind::Prefix, 1, 2);
    let got: Vec<(Vec<SymbolId>, usize)> =
        prefixes.iter().map(|a| (a.symbols.clone(), a.count)).collect();
    assert_eq!(
        got,
        vec![
            (vec![1], 6),
            (vec![1, 2], 6),
            (vec![5], 3),
            (vec![5, 2], 3)
        ]
    );

    let suffixes = affix_counts(&patterns, AffixKind::Suffix, 1, 2);
    let got: Vec<(Vec<SymbolId>, usize)> =
        suffixes.iter().map(|a| (a.symbols.clone(), a.count)).collect();
    assert_eq!(
        got,
        vec![
            (vec![2, 3], 7),
            (vec![3], 7),
            (vec![1, 2], 2),
            (vec![2], 2)
        ]
    );
}

#[test]
fn test_attach_share() {
    let patterns = vec![stored(1, &[1, 2], 3), stored(2, &[4, 2], 1)];
    let shared = attach_share(affix_counts(&patterns, AffixKind::Suffix, 1, 1));

    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].share_percent, Some(100.0));

    assert!(attach_share(Vec::new()).is_empty());
}

#[test]
fn test_default_min_count() {
    assert_eq!(default_min_count(0), 3);
    assert_eq!(default_min_count(100), 3);
    assert_eq!(default_min_count(324), 3);
    assert_eq!(default_min_count(325), 4);
    assert_eq!(default_min_count(1600), 7);
}

#[test]
fn test_stable_sequences_keep_top_tenth() {
    let mut records: Vec<StabilityRecord> = (0..25)
        .map(|i| record(&[i, i + 1], 5, 3, 100.0 - i as f64))
        .collect();
    records.push(record(&[90, 91], 5, 2, 500.0));
    records.push(record(&[92, 93], 1, 9, 500.0));
    records.push(record(&[94], 9, 9, 500.0));

    let kept = filter_stable_sequences(records, 3, DEFAULT_TOP_FRACTION);
    let tuples: Vec<Vec<SymbolId>> = kept.iter().map(|r| r.symbols.clone()).collect();

    assert_eq!(tuples, vec![vec![0, 1], vec![1, 2], vec![2, 3]]);
}

#[test]
fn test_stable_sequences_length_caps() {
    let records: Vec<StabilityRecord> = (0..300)
        .map(|i| record(&[i, i], 5, 4, 1000.0 - i as f64))
        .chain((0..100).map(|i| record(&[i, i, i, i, i, i], 5, 4, 2000.0 - i as f64)))
        .collect();

    let kept = filter_stable_sequences(records, 3, DEFAULT_TOP_FRACTION);

    assert_eq!(kept.iter().filter(|r| r.length == 6).count(), 5);
    assert!(kept.iter().filter(|r| r.length == 2).count() <= 20);
}

#[test]
fn test_stable_sequences_empty() {
    assert!(filter_stable_sequences(Vec::new(), 3, DEFAULT_TOP_FRACTION).is_empty());
}

#[test]
fn test_stable_stems_median_cut() {
    let records = vec![
        record(&[1, 1], 5, 2, 90.0),
        record(&[2, 2], 5, 4, 80.0),
        record(&[3, 3], 5, 6, 70.0),
        record(&[4, 4], 5, 8, 60.0),
        record(&[5], 50, 20, 999.0),
        record(&[6, 6, 6, 6, 6, 6], 50, 20, 999.0),
    ];

    // median productivity of the four pairs is 5: only 6 and 8 survive,
    // and the top tenth of two records is one
    let kept = filter_stable_stems(records, 3, DEFAULT_TOP_FRACTION);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].symbols, vec![3, 3]);
}

#[test]
fn test_stable_stems_length_caps() {
    // Interleaved scores: length 4 even, length 5 odd
    let fours = (0..12u32).map(|i| record(&[i; 4], 5, 4, 200.0 - 2.0 * i as f64));
    let fives = (0..7u32).map(|i| record(&[i; 5], 5, 4, 199.0 - 2.0 * i as f64));
    let records: Vec<StabilityRecord> = fours.chain(fives).collect();

    let kept = filter_stable_stems(records, 3, 1.0);

    let four_scores: Vec<f64> = kept
        .iter()
        .filter(|r| r.length == 4)
        .map(|r| r.stability_score)
        .collect();
    let five_scores: Vec<f64> = kept
        .iter()
        .filter(|r| r.length == 5)
        .map(|r| r.stability_score)
        .collect();

    let expected_fours: Vec<f64> = (0..10).map(|i| 200.0 - 2.0 * i as f64).collect();
    let expected_fives: Vec<f64> = (0..5).map(|i| 199.0 - 2.0 * i as f64).collect();
    assert_eq!(four_scores, expected_fours);
    assert_eq!(five_scores, expected_fives);
    assert_eq!(kept.len(), 15);
    assert!(kept
        .windows(2)
        .all(|w| w[0].stability_score > w[1].stability_score));
}

#[test]
fn test_affix_filter_union_of_top_and_share() {
    let filter = AffixFilter {
        top_n: 2,
        base_threshold: 5.0,
        scale: 0.0,
        max_length: 3,
    };
    let records = vec![
        affix(&[1], 50, 50.0),
        affix(&[2], 30, 30.0),
        affix(&[3], 10, 10.0),
        affix(&[4, 4, 4, 4], 6, 6.0),
        affix(&[5], 4, 4.0),
    ];

    let kept = filter.apply(records, 100);
    let tuples: Vec<Vec<SymbolId>> = kept.iter().map(|r| r.symbols.clone()).collect();
    assert_eq!(tuples, vec![vec![1], vec![2], vec![3]]);
}

#[test]
fn test_affix_thresholds() {
    assert_eq!(AffixFilter::prefix().threshold(0), 1.0);
    assert_eq!(AffixFilter::prefix().threshold(50), 2.0);
    assert_eq!(AffixFilter::prefix().threshold(1000), 1.0);
    assert_eq!(AffixFilter::suffix().threshold(50), 3.0);
    assert_eq!(AffixFilter::suffix().threshold(1000), 2.0);
}

#[test]
fn test_prefix_filter_keeps_top_fifteen() {
    let records: Vec<AffixRecord> = (0..40)
        .map(|i| affix(&[i], 100 - i as usize, 0.5))
        .collect();

    let kept = filter_prefixes(records.clone(), 10_000);
    assert_eq!(kept.len(), 15);
    assert_eq!(kept[0].symbols, vec![0]);

    assert_eq!(filter_suffixes(records, 10_000).len(), 10);
}
