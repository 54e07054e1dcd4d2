//! Pattern mining benchmark
//!
//! Compares the three mining engines and the two search indexes on
//! synthetic glyph sequences the size of one papyrus image (a few hundred to
//! a few thousand signs).
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench pattern_mining
//! ```
//!
//! # Expected Shape
//!
//! - Suffix tree construction grows linearly with the sequence
//! - Suffix-array construction and mining grow faster than linearly
//! - Closed n-gram mining dominates on long sequences (n/2 length cap)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glyphmine::glyph::SymbolId;
use glyphmine::sequence::{mine_closed_patterns, PatternFinder, SuffixArray, SuffixTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded sequence with recurring words over a 40-sign alphabet
fn synthetic_sequence(len: usize) -> Vec<SymbolId> {
    let words: [&[SymbolId]; 4] = [&[3, 7, 7], &[12, 5], &[3, 7, 21, 9], &[30, 31, 2]];
    let mut rng = StdRng::seed_from_u64(0x9E37_79B9);
    let mut symbols = Vec::with_capacity(len);

    while symbols.len() < len {
        if rng.gen_ratio(1, 3) {
            symbols.extend_from_slice(words[rng.gen_range(0..words.len())]);
        } else {
            symbols.push(rng.gen_range(1..=40));
        }
    }
    symbols.truncate(len);
    symbols
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_construction");

    for len in [250, 1000, 4000] {
        let symbols = synthetic_sequence(len);
        group.bench_with_input(BenchmarkId::new("suffix_array", len), &symbols, |b, s| {
            b.iter(|| SuffixArray::build(black_box(s)));
        });
        group.bench_with_input(BenchmarkId::new("suffix_tree", len), &symbols, |b, s| {
            b.iter(|| SuffixTree::build(black_box(s)));
        });
    }

    group.finish();
}

fn bench_mining(c: &mut Criterion) {
    let mut group = c.benchmark_group("mining");

    for len in [250, 1000] {
        let symbols = synthetic_sequence(len);
        let array = SuffixArray::build(&symbols);
        let tree = SuffixTree::build(&symbols);

        group.bench_with_input(BenchmarkId::new("suffix_array", len), &array, |b, a| {
            b.iter(|| a.find_patterns(black_box(2)));
        });
        group.bench_with_input(BenchmarkId::new("suffix_tree", len), &tree, |b, t| {
            b.iter(|| t.find_patterns(black_box(2)));
        });
        group.bench_with_input(BenchmarkId::new("closed_ngram", len), &symbols, |b, s| {
            b.iter(|| mine_closed_patterns(black_box(s), Some(12)));
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let symbols = synthetic_sequence(4000);
    let array = SuffixArray::build(&symbols);
    let tree = SuffixTree::build(&symbols);
    let pattern: &[SymbolId] = &[3, 7, 21, 9];

    c.bench_function("search_suffix_array", |b| {
        b.iter(|| array.search(black_box(pattern)));
    });
    c.bench_function("search_suffix_tree", |b| {
        b.iter(|| tree.search(black_box(pattern)));
    });
}

criterion_group!(benches, bench_construction, bench_mining, bench_search);
criterion_main!(benches);
