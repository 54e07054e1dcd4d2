#![no_main]

use glyphmine::glyph::SymbolId;
use glyphmine::sequence::{naive_count, SuffixArray, SuffixTree};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the query length, the rest is the sequence
    let Some((&query_len, rest)) = data.split_first() else {
        return;
    };
    // Small alphabet so repeats actually occur
    let symbols: Vec<SymbolId> = rest.iter().map(|b| SymbolId::from(b % 6)).collect();
    let query_len = (query_len as usize % 6).min(symbols.len());
    let pattern = &symbols[..query_len];

    let expected = naive_count(&symbols, pattern);
    assert_eq!(SuffixArray::build(&symbols).search(pattern), expected);
    assert_eq!(SuffixTree::build(&symbols).search(pattern), expected);
});
