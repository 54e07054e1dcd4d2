// Integration Test Utilities
//
// Fixture images shared by the pipeline and CLI suites

#![allow(dead_code)]

use glyphmine::glyph::{Glyph, GlyphId, ImageId, SymbolId};
use glyphmine::pipeline::ImageInput;
use std::fs;
use std::path::{Path, PathBuf};

/// Column 0 then column 1, top to bottom
///
/// `[10, 11, 12]` repeats five times with a different neighbour each time,
/// `[10, 11]` six times.
pub const TWO_COLUMN_SYMBOLS: [[SymbolId; 12]; 2] = [
    [10, 11, 12, 1, 10, 11, 12, 2, 10, 11, 12, 3],
    [4, 10, 11, 12, 5, 10, 11, 12, 6, 7, 10, 11],
];

pub const CATALOG_TOML: &str = r#"
[[symbol]]
id = 10
code = "g17"
unicode = "13153"

[[symbol]]
id = 11
code = "D21"
unicode = "U+1308B"

[[symbol]]
id = 12
code = "N35"
"#;

/// Glyphs of a column layout: columns 300px apart, rows 30px apart
pub fn columns_image(image_id: ImageId, columns: &[&[SymbolId]]) -> ImageInput {
    let mut glyphs = Vec::new();
    for (c, column) in columns.iter().enumerate() {
        for (row, &symbol) in column.iter().enumerate() {
            let id = glyphs.len() as GlyphId + 1;
            glyphs.push(Glyph::new(
                id,
                symbol,
                c as f64 * 300.0,
                row as f64 * 30.0,
                24.0,
                26.0,
            ));
        }
    }
    ImageInput {
        image_id,
        glyphs,
        columns: None,
    }
}

pub fn two_column_image(image_id: ImageId) -> ImageInput {
    columns_image(
        image_id,
        &[&TWO_COLUMN_SYMBOLS[0], &TWO_COLUMN_SYMBOLS[1]],
    )
}

pub fn two_column_sequence() -> Vec<SymbolId> {
    TWO_COLUMN_SYMBOLS.concat()
}

pub fn write_image(dir: &Path, name: &str, input: &ImageInput) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(input).unwrap()).unwrap();
    path
}

pub fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("symbols.toml");
    fs::write(&path, CATALOG_TOML).unwrap();
    path
}
