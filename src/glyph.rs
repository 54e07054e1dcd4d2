//! Glyph geometry and the linear reading-order sequence
//!
//! A `Glyph` is one annotated sign on a papyrus image. The mining engines never
//! look at geometry: they operate on the `SymbolId`s of a `LinearSequence`, and
//! carry the `GlyphId`s along only to map patterns back to image regions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alphabet element of the mined sequence (a sign-class code)
pub type SymbolId = u32;

/// Unique identifier of one concrete glyph instance
pub type GlyphId = u64;

/// Identifier of a papyrus image
pub type ImageId = u64;

/// One annotated glyph with its bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub id: GlyphId,
    /// Sign class; glyphs without one take part in layout but not in mining
    #[serde(default)]
    pub symbol_id: Option<SymbolId>,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}

impl Glyph {
    pub fn new(id: GlyphId, symbol_id: SymbolId, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            symbol_id: Some(symbol_id),
            bbox_x: x,
            bbox_y: y,
            bbox_width: width,
            bbox_height: height,
        }
    }

    /// Centre of the bounding box, used as the clustering anchor
    pub fn anchor(&self) -> (f64, f64) {
        (
            self.bbox_x + self.bbox_width / 2.0,
            self.bbox_y + self.bbox_height / 2.0,
        )
    }

    /// Finite coordinates and non-negative extent
    pub fn has_valid_geometry(&self) -> bool {
        [self.bbox_x, self.bbox_y, self.bbox_width, self.bbox_height]
            .iter()
            .all(|v| v.is_finite())
            && self.bbox_width >= 0.0
            && self.bbox_height >= 0.0
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.bbox_x,
            y: self.bbox_y,
            width: self.bbox_width,
            height: self.bbox_height,
        }
    }
}

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Smallest rectangle enclosing both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Glyph id paired with its symbol id, in reading order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub glyph_id: GlyphId,
    pub symbol_id: SymbolId,
}

/// Reading-order sequence of tokens for one image
///
/// Always rebuilt as a whole from a column assignment; never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearSequence {
    tokens: Vec<Token>,
}

impl LinearSequence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The symbol ids the mining engines operate on
    pub fn symbols(&self) -> Vec<SymbolId> {
        self.tokens.iter().map(|t| t.symbol_id).collect()
    }

    pub fn glyph_ids(&self) -> Vec<GlyphId> {
        self.tokens.iter().map(|t| t.glyph_id).collect()
    }

    pub fn symbol_at(&self, position: usize) -> Option<SymbolId> {
        self.tokens.get(position).map(|t| t.symbol_id)
    }

    /// Glyph ids covered by `length` tokens starting at `start`
    pub fn glyph_run(&self, start: usize, length: usize) -> Option<Vec<GlyphId>> {
        let end = start.checked_add(length)?;
        self.tokens
            .get(start..end)
            .map(|run| run.iter().map(|t| t.glyph_id).collect())
    }

    /// SHA-256 over the (glyph, symbol) pairs, hex encoded
    ///
    /// Two analyses of the same image are comparable only when their
    /// fingerprints match.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for token in &self.tokens {
            hasher.update(token.glyph_id.to_le_bytes());
            hasher.update(token.symbol_id.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// glyph id -> position in linear order
#[derive(Debug, Clone, Default)]
pub struct GlyphIndex {
    positions: HashMap<GlyphId, usize>,
}

impl GlyphIndex {
    pub fn build(linear: &LinearSequence) -> Self {
        let positions = linear
            .tokens()
            .iter()
            .enumerate()
            .map(|(i, t)| (t.glyph_id, i))
            .collect();
        Self { positions }
    }

    pub fn position(&self, glyph_id: GlyphId) -> Option<usize> {
        self.positions.get(&glyph_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(pairs: &[(GlyphId, SymbolId)]) -> LinearSequence {
        LinearSequence::new(
            pairs
                .iter()
                .map(|&(glyph_id, symbol_id)| Token {
                    glyph_id,
                    symbol_id,
                })
                .collect(),
        )
    }

    #[test]
    fn test_anchor_is_bbox_centre() {
        let glyph = Glyph::new(1, 7, 10.0, 20.0, 4.0, 8.0);
        assert_eq!(glyph.anchor(), (12.0, 24.0));
    }

    #[test]
    fn test_invalid_geometry() {
        let mut glyph = Glyph::new(1, 7, 0.0, 0.0, 1.0, 1.0);
        assert!(glyph.has_valid_geometry());

        glyph.bbox_x = f64::NAN;
        assert!(!glyph.has_valid_geometry());

        glyph.bbox_x = 0.0;
        glyph.bbox_height = -1.0;
        assert!(!glyph.has_valid_geometry());
    }

    #[test]
    fn test_rect_union() {
        let a = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = Rect {
            x: 5.0,
            y: 20.0,
            width: 10.0,
            height: 5.0,
        };
        let u = a.union(&b);
        assert_eq!(u.x, 0.0);
        assert_eq!(u.y, 0.0);
        assert_eq!(u.width, 15.0);
        assert_eq!(u.height, 25.0);
    }

    #[test]
    fn test_glyph_run_bounds() {
        let linear = sequence(&[(10, 1), (11, 2), (12, 1)]);
        assert_eq!(linear.glyph_run(1, 2), Some(vec![11, 12]));
        assert_eq!(linear.glyph_run(2, 2), None);
    }

    #[test]
    fn test_fingerprint_tracks_order() {
        let a = sequence(&[(1, 5), (2, 6)]);
        let b = sequence(&[(2, 6), (1, 5)]);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_glyph_index() {
        let linear = sequence(&[(10, 1), (11, 2)]);
        let index = GlyphIndex::build(&linear);
        assert_eq!(index.position(11), Some(1));
        assert_eq!(index.position(99), None);
    }
}
