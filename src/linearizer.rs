//! Spatial-to-linear glyph ordering
//!
//! Hieroglyphic papyri are written in vertical columns. The linearizer groups
//! glyph anchors into columns with a greedy 1-D clustering along x, orders each
//! column top to bottom, and numbers the columns in reading direction. The
//! result is the canonical symbol sequence every mining engine consumes.
//!
//! # Example
//!
//! ```
//! use glyphmine::glyph::Glyph;
//! use glyphmine::linearizer::{Linearizer, ReadingDirection};
//!
//! let glyphs = vec![
//!     Glyph::new(1, 10, 0.0, 0.0, 0.0, 0.0),
//!     Glyph::new(2, 11, 5.0, 40.0, 0.0, 0.0),
//!     Glyph::new(3, 12, 120.0, 0.0, 0.0, 0.0),
//! ];
//!
//! let linearizer = Linearizer::new(100.0, ReadingDirection::Ltr)?;
//! let placements = linearizer.place(&glyphs);
//! assert_eq!(glyphmine::linearizer::column_count(&placements), 2);
//! # Ok::<(), glyphmine::linearizer::LinearizeError>(())
//! ```

use crate::glyph::{Glyph, GlyphId, LinearSequence, Token};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a column layout
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinearizeError {
    #[error("tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),

    #[error("unknown reading direction '{0}' (expected 'ltr' or 'rtl')")]
    InvalidDirection(String),

    #[error("image has no glyphs")]
    NoGlyphs,

    #[error("glyph ids do not belong to image: {0:?}")]
    UnknownGlyphs(Vec<GlyphId>),

    #[error("glyph {0} appears more than once in the column snapshot")]
    DuplicateGlyph(GlyphId),
}

/// Column numbering direction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    /// Leftmost column is read first
    #[default]
    Ltr,
    /// Rightmost column is read first
    Rtl,
}

impl fmt::Display for ReadingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingDirection::Ltr => write!(f, "ltr"),
            ReadingDirection::Rtl => write!(f, "rtl"),
        }
    }
}

impl FromStr for ReadingDirection {
    type Err = LinearizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltr" => Ok(ReadingDirection::Ltr),
            "rtl" => Ok(ReadingDirection::Rtl),
            other => Err(LinearizeError::InvalidDirection(other.to_string())),
        }
    }
}

/// Column/row assignment of one glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub glyph_id: GlyphId,
    pub column: usize,
    pub row: usize,
}

/// One column of a manually edited layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub col: usize,
    pub glyph_ids: Vec<GlyphId>,
}

/// Greedy column clustering with an inclusive x tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linearizer {
    tolerance: f64,
    direction: ReadingDirection,
}

impl Linearizer {
    pub fn new(tolerance: f64, direction: ReadingDirection) -> Result<Self, LinearizeError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(LinearizeError::InvalidTolerance(tolerance));
        }
        Ok(Self {
            tolerance,
            direction,
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn direction(&self) -> ReadingDirection {
        self.direction
    }

    /// Assign every glyph a column and row
    ///
    /// Output is ordered by `(column, row)`. Empty input yields empty output.
    pub fn place(&self, glyphs: &[Glyph]) -> Vec<Placement> {
        let mut anchors: Vec<(GlyphId, f64, f64)> = glyphs
            .iter()
            .map(|g| {
                let (x, y) = g.anchor();
                (g.id, x, y)
            })
            .collect();

        // sort_by is stable: equal anchors keep input order
        anchors.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));

        let mut columns: Vec<Vec<(GlyphId, f64, f64)>> = Vec::new();
        let mut i = 0;
        while i < anchors.len() {
            let x0 = anchors[i].1;
            let mut column = Vec::new();
            while i < anchors.len() && anchors[i].1 <= x0 + self.tolerance {
                column.push(anchors[i]);
                i += 1;
            }
            column.sort_by(|a, b| a.2.total_cmp(&b.2));
            columns.push(column);
        }

        let last_column = columns.len().saturating_sub(1);
        let mut placements: Vec<Placement> = columns
            .iter()
            .enumerate()
            .flat_map(|(c, column)| {
                let column_index = match self.direction {
                    ReadingDirection::Ltr => c,
                    ReadingDirection::Rtl => last_column - c,
                };
                column.iter().enumerate().map(move |(row, &(glyph_id, _, _))| Placement {
                    glyph_id,
                    column: column_index,
                    row,
                })
            })
            .collect();

        placements.sort_by_key(|p| (p.column, p.row));

        tracing::debug!(
            glyphs = glyphs.len(),
            columns = columns.len(),
            tolerance = self.tolerance,
            direction = %self.direction,
            "linearized glyph layout"
        );

        placements
    }

    /// Place the glyphs and read them out as a linear sequence
    pub fn linearize(&self, glyphs: &[Glyph]) -> LinearSequence {
        sequence_from_placements(&self.place(glyphs), glyphs)
    }
}

/// Number of distinct columns in a layout
pub fn column_count(placements: &[Placement]) -> usize {
    placements
        .iter()
        .map(|p| p.column)
        .collect::<HashSet<_>>()
        .len()
}

/// Read placements in `(column, row)` order into tokens
///
/// Glyphs without a symbol id, or unknown to `glyphs`, are skipped.
pub fn sequence_from_placements(placements: &[Placement], glyphs: &[Glyph]) -> LinearSequence {
    let symbols: HashMap<GlyphId, _> = glyphs.iter().map(|g| (g.id, g.symbol_id)).collect();

    let mut ordered: Vec<&Placement> = placements.iter().collect();
    ordered.sort_by_key(|p| (p.column, p.row));

    let tokens = ordered
        .into_iter()
        .filter_map(|p| {
            let symbol_id = (*symbols.get(&p.glyph_id)?)?;
            Some(Token {
                glyph_id: p.glyph_id,
                symbol_id,
            })
        })
        .collect();

    LinearSequence::new(tokens)
}

impl LinearSequence {
    pub fn from_placements(placements: &[Placement], glyphs: &[Glyph]) -> Self {
        sequence_from_placements(placements, glyphs)
    }
}

/// Build placements from a user-edited column snapshot
///
/// Every glyph id must belong to the image and appear at most once.
pub fn placements_from_snapshot(
    columns: &[ColumnSnapshot],
    known_glyph_ids: &HashSet<GlyphId>,
) -> Result<Vec<Placement>, LinearizeError> {
    if known_glyph_ids.is_empty() {
        return Err(LinearizeError::NoGlyphs);
    }

    let mut seen = HashSet::new();
    let mut unknown = Vec::new();
    let mut placements = Vec::new();

    for column in columns {
        for (row, &glyph_id) in column.glyph_ids.iter().enumerate() {
            if !known_glyph_ids.contains(&glyph_id) {
                unknown.push(glyph_id);
                continue;
            }
            if !seen.insert(glyph_id) {
                return Err(LinearizeError::DuplicateGlyph(glyph_id));
            }
            placements.push(Placement {
                glyph_id,
                column: column.col,
                row,
            });
        }
    }

    if !unknown.is_empty() {
        return Err(LinearizeError::UnknownGlyphs(unknown));
    }

    placements.sort_by_key(|p| (p.column, p.row));
    Ok(placements)
}
