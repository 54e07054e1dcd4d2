//! Serializable report payloads
//!
//! Every report has the same envelope, `{image_id, items, lengths}`, so a
//! viewer can group items by length without knowing which report it shows.
//! Items keep their numeric fields and gain display data from a
//! `SymbolMetadata` source.

use crate::glyph::{GlyphId, ImageId, SymbolId};
use crate::repository::{OccurrenceId, PatternId, StoredBoundingBox, StoredPattern};
use crate::stability::{AffixRecord, StabilityRecord};
use crate::symbols::{normalize_code, normalize_unicode, unicode_to_symbol, SymbolMetadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which report to build for an image
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    #[default]
    StableSequences,
    StableStems,
    Prefixes,
    Suffixes,
    /// Most frequent stored patterns, unscored
    TopPatterns,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::StableSequences => "stable-sequences",
            ReportKind::StableStems => "stable-stems",
            ReportKind::Prefixes => "prefixes",
            ReportKind::Suffixes => "suffixes",
            ReportKind::TopPatterns => "top-patterns",
        };
        write!(f, "{}", name)
    }
}

/// Context metrics of a scored row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityMetrics {
    pub productivity: usize,
    pub boundary_strength: f64,
    pub stability_score: f64,
    pub left_types: usize,
    pub right_types: usize,
}

/// One undecorated report item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<PatternId>,
    pub seq: Vec<SymbolId>,
    pub length: usize,
    pub count: usize,
    /// Precomputed share; decoration derives one when absent
    #[serde(skip)]
    pub share_percent: Option<f64>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<StabilityMetrics>,
}

impl From<StabilityRecord> for ReportRow {
    fn from(record: StabilityRecord) -> Self {
        Self {
            pattern_id: record.pattern_id,
            length: record.length,
            count: record.count,
            share_percent: None,
            metrics: Some(StabilityMetrics {
                productivity: record.productivity,
                boundary_strength: record.boundary_strength,
                stability_score: record.stability_score,
                left_types: record.left_types,
                right_types: record.right_types,
            }),
            seq: record.symbols,
        }
    }
}

impl From<AffixRecord> for ReportRow {
    fn from(record: AffixRecord) -> Self {
        Self {
            pattern_id: None,
            length: record.length,
            count: record.count,
            share_percent: record.share_percent,
            metrics: None,
            seq: record.symbols,
        }
    }
}

impl From<StoredPattern> for ReportRow {
    fn from(pattern: StoredPattern) -> Self {
        Self {
            pattern_id: Some(pattern.id),
            length: pattern.length,
            count: pattern.occurrence_count,
            share_percent: None,
            metrics: None,
            seq: pattern.symbol_sequence,
        }
    }
}

/// A report item with display data attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoratedRow {
    #[serde(flatten)]
    pub row: ReportRow,
    pub codes: Vec<String>,
    pub unicode_values: Vec<String>,
    pub symbol_values: Vec<String>,
    /// Rendered characters joined without separator
    pub symbol: String,
    /// Non-empty codes joined by spaces
    pub label: String,
    pub share_percent: f64,
}

/// `{image_id, items, lengths}` envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub image_id: ImageId,
    pub items: Vec<DecoratedRow>,
    /// Distinct item lengths, ascending
    pub lengths: Vec<usize>,
}

impl Report {
    pub fn empty(image_id: ImageId) -> Self {
        Self {
            image_id,
            items: Vec::new(),
            lengths: Vec::new(),
        }
    }
}

/// One stored occurrence with its boxes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedOccurrence {
    pub id: OccurrenceId,
    pub glyph_ids: Vec<GlyphId>,
    pub bboxes: Vec<StoredBoundingBox>,
}

/// One stored pattern with display data and occurrences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedPattern {
    pub id: PatternId,
    pub seq: Vec<SymbolId>,
    pub length: usize,
    pub count: usize,
    pub codes: Vec<String>,
    pub label: String,
    pub symbol_values: Vec<String>,
    pub symbol: String,
    pub occurrences: Vec<ListedOccurrence>,
}

/// All stored patterns of an image, same envelope as `Report`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternListing {
    pub image_id: ImageId,
    pub items: Vec<ListedPattern>,
    pub lengths: Vec<usize>,
}

/// Per-symbol display strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolDisplay {
    pub codes: Vec<String>,
    pub unicode_values: Vec<String>,
    pub symbol_values: Vec<String>,
}

impl SymbolDisplay {
    pub fn lookup(seq: &[SymbolId], metadata: &dyn SymbolMetadata) -> Self {
        let mut display = Self::default();
        for &symbol in seq {
            let info = metadata.symbol_info(symbol).unwrap_or_default();
            let unicode = normalize_unicode(&info.unicode);
            display.codes.push(normalize_code(&info.code));
            display.symbol_values.push(unicode_to_symbol(&unicode));
            display.unicode_values.push(unicode);
        }
        display
    }

    pub fn symbol(&self) -> String {
        self.symbol_values.concat()
    }

    pub fn label(&self) -> String {
        self.codes
            .iter()
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Attach display data and shares to report rows
///
/// Rows without their own share get `count / Σcount × 100`.
pub fn decorate(image_id: ImageId, rows: Vec<ReportRow>, metadata: &dyn SymbolMetadata) -> Report {
    if rows.is_empty() {
        return Report::empty(image_id);
    }

    let total: usize = rows.iter().map(|r| r.count).sum();
    let total = total.max(1) as f64;
    let mut lengths = BTreeSet::new();

    let items = rows
        .into_iter()
        .map(|row| {
            lengths.insert(row.seq.len());
            let display = SymbolDisplay::lookup(&row.seq, metadata);
            let share_percent = row
                .share_percent
                .unwrap_or(row.count as f64 / total * 100.0);

            DecoratedRow {
                symbol: display.symbol(),
                label: display.label(),
                codes: display.codes,
                unicode_values: display.unicode_values,
                symbol_values: display.symbol_values,
                share_percent,
                row,
            }
        })
        .collect();

    Report {
        image_id,
        items,
        lengths: lengths.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{NoMetadata, SymbolCatalog, SymbolInfo};

    fn catalog() -> SymbolCatalog {
        let mut catalog = SymbolCatalog::new();
        catalog.insert(
            17,
            SymbolInfo {
                code: "g17".to_string(),
                unicode: "13153".to_string(),
            },
        );
        catalog.insert(
            3,
            SymbolInfo {
                code: "D21".to_string(),
                unicode: String::new(),
            },
        );
        catalog
    }

    fn row(seq: &[SymbolId], count: usize, share: Option<f64>) -> ReportRow {
        ReportRow {
            pattern_id: None,
            seq: seq.to_vec(),
            length: seq.len(),
            count,
            share_percent: share,
            metrics: None,
        }
    }

    #[test]
    fn test_decorate_empty() {
        let report = decorate(4, Vec::new(), &NoMetadata);
        assert_eq!(report, Report::empty(4));
    }

    #[test]
    fn test_decorate_attaches_display_data() {
        let report = decorate(4, vec![row(&[17, 3, 99], 3, None)], &catalog());
        let item = &report.items[0];

        assert_eq!(item.codes, vec!["G17", "D21", ""]);
        assert_eq!(item.unicode_values, vec!["U+13153", "", ""]);
        assert_eq!(item.symbol, "\u{13153}");
        assert_eq!(item.label, "G17 D21");
        assert_eq!(report.lengths, vec![3]);
    }

    #[test]
    fn test_decorate_shares() {
        let rows = vec![
            row(&[1, 2], 3, None),
            row(&[1], 1, None),
            row(&[5, 5, 5], 9, Some(12.5)),
        ];
        let report = decorate(1, rows, &NoMetadata);

        assert!((report.items[0].share_percent - 3.0 / 13.0 * 100.0).abs() < 1e-9);
        assert_eq!(report.items[2].share_percent, 12.5);
        assert_eq!(report.lengths, vec![1, 2, 3]);
    }

    #[test]
    fn test_report_json_shape() {
        let record = StabilityRecord {
            pattern_id: Some(8),
            symbols: vec![1, 2],
            length: 2,
            count: 4,
            productivity: 3,
            boundary_strength: 0.5,
            stability_score: 7.25,
            left_types: 1,
            right_types: 2,
        };
        let report = decorate(9, vec![ReportRow::from(record)], &NoMetadata);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["image_id"], 9);
        assert_eq!(json["lengths"], serde_json::json!([2]));
        let item = &json["items"][0];
        assert_eq!(item["seq"], serde_json::json!([1, 2]));
        assert_eq!(item["pattern_id"], 8);
        assert_eq!(item["stability_score"], 7.25);
        assert_eq!(item["share_percent"], 100.0);
    }

    #[test]
    fn test_report_kind_display() {
        assert_eq!(ReportKind::StableStems.to_string(), "stable-stems");
        assert_eq!(ReportKind::default(), ReportKind::StableSequences);
    }
}
