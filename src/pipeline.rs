//! Per-image analysis: layout, mining, persistence and reports
//!
//! `analyze_image` is the batch job run once per image: it validates the glyph
//! geometry, builds the reading-order sequence, mines repeated patterns with
//! the configured strategy and replaces the image's stored results in one
//! commit. Reports and searches read the same input back.

use crate::config::{GlyphmineConfig, LinearizerConfig, MiningConfig, MiningStrategy};
use crate::glyph::{Glyph, GlyphId, ImageId, LinearSequence, Rect, SymbolId};
use crate::linearizer::{
    column_count, placements_from_snapshot, ColumnSnapshot, Linearizer, Placement,
};
use crate::report::{
    decorate, ListedOccurrence, ListedPattern, PatternListing, Report, ReportKind, ReportRow,
    SymbolDisplay,
};
use crate::repository::{
    AnalysisBatch, PatternRepository, PendingOccurrence, PendingPattern, StoredBoundingBox,
};
use crate::sequence::{mine_closed_patterns, FinderKind, MinedPattern, SuffixArray, SuffixTree};
use crate::stability::{
    affix_counts, attach_share, default_min_count, filter_stable_sequences, filter_stable_stems,
    score_stems, score_stored_patterns, AffixKind,
};
use crate::symbols::SymbolMetadata;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Glyph annotations of one image, as read from JSON
///
/// ```json
/// {"image_id": 7, "glyphs": [{"id": 1, "symbol_id": 17,
///   "bbox_x": 10.0, "bbox_y": 4.0, "bbox_width": 30.0, "bbox_height": 28.0}]}
/// ```
///
/// `columns`, when present, is a manually edited layout that replaces the
/// automatic column clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    pub image_id: ImageId,
    pub glyphs: Vec<Glyph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnSnapshot>>,
}

/// Placements and the sequence read from them
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub placements: Vec<Placement>,
    pub linear: LinearSequence,
    /// Glyphs with usable geometry, the ones placements refer to
    pub glyphs: Vec<Glyph>,
    /// Whether the layout came from a manual snapshot
    pub manual: bool,
}

impl Layout {
    pub fn columns(&self) -> usize {
        column_count(&self.placements)
    }
}

impl ImageInput {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read glyph file: {}", path.as_ref().display())
        })?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid glyph file: {}", path.as_ref().display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse glyph JSON")
    }

    /// Glyphs whose geometry can be clustered
    pub fn valid_glyphs(&self) -> Vec<Glyph> {
        let valid: Vec<Glyph> = self
            .glyphs
            .iter()
            .filter(|g| g.has_valid_geometry())
            .cloned()
            .collect();

        let dropped = self.glyphs.len() - valid.len();
        if dropped > 0 {
            tracing::warn!(
                image_id = self.image_id,
                dropped,
                "glyphs with invalid geometry ignored"
            );
        }
        valid
    }

    /// Column layout and reading-order sequence
    pub fn layout(&self, config: &LinearizerConfig) -> Result<Layout> {
        let glyphs = self.valid_glyphs();

        let (placements, manual) = match &self.columns {
            Some(columns) => {
                let known: HashSet<GlyphId> = glyphs.iter().map(|g| g.id).collect();
                let placements = placements_from_snapshot(columns, &known).with_context(|| {
                    format!("Invalid column snapshot for image {}", self.image_id)
                })?;
                (placements, true)
            }
            None => {
                let linearizer = Linearizer::new(config.tolerance, config.reading_direction)?;
                (linearizer.place(&glyphs), false)
            }
        };

        let linear = LinearSequence::from_placements(&placements, &glyphs);
        Ok(Layout {
            placements,
            linear,
            glyphs,
            manual,
        })
    }
}

/// Pipeline checkpoints, logged as they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    SortStart,
    /// Automatic layout produced; a reviewer may still edit the columns
    SortValidate,
    SortDone,
    AnalyzeStart,
    AnalyzeDone,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::SortStart => "SORT_START",
            AnalysisStage::SortValidate => "SORT_VALIDATE",
            AnalysisStage::SortDone => "SORT_DONE",
            AnalysisStage::AnalyzeStart => "ANALYZE_START",
            AnalysisStage::AnalyzeDone => "ANALYZE_DONE",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_stage(image_id: ImageId, stage: AnalysisStage) {
    tracing::info!(image_id, stage = %stage, "pipeline stage");
}

/// Outcome of one `analyze_image` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub image_id: ImageId,
    pub strategy: MiningStrategy,
    pub glyphs: usize,
    pub sequence_len: usize,
    pub columns: usize,
    pub patterns: usize,
    pub occurrences: usize,
    pub bounding_boxes: usize,
    pub replaced_patterns: usize,
    pub fingerprint: String,
}

/// Repeated patterns of `symbols` according to `config.strategy`
pub fn mine(symbols: &[SymbolId], config: &MiningConfig) -> Vec<MinedPattern> {
    let min_length = config.min_length;
    match config.strategy {
        MiningStrategy::SuffixArray => SuffixArray::build(symbols).mine(min_length),
        MiningStrategy::SuffixTree => SuffixTree::build(symbols).repeated_substrings(min_length),
        MiningStrategy::ClosedNgram => mine_closed_patterns(symbols, config.ngram_max_length)
            .into_iter()
            .filter(|p| p.len() >= min_length)
            .collect(),
    }
}

/// Split a glyph run wherever the column changes and box each piece
///
/// Glyphs missing from `columns` or `rects` are skipped.
pub fn occurrence_boxes(
    glyph_ids: &[GlyphId],
    columns: &HashMap<GlyphId, usize>,
    rects: &HashMap<GlyphId, Rect>,
) -> Vec<Rect> {
    let mut boxes = Vec::new();
    let mut current: Option<(usize, Rect)> = None;

    for glyph_id in glyph_ids {
        let (Some(&column), Some(rect)) = (columns.get(glyph_id), rects.get(glyph_id)) else {
            continue;
        };
        current = match current {
            Some((col, acc)) if col == column => Some((col, acc.union(rect))),
            Some((_, acc)) => {
                boxes.push(acc);
                Some((column, *rect))
            }
            None => Some((column, *rect)),
        };
    }

    if let Some((_, acc)) = current {
        boxes.push(acc);
    }
    boxes
}

/// Turn mined patterns into a repository batch for `layout`
pub fn build_batch(layout: &Layout, patterns: &[MinedPattern]) -> AnalysisBatch {
    let columns: HashMap<GlyphId, usize> = layout
        .placements
        .iter()
        .map(|p| (p.glyph_id, p.column))
        .collect();
    let rects: HashMap<GlyphId, Rect> = layout.glyphs.iter().map(|g| (g.id, g.rect())).collect();

    let mut batch = AnalysisBatch::new(layout.linear.fingerprint());
    for pattern in patterns {
        let occurrences: Vec<PendingOccurrence> = pattern
            .starts
            .iter()
            .filter_map(|&start| layout.linear.glyph_run(start, pattern.len()))
            .map(|glyph_ids| PendingOccurrence {
                bboxes: occurrence_boxes(&glyph_ids, &columns, &rects),
                glyph_ids,
            })
            .collect();

        batch.patterns.push(PendingPattern {
            symbols: pattern.symbols.clone(),
            occurrences,
        });
    }
    batch
}

/// Lay out, mine and persist one image
///
/// Replaces every stored result of the image; on any error the previous
/// results stay in place.
pub fn analyze_image<R: PatternRepository + ?Sized>(
    input: &ImageInput,
    config: &GlyphmineConfig,
    repo: &mut R,
) -> Result<AnalysisSummary> {
    config.validate().map_err(anyhow::Error::msg)?;
    let image_id = input.image_id;

    log_stage(image_id, AnalysisStage::SortStart);
    let layout = input.layout(&config.linearizer)?;
    if !layout.manual {
        log_stage(image_id, AnalysisStage::SortValidate);
    }
    log_stage(image_id, AnalysisStage::SortDone);

    log_stage(image_id, AnalysisStage::AnalyzeStart);
    let symbols = layout.linear.symbols();
    let patterns = mine(&symbols, &config.mining);
    let batch = build_batch(&layout, &patterns);
    let fingerprint = batch.fingerprint.clone();

    let commit = repo
        .replace_image_results(image_id, batch)
        .with_context(|| format!("Failed to store analysis of image {}", image_id))?;
    log_stage(image_id, AnalysisStage::AnalyzeDone);

    tracing::debug!(
        image_id,
        strategy = %config.mining.strategy,
        sequence_len = symbols.len(),
        patterns = commit.patterns,
        "analysis committed"
    );

    Ok(AnalysisSummary {
        image_id,
        strategy: config.mining.strategy,
        glyphs: input.glyphs.len(),
        sequence_len: symbols.len(),
        columns: layout.columns(),
        patterns: commit.patterns,
        occurrences: commit.occurrences,
        bounding_boxes: commit.bounding_boxes,
        replaced_patterns: commit.replaced_patterns,
        fingerprint,
    })
}

/// Exact occurrence count of `pattern` in the image's sequence
pub fn search_pattern(
    input: &ImageInput,
    config: &GlyphmineConfig,
    pattern: &[SymbolId],
    kind: FinderKind,
) -> Result<usize> {
    let layout = input.layout(&config.linearizer)?;
    let finder = kind.build(&layout.linear.symbols());
    let count = finder.search(pattern);

    tracing::debug!(
        image_id = input.image_id,
        finder = finder.name(),
        pattern_len = pattern.len(),
        count,
        "pattern search"
    );
    Ok(count)
}

/// Build one of the decorated stability reports for an image
pub fn stability_report<R: PatternRepository + ?Sized>(
    kind: ReportKind,
    input: &ImageInput,
    config: &GlyphmineConfig,
    repo: &R,
    metadata: &dyn SymbolMetadata,
) -> Result<Report> {
    let image_id = input.image_id;
    let settings = &config.stability;
    let total_glyphs = input.glyphs.len();
    let min_count = settings
        .min_count
        .unwrap_or_else(|| default_min_count(total_glyphs));

    let rows: Vec<ReportRow> = match kind {
        ReportKind::StableSequences => {
            let layout = input.layout(&config.linearizer)?;
            warn_if_stale(repo, image_id, &layout.linear)?;
            let patterns = repo.patterns(image_id)?;
            let occurrences = repo.occurrences(image_id)?;
            let scored = score_stored_patterns(
                &patterns,
                &occurrences,
                &layout.linear,
                settings.min_occurrences,
            );
            filter_stable_sequences(scored, min_count, settings.top_fraction)
                .into_iter()
                .map(ReportRow::from)
                .collect()
        }
        ReportKind::StableStems => {
            let layout = input.layout(&config.linearizer)?;
            let scored = score_stems(
                &layout.linear.symbols(),
                settings.stem_max_length,
                min_count,
            );
            filter_stable_stems(scored, min_count, settings.top_fraction)
                .into_iter()
                .map(ReportRow::from)
                .collect()
        }
        ReportKind::Prefixes | ReportKind::Suffixes => {
            let (affix, filter) = match kind {
                ReportKind::Prefixes => (AffixKind::Prefix, &settings.prefix),
                _ => (AffixKind::Suffix, &settings.suffix),
            };
            let patterns = repo.patterns(image_id)?;
            let counted = attach_share(affix_counts(
                &patterns,
                affix,
                1,
                settings.affix_max_length,
            ));
            filter
                .apply(counted, total_glyphs)
                .into_iter()
                .map(ReportRow::from)
                .collect()
        }
        ReportKind::TopPatterns => repo
            .top_patterns(image_id, settings.top_patterns_limit)?
            .into_iter()
            .map(ReportRow::from)
            .collect(),
    };

    tracing::debug!(image_id, report = %kind, items = rows.len(), min_count, "report built");
    Ok(decorate(image_id, rows, metadata))
}

fn warn_if_stale<R: PatternRepository + ?Sized>(
    repo: &R,
    image_id: ImageId,
    linear: &LinearSequence,
) -> Result<()> {
    if let Some(stored) = repo.fingerprint(image_id)? {
        if stored != linear.fingerprint() {
            tracing::warn!(
                image_id,
                "stored patterns were mined from a different layout; re-run analyze"
            );
        }
    }
    Ok(())
}

/// Every stored pattern with its occurrences and boxes
///
/// Ordered by length desc, count desc, id asc.
pub fn list_patterns<R: PatternRepository + ?Sized>(
    image_id: ImageId,
    repo: &R,
    metadata: &dyn SymbolMetadata,
) -> Result<PatternListing> {
    let mut patterns = repo.patterns(image_id)?;
    patterns.sort_by(|a, b| {
        b.length
            .cmp(&a.length)
            .then_with(|| b.occurrence_count.cmp(&a.occurrence_count))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut boxes = repo.bounding_boxes_by_occurrence(image_id)?;
    let mut by_pattern: HashMap<_, Vec<ListedOccurrence>> = HashMap::new();
    for occurrence in repo.occurrences(image_id)? {
        let bboxes: Vec<StoredBoundingBox> = boxes.remove(&occurrence.id).unwrap_or_default();
        by_pattern
            .entry(occurrence.pattern_id)
            .or_default()
            .push(ListedOccurrence {
                id: occurrence.id,
                glyph_ids: occurrence.glyph_ids,
                bboxes,
            });
    }

    let mut lengths = std::collections::BTreeSet::new();
    let items = patterns
        .into_iter()
        .map(|pattern| {
            lengths.insert(pattern.length);
            let display = SymbolDisplay::lookup(&pattern.symbol_sequence, metadata);
            ListedPattern {
                id: pattern.id,
                length: pattern.length,
                count: pattern.occurrence_count,
                label: display.label(),
                symbol: display.symbol(),
                codes: display.codes,
                symbol_values: display.symbol_values,
                seq: pattern.symbol_sequence,
                occurrences: by_pattern.remove(&pattern.id).unwrap_or_default(),
            }
        })
        .collect();

    Ok(PatternListing {
        image_id,
        items,
        lengths: lengths.into_iter().collect(),
    })
}
