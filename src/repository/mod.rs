// Pattern Repository: per-image storage of mined patterns
//
// One image's analysis is a set of patterns, their occurrences (glyph-id runs)
// and the bounding boxes drawn for each occurrence. A new analysis replaces the
// previous one for that image as a single unit: either every row of the batch
// is stored or the prior results stay exactly as they were.
//
// Two backends share the `PatternRepository` trait:
// - `InMemoryRepository` for tests and one-shot CLI runs
// - `JsonFileRepository`, which rewrites a JSON store through a temp file and
//   renames it into place

mod file;
mod memory;

pub use file::JsonFileRepository;
pub use memory::InMemoryRepository;

use crate::glyph::{GlyphId, ImageId, Rect, SymbolId};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

pub type PatternId = u64;
pub type OccurrenceId = u64;
pub type BoundingBoxId = u64;

/// One image's bounding boxes keyed by occurrence
pub type BoxesByOccurrence = FnvHashMap<OccurrenceId, Vec<StoredBoundingBox>>;

/// Shortest pattern the repository accepts
pub const MIN_PATTERN_LENGTH: usize = 2;

/// Fewest occurrences a stored pattern may have
pub const MIN_OCCURRENCES: usize = 2;

/// Errors raised while validating or persisting an analysis batch
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Pattern {symbols:?} has length {length}, minimum is {min}", min = MIN_PATTERN_LENGTH)]
    InvalidPattern { symbols: Vec<SymbolId>, length: usize },

    #[error(
        "Pattern {symbols:?} has {occurrences} occurrence(s), minimum is {min}",
        min = MIN_OCCURRENCES
    )]
    CountMismatch {
        symbols: Vec<SymbolId>,
        occurrences: usize,
    },

    #[error("Occurrence of {symbols:?} covers {actual} glyph(s), expected {expected}")]
    OccurrenceLength {
        symbols: Vec<SymbolId>,
        expected: usize,
        actual: usize,
    },

    #[error("Pattern {0:?} appears twice in one batch")]
    DuplicatePattern(Vec<SymbolId>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// A persisted pattern row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPattern {
    pub id: PatternId,
    pub image_id: ImageId,
    pub symbol_sequence: Vec<SymbolId>,
    pub length: usize,
    pub occurrence_count: usize,
}

/// A persisted occurrence row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOccurrence {
    pub id: OccurrenceId,
    pub pattern_id: PatternId,
    pub glyph_ids: Vec<GlyphId>,
}

/// A persisted bounding box of one occurrence segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBoundingBox {
    pub id: BoundingBoxId,
    pub occurrence_id: OccurrenceId,
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub width: f64,
}

/// An occurrence waiting to be committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOccurrence {
    pub glyph_ids: Vec<GlyphId>,
    pub bboxes: Vec<Rect>,
}

/// A pattern and its occurrences waiting to be committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPattern {
    pub symbols: Vec<SymbolId>,
    pub occurrences: Vec<PendingOccurrence>,
}

/// Everything one analysis run produced for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBatch {
    /// `LinearSequence::fingerprint` of the mined sequence
    pub fingerprint: String,
    pub patterns: Vec<PendingPattern>,
}

impl AnalysisBatch {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            patterns: Vec::new(),
        }
    }

    /// Check every pattern before anything is written
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for pattern in &self.patterns {
            let length = pattern.symbols.len();
            if length < MIN_PATTERN_LENGTH {
                return Err(RepositoryError::InvalidPattern {
                    symbols: pattern.symbols.clone(),
                    length,
                });
            }
            if pattern.occurrences.len() < MIN_OCCURRENCES {
                return Err(RepositoryError::CountMismatch {
                    symbols: pattern.symbols.clone(),
                    occurrences: pattern.occurrences.len(),
                });
            }
            if let Some(bad) = pattern
                .occurrences
                .iter()
                .find(|o| o.glyph_ids.len() != length)
            {
                return Err(RepositoryError::OccurrenceLength {
                    symbols: pattern.symbols.clone(),
                    expected: length,
                    actual: bad.glyph_ids.len(),
                });
            }
            if !seen.insert(&pattern.symbols) {
                return Err(RepositoryError::DuplicatePattern(pattern.symbols.clone()));
            }
        }

        Ok(())
    }
}

/// What a successful commit wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub image_id: ImageId,
    pub patterns: usize,
    pub occurrences: usize,
    pub bounding_boxes: usize,
    /// Patterns of the previous analysis that were removed
    pub replaced_patterns: usize,
}

/// All stored rows of one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResults {
    pub fingerprint: String,
    pub patterns: Vec<StoredPattern>,
    pub occurrences: Vec<StoredOccurrence>,
    pub bounding_boxes: Vec<StoredBoundingBox>,
}

/// Whole store contents, shared by both backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryState {
    next_pattern_id: PatternId,
    next_occurrence_id: OccurrenceId,
    next_bbox_id: BoundingBoxId,
    images: BTreeMap<ImageId, ImageResults>,
}

impl RepositoryState {
    /// Validate `batch` and apply it, leaving `self` untouched on error
    pub fn replace(&mut self, image_id: ImageId, batch: AnalysisBatch) -> Result<CommitSummary> {
        batch.validate()?;

        let mut next_pattern_id = self.next_pattern_id;
        let mut next_occurrence_id = self.next_occurrence_id;
        let mut next_bbox_id = self.next_bbox_id;
        let mut results = ImageResults {
            fingerprint: batch.fingerprint,
            ..ImageResults::default()
        };

        for pending in batch.patterns {
            next_pattern_id += 1;
            let pattern_id = next_pattern_id;

            results.patterns.push(StoredPattern {
                id: pattern_id,
                image_id,
                length: pending.symbols.len(),
                occurrence_count: pending.occurrences.len(),
                symbol_sequence: pending.symbols,
            });

            for occurrence in pending.occurrences {
                next_occurrence_id += 1;
                let occurrence_id = next_occurrence_id;

                for rect in occurrence.bboxes {
                    next_bbox_id += 1;
                    results.bounding_boxes.push(StoredBoundingBox {
                        id: next_bbox_id,
                        occurrence_id,
                        x: rect.x,
                        y: rect.y,
                        height: rect.height,
                        width: rect.width,
                    });
                }

                results.occurrences.push(StoredOccurrence {
                    id: occurrence_id,
                    pattern_id,
                    glyph_ids: occurrence.glyph_ids,
                });
            }
        }

        let summary = CommitSummary {
            image_id,
            patterns: results.patterns.len(),
            occurrences: results.occurrences.len(),
            bounding_boxes: results.bounding_boxes.len(),
            replaced_patterns: self
                .images
                .get(&image_id)
                .map_or(0, |old| old.patterns.len()),
        };

        self.next_pattern_id = next_pattern_id;
        self.next_occurrence_id = next_occurrence_id;
        self.next_bbox_id = next_bbox_id;
        self.images.insert(image_id, results);

        Ok(summary)
    }

    pub fn image(&self, image_id: ImageId) -> Option<&ImageResults> {
        self.images.get(&image_id)
    }

    /// Drop an image's rows, returning how many patterns were removed
    pub fn clear(&mut self, image_id: ImageId) -> usize {
        self.images
            .remove(&image_id)
            .map_or(0, |old| old.patterns.len())
    }

    /// Group an image's boxes by occurrence in one pass
    fn image_bounding_boxes(&self, image_id: ImageId) -> BoxesByOccurrence {
        let mut grouped = BoxesByOccurrence::default();
        if let Some(results) = self.images.get(&image_id) {
            for bbox in &results.bounding_boxes {
                grouped
                    .entry(bbox.occurrence_id)
                    .or_default()
                    .push(bbox.clone());
            }
        }
        grouped
    }

    fn bounding_boxes(&self, occurrence_id: OccurrenceId) -> Vec<StoredBoundingBox> {
        self.images
            .values()
            .flat_map(|r| r.bounding_boxes.iter())
            .filter(|b| b.occurrence_id == occurrence_id)
            .cloned()
            .collect()
    }
}

/// Storage for per-image analysis results
pub trait PatternRepository {
    /// Atomically replace every stored row of `image_id` with `batch`
    fn replace_image_results(
        &mut self,
        image_id: ImageId,
        batch: AnalysisBatch,
    ) -> Result<CommitSummary>;

    /// Stored patterns of an image, in insertion order
    fn patterns(&self, image_id: ImageId) -> Result<Vec<StoredPattern>>;

    /// Stored occurrences of an image, in insertion order
    fn occurrences(&self, image_id: ImageId) -> Result<Vec<StoredOccurrence>>;

    fn bounding_boxes(&self, occurrence_id: OccurrenceId) -> Result<Vec<StoredBoundingBox>>;

    /// Every box of an image, grouped by occurrence
    fn bounding_boxes_by_occurrence(&self, image_id: ImageId) -> Result<BoxesByOccurrence>;

    /// Fingerprint of the sequence the stored results were mined from
    fn fingerprint(&self, image_id: ImageId) -> Result<Option<String>>;

    /// Remove an image's results; returns the number of patterns removed
    fn clear_image(&mut self, image_id: ImageId) -> Result<usize>;

    /// Most frequent patterns: count desc, length desc, id asc
    fn top_patterns(&self, image_id: ImageId, limit: usize) -> Result<Vec<StoredPattern>> {
        let mut patterns = self.patterns(image_id)?;
        patterns.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then_with(|| b.length.cmp(&a.length))
                .then_with(|| a.id.cmp(&b.id))
        });
        patterns.truncate(limit);
        Ok(patterns)
    }
}

/// Read access shared by both backends
trait StateBacked {
    fn state(&self) -> &RepositoryState;
}

fn stored_patterns<S: StateBacked + ?Sized>(repo: &S, image_id: ImageId) -> Vec<StoredPattern> {
    repo.state()
        .image(image_id)
        .map(|r| r.patterns.clone())
        .unwrap_or_default()
}

fn stored_occurrences<S: StateBacked + ?Sized>(
    repo: &S,
    image_id: ImageId,
) -> Vec<StoredOccurrence> {
    repo.state()
        .image(image_id)
        .map(|r| r.occurrences.clone())
        .unwrap_or_default()
}

fn stored_fingerprint<S: StateBacked + ?Sized>(repo: &S, image_id: ImageId) -> Option<String> {
    repo.state().image(image_id).map(|r| r.fingerprint.clone())
}
