use super::{
    stored_fingerprint, stored_occurrences, stored_patterns, AnalysisBatch, BoxesByOccurrence,
    CommitSummary, OccurrenceId, PatternRepository, RepositoryState, Result, StateBacked,
    StoredBoundingBox, StoredOccurrence, StoredPattern,
};
use crate::glyph::ImageId;

/// Repository that lives for the duration of the process
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: RepositoryState,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBacked for InMemoryRepository {
    fn state(&self) -> &RepositoryState {
        &self.state
    }
}

impl PatternRepository for InMemoryRepository {
    fn replace_image_results(
        &mut self,
        image_id: ImageId,
        batch: AnalysisBatch,
    ) -> Result<CommitSummary> {
        let summary = self.state.replace(image_id, batch)?;
        tracing::debug!(
            image_id,
            patterns = summary.patterns,
            occurrences = summary.occurrences,
            "in-memory results replaced"
        );
        Ok(summary)
    }

    fn patterns(&self, image_id: ImageId) -> Result<Vec<StoredPattern>> {
        Ok(stored_patterns(self, image_id))
    }

    fn occurrences(&self, image_id: ImageId) -> Result<Vec<StoredOccurrence>> {
        Ok(stored_occurrences(self, image_id))
    }

    fn bounding_boxes(&self, occurrence_id: OccurrenceId) -> Result<Vec<StoredBoundingBox>> {
        Ok(self.state.bounding_boxes(occurrence_id))
    }

    fn bounding_boxes_by_occurrence(&self, image_id: ImageId) -> Result<BoxesByOccurrence> {
        Ok(self.state.image_bounding_boxes(image_id))
    }

    fn fingerprint(&self, image_id: ImageId) -> Result<Option<String>> {
        Ok(stored_fingerprint(self, image_id))
    }

    fn clear_image(&mut self, image_id: ImageId) -> Result<usize> {
        Ok(self.state.clear(image_id))
    }
}
