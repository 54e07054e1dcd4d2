use super::{
    stored_fingerprint, stored_occurrences, stored_patterns, AnalysisBatch, BoxesByOccurrence,
    CommitSummary, OccurrenceId, PatternRepository, RepositoryState, Result, StateBacked,
    StoredBoundingBox, StoredOccurrence, StoredPattern,
};
use crate::glyph::ImageId;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Repository backed by one JSON file
///
/// Every mutation rewrites the whole store into a temp file in the same
/// directory and renames it over the old one. The in-memory copy is updated
/// only after the rename succeeded, so a failed write changes nothing.
///
/// # Example
/// ```no_run
/// use glyphmine::repository::{JsonFileRepository, PatternRepository};
///
/// let repo = JsonFileRepository::open("glyphmine-store.json")?;
/// let top = repo.top_patterns(7, 10)?;
/// # Ok::<(), glyphmine::repository::RepositoryError>(())
/// ```
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    state: RepositoryState,
}

impl JsonFileRepository {
    /// Open a store, starting empty if the file does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)?
        } else {
            RepositoryState::default()
        };

        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_state(&self, state: &RepositoryState) -> Result<()> {
        let parent_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(&temp_file);
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy, write it, then adopt it
    fn commit<T>(&mut self, change: impl FnOnce(&mut RepositoryState) -> Result<T>) -> Result<T> {
        let mut next = self.state.clone();
        let outcome = change(&mut next)?;
        self.write_state(&next)?;
        self.state = next;
        Ok(outcome)
    }
}

impl StateBacked for JsonFileRepository {
    fn state(&self) -> &RepositoryState {
        &self.state
    }
}

impl PatternRepository for JsonFileRepository {
    fn replace_image_results(
        &mut self,
        image_id: ImageId,
        batch: AnalysisBatch,
    ) -> Result<CommitSummary> {
        let summary = self.commit(|state| state.replace(image_id, batch))?;
        tracing::debug!(
            image_id,
            path = %self.path.display(),
            patterns = summary.patterns,
            replaced = summary.replaced_patterns,
            "store file rewritten"
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
        if self.state.image(image_id).is_none() {
            return Ok(0);
        }
        self.commit(|state| Ok(state.clear(image_id)))
    }
}
