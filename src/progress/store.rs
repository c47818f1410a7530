//! Progress store over a key-value backend

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::backend::StorageBackend;
use super::record::ProgressRecord;
use crate::course::Course;
use crate::engine::EngineError;

/// Storage key for a lesson's progress record
pub fn progress_key(course_id: &str, lesson_id: &str) -> String {
    format!("video_progress_{}_{}", course_id, lesson_id)
}

/// Storage key for a course's completion date
pub fn completion_key(course_id: &str) -> String {
    format!("course_completion_{}", course_id)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseCompletion {
    completed_at: i64,
}

/// Progress records keyed by course and lesson
#[derive(Debug)]
pub struct ProgressStore<B> {
    backend: B,
}

impl<B: StorageBackend> ProgressStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Access the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read a record; a corrupt blob reads as a fresh record
    pub fn get(&self, course_id: &str, lesson_id: &str) -> Option<ProgressRecord> {
        let key = progress_key(course_id, lesson_id);
        let blob = self.backend.get(&key)?;
        match serde_json::from_str(&blob) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Discarding corrupt progress for {}: {}", key, e);
                Some(ProgressRecord::default())
            }
        }
    }

    /// Read a record or a fresh default
    pub fn get_or_default(&self, course_id: &str, lesson_id: &str) -> ProgressRecord {
        self.get(course_id, lesson_id).unwrap_or_default()
    }

    /// Write a full record
    ///
    /// `watched_seconds` never decreases: the stored value is the maximum of
    /// the existing and the new one.
    pub fn put(
        &mut self,
        course_id: &str,
        lesson_id: &str,
        mut record: ProgressRecord,
    ) -> Result<(), EngineError> {
        if let Some(existing) = self.get(course_id, lesson_id) {
            record.observe_position(existing.watched_seconds);
        }
        self.replace(course_id, lesson_id, record)
    }

    /// Overwrite a record as given, in a single write
    ///
    /// Unlike `put`, this may lower `watched_seconds`. Used by administrative
    /// overrides that clear progress.
    pub fn replace(
        &mut self,
        course_id: &str,
        lesson_id: &str,
        record: ProgressRecord,
    ) -> Result<(), EngineError> {
        let key = progress_key(course_id, lesson_id);
        tracing::debug!(
            "Persisting {} (watched {:.0}s, completed {})",
            key,
            record.watched_seconds,
            record.is_completed
        );
        self.backend.set(&key, serde_json::to_string(&record)?)
    }

    /// Delete a record, returning true if one existed
    pub fn reset(&mut self, course_id: &str, lesson_id: &str) -> Result<bool, EngineError> {
        self.backend.delete(&progress_key(course_id, lesson_id))
    }

    /// Delete every record stored for a course, including lessons no longer
    /// in the catalog
    pub fn reset_course(&mut self, course_id: &str) -> Result<usize, EngineError> {
        let keys = self.backend.keys_with_prefix(&progress_key(course_id, ""));
        for key in &keys {
            self.backend.delete(key)?;
        }
        Ok(keys.len())
    }

    /// All stored records for a course's lessons, keyed by lesson id
    pub fn records_for(&self, course: &Course) -> HashMap<String, ProgressRecord> {
        course
            .lessons
            .iter()
            .filter_map(|l| self.get(&course.id, &l.id).map(|r| (l.id.clone(), r)))
            .collect()
    }

    /// When the course first reached 100%, if it has
    pub fn completion_date(&self, course_id: &str) -> Option<i64> {
        let blob = self.backend.get(&completion_key(course_id))?;
        serde_json::from_str::<CourseCompletion>(&blob).ok().map(|c| c.completed_at)
    }

    pub fn set_completion_date(&mut self, course_id: &str, at: i64) -> Result<(), EngineError> {
        let blob = serde_json::to_string(&CourseCompletion { completed_at: at })?;
        self.backend.set(&completion_key(course_id), blob)
    }

    pub fn clear_completion_date(&mut self, course_id: &str) -> Result<bool, EngineError> {
        self.backend.delete(&completion_key(course_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::LessonKind;
    use crate::course::model::fixtures::{course, lesson};
    use crate::progress::backend::MemoryBackend;
    use pretty_assertions::assert_eq;

    fn store() -> ProgressStore<MemoryBackend> {
        ProgressStore::new(MemoryBackend::new())
    }

    #[test]
    fn key_format_matches_browser_store() {
        assert_eq!(progress_key("0", "0-1"), "video_progress_0_0-1");
        assert_eq!(completion_key("0"), "course_completion_0");
    }

    #[test]
    fn get_missing_is_none() {
        assert!(store().get("c", "l").is_none());
    }

    #[test]
    fn replace_may_lower_watch_time() {
        let mut store = store();
        store.put("c", "l", ProgressRecord { watched_seconds: 300.0, ..Default::default() }).unwrap();
        store.put("c", "l", ProgressRecord { watched_seconds: 20.0, ..Default::default() }).unwrap();
        assert_eq!(store.get("c", "l").unwrap().watched_seconds, 300.0);

        store.replace("c", "l", ProgressRecord::default()).unwrap();
        assert_eq!(store.get("c", "l"), Some(ProgressRecord::default()));
    }

    #[test]
    fn put_then_get() {
        let mut store = store();
        let record = ProgressRecord { watched_seconds: 42.0, ..Default::default() };
        store.put("c", "l", record.clone()).unwrap();
        assert_eq!(store.get("c", "l"), Some(record));
    }

    #[test]
    fn put_never_lowers_watched_seconds() {
        let mut store = store();
        store.put("c", "l", ProgressRecord { watched_seconds: 300.0, ..Default::default() }).unwrap();
        store.put("c", "l", ProgressRecord { watched_seconds: 120.0, ..Default::default() }).unwrap();
        assert_eq!(store.get_or_default("c", "l").watched_seconds, 300.0);
    }

    #[test]
    fn reset_deletes_record() {
        let mut store = store();
        store.put("c", "l", ProgressRecord::default()).unwrap();
        assert!(store.reset("c", "l").unwrap());
        assert!(store.get("c", "l").is_none());
        assert!(!store.reset("c", "l").unwrap());
    }

    #[test]
    fn reset_course_removes_only_that_course() {
        let mut store = store();
        store.put("c", "a", ProgressRecord::default()).unwrap();
        store.put("c", "gone", ProgressRecord::default()).unwrap();
        store.put("other", "a", ProgressRecord::default()).unwrap();
        store.set_completion_date("c", 1).unwrap();

        assert_eq!(store.reset_course("c").unwrap(), 2);
        assert!(store.get("c", "a").is_none());
        assert!(store.get("other", "a").is_some());
        assert_eq!(store.completion_date("c"), Some(1));
    }

    #[test]
    fn corrupt_blob_reads_as_fresh_record() {
        let mut backend = MemoryBackend::new();
        backend.set(&progress_key("c", "l"), "{oops".into()).unwrap();
        let store = ProgressStore::new(backend);
        assert_eq!(store.get("c", "l"), Some(ProgressRecord::default()));
    }

    #[test]
    fn records_for_only_includes_stored_lessons() {
        let c = course(
            "c",
            vec![lesson("a", 0, LessonKind::Video, 10), lesson("b", 1, LessonKind::Video, 10)],
        );
        let mut store = store();
        store.put("c", "b", ProgressRecord { is_completed: true, ..Default::default() }).unwrap();
        store.put("other", "a", ProgressRecord::default()).unwrap();

        let records = store.records_for(&c);
        assert_eq!(records.len(), 1);
        assert!(records["b"].is_completed);
    }

    #[test]
    fn completion_date_round_trip() {
        let mut store = store();
        assert!(store.completion_date("c").is_none());
        store.set_completion_date("c", 1_700_000_000).unwrap();
        assert_eq!(store.completion_date("c"), Some(1_700_000_000));
        assert!(store.clear_completion_date("c").unwrap());
        assert!(store.completion_date("c").is_none());
    }
}
