//! File-backed slot storage.
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a temporary file in
//! the same directory and are renamed into place, so a crash mid-write never
//! leaves a half-written slot behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use drillkit_core::store::KeyValueStore;

/// A [`KeyValueStore`] persisting one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory: {}", dir.display()))?;
        tracing::debug!("file store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            anyhow::bail!("invalid storage key: {key:?}");
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read slot file: {}", path.display()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;
        tmp.write_all(value.as_bytes())
            .context("failed to write slot contents")?;
        tmp.as_file()
            .sync_all()
            .context("failed to flush slot contents")?;
        tmp.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to replace slot file: {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to remove slot file: {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use drillkit_core::errorbook::ErrorBook;
    use drillkit_core::model::{Answer, Difficulty, Expected, Question, QuestionType};
    use drillkit_core::store::{Slot, SlotStore};

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("practices").unwrap(), None);
    }

    #[test]
    fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested/data")).unwrap();

        store.set("studyPlan", "{\"a\":1}").unwrap();
        assert!(store.dir().join("studyPlan.json").exists());
        assert_eq!(store.get("studyPlan").unwrap().as_deref(), Some("{\"a\":1}"));

        store.set("studyPlan", "{}").unwrap();
        assert_eq!(store.get("studyPlan").unwrap().as_deref(), Some("{}"));

        store.remove("studyPlan").unwrap();
        assert_eq!(store.get("studyPlan").unwrap(), None);
        store.remove("studyPlan").unwrap();
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("").is_err());
        assert!(store.remove("a/b").is_err());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("practices", "[]").unwrap();
        store.set("practices", "[1]").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["practices.json"]);
    }

    #[test]
    fn corrupt_file_is_malformed_slot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("deletedExamIds.json"), "{not json").unwrap();

        let slots = SlotStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        assert!(slots.try_load::<Vec<String>>(Slot::DeletedExamIds).is_err());
        let ids: Vec<String> = slots.load(Slot::DeletedExamIds);
        assert!(ids.is_empty());
    }

    #[test]
    fn error_book_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let question = Question {
            id: "q1".into(),
            question_type: QuestionType::FillBlank,
            category: "english".into(),
            difficulty: Difficulty::Easy,
            prompt: "I ___ a student.".into(),
            options: vec![],
            correct_answer: Expected::Single("am".into()),
            explanation: String::new(),
            tags: vec!["grammar".into()],
            points: None,
        };
        let answers = [("q1".to_string(), Answer::single("is"))].into_iter().collect();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let records = drillkit_core::errorbook::collect(&[question], &answers, date);

        {
            let slots = SlotStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
            ErrorBook::new(slots).append(&records).unwrap();
        }

        let slots = SlotStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        let reopened = ErrorBook::new(slots).records();
        assert_eq!(reopened, records);
        assert_eq!(reopened[0].user_answer, Answer::single("is"));
    }
}
