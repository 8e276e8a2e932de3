//! Mock exam catalog.
//!
//! The catalog lists saved practices (converted to exams) ahead of a fixed set
//! of built-in exams. Practices live in the `practices` slot; deleting an exam
//! hides it by recording its id in `deletedExamIds`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DrillError;
use crate::model::{Difficulty, Practice, Question};
use crate::scoring::FULL_MARKS;
use crate::store::{Slot, SlotStore};
use crate::traits::DEFAULT_CATEGORY;

/// Minimum duration of an exam built from a practice, in minutes.
const MIN_PRACTICE_MINUTES: u64 = 30;
/// Minutes allotted per practice question.
const MINUTES_PER_QUESTION: f64 = 2.0;
/// Maximum number of tags shown as exam categories.
const MAX_EXAM_CATEGORIES: usize = 5;

/// Where an exam's questions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamSource {
    /// Shipped with drillkit; questions are generated on demand.
    Builtin,
    /// Built from a saved practice.
    Practice,
}

/// One entry in the exam catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Duration in minutes.
    pub duration: u64,
    pub question_count: usize,
    pub difficulty: Difficulty,
    /// Topic labels shown with the exam.
    pub categories: Vec<String>,
    /// Provider category used to generate questions for built-in exams.
    pub category: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub source: ExamSource,
}

impl ExamEntry {
    /// Countdown length for the exam.
    pub fn time_limit_secs(&self) -> u64 {
        self.duration * 60
    }

    pub fn is_builtin(&self) -> bool {
        self.source == ExamSource::Builtin
    }
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    id: &str,
    name: &str,
    description: &str,
    duration: u64,
    question_count: usize,
    difficulty: Difficulty,
    categories: &[&str],
    completed: Option<(f64, NaiveDate)>,
) -> ExamEntry {
    ExamEntry {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        duration,
        question_count,
        difficulty,
        categories: categories.iter().map(|c| c.to_string()).collect(),
        category: "programming".into(),
        completed: completed.is_some(),
        score: completed.map(|(score, _)| score),
        date: completed.map(|(_, date)| date),
        source: ExamSource::Builtin,
    }
}

/// The five exams every installation ships with. Two are already completed.
pub fn builtin_exams() -> Vec<ExamEntry> {
    vec![
        builtin(
            "1",
            "JavaScript fundamentals mock exam",
            "Checks your grasp of core JavaScript",
            60,
            20,
            Difficulty::Medium,
            &["JavaScript", "Syntax", "Data types"],
            None,
        ),
        builtin(
            "2",
            "React core concepts exam",
            "Checks React concepts and usage patterns",
            90,
            30,
            Difficulty::Hard,
            &["React", "Components", "Hooks", "State management"],
            None,
        ),
        builtin(
            "3",
            "Front-end skills assessment",
            "Covers HTML, CSS and JavaScript together",
            120,
            40,
            Difficulty::Hard,
            &["HTML", "CSS", "JavaScript", "Tooling"],
            None,
        ),
        builtin(
            "4",
            "CSS layout exam",
            "Focused on CSS layout techniques",
            60,
            20,
            Difficulty::Medium,
            &["CSS", "Layout", "Flexbox", "Grid"],
            NaiveDate::from_ymd_opt(2026, 1, 20).map(|d| (85.0, d)),
        ),
        builtin(
            "5",
            "Advanced JavaScript exam",
            "Closures, prototypes and async programming",
            90,
            30,
            Difficulty::Hard,
            &["JavaScript", "Async", "Closures", "Prototypes"],
            NaiveDate::from_ymd_opt(2026, 1, 15).map(|d| (72.0, d)),
        ),
    ]
}

/// Present a saved practice as an exam.
pub fn practice_exam(practice: &Practice) -> ExamEntry {
    let mut categories: Vec<String> = Vec::new();
    for tag in practice.questions.iter().flat_map(|q| &q.tags) {
        if categories.len() == MAX_EXAM_CATEGORIES {
            break;
        }
        if !categories.contains(tag) {
            categories.push(tag.clone());
        }
    }

    let minutes = (practice.total_questions as f64 * MINUTES_PER_QUESTION).ceil() as u64;
    ExamEntry {
        id: practice.id.clone(),
        name: practice.name.clone(),
        description: format!(
            "Practice generated from {}",
            practice.source_file.as_deref().unwrap_or("an uploaded file")
        ),
        duration: minutes.max(MIN_PRACTICE_MINUTES),
        question_count: practice.total_questions,
        difficulty: Difficulty::Medium,
        categories,
        category: DEFAULT_CATEGORY.into(),
        completed: false,
        score: None,
        date: None,
        source: ExamSource::Practice,
    }
}

/// Give every question an equal share of full marks.
pub fn equal_weights(questions: &mut [Question]) {
    if questions.is_empty() {
        return;
    }
    let share = FULL_MARKS / questions.len() as f64;
    for q in questions {
        q.points = Some(share);
    }
}

/// Catalog access backed by the `practices` and `deletedExamIds` slots.
#[derive(Debug, Clone)]
pub struct ExamCatalog {
    store: SlotStore,
}

impl ExamCatalog {
    pub fn new(store: SlotStore) -> Self {
        Self { store }
    }

    /// Saved practices, newest first.
    pub fn practices(&self) -> Vec<Practice> {
        self.store.load(Slot::Practices)
    }

    fn deleted_ids(&self) -> Vec<String> {
        self.store.load(Slot::DeletedExamIds)
    }

    /// Store a practice at the front of the list.
    pub fn save_practice(&self, practice: Practice) -> Result<(), DrillError> {
        let mut practices = self.practices();
        tracing::info!(id = %practice.id, questions = practice.total_questions, "practice saved");
        practices.insert(0, practice);
        self.store.save(Slot::Practices, &practices)
    }

    /// Visible practice exams followed by the built-in exams.
    pub fn list(&self) -> Vec<ExamEntry> {
        let deleted = self.deleted_ids();
        self.practices()
            .iter()
            .filter(|p| !deleted.contains(&p.id))
            .map(practice_exam)
            .chain(builtin_exams())
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<ExamEntry> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Hide an exam. Built-in exams are protected. Returns `false` if no
    /// visible practice exam has that id.
    pub fn delete(&self, id: &str) -> Result<bool, DrillError> {
        if builtin_exams().iter().any(|e| e.id == id) {
            return Err(DrillError::ProtectedExam(id.to_string()));
        }
        let mut deleted = self.deleted_ids();
        if deleted.iter().any(|d| d == id) || !self.practices().iter().any(|p| p.id == id) {
            return Ok(false);
        }
        deleted.push(id.to_string());
        self.store.save(Slot::DeletedExamIds, &deleted)?;
        Ok(true)
    }

    /// Stored questions for a practice exam, equally weighted. `None` for
    /// built-in exams and for practices with no stored questions; those are
    /// generated from a provider instead.
    pub fn questions_for(&self, exam: &ExamEntry) -> Option<Vec<Question>> {
        if exam.is_builtin() {
            return None;
        }
        let practice = self.practices().into_iter().find(|p| p.id == exam.id)?;
        let mut questions = practice.questions;
        if questions.is_empty() {
            return None;
        }
        equal_weights(&mut questions);
        Some(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{choice, single};
    use chrono::Utc;

    fn practice(name: &str, n: usize) -> Practice {
        let questions = (0..n)
            .map(|i| {
                let mut q = single(&format!("q{i}"), "general", Difficulty::Easy, "x");
                q.tags = vec![format!("tag{}", i % 7), "basics".into()];
                q
            })
            .collect();
        Practice::new(name, Some(format!("{name}.pdf")), questions, Utc::now())
    }

    #[test]
    fn builtins_are_five_with_two_completed() {
        let exams = builtin_exams();
        let ids: Vec<_> = exams.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        let completed: Vec<_> = exams.iter().filter(|e| e.completed).collect();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].score, Some(85.0));
        assert!(completed.iter().all(|e| e.date.is_some()));
    }

    #[test]
    fn practice_exam_duration_and_categories() {
        let small = practice_exam(&practice("small", 3));
        assert_eq!(small.duration, 30);
        assert_eq!(small.difficulty, Difficulty::Medium);
        assert_eq!(small.categories, vec!["tag0", "basics", "tag1", "tag2"]);

        let large = practice_exam(&practice("large", 20));
        assert_eq!(large.duration, 40);
        assert_eq!(large.categories.len(), 5);
        assert_eq!(large.time_limit_secs(), 2400);
        assert!(large.description.contains("large.pdf"));
    }

    #[test]
    fn practices_are_listed_newest_first_before_builtins() {
        let catalog = ExamCatalog::new(SlotStore::in_memory());
        let older = practice("older", 2);
        let newer = practice("newer", 2);
        catalog.save_practice(older.clone()).unwrap();
        catalog.save_practice(newer.clone()).unwrap();

        let list = catalog.list();
        assert_eq!(list.len(), 7);
        assert_eq!(list[0].id, newer.id);
        assert_eq!(list[1].id, older.id);
        assert_eq!(list[2].id, "1");
    }

    #[test]
    fn builtin_exams_cannot_be_deleted() {
        let catalog = ExamCatalog::new(SlotStore::in_memory());
        assert!(matches!(
            catalog.delete("4"),
            Err(DrillError::ProtectedExam(id)) if id == "4"
        ));
    }

    #[test]
    fn deleting_practice_hides_it_once() {
        let store = SlotStore::in_memory();
        let catalog = ExamCatalog::new(store.clone());
        let p = practice("gone", 2);
        catalog.save_practice(p.clone()).unwrap();

        assert!(catalog.delete(&p.id).unwrap());
        assert!(!catalog.delete(&p.id).unwrap());
        assert!(!catalog.delete("never-existed").unwrap());
        assert!(catalog.find(&p.id).is_none());
        assert_eq!(store.load::<Vec<String>>(Slot::DeletedExamIds), vec![p.id]);
    }

    #[test]
    fn practice_questions_get_equal_weights() {
        let catalog = ExamCatalog::new(SlotStore::in_memory());
        let p = Practice::new(
            "weights",
            None,
            vec![
                choice("a", &["A", "B"], "A"),
                choice("b", &["A", "B"], "B"),
                choice("c", &["A", "B"], "A"),
                choice("d", &["A", "B"], "B"),
            ],
            Utc::now(),
        );
        catalog.save_practice(p.clone()).unwrap();

        let exam = catalog.find(&p.id).unwrap();
        let questions = catalog.questions_for(&exam).unwrap();
        assert!(questions.iter().all(|q| q.points == Some(25.0)));
        assert!(catalog.questions_for(&builtin_exams()[0]).is_none());
    }

    #[test]
    fn empty_practice_has_no_stored_questions() {
        let catalog = ExamCatalog::new(SlotStore::in_memory());
        let mut p = practice("hollow", 0);
        p.total_questions = 6;
        catalog.save_practice(p.clone()).unwrap();

        let exam = catalog.find(&p.id).unwrap();
        assert_eq!(exam.question_count, 6);
        assert!(catalog.questions_for(&exam).is_none());
    }
}
