//! Error collection and the persistent error book.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DrillError;
use crate::model::{Answer, Difficulty, Expected, Question, QuestionType};
use crate::scoring::is_correct;
use crate::store::{Slot, SlotStore};

/// A persisted record of one incorrectly answered (or unanswered) question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub id: String,
    pub question_id: String,
    /// The question prompt.
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    /// `null` when the question was left unanswered.
    pub user_answer: Answer,
    pub correct_answer: Expected,
    pub explanation: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    #[serde(default)]
    pub reviewed: bool,
}

impl ErrorRecord {
    fn from_question(question: &Question, answer: Option<&Answer>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question_id: question.id.clone(),
            question: question.prompt.clone(),
            question_type: question.question_type,
            options: question.options.clone(),
            user_answer: answer.cloned().unwrap_or_default(),
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty,
            date,
            tags: question.tags.clone(),
            error_reason: None,
            reviewed: false,
        }
    }
}

/// One record per incorrect question, in question order.
pub fn collect(
    questions: &[Question],
    answers: &HashMap<String, Answer>,
    date: NaiveDate,
) -> Vec<ErrorRecord> {
    questions
        .iter()
        .filter_map(|q| {
            let answer = answers.get(&q.id);
            (!is_correct(q, answer)).then(|| ErrorRecord::from_question(q, answer, date))
        })
        .collect()
}

/// Sort orders for error book queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Newest first.
    #[default]
    Date,
    /// Hardest first.
    Difficulty,
    /// Alphabetical by category.
    Category,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" => Ok(SortBy::Date),
            "difficulty" => Ok(SortBy::Difficulty),
            "category" => Ok(SortBy::Category),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Criteria for narrowing the error book. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ErrorFilter {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub error_reason: Option<String>,
    pub reviewed: Option<bool>,
    /// Case-insensitive match against the prompt and tags.
    pub search: Option<String>,
    pub sort: SortBy,
}

impl ErrorFilter {
    pub fn matches(&self, record: &ErrorRecord) -> bool {
        if self.category.as_ref().is_some_and(|c| *c != record.category) {
            return false;
        }
        if self.difficulty.is_some_and(|d| d != record.difficulty) {
            return false;
        }
        if self
            .error_reason
            .as_ref()
            .is_some_and(|r| record.error_reason.as_ref() != Some(r))
        {
            return false;
        }
        if self.reviewed.is_some_and(|r| r != record.reviewed) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let in_prompt = record.question.to_lowercase().contains(&term);
            let in_tags = record
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&term));
            if !in_prompt && !in_tags {
                return false;
            }
        }
        true
    }
}

/// Filter and sort records.
pub fn query<'a>(records: &'a [ErrorRecord], filter: &ErrorFilter) -> Vec<&'a ErrorRecord> {
    let mut matched: Vec<&ErrorRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    match filter.sort {
        SortBy::Date => matched.sort_by_key(|r| Reverse(r.date)),
        SortBy::Difficulty => matched.sort_by_key(|r| Reverse(r.difficulty)),
        SortBy::Category => matched.sort_by(|a, b| a.category.cmp(&b.category)),
    }
    matched
}

/// Summary counts over the error book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBookStats {
    pub total: usize,
    pub reviewed: usize,
    pub unreviewed: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_reason: BTreeMap<String, usize>,
}

pub fn stats(records: &[ErrorRecord]) -> ErrorBookStats {
    let mut stats = ErrorBookStats {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        if record.reviewed {
            stats.reviewed += 1;
        }
        *stats.by_category.entry(record.category.clone()).or_default() += 1;
        if let Some(reason) = &record.error_reason {
            *stats.by_reason.entry(reason.clone()).or_default() += 1;
        }
    }
    stats.unreviewed = stats.total - stats.reviewed;
    stats
}

/// The durable error list, kept in the `errorQuestions` slot.
///
/// Every mutation is a read-modify-write of the whole slot. Two writers
/// working from the same snapshot race, and the later write wins.
#[derive(Debug, Clone)]
pub struct ErrorBook {
    store: SlotStore,
}

impl ErrorBook {
    pub fn new(store: SlotStore) -> Self {
        Self { store }
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.store.load(Slot::ErrorQuestions)
    }

    /// Append records to the end of the list.
    pub fn append(&self, new_records: &[ErrorRecord]) -> Result<(), DrillError> {
        if new_records.is_empty() {
            return Ok(());
        }
        let mut records = self.records();
        records.extend_from_slice(new_records);
        self.store.save(Slot::ErrorQuestions, &records)?;
        tracing::info!(
            appended = new_records.len(),
            total = records.len(),
            "error book updated"
        );
        Ok(())
    }

    /// Flip the reviewed flag of a record. Returns the new value, or `None` if
    /// no record has that id.
    pub fn toggle_reviewed(&self, id: &str) -> Result<Option<bool>, DrillError> {
        let mut records = self.records();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        record.reviewed = !record.reviewed;
        let reviewed = record.reviewed;
        self.store.save(Slot::ErrorQuestions, &records)?;
        Ok(Some(reviewed))
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, DrillError> {
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.store.save(Slot::ErrorQuestions, &records)?;
        Ok(true)
    }

    pub fn query(&self, filter: &ErrorFilter) -> Vec<ErrorRecord> {
        let records = self.records();
        query(&records, filter).into_iter().cloned().collect()
    }

    pub fn stats(&self) -> ErrorBookStats {
        stats(&self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{choice, multi, single};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn record(id: &str, category: &str, difficulty: Difficulty, date: NaiveDate) -> ErrorRecord {
        let mut r = ErrorRecord::from_question(
            &single(id, category, difficulty, "x"),
            None,
            date,
        );
        r.id = id.into();
        r
    }

    #[test]
    fn collects_only_incorrect_in_order() {
        let questions = vec![
            choice("q1", &["A", "B"], "B"),
            single("q2", "math", Difficulty::Easy, "4"),
            multi("q3", &["a", "b"]),
            single("q4", "math", Difficulty::Easy, "5"),
        ];
        let answers: HashMap<String, Answer> = [
            ("q1".to_string(), Answer::single("A")),
            ("q2".to_string(), Answer::single("4")),
            ("q3".to_string(), Answer::multiple(["a"])),
        ]
        .into_iter()
        .collect();

        let records = collect(&questions, &answers, day(2));
        let ids: Vec<_> = records.iter().map(|r| r.question_id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q3", "q4"]);

        assert_eq!(records[0].user_answer, Answer::single("A"));
        assert_eq!(records[0].correct_answer, Expected::Single("B".into()));
        assert!(records[2].user_answer.is_unanswered());
        assert!(records.iter().all(|r| !r.reviewed && r.date == day(2)));
    }

    #[test]
    fn unanswered_serializes_as_null() {
        let r = record("e1", "math", Difficulty::Easy, day(1));
        let json = serde_json::to_value(&r).unwrap();
        assert!(json["userAnswer"].is_null());
        assert_eq!(json["questionId"], "e1");
        assert_eq!(json["date"], "2026-05-01");
    }

    #[test]
    fn filter_by_fields_and_search() {
        let mut a = record("e1", "math", Difficulty::Easy, day(1));
        a.tags = vec!["Fractions".into()];
        let mut b = record("e2", "english", Difficulty::Hard, day(2));
        b.error_reason = Some("careless".into());
        b.reviewed = true;
        let records = vec![a, b];

        let by_category = ErrorFilter {
            category: Some("math".into()),
            ..Default::default()
        };
        assert_eq!(query(&records, &by_category).len(), 1);

        let by_reason = ErrorFilter {
            error_reason: Some("careless".into()),
            ..Default::default()
        };
        assert_eq!(query(&records, &by_reason)[0].id, "e2");

        let unreviewed = ErrorFilter {
            reviewed: Some(false),
            ..Default::default()
        };
        assert_eq!(query(&records, &unreviewed)[0].id, "e1");

        let search_tag = ErrorFilter {
            search: Some("fraction".into()),
            ..Default::default()
        };
        assert_eq!(query(&records, &search_tag)[0].id, "e1");

        let search_prompt = ErrorFilter {
            search: Some("PROMPT FOR E2".into()),
            ..Default::default()
        };
        assert_eq!(query(&records, &search_prompt)[0].id, "e2");
    }

    #[test]
    fn sort_orders() {
        let records = vec![
            record("e1", "math", Difficulty::Medium, day(3)),
            record("e2", "english", Difficulty::Hard, day(1)),
            record("e3", "general", Difficulty::Easy, day(5)),
        ];
        let ids = |sort| {
            let filter = ErrorFilter {
                sort,
                ..Default::default()
            };
            query(&records, &filter)
                .iter()
                .map(|r| r.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(SortBy::Date), vec!["e3", "e1", "e2"]);
        assert_eq!(ids(SortBy::Difficulty), vec!["e2", "e1", "e3"]);
        assert_eq!(ids(SortBy::Category), vec!["e2", "e3", "e1"]);
    }

    #[test]
    fn stats_counts() {
        let mut a = record("e1", "math", Difficulty::Easy, day(1));
        a.reviewed = true;
        a.error_reason = Some("concept".into());
        let b = record("e2", "math", Difficulty::Easy, day(1));
        let s = stats(&[a, b]);
        assert_eq!(s.total, 2);
        assert_eq!(s.reviewed, 1);
        assert_eq!(s.unreviewed, 1);
        assert_eq!(s.by_category["math"], 2);
        assert_eq!(s.by_reason["concept"], 1);
    }

    #[test]
    fn book_append_toggle_delete() {
        let book = ErrorBook::new(SlotStore::in_memory());
        book.append(&[
            record("e1", "math", Difficulty::Easy, day(1)),
            record("e2", "math", Difficulty::Easy, day(1)),
        ])
        .unwrap();
        book.append(&[record("e3", "english", Difficulty::Hard, day(2))])
            .unwrap();
        assert_eq!(book.records().len(), 3);

        assert_eq!(book.toggle_reviewed("e2").unwrap(), Some(true));
        assert_eq!(book.toggle_reviewed("e2").unwrap(), Some(false));
        assert_eq!(book.toggle_reviewed("missing").unwrap(), None);

        assert!(book.delete("e1").unwrap());
        assert!(!book.delete("e1").unwrap());
        let ids: Vec<_> = book.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["e2", "e3"]);
    }

    #[test]
    fn append_nothing_leaves_slot_untouched() {
        let store = SlotStore::in_memory();
        let mut rx = store.subscribe();
        ErrorBook::new(store).append(&[]).unwrap();
        assert!(rx.try_recv().is_err());
    }

    /// Concurrent appends are not merged: two writers that read the same
    /// snapshot overwrite each other and the later write wins.
    #[test]
    fn concurrent_appends_last_writer_wins() {
        let store = SlotStore::in_memory();
        let book = ErrorBook::new(store.clone());
        book.append(&[record("base", "math", Difficulty::Easy, day(1))])
            .unwrap();

        let mut first = book.records();
        let mut second = book.records();
        first.push(record("from-a", "math", Difficulty::Easy, day(2)));
        second.push(record("from-b", "math", Difficulty::Easy, day(2)));
        store.save(Slot::ErrorQuestions, &first).unwrap();
        store.save(Slot::ErrorQuestions, &second).unwrap();

        let ids: Vec<_> = book.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["base", "from-b"]);
    }
}
