//! Answer checking and aggregate scoring.
//!
//! Scoring is a pure function of the question list and the answer map, so
//! scoring the same pair twice yields identical results. Breakdowns use ordered
//! maps for the same reason.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{Answer, Difficulty, Expected, Question};

/// Full marks for a session whose questions carry no explicit weights.
pub const FULL_MARKS: f64 = 100.0;

/// Maximum number of tags suggested for review.
const REVIEW_TAG_LIMIT: usize = 3;

/// Judge a single answer against a question.
///
/// Unanswered is always incorrect. A single expected answer requires exact,
/// case-sensitive string equality with no trimming. A set of expected answers
/// requires a submitted set that is exactly equal; there is no partial credit.
pub fn is_correct(question: &Question, answer: Option<&Answer>) -> bool {
    match (&question.correct_answer, answer) {
        (Expected::Single(expected), Some(Answer::Single(given))) => given == expected,
        (Expected::Multiple(expected), Some(Answer::Multiple(given))) => given == expected,
        _ => false,
    }
}

/// Scoring weight of a question within a session of `total` questions.
pub fn question_weight(question: &Question, total: usize) -> f64 {
    question.points.unwrap_or_else(|| {
        if total == 0 {
            0.0
        } else {
            FULL_MARKS / total as f64
        }
    })
}

/// Correct/total counts for one partition of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: usize,
    pub total: usize,
}

impl Tally {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Percentage of correct answers in this partition.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

/// The judged outcome of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question_id: String,
    pub correct: bool,
    pub answer: Answer,
    pub points_awarded: f64,
}

/// The result of scoring one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Sum of the weights of correctly answered questions.
    pub total_score: f64,
    /// Sum of all weights.
    pub max_score: f64,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total_questions: usize,
    /// One entry per question, in session order.
    pub outcomes: Vec<QuestionOutcome>,
    pub category_breakdown: BTreeMap<String, Tally>,
    pub difficulty_breakdown: BTreeMap<Difficulty, Tally>,
    /// Tags most frequent among incorrect questions.
    pub recommended_review: Vec<String>,
    /// Seconds spent, for timed sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_used_secs: Option<u64>,
}

impl ScoreResult {
    /// Percentage of correct answers, unrounded.
    pub fn accuracy(&self) -> f64 {
        let judged = self.correct_count + self.incorrect_count;
        if judged == 0 {
            0.0
        } else {
            self.correct_count as f64 / judged as f64 * 100.0
        }
    }

    /// Accuracy rounded to one decimal place.
    pub fn accuracy_display(&self) -> String {
        format!("{:.1}%", self.accuracy())
    }
}

/// Score a session.
pub fn score(questions: &[Question], answers: &HashMap<String, Answer>) -> ScoreResult {
    let total = questions.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut category_breakdown: BTreeMap<String, Tally> = BTreeMap::new();
    let mut difficulty_breakdown: BTreeMap<Difficulty, Tally> = BTreeMap::new();
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total_score = 0.0;
    let mut max_score = 0.0;
    let mut correct_count = 0;

    for question in questions {
        let answer = answers.get(&question.id);
        let correct = is_correct(question, answer);
        let weight = question_weight(question, total);
        max_score += weight;

        if correct {
            correct_count += 1;
            total_score += weight;
        } else {
            for tag in &question.tags {
                *tag_counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        category_breakdown
            .entry(question.category.clone())
            .or_default()
            .record(correct);
        difficulty_breakdown
            .entry(question.difficulty)
            .or_default()
            .record(correct);

        outcomes.push(QuestionOutcome {
            question_id: question.id.clone(),
            correct,
            answer: answer.cloned().unwrap_or_default(),
            points_awarded: if correct { weight } else { 0.0 },
        });
    }

    // BTreeMap iteration is alphabetical, and the sort is stable, so ties keep
    // alphabetical order.
    let mut ranked: Vec<(&str, usize)> = tag_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let recommended_review = ranked
        .into_iter()
        .take(REVIEW_TAG_LIMIT)
        .map(|(tag, _)| tag.to_string())
        .collect();

    ScoreResult {
        total_score,
        max_score,
        correct_count,
        incorrect_count: total - correct_count,
        total_questions: total,
        outcomes,
        category_breakdown,
        difficulty_breakdown,
        recommended_review,
        time_used_secs: None,
    }
}
