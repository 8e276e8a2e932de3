//! Core data model types for drillkit.
//!
//! These are the fundamental types that the entire system uses to represent
//! questions, answers, and saved practice sets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DrillError;

/// Literal answer for a true statement in a true/false question.
pub const TRUE_ANSWER: &str = "True";
/// Literal answer for a false statement in a true/false question.
pub const FALSE_ANSWER: &str = "False";
/// Sentinel shown in place of a missing answer.
pub const UNANSWERED: &str = "unanswered";

/// A single question presented to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier within a session.
    pub id: String,
    /// What kind of input the question expects.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Classification tag (e.g. "english").
    pub category: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Display text.
    pub prompt: String,
    /// Ordered choices; only meaningful for multiple-choice questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// The expected answer.
    pub correct_answer: Expected,
    /// Shown after scoring.
    #[serde(default)]
    pub explanation: String,
    /// Free-form tags for filtering and search.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional scoring weight. Unweighted questions share the session's
    /// 100 points equally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

impl Question {
    /// Check the model invariants: the expected answer is never empty, and a
    /// multiple-choice question has options containing every expected answer.
    pub fn validate(&self) -> Result<(), DrillError> {
        let invalid = |reason: String| DrillError::InvalidQuestion {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id is empty".into()));
        }
        if self.correct_answer.is_empty() {
            return Err(invalid("correct answer is empty".into()));
        }
        if self.question_type == QuestionType::MultipleChoice {
            if self.options.is_empty() {
                return Err(invalid("multiple-choice question has no options".into()));
            }
            for expected in self.correct_answer.values() {
                if !self.options.iter().any(|o| o == expected) {
                    return Err(invalid(format!(
                        "correct answer '{expected}' is not among the options"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether this question expects a set of answers.
    pub fn expects_multiple(&self) -> bool {
        matches!(self.correct_answer, Expected::Multiple(_))
    }
}

/// The kinds of questions drillkit can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    ShortAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::FillBlank,
        QuestionType::ShortAnswer,
    ];

    /// Human-readable label, also used as a tag.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple choice",
            QuestionType::TrueFalse => "true/false",
            QuestionType::FillBlank => "fill in the blank",
            QuestionType::ShortAnswer => "short answer",
        }
    }

    /// Short prefix used when minting question ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "mc",
            QuestionType::TrueFalse => "tf",
            QuestionType::FillBlank => "fb",
            QuestionType::ShortAnswer => "sa",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::TrueFalse => write!(f, "true-false"),
            QuestionType::FillBlank => write!(f, "fill-blank"),
            QuestionType::ShortAnswer => write!(f, "short-answer"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "mc" => Ok(QuestionType::MultipleChoice),
            "true-false" | "tf" => Ok(QuestionType::TrueFalse),
            "fill-blank" | "fb" => Ok(QuestionType::FillBlank),
            "short-answer" | "sa" => Ok(QuestionType::ShortAnswer),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Difficulty tiers, ordered from easiest to hardest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parse a difficulty, falling back to the default tier for unknown input.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|e: String| {
            tracing::warn!("{e}; falling back to {}", Difficulty::default());
            Difficulty::default()
        })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// The expected answer of a question: one string or a set of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    Single(String),
    Multiple(BTreeSet<String>),
}

impl Expected {
    pub fn is_empty(&self) -> bool {
        match self {
            Expected::Single(s) => s.is_empty(),
            Expected::Multiple(set) => set.is_empty() || set.iter().any(|s| s.is_empty()),
        }
    }

    /// Iterate over the individual expected values.
    pub fn values(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        match self {
            Expected::Single(s) => Box::new(std::iter::once(s)),
            Expected::Multiple(set) => Box::new(set.iter()),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Single(s) => write!(f, "{s}"),
            Expected::Multiple(set) => {
                write!(f, "{}", set.iter().cloned().collect::<Vec<_>>().join(", "))
            }
        }
    }
}

/// A learner's answer to one question.
///
/// Serialized untagged: a string, an array of strings, or `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(BTreeSet<String>),
    #[default]
    Unanswered,
}

impl Answer {
    pub fn single(value: impl Into<String>) -> Self {
        Answer::Single(value.into())
    }

    pub fn multiple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::Multiple(values.into_iter().map(Into::into).collect())
    }

    pub fn is_unanswered(&self) -> bool {
        matches!(self, Answer::Unanswered)
    }

    /// Interpret raw learner input for a question. Multi-answer questions take
    /// a comma-separated list; everything else is taken verbatim.
    pub fn for_question(question: &Question, raw: &str) -> Self {
        if question.expects_multiple() {
            let values: BTreeSet<String> = raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if values.is_empty() {
                Answer::Unanswered
            } else {
                Answer::Multiple(values)
            }
        } else if raw.is_empty() {
            Answer::Unanswered
        } else {
            Answer::Single(raw.to_string())
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Single(s) => write!(f, "{s}"),
            Answer::Multiple(set) => {
                write!(f, "{}", set.iter().cloned().collect::<Vec<_>>().join(", "))
            }
            Answer::Unanswered => write!(f, "{UNANSWERED}"),
        }
    }
}

/// A saved, reusable set of questions (e.g. built from an uploaded file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practice {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl Practice {
    pub fn new(
        name: impl Into<String>,
        source_file: Option<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("practice-{}", Uuid::new_v4().simple()),
            name: name.into(),
            created_at,
            total_questions: questions.len(),
            questions,
            source_file,
        }
    }
}

/// A named collection of questions loaded from a bank file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn difficulty_display_and_parse() {
        assert_eq!(Difficulty::Easy.to_string(), "easy");
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::parse_or_default("extreme"), Difficulty::Medium);
        assert!(Difficulty::Easy < Difficulty::Hard);
    }

    #[test]
    fn question_type_display_and_parse() {
        for t in QuestionType::ALL {
            assert_eq!(t.to_string().parse::<QuestionType>().unwrap(), t);
        }
        assert_eq!("tf".parse::<QuestionType>().unwrap(), QuestionType::TrueFalse);
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn multiple_choice_must_contain_answer() {
        assert!(choice("q1", &["A", "B"], "B").validate().is_ok());

        let err = choice("q2", &["A", "B"], "C").validate().unwrap_err();
        assert!(err.to_string().contains("not among the options"));

        let err = choice("q3", &[], "A").validate().unwrap_err();
        assert!(err.to_string().contains("no options"));
    }

    #[test]
    fn empty_answer_is_invalid() {
        let q = single("q1", "math", Difficulty::Easy, "");
        assert!(matches!(
            q.validate(),
            Err(DrillError::InvalidQuestion { .. })
        ));
        assert!(multi("q2", &[]).validate().is_err());
    }

    #[test]
    fn question_json_uses_source_field_names() {
        let q = choice("q1", &["A", "B"], "B");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "multiple-choice");
        assert_eq!(json["correctAnswer"], "B");
        assert_eq!(json["difficulty"], "easy");
        assert!(json.get("points").is_none());

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn expected_accepts_string_or_array() {
        let single: Expected = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(single, Expected::Single("B".into()));

        let multi: Expected = serde_json::from_str("[\"b\", \"a\"]").unwrap();
        assert_eq!(multi.to_string(), "a, b");
    }

    #[test]
    fn answer_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Answer::single("A")).unwrap(), "\"A\"");
        assert_eq!(serde_json::to_string(&Answer::Unanswered).unwrap(), "null");
        let back: Answer = serde_json::from_str("null").unwrap();
        assert!(back.is_unanswered());
        let set: Answer = serde_json::from_str("[\"x\", \"y\"]").unwrap();
        assert_eq!(set, Answer::multiple(["y", "x"]));
    }

    #[test]
    fn answer_for_question_splits_only_multi_answers() {
        let q = multi("q1", &["a", "b"]);
        assert_eq!(Answer::for_question(&q, "b, a"), Answer::multiple(["a", "b"]));
        assert!(Answer::for_question(&q, " , ").is_unanswered());

        let q = single("q2", "math", Difficulty::Easy, "1, 2");
        assert_eq!(Answer::for_question(&q, "1, 2"), Answer::single("1, 2"));
        assert!(Answer::for_question(&q, "").is_unanswered());
    }

    #[test]
    fn unanswered_displays_sentinel() {
        assert_eq!(Answer::Unanswered.to_string(), UNANSWERED);
    }

    #[test]
    fn practice_counts_questions() {
        let p = Practice::new(
            "Upload",
            Some("react.pdf".into()),
            vec![choice("q1", &["A"], "A")],
            Utc::now(),
        );
        assert!(p.id.starts_with("practice-"));
        assert_eq!(p.total_questions, 1);
    }
}
