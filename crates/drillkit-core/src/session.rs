//! The quiz-taking state machine.
//!
//! A session moves `Configuring -> InProgress -> Submitted`. Every action is
//! legal in exactly one state; anything else is rejected with
//! [`DrillError::InvalidState`] rather than silently ignored.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DrillError;
use crate::errorbook::{self, ErrorRecord};
use crate::model::{Answer, Difficulty, Question};
use crate::scoring::{self, ScoreResult};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Configuring,
    InProgress,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Configuring => write!(f, "configuring"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::Submitted => write!(f, "submitted"),
        }
    }
}

/// What the learner asked for when starting the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub category: String,
    pub difficulty: Difficulty,
    pub count: usize,
    /// Countdown length; `None` for untimed practice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
}

impl SessionConfig {
    pub fn new(category: impl Into<String>, difficulty: Difficulty, count: usize) -> Self {
        Self {
            category: category.into(),
            difficulty,
            count,
            time_limit_secs: None,
        }
    }

    pub fn timed(mut self, secs: u64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }
}

/// Outcome of advancing the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time remains.
    Running { remaining_secs: u64 },
    /// The countdown reached zero and the session was submitted.
    Expired,
    /// The session has no countdown.
    Untimed,
}

/// One attempt at a quiz, from generation to submission.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    state: SessionState,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<String, Answer>,
    remaining_secs: Option<u64>,
    result: Option<ScoreResult>,
    errors_collected: bool,
}

impl Session {
    /// Create a session in the `Configuring` state.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            state: SessionState::Configuring,
            questions: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            remaining_secs: None,
            result: None,
            errors_collected: false,
        }
    }

    /// Install the generated questions and start the attempt.
    ///
    /// Zero questions is an `EmptyGeneration` error and leaves the session in
    /// `Configuring`.
    pub fn begin(&mut self, questions: Vec<Question>) -> Result<(), DrillError> {
        self.require(SessionState::Configuring, "begin")?;
        if questions.is_empty() {
            return Err(DrillError::EmptyGeneration {
                category: self.config.category.clone(),
                difficulty: self.config.difficulty,
            });
        }
        tracing::debug!(session = %self.id, questions = questions.len(), "session started");
        self.questions = questions;
        self.current_index = 0;
        self.remaining_secs = self.config.time_limit_secs;
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// Record an answer, overwriting any earlier answer to the same question.
    /// Submitting `Unanswered` clears the answer.
    pub fn submit_answer(&mut self, question_id: &str, answer: Answer) -> Result<(), DrillError> {
        self.require(SessionState::InProgress, "submit an answer")?;
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(DrillError::UnknownQuestion(question_id.to_string()));
        }
        if answer.is_unanswered() {
            self.answers.remove(question_id);
        } else {
            self.answers.insert(question_id.to_string(), answer);
        }
        Ok(())
    }

    /// Answer the question at the current index.
    pub fn answer_current(&mut self, answer: Answer) -> Result<(), DrillError> {
        self.require(SessionState::InProgress, "submit an answer")?;
        let id = self.questions[self.current_index].id.clone();
        self.submit_answer(&id, answer)
    }

    /// Move to the next question. A no-op at the last question.
    pub fn next(&mut self) -> Result<usize, DrillError> {
        self.require(SessionState::InProgress, "navigate")?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        Ok(self.current_index)
    }

    /// Move to the previous question. A no-op at the first question.
    pub fn prev(&mut self) -> Result<usize, DrillError> {
        self.require(SessionState::InProgress, "navigate")?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    /// Jump to `index`. Out-of-range indices are a no-op.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, DrillError> {
        self.require(SessionState::InProgress, "navigate")?;
        if index < self.questions.len() {
            self.current_index = index;
        }
        Ok(self.current_index)
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Result<Tick, DrillError> {
        self.elapse(1)
    }

    /// Advance the countdown by `secs` seconds, submitting the session when
    /// it reaches zero.
    pub fn elapse(&mut self, secs: u64) -> Result<Tick, DrillError> {
        self.require(SessionState::InProgress, "advance the countdown")?;
        let Some(remaining) = self.remaining_secs else {
            return Ok(Tick::Untimed);
        };
        let remaining = remaining.saturating_sub(secs);
        self.remaining_secs = Some(remaining);
        if remaining == 0 {
            tracing::info!(session = %self.id, "time is up, submitting");
            self.submit()?;
            Ok(Tick::Expired)
        } else {
            Ok(Tick::Running {
                remaining_secs: remaining,
            })
        }
    }

    /// End the attempt and score it. This is the only scoring pass.
    pub fn submit(&mut self) -> Result<&ScoreResult, DrillError> {
        self.require(SessionState::InProgress, "submit")?;
        let mut result = scoring::score(&self.questions, &self.answers);
        if let (Some(limit), Some(remaining)) = (self.config.time_limit_secs, self.remaining_secs) {
            result.time_used_secs = Some(limit.saturating_sub(remaining));
        }
        tracing::debug!(
            session = %self.id,
            correct = result.correct_count,
            total = result.total_questions,
            "session submitted"
        );
        self.state = SessionState::Submitted;
        Ok(self.result.insert(result))
    }

    /// Produce the error records for this attempt. Allowed once, after
    /// submission.
    pub fn collect_errors(&mut self, date: NaiveDate) -> Result<Vec<ErrorRecord>, DrillError> {
        self.require(SessionState::Submitted, "collect errors")?;
        if self.errors_collected {
            return Err(DrillError::InvalidState {
                action: "collect errors twice",
                state: self.state,
            });
        }
        self.errors_collected = true;
        Ok(errorbook::collect(&self.questions, &self.answers, date))
    }

    fn require(&self, expected: SessionState, action: &'static str) -> Result<(), DrillError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DrillError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question at the current index, once the session has begun.
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answers(&self) -> &HashMap<String, Answer> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.remaining_secs
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn errors_collected(&self) -> bool {
        self.errors_collected
    }
}
