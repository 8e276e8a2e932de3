//! Practice engine orchestrator.
//!
//! Ties a question provider, the session state machine, and the slot store
//! together: generation with retries, exam start-up, submission with
//! best-effort error persistence, and the countdown driver.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::catalog::{ExamCatalog, ExamEntry};
use crate::error::{DrillError, ProviderError};
use crate::errorbook::{ErrorBook, ErrorRecord};
use crate::model::Question;
use crate::scoring::ScoreResult;
use crate::session::{Session, SessionConfig, SessionState, Tick};
use crate::store::SlotStore;
use crate::traits::{GenerateRequest, QuestionProvider};

/// Upper bound on the delay between generation retries.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the practice engine.
#[derive(Debug, Clone)]
pub struct PracticeEngineConfig {
    /// Retries on transient provider errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
}

impl Default for PracticeEngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// What a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub result: ScoreResult,
    pub errors: Vec<ErrorRecord>,
    /// Whether the error records reached the store.
    pub persisted: bool,
}

/// The central practice engine.
pub struct PracticeEngine {
    provider: Arc<dyn QuestionProvider>,
    store: SlotStore,
    config: PracticeEngineConfig,
}

impl PracticeEngine {
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        store: SlotStore,
        config: PracticeEngineConfig,
    ) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Ask the provider for questions, retrying transient failures with
    /// exponential backoff. Permanent failures are returned immediately.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Vec<Question>> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tracing::debug!(retry, delay_ms = retry_delay.as_millis() as u64, "retrying generation");
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.provider.generate(request).await {
                Ok(questions) => return Ok(questions),
                Err(e) => {
                    if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                        if provider_error.is_permanent() {
                            return Err(e);
                        }
                        // Use the provider's retry-after hint if available
                        if let Some(ms) = provider_error.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms);
                        }
                    }
                    tracing::warn!("generation via '{}' failed: {e:#}", self.provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }

    /// Like [`generate`](Self::generate), but drops questions that violate
    /// the model invariants with a warning. Anything shown, saved, or
    /// practised goes through here.
    pub async fn generate_valid(&self, request: &GenerateRequest) -> Result<Vec<Question>> {
        let generated = self.generate(request).await?;
        if generated.len() < request.count {
            tracing::info!(
                requested = request.count,
                generated = generated.len(),
                "provider returned fewer questions than requested"
            );
        }
        Ok(usable(generated))
    }

    /// Generate questions and begin a session.
    ///
    /// Invalid questions are dropped. If nothing usable remains the error is
    /// `DrillError::EmptyGeneration`.
    #[tracing::instrument(skip(self), fields(provider = %self.provider.name()))]
    pub async fn start(&self, config: SessionConfig) -> Result<Session> {
        let request = GenerateRequest::new(config.category.clone(), config.difficulty, config.count);
        let questions = self.generate_valid(&request).await?;

        let mut session = Session::new(config);
        session.begin(questions)?;
        Ok(session)
    }

    /// Begin a timed session for a catalog exam. Practice exams reuse their
    /// stored questions; built-in exams generate `question_count` questions.
    #[tracing::instrument(skip(self, exam), fields(exam = %exam.id))]
    pub async fn start_exam(&self, exam: &ExamEntry) -> Result<Session> {
        let config = SessionConfig::new(exam.category.clone(), exam.difficulty, exam.question_count)
            .timed(exam.time_limit_secs());

        let catalog = ExamCatalog::new(self.store.clone());
        let questions = match catalog.questions_for(exam) {
            Some(questions) => questions,
            None => {
                let request =
                    GenerateRequest::new(exam.category.clone(), exam.difficulty, exam.question_count);
                self.generate(&request).await?
            }
        };

        let mut session = Session::new(config);
        session.begin(usable(questions))?;
        Ok(session)
    }

    /// Submit the session if it is still running, collect its error records,
    /// and append them to the error book.
    ///
    /// Storage failures are logged and reported through
    /// [`SessionOutcome::persisted`]; they never fail the submission.
    pub fn finish(&self, session: &mut Session, date: NaiveDate) -> Result<SessionOutcome, DrillError> {
        if session.state() == SessionState::InProgress {
            session.submit()?;
        }
        let errors = session.collect_errors(date)?;
        let result = session
            .result()
            .cloned()
            .ok_or(DrillError::InvalidState {
                action: "finish",
                state: session.state(),
            })?;

        let persisted = match ErrorBook::new(self.store.clone()).append(&errors) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("failed to save {} error records: {e}", errors.len());
                false
            }
        };

        Ok(SessionOutcome {
            result,
            errors,
            persisted,
        })
    }
}

fn usable(questions: Vec<Question>) -> Vec<Question> {
    questions
        .into_iter()
        .filter(|q| match q.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("dropping question: {e}");
                false
            }
        })
        .collect()
}

/// Drive a session's countdown, one second per `period`.
///
/// Returns the result when the countdown submits the session, or `None` if
/// the session is untimed or was submitted by other means first.
pub async fn run_countdown(session: Arc<Mutex<Session>>, period: Duration) -> Option<ScoreResult> {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let mut session = session.lock().await;
        if session.state() != SessionState::InProgress {
            return None;
        }
        match session.tick() {
            Ok(Tick::Running { .. }) => continue,
            Ok(Tick::Expired) => return session.result().cloned(),
            Ok(Tick::Untimed) | Err(_) => return None,
        }
    }
}
