//! Deterministic provider backed by a fixed question bank.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use drillkit_core::model::{Question, QuestionBank};
use drillkit_core::traits::{CategoryInfo, GenerateRequest, QuestionProvider, DEFAULT_CATEGORY};

/// Serves questions from a bank in bank order.
///
/// Questions are filtered by category and difficulty. An unknown category
/// falls back to the bank's `general` questions, then to the whole bank.
/// The provider records every request, which makes it a convenient test
/// double.
pub struct FixtureProvider {
    questions: Vec<Question>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<GenerateRequest>>,
}

impl FixtureProvider {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Serve a parsed bank. Entries that break the question invariants are
    /// dropped with a warning.
    pub fn from_bank(bank: QuestionBank) -> Self {
        let questions = bank
            .questions
            .into_iter()
            .filter(|q| match q.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(bank = %bank.id, "skipping bank entry: {e}");
                    false
                }
            })
            .collect();
        Self::new(questions)
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn has_category(&self, category: &str) -> bool {
        self.questions.iter().any(|q| q.category == category)
    }
}

#[async_trait]
impl QuestionProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let category = if self.has_category(&request.category) {
            Some(request.category.as_str())
        } else if self.has_category(DEFAULT_CATEGORY) {
            tracing::debug!(
                "category '{}' not in bank, using '{DEFAULT_CATEGORY}'",
                request.category
            );
            Some(DEFAULT_CATEGORY)
        } else {
            tracing::debug!("category '{}' not in bank, using all questions", request.category);
            None
        };

        Ok(self
            .questions
            .iter()
            .filter(|q| category.is_none_or(|c| q.category == c))
            .filter(|q| q.difficulty == request.difficulty)
            .take(request.count)
            .cloned()
            .collect())
    }

    fn categories(&self) -> Vec<CategoryInfo> {
        let mut seen: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !seen.contains(&q.category.as_str()) {
                seen.push(&q.category);
            }
        }
        seen.into_iter()
            .map(|id| CategoryInfo {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
            })
            .collect()
    }
}
