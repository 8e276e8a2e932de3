//! Core trait definitions for question sources.
//!
//! The async [`QuestionProvider`] trait is implemented by the
//! `drillkit-providers` crate. Storage backends implement
//! [`KeyValueStore`](crate::store::KeyValueStore).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Question};

/// Category used when a requested category is unknown.
pub const DEFAULT_CATEGORY: &str = "general";

// ---------------------------------------------------------------------------
// Question provider trait
// ---------------------------------------------------------------------------

/// A source of questions.
///
/// Implementations return up to `count` questions matching the request. They
/// may return fewer when they run out of distinct material; callers must
/// tolerate short results. Unknown categories fall back to a default set
/// rather than failing.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Human-readable provider name (e.g. "template").
    fn name(&self) -> &str;

    /// Produce an ordered list of questions.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>>;

    /// Categories this provider knows about.
    fn categories(&self) -> Vec<CategoryInfo> {
        builtin_categories()
    }
}

/// Request for a batch of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Category name (e.g. "english").
    pub category: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Number of questions wanted.
    pub count: usize,
}

impl GenerateRequest {
    pub fn new(category: impl Into<String>, difficulty: Difficulty, count: usize) -> Self {
        Self {
            category: category.into(),
            difficulty,
            count,
        }
    }
}

/// Description of a question category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// Identifier used in requests.
    pub id: String,
    /// Display name.
    pub name: String,
    pub description: String,
}

/// The categories every installation ships with.
pub fn builtin_categories() -> Vec<CategoryInfo> {
    [
        ("math", "Mathematics", "Arithmetic, algebra and geometry"),
        ("english", "English", "Vocabulary, grammar and reading"),
        ("programming", "Programming", "Languages, tools and computer science"),
        ("general", "General knowledge", "Science, history and geography"),
    ]
    .into_iter()
    .map(|(id, name, description)| CategoryInfo {
        id: id.into(),
        name: name.into(),
        description: description.into(),
    })
    .collect()
}

/// Whether `category` is one of the built-in categories.
pub fn is_builtin_category(category: &str) -> bool {
    builtin_categories().iter().any(|c| c.id == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_categories_include_default() {
        let ids: Vec<_> = builtin_categories().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["math", "english", "programming", "general"]);
        assert!(is_builtin_category(DEFAULT_CATEGORY));
        assert!(!is_builtin_category("astrology"));
    }
}
