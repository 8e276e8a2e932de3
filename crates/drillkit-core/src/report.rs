//! Session report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errorbook::ErrorRecord;
use crate::model::Question;
use crate::scoring::ScoreResult;
use crate::session::Session;

/// A complete record of one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    /// The session identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Display title (exam name or category/difficulty).
    pub title: String,
    /// The scoring result.
    pub result: ScoreResult,
    /// Error records produced by the session.
    pub errors: Vec<ErrorRecord>,
    /// The questions as presented.
    pub questions: Vec<Question>,
}

impl SessionReport {
    /// Build a report from a submitted session. Returns `None` if the session
    /// has not been scored.
    pub fn from_session(
        session: &Session,
        title: impl Into<String>,
        errors: Vec<ErrorRecord>,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            id: session.id(),
            created_at,
            title: title.into(),
            result: session.result()?.clone(),
            errors,
            questions: session.questions().to_vec(),
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
