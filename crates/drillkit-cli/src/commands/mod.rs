//! Subcommand implementations and the helpers they share.

pub mod errors;
pub mod exams;
pub mod generate;
pub mod init;
pub mod plan;
pub mod practice;
pub mod upload;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use drillkit_core::engine::PracticeEngine;
use drillkit_core::model::{Difficulty, Question};
use drillkit_core::store::SlotStore;
use drillkit_providers::config::load_config_from;
use drillkit_providers::{create_provider, DrillkitConfig};
use drillkit_store::FileStore;

/// Prompts longer than this are shortened in tables.
const PROMPT_WIDTH: usize = 60;

pub(crate) fn load_config(config_path: Option<PathBuf>) -> Result<DrillkitConfig> {
    load_config_from(config_path.as_deref())
}

/// Slot store rooted at the configured data directory.
pub(crate) fn open_store(config: &DrillkitConfig) -> Result<SlotStore> {
    let backend = FileStore::open(&config.data_dir)?;
    Ok(SlotStore::new(Arc::new(backend)))
}

pub(crate) fn build_engine(
    config: &DrillkitConfig,
    provider: Option<&str>,
    store: SlotStore,
) -> Result<PracticeEngine> {
    let (name, provider_config) = config.provider(provider)?;
    let provider = create_provider(name, provider_config)?;
    tracing::debug!("using provider '{name}'");
    Ok(PracticeEngine::new(
        Arc::from(provider),
        store,
        config.engine_config(),
    ))
}

/// Difficulty from the command line, falling back to the configured default.
pub(crate) fn difficulty_arg(arg: Option<&str>, config: &DrillkitConfig) -> Result<Difficulty> {
    match arg {
        Some(s) => s
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("invalid --difficulty"),
        None => Ok(config.difficulty()),
    }
}

pub(crate) fn shorten(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

pub(crate) fn questions_table(questions: &[Question]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Type", "Difficulty", "Prompt", "Answer"]);
    for (i, q) in questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.id),
            Cell::new(q.question_type.label()),
            Cell::new(q.difficulty),
            Cell::new(shorten(&q.prompt, PROMPT_WIDTH)),
            Cell::new(&q.correct_answer),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_keeps_short_text() {
        assert_eq!(shorten("hello", 10), "hello");
        assert_eq!(shorten("hello world", 8), "hello...");
    }

    #[test]
    fn difficulty_arg_rejects_unknown() {
        let config = DrillkitConfig::default();
        assert_eq!(difficulty_arg(None, &config).unwrap(), Difficulty::Medium);
        assert_eq!(difficulty_arg(Some("Hard"), &config).unwrap(), Difficulty::Hard);
        assert!(difficulty_arg(Some("extreme"), &config).is_err());
    }
}
