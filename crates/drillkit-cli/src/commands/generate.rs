//! The `drillkit generate` command.

use std::path::PathBuf;

use anyhow::Result;

use drillkit_core::catalog::ExamCatalog;
use drillkit_core::model::Practice;
use drillkit_core::traits::GenerateRequest;
use drillkit_report::write_questions_html;

use super::{build_engine, difficulty_arg, load_config, open_store, questions_table};

pub struct GenerateArgs {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub count: Option<usize>,
    pub provider: Option<String>,
    pub save: Option<String>,
    pub html: Option<PathBuf>,
    pub answers: bool,
}

pub async fn execute(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let count = args.count.unwrap_or(config.default_count);
    anyhow::ensure!(count >= 1, "count must be at least 1");

    let category = args
        .category
        .unwrap_or_else(|| config.default_category.clone());
    let difficulty = difficulty_arg(args.difficulty.as_deref(), &config)?;

    let store = open_store(&config)?;
    let engine = build_engine(&config, args.provider.as_deref(), store.clone())?;

    let request = GenerateRequest::new(category.clone(), difficulty, count);
    let questions = engine.generate_valid(&request).await?;
    if questions.is_empty() {
        anyhow::bail!("no questions available for {category}/{difficulty}");
    }

    println!("{}", questions_table(&questions));
    println!(
        "{} question(s) from '{}' ({category}, {difficulty})",
        questions.len(),
        engine.provider_name()
    );

    let title = format!("{category} ({difficulty})");

    if let Some(path) = &args.html {
        write_questions_html(&title, &questions, args.answers, path)?;
        eprintln!("HTML export: {}", path.display());
    }

    if let Some(name) = args.save {
        let practice = Practice::new(name, None, questions, chrono::Utc::now());
        let id = practice.id.clone();
        ExamCatalog::new(store).save_practice(practice)?;
        println!("Saved practice {id}");
    }

    Ok(())
}
