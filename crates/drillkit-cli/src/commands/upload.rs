//! The `drillkit upload` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use drillkit_core::catalog::ExamCatalog;
use drillkit_providers::upload::{extract_topics, UploadParser};

use super::{load_config, open_store, questions_table};

pub async fn execute(
    file: String,
    count: usize,
    save: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");
    let config = load_config(config_path)?;

    let parser =
        UploadParser::new().with_delay(Duration::from_millis(config.simulated_delay_ms));

    eprintln!("Parsing {file}...");
    let practice = parser.parse_practice(&file, count, chrono::Utc::now()).await?;

    println!("Topics: {}", extract_topics(&file).join(", "));
    println!("{}", questions_table(&practice.questions));
    println!("{} question(s) extracted", practice.total_questions);

    if save {
        let id = practice.id.clone();
        ExamCatalog::new(open_store(&config)?).save_practice(practice)?;
        println!("Saved practice {id}");
    }

    Ok(())
}
