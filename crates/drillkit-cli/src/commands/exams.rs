//! The `drillkit exams` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use drillkit_core::catalog::{ExamCatalog, ExamSource};

use super::{load_config, open_store};

pub fn execute(delete: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = ExamCatalog::new(open_store(&config)?);

    if let Some(id) = delete {
        if catalog.delete(&id)? {
            println!("Deleted exam {id}");
        } else {
            println!("No exam {id}");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Name",
        "Questions",
        "Duration",
        "Difficulty",
        "Topics",
        "Source",
        "Score",
    ]);

    for exam in catalog.list() {
        let source = match exam.source {
            ExamSource::Builtin => "built-in",
            ExamSource::Practice => "practice",
        };
        let score = match (exam.score, exam.date) {
            (Some(score), Some(date)) => format!("{score:.0} ({date})"),
            (Some(score), None) => format!("{score:.0}"),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(&exam.id),
            Cell::new(&exam.name),
            Cell::new(exam.question_count),
            Cell::new(format!("{} min", exam.duration)),
            Cell::new(exam.difficulty),
            Cell::new(exam.categories.join(", ")),
            Cell::new(source),
            Cell::new(score),
        ]);
    }

    println!("{table}");
    Ok(())
}
