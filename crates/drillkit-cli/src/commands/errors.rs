//! The `drillkit errors` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use drillkit_core::errorbook::{ErrorBook, ErrorFilter, SortBy};

use super::{difficulty_arg, load_config, open_store, shorten};

pub struct ErrorsArgs {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub reason: Option<String>,
    pub search: Option<String>,
    pub sort: String,
    pub unreviewed: bool,
    pub toggle: Option<String>,
    pub delete: Option<String>,
    pub stats: bool,
}

pub fn execute(args: ErrorsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let book = ErrorBook::new(open_store(&config)?);

    if let Some(id) = &args.toggle {
        match book.toggle_reviewed(id)? {
            Some(true) => println!("Marked {id} as reviewed"),
            Some(false) => println!("Marked {id} as not reviewed"),
            None => anyhow::bail!("no error record with id '{id}'"),
        }
        return Ok(());
    }

    if let Some(id) = &args.delete {
        if book.delete(id)? {
            println!("Deleted {id}");
        } else {
            anyhow::bail!("no error record with id '{id}'");
        }
        return Ok(());
    }

    if args.stats {
        let stats = book.stats();
        println!(
            "{} record(s): {} reviewed, {} to review",
            stats.total, stats.reviewed, stats.unreviewed
        );
        let mut table = Table::new();
        table.set_header(vec!["Category", "Errors"]);
        for (category, count) in &stats.by_category {
            table.add_row(vec![Cell::new(category), Cell::new(count)]);
        }
        println!("{table}");
        if !stats.by_reason.is_empty() {
            let mut table = Table::new();
            table.set_header(vec!["Reason", "Errors"]);
            for (reason, count) in &stats.by_reason {
                table.add_row(vec![Cell::new(reason), Cell::new(count)]);
            }
            println!("{table}");
        }
        return Ok(());
    }

    let filter = ErrorFilter {
        category: args.category,
        difficulty: args
            .difficulty
            .as_deref()
            .map(|d| difficulty_arg(Some(d), &config))
            .transpose()?,
        error_reason: args.reason,
        reviewed: args.unreviewed.then_some(false),
        search: args.search,
        sort: args
            .sort
            .parse::<SortBy>()
            .map_err(|e| anyhow::anyhow!(e))?,
    };

    let records = book.query(&filter);
    if records.is_empty() {
        println!("No error records.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Date",
        "Category",
        "Difficulty",
        "Question",
        "Your answer",
        "Correct answer",
        "Reviewed",
    ]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.id),
            Cell::new(record.date),
            Cell::new(&record.category),
            Cell::new(record.difficulty),
            Cell::new(shorten(&record.question, 40)),
            Cell::new(&record.user_answer),
            Cell::new(&record.correct_answer),
            Cell::new(if record.reviewed { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
    println!("{} record(s)", records.len());

    Ok(())
}
