//! The `drillkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = if bank_path.is_dir() {
        drillkit_core::parser::load_bank_directory(&bank_path)?
    } else {
        vec![drillkit_core::parser::parse_bank(&bank_path)?]
    };

    if banks.is_empty() {
        anyhow::bail!("no question banks found in {}", bank_path.display());
    }

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Bank: {} ({} questions)", bank.name, bank.questions.len());

        let warnings = drillkit_core::parser::validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
