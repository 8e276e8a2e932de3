//! The `drillkit plan` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};

use drillkit_core::plan::{ActivityField, LearnerProfile, StudyPlan};
use drillkit_core::store::SlotStore;

use super::{load_config, open_store};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Generate a new weekly plan, replacing any existing one
    Create {
        /// Language being learned
        #[arg(long)]
        language: String,

        /// Current level, e.g. beginner
        #[arg(long, default_value = "beginner")]
        level: String,

        /// Practice scenario (repeatable)
        #[arg(long = "scenario")]
        scenarios: Vec<String>,

        /// Daily study time
        #[arg(long, default_value = "30 min/day")]
        duration: String,
    },

    /// Print the current plan
    Show,

    /// Add a default activity to a day
    Add {
        /// Day name or number (1 = Monday)
        #[arg(long)]
        day: String,
    },

    /// Remove an activity
    Remove {
        #[arg(long)]
        day: String,

        /// Activity position within the day, starting at 1
        #[arg(long)]
        index: usize,
    },

    /// Edit an activity
    Edit {
        #[arg(long)]
        day: String,

        #[arg(long)]
        index: usize,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        duration: Option<String>,
    },
}

pub fn execute(action: PlanAction, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let now = chrono::Utc::now();

    match action {
        PlanAction::Create {
            language,
            level,
            scenarios,
            duration,
        } => {
            let profile = LearnerProfile {
                language,
                level,
                scenarios,
                duration,
            };
            let mut plan = StudyPlan::generate(&profile, now);
            plan.save(&store, now)?;
            println!("Created a weekly plan for {}", plan.language);
            print_plan(&plan);
        }
        PlanAction::Show => print_plan(&load_plan(&store)?),
        PlanAction::Add { day } => {
            let mut plan = load_plan(&store)?;
            let day_index = resolve_day(&plan, &day)?;
            let id = plan
                .add_activity(day_index)
                .with_context(|| format!("unknown day '{day}'"))?;
            plan.save(&store, now)?;
            println!("Added activity {id} to {}", plan.weekly_plan[day_index].day);
        }
        PlanAction::Remove { day, index } => {
            let mut plan = load_plan(&store)?;
            let day_index = resolve_day(&plan, &day)?;
            let removed = plan
                .remove_activity(day_index, position(index)?)
                .with_context(|| format!("no activity {index} on {day}"))?;
            plan.save(&store, now)?;
            println!("Removed '{}'", removed.title);
        }
        PlanAction::Edit {
            day,
            index,
            title,
            content,
            duration,
        } => {
            let mut plan = load_plan(&store)?;
            let day_index = resolve_day(&plan, &day)?;
            let activity_index = position(index)?;
            let edits = [
                (ActivityField::Title, title),
                (ActivityField::Content, content),
                (ActivityField::Duration, duration),
            ];
            let mut changed = false;
            for (field, value) in edits {
                if let Some(value) = value {
                    anyhow::ensure!(
                        plan.update_activity(day_index, activity_index, field, value),
                        "no activity {index} on {day}"
                    );
                    changed = true;
                }
            }
            anyhow::ensure!(changed, "nothing to change, pass --title, --content or --duration");
            plan.save(&store, now)?;
            println!("Updated activity {index} on {}", plan.weekly_plan[day_index].day);
        }
    }

    Ok(())
}

fn load_plan(store: &SlotStore) -> Result<StudyPlan> {
    StudyPlan::load(store).context("no study plan yet, run `drillkit plan create` first")
}

/// Accepts a weekday name (case-insensitive) or its 1-based number.
fn resolve_day(plan: &StudyPlan, day: &str) -> Result<usize> {
    if let Ok(n) = day.parse::<usize>() {
        if (1..=plan.weekly_plan.len()).contains(&n) {
            return Ok(n - 1);
        }
    }
    plan.weekly_plan
        .iter()
        .position(|d| d.day.eq_ignore_ascii_case(day))
        .with_context(|| format!("unknown day '{day}'"))
}

fn position(index: usize) -> Result<usize> {
    index
        .checked_sub(1)
        .context("activity index starts at 1")
}

fn print_plan(plan: &StudyPlan) {
    println!(
        "{} ({}) | {} | scenarios: {}",
        plan.language,
        plan.level,
        plan.duration,
        if plan.scenarios.is_empty() {
            "-".to_string()
        } else {
            plan.scenarios.join(", ")
        }
    );

    let mut table = Table::new();
    table.set_header(vec!["Day", "#", "Activity", "Details", "Time"]);
    for day in &plan.weekly_plan {
        for (i, activity) in day.activities.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if i == 0 { day.day.as_str() } else { "" }),
                Cell::new(i + 1),
                Cell::new(&activity.title),
                Cell::new(&activity.content),
                Cell::new(&activity.duration),
            ]);
        }
    }
    println!("{table}");
    println!("Last updated {}", plan.updated_at.format("%Y-%m-%d %H:%M UTC"));
}
