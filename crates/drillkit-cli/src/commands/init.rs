//! The `drillkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("drillkit.toml").exists() {
        println!("drillkit.toml already exists, skipping.");
    } else {
        std::fs::write("drillkit.toml", SAMPLE_CONFIG)?;
        println!("Created drillkit.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: drillkit validate --bank banks/example.toml");
    println!("  2. Run: drillkit practice --provider bank --category english --difficulty easy");
    println!("  3. Run: drillkit errors");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# drillkit configuration

default_provider = "template"
default_category = "general"
default_difficulty = "medium"
default_count = 5
max_retries = 3
retry_delay_ms = 500
data_dir = "./drillkit-data"

[providers.template]
type = "template"

[providers.bank]
type = "fixture"
bank = "banks"

# [providers.remote]
# type = "remote"
# endpoint = "http://localhost:8080/questions"
# api_key = "${DRILLKIT_REMOTE_KEY}"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A few questions to get started"
default_category = "english"
default_difficulty = "easy"

[[questions]]
id = "en-1"
type = "multiple-choice"
prompt = "Choose the correct form: She ___ to school every day."
options = ["go", "goes", "going", "gone"]
answer = "goes"
explanation = "Third person singular takes -s in the present simple."
tags = ["grammar", "present simple"]

[[questions]]
id = "en-2"
type = "true-false"
prompt = "\"Their\" and \"there\" mean the same thing."
answer = "False"
explanation = "\"Their\" is possessive; \"there\" refers to a place."
tags = ["vocabulary"]

[[questions]]
id = "en-3"
type = "fill-blank"
prompt = "I have lived here ___ 2020."
answer = "since"
explanation = "Use \"since\" with a point in time."
tags = ["grammar", "prepositions"]

[[questions]]
id = "math-1"
type = "short-answer"
category = "math"
prompt = "List the prime numbers below 6, separated by commas."
answers = ["2", "3", "5"]
tags = ["primes"]
"#;
