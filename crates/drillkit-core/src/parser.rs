//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Difficulty, Expected, Question, QuestionBank, QuestionType, FALSE_ANSWER, TRUE_ANSWER,
};
use crate::traits::DEFAULT_CATEGORY;

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_category")]
    default_category: String,
    #[serde(default = "default_difficulty_str")]
    default_difficulty: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_difficulty_str() -> String {
    Difficulty::default().to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    question_type: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    prompt: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    answers: Option<Vec<String>>,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    points: Option<f64>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_difficulty: Difficulty = parsed
        .bank
        .default_difficulty
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let question_type: QuestionType = q
                .question_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;

            let difficulty = q
                .difficulty
                .map(|d| {
                    d.parse()
                        .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))
                })
                .transpose()?
                .unwrap_or(default_difficulty);

            let correct_answer = match (q.answer, q.answers) {
                (Some(answer), None) => Expected::Single(answer),
                (None, Some(answers)) => Expected::Multiple(answers.into_iter().collect()),
                (Some(_), Some(_)) => {
                    anyhow::bail!("question '{}': set either `answer` or `answers`, not both", q.id)
                }
                (None, None) => anyhow::bail!("question '{}': missing `answer`", q.id),
            };

            Ok(Question {
                id: q.id,
                question_type,
                category: q
                    .category
                    .unwrap_or_else(|| parsed.bank.default_category.clone()),
                difficulty,
                prompt: q.prompt.trim().to_string(),
                options: q.options,
                correct_answer,
                explanation: q.explanation.trim().to_string(),
                tags: q.tags,
                points: q.points,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a bank file, or every bank under a directory merged into one.
pub fn load_banks(path: &Path) -> Result<QuestionBank> {
    if !path.is_dir() {
        return parse_bank(path);
    }
    let banks = load_bank_directory(path)?;
    if banks.is_empty() {
        anyhow::bail!("no question banks found in {}", path.display());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "banks".to_string());
    Ok(QuestionBank {
        id: name.clone(),
        name,
        description: format!("{} banks merged", banks.len()),
        questions: banks.into_iter().flat_map(|b| b.questions).collect(),
    })
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for common issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |q: &Question, message: String| ValidationWarning {
        question_id: Some(q.id.clone()),
        message,
    };

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    let mut seen_prompts = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(warn(q, format!("duplicate question ID: {}", q.id)));
        }
        if !seen_prompts.insert((q.prompt.as_str(), q.question_type)) {
            warnings.push(warn(q, "duplicate prompt for this question type".into()));
        }
        if q.prompt.trim().is_empty() {
            warnings.push(warn(q, "prompt is empty".into()));
        }
        if let Err(e) = q.validate() {
            warnings.push(warn(q, e.to_string()));
        }
        if q.question_type == QuestionType::TrueFalse {
            let ok = matches!(&q.correct_answer, Expected::Single(a) if a == TRUE_ANSWER || a == FALSE_ANSWER);
            if !ok {
                warnings.push(warn(
                    q,
                    format!("true/false answer must be \"{TRUE_ANSWER}\" or \"{FALSE_ANSWER}\""),
                ));
            }
        }
        if q.question_type != QuestionType::MultipleChoice && !q.options.is_empty() {
            warnings.push(warn(
                q,
                format!("options are ignored for {} questions", q.question_type),
            ));
        }
    }

    warnings
}
