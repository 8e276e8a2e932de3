//! The `drillkit practice` command.
//!
//! Reads one command or answer per line from stdin. Timed sessions run a
//! countdown alongside the input loop and are submitted when it reaches zero.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::sync::{mpsc, Mutex};

use drillkit_core::catalog::ExamCatalog;
use drillkit_core::engine::run_countdown;
use drillkit_core::model::{Answer, Question, QuestionType, FALSE_ANSWER, TRUE_ANSWER};
use drillkit_core::report::SessionReport;
use drillkit_core::scoring::ScoreResult;
use drillkit_core::session::{Session, SessionConfig, SessionState};
use drillkit_report::write_session_html;

use super::{build_engine, difficulty_arg, load_config, open_store, shorten};

pub struct PracticeArgs {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub count: Option<usize>,
    pub provider: Option<String>,
    pub exam: Option<String>,
    pub time_limit: Option<u64>,
    pub report: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Answer(String),
    Next,
    Prev,
    /// 1-based question number.
    Jump(usize),
    Submit,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Answer(line.to_string()));
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("next" | "n"), None) => Ok(Input::Next),
        (Some("prev" | "p"), None) => Ok(Input::Prev),
        (Some("jump" | "j"), Some(n)) => n
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(Input::Jump)
            .ok_or_else(|| format!("invalid question number: {n}")),
        (Some("submit" | "s"), None) => Ok(Input::Submit),
        (Some("quit" | "q"), None) => Ok(Input::Quit),
        _ => Err(format!(
            "unknown command '{line}' (try :next, :prev, :jump N, :submit, :quit)"
        )),
    }
}

fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Map shorthand input onto the question's canonical answers: `t`/`f` for
/// true/false, then option text ignoring case, then option letters.
fn normalize_answer(question: &Question, raw: &str) -> String {
    let resolve = |part: &str| -> String {
        let part = part.trim();
        if question.question_type == QuestionType::TrueFalse {
            match part.to_lowercase().as_str() {
                "t" | "true" => return TRUE_ANSWER.to_string(),
                "f" | "false" => return FALSE_ANSWER.to_string(),
                _ => {}
            }
        }
        if let Some(option) = question
            .options
            .iter()
            .find(|o| *o == part)
            .or_else(|| question.options.iter().find(|o| o.to_lowercase() == part.to_lowercase()))
        {
            return option.clone();
        }
        let mut chars = part.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(option) = question
                .options
                .iter()
                .enumerate()
                .find(|(i, _)| option_letter(*i).eq_ignore_ascii_case(&c))
                .map(|(_, o)| o)
            {
                return option.clone();
            }
        }
        part.to_string()
    };

    if question.expects_multiple() {
        raw.split(',').map(resolve).collect::<Vec<_>>().join(",")
    } else {
        resolve(raw)
    }
}

fn show_question(session: &Session) {
    let Some(q) = session.current() else {
        return;
    };
    let timer = session
        .remaining_secs()
        .map(|s| format!(" | {}:{:02} left", s / 60, s % 60))
        .unwrap_or_default();

    println!();
    println!(
        "Question {}/{} [{}, {}]{timer}",
        session.current_index() + 1,
        session.questions().len(),
        q.question_type.label(),
        q.difficulty
    );
    println!("{}", q.prompt);
    for (i, option) in q.options.iter().enumerate() {
        println!("  {}. {option}", option_letter(i));
    }
    if q.question_type == QuestionType::TrueFalse && q.options.is_empty() {
        println!("  (True/False)");
    }
    if q.expects_multiple() {
        println!("  (separate answers with commas)");
    }
    if let Some(answer) = session.answer_for(&q.id) {
        println!("  current answer: {answer}");
    }
}

/// Outcome of the interactive loop.
#[derive(Debug, PartialEq, Eq)]
enum LoopEnd {
    Submit,
    Expired,
    Quit,
}

/// Apply one line of input. Returns `Some` when the loop should end.
fn handle_line(session: &mut Session, line: &str) -> Result<Option<LoopEnd>> {
    match parse_input(line) {
        Ok(Input::Submit) => return Ok(Some(LoopEnd::Submit)),
        Ok(Input::Quit) => return Ok(Some(LoopEnd::Quit)),
        Ok(Input::Next) => {
            session.next()?;
        }
        Ok(Input::Prev) => {
            session.prev()?;
        }
        Ok(Input::Jump(n)) => {
            if n > session.questions().len() {
                eprintln!("There are only {} questions.", session.questions().len());
            }
            session.jump_to(n - 1)?;
        }
        Ok(Input::Answer(raw)) => {
            let Some(question) = session.current() else {
                return Ok(None);
            };
            let answer = Answer::for_question(question, &normalize_answer(question, &raw));
            session.answer_current(answer)?;
            if session.current_index() + 1 == session.questions().len() {
                println!(
                    "Answered {}/{}. Type :submit to finish.",
                    session.answered_count(),
                    session.questions().len()
                );
            } else {
                session.next()?;
            }
        }
        Err(message) => eprintln!("{message}"),
    }
    show_question(session);
    Ok(None)
}

/// Forward stdin lines from a plain thread. A blocking read on the runtime
/// would keep it from shutting down after the countdown ends the session.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Read input until the learner submits or quits, or the countdown runs out.
/// A closed input channel submits.
async fn run_loop(
    session: Arc<Mutex<Session>>,
    mut input: mpsc::UnboundedReceiver<io::Result<String>>,
    tick: Duration,
) -> Result<LoopEnd> {
    let mut countdown = tokio::spawn(run_countdown(session.clone(), tick));
    let mut countdown_done = false;

    show_question(&*session.lock().await);
    let end = loop {
        tokio::select! {
            expired = &mut countdown, if !countdown_done => {
                countdown_done = true;
                if expired.context("countdown task failed")?.is_some() {
                    break LoopEnd::Expired;
                }
            }
            line = input.recv() => {
                let mut session = session.lock().await;
                if session.state() != SessionState::InProgress {
                    break LoopEnd::Expired;
                }
                let Some(line) = line else {
                    break LoopEnd::Submit;
                };
                let line = line.context("failed to read input")?;
                if let Some(end) = handle_line(&mut session, &line)? {
                    break end;
                }
            }
        }
    };

    countdown.abort();
    Ok(end)
}

pub async fn execute(args: PracticeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let engine = build_engine(&config, args.provider.as_deref(), store.clone())?;

    let (session, title) = match &args.exam {
        Some(id) => {
            let exam = ExamCatalog::new(store)
                .find(id)
                .with_context(|| format!("no exam with id '{id}'"))?;
            eprintln!(
                "Starting {}: {} questions, {} minutes",
                exam.name, exam.question_count, exam.duration
            );
            (engine.start_exam(&exam).await?, exam.name)
        }
        None => {
            let category = args
                .category
                .unwrap_or_else(|| config.default_category.clone());
            let difficulty = difficulty_arg(args.difficulty.as_deref(), &config)?;
            let count = args.count.unwrap_or(config.default_count);
            anyhow::ensure!(count >= 1, "count must be at least 1");

            let mut session_config = SessionConfig::new(category.clone(), difficulty, count);
            if let Some(secs) = args.time_limit {
                anyhow::ensure!(secs >= 1, "time limit must be at least 1 second");
                session_config = session_config.timed(secs);
            }
            (
                engine.start(session_config).await?,
                format!("{category} ({difficulty})"),
            )
        }
    };

    let session = Arc::new(Mutex::new(session));
    let end = run_loop(session.clone(), spawn_stdin_reader(), Duration::from_secs(1)).await?;
    let mut session = session.lock().await;

    match end {
        LoopEnd::Quit => {
            println!("Session discarded.");
            return Ok(());
        }
        LoopEnd::Expired => println!("\nTime is up."),
        LoopEnd::Submit => {}
    }

    let outcome = engine.finish(&mut *session, chrono::Utc::now().date_naive())?;
    print_result(session.questions(), &outcome.result);

    if !outcome.persisted {
        eprintln!("Warning: could not save the error book; mistakes from this session were not recorded.");
    } else if !outcome.errors.is_empty() {
        println!("{} question(s) added to the error book.", outcome.errors.len());
    }

    if let Some(path) = &args.report {
        let report = SessionReport::from_session(&*session, title, outcome.errors, chrono::Utc::now())
            .context("session has no result")?;
        if path.extension().is_some_and(|ext| ext == "html") {
            write_session_html(&report, path)?;
        } else {
            report.save_json(path)?;
        }
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_result(questions: &[Question], result: &ScoreResult) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Correct answer", "Result"]);
    for (i, (question, outcome)) in questions.iter().zip(&result.outcomes).enumerate() {
        let verdict = if outcome.correct {
            "correct"
        } else if outcome.answer.is_unanswered() {
            "unanswered"
        } else {
            "wrong"
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(shorten(&question.prompt, 50)),
            Cell::new(&outcome.answer),
            Cell::new(&question.correct_answer),
            Cell::new(verdict),
        ]);
    }
    println!("\n{table}");

    println!(
        "Score: {:.1} / {:.0} | Accuracy: {} | {}/{} correct",
        result.total_score,
        result.max_score,
        result.accuracy_display(),
        result.correct_count,
        result.total_questions
    );
    if let Some(secs) = result.time_used_secs {
        println!("Time used: {}:{:02}", secs / 60, secs % 60);
    }

    let mut breakdown = Table::new();
    breakdown.set_header(vec!["Category", "Correct", "Accuracy"]);
    for (category, tally) in &result.category_breakdown {
        breakdown.add_row(vec![
            Cell::new(category),
            Cell::new(format!("{}/{}", tally.correct, tally.total)),
            Cell::new(format!("{:.1}%", tally.accuracy())),
        ]);
    }
    println!("{breakdown}");

    if !result.recommended_review.is_empty() {
        println!("Review next: {}", result.recommended_review.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drillkit_core::model::{Difficulty, Expected};
    use std::collections::BTreeSet;

    fn question(question_type: QuestionType, options: &[&str], answer: Expected) -> Question {
        Question {
            id: "q".into(),
            question_type,
            category: "general".into(),
            difficulty: Difficulty::Easy,
            prompt: "?".into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: answer,
            explanation: String::new(),
            tags: vec![],
            points: None,
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input(":next"), Ok(Input::Next));
        assert_eq!(parse_input("  :p "), Ok(Input::Prev));
        assert_eq!(parse_input(":jump 3"), Ok(Input::Jump(3)));
        assert_eq!(parse_input(":submit"), Ok(Input::Submit));
        assert_eq!(parse_input(":quit"), Ok(Input::Quit));
        assert!(parse_input(":jump 0").is_err());
        assert!(parse_input(":dance").is_err());
    }

    #[test]
    fn plain_lines_are_answers() {
        assert_eq!(parse_input(" goes "), Ok(Input::Answer("goes".into())));
        assert_eq!(parse_input(""), Ok(Input::Answer(String::new())));
    }

    #[test]
    fn letters_select_options() {
        let q = question(
            QuestionType::MultipleChoice,
            &["go", "goes", "going"],
            Expected::Single("goes".into()),
        );
        assert_eq!(normalize_answer(&q, "b"), "goes");
        assert_eq!(normalize_answer(&q, "going"), "going");
        assert_eq!(normalize_answer(&q, "z"), "z");
    }

    #[test]
    fn option_text_wins_over_letter() {
        let q = question(
            QuestionType::MultipleChoice,
            &["B", "A"],
            Expected::Single("A".into()),
        );
        assert_eq!(normalize_answer(&q, "A"), "A");
        assert_eq!(normalize_answer(&q, "b"), "B");
        assert_eq!(normalize_answer(&q, "a"), "A");
    }

    #[test]
    fn option_text_matches_ignoring_case() {
        let q = question(
            QuestionType::MultipleChoice,
            &["Paris", "Rome"],
            Expected::Single("Rome".into()),
        );
        assert_eq!(normalize_answer(&q, "rome"), "Rome");
        assert_eq!(normalize_answer(&q, "a"), "Paris");
    }

    #[test]
    fn true_false_shorthand() {
        let q = question(QuestionType::TrueFalse, &[], Expected::Single("True".into()));
        assert_eq!(normalize_answer(&q, "t"), "True");
        assert_eq!(normalize_answer(&q, "FALSE"), "False");
    }

    #[test]
    fn multi_answer_letters() {
        let q = question(
            QuestionType::MultipleChoice,
            &["2", "3", "4", "5"],
            Expected::Multiple(BTreeSet::from(["2".into(), "3".into(), "5".into()])),
        );
        assert_eq!(normalize_answer(&q, "a, b,d"), "2,3,5");
    }

    fn running(time_limit: Option<u64>) -> Arc<Mutex<Session>> {
        let mut config = SessionConfig::new("general", Difficulty::Easy, 1);
        config.time_limit_secs = time_limit;
        let mut session = Session::new(config);
        session
            .begin(vec![question(
                QuestionType::MultipleChoice,
                &["go", "goes"],
                Expected::Single("goes".into()),
            )])
            .unwrap();
        Arc::new(Mutex::new(session))
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_submits_idle_session() {
        let session = running(Some(3));
        let (tx, rx) = mpsc::unbounded_channel();

        let end = run_loop(session.clone(), rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(end, LoopEnd::Expired);

        let session = session.lock().await;
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(session.result().unwrap().time_used_secs, Some(3));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_submits_untimed_session() {
        let session = running(None);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok("b".to_string())).unwrap();
        drop(tx);

        let end = run_loop(session.clone(), rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(end, LoopEnd::Submit);

        let session = session.lock().await;
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.answer_for("q"), Some(&Answer::single("goes")));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_leaves_timed_session_unscored() {
        let session = running(Some(60));
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok(":quit".to_string())).unwrap();

        let end = run_loop(session.clone(), rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(end, LoopEnd::Quit);
        assert!(session.lock().await.result().is_none());
        drop(tx);
    }
}
