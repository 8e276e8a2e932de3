//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use drillkit_core::errorbook::ErrorRecord;
use drillkit_core::model::Question;
use drillkit_core::report::SessionReport;
use drillkit_core::scoring::Tally;

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn open_document(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>drillkit: {}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn close_document(html: &mut String) {
    html.push_str("</body>\n</html>");
}

/// Render a question set, optionally with answers and explanations.
pub fn generate_questions_html(title: &str, questions: &[Question], show_answers: bool) -> String {
    let mut html = String::new();
    open_document(&mut html, title);

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} questions</p>\n",
        questions.len()
    ));
    html.push_str("</header>\n");

    html.push_str("<ol class=\"questions\">\n");
    for q in questions {
        html.push_str("<li class=\"question\">\n");
        html.push_str(&format!(
            "<p class=\"badges\"><span class=\"badge\">{}</span><span class=\"badge {}\">{}</span><span class=\"badge\">{}</span></p>\n",
            html_escape(q.question_type.label()),
            q.difficulty,
            q.difficulty,
            html_escape(&q.category),
        ));
        html.push_str(&format!("<p class=\"prompt\">{}</p>\n", html_escape(&q.prompt)));

        if !q.options.is_empty() {
            html.push_str("<ul class=\"options\">\n");
            for option in &q.options {
                let correct = show_answers && q.correct_answer.values().any(|v| v == option);
                html.push_str(&format!(
                    "<li{}>{}</li>\n",
                    if correct { " class=\"correct\"" } else { "" },
                    html_escape(option)
                ));
            }
            html.push_str("</ul>\n");
        }

        if show_answers {
            html.push_str(&format!(
                "<p class=\"answer\">Answer: <strong>{}</strong></p>\n",
                html_escape(&q.correct_answer.to_string())
            ));
            if !q.explanation.is_empty() {
                html.push_str(&format!(
                    "<p class=\"explanation\">{}</p>\n",
                    html_escape(&q.explanation)
                ));
            }
        }

        if !q.tags.is_empty() {
            html.push_str("<p class=\"tags\">");
            for tag in &q.tags {
                html.push_str(&format!("<span class=\"tag\">#{}</span>", html_escape(tag)));
            }
            html.push_str("</p>\n");
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ol>\n");

    close_document(&mut html);
    html
}

/// Render a finished session: summary, breakdowns, and incorrect questions.
pub fn generate_session_html(report: &SessionReport) -> String {
    let result = &report.result;
    let mut html = String::new();
    open_document(&mut html, &report.title);

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} questions | {}</p>\n",
        result.total_questions,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Score</th><th>Accuracy</th><th>Correct</th><th>Incorrect</th><th>Unanswered</th><th>Time used</th></tr></thead>\n");
    let unanswered = result
        .total_questions
        .saturating_sub(result.correct_count + result.incorrect_count);
    let time_used = result
        .time_used_secs
        .map(|s| format!("{}:{:02}", s / 60, s % 60))
        .unwrap_or_else(|| "-".to_string());
    html.push_str(&format!(
        "<tbody><tr><td>{:.1} / {:.0}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr></tbody>\n",
        result.total_score,
        result.max_score,
        result.accuracy_display(),
        result.correct_count,
        result.incorrect_count,
        unanswered,
        time_used,
    ));
    html.push_str("</table>\n");

    if !result.category_breakdown.is_empty() {
        html.push_str(&generate_category_chart(&result.category_breakdown));
    }
    html.push_str("</section>\n");

    // Breakdowns
    html.push_str("<section class=\"breakdown\">\n");
    html.push_str("<h2>By category</h2>\n");
    push_tally_table(
        &mut html,
        "Category",
        result
            .category_breakdown
            .iter()
            .map(|(k, v)| (k.clone(), v)),
    );
    html.push_str("<h2>By difficulty</h2>\n");
    push_tally_table(
        &mut html,
        "Difficulty",
        result
            .difficulty_breakdown
            .iter()
            .map(|(k, v)| (k.to_string(), v)),
    );
    if !result.recommended_review.is_empty() {
        html.push_str("<p class=\"review\">Recommended review: ");
        let tags: Vec<String> = result
            .recommended_review
            .iter()
            .map(|t| format!("<span class=\"tag\">#{}</span>", html_escape(t)))
            .collect();
        html.push_str(&tags.join(" "));
        html.push_str("</p>\n");
    }
    html.push_str("</section>\n");

    // Incorrect questions
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Incorrect questions</h2>\n");
    if report.errors.is_empty() {
        html.push_str("<p class=\"meta\">No incorrect questions.</p>\n");
    } else {
        html.push_str("<table class=\"results-table\">\n");
        html.push_str("<thead><tr><th>Question</th><th>Your answer</th><th>Correct answer</th><th>Explanation</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for record in &report.errors {
            push_error_row(&mut html, record);
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    close_document(&mut html);
    html
}

fn push_tally_table<'a>(
    html: &mut String,
    label: &str,
    rows: impl Iterator<Item = (String, &'a Tally)>,
) {
    html.push_str("<table>\n");
    html.push_str(&format!(
        "<thead><tr><th>{label}</th><th>Correct</th><th>Total</th><th>Accuracy</th></tr></thead>\n"
    ));
    html.push_str("<tbody>\n");
    for (name, tally) in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            html_escape(&name),
            tally.correct,
            tally.total,
            tally.accuracy()
        ));
    }
    html.push_str("</tbody></table>\n");
}

fn push_error_row(html: &mut String, record: &ErrorRecord) {
    html.push_str(&format!(
        "<tr class=\"fail\"><td>{}</td><td>{}</td><td class=\"pass\">{}</td><td>{}</td></tr>\n",
        html_escape(&record.question),
        html_escape(&record.user_answer.to_string()),
        html_escape(&record.correct_answer.to_string()),
        html_escape(&record.explanation),
    ));
}

/// Write a question-set page to a file.
pub fn write_questions_html(
    title: &str,
    questions: &[Question],
    show_answers: bool,
    path: &Path,
) -> Result<()> {
    write_page(&generate_questions_html(title, questions, show_answers), path)
}

/// Write a session report page to a file.
pub fn write_session_html(report: &SessionReport, path: &Path) -> Result<()> {
    write_page(&generate_session_html(report), path)
}

fn write_page(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CHART_ROW: usize = 28;
const CHART_GAP: usize = 8;
const CHART_LABEL: usize = 160;
const CHART_TRACK: usize = 360;
const CORRECT_FILL: &str = "#22c55e";
const MISSED_FILL: &str = "#ef4444";

/// One stacked bar per category: correct answers, then misses. Bar length is
/// scaled to the category with the most questions so sizes stay comparable.
fn generate_category_chart(per_category: &BTreeMap<String, Tally>) -> String {
    let largest = per_category.values().map(|t| t.total).max().unwrap_or(0).max(1);
    let scale = |n: usize| n * CHART_TRACK / largest;
    let height = per_category.len() * (CHART_ROW + CHART_GAP) + CHART_GAP;

    let mut svg = format!(
        "<svg class=\"category-chart\" width=\"{}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-label=\"Correct answers by category\">\n",
        CHART_LABEL + CHART_TRACK + 160,
    );

    for (i, (category, tally)) in per_category.iter().enumerate() {
        let y = i * (CHART_ROW + CHART_GAP) + CHART_GAP;
        let mid = y + CHART_ROW / 2;
        let correct = scale(tally.correct);
        let missed = scale(tally.total) - correct;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{mid}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            CHART_LABEL - 10,
            html_escape(category)
        ));
        if correct > 0 {
            svg.push_str(&format!(
                "  <rect x=\"{CHART_LABEL}\" y=\"{y}\" width=\"{correct}\" height=\"{CHART_ROW}\" fill=\"{CORRECT_FILL}\"/>\n"
            ));
        }
        if missed > 0 {
            svg.push_str(&format!(
                "  <rect x=\"{}\" y=\"{y}\" width=\"{missed}\" height=\"{CHART_ROW}\" fill=\"{MISSED_FILL}\"/>\n",
                CHART_LABEL + correct
            ));
        }
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{mid}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}/{} ({:.1}%)</text>\n",
            CHART_LABEL + correct + missed + 8,
            tally.correct,
            tally.total,
            tally.accuracy()
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --muted: #6b7280; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: var(--muted); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass, .correct { background: var(--pass); }
.fail { background: var(--fail); }
.question { margin: 1.5rem 0; }
.prompt { font-weight: 600; }
.options li { padding: 0.2rem 0.5rem; border-radius: 4px; }
.badge { display: inline-block; margin-right: 0.5rem; padding: 0.1rem 0.5rem; border: 1px solid var(--border); border-radius: 999px; font-size: 0.8rem; }
.badge.easy { background: var(--pass); }
.badge.hard { background: var(--fail); }
.tag { margin-right: 0.5rem; color: var(--muted); font-size: 0.85rem; }
.explanation { color: var(--muted); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};

    use drillkit_core::errorbook::collect;
    use drillkit_core::model::{Answer, Difficulty, Expected, QuestionType};
    use drillkit_core::scoring::score;

    fn make_questions() -> Vec<Question> {
        vec![
            Question {
                id: "mc-1".into(),
                question_type: QuestionType::MultipleChoice,
                category: "programming".into(),
                difficulty: Difficulty::Easy,
                prompt: "Which tag is <b>bold</b>?".into(),
                options: vec!["<b>".into(), "<i>".into()],
                correct_answer: Expected::Single("<b>".into()),
                explanation: "b stands for bold".into(),
                tags: vec!["html".into()],
                points: None,
            },
            Question {
                id: "sa-1".into(),
                question_type: QuestionType::ShortAnswer,
                category: "math".into(),
                difficulty: Difficulty::Hard,
                prompt: "Name two primes below 5".into(),
                options: vec![],
                correct_answer: Expected::Multiple(BTreeSet::from(["2".into(), "3".into()])),
                explanation: String::new(),
                tags: vec!["primes".into()],
                points: None,
            },
        ]
    }

    fn make_report() -> SessionReport {
        let questions = make_questions();
        let answers: HashMap<String, Answer> = HashMap::from([
            ("mc-1".to_string(), Answer::single("<b>")),
            ("sa-1".to_string(), Answer::single("2")),
        ]);
        let date = chrono::NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        SessionReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            title: "Mixed drill".into(),
            result: score(&questions, &answers),
            errors: collect(&questions, &answers, date),
            questions,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn question_set_hides_answers_when_asked() {
        let questions = make_questions();
        let hidden = generate_questions_html("Set", &questions, false);
        assert!(hidden.contains("Which tag is &lt;b&gt;bold&lt;/b&gt;?"));
        assert!(!hidden.contains("Answer:"));
        assert!(!hidden.contains("class=\"correct\""));

        let shown = generate_questions_html("Set", &questions, true);
        assert!(shown.contains("Answer: <strong>2, 3</strong>"));
        assert!(shown.contains("<li class=\"correct\">&lt;b&gt;</li>"));
        assert!(shown.contains("#primes"));
    }

    #[test]
    fn session_report_contains_required_elements() {
        let html = generate_session_html(&make_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Mixed drill"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("Name two primes below 5"));
        assert!(html.contains("<td>programming</td>"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn session_report_write_to_file() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.html");

        write_session_html(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }

    #[test]
    fn category_chart_stacks_correct_and_missed() {
        let per_category = BTreeMap::from([
            ("english".to_string(), Tally { correct: 1, total: 4 }),
            ("math".to_string(), Tally { correct: 2, total: 2 }),
        ]);
        let svg = generate_category_chart(&per_category);

        assert!(svg.contains("1/4 (25.0%)"));
        assert!(svg.contains("2/2 (100.0%)"));
        // english spans the full track: 90 correct, 270 missed.
        assert!(svg.contains(&format!("width=\"90\" height=\"{CHART_ROW}\" fill=\"{CORRECT_FILL}\"")));
        assert!(svg.contains("x=\"250\" y=\"8\" width=\"270\""));
        // math has no misses, so only one bar segment.
        assert_eq!(svg.matches(MISSED_FILL).count(), 1);
    }
}
