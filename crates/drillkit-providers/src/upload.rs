//! Simulated upload parsing.
//!
//! No file content is read. Topics are inferred from keywords in the file
//! name and a batch of multiple-choice, true/false and fill-in questions is
//! synthesized from them.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use drillkit_core::model::{
    Difficulty, Expected, Practice, Question, QuestionType, FALSE_ANSWER, TRUE_ANSWER,
};

/// Category assigned to uploaded questions.
pub const UPLOAD_CATEGORY: &str = "programming";

/// Tag appended to every uploaded question.
const BASICS_TAG: &str = "basics";

/// The option that is always correct in synthesized multiple-choice questions.
const CORRECT_OPTION: &str = "Option A";

const OPTION_COUNT: usize = 4;

const DISTRACTORS: &[&str] = &[
    "Option B",
    "Option C",
    "Option D",
    "None of the above",
    "Deprecated syntax",
    "Another approach",
];

/// File-name keyword to related topics. Matching is case-insensitive and
/// substring-based, so `react-hooks.pdf` matches `react`.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("javascript", &["JavaScript", "ES6", "Async", "Closures", "Prototypes", "Data types", "Functions", "Objects", "Arrays"]),
    ("js", &["JavaScript", "ES6", "Async", "Closures", "Prototypes", "Data types", "Functions", "Objects", "Arrays"]),
    ("react", &["React", "Components", "Hooks", "State management", "JSX", "Lifecycle", "Virtual DOM", "Props", "State"]),
    ("vue", &["Vue", "Components", "Directives", "Lifecycle", "Computed", "Watchers", "v-model", "Routing"]),
    ("angular", &["Angular", "Components", "Services", "Dependency injection", "Modules", "Pipes", "Directives", "Forms"]),
    ("html", &["HTML", "Tags", "Semantics", "DOM", "Forms", "Tables", "Links", "Images", "Meta"]),
    ("css", &["CSS", "Styling", "Layout", "Flexbox", "Grid", "Selectors", "Box model", "Responsive design", "Animation"]),
    ("typescript", &["TypeScript", "Types", "Interfaces", "Generics", "Decorators", "Type inference", "Union types", "Intersection types"]),
    ("node", &["Node.js", "Modules", "fs", "http", "Express", "Middleware", "Routing", "Databases", "APIs"]),
    ("express", &["Express", "Middleware", "Routing", "Requests", "Responses", "Error handling", "Template engines"]),
    ("mongodb", &["MongoDB", "Databases", "Collections", "Documents", "Queries", "Indexes", "Aggregation", "Schemas"]),
    ("sql", &["SQL", "Databases", "Tables", "Queries", "Indexes", "Transactions", "Stored procedures", "Views"]),
    ("git", &["Git", "Version control", "Branches", "Commits", "Merging", "Conflicts", "Remotes", "Staging"]),
    ("webpack", &["Webpack", "Bundling", "Loaders", "Plugins", "Configuration", "Optimization", "Modules"]),
    ("vite", &["Vite", "Bundling", "Dev server", "Configuration", "Plugins", "Hot reload", "Modules"]),
    ("next", &["Next.js", "SSR", "Routing", "API routes", "Components", "Pages"]),
    ("algorithm", &["Algorithms", "Data structures", "Sorting", "Searching", "Dynamic programming", "Recursion", "Graphs", "Trees"]),
    ("network", &["Networking", "HTTP", "HTTPS", "TCP", "IP", "DNS", "WebSocket", "REST"]),
    ("security", &["Security", "XSS", "CSRF", "Encryption", "Authentication", "Authorization", "CORS"]),
    ("test", &["Testing", "Unit tests", "Integration tests", "End-to-end tests", "Coverage"]),
];

/// Topics used when the file name matches no keyword.
const DEFAULT_TOPICS: &[&str] = &["Front-end development", "Programming basics", "Code style", "Best practices"];

/// Extract topics from a file name, in keyword order, without duplicates.
pub fn extract_topics(file_name: &str) -> Vec<&'static str> {
    let name = file_name.to_lowercase();
    let mut topics: Vec<&'static str> = Vec::new();
    for (keyword, related) in TOPIC_KEYWORDS {
        if name.contains(keyword) {
            for topic in *related {
                if !topics.contains(topic) {
                    topics.push(topic);
                }
            }
        }
    }
    if topics.is_empty() {
        topics.extend_from_slice(DEFAULT_TOPICS);
    }
    topics
}

fn prompt_for(rng: &mut StdRng, topic: &str, question_type: QuestionType) -> String {
    let templates: [String; 3] = match question_type {
        QuestionType::MultipleChoice => [
            format!("Which of the following correctly describes {topic}?"),
            format!("Which statement about {topic} is accurate?"),
            format!("Which option follows the conventions of {topic}?"),
        ],
        QuestionType::TrueFalse => [
            format!("{topic} is a core concept worth mastering early."),
            format!("{topic} improves the maintainability of code."),
            format!("{topic} is considered difficult to learn."),
        ],
        _ => [
            "___ is an important concept covered in this material.".to_string(),
            format!("The topic that covers ideas such as {} is ___.", topic.to_lowercase()),
            "This section of the material is mainly about ___.".to_string(),
        ],
    };
    let index = rng.gen_range(0..templates.len());
    templates[index].clone()
}

/// Turns an uploaded file name into a set of practice questions.
pub struct UploadParser {
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl UploadParser {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            delay: Duration::ZERO,
        }
    }

    /// Wait this long before answering, to mimic processing time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// "Parse" a file into `count` questions.
    #[tracing::instrument(skip(self))]
    pub async fn parse(&self, file_name: &str, count: usize) -> Result<Vec<Question>> {
        if file_name.trim().is_empty() {
            anyhow::bail!("file name is empty");
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let topics = extract_topics(file_name);
        let questions = self.synthesize(&topics, count)?;
        tracing::info!(file = file_name, questions = questions.len(), "upload parsed");
        Ok(questions)
    }

    /// Parse a file and wrap the result as a named practice.
    pub async fn parse_practice(
        &self,
        file_name: &str,
        count: usize,
        created_at: DateTime<Utc>,
    ) -> Result<Practice> {
        let questions = self.parse(file_name, count).await?;
        let stem = std::path::Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        Ok(Practice::new(
            format!("{stem} practice"),
            Some(file_name.to_string()),
            questions,
            created_at,
        ))
    }

    fn synthesize(&self, topics: &[&str], count: usize) -> Result<Vec<Question>> {
        const TYPES: [QuestionType; 3] = [
            QuestionType::MultipleChoice,
            QuestionType::TrueFalse,
            QuestionType::FillBlank,
        ];
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("upload rng lock poisoned"))?;

        let mut questions = Vec::with_capacity(count);
        for i in 0..count {
            let question_type = *TYPES.choose(&mut *rng).unwrap_or(&QuestionType::FillBlank);
            let topic = *topics.choose(&mut *rng).unwrap_or(&DEFAULT_TOPICS[0]);
            let prompt = prompt_for(&mut rng, topic, question_type);

            let (options, answer) = match question_type {
                QuestionType::MultipleChoice => {
                    let mut options = vec![CORRECT_OPTION.to_string()];
                    options.extend(
                        DISTRACTORS
                            .choose_multiple(&mut *rng, OPTION_COUNT - 1)
                            .map(|d| d.to_string()),
                    );
                    options.shuffle(&mut *rng);
                    (options, CORRECT_OPTION.to_string())
                }
                QuestionType::TrueFalse => {
                    let answer = if rng.gen_bool(0.5) { TRUE_ANSWER } else { FALSE_ANSWER };
                    (vec![], answer.to_string())
                }
                _ => (vec![], topic.to_string()),
            };

            questions.push(Question {
                id: format!("q{}", i + 1),
                question_type,
                category: UPLOAD_CATEGORY.into(),
                difficulty: *Difficulty::ALL.choose(&mut *rng).unwrap_or(&Difficulty::Medium),
                prompt,
                options,
                correct_answer: Expected::Single(answer),
                explanation: format!("Review the section on {topic} in the uploaded material."),
                tags: vec![
                    topic.to_string(),
                    question_type.label().to_string(),
                    BASICS_TAG.to_string(),
                ],
                points: None,
            });
        }
        Ok(questions)
    }
}

impl Default for UploadParser {
    fn default() -> Self {
        Self::new()
    }
}
