//! Randomized template-based question generator.
//!
//! Stands in for an AI question service: questions are drawn from small
//! per-category template pools, with arithmetic questions synthesized on the
//! fly for `math`. Duplicate avoidance is best-effort: each slot gets a bounded
//! number of attempts to find an unused `prompt + type` pair and is skipped
//! when they run out, so small pools can yield fewer questions than requested.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use drillkit_core::model::{
    Difficulty, Expected, Question, QuestionType, FALSE_ANSWER, TRUE_ANSWER,
};
use drillkit_core::traits::{GenerateRequest, QuestionProvider, DEFAULT_CATEGORY};

/// Attempts per slot before giving up on finding a fresh question.
const MAX_ATTEMPTS_PER_SLOT: usize = 32;

const TRUE_ANSWERS: &[&str] = &[TRUE_ANSWER];
const FALSE_ANSWERS: &[&str] = &[FALSE_ANSWER];

/// A static question template.
struct Template {
    question_type: QuestionType,
    prompt: &'static str,
    options: &'static [&'static str],
    answers: &'static [&'static str],
    explanation: &'static str,
    tag: &'static str,
}

const fn mc(
    prompt: &'static str,
    options: &'static [&'static str],
    answer: &'static [&'static str],
    explanation: &'static str,
    tag: &'static str,
) -> Template {
    Template {
        question_type: QuestionType::MultipleChoice,
        prompt,
        options,
        answers: answer,
        explanation,
        tag,
    }
}

const fn tf(prompt: &'static str, truth: bool, explanation: &'static str, tag: &'static str) -> Template {
    Template {
        question_type: QuestionType::TrueFalse,
        prompt,
        options: &[],
        answers: if truth { TRUE_ANSWERS } else { FALSE_ANSWERS },
        explanation,
        tag,
    }
}

const fn fill(prompt: &'static str, answer: &'static [&'static str], explanation: &'static str, tag: &'static str) -> Template {
    Template {
        question_type: QuestionType::FillBlank,
        prompt,
        options: &[],
        answers: answer,
        explanation,
        tag,
    }
}

const fn short(
    prompt: &'static str,
    answers: &'static [&'static str],
    explanation: &'static str,
    tag: &'static str,
) -> Template {
    Template {
        question_type: QuestionType::ShortAnswer,
        prompt,
        options: &[],
        answers,
        explanation,
        tag,
    }
}

const MATH: &[Template] = &[
    mc("What is the square root of 144?", &["10", "12", "14", "16"], &["12"], "12 x 12 = 144.", "roots"),
    mc("How many degrees are in the interior angles of a triangle?", &["90", "180", "270", "360"], &["180"], "Interior angles of any triangle sum to 180 degrees.", "geometry"),
    mc("Which number is prime?", &["21", "27", "29", "33"], &["29"], "29 has no divisors other than 1 and itself.", "primes"),
    tf("Every square is a rectangle.", true, "A square has four right angles, which is all a rectangle needs.", "geometry"),
    tf("Zero is an odd number.", false, "Zero is divisible by 2, so it is even.", "parity"),
    fill("The value of pi to two decimal places is ___.", &["3.14"], "Pi is approximately 3.14159.", "constants"),
    fill("A polygon with six sides is called a ___.", &["hexagon"], "Hex means six.", "geometry"),
    short("Name the two prime factors of 15.", &["3", "5"], "15 = 3 x 5.", "primes"),
];

const ENGLISH: &[Template] = &[
    mc("Which word is a synonym of 'happy'?", &["sad", "joyful", "angry", "tired"], &["joyful"], "'Joyful' means feeling great happiness.", "vocabulary"),
    mc("Choose the correct form: She ___ to school every day.", &["go", "goes", "going", "gone"], &["goes"], "Third person singular takes -es in the present simple.", "grammar"),
    mc("Which word is an adverb?", &["quick", "quickly", "quicker", "quickness"], &["quickly"], "Adverbs often end in -ly.", "grammar"),
    tf("'Their' and 'there' mean the same thing.", false, "'Their' is possessive; 'there' refers to a place.", "homophones"),
    tf("'Children' is the plural of 'child'.", true, "It is an irregular plural.", "plurals"),
    fill("The past tense of 'run' is ___.", &["ran"], "'Run' is an irregular verb: run, ran, run.", "verbs"),
    fill("The opposite of 'ancient' is ___.", &["modern"], "'Ancient' means very old; 'modern' means recent.", "vocabulary"),
    short("Name the two articles used before singular countable nouns.", &["a", "an"], "'A' and 'an' are the indefinite articles.", "grammar"),
];

const PROGRAMMING: &[Template] = &[
    mc("Which keyword declares an immutable binding in Rust?", &["let", "mut", "var", "const fn"], &["let"], "Bindings are immutable unless marked mut.", "rust"),
    mc("Which data structure is first-in, first-out?", &["stack", "queue", "tree", "heap"], &["queue"], "A queue removes elements in insertion order.", "data structures"),
    mc("What does HTML stand for?", &["HyperText Markup Language", "High Transfer Machine Language", "Hyperlink Text Mode Language", "Home Tool Markup Language"], &["HyperText Markup Language"], "HTML is the markup language of the web.", "html"),
    tf("Binary search requires sorted input.", true, "It relies on ordering to halve the search space.", "algorithms"),
    tf("In JavaScript, '==' never performs type coercion.", false, "'==' coerces; '===' does not.", "javascript"),
    fill("The time complexity of binary search is O(___).", &["log n"], "Each step halves the remaining range.", "algorithms"),
    fill("The git command that records staged changes is git ___.", &["commit"], "git commit creates a new commit from the index.", "git"),
    short("Name the three primary colors of the RGB model.", &["red", "green", "blue"], "RGB stands for red, green, blue.", "graphics"),
];

const GENERAL: &[Template] = &[
    mc("What is the largest planet in our solar system?", &["Earth", "Saturn", "Jupiter", "Neptune"], &["Jupiter"], "Jupiter is more than twice as massive as all other planets combined.", "astronomy"),
    mc("Which gas do plants absorb from the atmosphere?", &["oxygen", "nitrogen", "carbon dioxide", "helium"], &["carbon dioxide"], "Plants use carbon dioxide in photosynthesis.", "biology"),
    mc("How many continents are there?", &["5", "6", "7", "8"], &["7"], "Africa, Antarctica, Asia, Australia, Europe, North and South America.", "geography"),
    tf("Water boils at 100 degrees Celsius at sea level.", true, "At standard pressure, yes.", "physics"),
    tf("The Great Wall of China is visible from the Moon with the naked eye.", false, "It is far too narrow to see from that distance.", "history"),
    fill("The chemical symbol for gold is ___.", &["Au"], "From the Latin 'aurum'.", "chemistry"),
    fill("The longest river in Africa is the ___.", &["Nile"], "The Nile is about 6,650 km long.", "geography"),
    short("Name the two gases that make up most of Earth's atmosphere.", &["nitrogen", "oxygen"], "Nitrogen is about 78% and oxygen about 21%.", "earth science"),
];

fn pool(category: &str) -> (&'static str, &'static [Template]) {
    match category {
        "math" => ("math", MATH),
        "english" => ("english", ENGLISH),
        "programming" => ("programming", PROGRAMMING),
        _ => (DEFAULT_CATEGORY, GENERAL),
    }
}

/// A randomized mock question generator.
pub struct TemplateProvider {
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl TemplateProvider {
    /// A provider seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            delay: Duration::ZERO,
        }
    }

    /// A reproducible provider.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            delay: Duration::ZERO,
        }
    }

    /// Wait this long before answering, to mimic a remote service.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn build(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("template rng lock poisoned"))?;
        let (category, templates) = pool(&request.category);
        if category != request.category {
            tracing::debug!("unknown category '{}', using '{category}'", request.category);
        }

        let mut seen: HashSet<(String, QuestionType)> = HashSet::new();
        let mut questions = Vec::with_capacity(request.count);

        for slot in 0..request.count {
            let fresh = (0..MAX_ATTEMPTS_PER_SLOT).find_map(|_| {
                let candidate = if category == "math" && rng.gen_bool(0.5) {
                    arithmetic(&mut *rng, request.difficulty)
                } else {
                    templates.choose(&mut *rng).map(instantiate)?
                };
                let key = (candidate.prompt.clone(), candidate.question_type);
                (!seen.contains(&key)).then_some(candidate)
            });
            let Some(mut question) = fresh else {
                tracing::debug!(slot, "no fresh template after {MAX_ATTEMPTS_PER_SLOT} attempts, skipping");
                continue;
            };
            seen.insert((question.prompt.clone(), question.question_type));

            question.options.shuffle(&mut *rng);
            question.id = format!(
                "{}-{}-{:08x}",
                question.question_type.id_prefix(),
                questions.len(),
                rng.gen::<u32>()
            );
            question.category = category.to_string();
            question.difficulty = request.difficulty;
            question.tags = vec![
                category.to_string(),
                request.difficulty.to_string(),
                question.question_type.label().to_string(),
            ]
            .into_iter()
            .chain(question.tags)
            .collect();
            questions.push(question);
        }

        Ok(questions)
    }
}

impl Default for TemplateProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn instantiate(template: &Template) -> Question {
    let correct_answer = match template.question_type {
        QuestionType::ShortAnswer => {
            Expected::Multiple(template.answers.iter().map(|a| a.to_string()).collect())
        }
        _ => Expected::Single(template.answers.first().copied().unwrap_or_default().to_string()),
    };
    Question {
        id: String::new(),
        question_type: template.question_type,
        category: String::new(),
        difficulty: Difficulty::default(),
        prompt: template.prompt.to_string(),
        options: template.options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
        explanation: template.explanation.to_string(),
        tags: vec![template.tag.to_string()],
        points: None,
    }
}

/// A fill-in arithmetic question scaled to the difficulty.
fn arithmetic(rng: &mut StdRng, difficulty: Difficulty) -> Question {
    let (prompt, answer) = match difficulty {
        Difficulty::Easy => {
            let (a, b) = (rng.gen_range(1..=20), rng.gen_range(1..=20));
            (format!("{a} + {b} = ___"), a + b)
        }
        Difficulty::Medium => {
            let (a, b) = (rng.gen_range(2..=12), rng.gen_range(2..=12));
            (format!("{a} x {b} = ___"), a * b)
        }
        Difficulty::Hard => {
            let (a, b, c) = (
                rng.gen_range(2..=12),
                rng.gen_range(2..=12),
                rng.gen_range(1..=50),
            );
            (format!("{a} x {b} - {c} = ___"), a * b - c)
        }
    };
    Question {
        id: String::new(),
        question_type: QuestionType::FillBlank,
        category: String::new(),
        difficulty,
        prompt,
        options: vec![],
        correct_answer: Expected::Single(answer.to_string()),
        explanation: String::new(),
        tags: vec!["arithmetic".into()],
        points: None,
    }
}

#[async_trait]
impl QuestionProvider for TemplateProvider {
    fn name(&self) -> &str {
        "template"
    }

    #[instrument(skip(self, request), fields(category = %request.category, count = request.count))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<Vec<Question>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let questions = self.build(request)?;
        tracing::debug!(generated = questions.len(), "template generation done");
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn generate(provider: &TemplateProvider, category: &str, difficulty: Difficulty, count: usize) -> Vec<Question> {
        provider
            .generate(&GenerateRequest::new(category, difficulty, count))
            .await
            .unwrap()
    }

    #[test]
    fn every_template_is_valid() {
        for templates in [MATH, ENGLISH, PROGRAMMING, GENERAL] {
            assert!(templates.len() >= 8);
            for t in templates {
                let mut q = instantiate(t);
                q.id = "t".into();
                q.validate().unwrap();
            }
        }
    }

    #[tokio::test]
    async fn english_easy_scenario() {
        let provider = TemplateProvider::with_seed(7);
        let questions = generate(&provider, "english", Difficulty::Easy, 5).await;
        assert_eq!(questions.len(), 5);
        for q in &questions {
            assert_eq!(q.category, "english");
            assert_eq!(q.difficulty, Difficulty::Easy);
            assert_eq!(&q.tags[..3], &["english", "easy", q.question_type.label()]);
            q.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn no_duplicate_prompts_when_pool_is_large_enough() {
        let provider = TemplateProvider::with_seed(42);
        let questions = generate(&provider, "general", Difficulty::Medium, 8).await;
        let keys: HashSet<_> = questions
            .iter()
            .map(|q| (q.prompt.clone(), q.question_type))
            .collect();
        assert_eq!(keys.len(), questions.len());
    }

    #[tokio::test]
    async fn small_pool_returns_fewer() {
        let provider = TemplateProvider::with_seed(1);
        let questions = generate(&provider, "programming", Difficulty::Hard, 20).await;
        assert!(questions.len() <= PROGRAMMING.len());
        assert!(!questions.is_empty());
    }

    #[tokio::test]
    async fn unknown_category_falls_back_to_general() {
        let provider = TemplateProvider::with_seed(3);
        let questions = generate(&provider, "astrology", Difficulty::Easy, 3).await;
        assert_eq!(questions.len(), 3);
        assert!(questions.iter().all(|q| q.category == DEFAULT_CATEGORY));
    }

    #[tokio::test]
    async fn same_seed_same_questions() {
        let a = generate(&TemplateProvider::with_seed(99), "math", Difficulty::Hard, 6).await;
        let b = generate(&TemplateProvider::with_seed(99), "math", Difficulty::Hard, 6).await;
        assert_eq!(a, b);
    }

    #[test]
    fn arithmetic_answers_are_correct() {
        let mut rng = StdRng::seed_from_u64(5);
        for difficulty in Difficulty::ALL {
            let q = arithmetic(&mut rng, difficulty);
            let Expected::Single(answer) = &q.correct_answer else {
                panic!("arithmetic answers are single");
            };
            let expr = q.prompt.trim_end_matches(" = ___");
            let parts: Vec<&str> = expr.split(' ').collect();
            let n = |i: usize| parts[i].parse::<i64>().unwrap();
            let expected = match parts.len() {
                3 if parts[1] == "+" => n(0) + n(2),
                3 => n(0) * n(2),
                _ => n(0) * n(2) - n(4),
            };
            assert_eq!(answer, &expected.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_delay_is_applied() {
        let provider = TemplateProvider::with_seed(1).with_delay(Duration::from_millis(800));
        let start = tokio::time::Instant::now();
        generate(&provider, "math", Difficulty::Easy, 1).await;
        assert!(start.elapsed() >= Duration::from_millis(800));
    }
}
