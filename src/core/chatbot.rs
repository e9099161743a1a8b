//! Chatbot business logic - Answers tax questions from a fixed Q&A corpus.
//!
//! The corpus is a plain text file of question and answer blocks:
//!
//! ```text
//! # comment
//! Q: What is a tax deduction?
//! A: An amount subtracted from taxable income.
//!    Answers may continue over several lines.
//! ```
//!
//! It is loaded once at startup and shared read-only. Questions are matched against it
//! by word overlap, and every exchange is stored as a [`chat`] record.

use crate::{
    core::validation::{BLANK, FieldErrors},
    entities::{Chat, chat},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use std::{collections::HashSet, path::Path};
use tracing::{debug, info};

/// Reply used when no corpus entry matches well enough.
pub const FALLBACK_ANSWER: &str = "Sorry, I don't have an answer for that yet. \
I can help with questions about tax deductions, receipts and expense reports.";

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "could", "do", "does",
    "for", "from", "how", "i", "if", "in", "is", "it", "me", "my", "of", "on", "or", "should",
    "so", "that", "the", "this", "to", "was", "what", "when", "where", "which", "who", "why",
    "will", "with", "would", "you", "your",
];

const QUESTION_WEIGHT: f64 = 2.0;
const ANSWER_WEIGHT: f64 = 1.0;

/// Lower-cased content words of `text`.
fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

#[derive(Debug, Clone)]
struct Entry {
    question: String,
    answer: String,
    question_tokens: HashSet<String>,
    answer_tokens: HashSet<String>,
}

impl Entry {
    fn new(question: String, answer: String) -> Self {
        Self {
            question_tokens: tokenize(&question),
            answer_tokens: tokenize(&answer),
            question,
            answer,
        }
    }

    /// Weighted share of the query's words this entry covers, from 0 to 2.
    fn score(&self, query: &HashSet<String>) -> f64 {
        let total: f64 = query
            .iter()
            .map(|token| {
                if self.question_tokens.contains(token) {
                    QUESTION_WEIGHT
                } else if self.answer_tokens.contains(token) {
                    ANSWER_WEIGHT
                } else {
                    0.0
                }
            })
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let count = query.len() as f64;
        total / count
    }
}

/// Question and answer pairs the chatbot draws its replies from.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<Entry>,
}

#[derive(Default)]
struct Block {
    question: Vec<String>,
    answer: Vec<String>,
    in_answer: bool,
}

impl Block {
    fn finish(&mut self, entries: &mut Vec<Entry>) {
        let block = std::mem::take(self);
        if !block.question.is_empty() && !block.answer.is_empty() {
            entries.push(Entry::new(block.question.join(" "), block.answer.join(" ")));
        }
    }
}

impl Corpus {
    /// Parses corpus text. Blocks without both a question and an answer are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut block = Block::default();

        for line in text.lines().map(str::trim) {
            if line.starts_with('#') {
                continue;
            }
            if line.is_empty() {
                block.finish(&mut entries);
            } else if let Some(question) = line.strip_prefix("Q:") {
                block.finish(&mut entries);
                block.question.push(question.trim().to_string());
            } else if let Some(answer) = line.strip_prefix("A:") {
                block.in_answer = true;
                block.answer.push(answer.trim().to_string());
            } else if block.in_answer {
                block.answer.push(line.to_string());
            } else if !block.question.is_empty() {
                block.question.push(line.to_string());
            }
        }
        block.finish(&mut entries);

        Self { entries }
    }

    /// Reads and parses the corpus file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let corpus = Self::parse(&text);
        info!(
            "Loaded {} chatbot entries from {}",
            corpus.len(),
            path.as_ref().display()
        );
        Ok(corpus)
    }

    /// Number of question and answer pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best answer for `question`, or [`FALLBACK_ANSWER`] if nothing scores at least
    /// `min_score`. Ties go to the entry that appears first.
    #[must_use]
    pub fn answer(&self, question: &str, min_score: f64) -> &str {
        let query = tokenize(question);
        if query.is_empty() {
            return FALLBACK_ANSWER;
        }

        let mut best: Option<(&Entry, f64)> = None;
        for entry in &self.entries {
            let score = entry.score(&query);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) if score >= min_score => {
                debug!("Matched {:?} with score {:.2}", entry.question, score);
                &entry.answer
            }
            _ => FALLBACK_ANSWER,
        }
    }
}

/// Request body for [`ask`].
#[derive(Debug, Default, Deserialize)]
pub struct AskPayload {
    pub question: Option<String>,
}

impl AskPayload {
    /// Returns the trimmed question once it is present and not blank.
    pub fn validate(self) -> Result<String> {
        let mut errors = FieldErrors::new();
        match errors.required("question", self.question) {
            Some(question) if !question.trim().is_empty() => Ok(question.trim().to_string()),
            Some(_) => {
                errors.add("question", BLANK);
                Err(errors.into())
            }
            None => Err(errors.into()),
        }
    }
}

/// Answers `question` from the corpus and records the exchange for the user.
pub async fn ask(
    db: &DatabaseConnection,
    user_id: i64,
    corpus: &Corpus,
    min_score: f64,
    question: String,
) -> Result<chat::Model> {
    let answer = corpus.answer(&question, min_score).to_string();
    let chat = chat::ActiveModel {
        question: Set(question),
        answer: Set(answer),
        user_id: Set(user_id),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let saved = chat.insert(db).await?;
    info!("User {} asked the chatbot (chat {})", user_id, saved.id);
    Ok(saved)
}

/// The user's past exchanges, newest first.
pub async fn history(db: &DatabaseConnection, user_id: i64) -> Result<Vec<chat::Model>> {
    Chat::find()
        .filter(chat::Column::UserId.eq(user_id))
        .order_by_desc(chat::Column::Timestamp)
        .order_by_desc(chat::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
