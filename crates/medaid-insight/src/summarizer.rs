//! Title summarizer for chat conversations.
//!
//! Rules are tried in order and the first one producing a short enough label
//! wins:
//! 1. the topic clause of a question ("What should I do for a headache")
//! 2. a short window around the first known health keyword
//! 3. the whole message, if it has five words or fewer
//! 4. a possessive noun phrase ("my lower back")
//! 5. the message truncated at a word boundary, with an ellipsis

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

/// Longest title, in characters, including any ellipsis.
pub const MAX_TITLE_LEN: usize = 25;

const ELLIPSIS: &str = "...";
const EMPTY_TITLE: &str = "New chat";

/// Which rule produced a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleRule {
    Empty,
    Question,
    Keyword,
    Short,
    Possessive,
    Fallback,
}

/// A summarized title and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Title {
    pub text: String,
    pub rule: TitleRule,
}

// =============================================================================
// Compiled patterns
// =============================================================================

static QUESTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(?:what|how)\s+(?:should|do|can|could|would|must)\s+(?:i|we|you|one)\s+(?:do\s+)?(?:(?:for|about|with|if|when)\s+)?(?:(?:a|an|the|my|our|this)\s+)?(?P<topic>.+?)[\s?.!]*$",
        r"(?i)^how\s+(?:do|can|should|to)\s+(?:(?:i|we|you)\s+)?(?P<topic>.+?)[\s?.!]*$",
        r"(?i)^(?:what|who)\s+(?:is|are)\s+(?:(?:a|an|the)\s+)?(?P<topic>.+?)[\s?.!]*$",
        r"(?i)^what'?s\s+(?:(?:a|an|the)\s+)?(?P<topic>.+?)[\s?.!]*$",
        r"(?i)^(?:why|when)\s+(?:is|are|do|does|did|should)\s+(?P<topic>.+?)[\s?.!]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid question regex"))
    .collect()
});

/// Health topics recognised by the keyword rule.
static KNOWN_TOPICS: &[&str] = &[
    "allergic reaction",
    "heart attack",
    "panic attack",
    "heat exhaustion",
    "heat stroke",
    "chest pain",
    "back pain",
    "sore throat",
    "bee sting",
    "insect bite",
    "nosebleed",
    "sunburn",
    "headache",
    "migraine",
    "burn",
    "cut",
    "wound",
    "bruise",
    "blister",
    "bleeding",
    "fever",
    "cough",
    "flu",
    "sprain",
    "fracture",
    "choking",
    "cpr",
    "allergy",
    "asthma",
    "stroke",
    "concussion",
    "poisoning",
    "hypothermia",
    "dehydration",
    "seizure",
    "nausea",
    "rash",
    "diarrhea",
    "anxiety",
    "stress",
    "insomnia",
    "workout",
    "exercise",
    "diet",
];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut topics: Vec<&str> = KNOWN_TOPICS.to_vec();
    // Longest first so multi-word topics win over their parts.
    topics.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = topics
        .iter()
        .map(|t| regex::escape(t).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)\b(?:([\w']+)\s+)?\b((?:{})(?:s|es|ed|ing)?)\b((?:\s+[\w']+){{0,2}})",
        alternation
    ))
    .expect("Invalid keyword regex")
});

static POSSESSIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(my|our|his|her|their|your)\s+([\w']+(?:\s+[\w']+)?)")
        .expect("Invalid possessive regex")
});

/// Words dropped from the edges of keyword windows and phrases.
static STOPWORDS: &[&str] = &[
    "a", "an", "the", "i", "i'm", "im", "me", "my", "to", "for", "of", "on", "in", "at", "with",
    "and", "or", "but", "is", "was", "are", "have", "has", "had", "got", "get", "some", "about",
    "it", "this", "that", "what", "how", "do", "does", "should", "can", "just", "so",
];

// =============================================================================
// Public API
// =============================================================================

/// Summarize a chat message into a title of at most [`MAX_TITLE_LEN`] characters.
pub fn summarize_title(input: &str) -> String {
    summarize_title_detailed(input).text
}

/// Like [`summarize_title`], also reporting which rule fired.
pub fn summarize_title_detailed(input: &str) -> Title {
    let text = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Title {
            text: EMPTY_TITLE.to_string(),
            rule: TitleRule::Empty,
        };
    }

    let (raw, rule) = question_topic(&text)
        .map(|t| (t, TitleRule::Question))
        .or_else(|| keyword_window(&text).map(|t| (t, TitleRule::Keyword)))
        .or_else(|| short_message(&text).map(|t| (t, TitleRule::Short)))
        .or_else(|| possessive_phrase(&text).map(|t| (t, TitleRule::Possessive)))
        .unwrap_or_else(|| (truncate(&text), TitleRule::Fallback));

    // Uppercasing can widen the first char (ß -> SS), so the cap is applied
    // again to the capitalized text.
    let text = truncate(&capitalize(&raw));
    trace!(rule = ?rule, "Title summarized");
    Title { text, rule }
}

// =============================================================================
// Rules
// =============================================================================

fn question_topic(text: &str) -> Option<String> {
    QUESTION_PATTERNS.iter().find_map(|re| {
        let topic = re.captures(text)?.name("topic")?.as_str();
        let topic = topic
            .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '?' | '.' | '!' | ','))
            .trim();
        fits(topic).then(|| topic.to_string())
    })
}

fn keyword_window(text: &str) -> Option<String> {
    let caps = KEYWORD_RE.captures(text)?;

    let mut words: Vec<&str> = Vec::new();
    if let Some(before) = caps.get(1) {
        words.push(before.as_str());
    }
    words.push(caps.get(2)?.as_str());
    if let Some(after) = caps.get(3) {
        words.extend(after.as_str().split_whitespace());
    }

    let start = words.iter().position(|w| !is_stopword(w))?;
    let end = words.iter().rposition(|w| !is_stopword(w))?;
    let phrase = words[start..=end].join(" ");
    fits(&phrase).then_some(phrase)
}

fn short_message(text: &str) -> Option<String> {
    (text.split_whitespace().count() <= 5 && fits(text)).then(|| text.to_string())
}

fn possessive_phrase(text: &str) -> Option<String> {
    let caps = POSSESSIVE_RE.captures(text)?;
    let owner = caps.get(1)?.as_str();
    let rest: Vec<&str> = caps.get(2)?.as_str().split_whitespace().collect();

    let end = rest.iter().rposition(|w| !is_stopword(w))?;
    let phrase = format!("{} {}", owner, rest[..=end].join(" "));
    fits(&phrase).then_some(phrase)
}

/// Cut at the last whitespace inside the budget, unless that would keep less
/// than half of it, in which case cut mid-word.
fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_TITLE_LEN {
        return text.to_string();
    }

    let budget = MAX_TITLE_LEN - ELLIPSIS.chars().count();
    let head: Vec<char> = text.chars().take(budget + 1).collect();
    let cut = head
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&i| i > budget / 2)
        .unwrap_or(budget);

    let body: String = head[..cut].iter().collect();
    format!("{}{}", body.trim_end(), ELLIPSIS)
}

// =============================================================================
// Helpers
// =============================================================================

fn fits(s: &str) -> bool {
    let len = s.chars().count();
    len > 0 && len <= MAX_TITLE_LEN
}

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}
