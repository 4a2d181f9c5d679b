//! Slot extraction.
//!
//! Pulls a coach name, date, time, duration and title out of the raw
//! utterance. Every rule is best-effort: a rule that does not match just
//! leaves its slot out.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// Which family of commands a match belongs to; selects the title rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Goal,
    Action,
    Session,
}

impl Category {
    /// The literal word the title rule anchors on.
    pub fn keyword(&self) -> &'static str {
        match self {
            Category::Goal => "goal",
            Category::Action => "action",
            Category::Session => "session",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "goal" => Some(Category::Goal),
            "action" => Some(Category::Action),
            "session" => Some(Category::Session),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Named slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "entityName")]
    EntityName,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "duration")]
    Duration,
    #[serde(rename = "title")]
    Title,
}

/// Sparse slot map. A missing key means the slot was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedParams(BTreeMap<Slot, String>);

impl ExtractedParams {
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    pub fn insert(&mut self, slot: Slot, value: impl Into<String>) {
        self.0.insert(slot, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.0.iter().map(|(slot, value)| (*slot, value.as_str()))
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Extract every slot that can be found in `text`.
///
/// `category` enables the title rule for that command family.
pub fn extract(text: &str, category: Option<Category>) -> ExtractedParams {
    let mut params = ExtractedParams::default();

    if let Some(name) = first_capture(text, &[&*ENTITY_PATTERN]) {
        params.insert(Slot::EntityName, name);
    }

    if let Some(date) = first_capture(text, &*DATE_PATTERNS) {
        params.insert(Slot::Date, date);
    }

    if let Some(time) = first_capture(text, &[&*TIME_PATTERN]) {
        params.insert(Slot::Time, time);
    }

    if let Some(duration) = first_capture(text, &[&*DURATION_PATTERN]) {
        params.insert(Slot::Duration, duration);
    }

    if let Some(category) = category {
        let pattern = match category {
            Category::Goal => &*GOAL_TITLE_PATTERN,
            Category::Action => &*ACTION_TITLE_PATTERN,
            Category::Session => &*SESSION_TITLE_PATTERN,
        };
        if let Some(title) = first_capture(text, &[pattern]) {
            params.insert(Slot::Title, title);
        }
    }

    tracing::trace!(slots = params.len(), ?category, "extracted params");
    params
}

/// Try patterns in order; the first one that matches decides the slot.
fn first_capture(text: &str, patterns: &[&Regex]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

// ============================================================================
// Regex Patterns (using LazyLock for static initialization)
// ============================================================================

// "with Coach Sarah Lee", "for John"
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:with|for|and)\s+(?:(?i:coach)\s+)?(\p{Lu}\p{L}*(?:\s+\p{Lu}\p{L}*)?)")
        .expect("Invalid regex")
});

// Numeric month-first, numeric year-first, then "March 5th, 2025"
static DATE_PATTERNS: LazyLock<[&'static Regex; 3]> =
    LazyLock::new(|| [&*MONTH_FIRST_DATE, &*YEAR_FIRST_DATE, &*NAMED_MONTH_DATE]);

static MONTH_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:on|for|at)\s+(\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4})\b").expect("Invalid regex")
});
static YEAR_FIRST_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:on|for|at)\s+(\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2})\b").expect("Invalid regex")
});
static NAMED_MONTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:on|for|at)\s+((?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?)\b",
    )
    .expect("Invalid regex")
});

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:at|from)\s+(\d{1,2}(?::\d{2})?\s*(?:am|pm)?)\b").expect("Invalid regex")
});

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:for|duration|lasting)\s+(\d+)\s*(?:min|mins|minutes|hr|hrs|hours?)?\b")
        .expect("Invalid regex")
});

static GOAL_TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| title_pattern("goal"));
static ACTION_TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| title_pattern("action"));
static SESSION_TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| title_pattern("session"));

fn title_pattern(keyword: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)\b{keyword}\b(?:\s+(?:called|named|titled|about|for))?\s+["']?([^"']+)["']?"#
    ))
    .expect("Invalid regex")
}
