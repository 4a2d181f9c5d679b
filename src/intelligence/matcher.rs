// Figures out which command someone meant
//
// Order matters: a literal "/command" always wins, then anything that looks
// like a help request, and only then do we score every phrase in the catalog.

use crate::config::MatchSettings;
use crate::intelligence::catalog::{Catalog, IntentEntry, COMMAND_DELIMITER};
use crate::intelligence::scorer::Scorer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lower-case, trim and collapse runs of whitespace
///
/// Idempotent: normalizing a normalized string changes nothing.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw input together with its normalized form
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub raw: String,
    pub normalized: String,
}

impl Utterance {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        }
    }

    /// Leading token without the command delimiter, if the input starts with one
    pub fn command_token(&self) -> Option<&str> {
        self.normalized
            .strip_prefix(COMMAND_DELIMITER)
            .and_then(|rest| rest.split(' ').next())
    }
}

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Nothing to classify
    Empty,
    /// Literal slash command
    Exact,
    /// Routed to the help intent before scoring
    Help,
    /// Best phrase similarity across the catalog
    Scored,
}

/// One intent with the score it earned
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoredCandidate<'a> {
    pub entry: &'a IntentEntry,
    pub score: f64,
}

/// Outcome of classifying one utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult<'a> {
    #[serde(rename = "match")]
    pub matched: Option<&'a IntentEntry>,
    pub confidence: f64,
    pub alternative: Option<&'a IntentEntry>,
    pub alternative_confidence: f64,
    pub method: MatchMethod,
}

impl<'a> ClassificationResult<'a> {
    fn empty() -> Self {
        Self {
            matched: None,
            confidence: 0.0,
            alternative: None,
            alternative_confidence: 0.0,
            method: MatchMethod::Empty,
        }
    }

    fn certain(entry: &'a IntentEntry, confidence: f64, method: MatchMethod) -> Self {
        Self {
            matched: Some(entry),
            confidence,
            alternative: None,
            alternative_confidence: 0.0,
            method,
        }
    }

    /// Command id of the match, if it has one
    pub fn command_id(&self) -> Option<&'a str> {
        self.matched.and_then(|e| e.command_id.as_deref())
    }
}

/// Best and second-best intents from a full scoring pass
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranking<'a> {
    pub best: Option<ScoredCandidate<'a>>,
    pub second: Option<ScoredCandidate<'a>>,
}

/// Ranks catalog intents against utterances
pub struct Matcher<'c> {
    catalog: &'c Catalog,
    settings: MatchSettings,
}

impl Matcher<'static> {
    /// Matcher over the built-in catalog with default settings
    pub fn standard() -> Self {
        Matcher::new(Catalog::standard(), MatchSettings::default())
    }
}

impl<'c> Matcher<'c> {
    pub fn new(catalog: &'c Catalog, settings: MatchSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Classify one utterance. Never fails.
    pub fn classify(&self, raw: &str) -> ClassificationResult<'c> {
        let utterance = Utterance::new(raw);

        if utterance.normalized.is_empty() {
            return ClassificationResult::empty();
        }

        if let Some(entry) = self.exact_command(&utterance) {
            tracing::debug!(command = ?entry.command_id, "exact command");
            return ClassificationResult::certain(entry, 1.0, MatchMethod::Exact);
        }

        if let Some(help) = self.help_request(&utterance.normalized) {
            tracing::debug!(score = help.score, "help request");
            return ClassificationResult::certain(help.entry, help.score, MatchMethod::Help);
        }

        let ranking = self.rank(&utterance.normalized);
        let (matched, confidence) = match ranking.best {
            Some(best) if self.accepts(best.score) => (Some(best.entry), best.score),
            Some(best) => (None, best.score),
            None => (None, 0.0),
        };
        let (alternative, alternative_confidence) = ranking
            .second
            .map(|c| (Some(c.entry), c.score))
            .unwrap_or((None, 0.0));

        tracing::debug!(
            best = ?ranking.best.map(|c| &c.entry.name),
            confidence,
            alternative = ?alternative.map(|e| &e.name),
            alternative_confidence,
            accepted = matched.is_some(),
            "scored utterance"
        );

        ClassificationResult {
            matched,
            confidence,
            alternative,
            alternative_confidence,
            method: MatchMethod::Scored,
        }
    }

    /// Is this score good enough to act on?
    pub fn accepts(&self, score: f64) -> bool {
        score > self.settings.acceptance_threshold
    }

    fn exact_command(&self, utterance: &Utterance) -> Option<&'c IntentEntry> {
        let token = utterance.command_token()?;
        self.catalog.find_command(token)
    }

    /// Help wins if the input contains a help phrase or is very close to one
    fn help_request(&self, normalized: &str) -> Option<ScoredCandidate<'c>> {
        let help = self.catalog.help_entry()?;
        let mut best = 0.0_f64;

        for phrase in &help.phrases {
            if normalized.contains(phrase.as_str()) {
                return Some(ScoredCandidate {
                    entry: help,
                    score: 1.0,
                });
            }
            best = best.max(Scorer::similarity(normalized, phrase));
        }

        (best > self.settings.help_threshold).then_some(ScoredCandidate {
            entry: help,
            score: best,
        })
    }

    /// Score every (intent, phrase) pair and keep the top two distinct intents
    ///
    /// Only a strictly higher score replaces a slot, so ties go to whatever
    /// came first in catalog order.
    pub fn rank(&self, normalized: &str) -> Ranking<'c> {
        let input_words: HashSet<&str> = normalized.split_whitespace().collect();
        let mut ranking = Ranking::default();

        for entry in self.catalog.lookup() {
            for phrase in &entry.phrases {
                let score = self.boosted_score(normalized, &input_words, phrase);
                let candidate = ScoredCandidate { entry, score };

                match ranking.best {
                    Some(best) if score <= best.score => {
                        let distinct = !std::ptr::eq(best.entry, entry);
                        let beats_second = ranking.second.map_or(score > 0.0, |s| score > s.score);
                        if distinct && beats_second {
                            ranking.second = Some(candidate);
                        }
                    }
                    Some(best) => {
                        if !std::ptr::eq(best.entry, entry) {
                            ranking.second = Some(best);
                        }
                        ranking.best = Some(candidate);
                    }
                    None if score > 0.0 => ranking.best = Some(candidate),
                    None => {}
                }
            }
        }

        ranking
    }

    fn boosted_score(&self, input: &str, input_words: &HashSet<&str>, phrase: &str) -> f64 {
        let score = Scorer::similarity(input, phrase);
        let keyword_hit = phrase.split_whitespace().any(|word| {
            word.chars().count() > self.settings.keyword_min_len && input_words.contains(word)
        });

        if keyword_hit {
            score * self.settings.keyword_boost
        } else {
            score
        }
    }
}
