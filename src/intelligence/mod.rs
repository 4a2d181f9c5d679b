/// Intelligence module
///
/// Turns free-form chat text into a command: fuzzy matching against the
/// intent catalog, slot extraction, and the reply shown to the user.

pub mod analyzer;
pub mod catalog;
pub mod composer;
pub mod extractor;
pub mod matcher;
pub mod scorer;

pub use analyzer::{category_of, Analyzer};
pub use catalog::{Catalog, IntentEntry, COMMAND_DELIMITER};
pub use composer::{
    execute_action_id, Block, Composer, Element, Message, Response, ResponseKind, Text,
};
pub use extractor::{extract, Category, ExtractedParams, Slot};
pub use matcher::{
    normalize, ClassificationResult, MatchMethod, Matcher, Ranking, ScoredCandidate, Utterance,
};
pub use scorer::Scorer;
