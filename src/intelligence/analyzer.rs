/// Main analyzer orchestrator
///
/// Runs one utterance through the whole pipeline:
/// classify, pick the slot category, extract slots, compose a response.

use crate::config::Settings;
use crate::core::CommandKind;
use crate::intelligence::{
    extract, Catalog, Category, ClassificationResult, Composer, Matcher, MatchMethod, Response,
};
use rand::Rng;

/// Main analyzer
pub struct Analyzer<'c> {
    matcher: Matcher<'c>,
    composer: Composer<'c>,
}

impl Analyzer<'static> {
    /// Analyzer over the built-in catalog with default settings
    pub fn standard() -> Self {
        Self::new(Catalog::standard(), &Settings::default())
    }

    /// Analyzer over the built-in catalog with loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Catalog::standard(), settings)
    }
}

impl<'c> Analyzer<'c> {
    pub fn new(catalog: &'c Catalog, settings: &Settings) -> Self {
        Self {
            matcher: Matcher::new(catalog, settings.matching.clone()),
            composer: Composer::new(catalog, settings),
        }
    }

    pub fn matcher(&self) -> &Matcher<'c> {
        &self.matcher
    }

    pub fn composer(&self) -> &Composer<'c> {
        &self.composer
    }

    /// Classification only, no slots or message
    pub fn classify(&self, text: &str) -> ClassificationResult<'c> {
        self.matcher.classify(text)
    }

    /// Full pipeline with a thread-local random source for the fallback
    pub fn process(&self, text: &str) -> Response {
        self.process_with_rng(text, &mut rand::thread_rng())
    }

    /// Full pipeline with a caller-supplied random source
    pub fn process_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Response {
        let result = self.matcher.classify(text);

        // Literal commands run as typed, slots are only read from free text
        let params = match (result.method, result.matched) {
            (MatchMethod::Scored, Some(entry)) => {
                let category = entry.command_id.as_deref().and_then(category_of);
                extract(text, category)
            }
            _ => Default::default(),
        };

        let response = self.composer.compose(&result, params, rng);
        tracing::info!(
            kind = ?response.kind,
            command = ?response.command,
            confidence = response.confidence,
            "processed utterance"
        );
        response
    }
}

/// Slot category for a command id; unknown ids have none
pub fn category_of(command_id: &str) -> Option<Category> {
    CommandKind::from_id(command_id).and_then(|kind| kind.category())
}
