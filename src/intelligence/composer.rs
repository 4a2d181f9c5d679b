/// Response composer
///
/// Turns a classification into what the chat layer shows: run a command,
/// ask which of two commands was meant, list everything, or admit defeat
/// and suggest a few commands.

use crate::config::{MatchSettings, Settings};
use crate::intelligence::catalog::{Catalog, IntentEntry};
use crate::intelligence::extractor::ExtractedParams;
use crate::intelligence::matcher::{ClassificationResult, MatchMethod};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What kind of answer this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Direct,
    Disambiguation,
    Help,
    Fallback,
}

/// Text object inside a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: true,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Text::PlainText { text, .. } | Text::Mrkdwn { text } => text,
        }
    }
}

/// Interactive element inside an actions block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button {
        text: Text,
        value: String,
        action_id: String,
    },
}

/// One layout block of a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: Text },
    Section { text: Text },
    Actions { elements: Vec<Element> },
}

impl Block {
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: Text::markdown(text),
        }
    }

    /// Button that runs `command` when clicked
    pub fn command_button(label: impl Into<String>, command: &str) -> Self {
        Block::Actions {
            elements: vec![Element::Button {
                text: Text::plain(label),
                value: command.to_string(),
                action_id: execute_action_id(command),
            }],
        }
    }
}

/// Action id the chat layer routes back to a command
pub fn execute_action_id(command: &str) -> String {
    format!("execute_command_{}", command.trim_start_matches('/'))
}

/// Presentation payload: fallback text plus rich blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub blocks: Vec<Block>,
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            blocks: vec![Block::section(text.clone())],
            text,
        }
    }
}

/// Structured result handed to the chat layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub kind: ResponseKind,
    /// How the underlying classification was reached
    pub method: MatchMethod,
    pub command: Option<String>,
    pub alternative: Option<String>,
    pub confidence: f64,
    pub params: ExtractedParams,
    pub message: Message,
    /// Commands offered to the user (help listing or fallback sample)
    pub suggestions: Vec<String>,
}

/// Builds responses for one catalog
pub struct Composer<'c> {
    catalog: &'c Catalog,
    matching: MatchSettings,
    fallback_size: usize,
}

impl<'c> Composer<'c> {
    pub fn new(catalog: &'c Catalog, settings: &Settings) -> Self {
        Self {
            catalog,
            matching: settings.matching.clone(),
            fallback_size: settings.responses.fallback_suggestions,
        }
    }

    /// Pick the response shape for a classification
    ///
    /// `rng` is only consulted on the fallback path.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        result: &ClassificationResult<'_>,
        params: ExtractedParams,
        rng: &mut R,
    ) -> Response {
        let Some(entry) = result.matched else {
            tracing::info!(confidence = result.confidence, "no confident match, falling back");
            let mut response = self.fallback(result.confidence, rng);
            response.method = result.method;
            return response;
        };

        let Some(command) = entry.command_id.as_deref() else {
            return self.help();
        };

        if result.method == MatchMethod::Exact {
            return Response {
                kind: ResponseKind::Direct,
                method: MatchMethod::Exact,
                command: Some(command.to_string()),
                alternative: None,
                confidence: result.confidence,
                params: ExtractedParams::default(),
                message: Message::plain(format!("Executing {}...", command)),
                suggestions: Vec::new(),
            };
        }

        match self.qualifying_alternative(result) {
            Some(alternative) => self.disambiguation(command, alternative, result.confidence, params),
            None => self.direct(command, result.confidence, params),
        }
    }

    /// Is this a borderline match with a believable runner-up?
    pub fn is_uncertain(&self, result: &ClassificationResult<'_>) -> bool {
        self.qualifying_alternative(result).is_some()
    }

    fn qualifying_alternative<'r>(&self, result: &ClassificationResult<'r>) -> Option<&'r IntentEntry> {
        let borderline = result.matched.is_some()
            && result.confidence > self.matching.acceptance_threshold
            && result.confidence < self.matching.certain_threshold;
        if !borderline || result.alternative_confidence <= self.matching.alternative_threshold {
            return None;
        }

        // Only a command can be offered as a button
        result.alternative.filter(|alt| !alt.is_help())
    }

    fn direct(&self, command: &str, confidence: f64, params: ExtractedParams) -> Response {
        Response {
            kind: ResponseKind::Direct,
            method: MatchMethod::Scored,
            command: Some(command.to_string()),
            alternative: None,
            confidence,
            params,
            message: Message {
                text: format!("I'll help you with that using the {} command.", command),
                blocks: vec![Block::section(format!(
                    "I'll help you with that using the *{}* command.",
                    command
                ))],
            },
            suggestions: Vec::new(),
        }
    }

    fn disambiguation(
        &self,
        command: &str,
        alternative: &IntentEntry,
        confidence: f64,
        params: ExtractedParams,
    ) -> Response {
        let alt_command = alternative.command_id.clone().unwrap_or_default();

        Response {
            kind: ResponseKind::Disambiguation,
            method: MatchMethod::Scored,
            command: Some(command.to_string()),
            alternative: Some(alt_command.clone()),
            confidence,
            params,
            message: Message {
                text: format!("I'll help you with that using the {} command.", command),
                blocks: vec![
                    Block::section(format!(
                        "I'll help you with that using the *{}* command.",
                        command
                    )),
                    Block::section(format!(
                        "Did you actually want to {} using *{}* instead?",
                        alternative.description.to_lowercase(),
                        alt_command
                    )),
                    Block::command_button(format!("Use {}", alt_command), &alt_command),
                ],
            },
            suggestions: vec![alt_command],
        }
    }

    /// Every command with its description
    pub fn help(&self) -> Response {
        let commands: Vec<&IntentEntry> = self.catalog.commands().collect();
        let listing = commands
            .iter()
            .map(|e| format!("• {} — {}", e.command_id.as_deref().unwrap_or_default(), e.description))
            .collect::<Vec<_>>()
            .join("\n");

        Response {
            kind: ResponseKind::Help,
            method: MatchMethod::Help,
            command: None,
            alternative: None,
            confidence: 1.0,
            params: ExtractedParams::default(),
            message: Message {
                text: "Available Commands:".to_string(),
                blocks: vec![
                    Block::Header {
                        text: Text::plain("📝 Available Commands"),
                    },
                    Block::section(format!(
                        "Here are all the commands you can use:\n\n{}",
                        listing
                    )),
                    Block::section(
                        "You can use these commands directly or describe what you want to do in natural language!",
                    ),
                ],
            },
            suggestions: commands
                .iter()
                .filter_map(|e| e.command_id.clone())
                .collect(),
        }
    }

    /// A few randomly chosen commands plus a pointer to help
    pub fn fallback<R: Rng + ?Sized>(&self, confidence: f64, rng: &mut R) -> Response {
        let mut pool: Vec<&IntentEntry> = self.catalog.commands().collect();
        pool.shuffle(rng);
        pool.truncate(self.fallback_size);

        let listing = pool
            .iter()
            .map(|e| format!("• *{}* - {}", e.command_id.as_deref().unwrap_or_default(), e.description))
            .collect::<Vec<_>>()
            .join("\n");
        let intro = "I'm not sure what you want to do. Here are some commands you might be interested in:";

        Response {
            kind: ResponseKind::Fallback,
            method: MatchMethod::Scored,
            command: None,
            alternative: None,
            confidence,
            params: ExtractedParams::default(),
            message: Message {
                text: intro.to_string(),
                blocks: vec![
                    Block::section(intro),
                    Block::section(listing),
                    Block::section("Or type 'help' to see all available commands."),
                ],
            },
            suggestions: pool.iter().filter_map(|e| e.command_id.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::extractor::Slot;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn composer() -> Composer<'static> {
        Composer::new(Catalog::standard(), &Settings::default())
    }

    fn scored<'a>(
        matched: Option<&'a IntentEntry>,
        confidence: f64,
        alternative: Option<&'a IntentEntry>,
        alternative_confidence: f64,
    ) -> ClassificationResult<'a> {
        ClassificationResult {
            matched,
            confidence,
            alternative,
            alternative_confidence,
            method: MatchMethod::Scored,
        }
    }

    fn entry(id: &str) -> &'static IntentEntry {
        Catalog::standard().find_command(id).unwrap()
    }

    #[test]
    fn test_confident_match_is_direct() {
        let mut params = ExtractedParams::default();
        params.insert(Slot::Date, "5/1/2024");
        let result = scored(Some(entry("/addsession")), 0.9, Some(entry("/listsessions")), 0.5);

        let response = composer().compose(&result, params, &mut StepRng::new(0, 0));
        assert_eq!(response.kind, ResponseKind::Direct);
        assert_eq!(response.command.as_deref(), Some("/addsession"));
        assert_eq!(response.params.get(Slot::Date), Some("5/1/2024"));
    }

    #[test]
    fn test_borderline_with_alternative_disambiguates() {
        let result = scored(Some(entry("/addgoal")), 0.3, Some(entry("/addaction")), 0.28);

        let response = composer().compose(&result, ExtractedParams::default(), &mut StepRng::new(0, 0));
        assert_eq!(response.kind, ResponseKind::Disambiguation);
        assert_eq!(response.command.as_deref(), Some("/addgoal"));
        assert_eq!(response.alternative.as_deref(), Some("/addaction"));

        let has_button = response.message.blocks.iter().any(|b| {
            matches!(b, Block::Actions { elements } if elements.iter().any(|Element::Button { action_id, .. }| action_id == "execute_command_addaction"))
        });
        assert!(has_button);
    }

    #[test]
    fn test_borderline_with_weak_alternative_is_direct() {
        let result = scored(Some(entry("/addgoal")), 0.3, Some(entry("/addaction")), 0.2);
        let response = composer().compose(&result, ExtractedParams::default(), &mut StepRng::new(0, 0));
        assert_eq!(response.kind, ResponseKind::Direct);
    }

    #[test]
    fn test_help_alternative_is_not_offered() {
        let help = Catalog::standard().help_entry().unwrap();
        let result = scored(Some(entry("/addgoal")), 0.3, Some(help), 0.29);
        assert!(!composer().is_uncertain(&result));
    }

    #[test]
    fn test_exact_command_has_no_params() {
        let result = ClassificationResult {
            matched: Some(entry("/addgoal")),
            confidence: 1.0,
            alternative: None,
            alternative_confidence: 0.0,
            method: MatchMethod::Exact,
        };
        let mut params = ExtractedParams::default();
        params.insert(Slot::Title, "ignored");

        let response = composer().compose(&result, params, &mut StepRng::new(0, 0));
        assert_eq!(response.message.text, "Executing /addgoal...");
        assert!(response.params.is_empty());
    }

    #[test]
    fn test_help_lists_every_command() {
        let response = composer().help();
        assert_eq!(response.kind, ResponseKind::Help);
        assert!(response.command.is_none());
        assert_eq!(response.suggestions.len(), 9);

        let listing = response.message.blocks[1].clone();
        let Block::Section { text } = listing else {
            panic!("expected a section");
        };
        for entry in Catalog::standard().commands() {
            let line = format!("{} — {}", entry.command_id.as_deref().unwrap(), entry.description);
            assert!(text.as_str().contains(&line));
        }
    }

    #[test]
    fn test_fallback_samples_three_distinct_commands() {
        let response = composer().fallback(0.1, &mut StdRng::seed_from_u64(7));
        assert_eq!(response.kind, ResponseKind::Fallback);
        assert_eq!(response.suggestions.len(), 3);

        let mut unique = response.suggestions.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_fallback_is_reproducible_with_a_seed() {
        let a = composer().fallback(0.1, &mut StdRng::seed_from_u64(42));
        let b = composer().fallback(0.1, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_with_constant_rng() {
        // A zero generator makes every swap target index 0, rotating the
        // list left by one.
        let response = composer().fallback(0.0, &mut StepRng::new(0, 0));
        assert_eq!(
            response.suggestions,
            vec!["/addgoal", "/addsession", "/listsessions"]
        );
    }

    #[test]
    fn test_response_serializes_blocks() {
        let response = composer().help();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "help");
        assert_eq!(json["message"]["blocks"][0]["type"], "header");
        assert_eq!(json["message"]["blocks"][0]["text"]["type"], "plain_text");
    }
}
