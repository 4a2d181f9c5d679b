/// Command dispatch
///
/// Maps each `CommandKind` to the handler that actually runs it. Handlers
/// live outside this crate (they talk to the coaching backend); this module
/// only decides whether and when they get called.

use crate::config::SessionSettings;
use crate::core::command::CommandKind;
use crate::core::store::{PendingAction, Store};
use crate::error::{IntentError, Result};
use crate::intelligence::{Block, ExtractedParams, MatchMethod, Message, Response, ResponseKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a handler needs to run one command
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub user_id: String,
    pub command: CommandKind,
    pub params: ExtractedParams,
    /// Backend token; `None` only for commands that don't need a login
    pub token: Option<String>,
}

/// What goes back to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub message: Message,
    /// Only visible to the requesting user
    pub ephemeral: bool,
}

impl Reply {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            message: Message::plain(text),
            ephemeral: true,
        }
    }
}

/// Runs one command against the outside world
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, request: &CommandRequest) -> anyhow::Result<Reply>;
}

/// Builder that refuses to finish until every command has a handler
pub struct DispatcherBuilder {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
    sessions: Arc<dyn Store<String>>,
    pending: Arc<dyn Store<PendingAction>>,
    token_ttl: chrono::Duration,
    pending_ttl: chrono::Duration,
}

impl DispatcherBuilder {
    pub fn handler(mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Register the same handler for every command not yet covered
    pub fn fallback_handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        for kind in CommandKind::ALL {
            self.handlers
                .entry(kind)
                .or_insert_with(|| Arc::clone(&handler));
        }
        self
    }

    pub fn session_settings(mut self, settings: &SessionSettings) -> Self {
        self.token_ttl = settings.token_ttl();
        self.pending_ttl = settings.pending_ttl();
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        if let Some(missing) = CommandKind::ALL
            .into_iter()
            .find(|kind| !self.handlers.contains_key(kind))
        {
            return Err(IntentError::MissingHandler(missing.id().to_string()));
        }

        Ok(Dispatcher {
            handlers: self.handlers,
            sessions: self.sessions,
            pending: self.pending,
            token_ttl: self.token_ttl,
            pending_ttl: self.pending_ttl,
        })
    }
}

/// Routes composed responses to command handlers
pub struct Dispatcher {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
    sessions: Arc<dyn Store<String>>,
    pending: Arc<dyn Store<PendingAction>>,
    token_ttl: chrono::Duration,
    pending_ttl: chrono::Duration,
}

impl Dispatcher {
    /// Start a dispatch table over the given session and pending-action stores
    pub fn builder(
        sessions: Arc<dyn Store<String>>,
        pending: Arc<dyn Store<PendingAction>>,
    ) -> DispatcherBuilder {
        let defaults = SessionSettings::default();
        DispatcherBuilder {
            handlers: HashMap::new(),
            sessions,
            pending,
            token_ttl: defaults.token_ttl(),
            pending_ttl: defaults.pending_ttl(),
        }
    }

    /// Act on a composed response for `user_id`
    ///
    /// Only direct matches run anything. Help and fallback answers go back as
    /// they are. A disambiguation gets a button for each of the two commands,
    /// and form-opening commands recognised in free text come back as a
    /// button to click.
    pub async fn route(&self, user_id: &str, response: &Response) -> Result<Reply> {
        let command = match (response.kind, response.command.as_deref()) {
            (ResponseKind::Direct, Some(command)) => command,
            (ResponseKind::Disambiguation, Some(command)) => {
                let kind: CommandKind = command.parse()?;
                return Ok(Self::choice_buttons(kind, response));
            }
            _ => {
                return Ok(Reply {
                    message: response.message.clone(),
                    ephemeral: true,
                })
            }
        };
        let kind: CommandKind = command.parse()?;

        if kind.opens_form() && response.method != MatchMethod::Exact {
            return Ok(Self::confirm_button(kind));
        }

        self.execute(user_id, kind, response.params.clone()).await
    }

    /// Run a command now, or park it until the user logs in
    pub async fn execute(
        &self,
        user_id: &str,
        kind: CommandKind,
        params: ExtractedParams,
    ) -> Result<Reply> {
        let token = self.sessions.get(user_id);

        if kind.requires_login() && token.is_none() {
            tracing::info!(user_id, command = %kind, "login required, parking command");
            self.pending.set(
                user_id,
                PendingAction::new(kind, params),
                Some(self.pending_ttl),
            );
            return Ok(Reply::ephemeral(
                "Please login first using the /login command",
            ));
        }

        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| IntentError::MissingHandler(kind.id().to_string()))?;

        let request = CommandRequest {
            user_id: user_id.to_string(),
            command: kind,
            params,
            token,
        };

        tracing::debug!(user_id, command = %kind, "dispatching");
        handler
            .handle(&request)
            .await
            .map_err(|source| IntentError::Handler {
                command: kind.id().to_string(),
                source,
            })
    }

    /// Store the user's token and run whatever was waiting on it
    pub async fn complete_login(&self, user_id: &str, token: String) -> Result<Option<Reply>> {
        self.sessions.set(user_id, token, Some(self.token_ttl));
        tracing::info!(user_id, "user logged in");

        match self.pending.delete(user_id) {
            Some(pending) => {
                let waited = (chrono::Utc::now() - pending.created_at).num_seconds();
                tracing::debug!(user_id, command = %pending.command, waited, "resuming parked command");
                self.execute(user_id, pending.command, pending.params)
                    .await
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Forget the user's token and anything parked for them
    pub fn logout(&self, user_id: &str) {
        self.sessions.delete(user_id);
        self.pending.delete(user_id);
        tracing::info!(user_id, "user logged out");
    }

    pub fn is_logged_in(&self, user_id: &str) -> bool {
        self.sessions.get(user_id).is_some()
    }

    /// Evict expired sessions and parked commands
    pub fn purge_expired(&self) -> usize {
        self.sessions.purge_expired() + self.pending.purge_expired()
    }

    // Primary command's button goes right under the line that names it
    fn choice_buttons(kind: CommandKind, response: &Response) -> Reply {
        let mut message = response.message.clone();
        let at = message.blocks.len().min(1);
        message.blocks.insert(
            at,
            Block::command_button(format!("Use {}", kind.id()), kind.id()),
        );

        Reply {
            message,
            ephemeral: false,
        }
    }

    fn confirm_button(kind: CommandKind) -> Reply {
        let bare = &kind.id()[1..];
        let text = format!(
            "I understood that you want to {}. Please click the button below:",
            bare
        );

        Reply {
            message: Message {
                blocks: vec![
                    Block::section(text.clone()),
                    Block::command_button(format!("{} now", bare), kind.id()),
                ],
                text,
            },
            ephemeral: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use crate::intelligence::{Analyzer, Element, Slot};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<CommandRequest>>,
    }

    #[async_trait]
    impl CommandHandler for RecordingHandler {
        async fn handle(&self, request: &CommandRequest) -> anyhow::Result<Reply> {
            self.calls.lock().unwrap().push(request.clone());
            Ok(Reply::ephemeral(format!("ran {}", request.command)))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl CommandHandler for FailingHandler {
        async fn handle(&self, _request: &CommandRequest) -> anyhow::Result<Reply> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn setup() -> (Dispatcher, Arc<RecordingHandler>) {
        let recorder = Arc::new(RecordingHandler::default());
        let dispatcher = Dispatcher::builder(
            Arc::new(MemoryStore::<String>::new()),
            Arc::new(MemoryStore::<PendingAction>::new()),
        )
        .fallback_handler(recorder.clone())
        .build()
        .unwrap();
        (dispatcher, recorder)
    }

    #[test]
    fn test_build_requires_every_handler() {
        let result = Dispatcher::builder(
            Arc::new(MemoryStore::<String>::new()),
            Arc::new(MemoryStore::<PendingAction>::new()),
        )
        .handler(CommandKind::Coach, Arc::new(RecordingHandler::default()))
        .build();
        assert!(matches!(result, Err(IntentError::MissingHandler(_))));
    }

    #[tokio::test]
    async fn test_login_gate_parks_and_resumes() {
        let (dispatcher, recorder) = setup();
        let response = Analyzer::standard().process("show my goals");

        let reply = dispatcher.route("U1", &response).await.unwrap();
        assert!(reply.message.text.contains("/login"));
        assert!(recorder.calls.lock().unwrap().is_empty());

        let resumed = dispatcher
            .complete_login("U1", "token-abc".to_string())
            .await
            .unwrap()
            .expect("parked command should run");
        assert_eq!(resumed.message.text, "ran /listgoals");

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, CommandKind::ListGoals);
        assert_eq!(calls[0].token.as_deref(), Some("token-abc"));
    }

    #[tokio::test]
    async fn test_logged_in_user_runs_directly() {
        let (dispatcher, recorder) = setup();
        dispatcher.complete_login("U1", "t".to_string()).await.unwrap();

        let response = Analyzer::standard().process("/listactions");
        let reply = dispatcher.route("U1", &response).await.unwrap();
        assert_eq!(reply.message.text, "ran /listactions");
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_free_text_form_command_becomes_button() {
        let (dispatcher, recorder) = setup();
        dispatcher.complete_login("U1", "t".to_string()).await.unwrap();

        let response = Analyzer::standard().process("create a new goal");
        assert_eq!(response.command.as_deref(), Some("/addgoal"));

        let reply = dispatcher.route("U1", &response).await.unwrap();
        assert!(reply.message.text.contains("addgoal"));
        assert!(matches!(reply.message.blocks[1], Block::Actions { .. }));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_needs_no_token() {
        let (dispatcher, recorder) = setup();
        let response = Analyzer::standard().process("/login");

        dispatcher.route("U1", &response).await.unwrap();
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].command, CommandKind::Login);
        assert!(calls[0].token.is_none());
    }

    #[tokio::test]
    async fn test_disambiguation_offers_both_commands() {
        let (dispatcher, recorder) = setup();
        dispatcher.complete_login("U1", "t".to_string()).await.unwrap();

        let response = Analyzer::standard().process("add stuff");
        assert_eq!(response.kind, ResponseKind::Disambiguation);
        let primary = response.command.clone().unwrap();
        let alternative = response.alternative.clone().unwrap();

        let reply = dispatcher.route("U1", &response).await.unwrap();
        let buttons: Vec<&str> = reply
            .message
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Actions { elements } => Some(elements),
                _ => None,
            })
            .flatten()
            .map(|Element::Button { value, .. }| value.as_str())
            .collect();

        assert_eq!(buttons, vec![primary.as_str(), alternative.as_str()]);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parked_command_expires() {
        let settings = SessionSettings {
            pending_ttl_minutes: 0,
            ..SessionSettings::default()
        };
        let (dispatcher, recorder) = {
            let recorder = Arc::new(RecordingHandler::default());
            let dispatcher = Dispatcher::builder(
                Arc::new(MemoryStore::<String>::new()),
                Arc::new(MemoryStore::<PendingAction>::new()),
            )
            .session_settings(&settings)
            .fallback_handler(recorder.clone())
            .build()
            .unwrap();
            (dispatcher, recorder)
        };

        for user in ["U1", "U2", "U3"] {
            dispatcher
                .execute(user, CommandKind::ListGoals, ExtractedParams::default())
                .await
                .unwrap();
        }
        assert_eq!(dispatcher.purge_expired(), 3);

        let resumed = dispatcher.complete_login("U1", "t".to_string()).await.unwrap();
        assert!(resumed.is_none());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_help_is_returned_not_executed() {
        let (dispatcher, recorder) = setup();
        let response = Analyzer::standard().process("help");

        let reply = dispatcher.route("U1", &response).await.unwrap();
        assert_eq!(reply.message, response.message);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_params_reach_the_handler() {
        let (dispatcher, recorder) = setup();
        dispatcher.complete_login("U1", "t".to_string()).await.unwrap();

        let mut params = ExtractedParams::default();
        params.insert(Slot::EntityName, "John");
        dispatcher
            .execute("U1", CommandKind::AddSession, params)
            .await
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].params.get(Slot::EntityName), Some("John"));
    }

    #[tokio::test]
    async fn test_handler_failure_is_wrapped() {
        let dispatcher = Dispatcher::builder(
            Arc::new(MemoryStore::<String>::new()),
            Arc::new(MemoryStore::<PendingAction>::new()),
        )
        .fallback_handler(Arc::new(FailingHandler))
        .build()
        .unwrap();

        let err = dispatcher
            .execute("U1", CommandKind::Login, ExtractedParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IntentError::Handler { ref command, .. } if command == "/login"));
    }

    #[tokio::test]
    async fn test_logout_forgets_token() {
        let (dispatcher, _) = setup();
        dispatcher.complete_login("U1", "t".to_string()).await.unwrap();
        assert!(dispatcher.is_logged_in("U1"));

        dispatcher.logout("U1");
        assert!(!dispatcher.is_logged_in("U1"));
    }
}
