/// Command taxonomy
///
/// The closed set of slash commands the assistant can run, with the
/// per-command facts the chat layer needs.

use crate::error::{IntentError, Result};
use crate::intelligence::Category;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Every command the assistant knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Coach,
    AddGoal,
    AddSession,
    ListSessions,
    ListGoals,
    Login,
    SearchCoach,
    AddAction,
    ListActions,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Coach,
        CommandKind::AddGoal,
        CommandKind::AddSession,
        CommandKind::ListSessions,
        CommandKind::ListGoals,
        CommandKind::Login,
        CommandKind::SearchCoach,
        CommandKind::AddAction,
        CommandKind::ListActions,
    ];

    /// Slash command id, e.g. `/addgoal`
    pub fn id(&self) -> &'static str {
        match self {
            CommandKind::Coach => "/coach",
            CommandKind::AddGoal => "/addgoal",
            CommandKind::AddSession => "/addsession",
            CommandKind::ListSessions => "/listsessions",
            CommandKind::ListGoals => "/listgoals",
            CommandKind::Login => "/login",
            CommandKind::SearchCoach => "/searchcoach",
            CommandKind::AddAction => "/addaction",
            CommandKind::ListActions => "/listactions",
        }
    }

    /// Parse a command id, with or without the leading slash
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        let bare = id.strip_prefix('/').unwrap_or(id);
        Self::ALL
            .into_iter()
            .find(|kind| kind.id()[1..].eq_ignore_ascii_case(bare))
    }

    /// Which slot family the command's parameters belong to
    pub fn category(&self) -> Option<Category> {
        match self {
            CommandKind::AddGoal | CommandKind::ListGoals => Some(Category::Goal),
            CommandKind::AddAction | CommandKind::ListActions => Some(Category::Action),
            CommandKind::AddSession | CommandKind::ListSessions => Some(Category::Session),
            CommandKind::Coach | CommandKind::Login | CommandKind::SearchCoach => None,
        }
    }

    /// Everything except logging in needs a backend token
    pub fn requires_login(&self) -> bool {
        !matches!(self, CommandKind::Login)
    }

    /// Commands that open a form rather than answering inline.
    ///
    /// From free text these are offered as a button, since a form can only
    /// be opened from an explicit click.
    pub fn opens_form(&self) -> bool {
        match self {
            CommandKind::Login
            | CommandKind::AddGoal
            | CommandKind::AddSession
            | CommandKind::SearchCoach
            | CommandKind::AddAction => true,
            CommandKind::Coach
            | CommandKind::ListSessions
            | CommandKind::ListGoals
            | CommandKind::ListActions => false,
        }
    }
}

impl FromStr for CommandKind {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s).ok_or_else(|| IntentError::UnknownCommand(s.to_string()))
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::Catalog;

    #[test]
    fn test_round_trip_ids() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(CommandKind::from_id("addgoal"), Some(CommandKind::AddGoal));
        assert_eq!(CommandKind::from_id("/ListGoals"), Some(CommandKind::ListGoals));
    }

    #[test]
    fn test_unknown_id() {
        assert!(CommandKind::from_id("/dance").is_none());
        assert!(CommandKind::from_id("//login").is_none());
        assert!(matches!(
            "/dance".parse::<CommandKind>(),
            Err(IntentError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_taxonomy_matches_standard_catalog() {
        let catalog = Catalog::standard();
        let ids: Vec<&str> = catalog
            .commands()
            .filter_map(|e| e.command_id.as_deref())
            .collect();
        let kinds: Vec<&str> = CommandKind::ALL.iter().map(|k| k.id()).collect();
        assert_eq!(ids, kinds);
    }

    #[test]
    fn test_categories() {
        assert_eq!(CommandKind::AddGoal.category(), Some(Category::Goal));
        assert_eq!(CommandKind::ListActions.category(), Some(Category::Action));
        assert_eq!(CommandKind::ListSessions.category(), Some(Category::Session));
        assert_eq!(CommandKind::Coach.category(), None);
    }

    #[test]
    fn test_login_is_the_only_open_command() {
        let open: Vec<_> = CommandKind::ALL
            .into_iter()
            .filter(|k| !k.requires_login())
            .collect();
        assert_eq!(open, vec![CommandKind::Login]);
    }
}
