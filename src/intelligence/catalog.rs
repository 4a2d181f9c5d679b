/// Pattern catalog
///
/// The fixed set of intents the assistant understands. Each intent has a
/// slash command (the help intent has none), example phrases and a
/// description shown in help listings.

use crate::error::{IntentError, Result};
use crate::intelligence::matcher::normalize;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Every command id starts with this
pub const COMMAND_DELIMITER: char = '/';

/// One intent in the catalog
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IntentEntry {
    pub name: String,
    pub command_id: Option<String>,
    pub phrases: Vec<String>,
    pub description: String,
}

impl IntentEntry {
    pub fn new(name: &str, command_id: Option<&str>, phrases: &[&str], description: &str) -> Self {
        Self {
            name: name.to_string(),
            command_id: command_id.map(str::to_string),
            phrases: phrases.iter().map(|p| normalize(p)).collect(),
            description: description.to_string(),
        }
    }

    /// Command id without the leading delimiter
    pub fn bare_command(&self) -> Option<&str> {
        self.command_id
            .as_deref()
            .map(|id| id.trim_start_matches(COMMAND_DELIMITER))
    }

    pub fn is_help(&self) -> bool {
        self.command_id.is_none()
    }
}

/// Immutable, ordered registry of intents
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<IntentEntry>,
}

static STANDARD: LazyLock<Catalog> = LazyLock::new(|| Catalog {
    entries: standard_entries(),
});

impl Catalog {
    /// Build a catalog, checking that command ids are unique and delimited
    pub fn new(entries: Vec<IntentEntry>) -> Result<Self> {
        let mut seen = HashSet::new();

        for entry in &entries {
            if let Some(id) = &entry.command_id {
                if !id.starts_with(COMMAND_DELIMITER) || id.len() == 1 {
                    return Err(IntentError::InvalidCatalog(format!(
                        "command id '{}' of {} must start with '{}'",
                        id, entry.name, COMMAND_DELIMITER
                    )));
                }
                if !seen.insert(id.to_lowercase()) {
                    return Err(IntentError::InvalidCatalog(format!(
                        "duplicate command id {}",
                        id
                    )));
                }
            }
        }

        Ok(Self { entries })
    }

    /// The built-in coaching catalog, shared by every caller
    pub fn standard() -> &'static Catalog {
        &STANDARD
    }

    /// The full catalog, in declaration order
    pub fn lookup(&self) -> &[IntentEntry] {
        &self.entries
    }

    /// The catch-all help intent, if the catalog has one
    pub fn help_entry(&self) -> Option<&IntentEntry> {
        self.entries.iter().find(|e| e.is_help())
    }

    /// Intents that map to a slash command
    pub fn commands(&self) -> impl Iterator<Item = &IntentEntry> {
        self.entries.iter().filter(|e| !e.is_help())
    }

    /// Find an intent by command id, with or without the delimiter
    pub fn find_command(&self, id: &str) -> Option<&IntentEntry> {
        let bare = id.strip_prefix(COMMAND_DELIMITER).unwrap_or(id);
        self.entries
            .iter()
            .find(|e| e.bare_command().is_some_and(|c| c.eq_ignore_ascii_case(bare)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn standard_entries() -> Vec<IntentEntry> {
    vec![
        IntentEntry::new(
            "COACH",
            Some("/coach"),
            &[
                "my coaches", "show coaches", "list coaches", "view coaches", "connected coaches",
                "display coaches", "get coaches", "see coaches", "coach list", "coaching team",
                "mentors", "my mentors", "show mentors", "who are my coaches", "available coaches",
                "check coaches", "current coaches", "coach info", "coaching staff",
            ],
            "View your connected coaches and their details",
        ),
        IntentEntry::new(
            "ADD_GOAL",
            Some("/addgoal"),
            &[
                "add goal", "create goal", "new goal", "set goal", "make goal",
                "establish goal", "define goal", "start goal", "begin goal", "initiate goal",
                "goal creation", "create a new goal", "add a goal", "set up goal", "plan goal",
                "goal setting", "establish objective", "create objective", "new objective",
            ],
            "Add a new goal with your coach",
        ),
        IntentEntry::new(
            "ADD_SESSION",
            Some("/addsession"),
            &[
                "add session", "schedule session", "book session", "new session", "create session",
                "plan session", "arrange session", "set up session", "organize session", "make appointment",
                "book appointment", "schedule meeting", "plan meeting", "new meeting", "coaching session",
                "set up call", "schedule a call", "arrange meeting", "book a slot", "reserve time",
            ],
            "Schedule a new coaching session",
        ),
        IntentEntry::new(
            "LIST_SESSIONS",
            Some("/listsessions"),
            &[
                "list sessions", "show sessions", "my sessions", "view sessions", "all sessions",
                "upcoming sessions", "scheduled sessions", "display sessions", "session calendar",
                "future sessions", "sessions list", "view appointments", "show appointments",
                "my schedule", "upcoming meetings", "calendar", "upcoming calls", "meeting schedule",
            ],
            "View all your scheduled sessions",
        ),
        IntentEntry::new(
            "LIST_GOALS",
            Some("/listgoals"),
            &[
                "list goals", "show goals", "my goals", "view goals", "all goals",
                "display goals", "goal status", "goal progress", "goals overview",
                "current goals", "active goals", "see my goals", "check goals",
                "view objectives", "my objectives", "show targets", "view targets",
            ],
            "View all your goals",
        ),
        IntentEntry::new(
            "LOGIN",
            Some("/login"),
            &[
                "login", "sign in", "authenticate", "access account", "log in",
                "enter credentials", "account access", "user login", "sign on",
                "user authentication", "access platform", "enter account",
                "sign into account", "account login", "authentication", "credentials",
            ],
            "Login to your UExcelerate account",
        ),
        IntentEntry::new(
            "SEARCH_COACH",
            Some("/searchcoach"),
            &[
                "search coach", "find coach", "discover coach", "coach search", "look for coach",
                "locate coach", "coach discovery", "coach finder", "find new coach", "search for coach",
                "explore coaches", "browse coaches", "coach exploration", "coach matching",
                "get matched", "find mentor", "search mentor", "discover mentor", "coach recommendation",
            ],
            "Search for new coaches based on your needs",
        ),
        IntentEntry::new(
            "ADD_ACTION",
            Some("/addaction"),
            &[
                "add action", "create action", "new action", "set action", "make action",
                "define action", "action item", "create task", "add task", "new task",
                "create action step", "add action item", "define task", "establish action",
                "new action plan", "create action plan", "add activity", "new activity",
            ],
            "Add a new action for a goal",
        ),
        IntentEntry::new(
            "LIST_ACTIONS",
            Some("/listactions"),
            &[
                "list actions", "show actions", "my actions", "view actions", "all actions",
                "display actions", "action items", "view tasks", "show tasks", "my tasks",
                "action steps", "action overview", "view action items", "check actions",
                "action status", "task list", "view activities", "activity list",
            ],
            "View all your actions",
        ),
        IntentEntry::new(
            "HELP",
            None,
            &[
                "help", "commands", "what can you do", "available commands", "how to use",
                "show help", "assistance", "support", "guide me", "instructions", "options",
                "features", "functionality", "capabilities", "functions", "available options",
            ],
            "Get help and see available commands",
        ),
    ]
}
