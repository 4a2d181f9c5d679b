/// Error types for coach-intent
///
/// Classification itself never fails. These errors only come from the edges:
/// building a catalog, loading settings, wiring the dispatcher and running
/// command handlers.

use thiserror::Error;

/// Main error type for coach-intent operations
#[derive(Error, Debug)]
pub enum IntentError {
    /// I/O errors (reading settings, stdin, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Settings file could not be parsed
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    /// Catalog violates its invariants (duplicate or malformed command ids)
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A command id that is not part of the taxonomy
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Dispatch table was built without a handler for this command
    #[error("No handler registered for {0}")]
    MissingHandler(String),

    /// A command handler failed while executing
    #[error("Handler for {command} failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for coach-intent operations
pub type Result<T> = std::result::Result<T, IntentError>;

/// Convert IntentError to a user-friendly error message
impl IntentError {
    pub fn user_message(&self) -> String {
        match self {
            IntentError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            IntentError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            IntentError::SettingsParse(e) => {
                format!("Could not read the settings file: {}", e)
            }
            IntentError::InvalidCatalog(reason) => {
                format!("The command catalog is misconfigured: {}", reason)
            }
            IntentError::UnknownCommand(cmd) => {
                format!("'{}' is not a command I know. Type 'help' to see them all.", cmd)
            }
            IntentError::MissingHandler(cmd) => {
                format!("Nothing is set up to run {} yet", cmd)
            }
            IntentError::Handler { command, .. } => {
                format!("Sorry, there was an error running {}. Please try again.", command)
            }
            IntentError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            IntentError::Generic(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = IntentError::UnknownCommand("/nope".to_string());
        assert!(err.user_message().contains("/nope"));
        assert!(err.user_message().contains("help"));

        let err = IntentError::Handler {
            command: "/listgoals".to_string(),
            source: anyhow::anyhow!("backend returned 500"),
        };
        assert!(err.user_message().contains("/listgoals"));
        assert!(!err.user_message().contains("500"));
    }

    #[test]
    fn test_error_display() {
        let err = IntentError::InvalidCatalog("duplicate command id /coach".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Invalid catalog"));
        assert!(display.contains("/coach"));
    }
}
