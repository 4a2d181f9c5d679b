/// coach-intent library
///
/// Natural-language command recognition for the coaching chat bot.

pub mod config;
pub mod core;
pub mod error;
pub mod intelligence;
pub mod logging;

// Re-exports for convenience
pub use config::Settings;
pub use error::{IntentError, Result};
pub use intelligence::Analyzer;
