/// Core functionality modules
///
/// The command taxonomy, the dispatch table that runs recognised commands,
/// and the short-lived stores for sessions and actions parked on a login.

pub mod command;
pub mod dispatcher;
pub mod store;

pub use command::CommandKind;
pub use dispatcher::{CommandHandler, CommandRequest, Dispatcher, DispatcherBuilder, Reply};
pub use store::{MemoryStore, PendingAction, Store};
