/// Inline button payloads
pub mod callback;
/// Shared handler context
pub mod context;
/// Command, text and button handlers
pub mod handlers;
/// Inline query answers
pub mod inline;
/// Long message and lyrics delivery
pub mod messaging;
/// Inline search results cache
pub mod page_cache;
/// Pending menu input per user
pub mod session;
/// Outbound chat operations
pub mod transport;
/// Texts and keyboards
pub mod views;

pub use context::BotContext;
pub use handlers::Command;
