//! Bundled extensions

pub mod logging;
pub mod session;

pub use logging::{Logger, LoggerExtension};
pub use session::{session, LoginRequired, MemoryStore, Session, SessionExtension, SessionStore};
