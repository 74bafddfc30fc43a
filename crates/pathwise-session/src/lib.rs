//! Session aggregate and durable session storage.

pub mod session;
pub mod store;

pub use session::Session;
pub use store::{validate_session_id, FileSessionStore, MemorySessionStore, SessionStore};
