//! In-memory per-user state

pub mod session;

// Re-exports for convenience
pub use session::{InteractionState, Session, SessionStore};
