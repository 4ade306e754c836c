//! Conversation session store and three-layer coreference resolver (C9).
//!
//! Owns the session lifecycle (load/create/store/expire), turn addition
//! with working-set maintenance, and `build_llm_context` assembly
//! (FIFO-windowed messages plus coreference-resolved query) that feeds
//! the answer generator.

pub mod context;
pub mod coreference;
pub mod error;
pub mod session;

pub use context::{append_assistant_turn, append_user_turn, build_llm_context};
pub use coreference::{CoreferenceLayer, CoreferenceOutcome};
pub use error::MemoryError;
pub use session::{InMemorySessionStore, RedisSessionStore, SessionStore};
