//! Client-side session state.
//!
//! A device holds one conversation session id, an optional selected
//! customer, and the message log of that session.  All three live in a
//! [`KeyValueStore`]; storage failures are logged and never surface to the
//! user, the conversation simply continues in memory.

pub mod identity;
pub mod kv;
pub mod selection;
pub mod store;

#[cfg(test)]
mod testing;

pub use identity::SessionIdentity;
pub use kv::{
    messages_key, FileStore, KeyValueStore, MemoryStore, MESSAGES_KEY_PREFIX,
    SELECTED_CUSTOMER_KEY, SESSION_ID_KEY,
};
pub use selection::CustomerSelection;
pub use store::ConversationStore;
