//! Persistence of the operator's customer choice.
//!
//! Mirrors the session id handling: every storage failure is logged and
//! swallowed, so a broken store only costs the remembered selection.

use std::sync::Arc;

use crate::kv::{KeyValueStore, SELECTED_CUSTOMER_KEY};

pub struct CustomerSelection {
    storage: Arc<dyn KeyValueStore>,
}

impl CustomerSelection {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// The last-picked customer id, if any.
    pub fn get(&self) -> Option<String> {
        match self.storage.get(SELECTED_CUSTOMER_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "reading selected customer failed");
                None
            }
        }
    }

    pub fn set(&self, customer_id: &str) {
        if let Err(e) = self.storage.set(SELECTED_CUSTOMER_KEY, customer_id) {
            tracing::warn!(error = %e, customer_id, "saving selected customer failed");
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(SELECTED_CUSTOMER_KEY) {
            tracing::warn!(error = %e, "clearing selected customer failed");
        }
    }
}
