//! Session identity: one stable conversation id per device.
//!
//! The id is read from durable storage on first use and minted (UUIDv4)
//! when absent.  Storage failures never surface: the provider logs them
//! and falls back to an id that lives only as long as this process.

use std::sync::Arc;

use cd_domain::trace::TraceEvent;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::kv::{KeyValueStore, SESSION_ID_KEY};

/// Supplies the per-device session id, created lazily and cached.
pub struct SessionIdentity {
    storage: Arc<dyn KeyValueStore>,
    cached: Mutex<Option<String>>,
}

impl SessionIdentity {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            cached: Mutex::new(None),
        }
    }

    /// The session id.  Identical across calls for the life of the stored
    /// value (or of this provider, if storage is unavailable).
    pub fn session_id(&self) -> String {
        let mut cached = self.cached.lock();
        if let Some(id) = cached.as_ref() {
            return id.clone();
        }

        let id = match self.storage.get(SESSION_ID_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => {
                TraceEvent::SessionResolved {
                    session_id: id.clone(),
                    is_new: false,
                }
                .emit();
                id
            }
            Ok(_) => self.mint(),
            Err(e) => {
                tracing::warn!(error = %e, "reading session id failed");
                self.mint()
            }
        };

        *cached = Some(id.clone());
        id
    }

    fn mint(&self) -> String {
        let id = Uuid::new_v4().to_string();
        if let Err(e) = self.storage.set(SESSION_ID_KEY, &id) {
            tracing::warn!(error = %e, "session id not persisted, using in-memory id");
        }
        TraceEvent::SessionResolved {
            session_id: id.clone(),
            is_new: true,
        }
        .emit();
        id
    }
}
