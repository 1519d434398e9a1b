//! Wiring shared by every command that touches the conversation.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use cd_domain::config::Config;
use cd_domain::{Catalog, Customer, Message};
use cd_sessions::{
    ConversationStore, CustomerSelection, FileStore, KeyValueStore, MemoryStore,
    SessionIdentity,
};

/// Everything a command needs to talk to the assistant as one device.
pub struct ChatContext {
    pub catalog: Catalog,
    pub selection: CustomerSelection,
    pub store: ConversationStore,
}

impl ChatContext {
    /// Open storage, load the catalog, resolve the session, and load its log.
    ///
    /// With `ephemeral` set nothing is read from or written to disk.
    pub fn open(config: &Config, ephemeral: bool) -> anyhow::Result<Self> {
        let catalog = Catalog::load(
            &config.catalog.customers_path,
            &config.catalog.prompts_path,
        )
        .context("loading customer and prompt catalog")?;
        let backend =
            cd_client::create_backend(&config.api).context("building chat client")?;

        let storage: Arc<dyn KeyValueStore> = if ephemeral {
            Arc::new(MemoryStore::new())
        } else {
            open_storage(&config.storage.path)
        };

        Ok(Self::with_parts(catalog, storage, backend))
    }

    /// Assemble a context from already-built parts.
    pub fn with_parts(
        catalog: Catalog,
        storage: Arc<dyn KeyValueStore>,
        backend: Arc<dyn cd_client::ChatBackend>,
    ) -> Self {
        let session_id = SessionIdentity::new(storage.clone()).session_id();
        let selection = CustomerSelection::new(storage.clone());
        let store = ConversationStore::open(session_id, storage, backend);
        Self {
            catalog,
            selection,
            store,
        }
    }

    /// The customer to act as.
    ///
    /// An explicit `requested` id must exist in the catalog.  Otherwise the
    /// stored selection wins, falling back to the first customer listed.
    pub fn customer(&self, requested: Option<&str>) -> anyhow::Result<Option<&Customer>> {
        match requested {
            Some(id) => self
                .catalog
                .customer(id)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("unknown customer: {id}")),
            None => Ok(self
                .catalog
                .effective_customer(self.selection.get().as_deref())),
        }
    }

    /// Store the effective customer as the selection when it differs from
    /// what is stored, so a fallback to the first customer sticks.
    pub fn remember_customer(&self) -> Option<&Customer> {
        let stored = self.selection.get();
        let effective = self.catalog.effective_customer(stored.as_deref())?;
        if stored.as_deref() != Some(effective.customer_id.as_str()) {
            self.selection.set(&effective.customer_id);
        }
        Some(effective)
    }

    /// Send `prompt` on behalf of `customer`.
    pub async fn send(&self, prompt: &str, customer: Option<&Customer>) -> Option<Message> {
        let credential = customer.and_then(|c| c.auth_token_b64.as_deref());
        let customer_id = customer.map(|c| c.customer_id.as_str());
        self.store.send(prompt, credential, customer_id).await
    }
}

fn open_storage(path: &Path) -> Arc<dyn KeyValueStore> {
    match FileStore::open(path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "cannot open storage, keeping state in memory only"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
