//! Conversation store: the ordered message log of the active session.
//!
//! Each `send` appends the user's message and an optimistic assistant
//! placeholder, calls the backend, then swaps the placeholder (found by id,
//! never by position) for the real reply or an error entry.  The log is
//! written to durable storage after every mutation under
//! `chat_messages_<sessionId>`.
//!
//! The in-memory log sits behind a mutex that is never held across the
//! network await, so concurrent sends on one store each resolve their own
//! slot in whatever order the replies arrive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cd_client::{ChatBackend, SendOptions};
use cd_domain::error::{Error, Result};
use cd_domain::message::Message;
use cd_domain::trace::TraceEvent;
use parking_lot::Mutex;

use crate::kv::{messages_key, KeyValueStore};

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<Message>,
    error: Option<String>,
}

/// Owns the message log for one session.
pub struct ConversationStore {
    session_id: String,
    storage_key: String,
    storage: Arc<dyn KeyValueStore>,
    backend: Arc<dyn ChatBackend>,
    state: Mutex<ConversationState>,
    in_flight: AtomicUsize,
}

impl ConversationStore {
    /// Open the store for `session_id`, loading any persisted log.
    ///
    /// A missing or unreadable log yields an empty conversation.  Nothing
    /// can be in flight for a freshly opened store, so placeholders left by
    /// an interrupted process are turned into error entries in their slot.
    pub fn open(
        session_id: impl Into<String>,
        storage: Arc<dyn KeyValueStore>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let session_id = session_id.into();
        let storage_key = messages_key(&session_id);
        let mut messages = load_messages(storage.as_ref(), &storage_key);
        let orphans = settle_orphans(&mut messages);

        TraceEvent::ConversationLoaded {
            session_id: session_id.clone(),
            messages: messages.len(),
        }
        .emit();

        let store = Self {
            session_id,
            storage_key,
            storage,
            backend,
            state: Mutex::new(ConversationState {
                messages,
                error: None,
            }),
            in_flight: AtomicUsize::new(0),
        };

        if orphans > 0 {
            tracing::warn!(
                session_id = %store.session_id,
                orphans,
                "persisted conversation had unanswered placeholders"
            );
            store.persist(&store.state.lock().messages);
        }
        store
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Snapshot of the log in conversation order.
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().messages.is_empty()
    }

    /// True while at least one send is waiting on the backend.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Text of the most recent failed send, cleared by the next send or
    /// by [`clear`](Self::clear).
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Send `prompt` and record the exchange.
    ///
    /// Returns the message that took the placeholder's slot: the assistant
    /// reply, or an entry flagged `error` describing the failure.  Returns
    /// `None` when the log was cleared while the request was in flight; the
    /// late reply is then dropped.
    pub async fn send(
        &self,
        prompt: &str,
        credential: Option<&str>,
        customer_id: Option<&str>,
    ) -> Option<Message> {
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();
        {
            let mut state = self.state.lock();
            state.messages.push(Message::user(prompt));
            state.messages.push(placeholder);
            state.error = None;
            self.persist(&state.messages);
        }

        let mut pending = PendingSend::begin(self, placeholder_id);
        let options = SendOptions::new(credential, customer_id);
        let outcome = self
            .backend
            .send_prompt(prompt, &self.session_id, &options)
            .await;

        pending.settled = true;
        self.resolve(&pending.placeholder_id, outcome)
    }

    /// Empty the log, forget the last error, and delete the persisted copy.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.messages.len();
        state.messages.clear();
        state.error = None;

        if let Err(e) = self.storage.remove(&self.storage_key) {
            tracing::warn!(
                key = %self.storage_key,
                error = %e,
                "failed to remove persisted conversation"
            );
        }

        TraceEvent::ConversationCleared {
            session_id: self.session_id.clone(),
            messages: dropped,
        }
        .emit();
    }

    // ── Private helpers ───────────────────────────────────────────────

    /// Replace the placeholder with the outcome of its request.
    fn resolve(&self, placeholder_id: &str, outcome: Result<Message>) -> Option<Message> {
        let mut state = self.state.lock();

        let Some(slot) = state.messages.iter().position(|m| m.id == placeholder_id) else {
            tracing::debug!(
                session_id = %self.session_id,
                placeholder_id,
                "placeholder gone, dropping stale completion"
            );
            TraceEvent::StaleCompletion {
                session_id: self.session_id.clone(),
                placeholder_id: placeholder_id.to_owned(),
            }
            .emit();
            return None;
        };

        let resolved = match outcome {
            Ok(reply) => Message {
                is_temp: false,
                error: false,
                ..reply
            },
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "chat send failed");
                let text = e.to_string();
                state.error = Some(text.clone());
                Message::failure(text)
            }
        };

        state.messages[slot] = resolved.clone();
        self.persist(&state.messages);

        TraceEvent::PlaceholderResolved {
            session_id: self.session_id.clone(),
            placeholder_id: placeholder_id.to_owned(),
            message_id: resolved.id.clone(),
            error: resolved.error,
        }
        .emit();

        Some(resolved)
    }

    fn persist(&self, messages: &[Message]) {
        let json = match serde_json::to_string(messages) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize conversation");
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.storage_key, &json) {
            tracing::warn!(
                key = %self.storage_key,
                error = %e,
                "failed to persist conversation, continuing in memory"
            );
        }
    }
}

/// Tracks one outstanding send.
///
/// Dropping it marks the send finished.  If the send future is dropped
/// before the backend answered, the placeholder is resolved as a failure
/// so it never lingers in the log.
struct PendingSend<'a> {
    store: &'a ConversationStore,
    placeholder_id: String,
    settled: bool,
}

impl<'a> PendingSend<'a> {
    fn begin(store: &'a ConversationStore, placeholder_id: String) -> Self {
        store.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            store,
            placeholder_id,
            settled: false,
        }
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.resolve(
                &self.placeholder_id,
                Err(Error::Other("request cancelled before a reply arrived".into())),
            );
        }
        self.store.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Replace every pending placeholder with an interruption error.
fn settle_orphans(messages: &mut [Message]) -> usize {
    let mut settled = 0;
    for slot in messages.iter_mut().filter(|m| m.is_temp) {
        *slot = Message::failure("request interrupted before a reply arrived");
        settled += 1;
    }
    settled
}

fn load_messages(storage: &dyn KeyValueStore, key: &str) -> Vec<Message> {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(key, error = %e, "persisted conversation is malformed, starting empty");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted conversation");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use cd_domain::message::{Role, PLACEHOLDER_TEXT};

    use crate::kv::MemoryStore;
    use crate::testing::{FailingStore, GatedBackend, ScriptedBackend};

    fn open(storage: &Arc<MemoryStore>, backend: Arc<dyn ChatBackend>) -> ConversationStore {
        ConversationStore::open("session-1", storage.clone(), backend)
    }

    fn boom() -> Error {
        Error::ChatApi {
            status: 500,
            body: "boom".into(),
        }
    }

    #[tokio::test]
    async fn send_appends_user_and_reply() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(&storage, Arc::new(ScriptedBackend::echo()));

        let reply = store.send("hello", None, None).await.unwrap();

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1], reply);
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text, "re: hello");
        assert!(!reply.is_temp);
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn passes_session_credential_and_customer() {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(ScriptedBackend::echo());
        let store = open(&storage, backend.clone());

        store.send("balance?", Some("VGVzdEAy"), Some("C001")).await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "balance?");
        assert_eq!(calls[0].session_id, "session-1");
        assert_eq!(calls[0].options.credential(), Some("VGVzdEAy"));
        assert_eq!(calls[0].options.customer_id.as_deref(), Some("C001"));
    }

    #[tokio::test]
    async fn placeholder_is_visible_while_in_flight() {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(GatedBackend::new());
        let store = open(&storage, backend.clone());

        let observe = async {
            backend.started().await;
            assert!(store.is_loading());
            let messages = store.messages();
            assert_eq!(messages.len(), 2);
            assert!(messages[1].is_temp);
            assert_eq!(messages[1].text, PLACEHOLDER_TEXT);

            // The placeholder is already persisted.
            let persisted: Vec<Message> =
                serde_json::from_str(&storage.get(store.storage_key()).unwrap().unwrap())
                    .unwrap();
            assert_eq!(persisted.len(), 2);

            backend.release();
            messages[1].id.clone()
        };

        let (reply, placeholder_id) = tokio::join!(store.send("hi", None, None), observe);
        let reply = reply.unwrap();

        assert_ne!(reply.id, placeholder_id);
        assert_eq!(store.messages()[1].id, reply.id);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn server_error_replaces_placeholder_with_error_entry() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(&storage, Arc::new(ScriptedBackend::with(vec![Err(boom())])));

        let reply = store.send("hello", None, None).await.unwrap();

        assert!(reply.error);
        assert!(!reply.is_temp);
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.text.contains("500"));
        assert!(reply.text.contains("boom"));

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].error);

        let error = store.error().unwrap();
        assert!(!error.is_empty());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn next_send_clears_previous_error() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(
            &storage,
            Arc::new(ScriptedBackend::with(vec![Err(boom()), Ok("fine".into())])),
        );

        store.send("first", None, None).await;
        assert!(store.error().is_some());

        let reply = store.send("second", None, None).await.unwrap();
        assert_eq!(reply.text, "fine");
        assert!(store.error().is_none());
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn many_sends_settle_to_two_messages_each() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(
            &storage,
            Arc::new(ScriptedBackend::with(vec![
                Ok("one".into()),
                Err(boom()),
                Ok("three".into()),
            ])),
        );

        for prompt in ["a", "b", "c", "d", "e"] {
            store.send(prompt, None, None).await;
        }

        let messages = store.messages();
        assert_eq!(messages.len(), 10);
        let ids: HashSet<_> = messages.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), 10);
        assert!(messages.iter().all(|m| !m.is_temp));

        let user_texts: Vec<_> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(user_texts, vec!["a", "b", "c", "d", "e"]);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[tokio::test]
    async fn concurrent_sends_resolve_their_own_slots() {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(
            ScriptedBackend::echo().with_delay("slow", Duration::from_millis(80)),
        );
        let store = open(&storage, backend);

        let (slow, fast) = tokio::join!(
            store.send("slow", None, None),
            store.send("fast", None, None)
        );

        let messages = store.messages();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["slow", "re: slow", "fast", "re: fast"]);
        assert_eq!(messages[1].id, slow.unwrap().id);
        assert_eq!(messages[3].id, fast.unwrap().id);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn clear_during_flight_drops_late_reply() {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(GatedBackend::new());
        let store = open(&storage, backend.clone());

        let race = async {
            backend.started().await;
            store.clear();
            backend.release();
        };
        let (reply, ()) = tokio::join!(store.send("hi", None, None), race);

        assert!(reply.is_none());
        assert!(store.is_empty());
        assert!(store.error().is_none());
        assert!(storage.get(store.storage_key()).unwrap().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn dropped_send_resolves_placeholder_as_failure() {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(GatedBackend::new());
        let store = open(&storage, backend);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), store.send("hi", None, None)).await;
        assert!(timed_out.is_err());

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert!(!messages[1].is_temp);
        assert!(messages[1].error);
        assert!(messages[1].text.contains("cancelled"));
        assert!(store.error().is_some());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn reload_yields_identical_log() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(
            &storage,
            Arc::new(ScriptedBackend::with(vec![Ok("x".into()), Err(boom())])),
        );
        for prompt in ["one", "two", "three"] {
            store.send(prompt, None, None).await;
        }
        let before = store.messages();
        drop(store);

        let reopened = open(&storage, Arc::new(ScriptedBackend::echo()));
        assert_eq!(reopened.messages(), before);
    }

    #[tokio::test]
    async fn clear_then_reopen_is_empty() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(&storage, Arc::new(ScriptedBackend::echo()));
        store.send("hello", None, None).await;
        assert!(storage.get(store.storage_key()).unwrap().is_some());

        store.clear();
        assert!(store.is_empty());
        assert!(storage.get(store.storage_key()).unwrap().is_none());

        let reopened = open(&storage, Arc::new(ScriptedBackend::echo()));
        assert!(reopened.is_empty());
    }

    #[tokio::test]
    async fn clear_resets_error() {
        let storage = Arc::new(MemoryStore::new());
        let store = open(&storage, Arc::new(ScriptedBackend::with(vec![Err(boom())])));
        store.send("hello", None, None).await;
        assert!(store.error().is_some());

        store.clear();
        assert!(store.error().is_none());
        assert_eq!(store.session_id(), "session-1");
    }

    #[tokio::test]
    async fn logs_are_scoped_per_session() {
        let storage = Arc::new(MemoryStore::new());
        let a = ConversationStore::open("a", storage.clone(), Arc::new(ScriptedBackend::echo()));
        let b = ConversationStore::open("b", storage.clone(), Arc::new(ScriptedBackend::echo()));

        a.send("only in a", None, None).await;
        assert_eq!(a.len(), 2);
        assert!(b.is_empty());
        assert_eq!(a.storage_key(), "chat_messages_a");
    }

    #[test]
    fn malformed_persisted_log_loads_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set("chat_messages_session-1", "[{oops").unwrap();
        let store = open(&storage, Arc::new(ScriptedBackend::echo()));
        assert!(store.is_empty());
    }

    #[test]
    fn interrupted_placeholder_is_settled_on_open() {
        let storage = Arc::new(MemoryStore::new());
        let user = Message::user("hi");
        let placeholder = Message::placeholder();
        let log = serde_json::to_string(&vec![user.clone(), placeholder.clone()]).unwrap();
        storage.set("chat_messages_session-1", &log).unwrap();

        let store = open(&storage, Arc::new(ScriptedBackend::echo()));
        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], user);
        assert!(messages.iter().all(|m| !m.is_temp));
        assert!(messages[1].error);
        assert_ne!(messages[1].id, placeholder.id);
        assert!(messages[1].text.contains("interrupted"));
        assert!(!store.is_loading());

        // The settled log is written back.
        let persisted: Vec<Message> =
            serde_json::from_str(&storage.get(store.storage_key()).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, messages);
    }

    #[tokio::test]
    async fn leaked_send_leaves_no_pending_entry_after_reopen() {
        let storage = Arc::new(MemoryStore::new());
        let backend = Arc::new(GatedBackend::new());
        let store = open(&storage, backend.clone());

        // Park the request, then forget the future so no destructor runs.
        let mut send = Box::pin(store.send("hi", None, None));
        tokio::select! {
            _ = &mut send => panic!("gated send finished"),
            _ = backend.started() => {}
        }
        std::mem::forget(send);

        let reopened = open(&storage, Arc::new(ScriptedBackend::echo()));
        let messages = reopened.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| !m.is_temp));
        assert!(messages[1].error);
    }

    #[tokio::test]
    async fn storage_failure_keeps_conversation_in_memory() {
        let store = ConversationStore::open(
            "session-1",
            Arc::new(FailingStore),
            Arc::new(ScriptedBackend::echo()),
        );

        let reply = store.send("hello", None, None).await.unwrap();
        assert_eq!(reply.text, "re: hello");
        assert_eq!(store.len(), 2);
        assert!(store.error().is_none());

        store.clear();
        assert!(store.is_empty());
    }
}
