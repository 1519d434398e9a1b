//! Integration test: a [`ConversationStore`] backed by a real
//! [`RestChatClient`] talking to an in-process HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cd_client::RestChatClient;
use cd_domain::config::ApiConfig;
use cd_domain::message::{Message, Role};
use cd_sessions::{ConversationStore, KeyValueStore, MemoryStore};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn boom() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn ok() -> Json<Value> {
    Json(json!({ "text": "all good" }))
}

async fn start_backend() -> SocketAddr {
    let app = Router::new()
        .route("/boom", post(boom))
        .route("/ok", post(ok));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn store_for(addr: SocketAddr, path: &str, storage: Arc<MemoryStore>) -> ConversationStore {
    let client = RestChatClient::new(&ApiConfig {
        endpoint: format!("http://{addr}{path}"),
        timeout_ms: 5_000,
    })
    .unwrap();
    ConversationStore::open("session-http", storage, Arc::new(client))
}

#[tokio::test]
async fn server_error_lands_in_placeholder_slot() {
    let addr = start_backend().await;
    let storage = Arc::new(MemoryStore::new());
    let store = store_for(addr, "/boom", storage.clone());

    let reply = store.send("hello", Some("QzAwMQ=="), Some("C001")).await.unwrap();

    assert!(reply.error);
    assert_eq!(reply.role, Role::Assistant);
    assert!(reply.text.contains("500"));
    assert!(reply.text.contains("boom"));

    let messages = store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "hello");
    assert_eq!(messages[1], reply);
    assert!(!store.error().unwrap_or_default().is_empty());
    assert!(!store.is_loading());

    let persisted: Vec<Message> =
        serde_json::from_str(&storage.get(store.storage_key()).unwrap().unwrap()).unwrap();
    assert_eq!(persisted, messages);
}

#[tokio::test]
async fn successful_reply_replaces_placeholder() {
    let addr = start_backend().await;
    let store = store_for(addr, "/ok", Arc::new(MemoryStore::new()));

    let reply = store.send("hello", None, None).await.unwrap();

    assert!(!reply.error);
    assert_eq!(reply.text, "all good");
    assert_eq!(store.len(), 2);
    assert!(store.error().is_none());
}
