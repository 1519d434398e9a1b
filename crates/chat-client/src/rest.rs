//! REST implementation of [`ChatBackend`].
//!
//! `RestChatClient` wraps a `reqwest::Client` and performs exactly one
//! `POST` per send.  There is no retry: a failed exchange surfaces to the
//! conversation store, which shows it in place of the pending reply.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use cd_domain::config::ApiConfig;
use cd_domain::error::{Error, Result};
use cd_domain::message::Message;
use cd_domain::trace::TraceEvent;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::backend::ChatBackend;
use crate::types::{ChatRequest, SendOptions};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST client for the assistant chat endpoint.
///
/// Created once and reused for the lifetime of the process.
/// The underlying `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RestChatClient {
    http: Client,
    endpoint: String,
}

impl RestChatClient {
    /// Build a new client from the `[api]` config section.
    ///
    /// `timeout_ms` bounds the whole exchange; reqwest reports expiry as a
    /// timeout error.
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, body: &ChatRequest, options: &SendOptions) -> RequestBuilder {
        let mut rb = self.http.post(&self.endpoint).json(body);
        if let Some(credential) = options.credential() {
            rb = rb.header(AUTHORIZATION, format!("Basic {credential}"));
        }
        rb
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl ChatBackend for RestChatClient {
    async fn send_prompt(
        &self,
        prompt: &str,
        session_id: &str,
        options: &SendOptions,
    ) -> Result<Message> {
        let body = ChatRequest::new(prompt, session_id, options.customer_id.as_deref());

        let start = Instant::now();
        let result = self.build_request(&body, options).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::ChatApiCall {
                    endpoint: self.endpoint.clone(),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        TraceEvent::ChatApiCall {
            endpoint: self.endpoint.clone(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(Error::ChatApi {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(Message::assistant(display_text(&text)))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response body → display text
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Derive the message text from a successful response body.
///
/// Preference: a bare JSON string, then `text`, then `message.text`, then
/// the compact serialization of the whole body so that structured payloads
/// can still be interpreted at render time.  A body that is not JSON is
/// kept verbatim.
pub fn display_text(body: &str) -> String {
    let json = match serde_json::from_str::<Value>(body) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "chat response is not JSON, keeping raw body");
            return body.to_owned();
        }
    };

    if let Value::String(s) = json {
        return s;
    }

    json.get("text")
        .filter(|v| !v.is_null())
        .or_else(|| {
            json.get("message")
                .and_then(|m| m.get("text"))
                .filter(|v| !v.is_null())
        })
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| json.to_string())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
