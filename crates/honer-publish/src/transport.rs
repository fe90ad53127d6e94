use std::error::Error as _;
use std::fmt;

use async_trait::async_trait;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Timeout,
    Request,
    /// No detail at all: what a browser reports for a blocked cross-origin call.
    Opaque,
}

/// The request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Messages browsers use for a fetch that failed without explanation.
/// Compared against the whole message, never as substrings.
const OPAQUE_SIGNATURES: [&str; 3] = [
    "failed to fetch",
    "networkerror when attempting to fetch resource",
    "load failed",
];

/// True when `message` is nothing but a browser's opaque fetch failure,
/// optionally prefixed with `TypeError:` and ending in a period.
fn is_opaque_message(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    let bare = lower.strip_prefix("typeerror:").unwrap_or(&lower).trim();
    let bare = bare.strip_suffix('.').unwrap_or(bare);
    OPAQUE_SIGNATURES.iter().any(|sig| *sig == bare)
}

impl TransportFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a failure by its message, spotting the opaque fetch shape.
    pub fn from_message(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if is_opaque_message(&message) {
            FailureKind::Opaque
        } else {
            kind
        };
        Self { kind, message }
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == FailureKind::Opaque
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connect
        } else {
            FailureKind::Request
        };

        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::from_message(kind, message)
    }
}

/// Outbound JSON POST. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        endpoint: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportFailure>;
}

/// Production transport over `reqwest`. No timeout beyond reqwest's own.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        authorization: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportFailure> {
        let res = self
            .client
            .post(endpoint)
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = res.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        // An unreadable body is treated like an empty one.
        let body = res.text().await.unwrap_or_default();

        Ok(HttpReply {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
