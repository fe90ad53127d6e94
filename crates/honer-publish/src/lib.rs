pub mod endpoint;
pub mod transport;

use base64::Engine as _;

use honer_core::{PublishConfig, FALLBACK_TITLE};

pub use endpoint::normalize_endpoint;
pub use transport::{FailureKind, HttpReply, HttpTransport, Transport, TransportFailure};

/// The created post resource exactly as the site returned it.
pub type PublishResponse = serde_json::Value;

pub const CORS_HINT: &str = "CORS error: your site blocked the request. Install a CORS browser \
extension, allow cross-origin requests on the site, or send the request through a proxy server.";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("network error: {0}")]
    Transport(TransportFailure),
    #[error("{}", CORS_HINT)]
    CorsBlocked,
    #[error("Failed to publish: {status} {status_text}. {message}")]
    Backend {
        status: u16,
        status_text: String,
        message: String,
    },
    #[error("site returned an unreadable response: {0}")]
    MalformedBody(String),
}

impl From<TransportFailure> for PublishError {
    fn from(failure: TransportFailure) -> Self {
        if failure.is_opaque() {
            PublishError::CorsBlocked
        } else {
            PublishError::Transport(failure)
        }
    }
}

/// `Basic <base64(username:app_password)>`.
pub fn basic_auth(username: &str, app_password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{app_password}"));
    format!("Basic {token}")
}

/// Pull a human-readable `message` out of an error body, if it has one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_default()
}

/// Creates posts through the site's REST API.
pub struct Publisher<T> {
    transport: T,
}

impl Publisher<HttpTransport> {
    pub fn http() -> Self {
        Self::new(HttpTransport::new())
    }
}

impl<T: Transport> Publisher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Publish immediately (status `publish`); there is no draft mode.
    /// A blank `title` is replaced by [`FALLBACK_TITLE`].
    pub async fn publish(
        &self,
        config: &PublishConfig,
        title: &str,
        content: &str,
    ) -> Result<PublishResponse, PublishError> {
        let endpoint = normalize_endpoint(&config.url);
        let authorization = basic_auth(&config.username, &config.app_password);
        let title = if title.is_empty() { FALLBACK_TITLE } else { title };
        let body = serde_json::json!({
            "title": title,
            "content": content,
            "status": "publish",
        });

        tracing::debug!(%endpoint, title, "publishing post");

        let reply = self
            .transport
            .post_json(&endpoint, &authorization, &body)
            .await
            .map_err(|failure| {
                tracing::warn!(%endpoint, kind = ?failure.kind, error = %failure, "publish transport failed");
                PublishError::from(failure)
            })?;

        if !reply.is_success() {
            tracing::warn!(%endpoint, status = reply.status, "publish rejected");
            return Err(PublishError::Backend {
                status: reply.status,
                status_text: reply.status_text,
                message: error_message(&reply.body),
            });
        }

        let created: PublishResponse = serde_json::from_str(&reply.body)
            .map_err(|e| PublishError::MalformedBody(e.to_string()))?;
        tracing::info!(%endpoint, id = ?created.get("id"), "post published");
        Ok(created)
    }
}

/// Publish once over HTTP.
pub async fn publish(
    config: &PublishConfig,
    title: &str,
    content: &str,
) -> Result<PublishResponse, PublishError> {
    Publisher::http().publish(config, title, content).await
}
