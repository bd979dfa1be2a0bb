//! Outbound push notifications to the project owner.

use std::time::Duration;

use serde_json::json;
use tracing::warn;
use url::Url;

use crate::rpc::{RpcError, RpcResult};

pub const TITLE_MAX_LENGTH: usize = 1200;
pub const CONTENT_MAX_LENGTH: usize = 20_000;

const SEND_NOTIFICATION_PATH: &str = "webdevtoken.v1.WebDevService/SendNotification";

/// Client for the notification service.
#[derive(Clone)]
pub struct OwnerNotifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OwnerNotifier {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> RpcResult<Url> {
        if self.base_url.is_empty() {
            return Err(RpcError::internal("Notification service URL is not configured."));
        }
        if self.api_key.is_empty() {
            return Err(RpcError::internal("Notification service API key is not configured."));
        }
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        Url::parse(&base)
            .and_then(|u| u.join(SEND_NOTIFICATION_PATH))
            .map_err(|e| RpcError::internal(format!("Invalid notification service URL: {e}")))
    }

    /// Push a notification. Returns `false` when the service rejects it or
    /// cannot be reached.
    pub async fn notify_owner(&self, title: &str, content: &str) -> RpcResult<bool> {
        let (title, content) = validate_payload(title, content)?;
        let endpoint = self.endpoint()?;
        let result = self
            .http
            .post(endpoint)
            .header("accept", "application/json")
            .header("connect-protocol-version", "1")
            .bearer_auth(&self.api_key)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                warn!(%status, detail = %detail, "failed to notify owner");
                Ok(false)
            }
            Err(e) => {
                warn!("error calling notification service: {e}");
                Ok(false)
            }
        }
    }
}

/// Trim and bound the notification fields.
pub fn validate_payload<'a>(title: &'a str, content: &'a str) -> RpcResult<(&'a str, &'a str)> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() {
        return Err(RpcError::bad_request("Notification title is required."));
    }
    if content.is_empty() {
        return Err(RpcError::bad_request("Notification content is required."));
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(RpcError::bad_request(format!(
            "Notification title must be at most {TITLE_MAX_LENGTH} characters."
        )));
    }
    if content.chars().count() > CONTENT_MAX_LENGTH {
        return Err(RpcError::bad_request(format!(
            "Notification content must be at most {CONTENT_MAX_LENGTH} characters."
        )));
    }
    Ok((title, content))
}
