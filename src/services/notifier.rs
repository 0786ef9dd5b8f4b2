use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use crate::config::NotifierSettings;
use crate::models::MatchNotification;

/// Errors that can occur when delivering notifications
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),
}

/// Outbound channel for match notifications and realtime events
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Persisted "you have a new match" notification for `user_id`
    async fn notify_match(&self, user_id: &str, notification: &MatchNotification) -> Result<(), NotifyError>;

    /// Realtime push of a named event to every session of `user_id`
    async fn push_to_user(&self, user_id: &str, event: &str, payload: Value) -> Result<(), NotifyError>;
}

/// Notifier that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_match(&self, user_id: &str, notification: &MatchNotification) -> Result<(), NotifyError> {
        tracing::trace!("Dropping match notification {} for {}", notification.match_id, user_id);
        Ok(())
    }

    async fn push_to_user(&self, user_id: &str, event: &str, _payload: Value) -> Result<(), NotifyError> {
        tracing::trace!("Dropping {} event for {}", event, user_id);
        Ok(())
    }
}

/// Notification gateway client
///
/// - `POST {base}/users/{id}/notifications` stores a match notification
/// - `POST {base}/users/{id}/events` fans an event out to live sessions
pub struct HttpNotifier {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpNotifier {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// `None` when no endpoint is configured
    pub fn from_settings(settings: &NotifierSettings) -> Result<Option<Self>, NotifyError> {
        settings
            .endpoint
            .as_ref()
            .map(|endpoint| {
                Self::new(
                    endpoint.clone(),
                    settings.api_key.clone(),
                    Duration::from_secs(settings.timeout_secs),
                )
            })
            .transpose()
    }

    fn user_url(&self, user_id: &str, resource: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.base_url,
            urlencoding::encode(user_id),
            resource
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<(), NotifyError> {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::ApiError(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_match(&self, user_id: &str, notification: &MatchNotification) -> Result<(), NotifyError> {
        let body = json!({
            "type": "match",
            "data": notification,
        });

        self.post(&self.user_url(user_id, "notifications"), &body).await?;
        tracing::debug!("Delivered match notification {} to {}", notification.match_id, user_id);
        Ok(())
    }

    async fn push_to_user(&self, user_id: &str, event: &str, payload: Value) -> Result<(), NotifyError> {
        let body = json!({
            "event": event,
            "payload": payload,
        });

        self.post(&self.user_url(user_id, "events"), &body).await?;
        tracing::debug!("Pushed {} to {}", event, user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url_encodes_id() {
        let notifier = HttpNotifier::new(
            "https://notify.test/v1/".to_string(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            notifier.user_url("user 1/2", "events"),
            "https://notify.test/v1/users/user%201%2F2/events"
        );
    }

    #[test]
    fn test_from_settings_without_endpoint() {
        let settings = NotifierSettings::default();
        assert!(HttpNotifier::from_settings(&settings).unwrap().is_none());
    }
}
