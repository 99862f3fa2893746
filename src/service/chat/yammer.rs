//! Yammer REST implementation of the chat client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{CurrentUser, OutgoingMessage, RealtimeDescriptor, Res},
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the yammer implementation.

impl ChatClient {
    /// Creates a new Yammer chat client.
    pub fn yammer(config: &Config, access_token: &str) -> Self {
        let client = YammerChatClient::new(config, access_token);
        Self { inner: Arc::new(client) }
    }
}

// Response types.

#[derive(Debug, Deserialize)]
struct PostedMessages {
    #[serde(default)]
    messages: Vec<PostedMessage>,
}

#[derive(Debug, Deserialize)]
struct PostedMessage {
    id: i64,
}

// Specific implementations.

/// Yammer client implementation.
#[derive(Clone)]
pub struct YammerChatClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl YammerChatClient {
    /// Create a new Yammer chat client.
    #[instrument(name = "YammerChatClient::new", skip_all)]
    pub fn new(config: &Config, access_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.yammer_api_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Res<T> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to request {}: {}", path, e))?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl GenericChatClient for YammerChatClient {
    #[instrument(skip(self))]
    async fn realtime(&self) -> Res<RealtimeDescriptor> {
        self.get_json("realtime.json").await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Res<CurrentUser> {
        let user: CurrentUser = self.get_json("users/current.json").await?;

        info!("Yammer bot user ID: {}", user.id);

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn inbox_channel(&self) -> Res<String> {
        let inbox: Value = self.get_json("messages/inbox.json?limit=1").await?;

        channel_id_from_feed(&inbox)
    }

    #[instrument(skip(self, message), fields(replied_to_id = message.replied_to_id))]
    async fn post_message(&self, message: &OutgoingMessage) -> Res<i64> {
        let response = self
            .http
            .post(self.url("messages.json"))
            .bearer_auth(&self.access_token)
            .json(message)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?
            .error_for_status()?;

        let posted: PostedMessages = response.json().await?;

        posted.messages.first().map(|m| m.id).ok_or_else(|| anyhow::anyhow!("Posted message response carried no message."))
    }
}

/// Pulls `meta.realtime.channel_id` out of a feed response.
///
/// The id is usually a string but numeric ids are accepted as well.
fn channel_id_from_feed(feed: &Value) -> Res<String> {
    match feed.pointer("/meta/realtime/channel_id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(anyhow::anyhow!("Inbox feed response carried no realtime channel id.")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn channel_id_accepts_strings_and_numbers() {
        assert_eq!(channel_id_from_feed(&json!({"meta": {"realtime": {"channel_id": "MTox"}}})).unwrap(), "MTox");
        assert_eq!(channel_id_from_feed(&json!({"meta": {"realtime": {"channel_id": 42}}})).unwrap(), "42");
    }

    #[test]
    fn channel_id_missing_is_an_error() {
        assert!(channel_id_from_feed(&json!({"meta": {}})).is_err());
        assert!(channel_id_from_feed(&json!({"meta": {"realtime": {"channel_id": ""}}})).is_err());
    }

    #[test]
    fn outgoing_message_omits_empty_recipients() {
        let message = OutgoingMessage::reply(5, "hello");

        assert_eq!(serde_json::to_value(&message).unwrap(), json!({"body": "hello", "replied_to_id": 5}));
    }

    #[test]
    fn realtime_descriptor_parses() {
        let descriptor: RealtimeDescriptor = serde_json::from_value(json!({
            "realtimeURI": "https://rt.example/cometd/",
            "authentication_token": "abc",
        }))
        .unwrap();

        assert_eq!(descriptor.realtime_uri, "https://rt.example/cometd/");
        assert_eq!(descriptor.authentication_token, "abc");
    }
}
