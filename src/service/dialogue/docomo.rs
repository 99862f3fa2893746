//! docomo dialogue API implementation of the dialogue client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::base::{
    config::Config,
    types::{DialogueReply, DialogueRequest, Res},
};

use super::{DialogueClient, GenericDialogueClient};

// Extra methods on `DialogueClient` applied by the docomo implementation.

impl DialogueClient {
    pub fn docomo(config: &Config, api_key: &str) -> Self {
        let client = DocomoDialogueClient::new(config, api_key);
        Self { inner: Arc::new(client) }
    }
}

// Wire types.

#[derive(Debug, Serialize)]
struct DocomoRequest<'a> {
    utt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
    nickname: &'a str,
    place: &'a str,
    t: u32,
}

impl<'a> From<&'a DialogueRequest> for DocomoRequest<'a> {
    fn from(request: &'a DialogueRequest) -> Self {
        Self {
            utt: &request.utterance,
            context: request.context.as_deref(),
            nickname: &request.nickname,
            place: &request.place,
            t: request.character,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocomoResponse {
    utt: String,
    #[serde(default)]
    context: String,
}

// Specific implementations.

/// docomo dialogue client implementation.
#[derive(Clone)]
pub struct DocomoDialogueClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl DocomoDialogueClient {
    /// Create a new docomo dialogue client.
    #[instrument(name = "DocomoDialogueClient::new", skip_all)]
    pub fn new(config: &Config, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.docomo_dialogue_url.clone(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl GenericDialogueClient for DocomoDialogueClient {
    #[instrument(name = "DocomoDialogueClient::dialogue", skip_all)]
    async fn dialogue(&self, request: &DialogueRequest) -> Res<DialogueReply> {
        let response = self
            .http
            .post(&self.url)
            .query(&[("APIKEY", self.api_key.as_str())])
            .json(&DocomoRequest::from(request))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to call dialogue API: {}", e))?
            .error_for_status()?;

        let body: DocomoResponse = response.json().await?;

        Ok(DialogueReply {
            utterance: body.utt,
            context: body.context,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_omits_missing_context() {
        let request = DialogueRequest {
            utterance: "こんにちは".to_string(),
            place: "東京".to_string(),
            character: 20,
            nickname: "太郎".to_string(),
            context: None,
        };

        let value = serde_json::to_value(DocomoRequest::from(&request)).unwrap();

        assert_eq!(value, json!({"utt": "こんにちは", "nickname": "太郎", "place": "東京", "t": 20}));
    }

    #[test]
    fn request_carries_context() {
        let request = DialogueRequest {
            context: Some("ctx-1".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(DocomoRequest::from(&request)).unwrap();

        assert_eq!(value["context"], "ctx-1");
    }
}
