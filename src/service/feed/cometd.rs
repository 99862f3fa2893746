//! Bayeux (CometD) long-polling implementation of the realtime feed.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::base::types::{Envelope, RealtimeDescriptor, Res, Void};

use super::{FeedChannel, FeedClient, GenericFeedChannel, GenericFeedConnector};

const HANDSHAKE_CHANNEL: &str = "/meta/handshake";
const SUBSCRIBE_CHANNEL: &str = "/meta/subscribe";
const CONNECT_CHANNEL: &str = "/meta/connect";

// Extra methods on `FeedClient` applied by the cometd implementation.

impl FeedClient {
    /// Creates a new CometD feed connector.
    pub fn cometd() -> Self {
        Self::new(Arc::new(CometdConnector::new()))
    }
}

/// Reply to a Bayeux meta message.
#[derive(Debug, Deserialize)]
struct MetaReply {
    channel: String,
    #[serde(default)]
    successful: bool,
    #[serde(rename = "clientId", default)]
    client_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl MetaReply {
    fn ensure_successful(&self) -> Void {
        if self.successful {
            return Ok(());
        }

        Err(anyhow::anyhow!("{} failed: {}", self.channel, self.error.as_deref().unwrap_or("no reason given")))
    }
}

/// Performs Bayeux handshakes.
#[derive(Clone, Default)]
pub struct CometdConnector {
    http: reqwest::Client,
}

impl CometdConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenericFeedConnector for CometdConnector {
    #[instrument(name = "CometdConnector::handshake", skip_all, fields(uri = %descriptor.realtime_uri))]
    async fn handshake(&self, descriptor: &RealtimeDescriptor) -> Res<FeedChannel> {
        let request = json!([{
            "ext": { "token": descriptor.authentication_token, "push_message_bodies": "false" },
            "version": "1.0",
            "minimumVersion": "0.9",
            "channel": HANDSHAKE_CHANNEL,
            "supportedConnectionTypes": ["long-polling"],
            "id": "1",
        }]);

        let replies: Vec<MetaReply> = post(&self.http, &descriptor.realtime_uri, &request).await?;
        let reply = replies.iter().find(|r| r.channel == HANDSHAKE_CHANNEL).ok_or_else(|| anyhow::anyhow!("Handshake response carried no handshake reply."))?;
        reply.ensure_successful()?;

        let client_id = reply.client_id.clone().ok_or_else(|| anyhow::anyhow!("Handshake reply carried no client id."))?;

        debug!("Handshake complete, client id {}", client_id);

        Ok(FeedChannel::new(Arc::new(CometdChannel {
            http: self.http.clone(),
            uri: descriptor.realtime_uri.clone(),
            client_id,
            next_id: AtomicU64::new(2),
        })))
    }
}

/// A Bayeux client session.
pub struct CometdChannel {
    http: reqwest::Client,
    uri: String,
    client_id: String,
    next_id: AtomicU64,
}

impl CometdChannel {
    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[async_trait]
impl GenericFeedChannel for CometdChannel {
    #[instrument(name = "CometdChannel::subscribe", skip(self))]
    async fn subscribe(&self, channel_id: &str) -> Void {
        let request: Vec<Value> = ["primary", "secondary"]
            .iter()
            .map(|suffix| {
                json!({
                    "channel": SUBSCRIBE_CHANNEL,
                    "subscription": format!("/feeds/{channel_id}/{suffix}"),
                    "clientId": self.client_id,
                    "id": self.next_id(),
                })
            })
            .collect();

        let replies: Vec<MetaReply> = post(&self.http, &self.uri, &request).await?;
        for reply in replies.iter().filter(|r| r.channel == SUBSCRIBE_CHANNEL) {
            reply.ensure_successful()?;
        }

        Ok(())
    }

    #[instrument(name = "CometdChannel::connect", skip_all)]
    async fn connect(&self) -> Res<Vec<Envelope>> {
        let request = json!([{
            "channel": CONNECT_CHANNEL,
            "connectionType": "long-polling",
            "clientId": self.client_id,
            "id": self.next_id(),
        }]);

        let raw: Vec<Value> = post(&self.http, &self.uri, &request).await?;

        parse_envelopes(raw)
    }
}

/// Turns a connect response into envelopes.
///
/// Envelopes that do not parse are skipped; an unsuccessful connect reply means the
/// server dropped the client session.
fn parse_envelopes(raw: Vec<Value>) -> Res<Vec<Envelope>> {
    let mut envelopes = Vec::with_capacity(raw.len());

    for value in raw {
        match serde_json::from_value::<Envelope>(value) {
            Ok(envelope) => {
                if envelope.channel == CONNECT_CHANNEL && envelope.successful == Some(false) {
                    return Err(anyhow::anyhow!("Realtime server rejected the connect request."));
                }
                envelopes.push(envelope);
            }
            Err(err) => warn!("Skipping malformed envelope: {}", err),
        }
    }

    Ok(envelopes)
}

async fn post<T: serde::de::DeserializeOwned>(http: &reqwest::Client, uri: &str, body: &impl serde::Serialize) -> Res<T> {
    let response = http.post(uri).json(body).send().await?.error_for_status()?;

    Ok(response.json::<T>().await?)
}
