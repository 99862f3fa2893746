use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Envelope, RealtimeDescriptor, Res, Void};

pub mod cometd;

// Traits.

/// Generic realtime feed connector.
///
/// A connector performs the handshake and hands back a channel bound to the negotiated
/// client session.
#[async_trait]
pub trait GenericFeedConnector: Send + Sync + 'static {
    /// Perform the handshake against the realtime endpoint.
    async fn handshake(&self, descriptor: &RealtimeDescriptor) -> Res<FeedChannel>;
}

/// A handshaken realtime session.
#[async_trait]
pub trait GenericFeedChannel: Send + Sync + 'static {
    /// Subscribe the session to the feed with the given channel id.
    async fn subscribe(&self, channel_id: &str) -> Void;

    /// Hold one long-poll request open and return the envelopes it delivered.
    ///
    /// An error is fatal for the session; the caller has to handshake again.
    async fn connect(&self) -> Res<Vec<Envelope>>;
}

// Structs.

/// Feed connector for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct FeedClient {
    inner: Arc<dyn GenericFeedConnector>,
}

impl Deref for FeedClient {
    type Target = dyn GenericFeedConnector;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl FeedClient {
    pub fn new(inner: Arc<dyn GenericFeedConnector>) -> Self {
        Self { inner }
    }
}

/// A handshaken feed session, shareable with the poll worker.
#[derive(Clone)]
pub struct FeedChannel {
    inner: Arc<dyn GenericFeedChannel>,
}

impl Deref for FeedChannel {
    type Target = dyn GenericFeedChannel;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl FeedChannel {
    pub fn new(inner: Arc<dyn GenericFeedChannel>) -> Self {
        Self { inner }
    }
}
