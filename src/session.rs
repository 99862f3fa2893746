//! The realtime feed session.
//!
//! A session resolves the feed descriptor and the bot's identity, handshakes, subscribes
//! to the inbox feed and then runs a poll worker that pushes envelopes into a bounded
//! queue. The consumer side drains the queue on the caller's task, so all directory and
//! context mutations happen on one task only.
//!
//! When the stop signal fires, envelopes already in the queue are still drained before
//! the session ends, but an envelope the worker was holding at that moment is dropped.

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{Instrument, debug, info, instrument, warn};

use crate::{
    base::types::{Envelope, MessageFeed, Void},
    interaction::Agent,
    service::{
        chat::ChatClient,
        feed::{FeedChannel, FeedClient},
    },
};

/// Capacity of the queue between the poll worker and the consumer.
pub const QUEUE_CAPACITY: usize = 10;

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Handshaking,
    Subscribed,
    Polling,
}

/// A single realtime feed session.
pub struct FeedSession {
    chat: ChatClient,
    feed: FeedClient,
    state: SessionState,
    reached_polling: bool,
}

impl FeedSession {
    pub fn new(chat: ChatClient, feed: FeedClient) -> Self {
        Self {
            chat,
            feed,
            state: SessionState::Disconnected,
            reached_polling: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session got as far as polling before it ended.
    pub fn reached_polling(&self) -> bool {
        self.reached_polling
    }

    fn transition(&mut self, state: SessionState) {
        debug!("Session {:?} -> {:?}", self.state, state);
        self.state = state;
        if state == SessionState::Polling {
            self.reached_polling = true;
        }
    }

    /// Runs the session until the poll worker stops.
    ///
    /// `on_polling` is called once the poll worker has started. Returns the error that
    /// ended the session, if any. The state is always `Disconnected` afterwards.
    #[instrument(name = "FeedSession::run", skip_all)]
    pub async fn run(&mut self, agent: &mut Agent, stop: watch::Receiver<bool>, on_polling: impl FnOnce()) -> Void {
        let result = self.run_internal(agent, stop, on_polling).await;
        self.transition(SessionState::Disconnected);
        result
    }

    async fn run_internal(&mut self, agent: &mut Agent, stop: watch::Receiver<bool>, on_polling: impl FnOnce()) -> Void {
        let descriptor = self.chat.realtime().await?;
        let me = self.chat.current_user().await?;
        let channel_id = self.chat.inbox_channel().await?;

        self.transition(SessionState::Handshaking);
        let channel = self.feed.handshake(&descriptor).await?;
        channel.subscribe(&channel_id).await?;
        self.transition(SessionState::Subscribed);

        let (queue, mut envelopes) = mpsc::channel(QUEUE_CAPACITY);
        let worker: JoinHandle<Void> = tokio::spawn(poll(channel, queue, stop).in_current_span());

        info!("Polling realtime channel ID: {}", channel_id);
        self.transition(SessionState::Polling);
        on_polling();

        while let Some(envelope) = envelopes.recv().await {
            if let Some(feed) = accept(envelope) {
                agent.receive_feed(&feed, &me).await;
            }
        }

        // The queue only closes once the worker has returned, so this join is immediate.
        worker.await.map_err(|e| anyhow::anyhow!("Poll worker panicked: {}", e))?
    }
}

/// The poll worker: long-polls the channel and queues every envelope.
///
/// Returns `Ok` on a stop signal or when the consumer went away, and the transport
/// error otherwise. Dropping `queue` on return closes the consumer's loop.
async fn poll(channel: FeedChannel, queue: mpsc::Sender<Envelope>, mut stop: watch::Receiver<bool>) -> Void {
    loop {
        if *stop.borrow() {
            return Ok(());
        }

        let batch = tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => return Ok(()),
            batch = channel.connect() => batch?,
        };

        for envelope in batch {
            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => return Ok(()),
                sent = queue.send(envelope) => {
                    if sent.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Resolves once `stop` reads `true`.
///
/// Writes of `false` are ignored, and a dropped sender never requests a stop.
pub(crate) async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let result = stop.wait_for(|stopped| *stopped).await.map(|_| ());

    if result.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Filters control and malformed envelopes, returning the feed to process.
pub fn accept(envelope: Envelope) -> Option<MessageFeed> {
    if envelope.channel.starts_with("/meta/") {
        return None;
    }

    let Some(data) = envelope.data else {
        warn!("Envelope carries no data. channel:{}", envelope.channel);
        return None;
    };

    if data.kind != "message" {
        warn!("Data.Type is not message. channel:{} type:{}", envelope.channel, data.kind);
        return None;
    }

    if data.feed.is_none() {
        warn!("Data.Feed is nil. channel:{}", envelope.channel);
    }

    data.feed
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;

    use crate::{
        base::types::{EnvelopeData, MessageFeed, Res},
        service::feed::GenericFeedChannel,
    };

    use super::*;

    /// Returns empty batches, then fails on the given call.
    struct FailingChannel {
        calls: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl GenericFeedChannel for FailingChannel {
        async fn subscribe(&self, _channel_id: &str) -> Void {
            Ok(())
        }

        async fn connect(&self) -> Res<Vec<Envelope>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;

            if call == self.fail_on { Err(anyhow::anyhow!("connection reset")) } else { Ok(Vec::new()) }
        }
    }

    #[tokio::test]
    async fn false_is_not_a_stop() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(false).unwrap();

        assert!(tokio::time::timeout(Duration::from_millis(20), stop_requested(&mut rx)).await.is_err());

        tx.send(true).unwrap();

        assert!(tokio::time::timeout(Duration::from_millis(20), stop_requested(&mut rx)).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_sender_is_not_a_stop() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        assert!(tokio::time::timeout(Duration::from_millis(20), stop_requested(&mut rx)).await.is_err());
    }

    #[tokio::test]
    async fn worker_keeps_polling_without_a_stop_sender() {
        let inner = Arc::new(FailingChannel {
            calls: AtomicUsize::new(0),
            fail_on: 3,
        });
        let channel = FeedChannel::new(inner.clone());
        let (queue, _envelopes) = mpsc::channel(QUEUE_CAPACITY);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let result = poll(channel, queue, rx).await;

        assert!(result.unwrap_err().to_string().contains("connection reset"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    fn envelope(channel: &str, data: Option<EnvelopeData>) -> Envelope {
        Envelope {
            channel: channel.to_string(),
            successful: None,
            data,
        }
    }

    #[test]
    fn meta_envelopes_are_discarded() {
        let data = EnvelopeData {
            kind: "message".to_string(),
            feed: Some(MessageFeed::default()),
        };

        assert!(accept(envelope("/meta/connect", Some(data))).is_none());
    }

    #[test]
    fn non_message_payloads_are_discarded() {
        let data = EnvelopeData {
            kind: "like".to_string(),
            feed: Some(MessageFeed::default()),
        };

        assert!(accept(envelope("/feeds/abc/primary", Some(data))).is_none());
        assert!(accept(envelope("/feeds/abc/primary", None)).is_none());
    }

    #[test]
    fn missing_feed_is_discarded() {
        let data = EnvelopeData {
            kind: "message".to_string(),
            feed: None,
        };

        assert!(accept(envelope("/feeds/abc/primary", Some(data))).is_none());
    }

    #[test]
    fn message_feeds_are_forwarded() {
        let data = EnvelopeData {
            kind: "message".to_string(),
            feed: Some(MessageFeed::default()),
        };

        assert_eq!(accept(envelope("/feeds/abc/primary", Some(data))), Some(MessageFeed::default()));
    }
}
