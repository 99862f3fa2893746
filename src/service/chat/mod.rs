use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{CurrentUser, OutgoingMessage, RealtimeDescriptor, Res};

pub mod yammer;

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines what the bot needs from the messaging platform: where its realtime
/// feed lives, who the bot is, and a way to post replies.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the realtime descriptor (feed URI and authentication token).
    async fn realtime(&self) -> Res<RealtimeDescriptor>;

    /// Get the identity of the bot user.
    ///
    /// The id is used to detect messages directed at the bot; the full name is removed
    /// from utterances passed to the dialogue service.
    async fn current_user(&self) -> Res<CurrentUser>;

    /// Get the realtime channel id of the bot's inbox feed.
    async fn inbox_channel(&self) -> Res<String>;

    /// Post a message and return the id assigned by the platform.
    async fn post_message(&self, message: &OutgoingMessage) -> Res<i64>;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
