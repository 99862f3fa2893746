pub mod docomo;

use crate::base::types::{DialogueReply, DialogueRequest, Res};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

// Traits.

/// Generic dialogue client trait that clients must implement.
///
/// The dialogue service answers free-form chat that matched no command. It keeps
/// multi-turn state through an opaque context token that the caller hands back on the
/// next turn.
#[async_trait]
pub trait GenericDialogueClient: Send + Sync + 'static {
    /// Produce a reply to the utterance in the request.
    async fn dialogue(&self, request: &DialogueRequest) -> Res<DialogueReply>;
}

// Structs.

/// Dialogue client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DialogueClient {
    inner: Arc<dyn GenericDialogueClient>,
}

impl Deref for DialogueClient {
    type Target = dyn GenericDialogueClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DialogueClient {
    pub fn new(inner: Arc<dyn GenericDialogueClient>) -> Self {
        Self { inner }
    }
}
