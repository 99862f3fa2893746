//! Message handling for the mention-bot.
//!
//! This module turns feed batches into actions:
//! - Classifying messages and resolving mentions
//! - Dispatching commands against the mention group directory
//! - Falling back to the dialogue service for free-form chat
//!
//! All mutable state (the directory and the per-thread dialogue contexts) is owned by
//! [`Agent`], which is driven by a single consumer loop at a time.

pub mod classifier;
pub mod command;
pub mod dispatcher;
pub mod fallback;

use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{CurrentUser, IncomingMessage, MessageFeed, Reference},
    },
    directory::MentionDirectory,
    service::{chat::ChatClient, dialogue::DialogueClient},
};

use fallback::{ConversationContexts, Persona};

/// Owns the bot's state and the clients needed to act on it.
pub struct Agent {
    chat: ChatClient,
    dialogue: Option<DialogueClient>,
    directory: MentionDirectory,
    contexts: ConversationContexts,
    persona: Persona,
    marker: char,
}

impl Agent {
    /// Creates an agent. Without a dialogue client, unmatched messages are ignored.
    pub fn new(config: &Config, chat: ChatClient, dialogue: Option<DialogueClient>, directory: MentionDirectory) -> Self {
        Self {
            chat,
            dialogue,
            directory,
            contexts: ConversationContexts::default(),
            persona: Persona {
                place: config.fallback_place.clone(),
                character: config.fallback_character,
            },
            marker: config.group_marker,
        }
    }

    pub fn directory(&self) -> &MentionDirectory {
        &self.directory
    }

    pub fn contexts(&self) -> &ConversationContexts {
        &self.contexts
    }

    /// Handles every message of a feed batch, one at a time.
    #[instrument(skip_all, fields(messages = feed.messages.len()))]
    pub async fn receive_feed(&mut self, feed: &MessageFeed, me: &CurrentUser) {
        for message in &feed.messages {
            self.analyze(message, &feed.references, me).await;
        }
    }

    /// Classifies a message and dispatches it when it is directed at the bot.
    pub async fn analyze(&mut self, message: &IncomingMessage, references: &[Reference], me: &CurrentUser) {
        info!("ThreadId:{} -> receiveMessage: \"{}\"", message.thread_id, message.body.parsed);

        if let Some(mentions) = classifier::classify(message, references, me) {
            self.dispatch(message, &mentions, me).await;
        }
    }
}
