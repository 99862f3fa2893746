//! Free-form chat through the dialogue service.
//!
//! Each thread keeps the continuation token returned by the last successful turn so the
//! dialogue service can follow the conversation. Tokens are never evicted.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tracing::{debug, error, info, instrument};

use crate::base::types::{CurrentUser, DialogueRequest, IncomingMessage, Mentions, OutgoingMessage};

use super::Agent;

static CC_ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)cc:").expect("cc pattern is valid"));

/// Continuation tokens keyed by thread id.
#[derive(Debug, Default)]
pub struct ConversationContexts {
    by_thread: HashMap<i64, String>,
}

impl ConversationContexts {
    pub fn get(&self, thread_id: i64) -> Option<&str> {
        self.by_thread.get(&thread_id).map(String::as_str)
    }

    pub fn set(&mut self, thread_id: i64, token: String) {
        self.by_thread.insert(thread_id, token);
    }

    pub fn len(&self) -> usize {
        self.by_thread.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_thread.is_empty()
    }
}

/// Fixed persona sent along with every dialogue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub place: String,
    pub character: u32,
}

/// Builds the utterance for the dialogue service from a plain-text body.
///
/// Newlines become spaces, the bot's display name and any trailing `cc:` annotation are
/// removed, and the result is trimmed.
pub fn shape_utterance(plain: &str, bot_name: &str) -> String {
    let flat = plain.replace("\r\n", " ").replace('\n', " ");
    let without_name = if bot_name.is_empty() { flat } else { flat.replace(bot_name, "") };

    // Only the last `cc:` annotation is stripped.
    let end = CC_ANNOTATION_RE.find_iter(&without_name).last().map_or(without_name.len(), |m| m.start());

    without_name[..end].trim().to_string()
}

impl Agent {
    /// Answers a message that matched no command.
    ///
    /// Nothing is posted when the utterance is empty or the dialogue call fails; a failed
    /// call also leaves the thread's context untouched.
    #[instrument(skip_all, fields(thread_id = message.thread_id))]
    pub(crate) async fn chat_fallback(&mut self, message: &IncomingMessage, mentions: &Mentions, me: &CurrentUser) {
        let Some(dialogue) = self.dialogue.clone() else {
            return;
        };

        let thread_id = message.thread_id;
        let utterance = shape_utterance(&message.body.plain, &me.full_name);

        if utterance.is_empty() {
            debug!("ThreadId:{} -> empty utterance, not calling dialogue", thread_id);
            return;
        }

        let request = DialogueRequest {
            utterance,
            place: self.persona.place.clone(),
            character: self.persona.character,
            nickname: mentions.sender_first_name.clone(),
            context: self.contexts.get(thread_id).map(str::to_string),
        };

        let reply = match dialogue.dialogue(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("ThreadId:{} -> dialogue failed: {:#}, message: '{}'", thread_id, err, request.utterance);
                return;
            }
        };

        info!("ThreadId:{} -> dialogue reply: '{}'", thread_id, reply.utterance);

        self.contexts.set(thread_id, reply.context);
        self.post(OutgoingMessage::reply(thread_id, reply.utterance)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_and_strips_name() {
        assert_eq!(shape_utterance("Mention Bot\nおはよう\nございます", "Mention Bot"), "おはよう ございます");
    }

    #[test]
    fn strips_trailing_cc_annotation() {
        assert_eq!(shape_utterance("Mention Bot 元気？\n\nCC: Alice Smith, Bob Jones", "Mention Bot"), "元気？");
        assert_eq!(shape_utterance("hello cc: someone", ""), "hello");
    }

    #[test]
    fn keeps_inner_cc_text() {
        assert_eq!(shape_utterance("Mention Bot what does cc: mean in mail?\n\nCC: Alice", "Mention Bot"), "what does cc: mean in mail?");
        assert_eq!(shape_utterance("send to abcc: later", ""), "send to abcc: later");
    }

    #[test]
    fn only_name_is_empty() {
        assert_eq!(shape_utterance("  Mention Bot \n", "Mention Bot"), "");
    }

    #[test]
    fn contexts_are_replaced_per_thread() {
        let mut contexts = ConversationContexts::default();

        contexts.set(1, "a".to_string());
        contexts.set(1, "b".to_string());
        contexts.set(2, "c".to_string());

        assert_eq!(contexts.get(1), Some("b"));
        assert_eq!(contexts.get(2), Some("c"));
        assert_eq!(contexts.get(3), None);
        assert_eq!(contexts.len(), 2);
    }
}
