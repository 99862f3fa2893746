//! Decides whether a message is addressed to the bot and who it mentions.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::base::types::{CurrentUser, IncomingMessage, Mentions, Reference, User};

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[user:(\d+)\]\]").expect("mention pattern is valid"));

/// Notices the platform writes on its own when someone adds the bot to a conversation.
/// `{me}` stands for the bot's reference.
const BOILERPLATE: &[&str] = &["has added {me} to the conversation", "added {me} to this conversation"];

/// Classifies a message against the batch's reference table.
///
/// Returns `None` unless the message references the bot. Messages sent by the bot itself
/// are never directed at it.
pub fn classify(message: &IncomingMessage, references: &[Reference], me: &CurrentUser) -> Option<Mentions> {
    if message.sender_id == me.id {
        debug!("ThreadId:{} -> skipping own message", message.thread_id);
        return None;
    }

    let body = strip_boilerplate(&message.body.parsed, me.id);
    let ids = extract_user_ids(&body);

    if !ids.contains(&me.id) {
        return None;
    }

    let mentioned = ids.into_iter().filter(|id| *id != me.id).map(|id| resolve_user(id, references)).collect();

    let sender_ref = find_user_reference(message.sender_id, references);
    let sender = User::new(message.sender_id, sender_ref.map(|r| r.full_name.as_str()).unwrap_or_default());
    let sender_first_name = sender_ref.map(|r| r.first_name.clone()).unwrap_or_default();

    Some(Mentions {
        mentioned,
        directed_at_self: true,
        sender,
        sender_first_name,
    })
}

/// Removes platform-generated notices that reference the bot.
pub fn strip_boilerplate(body: &str, self_id: i64) -> String {
    let me = format!("[[user:{self_id}]]");

    BOILERPLATE.iter().fold(body.to_string(), |acc, template| acc.replace(&template.replace("{me}", &me), ""))
}

/// All `[[user:<id>]]` references in order of appearance.
pub fn extract_user_ids(body: &str) -> Vec<i64> {
    MENTION_RE.captures_iter(body).filter_map(|c| c.get(1)).filter_map(|m| m.as_str().parse().ok()).collect()
}

/// Resolves a user id to a `User`, falling back to an empty name.
pub fn resolve_user(id: i64, references: &[Reference]) -> User {
    let name = find_user_reference(id, references).map(|r| r.full_name.clone()).unwrap_or_default();
    User::new(id, name)
}

fn find_user_reference(id: i64, references: &[Reference]) -> Option<&Reference> {
    references.iter().find(|r| r.id == id && (r.kind.is_empty() || r.kind == "user"))
}

#[cfg(test)]
mod tests {
    use crate::base::types::MessageBody;

    use super::*;

    const ME: i64 = 100;

    fn me() -> CurrentUser {
        CurrentUser {
            id: ME,
            full_name: "Mention Bot".to_string(),
            first_name: "Mention".to_string(),
        }
    }

    fn user_ref(id: i64, full_name: &str, first_name: &str) -> Reference {
        Reference {
            kind: "user".to_string(),
            id,
            full_name: full_name.to_string(),
            first_name: first_name.to_string(),
        }
    }

    fn message(sender_id: i64, parsed: &str) -> IncomingMessage {
        IncomingMessage {
            id: 1,
            thread_id: 10,
            sender_id,
            body: MessageBody {
                plain: String::new(),
                parsed: parsed.to_string(),
            },
            direct_message: false,
        }
    }

    #[test]
    fn extracts_ids_in_order() {
        assert_eq!(extract_user_ids("[[user:3]] hi [[user:1]] and [[user:3]]"), vec![3, 1, 3]);
        assert!(extract_user_ids("[[user:]] [[group:5]]").is_empty());
    }

    #[test]
    fn directed_message_excludes_self() {
        let refs = vec![user_ref(1, "Alice Smith", "Alice"), user_ref(2, "Bob Jones", "Bob"), user_ref(5, "Sender Person", "Sender")];
        let msg = message(5, "[[user:100]] %eng 追加 [[user:1]] [[user:2]]");

        let mentions = classify(&msg, &refs, &me()).unwrap();

        assert!(mentions.directed_at_self);
        assert_eq!(mentions.mentioned, vec![User::new(1, "Alice Smith"), User::new(2, "Bob Jones")]);
        assert_eq!(mentions.sender, User::new(5, "Sender Person"));
        assert_eq!(mentions.sender_first_name, "Sender");
    }

    #[test]
    fn unresolved_ids_get_empty_names() {
        let msg = message(5, "[[user:100]] [[user:7]]");

        let mentions = classify(&msg, &[], &me()).unwrap();

        assert_eq!(mentions.mentioned, vec![User::new(7, "")]);
        assert_eq!(mentions.sender, User::new(5, ""));
        assert_eq!(mentions.sender_first_name, "");
    }

    #[test]
    fn non_user_references_do_not_resolve() {
        let refs = vec![Reference {
            kind: "thread".to_string(),
            id: 7,
            full_name: "not a user".to_string(),
            first_name: String::new(),
        }];

        assert_eq!(resolve_user(7, &refs), User::new(7, ""));
    }

    #[test]
    fn undirected_message_is_dropped() {
        let msg = message(5, "[[user:1]] %eng 追加");

        assert!(classify(&msg, &[], &me()).is_none());
    }

    #[test]
    fn own_messages_are_dropped() {
        let msg = message(ME, "[[user:100]] %eng にccします");

        assert!(classify(&msg, &[], &me()).is_none());
    }

    #[test]
    fn added_to_conversation_notice_is_not_a_mention() {
        let msg = message(5, "[[user:5]] has added [[user:100]] to the conversation");

        assert!(classify(&msg, &[], &me()).is_none());
    }
}
