//! Runs the command a directed message asks for and posts the reply.

use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        replies,
        types::{CurrentUser, IncomingMessage, MentionGroup, Mentions, OutgoingMessage, User},
    },
    directory::{Change, Report},
};

use super::{
    Agent,
    command::{Action, group_tokens, select_action, tokenize},
};

impl Agent {
    /// Dispatches a directed message.
    ///
    /// Every command produces exactly one reply. Directory changes are kept even when the
    /// reply cannot be posted.
    #[instrument(skip_all, fields(thread_id = message.thread_id))]
    pub async fn dispatch(&mut self, message: &IncomingMessage, mentions: &Mentions, me: &CurrentUser) {
        let text = &message.body.parsed;
        let thread_id = message.thread_id;

        let Some(action) = select_action(text, self.dialogue.is_some()) else {
            debug!("ThreadId:{} -> unknown: {}", thread_id, text);
            return;
        };

        let tokens = tokenize(text);
        let groups = group_tokens(&tokens, self.marker);

        info!("ThreadId:{} -> {:?} groups:{:?} mentioned:{:?}", thread_id, action, groups, mentions.mentioned);

        if groups.len() < action.group_tokens_needed() {
            let hint = match action {
                Action::Rename => replies::rename_requires_two(self.marker),
                _ => replies::group_required(self.marker),
            };
            self.post(OutgoingMessage::reply(thread_id, hint)).await;
            return;
        }

        let reply = match action {
            Action::Chat => return self.chat_fallback(message, mentions, me).await,
            Action::Add => report_reply(thread_id, self.directory.add_members(groups[0], &mentions.mentioned)),
            Action::RemoveMembers => report_reply(thread_id, self.directory.remove_members(groups[0], &mentions.mentioned)),
            Action::DeleteGroup => report_reply(thread_id, self.directory.delete_group(groups[0])),
            Action::Rename => report_reply(thread_id, self.directory.rename(groups[0], groups[1])),
            Action::Show => show_reply(thread_id, groups[0], self.directory.show(groups[0])),
            Action::ShowAll => show_all_reply(thread_id, self.directory.show_all()),
            Action::Cc => cc_reply(message, groups[0], self.directory.show(groups[0])),
        };

        self.post(reply).await;
    }

    /// Posts a reply, logging failures. Nothing is retried.
    pub(crate) async fn post(&self, message: OutgoingMessage) {
        if let Err(err) = self.chat.post_message(&message).await {
            error!("ThreadId:{} -> failed to post reply: {:#}", message.replied_to_id, err);
        }
    }
}

fn report_reply(thread_id: i64, report: Report) -> OutgoingMessage {
    let mut body = match &report.change {
        Change::Created(group) => replies::created(&group.name) + &replies::members_updated(&group.name, &name_join(&group.members)),
        Change::Updated(group) => replies::members_updated(&group.name, &name_join(&group.members)),
        Change::Deleted(name) => replies::deleted(name),
        Change::Renamed { from, group } => replies::renamed(from, &group.name),
        Change::NotFound(name) => replies::not_found(name),
    };

    if let Some(err) = &report.persist_error {
        body.push_str(&replies::persist_failed(err));
    }

    OutgoingMessage::reply(thread_id, body)
}

fn show_reply(thread_id: i64, name: &str, group: Option<&MentionGroup>) -> OutgoingMessage {
    let body = match group {
        Some(group) => replies::members_are(name, &name_join(&group.members)),
        None => replies::not_found(name),
    };

    OutgoingMessage::reply(thread_id, body)
}

fn show_all_reply<'a>(thread_id: i64, groups: impl Iterator<Item = &'a MentionGroup>) -> OutgoingMessage {
    let lines: Vec<String> = groups.map(|g| replies::listing_line(&g.name, &name_join(&g.members))).collect();

    let body = if lines.is_empty() {
        replies::listing_empty()
    } else {
        format!("{}\n{}", replies::listing_header(), lines.join("\n"))
    };

    OutgoingMessage::reply(thread_id, body)
}

/// Builds a cc broadcast. Direct messages also address every member directly.
fn cc_reply(message: &IncomingMessage, name: &str, group: Option<&MentionGroup>) -> OutgoingMessage {
    let Some(group) = group else {
        return OutgoingMessage::reply(message.thread_id, replies::not_found(name));
    };

    let mut reply = OutgoingMessage::reply(message.thread_id, replies::cc(name));

    if !group.members.is_empty() {
        reply.cc = Some(reference_join(&group.members));
        if message.direct_message {
            reply.direct_to_user_ids = Some(id_join(&group.members));
        }
    }

    reply
}

fn name_join(users: &[User]) -> String {
    users.iter().map(|u| u.name.as_str()).collect::<Vec<_>>().join(",")
}

fn reference_join(users: &[User]) -> String {
    users.iter().map(|u| format!("[[user:{}]]", u.id)).collect::<Vec<_>>().join(",")
}

fn id_join(users: &[User]) -> String {
    users.iter().map(|u| u.id.to_string()).collect::<Vec<_>>().join(",")
}
