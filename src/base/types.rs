use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Directory types.

/// A user as stored in a mention group.
///
/// Identity is the `id`; the `name` is only for display and may be stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl User {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// A named list of users addressable by a single marker token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<User>,
}

// Platform types.

/// The bot's own identity on the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub first_name: String,
}

/// Where (and with what token) the realtime feed can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealtimeDescriptor {
    #[serde(rename = "realtimeURI")]
    pub realtime_uri: String,
    pub authentication_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub plain: String,
    #[serde(default)]
    pub parsed: String,
}

/// A single message event delivered by the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: i64,
    pub thread_id: i64,
    pub sender_id: i64,
    #[serde(default)]
    pub body: MessageBody,
    #[serde(default)]
    pub direct_message: bool,
}

/// An entry of the reference table delivered alongside a batch of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Reference {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub first_name: String,
}

/// A batch of messages and the references needed to resolve them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageFeed {
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvelopeData {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub feed: Option<MessageFeed>,
}

/// A single message pushed by the realtime feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    pub channel: String,
    #[serde(default)]
    pub successful: Option<bool>,
    #[serde(default)]
    pub data: Option<EnvelopeData>,
}

/// The result of classifying a message that is addressed to the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mentions {
    /// Everyone referenced in the message except the bot itself.
    pub mentioned: Vec<User>,
    pub directed_at_self: bool,
    pub sender: User,
    pub sender_first_name: String,
}

/// A reply to be posted in a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub body: String,
    pub replied_to_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_to_user_ids: Option<String>,
}

impl OutgoingMessage {
    pub fn reply(thread_id: i64, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            replied_to_id: thread_id,
            ..Default::default()
        }
    }
}

// Dialogue types.

/// A request to the fallback dialogue service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueRequest {
    pub utterance: String,
    pub place: String,
    pub character: u32,
    pub nickname: String,
    pub context: Option<String>,
}

/// A reply from the fallback dialogue service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueReply {
    pub utterance: String,
    pub context: String,
}
