//! Tokenizing commands and choosing the action they ask for.

use std::sync::LazyLock;

use regex::Regex;

use crate::base::replies;

/// Separators: whitespace runs (full-width space included), tabs, quotes, commas and periods.
static TOKEN_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\s\t　]+|"|,|\."#).expect("separator pattern is valid"));

/// The actions a directed message can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    DeleteGroup,
    RemoveMembers,
    ShowAll,
    Show,
    Rename,
    Cc,
    Chat,
}

impl Action {
    /// How many group tokens the handler consumes.
    pub fn group_tokens_needed(self) -> usize {
        match self {
            Action::ShowAll | Action::Chat => 0,
            Action::Rename => 2,
            Action::Add | Action::DeleteGroup | Action::RemoveMembers | Action::Show | Action::Cc => 1,
        }
    }
}

/// Trigger keywords in priority order; the first entry with a matching keyword wins.
const TRIGGERS: &[(&[&str], Action)] = &[
    (replies::ADD_TRIGGERS, Action::Add),
    (replies::DELETE_GROUP_TRIGGERS, Action::DeleteGroup),
    (replies::REMOVE_TRIGGERS, Action::RemoveMembers),
    (replies::SHOW_ALL_TRIGGERS, Action::ShowAll),
    (replies::SHOW_TRIGGERS, Action::Show),
    (replies::RENAME_TRIGGERS, Action::Rename),
    (replies::CC_TRIGGERS, Action::Cc),
];

/// Splits a message into non-empty tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_SEPARATOR_RE.split(text).filter(|t| !t.is_empty()).collect()
}

/// Group tokens in order of first appearance. Duplicates are kept.
pub fn group_tokens<'a>(tokens: &[&'a str], marker: char) -> Vec<&'a str> {
    tokens.iter().copied().filter(|t| t.starts_with(marker) && t.chars().count() > 1).collect()
}

/// Picks the action for a message.
///
/// Returns `None` when nothing matches and no fallback responder is available.
pub fn select_action(text: &str, fallback_available: bool) -> Option<Action> {
    TRIGGERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, action)| *action)
        .or(fallback_available.then_some(Action::Chat))
}
