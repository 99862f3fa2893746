//! The mention group directory.
//!
//! Groups live in memory and the whole store document is rewritten after every
//! mutation. A failed write is reported back to the caller but the in-memory change is
//! kept, so memory and disk may diverge until the next successful write.

use std::collections::BTreeMap;

use tracing::{error, info, instrument};

use crate::{
    base::types::{Err, MentionGroup, Res, User},
    service::store::{StoreClient, StoreDocument},
};

/// What a directory operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created(MentionGroup),
    Updated(MentionGroup),
    Deleted(String),
    Renamed { from: String, group: MentionGroup },
    NotFound(String),
}

/// The outcome of a mutating operation, including any persistence failure.
#[derive(Debug)]
pub struct Report {
    pub change: Change,
    pub persist_error: Option<Err>,
}

impl Report {
    fn untouched(change: Change) -> Self {
        Self { change, persist_error: None }
    }
}

/// Mapping from group name to mention group, backed by a store.
pub struct MentionDirectory {
    groups: BTreeMap<String, MentionGroup>,
    access_token: String,
    api_key: String,
    store: StoreClient,
}

impl MentionDirectory {
    /// Loads the directory from the store, starting empty when nothing was persisted yet.
    #[instrument(name = "MentionDirectory::load", skip_all)]
    pub fn load(store: StoreClient) -> Res<Self> {
        let document = store.load()?.unwrap_or_default();

        info!("Loaded {} mention groups.", document.mention_lists.len());

        Ok(Self {
            groups: document.mention_lists,
            access_token: document.access_token,
            api_key: document.api_key,
            store,
        })
    }

    /// The access token carried by the store document.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The dialogue API key carried by the store document.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Adds `users` to `group`, creating the group when it does not exist.
    #[instrument(skip(self, users))]
    pub fn add_members(&mut self, group: &str, users: &[User]) -> Report {
        let change = match self.groups.get_mut(group) {
            Some(existing) => {
                for user in users {
                    append_if_missing(&mut existing.members, user);
                }
                Change::Updated(existing.clone())
            }
            None => {
                let mut members = Vec::with_capacity(users.len());
                for user in users {
                    append_if_missing(&mut members, user);
                }
                let created = MentionGroup { name: group.to_string(), members };
                self.groups.insert(group.to_string(), created.clone());
                Change::Created(created)
            }
        };

        self.persist(change)
    }

    /// Removes `users` from `group`. Empty groups are kept.
    #[instrument(skip(self, users))]
    pub fn remove_members(&mut self, group: &str, users: &[User]) -> Report {
        let Some(existing) = self.groups.get_mut(group) else {
            return Report::untouched(Change::NotFound(group.to_string()));
        };

        existing.members.retain(|member| !users.iter().any(|u| u.id == member.id));
        let change = Change::Updated(existing.clone());

        self.persist(change)
    }

    /// Deletes the whole group.
    #[instrument(skip(self))]
    pub fn delete_group(&mut self, group: &str) -> Report {
        if self.groups.remove(group).is_none() {
            return Report::untouched(Change::NotFound(group.to_string()));
        }

        self.persist(Change::Deleted(group.to_string()))
    }

    /// Moves `from` to `to`, silently replacing any group already named `to`.
    #[instrument(skip(self))]
    pub fn rename(&mut self, from: &str, to: &str) -> Report {
        let Some(mut group) = self.groups.remove(from) else {
            return Report::untouched(Change::NotFound(from.to_string()));
        };

        group.name = to.to_string();
        self.groups.insert(to.to_string(), group.clone());

        self.persist(Change::Renamed { from: from.to_string(), group })
    }

    pub fn show(&self, group: &str) -> Option<&MentionGroup> {
        self.groups.get(group)
    }

    /// Every group, ordered by name.
    pub fn show_all(&self) -> impl Iterator<Item = &MentionGroup> {
        self.groups.values()
    }

    fn document(&self) -> StoreDocument {
        StoreDocument {
            access_token: self.access_token.clone(),
            api_key: self.api_key.clone(),
            mention_lists: self.groups.clone(),
        }
    }

    fn persist(&self, change: Change) -> Report {
        let persist_error = match self.store.save(&self.document()) {
            Ok(()) => None,
            Err(err) => {
                error!("Failed to persist mention groups: {:#}", err);
                Some(err)
            }
        };

        Report { change, persist_error }
    }
}

fn append_if_missing(members: &mut Vec<User>, user: &User) {
    if !members.iter().any(|m| m.id == user.id) {
        members.push(user.clone());
    }
}
