//! Persistence of the store document (credentials and mention groups).

use std::{collections::BTreeMap, ops::Deref, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::base::types::{MentionGroup, Res, Void};

pub mod json;
pub mod memory;

// Types.

/// The whole persisted document.
///
/// It is always read and written in full; there is no incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub mention_lists: BTreeMap<String, MentionGroup>,
}

// Traits.

/// Generic store trait that backends must implement.
///
/// Calls are synchronous: a mutating directory operation is not complete until
/// `save` has returned.
pub trait GenericStore: Send + Sync + 'static {
    /// Reads the document, or `None` when nothing has been persisted yet.
    fn load(&self) -> Res<Option<StoreDocument>>;

    /// Rewrites the whole document.
    fn save(&self, document: &StoreDocument) -> Void;
}

// Structs.

/// Store client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn GenericStore>,
}

impl Deref for StoreClient {
    type Target = dyn GenericStore;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl StoreClient {
    pub fn new(inner: Arc<dyn GenericStore>) -> Self {
        Self { inner }
    }
}
