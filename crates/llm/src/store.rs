use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::prompts::{PromptKind, PromptTemplate};

/// Transport-assigned user identifier
pub type UserId = i64;

#[derive(Debug, Clone)]
struct StoredPrompt {
    template: PromptTemplate,
    updated_at: DateTime<Utc>,
}

/// In-memory per-user prompt overrides
///
/// Holds at most `capacity` entries; inserting a new user into a full store
/// evicts the least recently updated override.
pub struct UserPromptStore {
    entries: RwLock<HashMap<UserId, StoredPrompt>>,
    capacity: usize,
}

impl UserPromptStore {
    /// Create an empty store
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Get the override for a user
    pub async fn get(&self, user_id: UserId) -> Option<PromptTemplate> {
        self.entries
            .read()
            .await
            .get(&user_id)
            .map(|entry| entry.template.clone())
    }

    /// Insert or overwrite the override for a user
    pub async fn insert(&self, user_id: UserId, template: PromptTemplate) {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&user_id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.updated_at)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!("Prompt store full, evicted override of user {}", oldest);
            }
        }

        entries.insert(
            user_id,
            StoredPrompt {
                template,
                updated_at: Utc::now(),
            },
        );
    }

    /// Remove the override for a user, returning whether one existed
    pub async fn remove(&self, user_id: UserId) -> bool {
        self.entries.write().await.remove(&user_id).is_some()
    }

    /// Number of stored overrides
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no override is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Template chosen for a user, tagged with its source
#[derive(Debug, Clone)]
pub struct ResolvedPrompt {
    pub template: PromptTemplate,
    pub kind: PromptKind,
}

/// Resolves the effective template per user
///
/// All custom templates go through [`PromptResolver::set`], which repairs
/// a missing placeholder before storing.
#[derive(Clone)]
pub struct PromptResolver {
    store: Arc<UserPromptStore>,
    default: PromptTemplate,
}

impl PromptResolver {
    /// Create a resolver over a shared store
    pub fn new(store: Arc<UserPromptStore>) -> Self {
        Self {
            store,
            default: PromptTemplate::default_template(),
        }
    }

    /// The user's override if present, else the default
    pub async fn resolve(&self, user_id: UserId) -> ResolvedPrompt {
        match self.store.get(user_id).await {
            Some(template) => ResolvedPrompt {
                template,
                kind: PromptKind::Custom,
            },
            None => ResolvedPrompt {
                template: self.default.clone(),
                kind: PromptKind::Default,
            },
        }
    }

    /// Store a custom template for a user and return it
    pub async fn set(&self, user_id: UserId, raw_text: &str) -> PromptTemplate {
        let template = PromptTemplate::from_user_text(raw_text);
        self.store.insert(user_id, template.clone()).await;
        info!("Custom prompt set for user {}", user_id);
        template
    }

    /// Drop the user's override, returning whether one existed
    pub async fn reset(&self, user_id: UserId) -> bool {
        let existed = self.store.remove(user_id).await;
        info!("Prompt reset for user {} (had override: {})", user_id, existed);
        existed
    }
}
