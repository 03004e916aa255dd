use std::sync::Arc;

use {
    anyhow::{Context, Result},
    secrecy::Secret,
};

use crate::storage::{Storage, TOKEN_KEY};

/// Capability over the single persisted credential token.
///
/// At most one token exists at a time; its presence is the only signal that
/// the client may be authenticated.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<Secret<String>>;
    fn set(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// [`TokenStore`] kept under [`TOKEN_KEY`] in a [`Storage`] backend.
#[derive(Clone)]
pub struct StoredToken {
    storage: Arc<dyn Storage>,
}

impl StoredToken {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("present", &self.get().is_some())
            .finish()
    }
}

impl TokenStore for StoredToken {
    fn get(&self) -> Option<Secret<String>> {
        self.storage
            .get(TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(Secret::new)
    }

    fn set(&self, token: &str) -> Result<()> {
        self.storage
            .set(TOKEN_KEY, token)
            .context("failed to persist credential token")
    }

    fn clear(&self) -> Result<()> {
        self.storage
            .remove(TOKEN_KEY)
            .context("failed to delete credential token")
    }
}
