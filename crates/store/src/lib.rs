//! Session persistence and the per-user service loop around the survey
//! state machine.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use vasini_config::{StorageBackend, StorageConfig};
use vasini_survey::{Session, SurveyError};

pub mod file;
pub mod locks;
pub mod memory;
pub mod service;

pub use file::FileSessionStore;
pub use locks::UserLocks;
pub use memory::MemorySessionStore;
pub use service::SurveyService;

/// Messaging-platform user (Telegram chat) id.
pub type UserId = i64;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Survey(#[from] SurveyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// get/update/clear over per-user sessions.  `get` never fails for an unknown
/// user; it returns a fresh default session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user: UserId) -> Result<Session, StoreError>;
    async fn update(&self, user: UserId, session: &Session) -> Result<(), StoreError>;
    async fn clear(&self, user: UserId) -> Result<(), StoreError>;
}

pub fn open_store(config: &StorageConfig) -> Arc<dyn SessionStore> {
    match config.backend {
        StorageBackend::Memory => {
            info!("using in-memory session store");
            Arc::new(MemorySessionStore::new())
        }
        StorageBackend::File => {
            info!(dir = %config.sessions_dir, "using file session store");
            Arc::new(FileSessionStore::new(&config.sessions_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_store_honours_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            sessions_dir: dir.path().display().to_string(),
        };
        let store = open_store(&config);
        store.update(1, &Session::default()).await.unwrap();
        assert!(dir.path().join("1.json").exists());

        let store = open_store(&StorageConfig::default());
        store.update(1, &Session::default()).await.unwrap();
        assert!(store.get(1).await.is_ok());
    }
}
