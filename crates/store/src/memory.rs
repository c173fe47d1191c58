use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vasini_survey::Session;

use crate::{SessionStore, StoreError, UserId};

/// Process-local sessions.  Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user: UserId) -> Result<Session, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn update(&self, user: UserId, session: &Session) -> Result<(), StoreError> {
        self.sessions.write().await.insert(user, session.clone());
        Ok(())
    }

    async fn clear(&self, user: UserId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(&user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use vasini_survey::Phase;

    use super::*;

    #[tokio::test]
    async fn absent_user_gets_default_session() {
        let store = MemorySessionStore::new();
        let session = store.get(42).await.unwrap();
        assert_eq!(session, Session::default());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn update_then_clear() {
        let store = MemorySessionStore::new();
        let mut session = Session::new();
        session.phase = Phase::AnsweringDemo;
        store.update(1, &session).await.unwrap();
        store.update(2, &Session::new()).await.unwrap();

        assert_eq!(store.get(1).await.unwrap().phase, Phase::AnsweringDemo);
        assert_eq!(store.len().await, 2);

        store.clear(1).await.unwrap();
        assert_eq!(store.get(1).await.unwrap().phase, Phase::Idle);
        assert_eq!(store.len().await, 1);
    }
}
