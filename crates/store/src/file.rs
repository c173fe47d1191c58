use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use vasini_survey::Session;

use crate::{SessionStore, StoreError, UserId};

/// One JSON document per user under a directory.
///
/// Writes go to a `.tmp` sibling that is `fsync`'d and renamed over the live
/// file, so a crash leaves either the old or the new session on disk.  A
/// document that no longer parses is moved aside to `<user>.json.corrupt` and
/// the user starts from a fresh session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user: UserId) -> PathBuf {
        self.dir.join(format!("{user}.json"))
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "session.json".to_string());
        path.with_file_name(format!("{filename}.{suffix}"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, user: UserId) -> Result<Session, StoreError> {
        let path = self.path_for(user);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Session::default()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(session),
            Err(err) => {
                let sidecar = Self::sibling(&path, "corrupt");
                warn!(
                    user,
                    error = %err,
                    sidecar = %sidecar.display(),
                    "corrupt session document, starting fresh"
                );
                tokio::fs::rename(&path, &sidecar).await?;
                Ok(Session::default())
            }
        }
    }

    async fn update(&self, user: UserId, session: &Session) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(user);
        let tmp_path = Self::sibling(&path, "tmp");
        let body = serde_json::to_vec_pretty(session)?;

        let write_result: Result<(), StoreError> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await?;
            file.write_all(&body).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        debug!(user, len = body.len(), "session written");
        Ok(())
    }

    async fn clear(&self, user: UserId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(user)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use vasini_survey::{Phase, Response};

    use super::*;

    fn sample_session() -> Session {
        let mut session = Session::new();
        session.phase = Phase::AnsweringDemo;
        session.cursor = 1;
        session.answers.record("name", Response::Text("Ada".into()));
        session.advice_history.record("drink water", 20);
        session
    }

    #[tokio::test]
    async fn missing_document_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));
        assert_eq!(store.get(7).await.unwrap(), Session::default());
    }

    #[tokio::test]
    async fn update_roundtrips_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("sessions"));
        let session = sample_session();

        store.update(7, &session).await.unwrap();
        assert_eq!(store.get(7).await.unwrap(), session);
        assert!(store.dir().join("7.json").exists());
        assert!(!store.dir().join("7.json.tmp").exists());

        let mut next = session.clone();
        next.cursor = 2;
        store.update(7, &next).await.unwrap();
        assert_eq!(store.get(7).await.unwrap().cursor, 2);
    }

    #[tokio::test]
    async fn corrupt_document_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(dir.path().join("9.json"), "{not json").unwrap();

        let session = store.get(9).await.unwrap();
        assert_eq!(session, Session::default());
        assert!(!dir.path().join("9.json").exists());
        let sidecar = std::fs::read_to_string(dir.path().join("9.json.corrupt")).unwrap();
        assert_eq!(sidecar, "{not json");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.update(3, &sample_session()).await.unwrap();
        store.clear(3).await.unwrap();
        store.clear(3).await.unwrap();
        assert_eq!(store.get(3).await.unwrap(), Session::default());
    }
}
