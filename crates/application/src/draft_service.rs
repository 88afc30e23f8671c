use std::borrow::Borrow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hirely_core::{AppError, AppResult};
use hirely_domain::{Draft, DraftFile};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::form_ports::DraftStore;

/// Default period between automatic draft saves.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

const VALUES_SUFFIX: &str = "draft_values";
const FILES_SUFFIX: &str = "draft_files";
const SAVED_AT_SUFFIX: &str = "draft_saved_at";

/// Latest form state captured for an automatic save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftSnapshot {
    /// Current form values.
    pub form_data: Map<String, Value>,
    /// Files already stored.
    pub uploaded_files: Vec<DraftFile>,
}

/// Saves, restores and discards the draft of one form session.
#[derive(Clone)]
pub struct DraftPersistence {
    store: Arc<dyn DraftStore>,
    namespace: String,
}

impl DraftPersistence {
    /// Creates draft persistence scoped to `namespace`.
    #[must_use]
    pub fn new(store: Arc<dyn DraftStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Returns the key namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    /// Writes values, file metadata and the current timestamp.
    pub async fn save(
        &self,
        form_data: Map<String, Value>,
        uploaded_files: Vec<DraftFile>,
    ) -> AppResult<Draft> {
        let draft = Draft {
            form_data,
            uploaded_files,
            last_saved_at: Utc::now(),
        };

        let values = serde_json::to_string(&draft.form_data)
            .map_err(|error| AppError::Internal(format!("failed to encode draft values: {error}")))?;
        let files = serde_json::to_string(&draft.uploaded_files)
            .map_err(|error| AppError::Internal(format!("failed to encode draft files: {error}")))?;

        self.store
            .set_item(self.key(VALUES_SUFFIX).as_str(), values)
            .await?;
        self.store
            .set_item(self.key(FILES_SUFFIX).as_str(), files)
            .await?;
        self.store
            .set_item(
                self.key(SAVED_AT_SUFFIX).as_str(),
                draft.last_saved_at.to_rfc3339(),
            )
            .await?;

        debug!(
            namespace = self.namespace.as_str(),
            files = draft.uploaded_files.len(),
            "draft saved"
        );
        Ok(draft)
    }

    /// Restores the saved draft. Missing or unreadable data yields `None`.
    pub async fn load(&self) -> AppResult<Option<Draft>> {
        let Some(values) = self.store.get_item(self.key(VALUES_SUFFIX).as_str()).await? else {
            return Ok(None);
        };
        let files = self.store.get_item(self.key(FILES_SUFFIX).as_str()).await?;
        let saved_at = self
            .store
            .get_item(self.key(SAVED_AT_SUFFIX).as_str())
            .await?;

        let form_data = match serde_json::from_str::<Map<String, Value>>(values.as_str()) {
            Ok(form_data) => form_data,
            Err(error) => {
                debug!(namespace = self.namespace.as_str(), %error, "ignoring unreadable draft values");
                return Ok(None);
            }
        };

        let uploaded_files = match files {
            Some(files) => match serde_json::from_str::<Vec<DraftFile>>(files.as_str()) {
                Ok(uploaded_files) => uploaded_files,
                Err(error) => {
                    debug!(namespace = self.namespace.as_str(), %error, "ignoring unreadable draft files");
                    return Ok(None);
                }
            },
            None => Vec::new(),
        };

        let Some(last_saved_at) = saved_at
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc))
        else {
            debug!(namespace = self.namespace.as_str(), "ignoring draft without a valid timestamp");
            return Ok(None);
        };

        Ok(Some(Draft {
            form_data,
            uploaded_files,
            last_saved_at,
        }))
    }

    /// Removes every stored draft key.
    pub async fn clear(&self) -> AppResult<()> {
        for suffix in [VALUES_SUFFIX, FILES_SUFFIX, SAVED_AT_SUFFIX] {
            self.store.remove_item(self.key(suffix).as_str()).await?;
        }
        Ok(())
    }

    /// Saves the latest snapshot every `period` until the handle is dropped.
    ///
    /// A `None` snapshot skips the tick. Save failures are logged. The value
    /// yielded by `snapshot` is held until the save completes, so a snapshot
    /// carrying a lock guard keeps that lock across the write.
    pub fn spawn_autosave<F, Fut, S>(&self, period: Duration, snapshot: F) -> AutosaveHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<S>> + Send + 'static,
        S: Borrow<DraftSnapshot> + Send + 'static,
    {
        let persistence = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(held) = snapshot().await else {
                    continue;
                };
                let DraftSnapshot {
                    form_data,
                    uploaded_files,
                } = held.borrow().clone();

                if let Err(error) = persistence.save(form_data, uploaded_files).await {
                    warn!(
                        namespace = persistence.namespace.as_str(),
                        error = %error,
                        "automatic draft save failed"
                    );
                }
                drop(held);
            }
        });

        AutosaveHandle { task }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{suffix}", self.namespace)
    }
}

/// Running auto-save task. Dropping the handle stops it.
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Stops the task.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use tokio::sync::Mutex;

    use hirely_core::AppResult;
    use hirely_domain::DraftFile;

    use crate::form_ports::DraftStore;

    use super::{DraftPersistence, DraftSnapshot};

    #[derive(Default)]
    struct FakeDraftStore {
        items: Mutex<BTreeMap<String, String>>,
    }

    #[async_trait]
    impl DraftStore for FakeDraftStore {
        async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
            Ok(self.items.lock().await.get(key).cloned())
        }

        async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
            self.items.lock().await.insert(key.to_owned(), value);
            Ok(())
        }

        async fn remove_item(&self, key: &str) -> AppResult<()> {
            self.items.lock().await.remove(key);
            Ok(())
        }
    }

    fn values() -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("first_name".to_owned(), json!("Ada"));
        values.insert("years_experience".to_owned(), json!(12));
        values
    }

    fn cv_entry() -> DraftFile {
        DraftFile {
            field_key: "cv".to_owned(),
            url: "https://files.test/resumes/1-ab.pdf".to_owned(),
            path: "1-ab.pdf".to_owned(),
            file_name: "cv.pdf".to_owned(),
        }
    }

    #[tokio::test]
    async fn saved_draft_loads_back() {
        let store = Arc::new(FakeDraftStore::default());
        let persistence = DraftPersistence::new(store.clone(), "session-1");

        let saved = persistence
            .save(values(), vec![cv_entry()])
            .await
            .unwrap_or_else(|_| unreachable!());
        let loaded = persistence.load().await.unwrap_or_else(|_| unreachable!());

        assert_eq!(loaded, Some(saved));
        assert!(store.items.lock().await.contains_key("session-1:draft_values"));
        assert!(store.items.lock().await.contains_key("session-1:draft_files"));
        assert!(store.items.lock().await.contains_key("session-1:draft_saved_at"));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = Arc::new(FakeDraftStore::default());
        let first = DraftPersistence::new(store.clone(), "a");
        let second = DraftPersistence::new(store, "b");

        first
            .save(values(), Vec::new())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(second.load().await.ok(), Some(None));
    }

    #[tokio::test]
    async fn malformed_draft_is_treated_as_absent() {
        let store = Arc::new(FakeDraftStore::default());
        store
            .set_item("s:draft_values", "{not json".to_owned())
            .await
            .unwrap_or_else(|_| unreachable!());
        store
            .set_item("s:draft_saved_at", "2026-01-01T00:00:00Z".to_owned())
            .await
            .unwrap_or_else(|_| unreachable!());

        let persistence = DraftPersistence::new(store, "s");
        assert_eq!(persistence.load().await.ok(), Some(None));
    }

    #[tokio::test]
    async fn clear_removes_every_key() {
        let store = Arc::new(FakeDraftStore::default());
        let persistence = DraftPersistence::new(store.clone(), "s");
        persistence
            .save(values(), vec![cv_entry()])
            .await
            .unwrap_or_else(|_| unreachable!());

        persistence.clear().await.unwrap_or_else(|_| unreachable!());
        assert!(store.items.lock().await.is_empty());
        assert_eq!(persistence.load().await.ok(), Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_writes_latest_snapshot_until_dropped() {
        let store = Arc::new(FakeDraftStore::default());
        let persistence = DraftPersistence::new(store.clone(), "s");
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let handle = persistence.spawn_autosave(Duration::from_secs(30), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(DraftSnapshot {
                    form_data: values(),
                    uploaded_files: Vec::new(),
                })
            }
        });

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let loaded = persistence.load().await.unwrap_or_else(|_| unreachable!());
        assert_eq!(loaded.map(|draft| draft.form_data), Some(values()));

        drop(handle);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
