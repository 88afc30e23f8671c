use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use hirely_application::{
    AutosaveHandle, DraftPersistence, DraftSnapshot, DraftStore, FileUploadOrchestrator,
    ObjectStorage, UploadConfigRepository,
};
use hirely_core::AppResult;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

/// Form sessions unused for this long are dropped from memory. Their drafts stay stored.
pub const FORM_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Server-side state of one applicant filling in the form.
pub struct FormSession {
    orchestrator: Arc<Mutex<FileUploadOrchestrator>>,
    latest_values: Arc<Mutex<Option<Map<String, Value>>>>,
    drafts: DraftPersistence,
    upload_max_age: TimeDelta,
    last_seen: Mutex<Instant>,
    _autosave: AutosaveHandle,
}

impl FormSession {
    pub async fn orchestrator(&self) -> MutexGuard<'_, FileUploadOrchestrator> {
        self.orchestrator.lock().await
    }

    pub fn drafts(&self) -> &DraftPersistence {
        &self.drafts
    }

    /// Age after which stored uploads are no longer trusted to exist.
    pub fn upload_max_age(&self) -> TimeDelta {
        self.upload_max_age
    }

    /// Remembers the values the next automatic save writes.
    ///
    /// Callers hold the orchestrator guard; automatic saves take the same lock
    /// before reading the values.
    pub async fn record_values(&self, values: Map<String, Value>) {
        *self.latest_values.lock().await = Some(values);
    }

    pub async fn forget_values(&self) {
        *self.latest_values.lock().await = None;
    }

    async fn touch(&self) {
        *self.last_seen.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_seen.lock().await.elapsed()
    }
}

/// Open form sessions keyed by cookie session id.
#[derive(Clone)]
pub struct FormSessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<FormSession>>>>,
    storage: Arc<dyn ObjectStorage>,
    upload_configs: Arc<dyn UploadConfigRepository>,
    draft_store: Arc<dyn DraftStore>,
    autosave_interval: Duration,
    upload_max_age: TimeDelta,
}

impl FormSessionRegistry {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        upload_configs: Arc<dyn UploadConfigRepository>,
        draft_store: Arc<dyn DraftStore>,
        autosave_interval: Duration,
        upload_max_age: TimeDelta,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            storage,
            upload_configs,
            draft_store,
            autosave_interval,
            upload_max_age,
        }
    }

    /// Returns the session for `session_id`, creating it from the stored draft if needed.
    pub async fn session(&self, session_id: &str) -> AppResult<Arc<FormSession>> {
        if let Some(existing) = self.sessions.read().await.get(session_id).cloned() {
            existing.touch().await;
            return Ok(existing);
        }

        self.prune_idle().await;
        let created = Arc::new(self.create(session_id).await?);

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| created.clone())
            .clone();
        info!(open_sessions = sessions.len(), "form session opened");
        Ok(session)
    }

    /// Drops the in-memory session. Stored drafts are untouched.
    pub async fn close(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn create(&self, session_id: &str) -> AppResult<FormSession> {
        let mut orchestrator =
            FileUploadOrchestrator::new(self.storage.clone(), self.upload_configs.clone());
        orchestrator.load_configs().await?;

        let drafts = DraftPersistence::new(self.draft_store.clone(), format!("form:{session_id}"));
        let mut latest_values = None;
        if let Some(draft) = drafts.load().await? {
            orchestrator.restore_uploaded_files(&draft.uploaded_files);
            let expired = orchestrator.expire_uploads(self.upload_max_age);
            debug!(
                files = draft.uploaded_files.len(),
                expired = expired.len(),
                saved_at = %draft.last_saved_at,
                "form session restored from draft"
            );
            latest_values = Some(draft.form_data);
        }

        let orchestrator = Arc::new(Mutex::new(orchestrator));
        let latest_values = Arc::new(Mutex::new(latest_values));

        let autosave = {
            let orchestrator = orchestrator.clone();
            let latest_values = latest_values.clone();
            drafts.spawn_autosave(self.autosave_interval, move || {
                let orchestrator = orchestrator.clone();
                let latest_values = latest_values.clone();
                async move {
                    let orchestrator = orchestrator.lock_owned().await;
                    let form_data = latest_values.lock().await.clone()?;
                    Some(LockedSnapshot {
                        snapshot: DraftSnapshot {
                            form_data,
                            uploaded_files: orchestrator.uploaded_file_metadata(),
                        },
                        _orchestrator: orchestrator,
                    })
                }
            })
        };

        Ok(FormSession {
            orchestrator,
            latest_values,
            drafts,
            upload_max_age: self.upload_max_age,
            last_seen: Mutex::new(Instant::now()),
            _autosave: autosave,
        })
    }

    async fn prune_idle(&self) {
        let mut idle = Vec::new();
        for (session_id, session) in self.sessions.read().await.iter() {
            if session.idle_for().await >= FORM_SESSION_IDLE_TIMEOUT {
                idle.push(session_id.clone());
            }
        }

        if idle.is_empty() {
            return;
        }

        let mut sessions = self.sessions.write().await;
        for session_id in &idle {
            sessions.remove(session_id);
        }
        debug!(pruned = idle.len(), "idle form sessions dropped");
    }
}

/// Autosave snapshot taken under the orchestrator lock, which stays held until the write ends.
struct LockedSnapshot {
    snapshot: DraftSnapshot,
    _orchestrator: OwnedMutexGuard<FileUploadOrchestrator>,
}

impl Borrow<DraftSnapshot> for LockedSnapshot {
    fn borrow(&self) -> &DraftSnapshot {
        &self.snapshot
    }
}
