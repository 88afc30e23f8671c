use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::Mutex;

use hirely_core::{AppError, AppResult};
use hirely_domain::{CandidateFile, DraftFile, UploadConfig, UploadStatus};

use crate::form_ports::{ObjectStorage, StoredObject, UploadConfigRepository};

use super::FileUploadOrchestrator;

#[derive(Default)]
struct FakeObjectStorage {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    failing_buckets: Mutex<BTreeSet<String>>,
    fail_deletes: bool,
}

impl FakeObjectStorage {
    fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ObjectStorage for FakeObjectStorage {
    async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> AppResult<String> {
        if self.failing_buckets.lock().await.contains(bucket) {
            return Err(AppError::Internal("storage unavailable".to_owned()));
        }

        self.objects
            .lock()
            .await
            .insert((bucket.to_owned(), path.to_owned()), bytes.to_vec());
        Ok(self.public_url(bucket, path))
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> AppResult<()> {
        if self.fail_deletes {
            return Err(AppError::Internal("delete refused".to_owned()));
        }

        self.objects
            .lock()
            .await
            .remove(&(bucket.to_owned(), path.to_owned()));
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> AppResult<Vec<StoredObject>> {
        Ok(self
            .objects
            .lock()
            .await
            .keys()
            .filter(|(stored_bucket, _)| stored_bucket == bucket)
            .map(|(_, path)| StoredObject {
                path: path.clone(),
                created_at: chrono::Utc::now(),
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://files.test/{bucket}/{path}")
    }
}

struct FakeUploadConfigRepository {
    configs: BTreeMap<String, UploadConfig>,
}

impl FakeUploadConfigRepository {
    fn standard() -> Self {
        let mut configs = BTreeMap::new();
        configs.insert("cv".to_owned(), pdf_config("resumes"));
        configs.insert("cover_letter".to_owned(), pdf_config("letters"));
        Self { configs }
    }
}

#[async_trait]
impl UploadConfigRepository for FakeUploadConfigRepository {
    async fn list_upload_configs(&self) -> AppResult<BTreeMap<String, UploadConfig>> {
        Ok(self.configs.clone())
    }

    async fn save_upload_config(&self, _field_key: &str, _config: UploadConfig) -> AppResult<()> {
        Ok(())
    }

    async fn delete_upload_config(&self, _field_key: &str) -> AppResult<bool> {
        Ok(false)
    }
}

fn pdf_config(bucket: &str) -> UploadConfig {
    UploadConfig::new(bucket, 1024, ["pdf"], ["application/pdf"])
        .unwrap_or_else(|_| unreachable!())
}

fn pdf(name: &str, size: usize) -> CandidateFile {
    CandidateFile::new(name, "application/pdf", vec![7; size]).unwrap_or_else(|_| unreachable!())
}

async fn orchestrator(storage: Arc<FakeObjectStorage>) -> FileUploadOrchestrator {
    let mut orchestrator =
        FileUploadOrchestrator::new(storage, Arc::new(FakeUploadConfigRepository::standard()));
    orchestrator
        .load_configs()
        .await
        .unwrap_or_else(|_| unreachable!());
    orchestrator
}

#[tokio::test]
async fn rejected_file_leaves_state_untouched() {
    let mut orchestrator = orchestrator(Arc::new(FakeObjectStorage::default())).await;

    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());
    let oversized = orchestrator.add_file("cv", pdf("big.pdf", 2048));
    assert!(matches!(oversized, Err(AppError::Validation(_))));

    let wrong_type = CandidateFile::new("cv.exe", "application/pdf", vec![1])
        .unwrap_or_else(|_| unreachable!());
    assert!(orchestrator.add_file("cv", wrong_type).is_err());

    let state = orchestrator.state("cv").unwrap_or_else(|| unreachable!());
    assert_eq!(state.file_name(), "cv.pdf");
    assert_eq!(state.status(), UploadStatus::Pending);
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let mut orchestrator = orchestrator(Arc::new(FakeObjectStorage::default())).await;
    let result = orchestrator.add_file("portfolio", pdf("work.pdf", 10));
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(orchestrator.states().is_empty());
}

#[tokio::test]
async fn upload_stores_under_generated_path() {
    let storage = Arc::new(FakeObjectStorage::default());
    let mut orchestrator = orchestrator(Arc::clone(&storage)).await;
    orchestrator
        .add_file("cv", pdf("Mon CV (final).PDF", 10))
        .unwrap_or_else(|_| unreachable!());

    let url = orchestrator
        .upload_file("cv")
        .await
        .unwrap_or_else(|_| unreachable!());

    let state = orchestrator.state("cv").unwrap_or_else(|| unreachable!());
    let path = state.storage_path().unwrap_or_default().to_owned();
    assert_eq!(state.status(), UploadStatus::Success);
    assert_eq!(url, format!("https://files.test/resumes/{path}"));
    assert!(path.ends_with(".pdf"));
    assert!(!path.contains("CV"));

    let (millis, rest) = path.split_once('-').unwrap_or_default();
    assert!(millis.parse::<i64>().is_ok());
    assert_eq!(rest.len(), "0123456789abcdef.pdf".len());
    assert!(
        storage
            .objects
            .lock()
            .await
            .contains_key(&("resumes".to_owned(), path))
    );
}

#[tokio::test]
async fn failed_upload_marks_error_and_reports_field() {
    let storage = Arc::new(FakeObjectStorage::default());
    storage
        .failing_buckets
        .lock()
        .await
        .insert("resumes".to_owned());
    let mut orchestrator = orchestrator(Arc::clone(&storage)).await;
    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());

    let result = orchestrator.upload_file("cv").await;
    assert!(matches!(
        result,
        Err(AppError::Upload { ref field_key, .. }) if field_key == "cv"
    ));

    let state = orchestrator.state("cv").unwrap_or_else(|| unreachable!());
    assert_eq!(state.status(), UploadStatus::Error);
    assert!(state.error_message().is_some());
    assert!(state.url().is_none());
}

#[tokio::test]
async fn upload_all_stops_at_first_failure() {
    let storage = Arc::new(FakeObjectStorage::default());
    storage
        .failing_buckets
        .lock()
        .await
        .insert("resumes".to_owned());
    let mut orchestrator = orchestrator(Arc::clone(&storage)).await;
    orchestrator
        .add_file("cover_letter", pdf("letter.pdf", 10))
        .unwrap_or_else(|_| unreachable!());
    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());

    assert!(orchestrator.upload_all_files().await.is_err());
    assert_eq!(
        orchestrator
            .state("cover_letter")
            .map(|state| state.status()),
        Some(UploadStatus::Success)
    );
    assert_eq!(
        orchestrator.state("cv").map(|state| state.status()),
        Some(UploadStatus::Error)
    );
}

#[tokio::test]
async fn upload_all_includes_restored_entries() {
    let mut orchestrator = orchestrator(Arc::new(FakeObjectStorage::default())).await;
    orchestrator.restore_uploaded_files(&[DraftFile {
        field_key: "cover_letter".to_owned(),
        url: "https://files.test/letters/1-aa.pdf".to_owned(),
        path: "1-aa.pdf".to_owned(),
        file_name: "letter.pdf".to_owned(),
    }]);
    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());

    let urls = orchestrator
        .upload_all_files()
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(urls.len(), 2);
    assert_eq!(
        urls.get("cover_letter").map(String::as_str),
        Some("https://files.test/letters/1-aa.pdf")
    );
}

#[tokio::test]
async fn rollback_deletes_stored_objects_and_clears_state() {
    let storage = Arc::new(FakeObjectStorage::default());
    let mut orchestrator = orchestrator(Arc::clone(&storage)).await;
    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());
    orchestrator
        .add_file("cover_letter", pdf("letter.pdf", 10))
        .unwrap_or_else(|_| unreachable!());
    orchestrator
        .upload_all_files()
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(storage.objects.lock().await.len(), 2);

    assert_eq!(orchestrator.rollback_all_uploads().await, 2);
    assert!(storage.objects.lock().await.is_empty());
    assert!(orchestrator.states().is_empty());
}

#[tokio::test]
async fn rollback_survives_delete_failures() {
    let storage = Arc::new(FakeObjectStorage::failing_deletes());
    let mut orchestrator = orchestrator(Arc::clone(&storage)).await;
    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());
    orchestrator
        .upload_file("cv")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(orchestrator.rollback_all_uploads().await, 0);
    assert!(orchestrator.states().is_empty());
    assert_eq!(storage.objects.lock().await.len(), 1);
}

#[tokio::test]
async fn restored_entries_round_trip_to_draft_metadata() {
    let mut orchestrator = orchestrator(Arc::new(FakeObjectStorage::default())).await;
    let entry = DraftFile {
        field_key: "cv".to_owned(),
        url: "https://files.test/resumes/1-ab.pdf".to_owned(),
        path: "1-ab.pdf".to_owned(),
        file_name: "cv.pdf".to_owned(),
    };
    orchestrator.restore_uploaded_files(std::slice::from_ref(&entry));

    assert_eq!(orchestrator.uploaded_file_metadata(), vec![entry]);
    assert!(orchestrator.upload_file("cv").await.is_err());

    assert!(orchestrator.remove_file("cv"));
    assert!(!orchestrator.remove_file("cv"));
    assert!(orchestrator.uploaded_file_metadata().is_empty());
}

fn restored_entry(field_key: &str, path: String) -> DraftFile {
    DraftFile {
        field_key: field_key.to_owned(),
        url: format!("https://files.test/resumes/{path}"),
        path,
        file_name: "cv.pdf".to_owned(),
    }
}

#[tokio::test]
async fn uploads_older_than_the_limit_expire() {
    let mut orchestrator = orchestrator(Arc::new(FakeObjectStorage::default())).await;
    let old = (Utc::now() - TimeDelta::hours(30)).timestamp_millis();
    let fresh = (Utc::now() - TimeDelta::minutes(5)).timestamp_millis();
    orchestrator.restore_uploaded_files(&[
        restored_entry("cv", format!("{old}-aa.pdf")),
        restored_entry("cover_letter", format!("{fresh}-bb.pdf")),
    ]);

    let expired = orchestrator.expire_uploads(TimeDelta::hours(12));

    assert_eq!(expired, vec!["cv".to_owned()]);
    assert!(orchestrator.state("cv").is_none());
    assert_eq!(
        orchestrator.state("cover_letter").map(|state| state.status()),
        Some(UploadStatus::Success)
    );
}

#[tokio::test]
async fn pending_files_and_unreadable_paths_are_handled_apart() {
    let mut orchestrator = orchestrator(Arc::new(FakeObjectStorage::default())).await;
    orchestrator.restore_uploaded_files(&[restored_entry("cover_letter", "legacy.pdf".to_owned())]);
    orchestrator
        .add_file("cv", pdf("cv.pdf", 10))
        .unwrap_or_else(|_| unreachable!());

    let expired = orchestrator.expire_uploads(TimeDelta::hours(12));

    assert_eq!(expired, vec!["cover_letter".to_owned()]);
    assert_eq!(
        orchestrator.state("cv").map(|state| state.status()),
        Some(UploadStatus::Pending)
    );
}
