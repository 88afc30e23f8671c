use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use hirely_core::AppResult;
use tracing::{debug, info, warn};

use crate::form_ports::{ObjectStorage, UploadConfigRepository};
use crate::submission_ports::SubmissionRepository;

/// Counters produced by one storage sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconciliationReport {
    /// Objects inspected.
    pub scanned: usize,
    /// Orphaned objects deleted.
    pub deleted: usize,
    /// Orphaned objects that could not be deleted.
    pub failed: usize,
}

/// Deletes stored files that no submission references.
///
/// Covers files left behind by abandoned sessions and by rollbacks that
/// failed to delete.
pub struct StorageReconciliationService {
    storage: Arc<dyn ObjectStorage>,
    upload_configs: Arc<dyn UploadConfigRepository>,
    submissions: Arc<dyn SubmissionRepository>,
}

impl StorageReconciliationService {
    /// Creates a reconciliation service.
    #[must_use]
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        upload_configs: Arc<dyn UploadConfigRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            storage,
            upload_configs,
            submissions,
        }
    }

    /// Deletes unreferenced objects older than `grace_period`.
    ///
    /// `grace_period` must exceed the lifetime of a draft, otherwise files
    /// of drafts still in progress are removed.
    pub async fn sweep(&self, grace_period: Duration) -> AppResult<ReconciliationReport> {
        let cutoff = Utc::now() - grace_period;
        let referenced = self.submissions.referenced_file_urls().await?;
        let buckets: BTreeSet<String> = self
            .upload_configs
            .list_upload_configs()
            .await?
            .values()
            .map(|config| config.bucket_name().to_owned())
            .collect();

        let mut report = ReconciliationReport::default();
        for bucket in &buckets {
            let objects = self.storage.list_objects(bucket).await?;
            for object in objects {
                report.scanned += 1;
                if object.created_at > cutoff {
                    continue;
                }

                let url = self.storage.public_url(bucket, object.path.as_str());
                if referenced.contains(&url) {
                    continue;
                }

                match self.storage.delete_object(bucket, object.path.as_str()).await {
                    Ok(()) => {
                        debug!(bucket = bucket.as_str(), path = object.path.as_str(), "orphaned file deleted");
                        report.deleted += 1;
                    }
                    Err(error) => {
                        warn!(
                            bucket = bucket.as_str(),
                            path = object.path.as_str(),
                            error = %error,
                            "failed to delete orphaned file"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            buckets = buckets.len(),
            scanned = report.scanned,
            deleted = report.deleted,
            failed = report.failed,
            "storage reconciliation finished"
        );
        Ok(report)
    }
}
