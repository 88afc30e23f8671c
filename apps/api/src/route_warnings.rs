use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Distinct paths kept before new ones are dropped.
pub const MAX_TRACKED_PATHS: usize = 256;

/// One unmatched route seen by the router fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteWarning {
    pub method: String,
    pub path: String,
    pub hits: u64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Records requests that matched no route. Owned by the application state.
#[derive(Debug, Clone, Default)]
pub struct WarningRegistry {
    entries: Arc<RwLock<BTreeMap<(String, String), RouteWarning>>>,
}

impl WarningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one unmatched request. Returns `false` when the registry is full
    /// and the path was not already tracked.
    pub async fn record(&self, method: &str, path: &str) -> bool {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let key = (method.to_owned(), path.to_owned());

        if let Some(entry) = entries.get_mut(&key) {
            entry.hits = entry.hits.saturating_add(1);
            entry.last_seen_at = now;
            return true;
        }

        if entries.len() >= MAX_TRACKED_PATHS {
            return false;
        }

        entries.insert(
            key,
            RouteWarning {
                method: method.to_owned(),
                path: path.to_owned(),
                hits: 1,
                first_seen_at: now,
                last_seen_at: now,
            },
        );
        true
    }

    /// Returns warnings, most frequent first.
    pub async fn list(&self) -> Vec<RouteWarning> {
        let mut warnings: Vec<RouteWarning> =
            self.entries.read().await.values().cloned().collect();
        warnings.sort_by(|left, right| {
            right
                .hits
                .cmp(&left.hits)
                .then_with(|| left.path.cmp(&right.path))
        });
        warnings
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
