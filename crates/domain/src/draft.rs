use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a file uploaded before the draft was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    /// Field key the file belongs to.
    pub field_key: String,
    /// Public URL of the stored object.
    pub url: String,
    /// Storage path inside the bucket.
    pub path: String,
    /// Original file name.
    pub file_name: String,
}

/// In-progress form snapshot kept in local persistent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Form values keyed by field key.
    pub form_data: Map<String, Value>,
    /// Files that reached the success state.
    pub uploaded_files: Vec<DraftFile>,
    /// When the snapshot was written.
    pub last_saved_at: DateTime<Utc>,
}
