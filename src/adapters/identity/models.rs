//! Identity platform API models
//!
//! Request and response bodies for the listing and configuration-export
//! endpoints. Exported objects themselves stay opaque `serde_json::Value`s.

use crate::domain::{EntityKind, ItemId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Minimal view of an object returned by a list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ListedObject {
    /// Object id
    #[serde(default)]
    pub id: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Per-kind export options
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectExportOptions {
    /// Only these ids are exported
    pub included_ids: Vec<String>,
}

/// Body of an export job submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// Free-form job description
    pub description: String,

    /// Kinds included in the export
    pub include_types: Vec<EntityKind>,

    /// Per-kind options keyed by kind
    pub object_options: BTreeMap<EntityKind, ObjectExportOptions>,
}

impl ExportPayload {
    /// Payload scoped to exactly `ids` of a single kind
    pub fn scoped(kind: EntityKind, ids: &[ItemId], description: impl Into<String>) -> Self {
        let mut object_options = BTreeMap::new();
        object_options.insert(
            kind,
            ObjectExportOptions {
                included_ids: ids.iter().map(|id| id.as_str().to_string()).collect(),
            },
        );
        Self {
            description: description.into(),
            include_types: vec![kind],
            object_options,
        }
    }
}

/// Export job descriptor returned by submission and status endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobResponse {
    /// Backend job id
    pub job_id: String,

    /// Wire status (`NOT_STARTED`, `IN_PROGRESS`, `COMPLETE`, `CANCELLED`, `FAILED`)
    #[serde(default)]
    pub status: Option<String>,
}

/// Downloaded result of a completed export job
#[derive(Debug, Clone, Deserialize)]
pub struct ExportDownload {
    /// Exported configuration objects
    #[serde(default)]
    pub objects: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scoped_payload_shape() {
        let payload = ExportPayload::scoped(
            EntityKind::AccessProfile,
            &[ItemId::new("ap1").unwrap()],
            "Exporting ACCESS_PROFILE",
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "description": "Exporting ACCESS_PROFILE",
                "includeTypes": ["ACCESS_PROFILE"],
                "objectOptions": {"ACCESS_PROFILE": {"includedIds": ["ap1"]}}
            })
        );
    }

    #[test]
    fn test_job_response_parses_camel_case() {
        let job: ExportJobResponse =
            serde_json::from_value(json!({"jobId": "j-1", "status": "NOT_STARTED", "type": "EXPORT"}))
                .unwrap();
        assert_eq!(job.job_id, "j-1");
        assert_eq!(job.status.as_deref(), Some("NOT_STARTED"));
    }

    #[test]
    fn test_download_tolerates_missing_objects() {
        let download: ExportDownload = serde_json::from_value(json!({"version": 1})).unwrap();
        assert!(download.objects.is_empty());
    }
}
