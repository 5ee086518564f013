//! Sync run audit log
//!
//! One [`SyncRunLog`] row is appended for every job execution, successful or
//! not. Rows are never updated after insertion.

use crate::domain::errors::FailedRecord;
use crate::domain::ids::{InstanceId, ProfileId, SyncLogId};
use crate::domain::instance::SyncDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used when a batch spans several entity types
pub const MIXED_ENTITY_LABEL: &str = "mixed";

/// Label used when a job failed before any record was seen
pub const UNKNOWN_ENTITY_LABEL: &str = "unknown";

/// Direction of a logged run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Import,
    Export,
}

impl From<SyncDirection> for SyncOperation {
    fn from(direction: SyncDirection) -> Self {
        match direction {
            SyncDirection::Export => SyncOperation::Export,
            SyncDirection::Import | SyncDirection::Bidirectional => SyncOperation::Import,
        }
    }
}

/// Append-only audit row describing one sync job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRunLog {
    pub id: SyncLogId,
    pub instance_id: InstanceId,
    pub profile_id: Option<ProfileId>,
    pub operation: SyncOperation,

    /// Entity type name, `mixed` or `unknown`
    pub entity_type: String,

    pub records_processed: u64,
    pub records_success: u64,
    pub records_warning: u64,
    pub records_error: u64,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Debug rendering of the error chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    pub duration_ms: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_records: Vec<FailedRecord>,

    pub timestamp: DateTime<Utc>,
}

impl SyncRunLog {
    /// Log row for a job that failed before record processing
    pub fn failure(
        instance_id: InstanceId,
        profile_id: Option<ProfileId>,
        error_message: impl Into<String>,
        error_detail: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: SyncLogId::generate(),
            instance_id,
            profile_id,
            operation: SyncOperation::Import,
            entity_type: UNKNOWN_ENTITY_LABEL.to_string(),
            records_processed: 0,
            records_success: 0,
            records_warning: 0,
            records_error: 1,
            success: false,
            error_message: Some(error_message.into()),
            error_detail: Some(error_detail.into()),
            duration_ms,
            failed_records: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Duration of the run as a chrono duration
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.duration_ms as i64)
    }
}
