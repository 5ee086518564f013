//! Sync run accounting and reporting
//!
//! This module defines the counters a job accumulates while processing
//! records, the result returned to callers and the summary of a due sweep.

use crate::domain::errors::FailedRecord;
use crate::domain::ids::InstanceId;
use crate::domain::record::EntityType;
use crate::domain::sync_log::MIXED_ENTITY_LABEL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for one batch of records
///
/// `processed` counts records; `success` and `error` count entity writes, so a
/// multi-entity record contributes one to `processed` and up to N to the
/// others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTally {
    pub processed: u64,
    pub success: u64,
    pub warning: u64,
    pub error: u64,
    pub failed_records: Vec<FailedRecord>,
    label: Option<LabelState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LabelState {
    Uniform(EntityType),
    Mixed,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record and fold its type into the entity label
    pub fn add_record(&mut self, single_type: Option<EntityType>) {
        self.processed += 1;
        self.label = Some(match (self.label, single_type) {
            (None, Some(t)) => LabelState::Uniform(t),
            (Some(LabelState::Uniform(current)), Some(t)) if current == t => {
                LabelState::Uniform(current)
            }
            _ => LabelState::Mixed,
        });
    }

    pub fn add_success(&mut self) {
        self.success += 1;
    }

    pub fn add_failure(&mut self, failed: FailedRecord) {
        self.error += 1;
        self.failed_records.push(failed);
    }

    /// Entity label for the run log
    ///
    /// The entity type name when every record was a single-entity record of
    /// that type, `mixed` otherwise (including empty batches).
    pub fn entity_label(&self) -> String {
        match self.label {
            Some(LabelState::Uniform(t)) => t.as_str().to_string(),
            _ => MIXED_ENTITY_LABEL.to_string(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error == 0
    }
}

/// Outcome of a sync job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncJobResult {
    pub success: bool,
    pub records_processed: u64,
    pub records_success: u64,
    pub records_error: u64,
    pub records_warning: u64,
    pub duration_ms: u64,
}

impl SyncJobResult {
    pub fn from_tally(tally: &RunTally, duration: Duration) -> Self {
        Self {
            success: tally.is_successful(),
            records_processed: tally.processed,
            records_success: tally.success,
            records_error: tally.error,
            records_warning: tally.warning,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Log the result
    pub fn log_summary(&self, instance_id: &InstanceId) {
        tracing::info!(
            instance_id = %instance_id,
            processed = self.records_processed,
            successful = self.records_success,
            failed = self.records_error,
            warnings = self.records_warning,
            duration_ms = self.duration_ms,
            "Sync completed"
        );

        if !self.success {
            tracing::warn!(
                instance_id = %instance_id,
                error_count = self.records_error,
                "Sync completed with errors"
            );
        }
    }
}

/// Per-instance outcome inside a due sweep
#[derive(Debug, Clone)]
pub struct SweepEntry {
    pub instance_id: InstanceId,
    pub outcome: std::result::Result<SyncJobResult, String>,
}

/// Summary of [`SyncEngine::run_due`](super::SyncEngine::run_due)
#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    pub entries: Vec<SweepEntry>,
    pub duration: Duration,
    /// Stopped early by a shutdown signal
    pub interrupted: bool,
}

impl SweepSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn push(
        &mut self,
        instance_id: InstanceId,
        outcome: std::result::Result<SyncJobResult, String>,
    ) {
        self.entries.push(SweepEntry {
            instance_id,
            outcome,
        });
    }

    /// Jobs that completed with no record errors
    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.outcome, Ok(r) if r.success))
            .count()
    }

    /// Jobs that completed but counted record errors
    pub fn partial(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.outcome, Ok(r) if !r.success))
            .count()
    }

    /// Jobs that aborted
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }

    pub fn is_successful(&self) -> bool {
        self.partial() == 0 && self.failed() == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            instances = self.entries.len(),
            succeeded = self.succeeded(),
            partial = self.partial(),
            failed = self.failed(),
            interrupted = self.interrupted,
            duration_secs = self.duration.as_secs(),
            "Due sweep completed"
        );

        for entry in &self.entries {
            if let Err(message) = &entry.outcome {
                tracing::warn!(instance_id = %entry.instance_id, error = %message, "Sync job failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts() {
        let mut tally = RunTally::new();
        tally.add_record(Some(EntityType::Indicators));
        tally.add_success();
        tally.add_record(Some(EntityType::Indicators));
        tally.add_failure(FailedRecord::new("ext-2", "boom"));

        assert_eq!(tally.processed, 2);
        assert_eq!(tally.success, 1);
        assert_eq!(tally.error, 1);
        assert!(!tally.is_successful());
        assert_eq!(tally.failed_records[0].external_id, "ext-2");
    }

    #[test]
    fn test_entity_label() {
        let mut tally = RunTally::new();
        assert_eq!(tally.entity_label(), "mixed");

        tally.add_record(Some(EntityType::Values));
        tally.add_record(Some(EntityType::Values));
        assert_eq!(tally.entity_label(), "values");

        tally.add_record(None);
        assert_eq!(tally.entity_label(), "mixed");

        let mut other = RunTally::new();
        other.add_record(Some(EntityType::Indicators));
        other.add_record(Some(EntityType::Values));
        assert_eq!(other.entity_label(), "mixed");
    }

    #[test]
    fn test_job_result_from_tally() {
        let mut tally = RunTally::new();
        tally.add_record(None);
        tally.add_success();
        tally.add_success();
        tally.add_success();

        let result = SyncJobResult::from_tally(&tally, Duration::from_millis(1500));
        assert!(result.success);
        assert_eq!(result.records_processed, 1);
        assert_eq!(result.records_success, 3);
        assert_eq!(result.duration_ms, 1500);
    }

    #[test]
    fn test_sweep_summary_counts() {
        let ok = SyncJobResult {
            success: true,
            records_processed: 1,
            records_success: 1,
            records_error: 0,
            records_warning: 0,
            duration_ms: 1,
        };
        let partial = SyncJobResult {
            success: false,
            records_error: 1,
            ..ok.clone()
        };

        let mut summary = SweepSummary::new();
        summary.push(InstanceId::new("a").unwrap(), Ok(ok));
        summary.push(InstanceId::new("b").unwrap(), Ok(partial));
        summary.push(InstanceId::new("c").unwrap(), Err("down".to_string()));

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.partial(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_successful());
    }
}
