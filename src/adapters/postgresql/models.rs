//! PostgreSQL row mapping
//!
//! Every table stores the full document in a `doc` JSONB column; these
//! helpers decode rows back into domain types.

use crate::domain::{IntegrationInstance, Provider, Result, SyncError, SyncRunLog};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_postgres::Row;

fn decode_doc<T: DeserializeOwned>(row: &Row, table: &str) -> Result<T> {
    let doc: Value = row
        .try_get("doc")
        .map_err(|e| SyncError::Database(format!("Failed to read {table}.doc: {e}")))?;

    serde_json::from_value(doc)
        .map_err(|e| SyncError::Serialization(format!("Invalid {table} document: {e}")))
}

pub fn instance_from_row(row: &Row) -> Result<IntegrationInstance> {
    decode_doc(row, "integration_instances")
}

pub fn provider_from_row(row: &Row) -> Result<Provider> {
    decode_doc(row, "providers")
}

pub fn sync_log_from_row(row: &Row) -> Result<SyncRunLog> {
    decode_doc(row, "sync_logs")
}

/// Decode all rows, failing on the first bad document
pub fn collect_rows<T>(rows: &[Row], decode: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(decode).collect()
}
