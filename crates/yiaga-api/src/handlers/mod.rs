//! HTTP handlers.
//!
//! Handlers deserialize bodies with [`JsonBody`], talk to the record store
//! through [`AppState`] and return `ApiResult<Json<_>>`.

pub mod auth;
pub mod cms;
pub mod comments;
pub mod content;
pub mod forms;
pub mod users;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use yiaga_core::Record;

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::server::AppState;

/// Plain confirmation body: `{"message": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Human-readable confirmation.
    pub message: &'static str,
}

pub(crate) const fn message(message: &'static str) -> Json<Message> {
    Json(Message { message })
}

/// Parse a numeric id path segment.
pub(crate) fn parse_id(raw: &str) -> ApiResult<u64> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("Invalid id: {raw}")))
}

/// Date as shown on the site, e.g. "Mar 7, 2026".
pub(crate) fn display_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// Sort records newest first by creation time, then id.
pub(crate) fn newest_first<T: Record>(records: &mut [T]) {
    records.sort_by(|a, b| {
        (b.meta().created_at, b.id()).cmp(&(a.meta().created_at, a.id()))
    });
}

/// Run credential work (hashing) on the blocking pool.
pub(crate) async fn blocking<F, R>(work: F) -> ApiResult<R>
where
    F: FnOnce() -> ApiResult<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Yiaga Backend API is running",
    }))
}

/// `GET /api/health`
pub async fn health() -> &'static str {
    "ok"
}

/// List every record of a collection in id order.
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_records<T: Record>(State(state): State<AppState>) -> ApiResult<Json<Vec<T>>> {
    Ok(Json(state.store.collection::<T>()?.list()?))
}

/// Create a record from the request body as-is.
///
/// # Errors
///
/// Returns error if the body is invalid or storage fails.
pub async fn create_record<T: Record>(
    State(state): State<AppState>,
    JsonBody(record): JsonBody<T>,
) -> ApiResult<Json<T>> {
    let record = state.store.collection::<T>()?.insert(record)?;
    tracing::info!(collection = T::COLLECTION, id = record.id(), "Record created");
    Ok(Json(record))
}

/// Delete a record by id.
///
/// # Errors
///
/// Returns `NotFound` if the id is unknown.
pub async fn delete_record<T: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    let id = parse_id(&id)?;
    if !state.store.collection::<T>()?.delete(id)? {
        return Err(ApiError::NotFound(format!("{} {id} not found", T::COLLECTION)));
    }
    tracing::info!(collection = T::COLLECTION, id, "Record deleted");
    Ok(message("Deleted successfully"))
}

/// Replace a record by id, keeping its id and creation time.
pub(crate) fn replace_record<T: Record>(
    state: &AppState,
    raw_id: &str,
    mut record: T,
    merge: impl FnOnce(&T, &mut T),
) -> ApiResult<T> {
    let id = parse_id(raw_id)?;
    let collection = state.store.collection::<T>()?;
    let existing = collection
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", T::COLLECTION)))?;

    merge(&existing, &mut record);
    record.meta_mut().id = id;
    let record = collection.update(record)?;
    tracing::info!(collection = T::COLLECTION, id, "Record updated");
    Ok(record)
}
