//! Admin dashboard, analytics, uploads, hero content, and audit logs.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use chrono::{Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use yiaga_core::{
    models::{AuditLog, BlogPost, HeroContent, PostType, SUBSCRIPTION_TOPICS, Subscriber},
    validation::{require, sanitize_filename},
};

use super::newest_first;
use crate::auth::Claims;
use crate::error::{ApiError, ApiResult, JsonBody};
use crate::server::AppState;

/// Dashboard counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Registered users.
    pub users: usize,
    /// Blog posts.
    pub blogs: usize,
    /// News items.
    pub news: usize,
    /// Active newsletter subscribers.
    pub subscribers: usize,
}

/// `GET /api/dashboard/stats`
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let posts = state.store.collection::<BlogPost>()?.list()?;
    let count_kind = |kind: PostType| posts.iter().filter(|p| p.kind == kind).count();

    let subscribers = state
        .store
        .collection::<Subscriber>()?
        .list()?
        .iter()
        .filter(|s| s.is_active)
        .count();

    Ok(Json(DashboardStats {
        users: state.auth.users.count(),
        blogs: count_kind(PostType::Blog),
        news: count_kind(PostType::News),
        subscribers,
    }))
}

/// Newsletter subscriber analytics.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriberAnalytics {
    /// Active subscribers.
    pub total_active: usize,
    /// Inactive subscribers.
    pub total_unsubscribed: usize,
    /// Subscriptions created in the last 7 days.
    pub new_this_week: usize,
    /// Active subscribers per tracked topic.
    pub topic_breakdown: BTreeMap<String, usize>,
}

/// `GET /api/subscribers/analytics`
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn subscriber_analytics(
    State(state): State<AppState>,
) -> ApiResult<Json<SubscriberAnalytics>> {
    let subscribers = state.store.collection::<Subscriber>()?.list()?;
    let week_ago = Utc::now() - Duration::days(7);

    let mut topic_breakdown: BTreeMap<String, usize> = SUBSCRIPTION_TOPICS
        .iter()
        .map(|t| ((*t).to_string(), 0))
        .collect();
    for sub in subscribers.iter().filter(|s| s.is_active) {
        for topic in &sub.subscriptions {
            if let Some(count) = topic_breakdown.get_mut(topic) {
                *count += 1;
            }
        }
    }

    let total_active = subscribers.iter().filter(|s| s.is_active).count();
    Ok(Json(SubscriberAnalytics {
        total_active,
        total_unsubscribed: subscribers.len() - total_active,
        new_this_week: subscribers
            .iter()
            .filter(|s| s.meta.created_at >= week_ago)
            .count(),
        topic_breakdown,
    }))
}

/// Stored upload location.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Public URL of the stored file.
    pub url: String,
    /// Stored file name.
    pub filename: String,
}

/// `POST /api/upload`
///
/// Takes the multipart field `file` and stores it under the upload
/// directory with a timestamp prefix.
///
/// # Errors
///
/// Returns 400 if the field is missing, unnamed, or over the size limit.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = sanitize_filename(field.file_name().unwrap_or_default())?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;

        let filename = format!("{}-{name}", Utc::now().timestamp());
        let dir = state.config.upload_dir();
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&filename), &data).await?;

        let prefix = state.config.uploads.url_prefix.trim_end_matches('/');
        tracing::info!(file = %filename, bytes = data.len(), "File uploaded");
        return Ok(Json(UploadResponse {
            url: format!("{prefix}/{filename}"),
            filename,
        }));
    }

    Err(ApiError::Validation("Error retrieving the file".to_string()))
}

/// `GET /api/content/hero/{page}`
///
/// An unknown page yields an empty record for that page rather than 404.
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn get_hero(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> ApiResult<Json<HeroContent>> {
    let hero = state
        .store
        .collection::<HeroContent>()?
        .find_by("page", &page)?
        .unwrap_or_else(|| HeroContent {
            page,
            ..HeroContent::default()
        });
    Ok(Json(hero))
}

/// `POST /api/content/hero`: insert or replace by `page`.
///
/// # Errors
///
/// Returns 400 without a page.
pub async fn upsert_hero(
    State(state): State<AppState>,
    JsonBody(mut hero): JsonBody<HeroContent>,
) -> ApiResult<Json<HeroContent>> {
    require("page", &hero.page)?;
    let heroes = state.store.collection::<HeroContent>()?;

    let hero = match heroes.find_by("page", &hero.page)? {
        Some(existing) => {
            hero.meta.id = existing.meta.id;
            heroes.update(hero)?
        }
        None => heroes.insert(hero)?,
    };
    tracing::info!(page = %hero.page, "Hero content saved");
    Ok(Json(hero))
}

/// `GET /api/audit-logs`: newest first.
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_audit_logs(State(state): State<AppState>) -> ApiResult<Json<Vec<AuditLog>>> {
    let mut logs = state.store.collection::<AuditLog>()?.list()?;
    newest_first(&mut logs);
    Ok(Json(logs))
}

/// `POST /api/audit-logs`
///
/// Missing timestamp and actor fields are filled from the clock and the
/// caller's token.
///
/// # Errors
///
/// Returns 400 without an action.
pub async fn create_audit_log(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(mut log): JsonBody<AuditLog>,
) -> ApiResult<Json<AuditLog>> {
    require("action", &log.action)?;
    if log.timestamp.is_empty() {
        log.timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    if log.user_id.is_empty() {
        log.user_id = claims.sub;
    }
    if log.user_role.is_empty() {
        log.user_role = claims.role.to_string();
    }

    let log = state.store.collection::<AuditLog>()?.insert(log)?;
    Ok(Json(log))
}
