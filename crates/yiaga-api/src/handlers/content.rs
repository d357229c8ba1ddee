//! Public content reads and their admin mutations.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use yiaga_core::{
    models::{Announcement, BlogPost, Initiative, Job, PostType, PublishStatus, Resource},
    validation::{require, slugify},
};

use super::{display_date, newest_first, parse_id, replace_record};
use crate::error::{ApiError, ApiResult, JsonBody, QueryParams};
use crate::server::AppState;

/// Category value that means "no filter".
const ALL_CATEGORIES: &str = "All";

fn category_filter(category: Option<String>) -> Option<String> {
    category.filter(|c| !c.is_empty() && c != ALL_CATEGORIES)
}

fn unsluggable_title() -> ApiError {
    ApiError::Validation("title must contain a letter or digit to derive a slug".to_string())
}

/// Sort by publication time (unpublished last), newest first.
fn newest_published<T>(items: &mut [T], published_at: impl Fn(&T) -> Option<chrono::DateTime<Utc>>) {
    items.sort_by(|a, b| published_at(b).cmp(&published_at(a)));
}

/// `GET /api/announcements`: published only, newest first.
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_announcements(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Announcement>>> {
    let mut items: Vec<Announcement> = state
        .store
        .collection::<Announcement>()?
        .list()?
        .into_iter()
        .filter(|a| a.status == PublishStatus::Published)
        .collect();
    newest_published(&mut items, |a| a.published_at);
    Ok(Json(items))
}

/// `POST /api/announcements`
///
/// # Errors
///
/// Returns 400 without a title.
pub async fn create_announcement(
    State(state): State<AppState>,
    JsonBody(mut announcement): JsonBody<Announcement>,
) -> ApiResult<Json<Announcement>> {
    require("title", &announcement.title)?;
    announcement.published_at = Some(Utc::now());
    let announcement = state.store.collection::<Announcement>()?.insert(announcement)?;
    Ok(Json(announcement))
}

/// Query for `GET /api/blogs`.
#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    /// `blog` or `news`.
    #[serde(rename = "type")]
    pub kind: Option<PostType>,
    /// Category; `All` means no filter.
    pub category: Option<String>,
}

/// `GET /api/blogs`
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_blogs(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<BlogQuery>,
) -> ApiResult<Json<Vec<BlogPost>>> {
    let category = category_filter(query.category);
    let mut posts: Vec<BlogPost> = state
        .store
        .collection::<BlogPost>()?
        .list()?
        .into_iter()
        .filter(|p| query.kind.is_none_or(|k| p.kind == k))
        .filter(|p| category.as_ref().is_none_or(|c| &p.category == c))
        .collect();
    newest_published(&mut posts, |p| p.published_at);
    Ok(Json(posts))
}

/// `GET /api/blogs/{slug}`
///
/// # Errors
///
/// Returns 404 for an unknown slug.
pub async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<BlogPost>> {
    state
        .store
        .collection::<BlogPost>()?
        .find_by("slug", &slug)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// `POST /api/blogs`
///
/// An empty slug is derived from the title plus the current Unix time.
///
/// # Errors
///
/// Returns 400 without a title, when no slug can be derived from it, or for
/// a taken slug.
pub async fn create_blog(
    State(state): State<AppState>,
    JsonBody(mut post): JsonBody<BlogPost>,
) -> ApiResult<Json<BlogPost>> {
    require("title", &post.title)?;
    let now = Utc::now();
    if post.slug.trim().is_empty() {
        let base = slugify(&post.title);
        if base.is_empty() {
            return Err(unsluggable_title());
        }
        post.slug = format!("{base}-{}", now.timestamp());
    }
    post.published_at.get_or_insert(now);
    if post.date.is_empty() {
        post.date = display_date(now);
    }

    let post = state.store.collection::<BlogPost>()?.insert(post)?;
    Ok(Json(post))
}

/// Body for `PUT /api/blogs/{id}`: the fields the admin editor owns.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogEdit {
    /// Title.
    pub title: String,
    /// Teaser text.
    pub excerpt: String,
    /// Rich-text body.
    pub content: String,
    /// Cover image URL.
    pub image: String,
    /// Category.
    pub category: String,
    /// Author name.
    pub author: String,
    /// Blog or news; unchanged when absent.
    #[serde(rename = "type")]
    pub kind: Option<PostType>,
}

impl BlogEdit {
    fn apply(self, post: &mut BlogPost) {
        post.title = self.title;
        post.excerpt = self.excerpt;
        post.content = self.content;
        post.image = self.image;
        post.category = self.category;
        post.author = self.author;
        if let Some(kind) = self.kind {
            post.kind = kind;
        }
    }
}

/// `PUT /api/blogs/{id}`
///
/// Only the editor's fields are replaced. Slug, date, tags, featured flag,
/// attachment and author role keep their stored values.
///
/// # Errors
///
/// Returns 400 without a title and 404 for an unknown id.
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(edit): JsonBody<BlogEdit>,
) -> ApiResult<Json<BlogPost>> {
    require("title", &edit.title)?;
    let id = parse_id(&id)?;
    let posts = state.store.collection::<BlogPost>()?;
    let mut post = posts
        .get(id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    edit.apply(&mut post);
    let post = posts.update(post)?;
    tracing::info!(post_id = id, "Post updated");
    Ok(Json(post))
}

/// `GET /api/initiatives`: newest first.
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_initiatives(State(state): State<AppState>) -> ApiResult<Json<Vec<Initiative>>> {
    let mut items = state.store.collection::<Initiative>()?.list()?;
    newest_first(&mut items);
    Ok(Json(items))
}

/// `GET /api/initiatives/{slug}`
///
/// # Errors
///
/// Returns 404 for an unknown slug.
pub async fn get_initiative(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Initiative>> {
    state
        .store
        .collection::<Initiative>()?
        .find_by("slug", &slug)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Initiative not found".to_string()))
}

/// `POST /api/initiatives`
///
/// # Errors
///
/// Returns 400 without a title, when no slug can be derived from it, or for
/// a taken slug.
pub async fn create_initiative(
    State(state): State<AppState>,
    JsonBody(mut initiative): JsonBody<Initiative>,
) -> ApiResult<Json<Initiative>> {
    require("title", &initiative.title)?;
    if initiative.slug.trim().is_empty() {
        initiative.slug = slugify(&initiative.title);
    }
    if initiative.slug.is_empty() {
        return Err(unsluggable_title());
    }
    let initiative = state.store.collection::<Initiative>()?.insert(initiative)?;
    Ok(Json(initiative))
}

/// `PUT /api/initiatives/{id}`
///
/// # Errors
///
/// Returns 404 for an unknown id.
pub async fn update_initiative(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(initiative): JsonBody<Initiative>,
) -> ApiResult<Json<Initiative>> {
    let initiative = replace_record(&state, &id, initiative, |old, new| {
        if new.slug.trim().is_empty() {
            new.slug.clone_from(&old.slug);
        }
    })?;
    Ok(Json(initiative))
}

/// Query for `GET /api/resources`.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    /// Category; `All` means no filter.
    pub category: Option<String>,
}

/// `GET /api/resources`
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_resources(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ResourceQuery>,
) -> ApiResult<Json<Vec<Resource>>> {
    let category = category_filter(query.category);
    let mut items: Vec<Resource> = state
        .store
        .collection::<Resource>()?
        .list()?
        .into_iter()
        .filter(|r| category.as_ref().is_none_or(|c| &r.category == c))
        .collect();
    newest_published(&mut items, |r| r.published_at);
    Ok(Json(items))
}

/// `POST /api/resources`
///
/// # Errors
///
/// Returns 400 without a title.
pub async fn create_resource(
    State(state): State<AppState>,
    JsonBody(mut resource): JsonBody<Resource>,
) -> ApiResult<Json<Resource>> {
    require("title", &resource.title)?;
    resource.published_at = Some(Utc::now());
    let resource = state.store.collection::<Resource>()?.insert(resource)?;
    Ok(Json(resource))
}

/// Query for `GET /api/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    /// `true` includes inactive openings.
    pub all: Option<String>,
}

/// `GET /api/jobs`: active openings unless `all=true`, newest first.
///
/// # Errors
///
/// Returns error if storage fails.
pub async fn list_jobs(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<JobQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    let include_inactive = query.all.as_deref() == Some("true");
    let mut jobs: Vec<Job> = state
        .store
        .collection::<Job>()?
        .list()?
        .into_iter()
        .filter(|j| include_inactive || j.is_active)
        .collect();
    newest_first(&mut jobs);
    Ok(Json(jobs))
}

/// `POST /api/jobs`
///
/// # Errors
///
/// Returns 400 without a title.
pub async fn create_job(
    State(state): State<AppState>,
    JsonBody(mut job): JsonBody<Job>,
) -> ApiResult<Json<Job>> {
    require("title", &job.title)?;
    job.posted = display_date(Utc::now());
    let job = state.store.collection::<Job>()?.insert(job)?;
    Ok(Json(job))
}

/// `PUT /api/jobs/{id}`
///
/// # Errors
///
/// Returns 404 for an unknown id.
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(job): JsonBody<Job>,
) -> ApiResult<Json<Job>> {
    let job = replace_record(&state, &id, job, |old, new| {
        new.posted.clone_from(&old.posted);
    })?;
    Ok(Json(job))
}
