//! Route dispatch table.
//!
//! Routes fall into three groups: always public, always gated by
//! [`require_auth`], and `GET /api/comments`, which is registered publicly
//! and gates itself unless scoped to a post.
//!
//! The gate wraps each gated method handler rather than the whole router,
//! so a wrong method on any known path is a 405 whether or not a token is
//! sent.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{MethodRouter, delete, get, post, put},
};
use yiaga_core::models::{Announcement, Badge, BlogPost, Comment, Initiative, Job, Partner, Resource};

use crate::auth::{AuthState, require_auth};
use crate::error::ApiError;
use crate::handlers::{self, auth, cms, comments, content, forms, users};
use crate::server::AppState;

/// Build the API router.
pub fn router(state: AppState) -> Router {
    public_routes()
        .merge(gated_routes(&state))
        .fallback(not_found)
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/login", post(auth::login))
        .route("/api/signup", post(auth::signup))
        .route("/api/contact", post(forms::submit_contact))
        .route("/api/subscribe", post(forms::subscribe))
        .route("/api/announcements", get(content::list_announcements))
        .route("/api/blogs", get(content::list_blogs))
        // Shares its template with the gated id routes; GET reads a slug.
        .route("/api/blogs/{id}", get(content::get_blog))
        .route("/api/initiatives", get(content::list_initiatives))
        .route("/api/initiatives/{id}", get(content::get_initiative))
        .route("/api/resources", get(content::list_resources))
        .route("/api/jobs", get(content::list_jobs))
        .route("/api/partners", get(handlers::list_records::<Partner>))
        .route("/api/badges", get(handlers::list_records::<Badge>))
        // Dual-mode: public with post_id, gated inline otherwise.
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
}

fn gated_routes(state: &AppState) -> Router<AppState> {
    let upload_limit = state.config.uploads.max_bytes;
    let gated = |handlers: MethodRouter<AppState>| gate(handlers, &state.auth);

    Router::new()
        .route("/api/dashboard/stats", gated(get(cms::dashboard_stats)))
        .route("/api/subscribers/analytics", gated(get(cms::subscriber_analytics)))
        .route(
            "/api/upload",
            gated(post(cms::upload).layer(DefaultBodyLimit::max(upload_limit))),
        )
        .route("/api/content/hero/{page}", gated(get(cms::get_hero)))
        .route("/api/content/hero", gated(post(cms::upsert_hero)))
        .route("/api/announcements", gated(post(content::create_announcement)))
        .route(
            "/api/announcements/{id}",
            gated(delete(handlers::delete_record::<Announcement>)),
        )
        .route("/api/blogs", gated(post(content::create_blog)))
        .route(
            "/api/blogs/{id}",
            gated(put(content::update_blog).delete(handlers::delete_record::<BlogPost>)),
        )
        .route("/api/initiatives", gated(post(content::create_initiative)))
        .route(
            "/api/initiatives/{id}",
            gated(put(content::update_initiative).delete(handlers::delete_record::<Initiative>)),
        )
        .route("/api/resources", gated(post(content::create_resource)))
        .route(
            "/api/resources/{id}",
            gated(delete(handlers::delete_record::<Resource>)),
        )
        .route("/api/jobs", gated(post(content::create_job)))
        .route(
            "/api/jobs/{id}",
            gated(put(content::update_job).delete(handlers::delete_record::<Job>)),
        )
        .route("/api/partners", gated(post(handlers::create_record::<Partner>)))
        .route(
            "/api/partners/{id}",
            gated(delete(handlers::delete_record::<Partner>)),
        )
        .route("/api/badges", gated(post(handlers::create_record::<Badge>)))
        .route(
            "/api/badges/{id}",
            gated(delete(handlers::delete_record::<Badge>)),
        )
        .route("/api/comments/{id}/status", gated(put(comments::update_comment_status)))
        .route(
            "/api/comments/{id}",
            gated(delete(handlers::delete_record::<Comment>)),
        )
        .route("/api/users", gated(get(users::list_users).post(users::create_user)))
        .route(
            "/api/users/{id}",
            gated(put(users::update_user).delete(users::delete_user)),
        )
        .route(
            "/api/audit-logs",
            gated(get(cms::list_audit_logs).post(cms::create_audit_log)),
        )
}

/// Put `handlers` behind the access gate.
///
/// `route_layer` on a method router leaves its 405 fallback unwrapped.
fn gate(handlers: MethodRouter<AppState>, auth: &Arc<AuthState>) -> MethodRouter<AppState> {
    handlers.route_layer(middleware::from_fn_with_state(auth.clone(), require_auth))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
