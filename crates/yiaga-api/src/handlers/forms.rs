//! Public form submissions.

use axum::{Json, extract::State};
use chrono::Utc;
use yiaga_core::{
    models::{ContactMessage, ContactStatus, Subscriber},
    validation::{limits, normalize_email, require, sanitize_text},
};

use super::{Message, message};
use crate::error::{ApiResult, JsonBody};
use crate::server::AppState;

/// `POST /api/contact`
///
/// # Errors
///
/// Returns 400 for a missing name, bad email, or empty message.
pub async fn submit_contact(
    State(state): State<AppState>,
    JsonBody(mut contact): JsonBody<ContactMessage>,
) -> ApiResult<Json<Message>> {
    require("name", &contact.name)?;
    contact.email = normalize_email(&contact.email)?;
    contact.message = sanitize_text("message", &contact.message, limits::MAX_MESSAGE_LENGTH)?;
    contact.status = ContactStatus::New;

    let contact = state.store.collection::<ContactMessage>()?.insert(contact)?;
    tracing::info!(message_id = contact.meta.id, "Contact form submitted");
    Ok(message("Contact form submitted successfully"))
}

/// `POST /api/subscribe`
///
/// # Errors
///
/// Returns 400 for a bad email or one that is already subscribed.
pub async fn subscribe(
    State(state): State<AppState>,
    JsonBody(mut subscriber): JsonBody<Subscriber>,
) -> ApiResult<Json<Message>> {
    subscriber.email = normalize_email(&subscriber.email)?;
    subscriber.is_active = true;
    subscriber.subscribed_at = Some(Utc::now());

    let subscriber = state.store.collection::<Subscriber>()?.insert(subscriber)?;
    tracing::info!(subscriber_id = subscriber.meta.id, "Newsletter subscription added");
    Ok(message("Subscribed successfully"))
}
