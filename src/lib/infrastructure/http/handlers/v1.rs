//! Version 1 of the email API

use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    domain::email::EmailService,
    infrastructure::http::{open_api::ApiDocs, state::AppState},
};

pub mod email;

/// Routes mounted under `/v1/email`
pub fn router<E: EmailService>() -> Router<AppState<E>> {
    Router::new()
        .route("/openapi.json", get(Json(ApiDocs::openapi())))
        .route("/send_message", post(email::send_message::handler))
        .route(
            "/send_message_to_recipient",
            post(email::send_message_to_recipient::handler),
        )
        .route(
            "/send_message_to_recipients",
            post(email::send_message_to_recipients::handler),
        )
}
