//! Send message to recipient handler

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::email::{EmailMessage, EmailRecipient, EmailService, TemplateParameters},
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::{correlation_id, CommandQuery};

/// Send message to recipient request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageToRecipientBody {
    /// Identifies the call in logs and errors; generated when absent
    #[serde(default)]
    pub correlation_id: Option<String>,

    /// The recipient; every field is available to the templates
    #[schema(value_type = Object, example = json!({
        "email": "marie@example.com",
        "name": "Marie",
        "language": "fr"
    }))]
    pub recipient: EmailRecipient,

    /// The message to send
    #[schema(value_type = Object)]
    pub message: EmailMessage,

    /// Template variables
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: TemplateParameters,
}

/// Send a message to one recipient in the recipient's language
#[utoipa::path(
    post,
    operation_id = "send_message_to_recipient",
    tag = "Email",
    path = "/v1/email/send_message_to_recipient",
    params(CommandQuery),
    request_body = SendMessageToRecipientBody,
    responses(
        (status = StatusCode::NO_CONTENT, description = "Message sent, or sending is disabled"),
        (status = StatusCode::BAD_REQUEST, description = "Transport closed or recipient has no email", body = ErrorResponse, example = json!({ "error": "emails disabled, or recipients email not set", "code": "EMAIL_DISABLED" })),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid template or address", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService>(
    State(state): State<AppState<E>>,
    Query(query): Query<CommandQuery>,
    request: Result<Json<SendMessageToRecipientBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request?;
    let correlation_id = correlation_id(request.correlation_id, query);

    state
        .emails
        .send_message_to_recipient(
            &correlation_id,
            &request.recipient,
            &request.message,
            &request.parameters,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
