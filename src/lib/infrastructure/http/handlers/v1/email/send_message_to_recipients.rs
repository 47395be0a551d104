//! Send message to recipients handler

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

/// Send message to recipients request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageToRecipientsBody {
    /// Identifies the call in logs and errors; generated when absent
    #[serde(default)]
    pub correlation_id: Option<String>,

    /// The recipients; each one gets a separately rendered message
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub recipients: Vec<EmailRecipient>,

    /// The message to send
    #[schema(value_type = Object)]
    pub message: EmailMessage,

    /// Template variables
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: TemplateParameters,
}

/// Send a message to each recipient in their own language
#[utoipa::path(
    post,
    operation_id = "send_message_to_recipients",
    tag = "Email",
    path = "/v1/email/send_message_to_recipients",
    params(CommandQuery),
    request_body = SendMessageToRecipientsBody,
    responses(
        (status = StatusCode::NO_CONTENT, description = "Messages sent, or sending is disabled"),
        (status = StatusCode::BAD_REQUEST, description = "Transport closed or no recipients", body = ErrorResponse, example = json!({ "error": "emails disabled, or no recipients sent", "code": "EMAIL_DISABLED" })),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid template or address", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService>(
    State(state): State<AppState<E>>,
    Query(query): Query<CommandQuery>,
    request: Result<Json<SendMessageToRecipientsBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request?;
    let correlation_id = correlation_id(request.correlation_id, query);

    state
        .emails
        .send_message_to_recipients(
            &correlation_id,
            &request.recipients,
            &request.message,
            &request.parameters,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
