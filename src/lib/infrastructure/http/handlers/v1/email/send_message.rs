//! Send message handler

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::email::{EmailMessage, EmailService, TemplateParameters},
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::{correlation_id, CommandQuery};

/// Send message request body
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageBody {
    /// Identifies the call in logs and errors; generated when absent
    #[serde(default)]
    #[schema(example = "7f9c24e5-7c0e-4f6a-9b1d-2d5f0f6e8a11")]
    pub correlation_id: Option<String>,

    /// The message to send; `to` must be set
    #[schema(value_type = Object, example = json!({
        "to": "user@example.com",
        "subject": { "en": "Welcome, {{name}}", "fr": "Bienvenue, {{name}}" },
        "text": "Hello {{name}}"
    }))]
    pub message: EmailMessage,

    /// Template variables
    #[serde(default)]
    #[schema(value_type = Object, example = json!({ "name": "Jane" }))]
    pub parameters: TemplateParameters,
}

/// Send a message to the addresses in its `to` field
#[utoipa::path(
    post,
    operation_id = "send_message",
    tag = "Email",
    path = "/v1/email/send_message",
    params(CommandQuery),
    request_body = SendMessageBody,
    responses(
        (status = StatusCode::NO_CONTENT, description = "Message sent, or sending is disabled"),
        (status = StatusCode::BAD_REQUEST, description = "Transport closed or no recipient", body = ErrorResponse, example = json!({ "error": "emails disabled, or email recipient not set", "code": "EMAIL_DISABLED" })),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid template or address", body = ErrorResponse),
        (status = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error", body = ErrorResponse),
    )
)]
pub async fn handler<E: EmailService>(
    State(state): State<AppState<E>>,
    Query(query): Query<CommandQuery>,
    request: Result<Json<SendMessageBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = request?;
    let correlation_id = correlation_id(request.correlation_id, query);

    state
        .emails
        .send_message(&correlation_id, &request.message, &request.parameters)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        domain::email::{tests::MockEmailService, EmailError, MessageTemplate},
        infrastructure::http::{errors::ErrorResponse, router, state::tests::test_state},
    };

    #[tokio::test]
    async fn test_send_message_success() -> TestResult {
        let mut emails = MockEmailService::new();

        emails
            .expect_send_message()
            .withf(|correlation_id, message, parameters| {
                correlation_id == "abc"
                    && message.to.as_deref() == Some("user@example.com")
                    && message.subject == Some(MessageTemplate::from("Hi {{name}}"))
                    && parameters.get("name") == Some(&json!("Jane"))
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let response = TestServer::new(router(test_state(Some(emails))))?
            .post("/v1/email/send_message")
            .json(&json!({
                "correlation_id": "abc",
                "message": { "to": "user@example.com", "subject": "Hi {{name}}" },
                "parameters": { "name": "Jane" }
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_generates_correlation_id() -> TestResult {
        let mut emails = MockEmailService::new();

        emails
            .expect_send_message()
            .withf(|correlation_id, _, parameters| {
                Uuid::parse_str(correlation_id).is_ok() && parameters.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let response = TestServer::new(router(test_state(Some(emails))))?
            .post("/v1/email/send_message")
            .json(&json!({ "message": { "to": "user@example.com" } }))
            .await;

        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_reads_correlation_id_from_query() -> TestResult {
        let mut emails = MockEmailService::new();

        emails
            .expect_send_message()
            .withf(|correlation_id, _, _| correlation_id == "legacy-1")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let response = TestServer::new(router(test_state(Some(emails))))?
            .post("/v1/email/send_message")
            .add_query_param("correlation_id", "legacy-1")
            .json(&json!({ "message": { "to": "user@example.com" } }))
            .await;

        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_disabled() -> TestResult {
        let mut emails = MockEmailService::new();

        emails.expect_send_message().returning(|correlation_id, _, _| {
            Err(EmailError::disabled(
                correlation_id,
                "emails disabled, or email recipient not set",
            ))
        });

        let response = TestServer::new(router(test_state(Some(emails))))?
            .post("/v1/email/send_message")
            .json(&json!({ "message": { "subject": "Hi" } }))
            .await;

        let json = response.json::<ErrorResponse>();

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(json.error, "emails disabled, or email recipient not set");
        assert_eq!(json.code.as_deref(), Some("EMAIL_DISABLED"));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_invalid_body() -> TestResult {
        let mut emails = MockEmailService::new();
        emails.expect_send_message().times(0);

        let response = TestServer::new(router(test_state(Some(emails))))?
            .post("/v1/email/send_message")
            .json(&json!({ "message": 42 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        Ok(())
    }
}
