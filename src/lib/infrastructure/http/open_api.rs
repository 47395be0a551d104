//! OpenAPI module

use utoipa::OpenApi;

use crate::infrastructure::http::{errors::ErrorResponse, handlers::v1::*};

#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Email Service"),
    paths(
        email::send_message::handler,
        email::send_message_to_recipient::handler,
        email::send_message_to_recipients::handler,
    ),
    components(schemas(
        email::send_message::SendMessageBody,
        email::send_message_to_recipient::SendMessageToRecipientBody,
        email::send_message_to_recipients::SendMessageToRecipientsBody,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
