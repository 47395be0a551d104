//! Email command handlers

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub mod send_message;
pub mod send_message_to_recipient;
pub mod send_message_to_recipients;

/// Query string accepted by every email command
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommandQuery {
    /// Used when the request body carries no correlation id
    pub correlation_id: Option<String>,
}

/// Returns the caller's correlation id from the body, then the query string,
/// or a fresh one
fn correlation_id(body: Option<String>, query: CommandQuery) -> String {
    body.filter(|id| !id.trim().is_empty())
        .or_else(|| query.correlation_id.filter(|id| !id.trim().is_empty()))
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}
