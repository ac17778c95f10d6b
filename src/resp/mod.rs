use utoipa::ToSchema;

pub mod jwt;
pub mod problem;
pub mod util;

/// Plain confirmation body for actions that don't return a document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl ToString) -> ApiMessage {
        ApiMessage {
            message: message.to_string(),
        }
    }
}
