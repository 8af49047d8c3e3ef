#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// The backend session is gone and the operator has to log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}
