use thiserror::Error;

pub type BindResult<T> = Result<T, BindError>;

#[derive(Debug, Error)]
pub enum BindError {
    /// Invalid or missing option combination.
    #[error("{0}")]
    Validation(String),

    #[error("KafkaEventSource is not yet bound to an event source mapping")]
    NotBound,

    #[error("KafkaEventSource is already bound to event source mapping '{0}'")]
    AlreadyBound(String),

    #[error("function is not a construct node: {0}")]
    InvalidTarget(String),

    /// Raised by the function collaborator, e.g. a duplicate mapping id.
    #[error("target rejected {operation}: {reason}")]
    Target { operation: String, reason: String },

    #[error("subnet selection failed: {0}")]
    SubnetSelection(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BindError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BindError::Validation(msg.into())
    }

    pub fn target(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        BindError::Target {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
