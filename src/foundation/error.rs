pub type PinResult<T> = Result<T, PinError>;

#[derive(thiserror::Error, Debug)]
pub enum PinError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PinError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for failures caused by a rejected publishing credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<serde_json::Error> for PinError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
