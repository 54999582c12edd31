/// Result alias that carries the custom [`KeepsakeError`] type.
pub type Result<T> = std::result::Result<T, KeepsakeError>;

/// Common error type for the core crate.
///
/// Runtime paths (ticks, taps, persistence) recover locally and never return
/// this type; it is reserved for construction-time validation and the
/// command line surface.
#[derive(Debug, thiserror::Error)]
pub enum KeepsakeError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialization errors.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Puzzle boards need at least two tiles per side.
    #[error("puzzle size must be at least 2, got {0}")]
    InvalidPuzzleSize(usize),
    /// A scene identifier that the router does not know about.
    #[error("unknown scene `{0}`")]
    UnknownScene(String),
}

impl KeepsakeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for KeepsakeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for KeepsakeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
