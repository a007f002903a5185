/// Crate-wide result alias.
pub type MockupResult<T> = Result<T, MockupError>;

/// Error taxonomy for template validation, composition, caching and commit.
#[derive(thiserror::Error, Debug)]
pub enum MockupError {
    /// Degenerate or malformed quadrilateral; rejected before anything is persisted.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Unreadable, unreachable or corrupt source image. Fails a single composition only.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Lookup missed the composition cache. Never user-visible; callers recompute.
    #[error("cache miss")]
    CacheMiss,

    /// The marketplace collaborator rejected a commit at `step`.
    #[error("commit error at {step}: {message}")]
    Commit {
        /// Step of the publish sequence that failed (for example `upload#2`).
        step: String,
        /// Message reported by the collaborator.
        message: String,
    },

    /// Decoded scene dimensions disagree with the template's recorded scene size.
    #[error(
        "scene mismatch for template '{template_id}': expected {expected_width}x{expected_height}, decoded {actual_width}x{actual_height}"
    )]
    SceneMismatch {
        /// Template whose scene no longer matches.
        template_id: String,
        /// Recorded width.
        expected_width: u32,
        /// Recorded height.
        expected_height: u32,
        /// Decoded width.
        actual_width: u32,
        /// Decoded height.
        actual_height: u32,
    },

    /// Input failed a structural check (workflow transition, config range, missing corners...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced template, pack or workflow item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Work was not started because its batch was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its context chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MockupError {
    /// Build a [`MockupError::Geometry`].
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`MockupError::ImageDecode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Build a [`MockupError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MockupError::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`MockupError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`MockupError::Commit`].
    pub fn commit(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Commit {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Whether the error belongs to a single batch item rather than to the whole batch.
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            Self::ImageDecode(_)
                | Self::SceneMismatch { .. }
                | Self::Cancelled
                | Self::Commit { .. }
        )
    }
}

impl From<serde_json::Error> for MockupError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
