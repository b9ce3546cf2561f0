/// Convenience result type used across treeflow.
pub type TreeflowResult<T> = Result<T, TreeflowError>;

/// Top-level error taxonomy used by library APIs.
#[derive(thiserror::Error, Debug)]
pub enum TreeflowError {
    /// Invalid user-provided configuration or parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// A tree description that cannot route every possible record.
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// A record reached a split node with no branch for its attribute value.
    #[error("routing error: {0}")]
    NoMatchingBranch(String),

    /// The passenger dataset could not be read or parsed.
    #[error("data source error: {0}")]
    DataSource(String),

    /// Errors raised by a rendering surface.
    #[error("render error: {0}")]
    Render(String),

    /// Errors raised while writing frames to a sink.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TreeflowError {
    /// Build a [`TreeflowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TreeflowError::MalformedTree`] value.
    pub fn malformed_tree(msg: impl Into<String>) -> Self {
        Self::MalformedTree(msg.into())
    }

    /// Build a [`TreeflowError::NoMatchingBranch`] value.
    pub fn no_matching_branch(msg: impl Into<String>) -> Self {
        Self::NoMatchingBranch(msg.into())
    }

    /// Build a [`TreeflowError::DataSource`] value.
    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    /// Build a [`TreeflowError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`TreeflowError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`TreeflowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
