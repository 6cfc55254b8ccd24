/// Convenience result type used across the engine.
pub type MascotResult<T> = Result<T, MascotError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Composition never fails on missing art: unresolvable parts are omitted. Errors surface from
/// data loading, catalog validation and the render surface itself.
#[derive(thiserror::Error, Debug)]
pub enum MascotError {
    /// Invalid user-provided state or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Catalog data that references unknown categories or is otherwise malformed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// An asset could not be read, parsed or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// The offscreen surface could not be created or encoded.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MascotError {
    /// Build a [`MascotError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MascotError::Catalog`] value.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Build a [`MascotError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`MascotError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MascotError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
