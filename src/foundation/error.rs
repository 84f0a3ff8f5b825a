/// Convenience result type used across canvasfx.
pub type FxResult<T> = Result<T, FxError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum FxError {
    /// Alpha out of range, unknown blend mode, or malformed shadow arguments.
    #[error("invalid effect value: {0}")]
    InvalidEffectValue(String),

    /// The stencil source exposes neither a fill path nor bitmap data.
    #[error("invalid stencil source: {0}")]
    InvalidStencilSource(String),

    /// Bad dashboard variable definition or value.
    #[error("invalid variable spec: {0}")]
    InvalidVariableSpec(String),

    /// A color specification that could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The drawing backend rejected an operation (unbalanced groups, size mismatch, ...).
    #[error("surface error: {0}")]
    Surface(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxError {
    /// Build a [`FxError::InvalidEffectValue`] value.
    pub fn invalid_effect(msg: impl Into<String>) -> Self {
        Self::InvalidEffectValue(msg.into())
    }

    /// Build a [`FxError::InvalidStencilSource`] value.
    pub fn invalid_stencil(msg: impl Into<String>) -> Self {
        Self::InvalidStencilSource(msg.into())
    }

    /// Build a [`FxError::InvalidVariableSpec`] value.
    pub fn invalid_variable(msg: impl Into<String>) -> Self {
        Self::InvalidVariableSpec(msg.into())
    }

    /// Build a [`FxError::InvalidColor`] value.
    pub fn invalid_color(msg: impl Into<String>) -> Self {
        Self::InvalidColor(msg.into())
    }

    /// Build a [`FxError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}

/// Combine a body's result with the result of the cleanup that followed it.
///
/// The body's error wins; a cleanup error is only returned when the body succeeded, otherwise it
/// is logged and dropped.
pub(crate) fn prefer_primary<T>(primary: FxResult<T>, cleanup: FxResult<()>) -> FxResult<T> {
    match (primary, cleanup) {
        (Ok(v), Ok(())) => Ok(v),
        (Ok(_), Err(c)) => Err(c),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(c)) => {
            tracing::warn!(error = %c, primary = %e, "cleanup failed while unwinding");
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
