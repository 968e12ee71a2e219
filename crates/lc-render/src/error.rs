pub type RenderResult<T> = Result<T, RenderError>;

/// Failures while rasterizing or encoding a scene.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Whole-scene capture failed on the first attempt and on the retry.
    #[error("scene capture failed after {attempts} attempts: {reason}")]
    CaptureFailed { attempts: u32, reason: String },

    /// The surface cannot encode the requested format.
    #[error("{0} output is not supported by this surface")]
    UnsupportedFormat(&'static str),

    /// A host drawing surface reported an error.
    #[error("surface error: {0}")]
    Surface(String),

    #[error("invalid data url: {0}")]
    DataUrl(String),
}

impl RenderError {
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn data_url(msg: impl Into<String>) -> Self {
        Self::DataUrl(msg.into())
    }
}
