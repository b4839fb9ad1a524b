use thiserror::Error;

/// Errors produced by the flow renderer and its file exports
#[derive(Debug, Error)]
pub enum FlowError {
    /// The host has no usable drawing surface. Degraded mode, not a failure.
    #[error("drawing surface unavailable")]
    UnsupportedEnvironment,

    /// The reduced-motion preference is active. Degraded mode, not a failure.
    #[error("reduced motion requested")]
    PreferenceOptOut,

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("GIF export failed: {0}")]
    Gif(#[from] gif::EncodingError),
}

impl FlowError {
    /// True for the two opt-out conditions that leave the renderer idle
    /// without anything having gone wrong.
    pub fn is_degraded_mode(&self) -> bool {
        matches!(
            self,
            FlowError::UnsupportedEnvironment | FlowError::PreferenceOptOut
        )
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_modes() {
        assert!(FlowError::UnsupportedEnvironment.is_degraded_mode());
        assert!(FlowError::PreferenceOptOut.is_degraded_mode());
        assert!(!FlowError::Config("bad".into()).is_degraded_mode());
    }

    #[test]
    fn test_io_conversion() {
        fn open_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/flow-field/file")?)
        }
        assert!(matches!(open_missing(), Err(FlowError::Io(_))));
    }
}
