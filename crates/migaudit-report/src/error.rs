/// Report error types
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Font error: {0}")]
    FontError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Report file already exists: {0}")]
    AlreadyExists(String),
}
