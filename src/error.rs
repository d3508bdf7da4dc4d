use crate::layout::LayoutError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("png export failed: {0}")]
    Png(String),
}

pub type Result<T> = std::result::Result<T, Error>;
