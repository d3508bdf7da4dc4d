#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout engine returned no position for node `{0}`")]
    MissingPosition(String),
    #[error("layout engine returned a non-finite position for node `{0}`")]
    NonFinite(String),
}
