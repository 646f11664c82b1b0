#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum CoreError {
    #[error("vocabulary error: {0}")]
    Vocabulary(String),
    #[error("parse error: {0}")]
    Parse(String),
}
