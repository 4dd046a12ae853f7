pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("syntax tree JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid syntax tree: {message}")]
    InvalidTree { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}
