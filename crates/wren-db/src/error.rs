use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "SQLite FTS5 is not available in this build ({0}); \
         the message index cannot be created"
    )]
    FtsUnavailable(String),

    #[error("message index missing after migration")]
    FtsMissing,

    #[error("message not found: {0}")]
    MessageNotFound(String),
}
