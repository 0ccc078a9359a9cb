/// Top-level error type for the changeset log cache.
/// All subsystem errors convert into this via `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum CsetError {
    #[error("changelog fetch failed after retries: {0}")]
    FetchFailed(String),

    #[error("boundary revision {revision} not found while filling {direction}")]
    BoundaryAbsent {
        revision: String,
        direction: &'static str,
    },

    #[error("store error: {0}")]
    Store(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(
        "inconsistent count after compact: tip revnum {tip_revnum} != rowcount {rowcount}"
    )]
    InconsistentCount { tip_revnum: i64, rowcount: i64 },

    #[error("config error: {0}")]
    Config(String),

    #[error("json decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("shutting down while waiting for {0}")]
    ShuttingDown(String),
}

/// Convenience type alias.
pub type CsetResult<T> = Result<T, CsetError>;
