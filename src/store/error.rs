#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create cache database parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to encode cache payload: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("tag index entry `{tag}` is not a json key list: {source}")]
    CorruptTagIndex {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}
