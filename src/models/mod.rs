use bson::Document;

/// A single source document exactly as the remote data service returned it:
/// BSON bytes with no fixed schema. The field set varies per sensor and
/// reading type.
pub type RawRecord = Vec<u8>;

/// A decoded source document after destination enrichment. `bson::Document`
/// keeps the dynamic shape intact (null, bool, number, string, array, nested
/// document) so unknown fields pass through untouched.
pub type TabularRecord = Document;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("filter encoding error: {0}")]
    Encoding(#[from] bson::ser::Error),

    #[error("decode error: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("index error: {0}")]
    Index(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("zero documents matched the sync window")]
    NoData,
}

pub type Result<T> = std::result::Result<T, SyncError>;
