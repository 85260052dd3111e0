use thiserror::Error;

use crate::plaintext::PlaintextKind;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported plaintext type: {0}")]
    UnsupportedType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Invalid format: missing 'p' field")]
    MissingPlaintextField,

    #[error("Invalid number format in 'p' field: {0}")]
    MalformedNumber(String),

    #[error("Invalid boolean format in 'p' field: {0:?}")]
    MalformedBoolean(String),

    #[error("Error parsing 'p' JSON string: {0}")]
    MalformedDocument(String),

    #[error("Invalid identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("Column {table}.{column} is not configured for encryption")]
    UnknownColumn { table: String, column: String },

    #[error("Column {table}.{column} has no {index} index")]
    IndexNotConfigured {
        table: String,
        column: String,
        index: &'static str,
    },

    #[error("Column {table}.{column} is cast as {expected}, got a {got} operand")]
    KindMismatch {
        table: String,
        column: String,
        expected: PlaintextKind,
        got: PlaintextKind,
    },

    #[error("Column {table}.{column} is cast as {cast_as}, {value} is out of range")]
    OutOfRange {
        table: String,
        column: String,
        cast_as: &'static str,
        value: i64,
    },

    #[error("Invalid encrypt config: {0}")]
    InvalidConfig(String),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
