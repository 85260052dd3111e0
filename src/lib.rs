//! EQL codec: plaintext envelopes for columns encrypted by an intercepting
//! database proxy, the query operands and SQL fragments that search them,
//! and the encrypt config that declares them.

pub mod config;
pub mod envelope;
pub mod error;
pub mod field;
pub mod plaintext;
pub mod query;
pub mod sql;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

pub use config::{
    CastAs, ColumnConfig, EncryptConfig, IndexOptions, Indexes, TableConfig,
    REFRESH_CONFIG_STATEMENT,
};
pub use envelope::{
    ciphertext_of, decode, decode_as, encode, encode_json, encode_value, extract_plaintext,
    payload_kind, plaintext_of,
};
pub use error::{CodecError, Result};
pub use field::EncryptedColumn;
pub use plaintext::{Document, Plaintext, PlaintextKind, PlaintextValue};
pub use query::{
    ejson_path_query, encode_query_operand, encode_query_value, jsonb_query, match_query,
    ore_query, unique_query, QueryMode,
};
pub use sql::{CompareOp, FragmentBuilder, Placeholder, SortDirection, SqlFragment, SqlOptions};
#[cfg(feature = "sqlite")]
pub use sqlite::EncodedEnvelope;
pub use types::{Envelope, EnvelopeKind, TableColumn, ENVELOPE_VERSION};
