//! rusqlite hooks for encrypted columns.
//!
//! Envelopes are stored as TEXT. A proxy in front of the database would
//! swap them for ciphertext on the way in and back on the way out; without
//! one, the envelope round-trips as-is, which is what the tests rely on.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;

use crate::error::{CodecError, Result};
use crate::field::EncryptedColumn;
use crate::plaintext::Plaintext;

/// Envelope bytes ready to bind as a statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEnvelope(pub Vec<u8>);

impl ToSql for EncodedEnvelope {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(&self.0)))
    }
}

impl<T: Plaintext> EncryptedColumn<T> {
    /// Bind a nullable value. `None` binds SQL NULL.
    pub fn bind(&self, value: Option<&T>) -> Result<Option<EncodedEnvelope>> {
        Ok(self.to_db_nullable(value)?.map(EncodedEnvelope))
    }

    /// Read this column from a result row.
    pub fn read(&self, row: &Row<'_>, idx: usize) -> Result<Option<T>> {
        match row.get_ref(idx)? {
            ValueRef::Null => Ok(None),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => self.from_db(bytes).map(Some),
            other => Err(CodecError::MalformedEnvelope(format!(
                "column {} holds a {} value",
                self.column(),
                other.data_type()
            ))),
        }
    }
}
