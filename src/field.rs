//! Typed column bindings: the to-storage / from-storage hooks an ORM
//! field calls for an encrypted column.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::envelope::{decode, encode};
use crate::error::Result;
use crate::plaintext::{Plaintext, PlaintextKind};
use crate::query::{ejson_path_query, encode_query_operand, QueryMode};
use crate::types::TableColumn;

/// An encrypted column holding plaintexts of type `T`.
///
/// Binds the table/column context once so every field of that column
/// shares one converter instead of one hand-written type per field.
pub struct EncryptedColumn<T> {
    target: TableColumn,
    _plaintext: PhantomData<fn() -> T>,
}

impl<T: Plaintext> EncryptedColumn<T> {
    pub fn new(table: &str, column: &str) -> Result<Self> {
        Ok(Self {
            target: TableColumn::new(table, column)?,
            _plaintext: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        self.target.table()
    }

    pub fn column(&self) -> &str {
        self.target.column()
    }

    pub fn target(&self) -> &TableColumn {
        &self.target
    }

    pub fn kind(&self) -> PlaintextKind {
        T::KIND
    }

    /// Encode a value for writing to this column.
    pub fn to_db(&self, value: &T) -> Result<Vec<u8>> {
        encode(value, self.table(), self.column())
    }

    /// Decode a value read back from this column.
    pub fn from_db(&self, data: &[u8]) -> Result<T> {
        decode(data).inspect_err(|e| {
            debug!(
                table = self.table(),
                column = self.column(),
                error = %e,
                "failed to decode column value"
            );
        })
    }

    /// Encode a nullable value. `None` is SQL NULL and produces no envelope.
    pub fn to_db_nullable(&self, value: Option<&T>) -> Result<Option<Vec<u8>>> {
        value.map(|v| self.to_db(v)).transpose()
    }

    /// Decode a nullable column value. SQL NULL decodes to `None`.
    pub fn from_db_nullable(&self, data: Option<&[u8]>) -> Result<Option<T>> {
        data.map(|d| self.from_db(d)).transpose()
    }

    /// Build a query operand against this column.
    pub fn operand(&self, value: &T, mode: QueryMode) -> Result<Vec<u8>> {
        encode_query_operand(value, self.table(), self.column(), mode)
    }

    /// Build a JSONPath operand against this column.
    pub fn path_operand(&self, path: &str) -> Result<Vec<u8>> {
        ejson_path_query(path, self.table(), self.column())
    }
}

impl<T> Clone for EncryptedColumn<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            _plaintext: PhantomData,
        }
    }
}

impl<T> fmt::Debug for EncryptedColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedColumn")
            .field("table", &self.target.t)
            .field("column", &self.target.c)
            .finish()
    }
}
