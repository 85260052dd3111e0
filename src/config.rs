//! Encrypt configuration: which columns are encrypted, what they decrypt
//! to, and which proxy indexes they carry.
//!
//! Mirrors the proxy's config document:
//!
//! ```json
//! {"v":1,"tables":{"users":{"email":{"cast_as":"text","indexes":{"unique":{},"match":{}}}}}}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::envelope::{decode_as, encode_envelope, extract_plaintext};
use crate::error::{CodecError, Result};
use crate::plaintext::{PlaintextKind, PlaintextValue};
use crate::query::{encode_query_value, QueryMode};
use crate::types::{validate_column, validate_table};

/// Config document version understood by this crate.
pub const CONFIG_VERSION: u32 = 1;

/// Reloads the proxy's view of the config once indexes and constraints
/// are in place.
pub const REFRESH_CONFIG_STATEMENT: &str = "SELECT cs_refresh_encrypt_config();";

/// Type the proxy decrypts a column to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastAs {
    #[default]
    Text,
    Int,
    SmallInt,
    BigInt,
    Boolean,
    Jsonb,
}

impl CastAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            CastAs::Text => "text",
            CastAs::Int => "int",
            CastAs::SmallInt => "small_int",
            CastAs::BigInt => "big_int",
            CastAs::Boolean => "boolean",
            CastAs::Jsonb => "jsonb",
        }
    }

    pub fn kind(&self) -> PlaintextKind {
        match self {
            CastAs::Text => PlaintextKind::Text,
            CastAs::Int | CastAs::SmallInt | CastAs::BigInt => PlaintextKind::Integer,
            CastAs::Boolean => PlaintextKind::Boolean,
            CastAs::Jsonb => PlaintextKind::Document,
        }
    }

    /// Inclusive bounds of the Postgres integer type behind an integer cast.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            CastAs::SmallInt => Some((i16::MIN.into(), i16::MAX.into())),
            CastAs::Int => Some((i32::MIN.into(), i32::MAX.into())),
            CastAs::BigInt => Some((i64::MIN, i64::MAX)),
            CastAs::Text | CastAs::Boolean | CastAs::Jsonb => None,
        }
    }
}

/// Per-index options, passed through to the proxy untouched
/// (e.g. `{"token_filters":[{"kind":"downcase"}]}` or `{"prefix":"…"}`).
pub type IndexOptions = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indexes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<IndexOptions>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_: Option<IndexOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ore: Option<IndexOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ste_vec: Option<IndexOptions>,
}

impl Indexes {
    pub fn get(&self, mode: QueryMode) -> Option<&IndexOptions> {
        match mode {
            QueryMode::Unique => self.unique.as_ref(),
            QueryMode::Match => self.match_.as_ref(),
            QueryMode::Ore => self.ore.as_ref(),
            QueryMode::SteVec => self.ste_vec.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        QueryMode::ALL.iter().all(|mode| self.get(*mode).is_none())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default)]
    pub cast_as: CastAs,
    #[serde(default)]
    pub indexes: Indexes,
}

impl ColumnConfig {
    pub fn kind(&self) -> PlaintextKind {
        self.cast_as.kind()
    }

    pub fn supports(&self, mode: QueryMode) -> bool {
        self.indexes.get(mode).is_some()
    }

    /// Reject integers the column's Postgres type cannot hold.
    fn check_range(&self, table: &str, column: &str, value: &PlaintextValue) -> Result<()> {
        let (PlaintextValue::Integer(n), Some((min, max))) = (value, self.cast_as.integer_range())
        else {
            return Ok(());
        };
        if (min..=max).contains(n) {
            return Ok(());
        }
        Err(CodecError::OutOfRange {
            table: table.to_string(),
            column: column.to_string(),
            cast_as: self.cast_as.as_str(),
            value: *n,
        })
    }
}

/// Encrypted columns of one table, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableConfig {
    pub columns: BTreeMap<String, ColumnConfig>,
}

impl TableConfig {
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.get(name)
    }

    /// Decrypt-side row conversion.
    ///
    /// Configured columns holding a payload (a JSON object, or JSON text)
    /// are replaced by their plaintext; nulls and unconfigured columns pass
    /// through unchanged.
    pub fn decode_row(&self, row: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut out = Map::with_capacity(row.len());
        for (name, value) in row {
            let decoded = match (self.columns.get(name), value) {
                (None, _) | (Some(_), Value::Null) => value.clone(),
                (Some(config), Value::Object(_)) => {
                    let bytes = serde_json::to_vec(value)?;
                    decode_as(&bytes, config.kind())?.into_json()
                }
                (Some(config), Value::String(text)) => {
                    decode_as(text.as_bytes(), config.kind())?.into_json()
                }
                (Some(_), other) => {
                    debug!(column = %name, "unexpected payload shape in row");
                    return Err(CodecError::MalformedEnvelope(format!(
                        "column {} holds {}",
                        name, other
                    )));
                }
            };
            out.insert(name.clone(), decoded);
        }
        Ok(out)
    }
}

/// The full encrypt config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptConfig {
    pub v: u32,
    #[serde(default)]
    pub tables: BTreeMap<String, TableConfig>,
}

impl Default for EncryptConfig {
    fn default() -> Self {
        Self {
            v: CONFIG_VERSION,
            tables: BTreeMap::new(),
        }
    }
}

impl EncryptConfig {
    /// Parse and validate a config document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: EncryptConfig =
            serde_json::from_str(s).map_err(|e| CodecError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CodecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.v != CONFIG_VERSION {
            return Err(CodecError::InvalidConfig(format!(
                "unsupported config version {}",
                self.v
            )));
        }
        for (table, table_config) in &self.tables {
            validate_table(table)?;
            for (column, column_config) in &table_config.columns {
                validate_column(column)?;
                if column_config.indexes.is_empty() {
                    warn!(table = %table, column = %column, "encrypted column has no indexes and cannot be queried");
                }
            }
        }
        Ok(())
    }

    /// Register a column, replacing any previous entry.
    pub fn add_column(&mut self, table: &str, column: &str, config: ColumnConfig) -> Result<()> {
        validate_table(table)?;
        validate_column(column)?;
        self.tables
            .entry(table.to_string())
            .or_default()
            .columns
            .insert(column.to_string(), config);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.get(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Result<&ColumnConfig> {
        self.tables
            .get(table)
            .and_then(|t| t.column(column))
            .ok_or_else(|| CodecError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    fn require_index(&self, table: &str, column: &str, mode: QueryMode) -> Result<&ColumnConfig> {
        let config = self.column(table, column)?;
        if !config.supports(mode) {
            return Err(CodecError::IndexNotConfigured {
                table: table.to_string(),
                column: column.to_string(),
                index: mode.index_name(),
            });
        }
        Ok(config)
    }

    /// Build a query operand after checking the column can answer `mode`.
    ///
    /// Outside `ste_vec`, the operand must have the column's kind;
    /// `ste_vec` operands may be documents or scalar terms.
    pub fn query_operand(
        &self,
        table: &str,
        column: &str,
        mode: QueryMode,
        value: &PlaintextValue,
    ) -> Result<Vec<u8>> {
        let config = self.require_index(table, column, mode)?;
        if mode != QueryMode::SteVec {
            if value.kind() != config.kind() {
                return Err(CodecError::KindMismatch {
                    table: table.to_string(),
                    column: column.to_string(),
                    expected: config.kind(),
                    got: value.kind(),
                });
            }
            config.check_range(table, column, value)?;
        }
        encode_query_value(value, table, column, mode)
    }

    /// Build a JSONPath operand for a `ste_vec`-indexed column.
    pub fn path_operand(&self, table: &str, column: &str, path: &str) -> Result<Vec<u8>> {
        self.require_index(table, column, QueryMode::SteVec)?;
        encode_envelope(path.to_string(), table, column)
    }

    /// Decode a payload read from a configured column as its cast kind.
    pub fn decode_column(&self, table: &str, column: &str, data: &[u8]) -> Result<PlaintextValue> {
        let config = self.column(table, column)?;
        let p = extract_plaintext(data)?;
        let value = PlaintextValue::parse(config.kind(), &p)?;
        config.check_range(table, column, &value)?;
        Ok(value)
    }

    // ========================================================================
    // Setup SQL
    // ========================================================================

    /// `cs_add_index_v1` calls for every configured index, then the
    /// statements that encrypt and activate the config.
    ///
    /// Table and column names are checked here as well as on load, since
    /// `tables` can be filled without going through `validate`.
    pub fn setup_statements(&self) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for (table, table_config) in &self.tables {
            validate_table(table)?;
            for (column, config) in &table_config.columns {
                validate_column(column)?;
                for mode in QueryMode::ALL {
                    let Some(options) = config.indexes.get(mode) else {
                        continue;
                    };
                    let mut call = format!(
                        "SELECT cs_add_index_v1('{}', '{}', '{}', '{}'",
                        table,
                        column,
                        mode.index_name(),
                        config.cast_as.as_str()
                    );
                    if !options.is_empty() {
                        let opts = Value::Object(options.clone()).to_string();
                        call.push_str(&format!(", '{}'", opts.replace('\'', "''")));
                    }
                    call.push_str(");");
                    statements.push(call);
                }
            }
        }
        statements.push("SELECT cs_encrypt_v1();".to_string());
        statements.push("SELECT cs_activate_v1();".to_string());
        Ok(statements)
    }

    /// `CHECK (cs_check_encrypted_v1(col))` constraints for every column.
    pub fn constraint_statements(&self) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for (table, table_config) in &self.tables {
            validate_table(table)?;
            for column in table_config.columns.keys() {
                validate_column(column)?;
                statements.push(format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {column}_encrypted_check CHECK ( cs_check_encrypted_v1({column}) );"
                ));
            }
        }
        Ok(statements)
    }

    /// The whole migration in order: indexes, encrypt/activate,
    /// constraints, then a config refresh.
    pub fn migration_statements(&self) -> Result<Vec<String>> {
        let mut statements = self.setup_statements()?;
        statements.extend(self.constraint_statements()?);
        statements.push(REFRESH_CONFIG_STATEMENT.to_string());
        Ok(statements)
    }
}
