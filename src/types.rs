use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Envelope format version written into `v`.
pub const ENVELOPE_VERSION: u32 = 1;

/// Discriminator for plaintext payloads.
pub const PLAINTEXT_KIND: &str = "pt";

/// Discriminator the proxy uses for ciphertext payloads.
pub const CIPHERTEXT_KIND: &str = "ct";

/// Schema location a value is written to or compared against.
///
/// The proxy uses it to pick the encryption context and the index
/// configuration for the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableColumn {
    /// Table name.
    pub t: String,
    /// Column name.
    pub c: String,
}

impl TableColumn {
    /// Build a validated table/column pair.
    ///
    /// Tables may be schema-qualified (`public.users`); columns may not.
    pub fn new(table: &str, column: &str) -> Result<Self> {
        validate_table(table)?;
        validate_column(column)?;
        Ok(Self {
            t: table.to_string(),
            c: column.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.t
    }

    pub fn column(&self) -> &str {
        &self.c
    }
}

/// The JSON wrapper handed to the proxy on writes and in query operands.
///
/// Serializes as `{"k":"pt","p":…,"i":{"t":…,"c":…},"v":1}` in exactly
/// that key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Payload discriminator.
    pub k: String,
    /// Plaintext rendered as a string.
    pub p: String,
    /// Destination table/column.
    pub i: TableColumn,
    /// Format version.
    pub v: u32,
}

impl Envelope {
    /// Wrap an already-rendered plaintext.
    pub fn plaintext(p: String, table: &str, column: &str) -> Self {
        Self {
            k: PLAINTEXT_KIND.to_string(),
            p,
            i: TableColumn {
                t: table.to_string(),
                c: column.to_string(),
            },
            v: ENVELOPE_VERSION,
        }
    }
}

/// Payload discriminator values seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvelopeKind {
    #[serde(rename = "pt")]
    Plaintext,
    #[serde(rename = "ct")]
    Ciphertext,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Plaintext => PLAINTEXT_KIND,
            EnvelopeKind::Ciphertext => CIPHERTEXT_KIND,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            PLAINTEXT_KIND => Some(EnvelopeKind::Plaintext),
            CIPHERTEXT_KIND => Some(EnvelopeKind::Ciphertext),
            _ => None,
        }
    }
}

// ============================================================================
// Identifier validation
// ============================================================================

fn column_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid pattern"))
}

fn table_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_$]*\.)?[A-Za-z_][A-Za-z0-9_$]*$").expect("valid pattern")
    })
}

/// Check that `name` is a bare SQL column identifier.
pub fn validate_column(name: &str) -> Result<()> {
    if column_pattern().is_match(name) {
        Ok(())
    } else {
        Err(CodecError::InvalidIdentifier(name.to_string()))
    }
}

/// Check that `name` is a table identifier, optionally schema-qualified.
pub fn validate_table(name: &str) -> Result<()> {
    if table_pattern().is_match(name) {
        Ok(())
    } else {
        Err(CodecError::InvalidIdentifier(name.to_string()))
    }
}
