//! Query operand envelopes for the proxy's comparison families.
//!
//! An operand is an ordinary plaintext envelope. The SQL function that
//! wraps it (`cs_match_v1`, `cs_ore_64_8_v1`, ...) is what gives the
//! comparison its meaning at the proxy, so the mode never changes the
//! bytes produced here.

use std::fmt;

use tracing::trace;

use crate::envelope::{encode, encode_envelope, encode_value};
use crate::error::Result;
use crate::plaintext::{Plaintext, PlaintextValue};

/// Proxy comparison families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Token/substring containment.
    Match,
    /// Order-revealing range comparison.
    Ore,
    /// Equality.
    Unique,
    /// Structured document containment and path access.
    SteVec,
}

impl QueryMode {
    pub const ALL: [QueryMode; 4] = [
        QueryMode::Unique,
        QueryMode::Match,
        QueryMode::Ore,
        QueryMode::SteVec,
    ];

    /// Index name used in the encrypt config and `cs_add_index_v1`.
    pub fn index_name(&self) -> &'static str {
        match self {
            QueryMode::Match => "match",
            QueryMode::Ore => "ore",
            QueryMode::Unique => "unique",
            QueryMode::SteVec => "ste_vec",
        }
    }

    /// SQL function the proxy rewrites for this family.
    pub fn sql_function(&self) -> &'static str {
        match self {
            QueryMode::Match => "cs_match_v1",
            QueryMode::Ore => "cs_ore_64_8_v1",
            QueryMode::Unique => "cs_unique_v1",
            QueryMode::SteVec => "cs_ste_vec_v1",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.index_name())
    }
}

/// Build a query operand for `mode`.
pub fn encode_query_operand<T: Plaintext>(
    value: &T,
    table: &str,
    column: &str,
    mode: QueryMode,
) -> Result<Vec<u8>> {
    trace!(table, column, %mode, "building query operand");
    encode(value, table, column)
}

/// Build a query operand from a dynamically typed plaintext.
pub fn encode_query_value(
    value: &PlaintextValue,
    table: &str,
    column: &str,
    mode: QueryMode,
) -> Result<Vec<u8>> {
    trace!(table, column, %mode, "building query operand");
    encode_value(value, table, column)
}

/// Operand for `cs_match_v1(col) @> cs_match_v1(?)`.
pub fn match_query<T: Plaintext>(value: &T, table: &str, column: &str) -> Result<Vec<u8>> {
    encode_query_operand(value, table, column, QueryMode::Match)
}

/// Operand for `cs_ore_64_8_v1` range comparisons.
pub fn ore_query<T: Plaintext>(value: &T, table: &str, column: &str) -> Result<Vec<u8>> {
    encode_query_operand(value, table, column, QueryMode::Ore)
}

/// Operand for `cs_unique_v1` equality.
pub fn unique_query<T: Plaintext>(value: &T, table: &str, column: &str) -> Result<Vec<u8>> {
    encode_query_operand(value, table, column, QueryMode::Unique)
}

/// Operand for `cs_ste_vec_v1` containment or `cs_ste_vec_term_v1` terms.
///
/// Any plaintext kind is accepted: a document for containment, a scalar
/// when comparing against a term extracted by path.
pub fn jsonb_query<T: Plaintext>(value: &T, table: &str, column: &str) -> Result<Vec<u8>> {
    encode_query_operand(value, table, column, QueryMode::SteVec)
}

/// Operand carrying a JSONPath selector such as `$.top.nested`.
///
/// The path goes into `p` verbatim; the proxy parses it as a path, not a
/// JSON literal.
pub fn ejson_path_query(path: &str, table: &str, column: &str) -> Result<Vec<u8>> {
    trace!(table, column, path, "building path operand");
    encode_envelope(path.to_string(), table, column)
}
