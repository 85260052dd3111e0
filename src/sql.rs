//! SQL predicate fragments for the proxy's comparison functions.
//!
//! Column identifiers are validated before being spliced into SQL text;
//! envelopes only ever travel as bound parameters.

use std::fmt;

use crate::error::Result;
use crate::plaintext::Plaintext;
use crate::query::{ejson_path_query, encode_query_operand, QueryMode};
use crate::types::{validate_column, validate_table, TableColumn};

const STE_VEC_VALUE_FN: &str = "cs_ste_vec_value_v1";
const STE_VEC_TERM_FN: &str = "cs_ste_vec_term_v1";
const STE_VEC_TERMS_FN: &str = "cs_ste_vec_terms_v1";

// ============================================================================
// Options
// ============================================================================

/// Parameter placeholder style of the target driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `$1`, `$2`, ... (PostgreSQL, sqlx).
    #[default]
    Numbered,
    /// `?` (xorm, database/sql style drivers).
    Positional,
}

/// Options controlling fragment rendering.
#[derive(Debug, Clone)]
pub struct SqlOptions {
    pub placeholder: Placeholder,
    /// Number of the first `$n` placeholder. Ignored for `?`.
    pub first_param: usize,
    /// Render columns as `table.column` instead of bare `column`.
    pub qualify_columns: bool,
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self {
            placeholder: Placeholder::Numbered,
            first_param: 1,
            qualify_columns: false,
        }
    }
}

// ============================================================================
// Fragments
// ============================================================================

/// Comparison operators usable with order-revealing terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// SQL text plus the envelope bytes bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Vec<u8>>,
}

impl SqlFragment {
    /// Join two predicates with `AND`.
    ///
    /// Both must come from the same builder so placeholder numbers line up.
    pub fn and(mut self, other: SqlFragment) -> SqlFragment {
        self.sql = format!("{} AND {}", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }
}

impl fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

// ============================================================================
// FragmentBuilder
// ============================================================================

/// Renders proxy predicates, numbering placeholders across calls.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    options: SqlOptions,
    next_param: usize,
}

impl Default for FragmentBuilder {
    fn default() -> Self {
        Self::new(SqlOptions::default())
    }
}

impl FragmentBuilder {
    pub fn new(options: SqlOptions) -> Self {
        let next_param = options.first_param;
        Self {
            options,
            next_param,
        }
    }

    /// Number of the placeholder the next parameter will take.
    pub fn next_param(&self) -> usize {
        self.next_param
    }

    fn placeholder(&mut self) -> String {
        match self.options.placeholder {
            Placeholder::Numbered => {
                let n = self.next_param;
                self.next_param += 1;
                format!("${}", n)
            }
            Placeholder::Positional => "?".to_string(),
        }
    }

    fn column_ref(&self, target: &TableColumn) -> Result<String> {
        validate_column(target.column())?;
        if self.options.qualify_columns {
            validate_table(target.table())?;
            Ok(format!("{}.{}", target.table(), target.column()))
        } else {
            Ok(target.column().to_string())
        }
    }

    fn binary<V: Plaintext>(
        &mut self,
        target: &TableColumn,
        mode: QueryMode,
        op: &str,
        value: &V,
    ) -> Result<SqlFragment> {
        let column = self.column_ref(target)?;
        let operand = encode_query_operand(value, target.table(), target.column(), mode)?;
        let function = mode.sql_function();
        let sql = format!(
            "{function}({column}) {op} {function}({})",
            self.placeholder()
        );
        Ok(SqlFragment {
            sql,
            params: vec![operand],
        })
    }

    /// `cs_match_v1(col) @> cs_match_v1($n)`
    pub fn match_contains<V: Plaintext>(
        &mut self,
        target: &TableColumn,
        value: &V,
    ) -> Result<SqlFragment> {
        self.binary(target, QueryMode::Match, "@>", value)
    }

    /// `cs_ore_64_8_v1(col) <op> cs_ore_64_8_v1($n)`
    pub fn ore_compare<V: Plaintext>(
        &mut self,
        target: &TableColumn,
        op: CompareOp,
        value: &V,
    ) -> Result<SqlFragment> {
        self.binary(target, QueryMode::Ore, op.as_sql(), value)
    }

    /// `cs_unique_v1(col) = cs_unique_v1($n)`
    pub fn unique_eq<V: Plaintext>(
        &mut self,
        target: &TableColumn,
        value: &V,
    ) -> Result<SqlFragment> {
        self.binary(target, QueryMode::Unique, "=", value)
    }

    /// `cs_ste_vec_v1(col) @> cs_ste_vec_v1($n)`
    pub fn ste_vec_contains<V: Plaintext>(
        &mut self,
        target: &TableColumn,
        value: &V,
    ) -> Result<SqlFragment> {
        self.binary(target, QueryMode::SteVec, "@>", value)
    }

    /// `cs_ste_vec_value_v1(col, $n)`, selecting the value at `path`.
    pub fn ste_vec_value(&mut self, target: &TableColumn, path: &str) -> Result<SqlFragment> {
        self.path_call(STE_VEC_VALUE_FN, target, path)
    }

    /// `cs_ste_vec_terms_v1(col, $n)`, the array of terms at `path`.
    pub fn ste_vec_terms(&mut self, target: &TableColumn, path: &str) -> Result<SqlFragment> {
        self.path_call(STE_VEC_TERMS_FN, target, path)
    }

    /// `cs_ste_vec_term_v1(col, $n) <op> cs_ste_vec_term_v1($m)`
    pub fn ste_vec_term_compare<V: Plaintext>(
        &mut self,
        target: &TableColumn,
        path: &str,
        op: CompareOp,
        value: &V,
    ) -> Result<SqlFragment> {
        let lhs = self.path_call(STE_VEC_TERM_FN, target, path)?;
        let operand = encode_query_operand(value, target.table(), target.column(), QueryMode::SteVec)?;
        let sql = format!(
            "{} {} {STE_VEC_TERM_FN}({})",
            lhs.sql,
            op.as_sql(),
            self.placeholder()
        );
        let mut params = lhs.params;
        params.push(operand);
        Ok(SqlFragment { sql, params })
    }

    /// `cs_ore_64_8_v1(col) ASC|DESC`
    pub fn ore_order_by(&self, target: &TableColumn, direction: SortDirection) -> Result<String> {
        let column = self.column_ref(target)?;
        let dir = match direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        Ok(format!("{}({column}) {dir}", QueryMode::Ore.sql_function()))
    }

    fn path_call(&mut self, function: &str, target: &TableColumn, path: &str) -> Result<SqlFragment> {
        let column = self.column_ref(target)?;
        let operand = ejson_path_query(path, target.table(), target.column())?;
        Ok(SqlFragment {
            sql: format!("{function}({column}, {})", self.placeholder()),
            params: vec![operand],
        })
    }
}
