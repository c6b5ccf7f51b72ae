//! Dialect settings consumed by the assembler and the statement builders.
//!
//! [`DbSetting`] carries every dialect-dependent rule the composition core
//! needs: identifier quoting, the parameter prefix, the paging grammar and a
//! few capability flags. Presets exist for the supported dialects; individual
//! fields can be overridden with the consuming setters.
//!
//! # Example
//! ```
//! use sqlcompose::{DbSetting, PagingStyle};
//!
//! let setting = DbSetting::postgres().paging(PagingStyle::RowNumber);
//! assert_eq!(setting.quote("Name"), "\"Name\"");
//! assert_eq!(setting.parameter("Name"), "@Name");
//! ```

use crate::value::DbType;
use serde::{Deserialize, Serialize};

/// SQL dialect family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    SqlServer,
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Human readable dialect name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Dialect::SqlServer => "SQL Server",
            Dialect::Postgres => "PostgreSQL",
            Dialect::MySql => "MySQL",
            Dialect::Sqlite => "SQLite",
        }
    }
}

/// Grammar used to page through a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PagingStyle {
    /// `WITH CTE AS (SELECT ROW_NUMBER() OVER (...) ...) ... BETWEEN a AND b`
    RowNumber,
    /// `... LIMIT n OFFSET m`
    LimitOffset,
}

/// Dialect settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbSetting {
    /// Dialect family.
    pub dialect: Dialect,
    /// Character opening a quoted identifier.
    pub opening_quote: char,
    /// Character closing a quoted identifier.
    pub closing_quote: char,
    /// Prefix for named parameters.
    pub parameter_prefix: char,
    /// Separator between schema and table names.
    pub schema_separator: char,
    /// Schema assumed when a table name carries none.
    pub default_schema: Option<String>,
    /// Paging grammar for batch queries.
    pub paging: PagingStyle,
    /// Whether table hints (`WITH (NOLOCK)`) may be emitted.
    pub supports_table_hints: bool,
    /// Whether several statements may be sent in one command text.
    pub supports_multiple_statements: bool,
    /// Maximum precision of a `DECIMAL` column (`None` = unbounded).
    pub max_decimal_precision: Option<u16>,
    /// Maximum precision of a floating point column.
    pub max_float_precision: Option<u16>,
}

impl DbSetting {
    /// Microsoft SQL Server.
    pub fn sql_server() -> Self {
        Self {
            dialect: Dialect::SqlServer,
            opening_quote: '[',
            closing_quote: ']',
            parameter_prefix: '@',
            schema_separator: '.',
            default_schema: Some("dbo".to_string()),
            paging: PagingStyle::RowNumber,
            supports_table_hints: true,
            supports_multiple_statements: true,
            max_decimal_precision: Some(38),
            max_float_precision: Some(53),
        }
    }

    /// PostgreSQL.
    pub fn postgres() -> Self {
        Self {
            dialect: Dialect::Postgres,
            opening_quote: '"',
            closing_quote: '"',
            parameter_prefix: '@',
            schema_separator: '.',
            default_schema: Some("public".to_string()),
            paging: PagingStyle::LimitOffset,
            supports_table_hints: false,
            supports_multiple_statements: true,
            max_decimal_precision: Some(1000),
            max_float_precision: Some(53),
        }
    }

    /// MySQL / MariaDB.
    pub fn mysql() -> Self {
        Self {
            dialect: Dialect::MySql,
            opening_quote: '`',
            closing_quote: '`',
            parameter_prefix: '@',
            schema_separator: '.',
            default_schema: None,
            paging: PagingStyle::LimitOffset,
            supports_table_hints: false,
            supports_multiple_statements: true,
            max_decimal_precision: Some(65),
            max_float_precision: Some(53),
        }
    }

    /// SQLite.
    pub fn sqlite() -> Self {
        Self {
            dialect: Dialect::Sqlite,
            opening_quote: '[',
            closing_quote: ']',
            parameter_prefix: '@',
            schema_separator: '.',
            default_schema: None,
            paging: PagingStyle::LimitOffset,
            supports_table_hints: false,
            supports_multiple_statements: true,
            max_decimal_precision: None,
            max_float_precision: Some(53),
        }
    }

    /// Override the identifier quote characters.
    pub fn quotes(mut self, opening: char, closing: char) -> Self {
        self.opening_quote = opening;
        self.closing_quote = closing;
        self
    }

    /// Override the parameter prefix.
    pub fn parameter_prefix(mut self, prefix: char) -> Self {
        self.parameter_prefix = prefix;
        self
    }

    /// Override the default schema.
    pub fn default_schema(mut self, schema: Option<&str>) -> Self {
        self.default_schema = schema.map(str::to_string);
        self
    }

    /// Override the paging grammar.
    pub fn paging(mut self, paging: PagingStyle) -> Self {
        self.paging = paging;
        self
    }

    /// Allow or forbid table hints.
    pub fn table_hints(mut self, supported: bool) -> Self {
        self.supports_table_hints = supported;
        self
    }

    /// Quote a single identifier part. Embedded closing quotes are doubled.
    pub fn quote(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.write_quoted(&mut out, name);
        out
    }

    pub(crate) fn write_quoted(&self, out: &mut String, name: &str) {
        out.push(self.opening_quote);
        for ch in name.chars() {
            if ch == self.closing_quote {
                out.push(ch);
            }
            out.push(ch);
        }
        out.push(self.closing_quote);
    }

    /// Render a named parameter: `@Name`.
    pub fn parameter(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 1);
        out.push(self.parameter_prefix);
        out.push_str(name);
        out
    }

    /// Highest precision a column of `db_type` may declare, if the dialect caps it.
    pub fn max_precision(&self, db_type: DbType) -> Option<u16> {
        match db_type {
            DbType::Decimal | DbType::Currency => self.max_decimal_precision,
            DbType::Double | DbType::Single => self.max_float_precision,
            _ => None,
        }
    }
}

impl Default for DbSetting {
    fn default() -> Self {
        Self::sql_server()
    }
}
