//! Dialect-aware SQL identifier handling.
//!
//! This module provides [`Ident`] which represents a table or column name,
//! supporting dotted notation and names that arrive already quoted in any of
//! the supported quoting styles (`[Name]`, `"Name"`, `` `Name` ``).
//!
//! - Unquoted parts are validated against: `[A-Za-z_#][A-Za-z0-9_$#]*` (Unicode letters allowed)
//! - Quoted parts allow any characters except NUL; a doubled closing quote is an escaped quote
//!
//! Rendering always re-quotes every part with the active [`DbSetting`].
//!
//! # Example
//! ```
//! use sqlcompose::{DbSetting, Ident};
//!
//! let t = Ident::parse("dbo.Person")?;
//! assert_eq!(t.to_sql(&DbSetting::sql_server()), "[dbo].[Person]");
//!
//! let t = Ident::parse("[sales].[Order Line]")?;
//! assert_eq!(t.to_sql(&DbSetting::postgres()), "\"sales\".\"Order Line\"");
//! # Ok::<(), sqlcompose::StmtError>(())
//! ```

use crate::error::{StmtError, StmtResult};
use crate::setting::DbSetting;

/// A part of an identifier, with any source quoting removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentPart {
    /// Bare identifier.
    Unquoted(String),
    /// Identifier that was quoted in the input.
    Quoted(String),
}

impl IdentPart {
    /// The unquoted name.
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A SQL identifier (column, table, or schema-qualified table name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '[' => Some(']'),
        '"' => Some('"'),
        '`' => Some('`'),
        _ => None,
    }
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `[dbo].[Person]`, `"public"."person"`
    /// - Mixed: `dbo.[Order Line]`
    pub fn parse(s: &str) -> StmtResult<Self> {
        if s.trim().is_empty() {
            return Err(StmtError::InvalidIdentifier(
                "Identifier cannot be empty".to_string(),
            ));
        }
        if s.contains('\0') {
            return Err(StmtError::InvalidIdentifier(
                "Identifier cannot contain NUL character".to_string(),
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.trim().chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(StmtError::InvalidIdentifier(format!(
                                "Trailing '.' in identifier '{s}'"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(StmtError::InvalidIdentifier(format!(
                            "Expected '.' between identifier parts of '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if let Some(close) = chars.peek().copied().and_then(closing_for) {
                chars.next(); // opening quote
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == close => {
                            if chars.peek() == Some(&close) {
                                chars.next();
                                name.push(close);
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(StmtError::InvalidIdentifier(format!(
                                "Unclosed quoted identifier '{s}'"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(StmtError::InvalidIdentifier(format!(
                        "Empty quoted identifier in '{s}'"
                    )));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c == '#' || c.is_alphabetic()
                } else {
                    c == '_' || c == '$' || c == '#' || c.is_alphanumeric()
                };
                if !valid {
                    return Err(StmtError::InvalidIdentifier(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(StmtError::InvalidIdentifier(format!(
                    "Empty identifier segment in '{s}'"
                )));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// Last part of the identifier (the table or column name itself).
    pub fn name(&self) -> &str {
        self.parts.last().map_or("", IdentPart::name)
    }

    /// Schema part, when the identifier is qualified.
    pub fn schema(&self) -> Option<&str> {
        if self.parts.len() > 1 {
            self.parts.get(self.parts.len() - 2).map(IdentPart::name)
        } else {
            None
        }
    }

    /// Render the identifier quoted for `setting`.
    pub fn to_sql(&self, setting: &DbSetting) -> String {
        let cap = self.parts.iter().map(|p| p.name().len() + 3).sum();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out, setting);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String, setting: &DbSetting) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push(setting.schema_separator);
            }
            setting.write_quoted(out, part.name());
        }
    }
}

/// Convert an input into an [`Ident`].
pub trait IntoIdent {
    fn into_ident(self) -> StmtResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> StmtResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> StmtResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> StmtResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> StmtResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> StmtResult<Ident> {
        Ident::parse(self)
    }
}

/// Parse and quote a name in one step.
pub fn quote_name(name: &str, setting: &DbSetting) -> StmtResult<String> {
    Ok(Ident::parse(name)?.to_sql(setting))
}
