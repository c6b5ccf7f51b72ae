//! Column references and orderings.
//!
//! [`Field`] is an immutable column reference. Its equality is exact (it is
//! part of the structural cache key, and two spellings render differently);
//! schema lookups go through [`Field::matches`], which follows the
//! case-insensitive identifier rules shared by the supported dialects.

use crate::setting::DbSetting;
use serde::{Deserialize, Serialize};

/// A column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field {
    name: String,
}

/// Strip one pair of surrounding quote characters, if present.
pub(crate) fn unquote(name: &str) -> &str {
    let name = name.trim();
    let mut chars = name.chars();
    match (chars.next(), chars.next_back()) {
        (Some('['), Some(']')) | (Some('"'), Some('"')) | (Some('`'), Some('`'))
            if name.len() >= 2 =>
        {
            &name[1..name.len() - 1]
        }
        _ => name,
    }
}

/// Turn a column name into a safe parameter name (`First Name` -> `First_Name`).
pub(crate) fn parameter_name(name: &str) -> String {
    unquote(name)
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Append `_{index}` for batch row `index > 0`.
pub(crate) fn indexed(name: &str, index: usize) -> String {
    if index > 0 {
        format!("{name}_{index}")
    } else {
        name.to_string()
    }
}

impl Field {
    /// Create a field. Surrounding quotes are removed.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: unquote(name.as_ref()).to_string(),
        }
    }

    /// Create a list of fields from names.
    pub fn from_names<I, S>(names: I) -> Vec<Field>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(Field::new).collect()
    }

    /// The unquoted column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(unquote(name))
    }

    /// `[Name]`
    pub fn as_field(&self, setting: &DbSetting) -> String {
        setting.quote(&self.name)
    }

    /// `@Name` (or `@Name_{index}` for batch row `index > 0`).
    pub fn as_parameter(&self, index: usize, setting: &DbSetting) -> String {
        setting.parameter(&indexed(&parameter_name(&self.name), index))
    }

    /// `[Name] = @Name`
    pub fn as_field_and_parameter(&self, index: usize, setting: &DbSetting) -> String {
        format!(
            "{} = {}",
            self.as_field(setting),
            self.as_parameter(index, setting)
        )
    }

    /// `@Name AS [Name]`
    pub fn as_parameter_as_field(&self, index: usize, setting: &DbSetting) -> String {
        format!(
            "{} AS {}",
            self.as_parameter(index, setting),
            self.as_field(setting)
        )
    }

    /// `S.[Name]`
    pub fn as_alias_field(&self, alias: &str, setting: &DbSetting) -> String {
        format!("{alias}.{}", self.as_field(setting))
    }

    /// `[Name] = S.[Name]`
    pub fn as_field_and_alias_field(&self, alias: &str, setting: &DbSetting) -> String {
        format!(
            "{} = {}",
            self.as_field(setting),
            self.as_alias_field(alias, setting)
        )
    }

    /// `S.[Name] = T.[Name]`
    pub fn as_join_qualifier(&self, left: &str, right: &str, setting: &DbSetting) -> String {
        format!(
            "{} = {}",
            self.as_alias_field(left, setting),
            self.as_alias_field(right, setting)
        )
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::new(name)
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::new(name)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// SQL keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        }
    }
}

/// A field plus a sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderField {
    pub field: Field,
    pub order: Order,
}

impl OrderField {
    pub fn new(name: impl AsRef<str>, order: Order) -> Self {
        Self {
            field: Field::new(name),
            order,
        }
    }

    pub fn ascending(name: impl AsRef<str>) -> Self {
        Self::new(name, Order::Ascending)
    }

    pub fn descending(name: impl AsRef<str>) -> Self {
        Self::new(name, Order::Descending)
    }

    /// Parse `"Name"`, `"Name ASC"` or `"Name DESC"` (direction is case-insensitive).
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (name, order) = match text.rsplit_once(char::is_whitespace) {
            Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, Order::Descending),
            Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, Order::Ascending),
            _ => (text, Order::Ascending),
        };
        Self::new(name.trim(), order)
    }

    /// `[Name] ASC`
    pub fn as_order(&self, setting: &DbSetting) -> String {
        format!("{} {}", self.field.as_field(setting), self.order.as_str())
    }
}
