//! Column metadata supplied by schema introspection.

use crate::field::{Field, unquote};
use crate::setting::DbSetting;
use crate::value::DbType;
use serde::{Deserialize, Serialize};

/// Metadata for one table column.
///
/// Equality covers every attribute; hashing uses the derived combinator over
/// the same attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbField {
    pub name: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default)]
    pub db_type: Option<DbType>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub precision: Option<u16>,
    #[serde(default)]
    pub scale: Option<u8>,
    /// Native type name as reported by the database (`nvarchar`, `int4`, ...).
    #[serde(default)]
    pub database_type: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl DbField {
    /// Create a nullable, non-key column.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: unquote(name.as_ref()).to_string(),
            is_primary: false,
            is_identity: false,
            is_nullable: true,
            db_type: None,
            size: None,
            precision: None,
            scale: None,
            database_type: None,
        }
    }

    /// Mark as primary column (implies not nullable).
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self.is_nullable = false;
        self
    }

    /// Mark as identity column (implies not nullable).
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn db_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn precision(mut self, precision: u16, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn database_type(mut self, name: impl Into<String>) -> Self {
        self.database_type = Some(name.into());
        self
    }

    /// Clamp the precision to the dialect's documented maximum for the column type.
    pub fn normalize(mut self, setting: &DbSetting) -> Self {
        if let (Some(precision), Some(db_type)) = (self.precision, self.db_type) {
            if let Some(max) = setting.max_precision(db_type) {
                self.precision = Some(precision.min(max));
            }
        }
        self
    }

    /// Case-insensitive name comparison.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(unquote(name))
    }

    /// Column reference for this column.
    pub fn as_field(&self) -> Field {
        Field::new(&self.name)
    }
}

/// Ordered column list of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbFieldList {
    fields: Vec<DbField>,
}

impl DbFieldList {
    pub fn new(fields: Vec<DbField>) -> Self {
        Self { fields }
    }

    /// The primary column, if any.
    pub fn primary(&self) -> Option<&DbField> {
        self.fields.iter().find(|f| f.is_primary)
    }

    /// The identity column, if any.
    pub fn identity(&self) -> Option<&DbField> {
        self.fields.iter().find(|f| f.is_identity)
    }

    /// Find a column by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&DbField> {
        self.fields.iter().find(|f| f.matches(name))
    }

    /// Check if the table has a column with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// All columns as fields, in table order.
    pub fn as_fields(&self) -> Vec<Field> {
        self.fields.iter().map(DbField::as_field).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DbField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Clamp every column's precision for `setting`.
    pub fn normalize(self, setting: &DbSetting) -> Self {
        Self {
            fields: self
                .fields
                .into_iter()
                .map(|f| f.normalize(setting))
                .collect(),
        }
    }
}

impl From<Vec<DbField>> for DbFieldList {
    fn from(fields: Vec<DbField>) -> Self {
        Self::new(fields)
    }
}

impl<'a> IntoIterator for &'a DbFieldList {
    type Item = &'a DbField;
    type IntoIter = std::slice::Iter<'a, DbField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> DbFieldList {
        DbFieldList::new(vec![
            DbField::new("Id").primary().identity().db_type(DbType::Int64),
            DbField::new("Name").db_type(DbType::String).size(128),
            DbField::new("Balance").db_type(DbType::Decimal).precision(50, 2),
        ])
    }

    #[test]
    fn finds_primary_and_identity() {
        let list = person();
        assert_eq!(list.primary().map(|f| f.name.as_str()), Some("Id"));
        assert_eq!(list.identity().map(|f| f.name.as_str()), Some("Id"));
        assert!(list.contains("name"));
        assert!(!list.contains("Age"));
    }

    #[test]
    fn normalize_clamps_per_dialect() {
        let mssql = person().normalize(&DbSetting::sql_server());
        assert_eq!(mssql.find("Balance").and_then(|f| f.precision), Some(38));
        let mysql = person().normalize(&DbSetting::mysql());
        assert_eq!(mysql.find("Balance").and_then(|f| f.precision), Some(50));
    }

    #[test]
    fn equality_covers_all_attributes() {
        let a = DbField::new("Name").db_type(DbType::String);
        let b = DbField::new("Name").db_type(DbType::AnsiString);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn deserializes_with_defaults() {
        let f: DbField = serde_json::from_str(r#"{"name":"Id","is_primary":true}"#).unwrap();
        assert!(f.is_primary);
        assert!(f.is_nullable);
        assert!(!f.is_identity);
    }
}
