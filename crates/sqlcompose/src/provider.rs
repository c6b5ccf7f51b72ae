//! Metadata collaborators consumed by the statement builders.
//!
//! The composition core never discovers schemas on its own. Column metadata
//! comes from a [`DbFieldProvider`], and the columns an entity maps for a
//! given command come from an optional [`FieldMapping`]. [`Catalog`] is an
//! in-memory implementation of both that can be persisted as a JSON snapshot.

use crate::db_field::DbFieldList;
use crate::error::{StmtError, StmtResult};
use crate::field::Field;
use crate::ident::Ident;
use crate::request::CommandKind;
use crate::setting::DbSetting;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Source of the ordered column list of a table.
pub trait DbFieldProvider: Send + Sync {
    /// Columns of `table`, in table order.
    fn db_fields(&self, table: &str) -> StmtResult<Arc<DbFieldList>>;
}

/// Source of the columns an entity maps for a command.
pub trait FieldMapping: Send + Sync {
    /// Mapped columns of `entity` applicable to `kind`, or `None` when the
    /// entity is unmapped (all table columns apply).
    fn fields(&self, entity: &str, kind: CommandKind) -> Option<Vec<Field>>;
}

/// Columns an entity maps onto its table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    /// Mapped columns, in declaration order.
    pub fields: Vec<Field>,
    /// Columns that are read but never written (computed, defaulted, ...).
    #[serde(default)]
    pub read_only: Vec<Field>,
}

impl EntityMapping {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            read_only: Vec::new(),
        }
    }

    /// Mark columns as read-only.
    pub fn read_only(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.read_only.extend(fields);
        self
    }

    /// Columns applicable to `kind`: every mapped column for reads, writable
    /// columns for inserts, updates and upserts.
    pub fn for_command(&self, kind: CommandKind) -> Vec<Field> {
        let writes = matches!(
            kind,
            CommandKind::Insert
                | CommandKind::InsertAll
                | CommandKind::InlineInsert
                | CommandKind::Update
                | CommandKind::UpdateAll
                | CommandKind::InlineUpdate
                | CommandKind::Merge
                | CommandKind::MergeAll
                | CommandKind::InlineMerge
        );
        self.fields
            .iter()
            .filter(|f| !writes || !self.read_only.iter().any(|r| r.matches(f.name())))
            .cloned()
            .collect()
    }
}

/// One table of a catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub columns: DbFieldList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<EntityMapping>,
}

/// Serialized form of a [`Catalog`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

/// In-memory schema catalog.
///
/// Table names are matched case-insensitively; an unqualified name resolves
/// against the setting's default schema. Registered columns are normalized
/// for the setting (precision clamped to the dialect maximum).
///
/// # Example
/// ```
/// use sqlcompose::{Catalog, DbField, DbFieldProvider, DbSetting};
///
/// let mut catalog = Catalog::new(DbSetting::sql_server());
/// catalog.register("Person", vec![DbField::new("Id").primary().identity()])?;
/// assert!(catalog.db_fields("[dbo].[person]")?.primary().is_some());
/// # Ok::<(), sqlcompose::StmtError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    setting: DbSetting,
    tables: HashMap<String, (String, Arc<DbFieldList>)>,
    mappings: HashMap<String, EntityMapping>,
}

impl Catalog {
    pub fn new(setting: DbSetting) -> Self {
        Self {
            setting,
            tables: HashMap::new(),
            mappings: HashMap::new(),
        }
    }

    pub fn setting(&self) -> &DbSetting {
        &self.setting
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn table_key(&self, table: &str) -> StmtResult<String> {
        let ident = Ident::parse(table)?;
        let schema = ident
            .schema()
            .or(self.setting.default_schema.as_deref())
            .unwrap_or_default();
        Ok(format!(
            "{}.{}",
            schema.to_lowercase(),
            ident.name().to_lowercase()
        ))
    }

    /// Register (or replace) the columns of a table.
    pub fn register(
        &mut self,
        table: &str,
        columns: impl Into<DbFieldList>,
    ) -> StmtResult<&mut Self> {
        let key = self.table_key(table)?;
        let columns = columns.into().normalize(&self.setting);
        self.tables
            .insert(key, (table.to_string(), Arc::new(columns)));
        Ok(self)
    }

    /// Register the mapped columns of an entity.
    pub fn map_entity(&mut self, entity: &str, mapping: EntityMapping) -> &mut Self {
        self.mappings.insert(entity.to_lowercase(), mapping);
        self
    }

    /// Mapping registered for `entity`.
    pub fn mapping(&self, entity: &str) -> Option<&EntityMapping> {
        self.mappings.get(&entity.to_lowercase())
    }

    /// Build a catalog from a snapshot.
    pub fn from_snapshot(setting: DbSetting, snapshot: CatalogSnapshot) -> StmtResult<Self> {
        let mut catalog = Self::new(setting);
        for entry in snapshot.tables {
            catalog.register(&entry.name, entry.columns)?;
            if let Some(mapping) = entry.mapping {
                catalog.map_entity(&entry.name, mapping);
            }
        }
        Ok(catalog)
    }

    /// Decode a JSON snapshot.
    pub fn from_json(setting: DbSetting, json: &str) -> StmtResult<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(setting, snapshot)
    }

    /// Current contents as a snapshot, tables sorted by name.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let mut tables: Vec<TableEntry> = self
            .tables
            .values()
            .map(|(name, columns)| TableEntry {
                name: name.clone(),
                columns: columns.as_ref().clone(),
                mapping: self.mapping(name).cloned(),
            })
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        CatalogSnapshot { tables }
    }

    /// Encode the catalog as pretty-printed JSON.
    pub fn to_json(&self) -> StmtResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

impl DbFieldProvider for Catalog {
    fn db_fields(&self, table: &str) -> StmtResult<Arc<DbFieldList>> {
        let key = self.table_key(table)?;
        self.tables
            .get(&key)
            .map(|(_, columns)| Arc::clone(columns))
            .ok_or_else(|| StmtError::UnknownTable(table.to_string()))
    }
}

impl FieldMapping for Catalog {
    fn fields(&self, entity: &str, kind: CommandKind) -> Option<Vec<Field>> {
        self.mapping(entity).map(|m| m.for_command(kind))
    }
}
