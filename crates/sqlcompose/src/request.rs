//! Request descriptors: one immutable bundle per composition call.
//!
//! A [`StatementRequest`] names the command, the target table and every
//! structural input the statement builders read. Its [`key`](StatementRequest::key)
//! is the structural projection used by the statement cache; it ignores the
//! values bound inside the filter tree.
//!
//! # Example
//! ```
//! use sqlcompose::{QueryField, StatementRequest};
//!
//! let a = StatementRequest::update("Person").filter(QueryField::eq("Id", 1));
//! let b = StatementRequest::update("Person").filter(QueryField::eq("Id", 2));
//! assert_eq!(a.key(), b.key());
//! ```

use crate::field::{Field, OrderField};
use crate::query::{BoundParameter, Conjunction, QueryGroup, QueryGroupKey};

/// Aggregate function of an [`CommandKind::Aggregate`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Max,
    Min,
    Average,
}

impl AggregateFunction {
    /// SQL function name.
    pub const fn as_str(self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Average => "AVG",
        }
    }
}

/// The command a request composes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Query,
    QueryAll,
    BatchQuery,
    Count,
    CountAll,
    Exists,
    Aggregate(AggregateFunction),
    Insert,
    InsertAll,
    InlineInsert,
    Update,
    UpdateAll,
    InlineUpdate,
    Delete,
    DeleteAll,
    Merge,
    MergeAll,
    InlineMerge,
    Truncate,
}

impl CommandKind {
    /// Command name used in error messages and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandKind::Query => "Query",
            CommandKind::QueryAll => "QueryAll",
            CommandKind::BatchQuery => "BatchQuery",
            CommandKind::Count => "Count",
            CommandKind::CountAll => "CountAll",
            CommandKind::Exists => "Exists",
            CommandKind::Aggregate(_) => "Aggregate",
            CommandKind::Insert => "Insert",
            CommandKind::InsertAll => "InsertAll",
            CommandKind::InlineInsert => "InlineInsert",
            CommandKind::Update => "Update",
            CommandKind::UpdateAll => "UpdateAll",
            CommandKind::InlineUpdate => "InlineUpdate",
            CommandKind::Delete => "Delete",
            CommandKind::DeleteAll => "DeleteAll",
            CommandKind::Merge => "Merge",
            CommandKind::MergeAll => "MergeAll",
            CommandKind::InlineMerge => "InlineMerge",
            CommandKind::Truncate => "Truncate",
        }
    }

    /// Whether the filter tree shares columns with a SET clause and must carry
    /// the update marker.
    pub const fn is_update(self) -> bool {
        matches!(self, CommandKind::Update | CommandKind::InlineUpdate)
    }

    /// Whether the command renders a WHERE clause from the filter tree.
    pub const fn accepts_filter(self) -> bool {
        matches!(
            self,
            CommandKind::Query
                | CommandKind::BatchQuery
                | CommandKind::Count
                | CommandKind::Exists
                | CommandKind::Aggregate(_)
                | CommandKind::Update
                | CommandKind::InlineUpdate
                | CommandKind::Delete
        )
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one composition call.
#[derive(Debug, Clone)]
#[must_use]
pub struct StatementRequest {
    kind: CommandKind,
    table: String,
    entity: Option<String>,
    fields: Option<Vec<Field>>,
    filter: Option<QueryGroup>,
    qualifiers: Option<Vec<Field>>,
    order_by: Vec<OrderField>,
    top: Option<usize>,
    page: usize,
    rows_per_batch: usize,
    batch_size: usize,
    hints: Option<String>,
    target: Option<Field>,
}

impl StatementRequest {
    /// Create a request of any kind; the named constructors below are shorthands.
    pub fn new(kind: CommandKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            entity: None,
            fields: None,
            filter: None,
            qualifiers: None,
            order_by: Vec::new(),
            top: None,
            page: 0,
            rows_per_batch: 0,
            batch_size: 1,
            hints: None,
            target: None,
        }
    }

    // ==================== Constructors ====================

    /// `SELECT` with an optional filter, ordering and row limit.
    pub fn query(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Query, table)
    }

    /// `SELECT` of every row.
    pub fn query_all(table: impl Into<String>) -> Self {
        Self::new(CommandKind::QueryAll, table)
    }

    /// Paged `SELECT` returning rows `[page * rows_per_batch + 1, (page + 1) * rows_per_batch]`.
    pub fn batch_query(table: impl Into<String>, page: usize, rows_per_batch: usize) -> Self {
        let mut request = Self::new(CommandKind::BatchQuery, table);
        request.page = page;
        request.rows_per_batch = rows_per_batch;
        request
    }

    pub fn count(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Count, table)
    }

    pub fn count_all(table: impl Into<String>) -> Self {
        Self::new(CommandKind::CountAll, table)
    }

    pub fn exists(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Exists, table)
    }

    /// `SUM`/`MAX`/`MIN`/`AVG` over one column.
    pub fn aggregate(
        table: impl Into<String>,
        function: AggregateFunction,
        field: impl Into<Field>,
    ) -> Self {
        let mut request = Self::new(CommandKind::Aggregate(function), table);
        request.target = Some(field.into());
        request
    }

    pub fn insert(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Insert, table)
    }

    /// Multi-row insert of `batch_size` rows.
    pub fn insert_all(table: impl Into<String>, batch_size: usize) -> Self {
        Self::new(CommandKind::InsertAll, table).batch_size(batch_size)
    }

    /// Insert of an explicit column subset.
    pub fn inline_insert(table: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self::new(CommandKind::InlineInsert, table).fields(fields)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Update, table)
    }

    /// Multi-row update by qualifiers, `batch_size` statements.
    pub fn update_all(table: impl Into<String>, batch_size: usize) -> Self {
        Self::new(CommandKind::UpdateAll, table).batch_size(batch_size)
    }

    /// Update of an explicit column subset.
    pub fn inline_update(table: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self::new(CommandKind::InlineUpdate, table).fields(fields)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Delete, table)
    }

    pub fn delete_all(table: impl Into<String>) -> Self {
        Self::new(CommandKind::DeleteAll, table)
    }

    /// Upsert matched by qualifiers (the primary column by default).
    pub fn merge(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Merge, table)
    }

    /// Multi-row upsert, `batch_size` statements.
    pub fn merge_all(table: impl Into<String>, batch_size: usize) -> Self {
        Self::new(CommandKind::MergeAll, table).batch_size(batch_size)
    }

    /// Upsert of an explicit column subset.
    pub fn inline_merge(table: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self::new(CommandKind::InlineMerge, table).fields(fields)
    }

    pub fn truncate(table: impl Into<String>) -> Self {
        Self::new(CommandKind::Truncate, table)
    }

    // ==================== Modifiers ====================

    /// Entity identity used to look up mapped columns (defaults to the table name).
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Explicit column list.
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields = Some(fields.into_iter().collect());
        self
    }

    /// Add a filter. Several calls are combined with AND.
    ///
    /// Parameter names are normalized here: colliding names are de-duplicated
    /// and update commands apply the update marker, so the rendered names
    /// depend only on the structure of the tree.
    pub fn filter(mut self, condition: impl Into<QueryGroup>) -> Self {
        let condition = condition.into();
        let combined = match self.filter.take() {
            Some(existing) => {
                QueryGroup::from_groups(vec![existing, condition], Conjunction::And)
            }
            None => condition,
        };
        self.filter = Some(combined.prepared(self.kind.is_update()));
        self
    }

    /// Columns matching existing rows in an upsert or multi-row update.
    pub fn qualifiers(mut self, qualifiers: impl IntoIterator<Item = Field>) -> Self {
        self.qualifiers = Some(qualifiers.into_iter().collect());
        self
    }

    /// Append an ordering.
    pub fn order_by(mut self, order: OrderField) -> Self {
        self.order_by.push(order);
        self
    }

    /// Limit the number of rows returned.
    pub fn top(mut self, rows: usize) -> Self {
        self.top = Some(rows);
        self
    }

    /// Number of rows a multi-row command composes for.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Table hints, e.g. `WITH (NOLOCK)`.
    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = Some(hints.into());
        self
    }

    // ==================== Accessors ====================

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Entity identity, falling back to the table name.
    pub fn entity_name(&self) -> &str {
        self.entity.as_deref().unwrap_or(&self.table)
    }

    pub fn field_list(&self) -> Option<&[Field]> {
        self.fields.as_deref()
    }

    pub fn where_group(&self) -> Option<&QueryGroup> {
        self.filter.as_ref()
    }

    pub fn qualifier_list(&self) -> Option<&[Field]> {
        self.qualifiers.as_deref()
    }

    pub fn order_list(&self) -> &[OrderField] {
        &self.order_by
    }

    pub fn top_rows(&self) -> Option<usize> {
        self.top
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn rows_per_batch(&self) -> usize {
        self.rows_per_batch
    }

    pub fn batch(&self) -> usize {
        self.batch_size
    }

    pub fn hint_text(&self) -> Option<&str> {
        self.hints.as_deref()
    }

    /// Aggregated column of an aggregate request.
    pub fn target(&self) -> Option<&Field> {
        self.target.as_ref()
    }

    /// Bindings the filter tree contributes to the composed text.
    pub fn parameters(&self) -> Vec<BoundParameter> {
        self.filter
            .as_ref()
            .map(|group| group.parameters(0))
            .unwrap_or_default()
    }

    /// Structural identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey {
            kind: self.kind,
            table: self.table.clone(),
            entity: self.entity.clone(),
            fields: self.fields.clone(),
            filter: self.filter.as_ref().map(QueryGroup::key),
            qualifiers: self.qualifiers.clone(),
            order_by: self.order_by.clone(),
            top: self.top,
            page: self.page,
            rows_per_batch: self.rows_per_batch,
            batch_size: self.batch_size,
            hints: self.hints.clone(),
            target: self.target.clone(),
        }
    }
}

/// Cache-key projection of a [`StatementRequest`]: every structural input,
/// with the filter tree reduced to its [`QueryGroupKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub kind: CommandKind,
    pub table: String,
    pub entity: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub filter: Option<QueryGroupKey>,
    pub qualifiers: Option<Vec<Field>>,
    pub order_by: Vec<OrderField>,
    pub top: Option<usize>,
    pub page: usize,
    pub rows_per_batch: usize,
    pub batch_size: usize,
    pub hints: Option<String>,
    pub target: Option<Field>,
}
