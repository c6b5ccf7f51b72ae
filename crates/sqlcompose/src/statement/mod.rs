//! Dialect statement builders.
//!
//! A [`StatementBuilder`] turns a [`StatementRequest`] plus the target table's
//! column metadata into statement text, one `create_*` function per command
//! kind. Every function validates the schema invariants it depends on before
//! it touches the [`QueryBuilder`], so a failure never yields partial text.
//!
//! The grammar shared by the supported dialects lives in the trait's default
//! methods. A dialect overrides the hooks (`write_top`, `write_limit`,
//! `write_insert_result`, ...) and the commands whose grammar differs:
//!
//! | Dialect | Builder | Paging | Upsert |
//! |---|---|---|---|
//! | SQL Server | [`SqlServerStatementBuilder`] | `ROW_NUMBER()` CTE | `MERGE` |
//! | PostgreSQL | [`PostgresStatementBuilder`] | `LIMIT`/`OFFSET` | `ON CONFLICT` |
//! | MySQL | [`MySqlStatementBuilder`] | `LIMIT`/`OFFSET` | `ON DUPLICATE KEY UPDATE` |
//! | SQLite | [`SqliteStatementBuilder`] | `LIMIT`/`OFFSET` | `ON CONFLICT` |

mod fields;
mod mysql;
mod postgres;
mod sql_server;
mod sqlite;

#[cfg(test)]
mod tests;

pub use mysql::MySqlStatementBuilder;
pub use postgres::PostgresStatementBuilder;
pub use sql_server::SqlServerStatementBuilder;
pub use sqlite::SqliteStatementBuilder;

pub use fields::MergePlan;

use crate::builder::QueryBuilder;
use crate::db_field::DbFieldList;
use crate::error::{StmtError, StmtResult};
use crate::field::Field;
use crate::request::{CommandKind, StatementRequest};
use crate::setting::{DbSetting, PagingStyle};
use fields::{
    available_fields, batch_size, command_fields, contains, is_identity, is_primary,
    match_columns, non_empty, order_fields, qualifier_fields, require_table, table_hints,
    unique_row_parameters, validate_identity,
};

/// Alias of the common table expression wrapping a paged query.
pub const CTE_ALIAS: &str = "CTE";
/// Alias of the window row number inside the paging CTE.
pub const ROW_NUMBER_ALIAS: &str = "RowNumber";
/// Alias of the value selected after an insert or upsert.
pub const RESULT_ALIAS: &str = "Result";
/// Alias of the count aggregate.
pub const COUNT_ALIAS: &str = "CountValue";
/// Alias of the exists check.
pub const EXISTS_ALIAS: &str = "ExistsValue";
/// Alias of `SUM`/`MAX`/`MIN`/`AVG` aggregates.
pub const AGGREGATE_ALIAS: &str = "AggregateValue";
/// Alias of the source row of a `MERGE`.
pub const SOURCE_ALIAS: &str = "S";
/// Alias of the target table of a `MERGE`.
pub const TARGET_ALIAS: &str = "T";

/// Everything a statement builder reads for one composition.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub request: &'a StatementRequest,
    /// Columns of the target table, in table order.
    pub db_fields: &'a DbFieldList,
    /// Columns the entity maps for this command, when a mapping exists.
    pub mapped_fields: Option<&'a [Field]>,
}

impl<'a> CommandContext<'a> {
    pub fn new(request: &'a StatementRequest, db_fields: &'a DbFieldList) -> Self {
        Self {
            request,
            db_fields,
            mapped_fields: None,
        }
    }

    pub fn with_mapped_fields(mut self, fields: Option<&'a [Field]>) -> Self {
        self.mapped_fields = fields;
        self
    }
}

/// Composition strategy of one SQL dialect.
pub trait StatementBuilder: Send + Sync + std::fmt::Debug {
    /// Stable builder name; part of the statement cache key.
    fn name(&self) -> &'static str;

    /// Dialect settings driving quoting, parameters and paging.
    fn setting(&self) -> &DbSetting;

    /// Expression returning the identity value generated by the last insert.
    fn identity_expression(&self) -> &'static str;

    /// Big-integer row count expression.
    fn count_expression(&self) -> &'static str {
        "COUNT(*)"
    }

    /// Row limit placed right after `SELECT`.
    fn write_top(&self, _qb: &mut QueryBuilder, _rows: usize) {}

    /// Row limit placed at the end of the statement.
    fn write_limit(&self, qb: &mut QueryBuilder, rows: usize) {
        qb.limit(rows);
    }

    /// Terminate an insert and select the key of the new row: the generated
    /// identity, else the supplied primary value, else `NULL`.
    fn write_insert_result(
        &self,
        qb: &mut QueryBuilder,
        db_fields: &DbFieldList,
        index: usize,
    ) -> StmtResult<()> {
        let setting = self.setting();
        qb.end().select();
        match (db_fields.identity(), db_fields.primary()) {
            (Some(_), _) => qb.write_text(self.identity_expression()),
            (None, Some(primary)) => qb.write_text(&primary.as_field().as_parameter(index, setting)),
            (None, None) => qb.write_text("NULL"),
        };
        qb.as_(&setting.quote(RESULT_ALIAS)).end();
        Ok(())
    }

    /// Append one upsert of batch row `index`, terminated.
    fn write_merge(
        &self,
        qb: &mut QueryBuilder,
        table: &str,
        plan: &MergePlan,
        db_fields: &DbFieldList,
        index: usize,
    ) -> StmtResult<()>;

    /// Check the filter tree, then dispatch on the request's command kind.
    fn compose(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        if let Some(group) = ctx.request.where_group().filter(|g| !g.is_empty()) {
            let kind = ctx.request.kind();
            if !kind.accepts_filter() {
                return Err(StmtError::UnexpectedFilter {
                    table: ctx.request.table().to_string(),
                    command: kind.as_str(),
                });
            }
            group.validate()?;
        }
        match ctx.request.kind() {
            CommandKind::Query => self.create_query(ctx),
            CommandKind::QueryAll => self.create_query_all(ctx),
            CommandKind::BatchQuery => self.create_batch_query(ctx),
            CommandKind::Count => self.create_count(ctx),
            CommandKind::CountAll => self.create_count_all(ctx),
            CommandKind::Exists => self.create_exists(ctx),
            CommandKind::Aggregate(_) => self.create_aggregate(ctx),
            CommandKind::Insert => self.create_insert(ctx),
            CommandKind::InsertAll => self.create_insert_all(ctx),
            CommandKind::InlineInsert => self.create_inline_insert(ctx),
            CommandKind::Update => self.create_update(ctx),
            CommandKind::UpdateAll => self.create_update_all(ctx),
            CommandKind::InlineUpdate => self.create_inline_update(ctx),
            CommandKind::Delete => self.create_delete(ctx),
            CommandKind::DeleteAll => self.create_delete_all(ctx),
            CommandKind::Merge => self.create_merge(ctx),
            CommandKind::MergeAll => self.create_merge_all(ctx),
            CommandKind::InlineMerge => self.create_inline_merge(ctx),
            CommandKind::Truncate => self.create_truncate(ctx),
        }
    }

    // ==================== Reads ====================

    /// `SELECT [TOP] fields FROM table [hints] [WHERE] [ORDER BY] [LIMIT];`
    fn create_query(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        let hints = table_hints(ctx.request, setting)?;
        let fields = command_fields(ctx, table)?;
        let order_by = order_fields(ctx, table)?;
        let top = ctx.request.top_rows().filter(|rows| *rows > 0);

        let mut qb = QueryBuilder::new();
        qb.select();
        if let Some(rows) = top {
            self.write_top(&mut qb, rows);
        }
        qb.fields_from(&fields, setting)
            .from()
            .table_name_from(table, setting)?
            .hints_from(hints)
            .where_from(ctx.request.where_group(), 0, setting)
            .order_by_from(&order_by, setting);
        if let Some(rows) = top {
            self.write_limit(&mut qb, rows);
        }
        qb.end();
        Ok(qb.get_string())
    }

    /// `SELECT fields FROM table [hints] [ORDER BY];`
    fn create_query_all(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        let hints = table_hints(ctx.request, setting)?;
        let fields = command_fields(ctx, table)?;
        let order_by = order_fields(ctx, table)?;

        let mut qb = QueryBuilder::new();
        qb.select()
            .fields_from(&fields, setting)
            .from()
            .table_name_from(table, setting)?
            .hints_from(hints)
            .order_by_from(&order_by, setting)
            .end();
        Ok(qb.get_string())
    }

    /// One page of rows, `[page * rows + 1, (page + 1) * rows]` in the
    /// requested order. Ordering is mandatory: without it the page contents
    /// are not deterministic.
    fn create_batch_query(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        match self.setting().paging {
            PagingStyle::RowNumber => row_number_batch_query(self.setting(), ctx),
            PagingStyle::LimitOffset => limit_offset_batch_query(self.setting(), ctx),
        }
    }

    /// `SELECT <count> AS [CountValue] FROM table [hints] [WHERE];`
    fn create_count(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        let hints = table_hints(ctx.request, setting)?;

        let mut qb = QueryBuilder::new();
        qb.select()
            .write_text(self.count_expression())
            .as_(&setting.quote(COUNT_ALIAS))
            .from()
            .table_name_from(table, setting)?
            .hints_from(hints)
            .where_from(ctx.request.where_group(), 0, setting)
            .end();
        Ok(qb.get_string())
    }

    /// `SELECT <count> AS [CountValue] FROM table [hints];`
    fn create_count_all(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        let hints = table_hints(ctx.request, setting)?;

        let mut qb = QueryBuilder::new();
        qb.select()
            .write_text(self.count_expression())
            .as_(&setting.quote(COUNT_ALIAS))
            .from()
            .table_name_from(table, setting)?
            .hints_from(hints)
            .end();
        Ok(qb.get_string())
    }

    /// `SELECT [TOP (1)] 1 AS [ExistsValue] FROM table [WHERE] [LIMIT 1];`
    fn create_exists(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        let hints = table_hints(ctx.request, setting)?;

        let mut qb = QueryBuilder::new();
        qb.select();
        self.write_top(&mut qb, 1);
        qb.write_text("1")
            .as_(&setting.quote(EXISTS_ALIAS))
            .from()
            .table_name_from(table, setting)?
            .hints_from(hints)
            .where_from(ctx.request.where_group(), 0, setting);
        self.write_limit(&mut qb, 1);
        qb.end();
        Ok(qb.get_string())
    }

    /// `SELECT SUM ([Field]) AS [AggregateValue] FROM table [WHERE];`
    fn create_aggregate(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        let hints = table_hints(ctx.request, setting)?;
        let CommandKind::Aggregate(function) = ctx.request.kind() else {
            return Err(StmtError::missing_argument("aggregate function"));
        };
        let target = ctx
            .request
            .target()
            .ok_or_else(|| StmtError::missing_argument("field"))?;
        let target = match_columns(table, std::slice::from_ref(target), ctx.db_fields)?;
        let target = target
            .first()
            .ok_or_else(|| StmtError::missing_argument("field"))?;

        let mut qb = QueryBuilder::new();
        qb.select()
            .write_text(&format!("{} ({})", function.as_str(), target.as_field(setting)))
            .as_(&setting.quote(AGGREGATE_ALIAS))
            .from()
            .table_name_from(table, setting)?
            .hints_from(hints)
            .where_from(ctx.request.where_group(), 0, setting)
            .end();
        Ok(qb.get_string())
    }

    // ==================== Inserts ====================

    /// Insert of every insertable column; the identity column is left to the
    /// database and returned afterwards.
    fn create_insert(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let table = require_table(ctx.request)?;
        validate_identity(table, ctx.db_fields)?;
        let fields = insertable(ctx, table)?;
        unique_row_parameters(table, &fields, 1)?;
        let mut qb = QueryBuilder::new();
        self.write_insert(&mut qb, table, &fields, ctx.db_fields, 0)?;
        Ok(qb.get_string())
    }

    /// `batch_size` inserts, parameters of row `i > 0` suffixed `_{i}`.
    fn create_insert_all(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let table = require_table(ctx.request)?;
        validate_identity(table, ctx.db_fields)?;
        let rows = batch_size(ctx.request, self.setting())?;
        let fields = insertable(ctx, table)?;
        unique_row_parameters(table, &fields, rows)?;
        let mut qb = QueryBuilder::new();
        for index in 0..rows {
            self.write_insert(&mut qb, table, &fields, ctx.db_fields, index)?;
        }
        Ok(qb.get_string())
    }

    /// Insert of an explicit column subset.
    fn create_inline_insert(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        if ctx.request.field_list().is_none_or(<[Field]>::is_empty) {
            return Err(StmtError::missing_argument("fields"));
        }
        self.create_insert(ctx)
    }

    /// `INSERT INTO table ( fields ) VALUES ( params )` plus the insert result.
    fn write_insert(
        &self,
        qb: &mut QueryBuilder,
        table: &str,
        fields: &[Field],
        db_fields: &DbFieldList,
        index: usize,
    ) -> StmtResult<()> {
        let setting = self.setting();
        qb.insert()
            .into()
            .table_name_from(table, setting)?
            .open_paren()
            .fields_from(fields, setting)
            .close_paren()
            .values()
            .open_paren()
            .parameters_from(fields, index, setting)
            .close_paren();
        self.write_insert_result(qb, db_fields, index)
    }

    // ==================== Updates ====================

    /// `UPDATE table SET ... WHERE ( ... );`
    ///
    /// The WHERE clause is the filter tree, else the qualifiers, else the
    /// primary column; its parameters carry the update marker (`@_Id`) so
    /// they never collide with the SET parameters.
    fn create_update(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        validate_identity(table, ctx.db_fields)?;

        let filter = ctx.request.where_group().filter(|g| !g.is_empty());
        let qualifiers = match filter {
            Some(_) => Vec::new(),
            None => qualifier_fields(ctx, table)?,
        };

        let fields = match ctx.request.field_list() {
            Some(explicit) => {
                let fields = match_columns(table, explicit, ctx.db_fields)?;
                if let Some(identity) = fields.iter().find(|f| is_identity(f, ctx.db_fields)) {
                    return Err(StmtError::IdentityNotUpdatable {
                        table: table.to_string(),
                        field: identity.name().to_string(),
                    });
                }
                fields
            }
            None => available_fields(ctx)
                .into_iter()
                .filter(|f| {
                    !is_primary(f, ctx.db_fields)
                        && !is_identity(f, ctx.db_fields)
                        && !contains(&qualifiers, f)
                })
                .collect(),
        };
        let fields = non_empty(fields, ctx, table)?;
        unique_row_parameters(table, &fields, 1)?;

        let mut qb = QueryBuilder::new();
        qb.update()
            .table_name_from(table, setting)?
            .set()
            .fields_and_parameters_from(&fields, 0, setting);
        match filter {
            Some(group) => qb.where_from(Some(group), 0, setting),
            None => qb.where_fields_from(&qualifiers, 0, true, setting),
        };
        qb.end();
        Ok(qb.get_string())
    }

    /// `batch_size` updates matched by qualifiers (default: primary column).
    fn create_update_all(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;
        validate_identity(table, ctx.db_fields)?;
        let rows = batch_size(ctx.request, setting)?;
        let qualifiers = qualifier_fields(ctx, table)?;
        let fields: Vec<Field> = command_fields(ctx, table)?
            .into_iter()
            .filter(|f| {
                !contains(&qualifiers, f)
                    && !is_primary(f, ctx.db_fields)
                    && !is_identity(f, ctx.db_fields)
            })
            .collect();
        let fields = non_empty(fields, ctx, table)?;
        let bound: Vec<Field> = fields.iter().chain(&qualifiers).cloned().collect();
        unique_row_parameters(table, &bound, rows)?;

        let mut qb = QueryBuilder::new();
        for index in 0..rows {
            qb.update()
                .table_name_from(table, setting)?
                .set()
                .fields_and_parameters_from(&fields, index, setting)
                .where_fields_from(&qualifiers, index, false, setting)
                .end();
        }
        Ok(qb.get_string())
    }

    /// Update of an explicit column subset; the identity column may not be set.
    fn create_inline_update(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        if ctx.request.field_list().is_none_or(<[Field]>::is_empty) {
            return Err(StmtError::missing_argument("fields"));
        }
        self.create_update(ctx)
    }

    // ==================== Deletes ====================

    /// `DELETE FROM table WHERE ( ... );`, defaulting to the primary column.
    fn create_delete(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let setting = self.setting();
        let table = require_table(ctx.request)?;

        let mut qb = QueryBuilder::new();
        qb.delete().from().table_name_from(table, setting)?;
        match ctx.request.where_group().filter(|g| !g.is_empty()) {
            Some(group) => qb.where_from(Some(group), 0, setting),
            None => {
                let primary = ctx
                    .db_fields
                    .primary()
                    .ok_or_else(|| StmtError::MissingPrimaryKey(table.to_string()))?;
                qb.where_fields_from(&[primary.as_field()], 0, false, setting)
            }
        };
        qb.end();
        Ok(qb.get_string())
    }

    /// `DELETE FROM table;`
    fn create_delete_all(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let table = require_table(ctx.request)?;
        let mut qb = QueryBuilder::new();
        qb.delete()
            .from()
            .table_name_from(table, self.setting())?
            .end();
        Ok(qb.get_string())
    }

    /// `TRUNCATE TABLE table;`
    fn create_truncate(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let table = require_table(ctx.request)?;
        let mut qb = QueryBuilder::new();
        qb.truncate()
            .table()
            .table_name_from(table, self.setting())?
            .end();
        Ok(qb.get_string())
    }

    // ==================== Upserts ====================

    /// Insert-or-update matched by qualifiers (default: primary column).
    fn create_merge(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let table = require_table(ctx.request)?;
        let plan = MergePlan::new(ctx, table)?;
        unique_row_parameters(table, &plan.fields, 1)?;
        let mut qb = QueryBuilder::new();
        self.write_merge(&mut qb, table, &plan, ctx.db_fields, 0)?;
        Ok(qb.get_string())
    }

    /// `batch_size` upserts, parameters of row `i > 0` suffixed `_{i}`.
    fn create_merge_all(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        let table = require_table(ctx.request)?;
        let rows = batch_size(ctx.request, self.setting())?;
        let plan = MergePlan::new(ctx, table)?;
        unique_row_parameters(table, &plan.fields, rows)?;
        let mut qb = QueryBuilder::new();
        for index in 0..rows {
            self.write_merge(&mut qb, table, &plan, ctx.db_fields, index)?;
        }
        Ok(qb.get_string())
    }

    /// Upsert of an explicit column subset; must include the qualifiers.
    fn create_inline_merge(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        if ctx.request.field_list().is_none_or(<[Field]>::is_empty) {
            return Err(StmtError::missing_argument("fields"));
        }
        self.create_merge(ctx)
    }
}

/// Insertable columns: the command's fields without the identity column.
fn insertable(ctx: &CommandContext<'_>, table: &str) -> StmtResult<Vec<Field>> {
    let fields = command_fields(ctx, table)?
        .into_iter()
        .filter(|f| !is_identity(f, ctx.db_fields))
        .collect();
    non_empty(fields, ctx, table)
}

/// Rows of one page: `offset = page * rows`, numbered `offset + 1..=offset + rows`.
#[derive(Debug, Clone, Copy)]
struct PageBounds {
    rows: usize,
    offset: usize,
    last: usize,
}

fn page_bounds(ctx: &CommandContext<'_>, table: &str) -> StmtResult<PageBounds> {
    let rows = ctx.request.rows_per_batch();
    if rows == 0 {
        return Err(StmtError::missing_argument("rows_per_batch"));
    }
    if ctx.request.order_list().is_empty() {
        return Err(StmtError::MissingOrderBy(table.to_string()));
    }
    let page = ctx.request.page();
    let out_of_range = || StmtError::PageOutOfRange { page, rows };
    let offset = page.checked_mul(rows).ok_or_else(out_of_range)?;
    let last = offset.checked_add(rows).ok_or_else(out_of_range)?;
    Ok(PageBounds { rows, offset, last })
}

/// ```text
/// WITH CTE AS ( SELECT ROW_NUMBER() OVER ( ORDER BY .. ) AS [RowNumber], fields
///   FROM table [hints] [WHERE] ) SELECT fields FROM CTE
///   WHERE ( [RowNumber] BETWEEN a AND b ) ORDER BY ..;
/// ```
fn row_number_batch_query(setting: &DbSetting, ctx: &CommandContext<'_>) -> StmtResult<String> {
    let table = require_table(ctx.request)?;
    let page = page_bounds(ctx, table)?;
    let hints = table_hints(ctx.request, setting)?;
    let fields = command_fields(ctx, table)?;
    let order_by = order_fields(ctx, table)?;
    let row_number = setting.quote(ROW_NUMBER_ALIAS);

    let mut qb = QueryBuilder::new();
    qb.with_cte(CTE_ALIAS)
        .select()
        .row_number()
        .over()
        .open_paren()
        .order_by_from(&order_by, setting)
        .close_paren()
        .as_(&row_number)
        .comma()
        .fields_from(&fields, setting)
        .from()
        .table_name_from(table, setting)?
        .hints_from(hints)
        .where_from(ctx.request.where_group(), 0, setting)
        .close_paren()
        .select()
        .fields_from(&fields, setting)
        .from()
        .write_text(CTE_ALIAS)
        .where_()
        .open_paren()
        .write_text(&row_number)
        .between(page.offset + 1, page.last)
        .close_paren()
        .order_by_from(&order_by, setting)
        .end();
    Ok(qb.get_string())
}

/// `SELECT fields FROM table [WHERE] ORDER BY .. LIMIT rows OFFSET page * rows;`
fn limit_offset_batch_query(setting: &DbSetting, ctx: &CommandContext<'_>) -> StmtResult<String> {
    let table = require_table(ctx.request)?;
    let page = page_bounds(ctx, table)?;
    let hints = table_hints(ctx.request, setting)?;
    let fields = command_fields(ctx, table)?;
    let order_by = order_fields(ctx, table)?;

    let mut qb = QueryBuilder::new();
    qb.select()
        .fields_from(&fields, setting)
        .from()
        .table_name_from(table, setting)?
        .hints_from(hints)
        .where_from(ctx.request.where_group(), 0, setting)
        .order_by_from(&order_by, setting)
        .limit(page.rows)
        .offset(page.offset)
        .end();
    Ok(qb.get_string())
}

/// `INSERT .. ON CONFLICT ( qualifiers ) DO UPDATE SET col = EXCLUDED.col`,
/// without terminator. Shared by the dialects that speak it.
pub(crate) fn write_on_conflict(
    qb: &mut QueryBuilder,
    setting: &DbSetting,
    table: &str,
    plan: &MergePlan,
    db_fields: &DbFieldList,
    index: usize,
) -> StmtResult<()> {
    let insert_fields = plan.upsert_insert_fields(db_fields);
    qb.insert()
        .into()
        .table_name_from(table, setting)?
        .open_paren()
        .fields_from(&insert_fields, setting)
        .close_paren()
        .values()
        .open_paren()
        .parameters_from(&insert_fields, index, setting)
        .close_paren()
        .on_conflict()
        .open_paren()
        .fields_from(&plan.qualifiers, setting)
        .close_paren();
    if plan.update_fields.is_empty() {
        qb.do_nothing();
    } else {
        qb.do_update()
            .set()
            .fields_and_alias_fields_from(&plan.update_fields, "EXCLUDED", setting);
    }
    Ok(())
}

/// `SELECT COALESCE(@Id, <identity>) AS [Result];` style upsert result for
/// dialects without an output clause.
pub(crate) fn write_upsert_result(
    qb: &mut QueryBuilder,
    setting: &DbSetting,
    identity_expression: &str,
    db_fields: &DbFieldList,
    index: usize,
) {
    qb.end().select();
    match (db_fields.identity(), db_fields.primary()) {
        (Some(identity), _) => qb.write_text(&format!(
            "COALESCE({}, {identity_expression})",
            identity.as_field().as_parameter(index, setting)
        )),
        (None, Some(primary)) => qb.write_text(&primary.as_field().as_parameter(index, setting)),
        (None, None) => qb.write_text("NULL"),
    };
    qb.as_(&setting.quote(RESULT_ALIAS)).end();
}
