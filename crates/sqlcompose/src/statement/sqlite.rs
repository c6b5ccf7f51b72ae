//! SQLite statement builder.

use super::{CommandContext, MergePlan, StatementBuilder, write_on_conflict, write_upsert_result};
use crate::builder::QueryBuilder;
use crate::db_field::DbFieldList;
use crate::error::StmtResult;
use crate::setting::DbSetting;

/// `[quoted]` identifiers, `LIMIT`/`OFFSET` paging, `ON CONFLICT` upserts and
/// `last_insert_rowid()`. SQLite has no `TRUNCATE`; truncation is an
/// unfiltered `DELETE`.
#[derive(Debug, Clone)]
pub struct SqliteStatementBuilder {
    setting: DbSetting,
}

impl SqliteStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(DbSetting::sqlite())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }
}

impl Default for SqliteStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for SqliteStatementBuilder {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn identity_expression(&self) -> &'static str {
        "last_insert_rowid()"
    }

    fn write_merge(
        &self,
        qb: &mut QueryBuilder,
        table: &str,
        plan: &MergePlan,
        db_fields: &DbFieldList,
        index: usize,
    ) -> StmtResult<()> {
        write_on_conflict(qb, &self.setting, table, plan, db_fields, index)?;
        write_upsert_result(qb, &self.setting, self.identity_expression(), db_fields, index);
        Ok(())
    }

    fn create_truncate(&self, ctx: &CommandContext<'_>) -> StmtResult<String> {
        self.create_delete_all(ctx)
    }
}
