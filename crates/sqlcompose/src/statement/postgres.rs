//! PostgreSQL statement builder.

use super::{MergePlan, RESULT_ALIAS, StatementBuilder, write_on_conflict};
use crate::builder::QueryBuilder;
use crate::db_field::DbFieldList;
use crate::error::StmtResult;
use crate::setting::DbSetting;

/// `"quoted"` identifiers, `LIMIT`/`OFFSET` paging, `ON CONFLICT` upserts and
/// `RETURNING` for generated keys.
#[derive(Debug, Clone)]
pub struct PostgresStatementBuilder {
    setting: DbSetting,
}

impl PostgresStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(DbSetting::postgres())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }

    /// `RETURNING "Id" AS "Result";` (or `NULL` without a primary column).
    fn write_returning(&self, qb: &mut QueryBuilder, db_fields: &DbFieldList) {
        let setting = &self.setting;
        qb.returning();
        match db_fields.primary() {
            Some(primary) => qb.write_text(&primary.as_field().as_field(setting)),
            None => qb.write_text("NULL"),
        };
        qb.as_(&setting.quote(RESULT_ALIAS)).end();
    }
}

impl Default for PostgresStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for PostgresStatementBuilder {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn identity_expression(&self) -> &'static str {
        "lastval()"
    }

    fn write_insert_result(
        &self,
        qb: &mut QueryBuilder,
        db_fields: &DbFieldList,
        _index: usize,
    ) -> StmtResult<()> {
        self.write_returning(qb, db_fields);
        Ok(())
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
        self.write_returning(qb, db_fields);
        Ok(())
    }
}
