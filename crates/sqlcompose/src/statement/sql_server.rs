//! SQL Server statement builder.

use super::{MergePlan, RESULT_ALIAS, SOURCE_ALIAS, StatementBuilder, TARGET_ALIAS};
use crate::builder::QueryBuilder;
use crate::db_field::DbFieldList;
use crate::error::StmtResult;
use crate::setting::DbSetting;

/// `[quoted]` identifiers, `ROW_NUMBER()` paging, `TOP (n)`, `MERGE` upserts
/// and `SCOPE_IDENTITY()`.
#[derive(Debug, Clone)]
pub struct SqlServerStatementBuilder {
    setting: DbSetting,
}

impl SqlServerStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(DbSetting::sql_server())
    }

    /// Use customized settings (e.g. another default schema).
    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }
}

impl Default for SqlServerStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for SqlServerStatementBuilder {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn identity_expression(&self) -> &'static str {
        "SCOPE_IDENTITY()"
    }

    fn count_expression(&self) -> &'static str {
        "COUNT_BIG (*)"
    }

    fn write_top(&self, qb: &mut QueryBuilder, rows: usize) {
        qb.top(rows);
    }

    fn write_limit(&self, _qb: &mut QueryBuilder, _rows: usize) {}

    /// ```text
    /// MERGE [T] AS T USING ( SELECT @A AS [A], .. ) AS S ON ( S.[Q] = T.[Q] )
    ///   WHEN NOT MATCHED THEN INSERT ( .. ) VALUES ( S.[A], .. )
    ///   WHEN MATCHED THEN UPDATE SET [A] = S.[A], ..
    ///   OUTPUT INSERTED.[Id] AS [Result];
    /// ```
    fn write_merge(
        &self,
        qb: &mut QueryBuilder,
        table: &str,
        plan: &MergePlan,
        db_fields: &DbFieldList,
        index: usize,
    ) -> StmtResult<()> {
        let setting = &self.setting;
        qb.merge()
            .table_name_from(table, setting)?
            .as_(TARGET_ALIAS)
            .using()
            .open_paren()
            .select()
            .parameters_as_fields_from(&plan.fields, index, setting)
            .close_paren()
            .as_(SOURCE_ALIAS)
            .on()
            .open_paren()
            .join_qualifiers_from(&plan.qualifiers, SOURCE_ALIAS, TARGET_ALIAS, setting)
            .close_paren()
            .when()
            .not()
            .matched()
            .then()
            .insert()
            .open_paren()
            .fields_from(&plan.insert_fields, setting)
            .close_paren()
            .values()
            .open_paren()
            .as_alias_fields_from(&plan.insert_fields, SOURCE_ALIAS, setting)
            .close_paren();
        if !plan.update_fields.is_empty() {
            qb.when()
                .matched()
                .then()
                .update()
                .set()
                .fields_and_alias_fields_from(&plan.update_fields, SOURCE_ALIAS, setting);
        }
        if let Some(primary) = db_fields.primary() {
            qb.write_text("OUTPUT")
                .write_text(&primary.as_field().as_alias_field("INSERTED", setting))
                .as_(&setting.quote(RESULT_ALIAS));
        }
        qb.end();
        Ok(())
    }
}
