//! MySQL statement builder.

use super::{MergePlan, StatementBuilder, write_upsert_result};
use crate::builder::QueryBuilder;
use crate::db_field::DbFieldList;
use crate::error::StmtResult;
use crate::setting::DbSetting;

/// `` `quoted` `` identifiers, `LIMIT`/`OFFSET` paging, `ON DUPLICATE KEY
/// UPDATE` upserts and `LAST_INSERT_ID()`.
#[derive(Debug, Clone)]
pub struct MySqlStatementBuilder {
    setting: DbSetting,
}

impl MySqlStatementBuilder {
    pub fn new() -> Self {
        Self::with_setting(DbSetting::mysql())
    }

    pub fn with_setting(setting: DbSetting) -> Self {
        Self { setting }
    }
}

impl Default for MySqlStatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementBuilder for MySqlStatementBuilder {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn setting(&self) -> &DbSetting {
        &self.setting
    }

    fn identity_expression(&self) -> &'static str {
        "LAST_INSERT_ID()"
    }

    /// ```text
    /// INSERT INTO `T` ( .. ) VALUES ( .. )
    ///   ON DUPLICATE KEY UPDATE `A` = VALUES(`A`), ..;
    /// SELECT COALESCE(@Id, LAST_INSERT_ID()) AS `Result`;
    /// ```
    ///
    /// The conflict target is the table's unique keys; the qualifiers only
    /// have to be part of the inserted row. With nothing to update the first
    /// qualifier is assigned to itself, keeping the statement a no-op on
    /// conflict.
    fn write_merge(
        &self,
        qb: &mut QueryBuilder,
        table: &str,
        plan: &MergePlan,
        db_fields: &DbFieldList,
        index: usize,
    ) -> StmtResult<()> {
        let setting = &self.setting;
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
            .on_duplicate_key_update();

        let assignments: Vec<String> = if plan.update_fields.is_empty() {
            plan.qualifiers
                .iter()
                .take(1)
                .map(|q| {
                    let column = q.as_field(setting);
                    format!("{column} = {column}")
                })
                .collect()
        } else {
            plan.update_fields
                .iter()
                .map(|f| {
                    let column = f.as_field(setting);
                    format!("{column} = VALUES({column})")
                })
                .collect()
        };
        qb.write_text(&assignments.join(", "));

        write_upsert_result(qb, setting, self.identity_expression(), db_fields, index);
        Ok(())
    }
}
