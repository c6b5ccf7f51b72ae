//! Statement text assembler.
//!
//! [`QueryBuilder`] is a dumb token accumulator: one method per SQL keyword or
//! clause, each appending a single leading space unless the buffer is empty,
//! so the output stays single-space separated whatever the call order. List
//! clauses are joined with `", "`. The assembler performs no SQL validation;
//! that is the statement builders' job.
//!
//! # Example
//! ```
//! use sqlcompose::{DbSetting, Field, QueryBuilder};
//!
//! let setting = DbSetting::sql_server();
//! let fields = Field::from_names(["Id", "Name"]);
//! let mut qb = QueryBuilder::new();
//! qb.select()
//!     .fields_from(&fields, &setting)
//!     .from()
//!     .table_name_from("Person", &setting)?
//!     .end();
//! assert_eq!(qb.get_string(), "SELECT [Id], [Name] FROM [Person];");
//! # Ok::<(), sqlcompose::StmtError>(())
//! ```

use crate::error::StmtResult;
use crate::field::{Field, OrderField, indexed, parameter_name};
use crate::ident::IntoIdent;
use crate::parameter::UPDATE_MARKER;
use crate::query::QueryGroup;
use crate::setting::DbSetting;

/// Mutable statement text buffer, scoped to one composition call.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct QueryBuilder {
    buf: String,
}

macro_rules! keywords {
    ($($(#[$meta:meta])* $name:ident => $text:literal;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self) -> &mut Self {
                self.write_text($text)
            }
        )*
    };
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the buffer so the builder can be reused.
    pub fn clear(&mut self) -> &mut Self {
        self.buf.clear();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The assembled statement.
    pub fn get_string(&self) -> String {
        self.buf.trim().to_string()
    }

    /// Append a token, separated from the previous one by a single space.
    pub fn write_text(&mut self, text: &str) -> &mut Self {
        let text = text.trim();
        if text.is_empty() {
            return self;
        }
        if !self.buf.is_empty() {
            self.buf.push(' ');
        }
        self.buf.push_str(text);
        self
    }

    /// Terminate the statement with `;` (attached to the previous token).
    pub fn end(&mut self) -> &mut Self {
        let trimmed = self.buf.trim_end().len();
        self.buf.truncate(trimmed);
        self.buf.push(';');
        self
    }

    keywords! {
        select => "SELECT";
        insert => "INSERT";
        into => "INTO";
        values => "VALUES";
        update => "UPDATE";
        set => "SET";
        delete => "DELETE";
        from => "FROM";
        where_ => "WHERE";
        join => "JOIN";
        inner => "INNER";
        left => "LEFT";
        order_by => "ORDER BY";
        group_by => "GROUP BY";
        merge => "MERGE";
        using => "USING";
        on => "ON";
        when => "WHEN";
        not => "NOT";
        matched => "MATCHED";
        then => "THEN";
        with => "WITH";
        and => "AND";
        or => "OR";
        over => "OVER";
        truncate => "TRUNCATE";
        table => "TABLE";
        open_paren => "(";
        close_paren => ")";
        /// `ROW_NUMBER()`
        row_number => "ROW_NUMBER()";
        /// `RETURNING`
        returning => "RETURNING";
        /// `ON CONFLICT`
        on_conflict => "ON CONFLICT";
        /// `DO UPDATE`
        do_update => "DO UPDATE";
        /// `DO NOTHING`
        do_nothing => "DO NOTHING";
        /// `ON DUPLICATE KEY UPDATE`
        on_duplicate_key_update => "ON DUPLICATE KEY UPDATE";
    }

    /// `,` attached to the previous token.
    pub fn comma(&mut self) -> &mut Self {
        let trimmed = self.buf.trim_end().len();
        self.buf.truncate(trimmed);
        self.buf.push(',');
        self
    }

    /// `WITH <name> AS (`; the caller closes the parenthesis.
    pub fn with_cte(&mut self, name: &str) -> &mut Self {
        self.with().write_text(name).write_text("AS").open_paren()
    }

    /// `AS <alias>`
    pub fn as_(&mut self, alias: &str) -> &mut Self {
        self.write_text("AS").write_text(alias)
    }

    /// `TOP (n)`
    pub fn top(&mut self, rows: usize) -> &mut Self {
        self.write_text(&format!("TOP ({rows})"))
    }

    /// `LIMIT n`
    pub fn limit(&mut self, rows: usize) -> &mut Self {
        self.write_text(&format!("LIMIT {rows}"))
    }

    /// `OFFSET n`
    pub fn offset(&mut self, rows: usize) -> &mut Self {
        self.write_text(&format!("OFFSET {rows}"))
    }

    /// `BETWEEN a AND b` with literal bounds.
    pub fn between(&mut self, from: usize, to: usize) -> &mut Self {
        self.write_text(&format!("BETWEEN {from} AND {to}"))
    }

    /// Schema-qualified, quoted table name.
    pub fn table_name_from(
        &mut self,
        name: impl IntoIdent,
        setting: &DbSetting,
    ) -> StmtResult<&mut Self> {
        let ident = name.into_ident()?;
        Ok(self.write_text(&ident.to_sql(setting)))
    }

    /// Table hints, e.g. `WITH (NOLOCK)`.
    pub fn hints_from(&mut self, hints: Option<&str>) -> &mut Self {
        match hints {
            Some(h) => self.write_text(h),
            None => self,
        }
    }

    // ==================== Field lists ====================

    /// `[A], [B]`
    pub fn fields_from(&mut self, fields: &[Field], setting: &DbSetting) -> &mut Self {
        self.write_list(fields.iter().map(|f| f.as_field(setting)), ", ")
    }

    /// `S.[A], S.[B]`
    pub fn as_alias_fields_from(
        &mut self,
        fields: &[Field],
        alias: &str,
        setting: &DbSetting,
    ) -> &mut Self {
        self.write_list(fields.iter().map(|f| f.as_alias_field(alias, setting)), ", ")
    }

    /// `@A, @B` (suffixed with `_{index}` for batch row `index > 0`)
    pub fn parameters_from(
        &mut self,
        fields: &[Field],
        index: usize,
        setting: &DbSetting,
    ) -> &mut Self {
        self.write_list(fields.iter().map(|f| f.as_parameter(index, setting)), ", ")
    }

    /// `@A AS [A], @B AS [B]`
    pub fn parameters_as_fields_from(
        &mut self,
        fields: &[Field],
        index: usize,
        setting: &DbSetting,
    ) -> &mut Self {
        self.write_list(
            fields.iter().map(|f| f.as_parameter_as_field(index, setting)),
            ", ",
        )
    }

    /// `[A] = @A, [B] = @B`
    pub fn fields_and_parameters_from(
        &mut self,
        fields: &[Field],
        index: usize,
        setting: &DbSetting,
    ) -> &mut Self {
        self.write_list(
            fields.iter().map(|f| f.as_field_and_parameter(index, setting)),
            ", ",
        )
    }

    /// `[A] = S.[A], [B] = S.[B]`
    pub fn fields_and_alias_fields_from(
        &mut self,
        fields: &[Field],
        alias: &str,
        setting: &DbSetting,
    ) -> &mut Self {
        self.write_list(
            fields
                .iter()
                .map(|f| f.as_field_and_alias_field(alias, setting)),
            ", ",
        )
    }

    /// `S.[A] = T.[A] AND S.[B] = T.[B]`
    pub fn join_qualifiers_from(
        &mut self,
        fields: &[Field],
        left: &str,
        right: &str,
        setting: &DbSetting,
    ) -> &mut Self {
        self.write_list(
            fields
                .iter()
                .map(|f| f.as_join_qualifier(left, right, setting)),
            " AND ",
        )
    }

    // ==================== Clauses ====================

    /// `WHERE ( ... )`; nothing for an absent or empty tree.
    pub fn where_from(
        &mut self,
        group: Option<&QueryGroup>,
        index: usize,
        setting: &DbSetting,
    ) -> &mut Self {
        match group.map(|g| g.get_string(index, setting)) {
            Some(text) if !text.is_empty() => self.where_().write_text(&text),
            _ => self,
        }
    }

    /// `WHERE ( [A] = @A AND [B] = @B )` over plain equalities.
    ///
    /// With `for_update`, parameters carry the update marker (`@_A`).
    pub fn where_fields_from(
        &mut self,
        fields: &[Field],
        index: usize,
        for_update: bool,
        setting: &DbSetting,
    ) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let conditions: Vec<String> = fields
            .iter()
            .map(|f| {
                let mut name = parameter_name(f.name());
                if for_update {
                    name.insert(0, UPDATE_MARKER);
                }
                format!(
                    "{} = {}",
                    f.as_field(setting),
                    setting.parameter(&indexed(&name, index))
                )
            })
            .collect();
        self.where_()
            .write_text(&format!("( {} )", conditions.join(" AND ")))
    }

    /// `ORDER BY [A] ASC, [B] DESC`; nothing when empty.
    pub fn order_by_from(&mut self, order_by: &[OrderField], setting: &DbSetting) -> &mut Self {
        if order_by.is_empty() {
            return self;
        }
        self.order_by()
            .write_list(order_by.iter().map(|o| o.as_order(setting)), ", ")
    }

    /// `GROUP BY [A], [B]`; nothing when empty.
    pub fn group_by_from(&mut self, fields: &[Field], setting: &DbSetting) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        self.group_by().fields_from(fields, setting)
    }

    fn write_list(&mut self, items: impl Iterator<Item = String>, separator: &str) -> &mut Self {
        let items: Vec<String> = items.collect();
        if items.is_empty() {
            return self;
        }
        self.write_text(&items.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryField;

    fn mssql() -> DbSetting {
        DbSetting::sql_server()
    }

    #[test]
    fn single_space_separation() {
        let mut qb = QueryBuilder::new();
        qb.write_text("SELECT ").write_text("  1").write_text("").end();
        assert_eq!(qb.get_string(), "SELECT 1;");
    }

    #[test]
    fn end_attaches_to_previous_token() {
        let mut qb = QueryBuilder::new();
        qb.delete().from().write_text("[T]").end().select().write_text("1").end();
        assert_eq!(qb.get_string(), "DELETE FROM [T]; SELECT 1;");
    }

    #[test]
    fn insert_values_shape() {
        let s = mssql();
        let fields = Field::from_names(["Name", "Age"]);
        let mut qb = QueryBuilder::new();
        qb.insert()
            .into()
            .table_name_from("Person", &s)
            .unwrap()
            .open_paren()
            .fields_from(&fields, &s)
            .close_paren()
            .values()
            .open_paren()
            .parameters_from(&fields, 0, &s)
            .close_paren()
            .end();
        assert_eq!(
            qb.get_string(),
            "INSERT INTO [Person] ( [Name], [Age] ) VALUES ( @Name, @Age );"
        );
    }

    #[test]
    fn where_from_skips_empty_group() {
        let mut qb = QueryBuilder::new();
        qb.select().write_text("*").where_from(Some(&QueryGroup::default()), 0, &mssql());
        assert_eq!(qb.get_string(), "SELECT *");

        qb.clear()
            .select()
            .write_text("*")
            .where_from(Some(&QueryGroup::from_field(QueryField::eq("Id", 1))), 0, &mssql());
        assert_eq!(qb.get_string(), "SELECT * WHERE ( [Id] = @Id )");
    }

    #[test]
    fn where_fields_for_update() {
        let mut qb = QueryBuilder::new();
        qb.where_fields_from(&Field::from_names(["Id", "Tenant"]), 2, true, &mssql());
        assert_eq!(
            qb.get_string(),
            "WHERE ( [Id] = @_Id_2 AND [Tenant] = @_Tenant_2 )"
        );
    }

    #[test]
    fn order_and_group_by() {
        let s = DbSetting::postgres();
        let mut qb = QueryBuilder::new();
        qb.group_by_from(&Field::from_names(["City"]), &s)
            .order_by_from(&[OrderField::descending("City")], &s)
            .order_by_from(&[], &s);
        assert_eq!(qb.get_string(), "GROUP BY \"City\" ORDER BY \"City\" DESC");
    }

    #[test]
    fn merge_fragments() {
        let s = mssql();
        let fields = Field::from_names(["Id", "Name"]);
        let mut qb = QueryBuilder::new();
        qb.using()
            .open_paren()
            .select()
            .parameters_as_fields_from(&fields, 0, &s)
            .close_paren()
            .as_("S")
            .on()
            .open_paren()
            .join_qualifiers_from(&fields[..1], "S", "T", &s)
            .close_paren();
        assert_eq!(
            qb.get_string(),
            "USING ( SELECT @Id AS [Id], @Name AS [Name] ) AS S ON ( S.[Id] = T.[Id] )"
        );
    }

    #[test]
    fn join_and_cte_fragments() {
        let s = mssql();
        let mut qb = QueryBuilder::new();
        qb.with_cte("CTE")
            .select()
            .write_text("1")
            .as_("[One]")
            .comma()
            .write_text("[P].[Id]")
            .from()
            .write_text("[Person] [P]")
            .inner()
            .join()
            .write_text("[City] [C]")
            .on()
            .write_text("[P].[CityId] = [C].[Id]")
            .left()
            .join()
            .write_text("[Region] [R]")
            .on()
            .write_text("[C].[RegionId] = [R].[Id]")
            .where_()
            .write_text("[R].[Id] IS NULL")
            .close_paren()
            .select()
            .write_text("*")
            .from()
            .write_text("CTE")
            .order_by_from(&[OrderField::ascending("Id")], &s)
            .end();
        assert_eq!(
            qb.get_string(),
            "WITH CTE AS ( SELECT 1 AS [One], [P].[Id] FROM [Person] [P] \
             INNER JOIN [City] [C] ON [P].[CityId] = [C].[Id] \
             LEFT JOIN [Region] [R] ON [C].[RegionId] = [R].[Id] \
             WHERE [R].[Id] IS NULL ) SELECT * FROM CTE ORDER BY [Id] ASC;"
        );
    }

    #[test]
    fn paging_primitives() {
        let mut qb = QueryBuilder::new();
        qb.top(10).limit(5).offset(20).between(11, 20).row_number().over();
        assert_eq!(
            qb.get_string(),
            "TOP (10) LIMIT 5 OFFSET 20 BETWEEN 11 AND 20 ROW_NUMBER() OVER"
        );
    }
}
