use super::*;
use crate::db_field::DbField;
use crate::field::OrderField;
use crate::query::QueryField;
use crate::request::AggregateFunction;
use crate::value::Value;

fn person() -> DbFieldList {
    DbFieldList::new(vec![
        DbField::new("Id").primary().identity(),
        DbField::new("Name"),
        DbField::new("Age"),
    ])
}

fn compose_with(
    builder: &dyn StatementBuilder,
    request: &StatementRequest,
    db_fields: &DbFieldList,
) -> StmtResult<String> {
    builder.compose(&CommandContext::new(request, db_fields))
}

fn mssql(request: StatementRequest) -> StmtResult<String> {
    compose_with(&SqlServerStatementBuilder::new(), &request, &person())
}

fn pg(request: StatementRequest) -> StmtResult<String> {
    compose_with(&PostgresStatementBuilder::new(), &request, &person())
}

fn mysql(request: StatementRequest) -> StmtResult<String> {
    compose_with(&MySqlStatementBuilder::new(), &request, &person())
}

fn sqlite(request: StatementRequest) -> StmtResult<String> {
    compose_with(&SqliteStatementBuilder::new(), &request, &person())
}

// ==================== SQL Server ====================

#[test]
fn test_insert_returns_scope_identity() {
    assert_eq!(
        mssql(StatementRequest::insert("Table")).unwrap(),
        "INSERT INTO [Table] ( [Name], [Age] ) VALUES ( @Name, @Age ); \
         SELECT SCOPE_IDENTITY() AS [Result];"
    );
}

#[test]
fn test_insert_without_identity_returns_primary_parameter() {
    let fields = DbFieldList::new(vec![DbField::new("Code").primary(), DbField::new("Name")]);
    let sql = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::insert("Country"),
        &fields,
    )
    .unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [Country] ( [Code], [Name] ) VALUES ( @Code, @Name ); \
         SELECT @Code AS [Result];"
    );

    let fields = DbFieldList::new(vec![DbField::new("Line")]);
    let sql = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::insert("Log"),
        &fields,
    )
    .unwrap();
    assert!(sql.ends_with("SELECT NULL AS [Result];"));
}

#[test]
fn test_insert_all_suffixes_rows() {
    assert_eq!(
        mssql(StatementRequest::insert_all("Table", 2)).unwrap(),
        "INSERT INTO [Table] ( [Name], [Age] ) VALUES ( @Name, @Age ); \
         SELECT SCOPE_IDENTITY() AS [Result]; \
         INSERT INTO [Table] ( [Name], [Age] ) VALUES ( @Name_1, @Age_1 ); \
         SELECT SCOPE_IDENTITY() AS [Result];"
    );
    assert_eq!(
        mssql(StatementRequest::insert_all("Table", 0)),
        Err(StmtError::MissingArgument("batch_size"))
    );
}

#[test]
fn test_update_by_filter_marks_where_parameters() {
    let request = StatementRequest::update("Table").filter(QueryField::eq("Id", 1));
    assert_eq!(
        mssql(request).unwrap(),
        "UPDATE [Table] SET [Name] = @Name, [Age] = @Age WHERE ( [Id] = @_Id );"
    );
}

#[test]
fn test_update_defaults_to_primary() {
    assert_eq!(
        mssql(StatementRequest::update("Table")).unwrap(),
        "UPDATE [Table] SET [Name] = @Name, [Age] = @Age WHERE ( [Id] = @_Id );"
    );
}

#[test]
fn test_update_same_column_in_set_and_where() {
    let request = StatementRequest::update("Table").filter(QueryField::gt("Age", 65));
    assert_eq!(
        mssql(request).unwrap(),
        "UPDATE [Table] SET [Name] = @Name, [Age] = @Age WHERE ( [Age] > @_Age );"
    );
}

#[test]
fn test_update_without_qualifiers_fails() {
    let fields = DbFieldList::new(vec![DbField::new("Name"), DbField::new("Age")]);
    let err = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::update("Table"),
        &fields,
    )
    .unwrap_err();
    assert_eq!(err, StmtError::MissingQualifiers("Table".to_string()));
}

#[test]
fn test_inline_update() {
    let request = StatementRequest::inline_update("Table", [Field::new("name")]);
    assert_eq!(
        mssql(request).unwrap(),
        "UPDATE [Table] SET [Name] = @Name WHERE ( [Id] = @_Id );"
    );
}

#[test]
fn test_inline_update_rejects_identity() {
    let request = StatementRequest::inline_update("Table", Field::from_names(["Id", "Name"]));
    assert_eq!(
        mssql(request).unwrap_err(),
        StmtError::IdentityNotUpdatable {
            table: "Table".to_string(),
            field: "Id".to_string(),
        }
    );
}

#[test]
fn test_inline_update_rejects_unknown_fields() {
    let request = StatementRequest::inline_update("Table", Field::from_names(["Name", "Nope"]));
    assert_eq!(
        mssql(request).unwrap_err(),
        StmtError::unmatched_fields("Table", ["Nope"])
    );
    assert_eq!(
        mssql(StatementRequest::inline_update("Table", Vec::<Field>::new())).unwrap_err(),
        StmtError::MissingArgument("fields")
    );
}

#[test]
fn test_update_all_matches_on_qualifiers() {
    assert_eq!(
        mssql(StatementRequest::update_all("Table", 2)).unwrap(),
        "UPDATE [Table] SET [Name] = @Name, [Age] = @Age WHERE ( [Id] = @Id ); \
         UPDATE [Table] SET [Name] = @Name_1, [Age] = @Age_1 WHERE ( [Id] = @Id_1 );"
    );
    let request = StatementRequest::update_all("Table", 1).qualifiers([Field::new("Name")]);
    assert_eq!(
        mssql(request).unwrap(),
        "UPDATE [Table] SET [Age] = @Age WHERE ( [Name] = @Name );"
    );
}

#[test]
fn test_merge_grammar() {
    assert_eq!(
        mssql(StatementRequest::merge("Table")).unwrap(),
        "MERGE [Table] AS T USING ( SELECT @Id AS [Id], @Name AS [Name], @Age AS [Age] ) AS S \
         ON ( S.[Id] = T.[Id] ) \
         WHEN NOT MATCHED THEN INSERT ( [Name], [Age] ) VALUES ( S.[Name], S.[Age] ) \
         WHEN MATCHED THEN UPDATE SET [Name] = S.[Name], [Age] = S.[Age] \
         OUTPUT INSERTED.[Id] AS [Result];"
    );
}

#[test]
fn test_merge_excludes_qualifiers_from_update() {
    let request = StatementRequest::merge("Table").qualifiers(Field::from_names(["Id", "Name"]));
    let sql = mssql(request).unwrap();
    assert!(sql.contains("ON ( S.[Id] = T.[Id] AND S.[Name] = T.[Name] )"));
    assert!(sql.contains("INSERT ( [Name], [Age] )"));
    assert!(sql.contains("UPDATE SET [Age] = S.[Age]"));
}

#[test]
fn test_merge_without_qualifiers_or_primary_fails() {
    let fields = DbFieldList::new(vec![DbField::new("Name"), DbField::new("Age")]);
    let err = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::merge("Table"),
        &fields,
    )
    .unwrap_err();
    assert_eq!(err, StmtError::MissingQualifiers("Table".to_string()));
}

#[test]
fn test_merge_all_suffixes_rows() {
    let sql = mssql(StatementRequest::merge_all("Table", 2)).unwrap();
    assert!(sql.contains("SELECT @Id AS [Id], @Name AS [Name], @Age AS [Age] )"));
    assert!(sql.contains("SELECT @Id_1 AS [Id], @Name_1 AS [Name], @Age_1 AS [Age] )"));
    assert_eq!(sql.matches("MERGE [Table]").count(), 2);
}

#[test]
fn test_identity_must_be_primary() {
    let fields = DbFieldList::new(vec![
        DbField::new("Id").primary(),
        DbField::new("Seq").identity(),
    ]);
    let err = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::insert("Table"),
        &fields,
    )
    .unwrap_err();
    assert!(err.is_identity_mismatch());

    let fields = DbFieldList::new(vec![DbField::new("Seq").identity(), DbField::new("Name")]);
    let err = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::merge("Table").qualifiers([Field::new("Name")]),
        &fields,
    )
    .unwrap_err();
    assert_eq!(
        err,
        StmtError::IdentityMismatch {
            table: "Table".to_string(),
            identity: "Seq".to_string(),
            primary: None,
        }
    );
}

#[test]
fn test_insert_without_insertable_fields_fails() {
    let fields = DbFieldList::new(vec![DbField::new("Id").primary().identity()]);
    let err = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::insert("Table"),
        &fields,
    )
    .unwrap_err();
    assert_eq!(err, StmtError::missing_fields("Table", "Insert"));
}

#[test]
fn test_empty_table_name_fails() {
    assert_eq!(
        mssql(StatementRequest::query("  ")).unwrap_err(),
        StmtError::MissingArgument("table")
    );
}

#[test]
fn test_query_with_top_hints_and_order() {
    let request = StatementRequest::query("Table")
        .filter(QueryField::gt("Age", 18))
        .order_by(OrderField::descending("Age"))
        .top(5)
        .hints("WITH (NOLOCK)");
    assert_eq!(
        mssql(request).unwrap(),
        "SELECT TOP (5) [Id], [Name], [Age] FROM [Table] WITH (NOLOCK) \
         WHERE ( [Age] > @Age ) ORDER BY [Age] DESC;"
    );
}

#[test]
fn test_query_order_by_unknown_column_fails() {
    let request = StatementRequest::query_all("Table").order_by(OrderField::ascending("Missing"));
    assert_eq!(
        mssql(request).unwrap_err(),
        StmtError::unmatched_fields("Table", ["Missing"])
    );
}

#[test]
fn test_query_honours_mapping() {
    let request = StatementRequest::query("dbo.Table");
    let mapped = Field::from_names(["name", "Id"]);
    let fields = person();
    let ctx = CommandContext::new(&request, &fields).with_mapped_fields(Some(&mapped));
    assert_eq!(
        SqlServerStatementBuilder::new().compose(&ctx).unwrap(),
        "SELECT [Id], [Name] FROM [dbo].[Table];"
    );
}

#[test]
fn test_batch_query_row_number_window() {
    let request = StatementRequest::batch_query("Table", 1, 10).order_by(OrderField::ascending("Id"));
    assert_eq!(
        mssql(request).unwrap(),
        "WITH CTE AS ( SELECT ROW_NUMBER() OVER ( ORDER BY [Id] ASC ) AS [RowNumber], \
         [Id], [Name], [Age] FROM [Table] ) \
         SELECT [Id], [Name], [Age] FROM CTE WHERE ( [RowNumber] BETWEEN 11 AND 20 ) \
         ORDER BY [Id] ASC;"
    );
}

#[test]
fn test_batch_query_first_page_with_filter() {
    let request = StatementRequest::batch_query("Table", 0, 25)
        .filter(QueryField::like("Name", "A%"))
        .order_by(OrderField::descending("Age"));
    let sql = mssql(request).unwrap();
    assert!(sql.contains("FROM [Table] WHERE ( [Name] LIKE @Name ) )"));
    assert!(sql.contains("BETWEEN 1 AND 25"));
}

#[test]
fn test_batch_query_requires_ordering() {
    assert_eq!(
        mssql(StatementRequest::batch_query("Table", 0, 10)).unwrap_err(),
        StmtError::MissingOrderBy("Table".to_string())
    );
    let request = StatementRequest::batch_query("Table", 0, 0).order_by(OrderField::ascending("Id"));
    assert_eq!(
        mssql(request).unwrap_err(),
        StmtError::MissingArgument("rows_per_batch")
    );
}

#[test]
fn test_batch_query_rejects_pages_beyond_range() {
    let request =
        || StatementRequest::batch_query("Table", usize::MAX / 2, 10).order_by(OrderField::ascending("Id"));
    let expected = StmtError::PageOutOfRange {
        page: usize::MAX / 2,
        rows: 10,
    };
    assert_eq!(mssql(request()).unwrap_err(), expected);
    assert_eq!(pg(request()).unwrap_err(), expected);

    // The offset fits, the last row number does not.
    let request = StatementRequest::batch_query("Table", usize::MAX / 10, 10)
        .order_by(OrderField::ascending("Id"));
    assert!(matches!(
        mssql(request).unwrap_err(),
        StmtError::PageOutOfRange { .. }
    ));
}

#[test]
fn test_list_value_on_scalar_operation_fails() {
    let request =
        StatementRequest::query("Table").filter(QueryField::eq("Id", Value::list([1, 2])));
    assert!(matches!(
        mssql(request).unwrap_err(),
        StmtError::InvalidOperand { operation: "=", .. }
    ));

    let request = StatementRequest::delete("Table")
        .filter(crate::query::QueryGroup::from_pairs([("Age", Value::list([1, 2, 3]))]));
    assert!(matches!(
        pg(request).unwrap_err(),
        StmtError::InvalidOperand { .. }
    ));
}

#[test]
fn test_filter_rejected_where_never_rendered() {
    let filter = || QueryField::eq("Id", 1);
    let cases = [
        StatementRequest::insert("Table").filter(filter()),
        StatementRequest::insert_all("Table", 2).filter(filter()),
        StatementRequest::update_all("Table", 2).filter(filter()),
        StatementRequest::merge("Table").filter(filter()),
        StatementRequest::truncate("Table").filter(filter()),
        StatementRequest::query_all("Table").filter(filter()),
        StatementRequest::delete_all("Table").filter(filter()),
    ];
    for request in cases {
        let command = request.kind().as_str();
        assert_eq!(
            mssql(request).unwrap_err(),
            StmtError::UnexpectedFilter {
                table: "Table".to_string(),
                command,
            }
        );
    }
}

#[test]
fn test_batch_row_parameters_must_not_collide() {
    let fields = DbFieldList::new(vec![
        DbField::new("Id").primary().identity(),
        DbField::new("Name"),
        DbField::new("Name_1"),
    ]);
    let builder = SqlServerStatementBuilder::new();
    for request in [
        StatementRequest::insert_all("Table", 2),
        StatementRequest::update_all("Table", 2),
        StatementRequest::merge_all("Table", 2),
    ] {
        assert_eq!(
            compose_with(&builder, &request, &fields).unwrap_err(),
            StmtError::parameter_collision("Table", "Name_1")
        );
    }
    assert!(compose_with(&builder, &StatementRequest::insert("Table"), &fields).is_ok());

    let fields = DbFieldList::new(vec![DbField::new("First Name"), DbField::new("First_Name")]);
    assert_eq!(
        compose_with(&builder, &StatementRequest::insert("Table"), &fields).unwrap_err(),
        StmtError::parameter_collision("Table", "First_Name")
    );
}

#[test]
fn test_count_uses_big_count() {
    let request = StatementRequest::count("Table").filter(QueryField::is_null("Name"));
    assert_eq!(
        mssql(request).unwrap(),
        "SELECT COUNT_BIG (*) AS [CountValue] FROM [Table] WHERE ( [Name] IS NULL );"
    );
    assert_eq!(
        mssql(StatementRequest::count_all("Table")).unwrap(),
        "SELECT COUNT_BIG (*) AS [CountValue] FROM [Table];"
    );
}

#[test]
fn test_exists_and_aggregate() {
    let request = StatementRequest::exists("Table").filter(QueryField::eq("Id", 7));
    assert_eq!(
        mssql(request).unwrap(),
        "SELECT TOP (1) 1 AS [ExistsValue] FROM [Table] WHERE ( [Id] = @Id );"
    );
    let request = StatementRequest::aggregate("Table", AggregateFunction::Sum, "age");
    assert_eq!(
        mssql(request).unwrap(),
        "SELECT SUM ([Age]) AS [AggregateValue] FROM [Table];"
    );
    let request = StatementRequest::aggregate("Table", AggregateFunction::Max, "Salary");
    assert!(matches!(
        mssql(request),
        Err(StmtError::UnmatchedFields { .. })
    ));
}

#[test]
fn test_delete_variants() {
    let request = StatementRequest::delete("Table").filter(QueryField::in_list("Id", [1, 2]));
    assert_eq!(
        mssql(request).unwrap(),
        "DELETE FROM [Table] WHERE ( [Id] IN (@Id_In_0, @Id_In_1) );"
    );
    assert_eq!(
        mssql(StatementRequest::delete("Table")).unwrap(),
        "DELETE FROM [Table] WHERE ( [Id] = @Id );"
    );
    assert_eq!(
        mssql(StatementRequest::delete_all("Table")).unwrap(),
        "DELETE FROM [Table];"
    );
    assert_eq!(
        mssql(StatementRequest::truncate("Table")).unwrap(),
        "TRUNCATE TABLE [Table];"
    );

    let fields = DbFieldList::new(vec![DbField::new("Name")]);
    let err = compose_with(
        &SqlServerStatementBuilder::new(),
        &StatementRequest::delete("Table"),
        &fields,
    )
    .unwrap_err();
    assert_eq!(err, StmtError::MissingPrimaryKey("Table".to_string()));
}

#[test]
fn test_null_filter_value_renders_is_null() {
    let request = StatementRequest::query("Table").filter(QueryField::ne("Name", Value::Null));
    assert!(mssql(request).unwrap().ends_with("WHERE ( [Name] IS NOT NULL );"));
}

// ==================== PostgreSQL ====================

#[test]
fn test_postgres_insert_returning() {
    assert_eq!(
        pg(StatementRequest::insert("Table")).unwrap(),
        "INSERT INTO \"Table\" ( \"Name\", \"Age\" ) VALUES ( @Name, @Age ) \
         RETURNING \"Id\" AS \"Result\";"
    );
}

#[test]
fn test_postgres_limit_offset_paging() {
    let request = StatementRequest::batch_query("Table", 1, 10).order_by(OrderField::ascending("Id"));
    assert_eq!(
        pg(request).unwrap(),
        "SELECT \"Id\", \"Name\", \"Age\" FROM \"Table\" ORDER BY \"Id\" ASC LIMIT 10 OFFSET 10;"
    );
}

#[test]
fn test_postgres_row_number_paging_when_configured() {
    let builder = PostgresStatementBuilder::with_setting(
        DbSetting::postgres().paging(PagingStyle::RowNumber),
    );
    let request = StatementRequest::batch_query("Table", 2, 5).order_by(OrderField::ascending("Id"));
    let sql = compose_with(&builder, &request, &person()).unwrap();
    assert!(sql.starts_with("WITH CTE AS ( SELECT ROW_NUMBER() OVER ( ORDER BY \"Id\" ASC ) AS \"RowNumber\","));
    assert!(sql.contains("WHERE ( \"RowNumber\" BETWEEN 11 AND 15 )"));
}

#[test]
fn test_postgres_query_limit() {
    assert_eq!(
        pg(StatementRequest::query("Table").top(3)).unwrap(),
        "SELECT \"Id\", \"Name\", \"Age\" FROM \"Table\" LIMIT 3;"
    );
    assert_eq!(
        pg(StatementRequest::count_all("Table")).unwrap(),
        "SELECT COUNT(*) AS \"CountValue\" FROM \"Table\";"
    );
}

#[test]
fn test_postgres_upsert() {
    assert_eq!(
        pg(StatementRequest::merge("Table")).unwrap(),
        "INSERT INTO \"Table\" ( \"Id\", \"Name\", \"Age\" ) VALUES ( @Id, @Name, @Age ) \
         ON CONFLICT ( \"Id\" ) DO UPDATE SET \"Name\" = EXCLUDED.\"Name\", \"Age\" = EXCLUDED.\"Age\" \
         RETURNING \"Id\" AS \"Result\";"
    );
}

#[test]
fn test_postgres_upsert_with_nothing_to_update() {
    let request = StatementRequest::inline_merge("Table", [Field::new("Id")]);
    assert_eq!(
        pg(request).unwrap_err(),
        StmtError::missing_fields("Table", "InlineMerge")
    );
    let fields = DbFieldList::new(vec![DbField::new("Id").primary(), DbField::new("Name")]);
    let request = StatementRequest::merge("Tag").qualifiers(Field::from_names(["Id", "Name"]));
    let sql = compose_with(&PostgresStatementBuilder::new(), &request, &fields).unwrap();
    assert!(sql.contains("ON CONFLICT ( \"Id\", \"Name\" ) DO NOTHING RETURNING"));
}

#[test]
fn test_postgres_rejects_table_hints() {
    let request = StatementRequest::query("Table").hints("WITH (NOLOCK)");
    assert_eq!(
        pg(request).unwrap_err(),
        StmtError::unsupported("table hints", "PostgreSQL")
    );
}

// ==================== MySQL ====================

#[test]
fn test_mysql_insert_and_exists() {
    assert_eq!(
        mysql(StatementRequest::insert("Table")).unwrap(),
        "INSERT INTO `Table` ( `Name`, `Age` ) VALUES ( @Name, @Age ); \
         SELECT LAST_INSERT_ID() AS `Result`;"
    );
    assert_eq!(
        mysql(StatementRequest::exists("Table")).unwrap(),
        "SELECT 1 AS `ExistsValue` FROM `Table` LIMIT 1;"
    );
}

#[test]
fn test_mysql_upsert() {
    assert_eq!(
        mysql(StatementRequest::merge("Table")).unwrap(),
        "INSERT INTO `Table` ( `Id`, `Name`, `Age` ) VALUES ( @Id, @Name, @Age ) \
         ON DUPLICATE KEY UPDATE `Name` = VALUES(`Name`), `Age` = VALUES(`Age`); \
         SELECT COALESCE(@Id, LAST_INSERT_ID()) AS `Result`;"
    );
}

// ==================== SQLite ====================

#[test]
fn test_sqlite_truncate_is_delete() {
    assert_eq!(
        sqlite(StatementRequest::truncate("Table")).unwrap(),
        "DELETE FROM [Table];"
    );
}

#[test]
fn test_sqlite_inline_merge() {
    let request = StatementRequest::inline_merge("Table", Field::from_names(["Id", "Name"]));
    assert_eq!(
        sqlite(request).unwrap(),
        "INSERT INTO [Table] ( [Id], [Name] ) VALUES ( @Id, @Name ) \
         ON CONFLICT ( [Id] ) DO UPDATE SET [Name] = EXCLUDED.[Name]; \
         SELECT COALESCE(@Id, last_insert_rowid()) AS [Result];"
    );
}

#[test]
fn test_sqlite_inline_merge_requires_qualifiers_in_fields() {
    let request = StatementRequest::inline_merge("Table", [Field::new("Name")]);
    assert_eq!(
        sqlite(request).unwrap_err(),
        StmtError::unmatched_fields("Table", ["Id"])
    );
}
