use sqlcompose::{
    Catalog, ComposerConfig, DbSetting, EntityMapping, Field, OrderField, QueryField, QueryGroup,
    SqlServerStatementBuilder, StatementCache, StatementComposer, StatementRequest, StmtError,
};
use std::sync::Arc;
use std::thread;

const SNAPSHOT: &str = r#"{
    "tables": [
        {
            "name": "dbo.Customer",
            "columns": [
                {"name": "Id", "is_primary": true, "is_identity": true, "is_nullable": false},
                {"name": "Name", "is_nullable": false},
                {"name": "Email"},
                {"name": "CreatedAt"}
            ]
        },
        {
            "name": "dbo.Country",
            "columns": [
                {"name": "Code", "is_primary": true, "is_nullable": false},
                {"name": "Name"}
            ]
        }
    ]
}"#;

fn catalog() -> Catalog {
    Catalog::from_json(DbSetting::sql_server(), SNAPSHOT).unwrap()
}

fn composer_over(catalog: Catalog, cache: Arc<StatementCache>) -> StatementComposer {
    StatementComposer::from_catalog(SqlServerStatementBuilder::new(), Arc::new(catalog), cache)
}

fn composer() -> StatementComposer {
    composer_over(catalog(), Arc::new(StatementCache::new()))
}

#[test]
fn composes_from_json_snapshot() {
    let composer = composer();
    let sql = composer
        .compose(&StatementRequest::query("Customer").filter(QueryField::eq("Id", 10)))
        .unwrap();
    assert_eq!(
        &*sql,
        "SELECT [Id], [Name], [Email], [CreatedAt] FROM [Customer] WHERE ( [Id] = @Id );"
    );

    let sql = composer.compose(&StatementRequest::insert("Country")).unwrap();
    assert_eq!(
        &*sql,
        "INSERT INTO [Country] ( [Code], [Name] ) VALUES ( @Code, @Name ); \
         SELECT @Code AS [Result];"
    );
}

#[test]
fn values_do_not_split_entries() {
    let composer = composer();
    for age in [18, 21, 65] {
        composer
            .compose(&StatementRequest::count("Customer").filter(QueryField::gt("Id", age)))
            .unwrap();
    }
    let stats = composer.cache().stats();
    assert_eq!((stats.misses, stats.hits, stats.entries), (1, 2, 1));
}

#[test]
fn structure_splits_entries() {
    let composer = composer();
    let requests = [
        StatementRequest::query("Customer").filter(QueryField::in_list("Id", [1, 2])),
        StatementRequest::query("Customer").filter(QueryField::in_list("Id", [1, 2, 3])),
        StatementRequest::query("Customer").filter(QueryField::eq("Email", "a@b.c")),
        StatementRequest::query("Customer").filter(QueryField::is_null("Email")),
        StatementRequest::query("Customer").filter(QueryGroup::or(vec![
            QueryField::eq("Name", "x"),
            QueryField::eq("Email", "y"),
        ])),
        StatementRequest::query("Customer").filter(QueryGroup::and(vec![
            QueryField::eq("Name", "x"),
            QueryField::eq("Email", "y"),
        ])),
        StatementRequest::query("Customer").top(5),
        StatementRequest::query("Customer").order_by(OrderField::descending("CreatedAt")),
    ];
    let texts: Vec<_> = requests
        .iter()
        .map(|r| composer.compose(r).unwrap())
        .collect();
    assert_eq!(composer.cache().len(), requests.len());
    assert!(texts[0].contains("IN (@Id_In_0, @Id_In_1)"));
    assert!(texts[1].contains("IN (@Id_In_0, @Id_In_1, @Id_In_2)"));
    assert!(texts[3].ends_with("WHERE ( [Email] IS NULL );"));
    assert!(texts[4].contains("( [Name] = @Name OR [Email] = @Email )"));
}

#[test]
fn duplicate_columns_in_filter_get_unique_parameters() {
    let composer = composer();
    let request = StatementRequest::query("Customer").filter(QueryGroup::and(vec![
        QueryField::gt("CreatedAt", "2024-01-01"),
        QueryField::lt("CreatedAt", "2025-01-01"),
    ]));
    let sql = composer.compose(&request).unwrap();
    assert!(sql.ends_with("WHERE ( [CreatedAt] > @CreatedAt_0 AND [CreatedAt] < @CreatedAt_1 );"));

    let names: Vec<String> = request.parameters().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["CreatedAt_0", "CreatedAt_1"]);
}

#[test]
fn entity_mapping_restricts_columns() {
    let mut catalog = catalog();
    catalog.map_entity(
        "CustomerSummary",
        EntityMapping::new(Field::from_names(["Id", "Name", "CreatedAt"]))
            .read_only([Field::new("CreatedAt")]),
    );
    let composer = composer_over(catalog, Arc::new(StatementCache::new()));

    let query = StatementRequest::query_all("Customer").entity("CustomerSummary");
    assert_eq!(
        &*composer.compose(&query).unwrap(),
        "SELECT [Id], [Name], [CreatedAt] FROM [Customer];"
    );
    let insert = StatementRequest::insert("Customer").entity("CustomerSummary");
    assert_eq!(
        &*composer.compose(&insert).unwrap(),
        "INSERT INTO [Customer] ( [Name] ) VALUES ( @Name ); \
         SELECT SCOPE_IDENTITY() AS [Result];"
    );
}

#[test]
fn errors_propagate_and_are_never_cached() {
    let composer = composer();
    let cases = [
        (
            StatementRequest::query("Supplier"),
            StmtError::UnknownTable("Supplier".to_string()),
        ),
        (
            StatementRequest::inline_insert("Customer", [Field::new("Phone")]),
            StmtError::unmatched_fields("Customer", ["Phone"]),
        ),
        (
            StatementRequest::batch_query("Customer", 0, 10),
            StmtError::MissingOrderBy("Customer".to_string()),
        ),
    ];
    for (request, expected) in &cases {
        assert_eq!(&composer.compose(request).unwrap_err(), expected);
        assert_eq!(&composer.compose(request).unwrap_err(), expected);
    }
    assert!(composer.cache().is_empty());
}

#[test]
fn cache_can_be_disabled() {
    let composer = composer().with_config(ComposerConfig::new().no_cache());
    let a = composer.compose(&StatementRequest::count_all("Customer")).unwrap();
    let b = composer.compose(&StatementRequest::count_all("Customer")).unwrap();
    assert_eq!(a, b);
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(composer.cache().is_empty());
}

#[test]
fn shared_cache_across_threads() {
    let cache = Arc::new(StatementCache::new());
    let composer = Arc::new(composer_over(catalog(), Arc::clone(&cache)));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let composer = Arc::clone(&composer);
            thread::spawn(move || {
                let request = StatementRequest::update("Customer")
                    .filter(QueryField::eq("Id", i))
                    .qualifiers([Field::new("Id")]);
                composer.compose(&request).unwrap()
            })
        })
        .collect();
    let texts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(texts.iter().all(|t| **t == *texts[0]));
    assert_eq!(
        &*texts[0],
        "UPDATE [Customer] SET [Name] = @Name, [Email] = @Email, [CreatedAt] = @CreatedAt \
         WHERE ( [Id] = @_Id );"
    );
    assert_eq!(cache.len(), 1);
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 8);
}

#[test]
fn flush_after_schema_change() {
    let cache = Arc::new(StatementCache::new());
    let request = StatementRequest::query_all("Country");

    let before = composer_over(catalog(), Arc::clone(&cache));
    assert_eq!(
        &*before.compose(&request).unwrap(),
        "SELECT [Code], [Name] FROM [Country];"
    );

    let mut changed = catalog();
    changed
        .register(
            "dbo.Country",
            vec![
                sqlcompose::DbField::new("Code").primary(),
                sqlcompose::DbField::new("Name"),
                sqlcompose::DbField::new("Region"),
            ],
        )
        .unwrap();
    let after = composer_over(changed, Arc::clone(&cache));
    after.flush();
    assert_eq!(
        &*after.compose(&request).unwrap(),
        "SELECT [Code], [Name], [Region] FROM [Country];"
    );
    assert_eq!(cache.stats().flushes, 1);
}

#[test]
fn shared_cache_keeps_builder_settings_apart() {
    let cache = Arc::new(StatementCache::new());
    let default = composer_over(catalog(), Arc::clone(&cache));
    let colon = StatementComposer::from_catalog(
        SqlServerStatementBuilder::with_setting(DbSetting::sql_server().parameter_prefix(':')),
        Arc::new(catalog()),
        Arc::clone(&cache),
    );
    let request = StatementRequest::delete("Customer");

    assert_eq!(
        &*default.compose(&request).unwrap(),
        "DELETE FROM [Customer] WHERE ( [Id] = @Id );"
    );
    assert_eq!(
        &*colon.compose(&request).unwrap(),
        "DELETE FROM [Customer] WHERE ( [Id] = :Id );"
    );
    assert_eq!(cache.len(), 2);
    assert_eq!(colon.setting().parameter_prefix, ':');
}

#[test]
fn invalid_requests_fail_before_reaching_the_cache() {
    let composer = composer();
    composer
        .compose(&StatementRequest::query("Customer").filter(QueryField::eq("Id", 1)))
        .unwrap();

    let list = StatementRequest::query("Customer")
        .filter(QueryField::eq("Id", sqlcompose::Value::list([1, 2])));
    assert!(matches!(
        composer.compose(&list).unwrap_err(),
        StmtError::InvalidOperand { .. }
    ));

    let truncate = StatementRequest::truncate("Customer").filter(QueryField::eq("Id", 1));
    assert!(matches!(
        composer.compose(&truncate).unwrap_err(),
        StmtError::UnexpectedFilter { command: "Truncate", .. }
    ));
    assert_eq!(composer.cache().len(), 1);
}
