//! # sqlcompose
//!
//! Dialect-aware SQL statement composition with a structural statement cache.
//!
//! ## Features
//!
//! - **Structured requests**: describe a command (query, insert, merge, ...) as a [`StatementRequest`]
//! - **Filter trees**: compose `WHERE` clauses from [`QueryField`] leaves and [`QueryGroup`] nodes
//! - **Dialects**: SQL Server, PostgreSQL, MySQL and SQLite builders behind one [`StatementBuilder`] trait
//! - **Structural cache**: requests that differ only in bound values share one cached text
//! - **Schema snapshots**: an in-memory [`Catalog`] that round-trips through JSON
//!
//! Nothing here talks to a database. Statement text goes in and out; binding
//! and execution belong to the caller.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use sqlcompose::{
//!     Catalog, DbField, DbSetting, Order, OrderField, PostgresStatementBuilder, QueryField,
//!     QueryGroup, StatementCache, StatementComposer, StatementRequest,
//! };
//!
//! let mut catalog = Catalog::new(DbSetting::postgres());
//! catalog.register(
//!     "users",
//!     vec![
//!         DbField::new("id").primary().identity(),
//!         DbField::new("name"),
//!         DbField::new("age"),
//!     ],
//! )?;
//!
//! let composer = StatementComposer::from_catalog(
//!     PostgresStatementBuilder::new(),
//!     Arc::new(catalog),
//!     Arc::new(StatementCache::new()),
//! );
//!
//! let request = StatementRequest::query("users")
//!     .filter(QueryGroup::or(vec![
//!         QueryField::eq("name", "alice"),
//!         QueryField::gt("age", 30),
//!     ]))
//!     .order_by(OrderField::new("id", Order::Ascending))
//!     .top(10);
//! let sql = composer.compose(&request)?;
//! assert_eq!(
//!     &*sql,
//!     "SELECT \"id\", \"name\", \"age\" FROM \"users\" WHERE ( \"name\" = @name OR \"age\" > @age ) ORDER BY \"id\" ASC LIMIT 10;"
//! );
//!
//! // Same structure, different values: served from the cache.
//! let again = StatementRequest::query("users")
//!     .filter(QueryGroup::or(vec![
//!         QueryField::eq("name", "bob"),
//!         QueryField::gt("age", 40),
//!     ]))
//!     .order_by(OrderField::new("id", Order::Ascending))
//!     .top(10);
//! assert!(Arc::ptr_eq(&sql, &composer.compose(&again)?));
//! # Ok::<(), sqlcompose::StmtError>(())
//! ```

pub mod builder;
pub mod cache;
pub mod composer;
pub mod db_field;
pub mod error;
pub mod field;
pub mod ident;
pub mod parameter;
pub mod provider;
pub mod query;
pub mod request;
pub mod setting;
pub mod statement;
pub mod value;

pub use builder::QueryBuilder;
pub use cache::{CacheStats, StatementCache, StatementKey};
pub use composer::{ComposerConfig, StatementComposer, builder_for};
pub use db_field::{DbField, DbFieldList};
pub use error::{StmtError, StmtResult};
pub use field::{Field, Order, OrderField};
pub use ident::{Ident, IdentPart, IntoIdent, quote_name};
pub use parameter::{Parameter, ParameterKey, UPDATE_MARKER};
pub use provider::{
    Catalog, CatalogSnapshot, DbFieldProvider, EntityMapping, FieldMapping, TableEntry,
};
pub use query::{
    BoundParameter, Conjunction, Operation, QueryField, QueryFieldKey, QueryGroup,
    QueryGroupBuilder, QueryGroupKey,
};
pub use request::{AggregateFunction, CommandKind, RequestKey, StatementRequest};
pub use setting::{DbSetting, Dialect, PagingStyle};
pub use statement::{
    CommandContext, MergePlan, MySqlStatementBuilder, PostgresStatementBuilder,
    SqlServerStatementBuilder, SqliteStatementBuilder, StatementBuilder,
};
pub use value::{DbType, Value};
