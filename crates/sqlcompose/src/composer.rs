//! Cache-backed composition entry point.
//!
//! [`StatementComposer`] ties the pieces together: it keys a request, looks up
//! the shared [`StatementCache`], and on a miss resolves the table's metadata
//! and delegates to the active [`StatementBuilder`]. Only successful
//! compositions are stored; a failing request fails again on every call.
//!
//! A cache may be shared by several composers. Entries are keyed by builder
//! name and the builder's settings, so composers with differently configured
//! builders never serve each other's text. They must still agree on the
//! metadata they read; flush the cache when it changes.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use sqlcompose::{
//!     Catalog, DbField, DbSetting, QueryField, SqlServerStatementBuilder, StatementCache,
//!     StatementComposer, StatementRequest,
//! };
//!
//! let mut catalog = Catalog::new(DbSetting::sql_server());
//! catalog.register(
//!     "Person",
//!     vec![DbField::new("Id").primary().identity(), DbField::new("Name")],
//! )?;
//! let composer = StatementComposer::from_catalog(
//!     SqlServerStatementBuilder::new(),
//!     Arc::new(catalog),
//!     Arc::new(StatementCache::new()),
//! );
//!
//! let sql = composer.compose(&StatementRequest::update("Person").filter(QueryField::eq("Id", 1)))?;
//! assert_eq!(&*sql, "UPDATE [Person] SET [Name] = @Name WHERE ( [Id] = @_Id );");
//! # Ok::<(), sqlcompose::StmtError>(())
//! ```

use crate::cache::{StatementCache, StatementKey};
use crate::error::{StmtError, StmtResult};
use crate::provider::{Catalog, DbFieldProvider, FieldMapping};
use crate::request::StatementRequest;
use crate::setting::{DbSetting, Dialect};
use crate::statement::{
    CommandContext, MySqlStatementBuilder, PostgresStatementBuilder, SqlServerStatementBuilder,
    SqliteStatementBuilder, StatementBuilder,
};
use std::borrow::Cow;
use std::sync::Arc;

/// Composer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Consult and fill the statement cache.
    pub use_cache: bool,
    /// Truncate composed SQL in trace events (in chars). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            max_sql_log_length: Some(200),
        }
    }
}

impl ComposerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the statement cache.
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Compose every request from scratch.
    pub fn no_cache(self) -> Self {
        self.use_cache(false)
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }
}

/// Statement builder for a dialect preset.
pub fn builder_for(dialect: Dialect) -> Arc<dyn StatementBuilder> {
    match dialect {
        Dialect::SqlServer => Arc::new(SqlServerStatementBuilder::new()),
        Dialect::Postgres => Arc::new(PostgresStatementBuilder::new()),
        Dialect::MySql => Arc::new(MySqlStatementBuilder::new()),
        Dialect::Sqlite => Arc::new(SqliteStatementBuilder::new()),
    }
}

/// Composes requests through a shared statement cache.
#[derive(Clone)]
pub struct StatementComposer {
    builder: Arc<dyn StatementBuilder>,
    /// Settings of `builder`, shared by every cache key this composer makes.
    setting: Arc<DbSetting>,
    provider: Arc<dyn DbFieldProvider>,
    mapping: Option<Arc<dyn FieldMapping>>,
    cache: Arc<StatementCache>,
    config: ComposerConfig,
}

impl std::fmt::Debug for StatementComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementComposer")
            .field("builder", &self.builder.name())
            .field("has_mapping", &self.mapping.is_some())
            .field("cache_entries", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

impl StatementComposer {
    /// Create a composer reading column metadata from `provider`.
    pub fn new(
        builder: impl StatementBuilder + 'static,
        provider: Arc<dyn DbFieldProvider>,
        cache: Arc<StatementCache>,
    ) -> Self {
        Self::with_builder_arc(Arc::new(builder), provider, cache)
    }

    /// Create a composer around a shared builder.
    pub fn with_builder_arc(
        builder: Arc<dyn StatementBuilder>,
        provider: Arc<dyn DbFieldProvider>,
        cache: Arc<StatementCache>,
    ) -> Self {
        let setting = Arc::new(builder.setting().clone());
        Self {
            builder,
            setting,
            provider,
            mapping: None,
            cache,
            config: ComposerConfig::default(),
        }
    }

    /// Create a composer whose metadata and mappings come from `catalog`.
    pub fn from_catalog(
        builder: impl StatementBuilder + 'static,
        catalog: Arc<Catalog>,
        cache: Arc<StatementCache>,
    ) -> Self {
        let mapping: Arc<dyn FieldMapping> = catalog.clone();
        Self::new(builder, catalog, cache).with_mapping(mapping)
    }

    /// Create a composer for a dialect preset.
    pub fn for_dialect(
        dialect: Dialect,
        provider: Arc<dyn DbFieldProvider>,
        cache: Arc<StatementCache>,
    ) -> Self {
        Self::with_builder_arc(builder_for(dialect), provider, cache)
    }

    /// Restrict commands to the columns an entity maps.
    pub fn with_mapping(mut self, mapping: Arc<dyn FieldMapping>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn builder(&self) -> &dyn StatementBuilder {
        self.builder.as_ref()
    }

    pub fn setting(&self) -> &DbSetting {
        &self.setting
    }

    pub fn cache(&self) -> &Arc<StatementCache> {
        &self.cache
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Statement text for `request`, from the cache when its structure was
    /// composed before.
    pub fn compose(&self, request: &StatementRequest) -> StmtResult<Arc<str>> {
        let builder = self.builder.name();
        if !self.config.use_cache {
            return self.compose_uncached(request).map(Arc::from);
        }

        let key = StatementKey::new(builder, Arc::clone(&self.setting), request);
        if let Some(text) = self.cache.get(&key) {
            tracing::debug!(
                target: "sqlcompose.cache",
                builder,
                command = %request.kind(),
                table = request.table(),
                "statement cache hit"
            );
            return Ok(text);
        }
        tracing::debug!(
            target: "sqlcompose.cache",
            builder,
            command = %request.kind(),
            table = request.table(),
            "statement cache miss"
        );

        let text = self.compose_uncached(request)?;
        Ok(self.cache.insert(key, text))
    }

    /// Compose `request` without touching the cache.
    pub fn compose_uncached(&self, request: &StatementRequest) -> StmtResult<String> {
        let builder = self.builder.name();
        let result = self.resolve_and_compose(request);
        match &result {
            Ok(sql) => tracing::trace!(
                target: "sqlcompose.compose",
                builder,
                command = %request.kind(),
                table = request.table(),
                sql = %self.truncate_sql(sql),
                "statement composed"
            ),
            Err(err) => tracing::debug!(
                target: "sqlcompose.compose",
                builder,
                command = %request.kind(),
                table = request.table(),
                error = %err,
                "statement composition failed"
            ),
        }
        result
    }

    fn resolve_and_compose(&self, request: &StatementRequest) -> StmtResult<String> {
        if request.table().trim().is_empty() {
            return Err(StmtError::missing_argument("table"));
        }
        let db_fields = self.provider.db_fields(request.table())?;
        let mapped = self
            .mapping
            .as_ref()
            .and_then(|m| m.fields(request.entity_name(), request.kind()));
        let ctx = CommandContext::new(request, &db_fields).with_mapped_fields(mapped.as_deref());
        self.builder.compose(&ctx)
    }

    /// Drop every cached statement (e.g. after a schema change).
    pub fn flush(&self) {
        self.cache.flush();
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.config.max_sql_log_length {
            Some(max) => match sql.char_indices().nth(max) {
                Some((cut, _)) => Cow::Owned(format!("{}...", &sql[..cut])),
                None => Cow::Borrowed(sql),
            },
            None => Cow::Borrowed(sql),
        }
    }
}
