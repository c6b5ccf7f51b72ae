//! Leaf conditions of the filter tree.

use super::Operation;
use crate::error::{StmtError, StmtResult};
use crate::field::{Field, indexed, parameter_name};
use crate::parameter::{Parameter, ParameterKey};
use crate::setting::DbSetting;
use crate::value::{DbType, Value};

/// A name/value pair an executor binds to the composed text.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: Value,
    pub db_type: Option<DbType>,
}

/// `field <operation> parameter`
#[derive(Debug, Clone)]
pub struct QueryField {
    field: Field,
    operation: Operation,
    parameter: Parameter,
}

impl QueryField {
    /// Create a condition, checking that the value fits the operation.
    ///
    /// - `Between`/`NotBetween` need a two-element [`Value::List`]
    /// - `In`/`NotIn` need a [`Value::List`] (possibly empty)
    /// - every other operation needs a scalar
    pub fn new(
        field: impl Into<Field>,
        operation: Operation,
        value: impl Into<Value>,
    ) -> StmtResult<Self> {
        let field = field.into();
        let value = value.into();
        check_operand(&field, operation, &value)?;
        Ok(Self::unchecked(field, operation, value))
    }

    /// Check that the bound value fits the operation, with the rules of [`new`](Self::new).
    ///
    /// The shorthand constructors (`eq`, `gt`, ...) do not check; composition
    /// validates every condition of a filter before rendering it.
    pub fn validate(&self) -> StmtResult<()> {
        check_operand(&self.field, self.operation, self.parameter.value())
    }

    fn unchecked(field: Field, operation: Operation, value: Value) -> Self {
        let parameter = Parameter::new(parameter_name(field.name()), value);
        Self {
            field,
            operation,
            parameter,
        }
    }

    // ==================== Convenience constructors ====================

    /// column = value (`IS NULL` when the value is null)
    pub fn eq(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::Equal, value)
    }

    /// column <> value (`IS NOT NULL` when the value is null)
    pub fn ne(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::NotEqual, value)
    }

    /// column > value
    pub fn gt(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::GreaterThan, value)
    }

    /// column >= value
    pub fn gte(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::GreaterThanOrEqual, value)
    }

    /// column < value
    pub fn lt(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::LessThan, value)
    }

    /// column <= value
    pub fn lte(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::LessThanOrEqual, value)
    }

    /// column LIKE pattern
    pub fn like(field: impl Into<Field>, pattern: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::Like, pattern)
    }

    /// column NOT LIKE pattern
    pub fn not_like(field: impl Into<Field>, pattern: impl Into<Value>) -> Self {
        Self::scalar(field, Operation::NotLike, pattern)
    }

    /// column IS NULL
    pub fn is_null(field: impl Into<Field>) -> Self {
        Self::eq(field, Value::Null)
    }

    /// column IS NOT NULL
    pub fn is_not_null(field: impl Into<Field>) -> Self {
        Self::ne(field, Value::Null)
    }

    /// column BETWEEN from AND to
    pub fn between(field: impl Into<Field>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self::unchecked(
            field.into(),
            Operation::Between,
            Value::List(vec![from.into(), to.into()]),
        )
    }

    /// column NOT BETWEEN from AND to
    pub fn not_between(
        field: impl Into<Field>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Self::unchecked(
            field.into(),
            Operation::NotBetween,
            Value::List(vec![from.into(), to.into()]),
        )
    }

    /// column IN (values...)
    pub fn in_list<T: Into<Value>>(
        field: impl Into<Field>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::unchecked(field.into(), Operation::In, Value::list(values))
    }

    /// column NOT IN (values...)
    pub fn not_in<T: Into<Value>>(
        field: impl Into<Field>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::unchecked(field.into(), Operation::NotIn, Value::list(values))
    }

    /// A list value is kept as given; [`validate`](Self::validate) rejects it
    /// before the condition is rendered.
    fn scalar(field: impl Into<Field>, operation: Operation, value: impl Into<Value>) -> Self {
        Self::unchecked(field.into(), operation, value.into())
    }

    /// Attach a database type tag to the parameter.
    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        self.parameter = self.parameter.with_db_type(db_type);
        self
    }

    // ==================== Accessors ====================

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub(crate) fn parameter_mut(&mut self) -> &mut Parameter {
        &mut self.parameter
    }

    /// `true` when this renders as `IS NULL` / `IS NOT NULL`.
    pub fn is_null_check(&self) -> bool {
        self.operation.is_equality() && self.parameter.value().is_null()
    }

    /// Restore the parameter's original name and value.
    pub fn reset(&mut self) {
        self.parameter.reset();
    }

    /// Prefix the parameter name with the update marker (idempotent).
    pub fn is_for_update(&mut self) {
        self.parameter.prepend_underscore();
    }

    // ==================== Rendering ====================

    /// Render this condition. `index > 0` suffixes every parameter with `_{index}`.
    pub fn get_string(&self, index: usize, setting: &DbSetting) -> String {
        let column = self.field.as_field(setting);
        let op = self.operation;

        if self.is_null_check() {
            return match op {
                Operation::Equal => format!("{column} IS NULL"),
                _ => format!("{column} IS NOT NULL"),
            };
        }

        let names = self.parameter_names(index);
        if op.is_list() {
            if names.is_empty() {
                // Empty IN list: never true. Empty NOT IN list: always true.
                return if op == Operation::In {
                    "1 = 0".to_string()
                } else {
                    "1 = 1".to_string()
                };
            }
            let placeholders: Vec<String> =
                names.iter().map(|n| setting.parameter(n)).collect();
            return format!("{column} {} ({})", op.as_str(), placeholders.join(", "));
        }

        if op.is_range() {
            if let [from, to] = names.as_slice() {
                return format!(
                    "{column} {} {} AND {}",
                    op.as_str(),
                    setting.parameter(from),
                    setting.parameter(to)
                );
            }
        }

        match names.first() {
            Some(name) => format!("{column} {} {}", op.as_str(), setting.parameter(name)),
            None => format!("{column} {}", op.as_str()),
        }
    }

    /// Parameter names referenced by [`get_string`](Self::get_string), in order.
    fn parameter_names(&self, index: usize) -> Vec<String> {
        self.parameter_names_for(self.parameter.name(), index)
    }

    /// Names this condition would reference if its parameter were named `base`.
    pub(crate) fn parameter_names_for(&self, base: &str, index: usize) -> Vec<String> {
        if self.is_null_check() {
            return Vec::new();
        }
        if self.operation.is_list() {
            let count = self.parameter.value().list_len().unwrap_or(0);
            return (0..count)
                .map(|i| indexed(&format!("{base}_In_{i}"), index))
                .collect();
        }
        if self.operation.is_range() {
            return (0..2)
                .map(|i| indexed(&format!("{base}_Between_{i}"), index))
                .collect();
        }
        vec![indexed(base, index)]
    }

    /// Bindings for the parameters referenced by the rendered text.
    pub fn parameters(&self, index: usize) -> Vec<BoundParameter> {
        let names = self.parameter_names(index);
        let db_type = self.parameter.db_type();
        let value = self.parameter.value();
        match value.as_list() {
            Some(items) if self.operation.is_list() || self.operation.is_range() => names
                .into_iter()
                .zip(items.iter().cloned())
                .map(|(name, value)| BoundParameter {
                    name,
                    value,
                    db_type,
                })
                .collect(),
            _ => names
                .into_iter()
                .map(|name| BoundParameter {
                    name,
                    value: value.clone(),
                    db_type,
                })
                .collect(),
        }
    }

    /// Structural projection used in cache keys.
    ///
    /// Besides field, operation and parameter, the key records whether an
    /// equality renders as a null check and how many elements a list value
    /// holds, since both change the rendered text or its validity.
    pub fn key(&self) -> QueryFieldKey {
        QueryFieldKey {
            field: self.field.clone(),
            operation: self.operation,
            parameter: self.parameter.key(),
            is_null: self.is_null_check(),
            list_len: self.parameter.value().list_len(),
        }
    }
}

fn check_operand(field: &Field, operation: Operation, value: &Value) -> StmtResult<()> {
    match (value, operation) {
        (Value::List(items), op) if op.is_range() && items.len() != 2 => Err(
            StmtError::invalid_operand(
                field.name(),
                op.as_str(),
                format!("expected 2 values, got {}", items.len()),
            ),
        ),
        (Value::List(_), op) if op.is_range() || op.is_list() => Ok(()),
        (_, op) if op.is_range() || op.is_list() => Err(StmtError::invalid_operand(
            field.name(),
            op.as_str(),
            "expected a list of values",
        )),
        (Value::List(_), op) => Err(StmtError::invalid_operand(
            field.name(),
            op.as_str(),
            "expected a single value",
        )),
        _ => Ok(()),
    }
}

/// Structural identity of a [`QueryField`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryFieldKey {
    pub field: Field,
    pub operation: Operation,
    pub parameter: ParameterKey,
    pub is_null: bool,
    pub list_len: Option<usize>,
}
