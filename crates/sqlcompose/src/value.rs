//! Runtime values bound to parameters and the database type tags they may carry.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database type tag attached to a parameter or a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    AnsiString,
    Binary,
    Boolean,
    Byte,
    Currency,
    Date,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    Json,
    Single,
    String,
    Time,
    Xml,
}

/// A value bound to a statement parameter.
///
/// Values never take part in statement composition: the text only references
/// parameter names, except for list operands whose *length* decides how many
/// placeholders are rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decimal kept in its textual form to avoid lossy conversion.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    DateTime(NaiveDateTime),
    Json(serde_json::Value),
    /// Operand list for IN / NOT IN / BETWEEN.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Elements of a list operand.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Number of elements of a list operand.
    pub fn list_len(&self) -> Option<usize> {
        self.as_list().map(<[Value]>::len)
    }

    /// Build a list operand.
    pub fn list<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }

    /// Best-effort type tag for this value.
    pub fn db_type(&self) -> Option<DbType> {
        match self {
            Value::Null | Value::List(_) => None,
            Value::Bool(_) => Some(DbType::Boolean),
            Value::Int(_) => Some(DbType::Int64),
            Value::Float(_) => Some(DbType::Double),
            Value::Decimal(_) => Some(DbType::Decimal),
            Value::Text(_) => Some(DbType::String),
            Value::Bytes(_) => Some(DbType::Binary),
            Value::Uuid(_) => Some(DbType::Guid),
            Value::DateTime(_) => Some(DbType::DateTime),
            Value::Json(_) => Some(DbType::Json),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
