//! Bound parameters.
//!
//! A [`Parameter`] keeps its original name and value next to mutable working
//! copies. The working name changes when the filter tree is de-duplicated
//! (`Age` -> `Age_1`) or reused as an UPDATE's WHERE clause (`Id` -> `_Id`);
//! [`Parameter::reset`] restores both name and value.
//!
//! Parameters deliberately do not implement `PartialEq`/`Hash`. Structural
//! comparison goes through [`ParameterKey`], which ignores the bound value.

use crate::value::{DbType, Value};

/// Marker prepended to WHERE-clause parameters of UPDATE/MERGE statements.
pub const UPDATE_MARKER: char = '_';

/// A named value bound to a statement.
#[derive(Debug, Clone)]
pub struct Parameter {
    original_name: String,
    name: String,
    original_value: Value,
    value: Value,
    db_type: Option<DbType>,
}

impl Parameter {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        Self {
            original_name: name.clone(),
            name,
            original_value: value.clone(),
            value,
            db_type: None,
        }
    }

    /// Attach a database type tag.
    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    /// Current (working) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name the parameter was created with.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Current (working) value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value the parameter was created with.
    pub fn original_value(&self) -> &Value {
        &self.original_value
    }

    /// Database type tag, if any.
    pub fn db_type(&self) -> Option<DbType> {
        self.db_type
    }

    /// Replace the working name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the working value.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Prefix the working name with [`UPDATE_MARKER`]. No-op when already prefixed.
    pub fn prepend_underscore(&mut self) {
        if !self.name.starts_with(UPDATE_MARKER) {
            self.name.insert(0, UPDATE_MARKER);
        }
    }

    /// Restore the working name and value from the originals.
    pub fn reset(&mut self) {
        self.name.clone_from(&self.original_name);
        self.value.clone_from(&self.original_value);
    }

    /// Structural projection used in cache keys.
    pub fn key(&self) -> ParameterKey {
        ParameterKey {
            name: self.original_name.clone(),
            db_type: self.db_type,
        }
    }
}

/// Structural identity of a [`Parameter`]: original name and type tag, never the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterKey {
    pub name: String,
    pub db_type: Option<DbType>,
}
