//! Error types for sqlcompose

use thiserror::Error;

/// Result type alias for statement composition.
pub type StmtResult<T> = Result<T, StmtError>;

/// Errors raised while composing a statement.
///
/// Every variant is a deterministic function of the inputs: retrying the same
/// request reproduces the same error, and a failed composition is never cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StmtError {
    /// A required argument (table name, field list, ...) was not supplied.
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// No composable fields exist for the command on the target table.
    #[error("No composable fields for {command} on table '{table}'")]
    MissingFields { table: String, command: String },

    /// Caller-supplied fields are not among the table's columns.
    #[error("Fields [{}] are not present in table '{table}'", .fields.join(", "))]
    UnmatchedFields { table: String, fields: Vec<String> },

    /// The identity column is defined but is not the primary column.
    #[error(
        "Identity column '{identity}' of table '{table}' must be the primary column (found {})",
        .primary.as_deref().unwrap_or("none")
    )]
    IdentityMismatch {
        table: String,
        identity: String,
        primary: Option<String>,
    },

    /// A merge/update has no qualifiers and no primary column to default to.
    #[error("No qualifiers supplied and table '{0}' has no primary column")]
    MissingQualifiers(String),

    /// The command requires a primary column that the table does not define.
    #[error("Table '{0}' has no primary column")]
    MissingPrimaryKey(String),

    /// An inline update tried to assign the identity column.
    #[error("Identity column '{field}' of table '{table}' cannot be updated")]
    IdentityNotUpdatable { table: String, field: String },

    /// Paging was requested without an ordering.
    #[error("Ordering is required to page through table '{0}'")]
    MissingOrderBy(String),

    /// The bound value does not fit the operation (e.g. BETWEEN with one value).
    #[error("Invalid operand for {operation} on '{field}': {message}")]
    InvalidOperand {
        field: String,
        operation: &'static str,
        message: String,
    },

    /// Two parameters of one statement would bind under the same name.
    #[error("Parameter '{parameter}' is bound twice in a statement on table '{table}'")]
    ParameterCollision { table: String, parameter: String },

    /// A filter was attached to a command that never renders one.
    #[error("{command} on table '{table}' does not take a filter")]
    UnexpectedFilter { table: String, command: &'static str },

    /// A page number or size is too large to address.
    #[error("Page {page} of {rows} rows is out of range")]
    PageOutOfRange { page: usize, rows: usize },

    /// A table or column name could not be parsed as an identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The active dialect cannot express the requested feature.
    #[error("{feature} is not supported by {dialect}")]
    UnsupportedFeature {
        feature: &'static str,
        dialect: &'static str,
    },

    /// The metadata provider knows nothing about the table.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A catalog snapshot could not be decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl StmtError {
    /// Create a missing-argument error.
    pub fn missing_argument(name: &'static str) -> Self {
        Self::MissingArgument(name)
    }

    /// Create a missing-fields error for a command on a table.
    pub fn missing_fields(table: impl Into<String>, command: impl Into<String>) -> Self {
        Self::MissingFields {
            table: table.into(),
            command: command.into(),
        }
    }

    /// Create an unmatched-fields error.
    pub fn unmatched_fields<I, S>(table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnmatchedFields {
            table: table.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an invalid-operand error.
    pub fn invalid_operand(
        field: impl Into<String>,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOperand {
            field: field.into(),
            operation,
            message: message.into(),
        }
    }

    /// Create a parameter-collision error.
    pub fn parameter_collision(table: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::ParameterCollision {
            table: table.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(feature: &'static str, dialect: &'static str) -> Self {
        Self::UnsupportedFeature { feature, dialect }
    }

    /// Check if this error comes from a schema/argument validation rule.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::UnknownTable(_) | Self::Snapshot(_) | Self::UnsupportedFeature { .. }
        )
    }

    /// Check if this is an identity/primary mismatch.
    pub fn is_identity_mismatch(&self) -> bool {
        matches!(self, Self::IdentityMismatch { .. })
    }
}

impl From<serde_json::Error> for StmtError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_fields_lists_names() {
        let err = StmtError::unmatched_fields("Person", ["Nickname", "Shoe"]);
        assert_eq!(
            err.to_string(),
            "Fields [Nickname, Shoe] are not present in table 'Person'"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn identity_mismatch_names_both_columns() {
        let err = StmtError::IdentityMismatch {
            table: "Person".into(),
            identity: "RowId".into(),
            primary: Some("Id".into()),
        };
        assert!(err.is_identity_mismatch());
        assert!(err.to_string().contains("'RowId'"));
        assert!(err.to_string().contains("(found Id)"));
    }

    #[test]
    fn request_shape_errors_are_validation_errors() {
        let collision = StmtError::parameter_collision("Person", "Name_1");
        assert_eq!(
            collision.to_string(),
            "Parameter 'Name_1' is bound twice in a statement on table 'Person'"
        );
        let filter = StmtError::UnexpectedFilter {
            table: "Person".into(),
            command: "Truncate",
        };
        assert_eq!(filter.to_string(), "Truncate on table 'Person' does not take a filter");
        let page = StmtError::PageOutOfRange { page: 7, rows: 0 };
        assert!([collision, filter, page].iter().all(StmtError::is_validation));
    }
}
