//! Field resolution and schema validation shared by every dialect.

use super::CommandContext;
use crate::db_field::DbFieldList;
use crate::error::{StmtError, StmtResult};
use crate::field::{Field, OrderField, indexed, parameter_name};
use crate::request::StatementRequest;
use crate::setting::DbSetting;
use std::collections::HashSet;

/// Table name of the request; an empty name is a missing argument.
pub(crate) fn require_table(request: &StatementRequest) -> StmtResult<&str> {
    let table = request.table().trim();
    if table.is_empty() {
        return Err(StmtError::missing_argument("table"));
    }
    Ok(table)
}

/// The identity column, if present, must be the primary column.
pub(crate) fn validate_identity(table: &str, db_fields: &DbFieldList) -> StmtResult<()> {
    let Some(identity) = db_fields.identity() else {
        return Ok(());
    };
    match db_fields.primary() {
        Some(primary) if primary.matches(&identity.name) => Ok(()),
        primary => Err(StmtError::IdentityMismatch {
            table: table.to_string(),
            identity: identity.name.clone(),
            primary: primary.map(|p| p.name.clone()),
        }),
    }
}

/// Map caller-supplied fields onto the table's columns (taking the column's
/// spelling), failing with every name the table does not define.
pub(crate) fn match_columns(
    table: &str,
    fields: &[Field],
    db_fields: &DbFieldList,
) -> StmtResult<Vec<Field>> {
    let mut matched = Vec::with_capacity(fields.len());
    let mut unmatched = Vec::new();
    for field in fields {
        match db_fields.find(field.name()) {
            Some(column) => matched.push(column.as_field()),
            None => unmatched.push(field.name().to_string()),
        }
    }
    if unmatched.is_empty() {
        Ok(matched)
    } else {
        Err(StmtError::unmatched_fields(table, unmatched))
    }
}

/// Columns the entity maps for this command, in table order. Without a
/// mapping every column applies.
pub(crate) fn available_fields(ctx: &CommandContext<'_>) -> Vec<Field> {
    match ctx.mapped_fields {
        Some(mapped) => ctx
            .db_fields
            .iter()
            .filter(|column| mapped.iter().any(|f| column.matches(f.name())))
            .map(|column| column.as_field())
            .collect(),
        None => ctx.db_fields.as_fields(),
    }
}

/// The explicit field list of the request (validated) or the available fields.
pub(crate) fn command_fields(ctx: &CommandContext<'_>, table: &str) -> StmtResult<Vec<Field>> {
    let fields = match ctx.request.field_list() {
        Some(explicit) => match_columns(table, explicit, ctx.db_fields)?,
        None => available_fields(ctx),
    };
    non_empty(fields, ctx, table)
}

/// Fail with `MissingFields` when nothing is left to compose.
pub(crate) fn non_empty(
    fields: Vec<Field>,
    ctx: &CommandContext<'_>,
    table: &str,
) -> StmtResult<Vec<Field>> {
    if fields.is_empty() {
        Err(StmtError::missing_fields(table, ctx.request.kind().as_str()))
    } else {
        Ok(fields)
    }
}

/// Explicit qualifiers (validated), defaulting to the primary column.
pub(crate) fn qualifier_fields(ctx: &CommandContext<'_>, table: &str) -> StmtResult<Vec<Field>> {
    match ctx.request.qualifier_list() {
        Some(qualifiers) if !qualifiers.is_empty() => {
            match_columns(table, qualifiers, ctx.db_fields)
        }
        _ => ctx
            .db_fields
            .primary()
            .map(|primary| vec![primary.as_field()])
            .ok_or_else(|| StmtError::MissingQualifiers(table.to_string())),
    }
}

/// Ordering of the request, every field checked against the table.
pub(crate) fn order_fields(ctx: &CommandContext<'_>, table: &str) -> StmtResult<Vec<OrderField>> {
    let orders = ctx.request.order_list();
    let fields: Vec<Field> = orders.iter().map(|o| o.field.clone()).collect();
    let matched = match_columns(table, &fields, ctx.db_fields)?;
    Ok(matched
        .into_iter()
        .zip(orders)
        .map(|(field, o)| OrderField {
            field,
            order: o.order,
        })
        .collect())
}

/// Table hints of the request, rejected when the dialect has none.
pub(crate) fn table_hints<'r>(
    request: &'r StatementRequest,
    setting: &DbSetting,
) -> StmtResult<Option<&'r str>> {
    match request.hint_text() {
        Some(_) if !setting.supports_table_hints => Err(StmtError::unsupported(
            "table hints",
            setting.dialect.as_str(),
        )),
        hints => Ok(hints),
    }
}

/// Row count of a multi-row command.
pub(crate) fn batch_size(request: &StatementRequest, setting: &DbSetting) -> StmtResult<usize> {
    match request.batch() {
        0 => Err(StmtError::missing_argument("batch_size")),
        1 => Ok(1),
        n if setting.supports_multiple_statements => Ok(n),
        _ => Err(StmtError::unsupported(
            "multiple statements",
            setting.dialect.as_str(),
        )),
    }
}

/// Every parameter bound across `rows` batch rows of `fields` must be unique.
/// Row `i > 0` appends `_{i}`, so a column `Name_1` clashes with row 1 of
/// `Name`; sanitized names such as `First Name` and `First_Name` clash too.
pub(crate) fn unique_row_parameters(table: &str, fields: &[Field], rows: usize) -> StmtResult<()> {
    let mut seen = HashSet::new();
    for index in 0..rows {
        for field in fields {
            let name = indexed(&parameter_name(field.name()), index);
            if !seen.insert(name.to_lowercase()) {
                return Err(StmtError::parameter_collision(table, name));
            }
        }
    }
    Ok(())
}

/// `true` when `field` names the identity column.
pub(crate) fn is_identity(field: &Field, db_fields: &DbFieldList) -> bool {
    db_fields.identity().is_some_and(|c| c.matches(field.name()))
}

/// `true` when `field` names the primary column.
pub(crate) fn is_primary(field: &Field, db_fields: &DbFieldList) -> bool {
    db_fields.primary().is_some_and(|c| c.matches(field.name()))
}

/// `true` when `field` is one of `fields`.
pub(crate) fn contains(fields: &[Field], field: &Field) -> bool {
    fields.iter().any(|f| f.matches(field.name()))
}

/// Columns an upsert inserts, matches on and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// Every column of the source row.
    pub fields: Vec<Field>,
    /// Columns matching existing rows.
    pub qualifiers: Vec<Field>,
    /// Source columns without the identity column.
    pub insert_fields: Vec<Field>,
    /// Source columns without qualifiers, identity and primary column.
    pub update_fields: Vec<Field>,
}

impl MergePlan {
    pub(crate) fn new(ctx: &CommandContext<'_>, table: &str) -> StmtResult<Self> {
        validate_identity(table, ctx.db_fields)?;
        let fields = command_fields(ctx, table)?;
        let qualifiers = qualifier_fields(ctx, table)?;

        let missing: Vec<String> = qualifiers
            .iter()
            .filter(|q| !contains(&fields, q))
            .map(|q| q.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(StmtError::unmatched_fields(table, missing));
        }

        let insert_fields: Vec<Field> = fields
            .iter()
            .filter(|f| !is_identity(f, ctx.db_fields))
            .cloned()
            .collect();
        let update_fields: Vec<Field> = fields
            .iter()
            .filter(|f| {
                !contains(&qualifiers, f)
                    && !is_identity(f, ctx.db_fields)
                    && !is_primary(f, ctx.db_fields)
            })
            .cloned()
            .collect();
        let insert_fields = non_empty(insert_fields, ctx, table)?;

        Ok(Self {
            fields,
            qualifiers,
            insert_fields,
            update_fields,
        })
    }

    /// Insert list of `INSERT .. ON CONFLICT` style upserts: the conflict
    /// target must be supplied, so qualifiers stay even when they are the
    /// identity column.
    pub fn upsert_insert_fields(&self, db_fields: &DbFieldList) -> Vec<Field> {
        self.fields
            .iter()
            .filter(|f| !is_identity(f, db_fields) || contains(&self.qualifiers, f))
            .cloned()
            .collect()
    }
}
