//! AND/OR/NOT groups of conditions.

use super::field::{BoundParameter, QueryField, QueryFieldKey};
use super::{Conjunction, Operation};
use crate::error::StmtResult;
use crate::setting::DbSetting;
use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// A boolean group of conditions and child groups.
#[derive(Debug, Clone, Default)]
pub struct QueryGroup {
    conjunction: Conjunction,
    fields: Vec<QueryField>,
    groups: Vec<QueryGroup>,
    is_not: bool,
    is_fixed: bool,
}

impl QueryGroup {
    /// AND-group of conditions.
    pub fn new(fields: Vec<QueryField>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// AND-group of conditions.
    pub fn and(fields: Vec<QueryField>) -> Self {
        Self::new(fields)
    }

    /// OR-group of conditions.
    pub fn or(fields: Vec<QueryField>) -> Self {
        Self {
            conjunction: Conjunction::Or,
            fields,
            ..Self::default()
        }
    }

    /// Group holding a single condition.
    pub fn from_field(field: QueryField) -> Self {
        Self::new(vec![field])
    }

    /// Group of child groups.
    pub fn from_groups(groups: Vec<QueryGroup>, conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            groups,
            ..Self::default()
        }
    }

    /// AND-group of equalities from `(column, value)` pairs.
    ///
    /// A list value is not an equality operand: the group is built, but
    /// composing a statement with it fails with `InvalidOperand`.
    ///
    /// ```
    /// use sqlcompose::{DbSetting, QueryGroup};
    ///
    /// let group = QueryGroup::from_pairs([("Name", "Ann"), ("City", "Oslo")]);
    /// assert_eq!(
    ///     group.get_string(0, &DbSetting::sql_server()),
    ///     "( [Name] = @Name AND [City] = @City )"
    /// );
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| QueryField::eq(k.as_ref(), v))
                .collect(),
        )
    }

    /// Start a staged construction.
    pub fn builder() -> QueryGroupBuilder {
        QueryGroupBuilder::default()
    }

    // ==================== Accessors ====================

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn fields(&self) -> &[QueryField] {
        &self.fields
    }

    pub fn groups(&self) -> &[QueryGroup] {
        &self.groups
    }

    pub fn is_not(&self) -> bool {
        self.is_not
    }

    /// `true` when the tree holds no condition at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.groups.iter().all(QueryGroup::is_empty)
    }

    /// Leaf conditions of this group; with `traverse`, of the whole subtree
    /// (own fields first, then each child depth-first).
    pub fn get_fields(&self, traverse: bool) -> Vec<&QueryField> {
        let mut out = Vec::new();
        self.collect_fields(traverse, &mut out);
        out
    }

    fn collect_fields<'a>(&'a self, traverse: bool, out: &mut Vec<&'a QueryField>) {
        out.extend(self.fields.iter());
        if traverse {
            for group in &self.groups {
                group.collect_fields(true, out);
            }
        }
    }

    fn for_each_field_mut(&mut self, f: &mut impl FnMut(&mut QueryField)) {
        for field in &mut self.fields {
            f(field);
        }
        for group in &mut self.groups {
            group.for_each_field_mut(f);
        }
    }

    // ==================== Mutation ====================

    /// Rename colliding parameters so every name the tree renders is unique.
    ///
    /// A condition collides when its parameter name equals another's
    /// (case-insensitively) or when any name it renders (`Id_In_0`,
    /// `Age_Between_1`, ...) is rendered by another condition too. Colliding
    /// conditions get a `_{n}` suffix, `n` counting per original name in
    /// traversal order; a suffix whose names are already taken is skipped.
    /// Runs once; later calls are no-ops until [`reset`](Self::reset).
    pub fn fix(&mut self) -> &mut Self {
        if self.is_fixed {
            return self;
        }

        let leaves: Vec<(String, Vec<String>)> = self
            .get_fields(true)
            .into_iter()
            .map(|field| {
                let base = field.parameter().name();
                let names = field
                    .parameter_names_for(base, 0)
                    .iter()
                    .map(|n| n.to_lowercase())
                    .collect();
                (base.to_lowercase(), names)
            })
            .collect();
        let colliding: Vec<bool> = leaves
            .iter()
            .enumerate()
            .map(|(i, (base, names))| {
                leaves.iter().enumerate().any(|(j, (other_base, other_names))| {
                    i != j && (base == other_base || names.iter().any(|n| other_names.contains(n)))
                })
            })
            .collect();

        // Names kept by non-colliding conditions are reserved up front.
        let mut taken: HashSet<String> = leaves
            .iter()
            .zip(&colliding)
            .filter(|(_, colliding)| !**colliding)
            .flat_map(|((_, names), _)| names.iter().cloned())
            .collect();

        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut position = 0;
        self.for_each_field_mut(&mut |field| {
            let is_colliding = colliding.get(position).copied().unwrap_or(false);
            position += 1;
            if !is_colliding {
                return;
            }
            let base = field.parameter().name().to_string();
            let counter = counters.entry(base.to_lowercase()).or_default();
            loop {
                let candidate = format!("{base}_{counter}");
                *counter += 1;
                let names: Vec<String> = field
                    .parameter_names_for(&candidate, 0)
                    .iter()
                    .map(|n| n.to_lowercase())
                    .collect();
                if names.iter().all(|n| !taken.contains(n)) {
                    taken.extend(names);
                    field.parameter_mut().set_name(candidate);
                    break;
                }
            }
        });

        self.mark_fixed();
        self
    }

    fn mark_fixed(&mut self) {
        self.is_fixed = true;
        for group in &mut self.groups {
            group.mark_fixed();
        }
    }

    /// Restore every parameter's original name and value and allow [`fix`](Self::fix) again.
    pub fn reset(&mut self) {
        self.for_each_field_mut(&mut QueryField::reset);
        self.clear_fixed();
    }

    fn clear_fixed(&mut self) {
        self.is_fixed = false;
        for group in &mut self.groups {
            group.clear_fixed();
        }
    }

    /// Prefix every parameter with the update marker so the tree can serve as
    /// the WHERE clause of an UPDATE whose SET clause binds the same columns.
    /// Idempotent.
    pub fn is_for_update(&mut self) -> &mut Self {
        self.for_each_field_mut(&mut QueryField::is_for_update);
        self
    }

    /// Normalize working parameter names for composition: restore the original
    /// names (values are kept), de-duplicate, and optionally apply the update marker.
    pub(crate) fn prepared(mut self, for_update: bool) -> Self {
        self.for_each_field_mut(&mut |field| {
            let original = field.parameter().original_name().to_string();
            field.parameter_mut().set_name(original);
        });
        self.clear_fixed();
        self.fix();
        if for_update {
            self.is_for_update();
        }
        self
    }

    // ==================== Rendering ====================

    /// Render the group as `( a AND b AND ( c OR d ) )`, or `NOT ( ... )` when negated.
    ///
    /// Returns an empty string for an empty tree.
    pub fn get_string(&self, index: usize, setting: &DbSetting) -> String {
        let separator = match self.conjunction {
            Conjunction::And => " AND ",
            Conjunction::Or => " OR ",
        };

        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|f| f.get_string(index, setting))
            .collect();
        parts.extend(
            self.groups
                .iter()
                .map(|g| g.get_string(index, setting))
                .filter(|s| !s.is_empty()),
        );

        if parts.is_empty() {
            return String::new();
        }

        let body = parts.join(separator);
        if self.is_not {
            format!("NOT ( {body} )")
        } else {
            format!("( {body} )")
        }
    }

    /// Bindings for every parameter the rendered text references, in render order.
    pub fn parameters(&self, index: usize) -> Vec<BoundParameter> {
        self.get_fields(true)
            .into_iter()
            .flat_map(|f| f.parameters(index))
            .collect()
    }

    /// Check every condition's operand (see [`QueryField::validate`]).
    pub fn validate(&self) -> StmtResult<()> {
        self.get_fields(true)
            .into_iter()
            .try_for_each(QueryField::validate)
    }

    /// Structural projection used in cache keys.
    pub fn key(&self) -> QueryGroupKey {
        QueryGroupKey {
            conjunction: self.conjunction,
            is_not: self.is_not,
            fields: self.fields.iter().map(QueryField::key).collect(),
            groups: self.groups.iter().map(QueryGroup::key).collect(),
        }
    }

    /// Find the first condition on `name` with the given operation.
    pub fn find(&self, name: &str, operation: Operation) -> Option<&QueryField> {
        self.get_fields(true)
            .into_iter()
            .find(|f| f.operation() == operation && f.field().matches(name))
    }
}

impl From<QueryField> for QueryGroup {
    fn from(field: QueryField) -> Self {
        QueryGroup::from_field(field)
    }
}

impl From<Vec<QueryField>> for QueryGroup {
    fn from(fields: Vec<QueryField>) -> Self {
        QueryGroup::new(fields)
    }
}

/// Structural identity of a [`QueryGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryGroupKey {
    pub conjunction: Conjunction,
    pub is_not: bool,
    pub fields: Vec<QueryFieldKey>,
    pub groups: Vec<QueryGroupKey>,
}

/// Staged construction of a [`QueryGroup`].
///
/// ```
/// use sqlcompose::{DbSetting, QueryField, QueryGroup};
///
/// let group = QueryGroup::builder()
///     .field(QueryField::eq("Active", true))
///     .group(QueryGroup::or(vec![
///         QueryField::eq("City", "Oslo"),
///         QueryField::eq("City", "Bergen"),
///     ]))
///     .build();
/// assert_eq!(group.get_fields(true).len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct QueryGroupBuilder {
    conjunction: Conjunction,
    fields: Vec<QueryField>,
    groups: Vec<QueryGroup>,
    is_not: bool,
}

impl QueryGroupBuilder {
    /// Add a condition.
    pub fn field(mut self, field: QueryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Add several conditions.
    pub fn fields(mut self, fields: impl IntoIterator<Item = QueryField>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add a child group.
    pub fn group(mut self, group: QueryGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Add several child groups.
    pub fn groups(mut self, groups: impl IntoIterator<Item = QueryGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Set the conjunction (default AND).
    pub fn conjunction(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    /// Combine with OR.
    pub fn or(self) -> Self {
        self.conjunction(Conjunction::Or)
    }

    /// Negate the whole group.
    pub fn not(mut self) -> Self {
        self.is_not = true;
        self
    }

    pub fn build(self) -> QueryGroup {
        QueryGroup {
            conjunction: self.conjunction,
            fields: self.fields,
            groups: self.groups,
            is_not: self.is_not,
            is_fixed: false,
        }
    }
}
