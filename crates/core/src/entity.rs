use std::collections::{BTreeMap, BTreeSet};

use crate::{Row, Value};

/// In-memory representation of one warehouse row.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    fields: Row,
    dirty: BTreeSet<String>,
    new: bool,
    errors: BTreeMap<String, Vec<String>>,
    source: Option<String>,
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    /// Empty entity that has never been persisted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: Row::new(),
            dirty: BTreeSet::new(),
            new: true,
            errors: BTreeMap::new(),
            source: None,
        }
    }

    /// New entity with every field marked dirty.
    #[must_use]
    pub fn from_row(row: Row) -> Self {
        let mut entity = Self::new();
        for (field, value) in row {
            entity.set(field, value);
        }
        entity
    }

    /// Entity loaded from the warehouse: persisted and clean.
    #[must_use]
    pub fn hydrated(row: Row, source: impl Into<String>) -> Self {
        Self {
            fields: row,
            dirty: BTreeSet::new(),
            new: false,
            errors: BTreeMap::new(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets `field`; the field becomes dirty unless the value is unchanged.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if self.fields.get(&field) == Some(&value) {
            return;
        }
        self.dirty.insert(field.clone());
        self.fields.insert(field, value);
    }

    #[must_use]
    pub fn fields(&self) -> &Row {
        &self.fields
    }

    #[must_use]
    pub fn to_row(&self) -> Row {
        self.fields.clone()
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.new
    }

    pub fn set_new(&mut self, new: bool) {
        self.new = new;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[must_use]
    pub fn is_field_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    /// Clears dirty tracking and validation errors.
    pub fn clean(&mut self) {
        self.dirty.clear();
        self.errors.clear();
    }

    pub fn set_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|messages| !messages.is_empty())
    }

    #[must_use]
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }
}

/// Options recognized by `save`.
///
/// `atomic` is accepted for compatibility but backends without transactions
/// force it off. `associated`, `check_rules` and `check_existing` are accepted
/// and ignored: entities here carry no associations, rule sets or existence
/// lookups, and validation errors always stop a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub atomic: bool,
    pub associated: bool,
    pub check_rules: bool,
    pub check_existing: bool,
    pub clean_on_success: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            atomic: false,
            associated: true,
            check_rules: true,
            check_existing: true,
            clean_on_success: true,
        }
    }
}

/// Options recognized by `delete`. Both are accepted and ignored; deletes never
/// run in a transaction and carry no rule checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub atomic: bool,
    pub check_rules: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The remote write completed and the entity was marked clean.
    Saved,
    /// Nothing to persist; no remote call was made.
    Unchanged,
    /// The entity carried validation errors; no remote call was made.
    Invalid,
}

impl SaveOutcome {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Saved | Self::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::Entity;
    use crate::Row;

    #[test]
    fn setting_an_identical_value_does_not_mark_dirty() {
        let mut entity = Entity::hydrated(Row::new().with("name", "A"), "Users");
        entity.set("name", "A");
        assert!(!entity.is_dirty());

        entity.set("name", "B");
        assert!(entity.is_field_dirty("name"));
    }

    #[test]
    fn clean_drops_dirty_state_and_errors() {
        let mut entity = Entity::from_row(Row::new().with("id", "1"));
        entity.set_error("id", "invalid");
        assert!(entity.has_errors());

        entity.clean();
        assert!(!entity.is_dirty());
        assert!(!entity.has_errors());
        assert!(entity.is_new());
    }
}
