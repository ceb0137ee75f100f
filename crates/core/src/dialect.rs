use crate::{Binding, QualifiedTableRef, RelationalType};

/// SQL rewriting and type vocabulary for one warehouse backend.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrites framework SQL into backend SQL for `table`.
    fn translate(&self, sql: &str, table: &QualifiedTableRef) -> String;

    /// Replaces placeholders in `sql` with literals rendered from `bindings`.
    fn inline(&self, sql: &str, bindings: &[Binding]) -> String;

    fn prepare(&self, sql: &str, table: &QualifiedTableRef, bindings: &[Binding]) -> String {
        self.inline(&self.translate(sql, table), bindings)
    }

    fn quote_ident(&self, ident: &str) -> String;

    fn relational_type(&self, warehouse_type: &str) -> RelationalType;

    fn warehouse_type(&self, relational_type: RelationalType) -> &'static str;
}
