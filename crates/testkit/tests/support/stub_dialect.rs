use std::sync::{Mutex, MutexGuard};

use quarry_core::{Binding, Dialect, QualifiedTableRef, RelationalType};

/// Whitespace-splitting dialect: qualifies exact table-name words and
/// inlines every binding as a quoted string.
#[derive(Debug, Default)]
pub struct StubDialect {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    translated: Vec<String>,
}

impl StubDialect {
    pub fn translated(&self) -> Vec<String> {
        self.state_guard().translated.clone()
    }

    fn state_guard(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("stub dialect mutex should lock")
    }
}

impl Dialect for StubDialect {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn translate(&self, sql: &str, table: &QualifiedTableRef) -> String {
        self.state_guard().translated.push(sql.to_string());
        sql.split(' ')
            .map(|word| {
                if word == table.table() {
                    table.qualified()
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn inline(&self, sql: &str, bindings: &[Binding]) -> String {
        bindings.iter().fold(sql.to_string(), |sql, binding| {
            sql.replace(
                &format!(":{}", binding.placeholder),
                &format!("'{}'", binding.value.to_text()),
            )
        })
    }

    fn quote_ident(&self, ident: &str) -> String {
        ident.to_string()
    }

    fn relational_type(&self, _warehouse_type: &str) -> RelationalType {
        RelationalType::Text
    }

    fn warehouse_type(&self, _relational_type: RelationalType) -> &'static str {
        "STRING"
    }
}
