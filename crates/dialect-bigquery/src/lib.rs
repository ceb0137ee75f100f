use quarry_core::{Binding, Dialect, QualifiedTableRef, RelationalType};

mod behavior;
mod connection;
mod cursor;
mod gateway;
mod inline;
mod job;
pub mod lexer;
mod schema_dialect;
mod schema_mapper;
mod translate;

pub use behavior::{Clock, DateTimeBehavior, TimestampBehavior};
pub use connection::BigQueryConnection;
pub use cursor::ResultCursor;
pub use gateway::TableGateway;
pub use inline::{inline, quote_string, render_literal};
pub use job::{JobClient, JobOptions, QueryHandle};
pub use schema_dialect::BigQuerySchemaDialect;
pub use schema_mapper::{
    WAREHOUSE_DATE_FORMAT, WAREHOUSE_DATETIME_FORMAT, coerce, coerce_row, describe_field,
    parse_datetime, to_relational_type, to_warehouse_type,
};
pub use translate::{KeywordEscaping, RESERVED_WORDS, is_reserved_word, translate};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BigQueryDialect {
    keyword_escaping: KeywordEscaping,
}

impl BigQueryDialect {
    #[must_use]
    pub const fn with_keyword_escaping(keyword_escaping: KeywordEscaping) -> Self {
        Self { keyword_escaping }
    }

    #[must_use]
    pub const fn keyword_escaping(&self) -> KeywordEscaping {
        self.keyword_escaping
    }
}

impl Dialect for BigQueryDialect {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn translate(&self, sql: &str, table: &QualifiedTableRef) -> String {
        translate(sql, table, self.keyword_escaping)
    }

    fn inline(&self, sql: &str, bindings: &[Binding]) -> String {
        inline(sql, bindings)
    }

    /// Identifiers pass through unchanged; reserved words are escaped by
    /// `translate` instead.
    fn quote_ident(&self, ident: &str) -> String {
        ident.to_string()
    }

    fn relational_type(&self, warehouse_type: &str) -> RelationalType {
        to_relational_type(warehouse_type)
    }

    fn warehouse_type(&self, relational_type: RelationalType) -> &'static str {
        to_warehouse_type(relational_type)
    }
}
