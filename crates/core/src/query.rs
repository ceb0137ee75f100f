use crate::{BindingType, Value, ValueBinder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl Comparison {
    const fn operator(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare {
        column: String,
        op: Comparison,
        value: Value,
        ty: BindingType,
    },
    IsNull(String),
    IsNotNull(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    on: String,
}

/// Minimal SELECT builder producing generic SQL with `:cN` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    alias: Option<String>,
    fields: Vec<String>,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    order: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            fields: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Replaces the projection. An empty projection renders as `*`.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn join(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl Into<String>,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            alias: alias.map(str::to_string),
            on: on.into(),
        });
        self
    }

    #[must_use]
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>, ty: BindingType) -> Self {
        self.where_cmp(column, Comparison::Eq, value, ty)
    }

    /// Adds `column <op> value`; comparing with `Value::Null` renders `IS NULL` / `IS NOT NULL`.
    #[must_use]
    pub fn where_cmp(
        mut self,
        column: impl Into<String>,
        op: Comparison,
        value: impl Into<Value>,
        ty: BindingType,
    ) -> Self {
        let column = column.into();
        let value = value.into();
        let condition = match (op, value.is_null()) {
            (Comparison::Eq, true) => Condition::IsNull(column),
            (Comparison::NotEq, true) => Condition::IsNotNull(column),
            _ => Condition::Compare {
                column,
                op,
                value,
                ty,
            },
        };
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull(column.into()));
        self
    }

    #[must_use]
    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNotNull(column.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((column.into(), order));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Renders generic SQL, registering every bound value with `binder`.
    pub fn to_sql(&self, binder: &mut ValueBinder) -> String {
        let projection = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };

        let mut sql = format!("SELECT {projection} FROM {}", self.table);
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(alias);
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.keyword());
            sql.push(' ');
            sql.push_str(&join.table);
            if let Some(alias) = &join.alias {
                sql.push(' ');
                sql.push_str(alias);
            }
            sql.push_str(" ON ");
            sql.push_str(&join.on);
        }

        if !self.conditions.is_empty() {
            let predicates = self
                .conditions
                .iter()
                .map(|condition| render_condition(condition, binder))
                .collect::<Vec<_>>();
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, order)| match order {
                    SortOrder::Asc => format!("{column} ASC"),
                    SortOrder::Desc => format!("{column} DESC"),
                })
                .collect::<Vec<_>>();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }
}

fn render_condition(condition: &Condition, binder: &mut ValueBinder) -> String {
    match condition {
        Condition::Compare {
            column,
            op,
            value,
            ty,
        } => {
            let placeholder = binder.placeholder(value.clone(), ty.clone());
            format!("{column} {} {placeholder}", op.operator())
        }
        Condition::IsNull(column) => format!("{column} IS NULL"),
        Condition::IsNotNull(column) => format!("{column} IS NOT NULL"),
    }
}
