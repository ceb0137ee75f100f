use quarry_core::{Binding, BindingType, Value};
use quarry_dialect_bigquery::{inline, render_literal};

#[test]
fn string_bindings_are_quoted_and_escaped() {
    let sql = inline(
        "SELECT * FROM t WHERE name = :c0",
        &[Binding::new("c0", "O'Brien", BindingType::String)],
    );
    assert_eq!(sql, r"SELECT * FROM t WHERE name = 'O\'Brien'");
}

#[test]
fn booleans_follow_truthiness() {
    let bindings = [
        Binding::new("a", true, BindingType::Boolean),
        Binding::new("b", 0_i64, BindingType::Boolean),
        Binding::new("c", "yes", BindingType::Boolean),
    ];
    assert_eq!(
        inline("SELECT :a, :b, :c", &bindings),
        "SELECT TRUE, FALSE, TRUE"
    );
}

#[test]
fn numeric_bindings_render_bare_only_when_numeric() {
    assert_eq!(
        render_literal(&Value::from("42"), &BindingType::Integer),
        "42"
    );
    assert_eq!(render_literal(&Value::Float(1.5), &BindingType::Float), "1.5");
    assert_eq!(render_literal(&Value::Bool(true), &BindingType::Integer), "1");
    assert_eq!(
        render_literal(&Value::from("1 OR 1=1"), &BindingType::Integer),
        "'1 OR 1=1'"
    );
    assert_eq!(render_literal(&Value::Int(7), &BindingType::String), "'7'");
}

#[test]
fn null_renders_as_keyword_for_every_type() {
    for ty in [
        BindingType::String,
        BindingType::Boolean,
        BindingType::Integer,
        BindingType::Other("datetime".to_string()),
    ] {
        assert_eq!(render_literal(&Value::Null, &ty), "NULL");
    }
}

#[test]
fn unknown_placeholders_and_quoted_text_stay_verbatim() {
    let bindings = [Binding::new("c0", 1_i64, BindingType::Integer)];
    assert_eq!(
        inline(
            "SELECT ':c0', `:c0`, :c1 FROM t -- :c0\nWHERE a = :c0 AND b::INT64 = 1",
            &bindings
        ),
        "SELECT ':c0', `:c0`, :c1 FROM t -- :c0\nWHERE a = 1 AND b::INT64 = 1"
    );
}

#[test]
fn first_binding_wins_for_repeated_placeholders() {
    let bindings = [
        Binding::new(":c0", "first", BindingType::String),
        Binding::new("c0", "second", BindingType::String),
    ];
    assert_eq!(inline("SELECT :c0, :c0", &bindings), "SELECT 'first', 'first'");
}

#[test]
fn placeholder_prefixes_do_not_capture_longer_names() {
    let bindings = [
        Binding::new("c1", "one", BindingType::String),
        Binding::new("c10", "ten", BindingType::String),
    ];
    assert_eq!(inline("SELECT :c10, :c1", &bindings), "SELECT 'ten', 'one'");
}

#[test]
fn temporal_values_are_quoted_text() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");
    assert_eq!(
        render_literal(&Value::Date(date), &BindingType::Other("date".to_string())),
        "'2024-01-02'"
    );
}
