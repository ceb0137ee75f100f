use quarry_core::{Binding, BindingType, Dialect, QualifiedTableRef};
use quarry_dialect_bigquery::{BigQueryDialect, KeywordEscaping, translate};

fn users() -> QualifiedTableRef {
    QualifiedTableRef::new("p", "d", "users").expect("valid table ref")
}

fn token_aware(sql: &str) -> String {
    translate(sql, &users(), KeywordEscaping::TokenAware)
}

#[test]
fn bare_and_backticked_table_names_are_qualified() {
    assert_eq!(
        token_aware("SELECT * FROM users WHERE id = 1"),
        "SELECT * FROM `p.d.users` WHERE id = 1"
    );
    assert_eq!(
        token_aware("SELECT * FROM `users` u LEFT JOIN\n  Users ON u.id = Users.id"),
        "SELECT * FROM `p.d.users` u LEFT JOIN\n  `p.d.users` ON u.id = Users.id"
    );
}

#[test]
fn table_name_substrings_and_other_tables_are_untouched() {
    let sql = "SELECT users_id FROM app_users JOIN users_archive ON users_id = app_users.id";
    assert_eq!(token_aware(sql), sql);
}

#[test]
fn already_qualified_references_are_left_alone() {
    let sql = "SELECT * FROM `p.d.users` JOIN other.users ON TRUE";
    assert_eq!(token_aware(sql), sql);
}

#[test]
fn reserved_words_are_backticked_as_bare_words_only() {
    assert_eq!(
        token_aware("SELECT key, `index`, KEY_id FROM users WHERE lock = 'primary key'"),
        "SELECT `key`, `index`, KEY_id FROM `p.d.users` WHERE `lock` = 'primary key'"
    );
}

#[test]
fn comments_and_literals_are_preserved_verbatim() {
    let sql = "SELECT 'FROM users' AS label -- FROM users\nFROM users /* JOIN users */";
    assert_eq!(
        token_aware(sql),
        "SELECT 'FROM users' AS label -- FROM users\nFROM `p.d.users` /* JOIN users */"
    );
}

#[test]
fn token_aware_translation_is_idempotent() {
    let once = token_aware("SELECT key FROM users JOIN users u ON u.key = users.key");
    assert_eq!(token_aware(&once), once);
}

#[test]
fn legacy_escaping_rewrites_reserved_words_inside_literals() {
    let legacy = translate(
        "SELECT * FROM users WHERE note = 'primary key'",
        &users(),
        KeywordEscaping::Legacy,
    );
    assert_eq!(
        legacy,
        "SELECT * FROM `p.d.users` WHERE note = '`primary` `key`'"
    );
}

#[test]
fn unterminated_literal_passes_through() {
    assert_eq!(
        token_aware("SELECT key FROM users WHERE name = 'open"),
        "SELECT `key` FROM `p.d.users` WHERE name = 'open"
    );
}

#[test]
fn dialect_prepare_translates_then_inlines() {
    let dialect = BigQueryDialect::default();
    let bindings = vec![
        Binding::new("c0", "O'Brien", BindingType::String),
        Binding::new("c1", 1_i64, BindingType::Boolean),
    ];

    let sql = dialect.prepare(
        "SELECT * FROM users WHERE name = :c0 AND active = :c1 AND note = ':c0'",
        &users(),
        &bindings,
    );

    assert_eq!(
        sql,
        r"SELECT * FROM `p.d.users` WHERE name = 'O\'Brien' AND active = TRUE AND note = ':c0'"
    );
    assert_eq!(dialect.name(), "bigquery");
    assert_eq!(dialect.quote_ident("users"), "users");
}

#[test]
fn dialect_keeps_configured_escaping_mode() {
    let dialect = BigQueryDialect::with_keyword_escaping(KeywordEscaping::Legacy);
    assert_eq!(dialect.keyword_escaping(), KeywordEscaping::Legacy);
    assert_eq!(
        dialect.translate("SELECT 'lock'", &users()),
        "SELECT '`lock`'"
    );
    assert_eq!(
        BigQueryDialect::default().keyword_escaping(),
        KeywordEscaping::TokenAware
    );
}
