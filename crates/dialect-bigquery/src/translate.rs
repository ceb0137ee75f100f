use quarry_core::QualifiedTableRef;

use crate::lexer::{Token, TokenKind, tokenize};

/// Bare words the warehouse rejects as identifiers unless backticked.
pub const RESERVED_WORDS: [&str; 6] = ["key", "ignore", "lock", "index", "unique", "primary"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordEscaping {
    /// Escape reserved words only where they appear as bare words.
    #[default]
    TokenAware,
    /// Also escape reserved words inside string literals. Corrupts literal
    /// values such as `'primary key'` and is not idempotent; kept for parity
    /// with SQL generated by earlier releases.
    Legacy,
}

/// Rewrites framework SQL into warehouse SQL: qualifies references to
/// `table` after `FROM`/`JOIN` and backticks reserved words.
pub fn translate(sql: &str, table: &QualifiedTableRef, escaping: KeywordEscaping) -> String {
    let tokens = tokenize(sql);
    let mut output = String::with_capacity(sql.len() + table.qualified().len());
    let mut after_table_keyword = false;

    for (index, token) in tokens.iter().enumerate() {
        if token.is_trivia() {
            output.push_str(token.text);
            continue;
        }

        match token.kind {
            TokenKind::Word | TokenKind::QuotedIdent
                if after_table_keyword && names_table(token, &tokens, index, table) =>
            {
                output.push_str(&table.qualified());
            }
            TokenKind::Word if is_reserved_word(token.text) => {
                output.push('`');
                output.push_str(token.text);
                output.push('`');
            }
            TokenKind::StringLiteral if escaping == KeywordEscaping::Legacy => {
                output.push_str(&escape_reserved_words_in_text(token.text));
            }
            _ => output.push_str(token.text),
        }

        after_table_keyword = token.is_keyword("FROM") || token.is_keyword("JOIN");
    }

    output
}

#[must_use]
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(word))
}

fn names_table(
    token: &Token<'_>,
    tokens: &[Token<'_>],
    index: usize,
    table: &QualifiedTableRef,
) -> bool {
    let Some(identifier) = token.identifier() else {
        return false;
    };
    // `users.id` or `users.*` refers to a column path, not the table.
    let continues_path = tokens
        .get(index + 1)
        .is_some_and(|next| next.kind == TokenKind::Punct && next.text == ".");

    identifier.eq_ignore_ascii_case(table.table()) && !continues_path
}

/// Word-boundary rewrite over raw text, as a regex `\b(key|...)\b` would do.
fn escape_reserved_words_in_text(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut word_start: Option<usize> = None;

    let flush = |output: &mut String, word: &str| {
        if is_reserved_word(word) {
            output.push('`');
            output.push_str(word);
            output.push('`');
        } else {
            output.push_str(word);
        }
    };

    for (index, ch) in text.char_indices() {
        let is_word_char = ch.is_ascii_alphanumeric() || ch == '_';
        match (word_start, is_word_char) {
            (None, true) => word_start = Some(index),
            (Some(start), false) => {
                flush(&mut output, &text[start..index]);
                word_start = None;
                output.push(ch);
            }
            (None, false) => output.push(ch),
            (Some(_), true) => {}
        }
    }
    if let Some(start) = word_start {
        flush(&mut output, &text[start..]);
    }

    output
}
