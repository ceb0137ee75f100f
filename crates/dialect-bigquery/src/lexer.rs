//! Lossless SQL tokenizer.
//!
//! Every byte of the input belongs to exactly one token, so concatenating
//! token texts reproduces the input. Rewrites work token by token and copy
//! everything they do not touch verbatim.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    /// `-- ...`, `# ...` or `/* ... */`.
    Comment,
    /// Keywords and bare identifiers.
    Word,
    /// `` `...` ``
    QuotedIdent,
    /// `'...'`, `"..."`, triple-quoted and `r`/`b` prefixed forms.
    StringLiteral,
    Number,
    /// `:name`
    Placeholder,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'source> {
    pub kind: TokenKind,
    pub text: &'source str,
}

impl<'source> Token<'source> {
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Placeholder name without the leading colon.
    #[must_use]
    pub fn placeholder_name(&self) -> Option<&'source str> {
        match self.kind {
            TokenKind::Placeholder => self.text.strip_prefix(':'),
            _ => None,
        }
    }

    /// Identifier text with surrounding backticks removed.
    #[must_use]
    pub fn identifier(&self) -> Option<&'source str> {
        match self.kind {
            TokenKind::Word => Some(self.text),
            TokenKind::QuotedIdent => self
                .text
                .strip_prefix('`')
                .and_then(|inner| inner.strip_suffix('`')),
            _ => None,
        }
    }
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        tokens.push(token);
    }
    tokens
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

const fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

const fn is_word_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

const fn is_quote(b: u8) -> bool {
    b == b'\'' || b == b'"'
}

struct Tokenizer<'source> {
    input: &'source str,
    position: usize,
}

impl<'source> Tokenizer<'source> {
    fn new(input: &'source str) -> Self {
        Self { input, position: 0 }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.peek_byte_at(0)
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.position + offset).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.peek_byte().inspect(|_| {
            self.position += 1;
        })
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.input.as_bytes()[self.position..].starts_with(pattern.as_bytes())
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'source> {
        // Token boundaries only fall on ASCII bytes or the end of input,
        // so the slice is always valid UTF-8.
        Token {
            kind,
            text: &self.input[start..self.position],
        }
    }

    fn next_token(&mut self) -> Option<Token<'source>> {
        let start = self.position;
        let b = self.peek_byte()?;

        let kind = match b {
            _ if is_whitespace(b) => {
                self.consume_while(is_whitespace);
                TokenKind::Whitespace
            }
            b'-' if self.peek_byte_at(1) == Some(b'-') => {
                self.consume_line();
                TokenKind::Comment
            }
            b'#' => {
                self.consume_line();
                TokenKind::Comment
            }
            b'/' if self.peek_byte_at(1) == Some(b'*') => {
                self.consume_block_comment();
                TokenKind::Comment
            }
            b'`' => {
                self.position += 1;
                self.consume_quoted(b'`', false);
                TokenKind::QuotedIdent
            }
            _ if is_quote(b) => {
                self.consume_string(false);
                TokenKind::StringLiteral
            }
            _ if self.string_prefix_len() > 0 => {
                let prefix_len = self.string_prefix_len();
                let raw = self.input.as_bytes()[start..start + prefix_len]
                    .iter()
                    .any(|byte| byte.eq_ignore_ascii_case(&b'r'));
                self.position += prefix_len;
                self.consume_string(raw);
                TokenKind::StringLiteral
            }
            b'0'..=b'9' => {
                self.consume_number();
                TokenKind::Number
            }
            b'.' if self.peek_byte_at(1).is_some_and(|next| next.is_ascii_digit()) => {
                self.consume_number();
                TokenKind::Number
            }
            b':' if self.peek_byte_at(1).is_some_and(is_word_start) => {
                self.position += 1;
                self.consume_while(is_word_continue);
                TokenKind::Placeholder
            }
            b':' if self.peek_byte_at(1) == Some(b':') => {
                self.position += 2;
                TokenKind::Punct
            }
            _ if is_word_start(b) => {
                self.consume_while(is_word_continue);
                TokenKind::Word
            }
            _ => {
                self.position += 1;
                TokenKind::Punct
            }
        };

        Some(self.token(kind, start))
    }

    fn consume_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while self.peek_byte().is_some_and(&predicate) {
            self.position += 1;
        }
    }

    fn consume_line(&mut self) {
        self.consume_while(|b| b != b'\n');
    }

    fn consume_block_comment(&mut self) {
        self.position += 2;
        while self.peek_byte().is_some() {
            if self.starts_with("*/") {
                self.position += 2;
                return;
            }
            self.position += 1;
        }
    }

    /// Length of an `r`, `b`, `rb` or `br` prefix directly followed by a quote.
    fn string_prefix_len(&self) -> usize {
        let is_prefix = |b: Option<u8>| b.is_some_and(|b| matches!(b, b'r' | b'R' | b'b' | b'B'));

        // A prefix must start a word, not end one.
        if self.position > 0
            && is_word_continue(self.input.as_bytes()[self.position - 1])
        {
            return 0;
        }
        if !is_prefix(self.peek_byte()) {
            return 0;
        }
        if self.peek_byte_at(1).is_some_and(is_quote) {
            return 1;
        }
        if is_prefix(self.peek_byte_at(1))
            && self.peek_byte_at(2).is_some_and(is_quote)
            && self.peek_byte().map(|b| b.to_ascii_lowercase())
                != self.peek_byte_at(1).map(|b| b.to_ascii_lowercase())
        {
            return 2;
        }
        0
    }

    fn consume_string(&mut self, raw: bool) {
        let Some(quote) = self.peek_byte() else {
            return;
        };
        let triple = [quote, quote, quote];
        if self.input.as_bytes()[self.position..].starts_with(&triple) {
            self.position += 3;
            self.consume_triple_quoted(quote, raw);
        } else {
            self.position += 1;
            self.consume_quoted(quote, raw);
        }
    }

    /// Consumes up to and including the closing `quote`. Unterminated input
    /// runs to the end.
    fn consume_quoted(&mut self, quote: u8, raw: bool) {
        while let Some(b) = self.next_byte() {
            if b == b'\\' && !raw {
                self.next_byte();
                continue;
            }
            if b == quote {
                // Doubled quote is an escaped quote.
                if self.peek_byte() == Some(quote) {
                    self.position += 1;
                    continue;
                }
                return;
            }
        }
    }

    fn consume_triple_quoted(&mut self, quote: u8, raw: bool) {
        let triple = [quote, quote, quote];
        while self.peek_byte().is_some() {
            if self.input.as_bytes()[self.position..].starts_with(&triple) {
                self.position += 3;
                return;
            }
            if self.next_byte() == Some(b'\\') && !raw {
                self.next_byte();
            }
        }
    }

    fn consume_number(&mut self) {
        while let Some(b) = self.peek_byte() {
            let exponent_sign = matches!(b, b'+' | b'-')
                && self.position > 0
                && matches!(self.input.as_bytes()[self.position - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || exponent_sign {
                self.position += 1;
            } else {
                break;
            }
        }
    }
}
