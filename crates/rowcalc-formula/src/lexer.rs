//! Formula lexer
//!
//! Splits formula text into tokens. Function names are upper-cased here,
//! which is what makes `si`, `Si` and `SI` the same function.

use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    Field,
    Identifier,
    Operator,
    LParen,
    RParen,
    Comma,
    Eof,
}

/// A lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// End-of-input marker
    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }

    /// Check for an operator token with the given (canonical) text
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of formula"),
            kind => write!(f, "{:?} \"{}\"", kind, self.text),
        }
    }
}

/// Tokenize formula text.
///
/// The stream always ends with a single [`TokenKind::Eof`]. The only error
/// is an unterminated `[field`.
///
/// # Example
/// ```rust
/// use rowcalc_formula::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("si([Age] >= 18, 'ok', '')").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Identifier);
/// assert_eq!(tokens[0].text, "SI");
/// assert_eq!(tokens[2].text, "Age");
/// assert_eq!(tokens[3].text, ">=");
/// ```
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> FormulaResult<Vec<Token>> {
        while let Some(c) = self.peek_char() {
            match c {
                ' ' | '\t' | '\n' | '\r' | '\u{a0}' => self.advance(),
                '0'..='9' => self.scan_number(),
                '"' | '\'' => self.scan_string(c),
                '[' => self.scan_field()?,
                c if c.is_ascii_alphabetic() => self.scan_identifier(),
                '+' | '-' | '*' | '/' | '(' | ')' | ',' | '>' | '<' | '=' | '!' => {
                    self.scan_operator(c)
                }
                other => {
                    log::trace!("skipping unrecognised character {:?} at {}", other, self.pos);
                    self.advance();
                }
            }
        }
        self.tokens.push(Token::eof());
        Ok(self.tokens)
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.tokens.push(Token::new(kind, text));
    }

    // === Token scanning ===

    fn scan_number(&mut self) {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        self.push(TokenKind::Number, text);
    }

    fn scan_string(&mut self, quote: char) {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == quote {
                // Doubled quote is an escaped literal quote
                if self.peek_char_at(1) == Some(quote) {
                    s.push(quote);
                    self.advance();
                    self.advance();
                    continue;
                }
                self.advance(); // Skip closing quote
                break;
            }
            s.push(c);
            self.advance();
        }

        self.push(TokenKind::String, s);
    }

    fn scan_field(&mut self) -> FormulaResult<()> {
        let open = self.pos;
        self.advance(); // Skip '['

        let start = self.pos;
        match self.input[start..].find(']') {
            Some(len) => {
                let name = &self.input[start..start + len];
                self.pos = start + len + 1;
                self.push(TokenKind::Field, name);
                Ok(())
            }
            None => Err(FormulaError::Lex {
                position: open,
                message: "missing closing ']' for field".into(),
            }),
        }
    }

    fn scan_identifier(&mut self) {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let name = self.input[start..self.pos].to_ascii_uppercase();
        self.push(TokenKind::Identifier, name);
    }

    fn scan_operator(&mut self, c: char) {
        // Two-character operators, with == and != canonicalised
        let pair = match (c, self.peek_char_at(1)) {
            ('>', Some('=')) => Some(">="),
            ('<', Some('=')) => Some("<="),
            ('<', Some('>')) => Some("<>"),
            ('=', Some('=')) => Some("="),
            ('!', Some('=')) => Some("<>"),
            _ => None,
        };
        if let Some(op) = pair {
            self.advance();
            self.advance();
            self.push(TokenKind::Operator, op);
            return;
        }

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            _ => TokenKind::Operator,
        };
        self.advance();
        self.push(kind, c.to_string());
    }
}
