//! Lexer for cotick scripts.
//!
//! Built on logos. Produces `(Token, Span)` pairs terminated by
//! [`Token::Eof`]; newlines and `;` are significant and come out as
//! [`Token::Newline`].

use crate::script::token::{Span, Token};
use logos::Logos;

/// Logos-based token enum, converted to [`Token`] after lexing
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
enum LogosToken {
    #[token("\n")]
    #[token(";")]
    Newline,

    // Keywords (exact tokens win over the identifier regex)
    #[token("fn")]
    Fn,

    #[token("end")]
    End,

    #[token("let")]
    Let,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("while")]
    While,

    #[token("return")]
    Return,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("nil")]
    Nil,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number)]
    Number(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, parse_string)]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("..")]
    DotDot,

    #[token("=")]
    Equal,

    #[token("==")]
    EqualEqual,

    #[token("!=")]
    #[token("~=")]
    NotEqual,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEqual,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEqual,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token(",")]
    Comma,
}

fn parse_number(lex: &mut logos::Lexer<LogosToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<LogosToken>) -> Option<String> {
    let slice = lex.slice();
    Some(unescape(&slice[1..slice.len() - 1]))
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => break,
        }
    }
    result
}

impl From<LogosToken> for Token {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Newline => Token::Newline,
            LogosToken::Fn => Token::Fn,
            LogosToken::End => Token::End,
            LogosToken::Let => Token::Let,
            LogosToken::If => Token::If,
            LogosToken::Else => Token::Else,
            LogosToken::While => Token::While,
            LogosToken::Return => Token::Return,
            LogosToken::True => Token::True,
            LogosToken::False => Token::False,
            LogosToken::Nil => Token::Nil,
            LogosToken::And => Token::And,
            LogosToken::Or => Token::Or,
            LogosToken::Not => Token::Not,
            LogosToken::Number(n) => Token::Number(n),
            LogosToken::Str(s) => Token::Str(s),
            LogosToken::Identifier(name) => Token::Identifier(name),
            LogosToken::Plus => Token::Plus,
            LogosToken::Minus => Token::Minus,
            LogosToken::Star => Token::Star,
            LogosToken::Slash => Token::Slash,
            LogosToken::Percent => Token::Percent,
            LogosToken::DotDot => Token::DotDot,
            LogosToken::Equal => Token::Equal,
            LogosToken::EqualEqual => Token::EqualEqual,
            LogosToken::NotEqual => Token::NotEqual,
            LogosToken::Less => Token::Less,
            LogosToken::LessEqual => Token::LessEqual,
            LogosToken::Greater => Token::Greater,
            LogosToken::GreaterEqual => Token::GreaterEqual,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::Comma => Token::Comma,
        }
    }
}

/// Lexer error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{char}'")]
    UnexpectedCharacter { char: char, span: Span },

    #[error("unterminated string")]
    UnterminatedString { span: Span },
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. } | LexError::UnterminatedString { span } => {
                span
            }
        }
    }
}

/// Tracks line and column while the lexer moves forward
struct LineCursor {
    offset: usize,
    line: u32,
    column: u32,
}

impl LineCursor {
    fn new() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn advance_to(&mut self, source: &str, target: usize) -> (u32, u32) {
        for c in source[self.offset..target].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = target;
        (self.line, self.column)
    }
}

/// Split `source` into tokens, collecting every lexical error
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut cursor = LineCursor::new();
    let mut lexer = LogosToken::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let (line, column) = cursor.advance_to(source, range.start);
        let span = Span::new(range.start, range.end, line, column);

        match result {
            Ok(token) => tokens.push((token.into(), span)),
            Err(()) => {
                let char = source[range.start..].chars().next().unwrap_or('\0');
                if char == '"' || char == '\'' {
                    errors.push(LexError::UnterminatedString { span });
                    // Resynchronise at the end of the line
                    let rest = lexer.remainder();
                    lexer.bump(rest.find('\n').unwrap_or(rest.len()));
                } else {
                    errors.push(LexError::UnexpectedCharacter { char, span });
                }
            }
        }
    }

    let (line, column) = cursor.advance_to(source, source.len());
    tokens.push((
        Token::Eof,
        Span::new(source.len(), source.len(), line, column),
    ));

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("fn ending end"),
            vec![
                Token::Fn,
                Token::Identifier("ending".to_string()),
                Token::End,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_numbers_and_concat() {
        assert_eq!(
            kinds("1.5 .. 2e3 42"),
            vec![
                Token::Number(1.5),
                Token::DotDot,
                Token::Number(2000.0),
                Token::Number(42.0),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\tb\"c" 'it\'s'"#),
            vec![
                Token::Str("a\tb\"c".to_string()),
                Token::Str("it's".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        assert_eq!(
            kinds("x # comment\n;y"),
            vec![
                Token::Identifier("x".to_string()),
                Token::Newline,
                Token::Newline,
                Token::Identifier("y".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != ~= <= >= < > = %"),
            vec![
                Token::EqualEqual,
                Token::NotEqual,
                Token::NotEqual,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Less,
                Token::Greater,
                Token::Equal,
                Token::Percent,
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = tokenize("a\n  bb").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 1, 1, 1));
        assert_eq!(tokens[2].1, Span::new(4, 6, 2, 3));
        assert_eq!(tokens[2].1.slice("a\n  bb"), "bb");
    }

    #[test]
    fn test_errors() {
        let errors = tokenize("let x = @\nprint(\"oops)\nlet y = 1").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            LexError::UnexpectedCharacter { char: '@', .. }
        ));
        assert!(matches!(errors[1], LexError::UnterminatedString { .. }));
        assert_eq!(errors[1].span().line, 2);
    }
}
