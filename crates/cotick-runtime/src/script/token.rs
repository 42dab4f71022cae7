//! Token definitions for the script lexer

use std::fmt;

/// Token type
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Str(String),
    Identifier(String),

    // Keywords
    Fn,
    End,
    Let,
    If,
    Else,
    While,
    Return,
    True,
    False,
    Nil,
    And,
    Or,
    Not,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    DotDot,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Punctuation
    LeftParen,
    RightParen,
    Comma,

    /// Statement terminator (newline or `;`)
    Newline,

    /// End of input
    Eof,
}

impl Token {
    /// Keyword or operator that closes a block
    pub fn closes_block(&self) -> bool {
        matches!(self, Token::End | Token::Else | Token::Eof)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Number(n) => return write!(f, "number {}", n),
            Token::Str(s) => return write!(f, "string {:?}", s),
            Token::Identifier(name) => return write!(f, "'{}'", name),
            Token::Fn => "'fn'",
            Token::End => "'end'",
            Token::Let => "'let'",
            Token::If => "'if'",
            Token::Else => "'else'",
            Token::While => "'while'",
            Token::Return => "'return'",
            Token::True => "'true'",
            Token::False => "'false'",
            Token::Nil => "'nil'",
            Token::And => "'and'",
            Token::Or => "'or'",
            Token::Not => "'not'",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::DotDot => "'..'",
            Token::Equal => "'='",
            Token::EqualEqual => "'=='",
            Token::NotEqual => "'!='",
            Token::Less => "'<'",
            Token::LessEqual => "'<='",
            Token::Greater => "'>'",
            Token::GreaterEqual => "'>='",
            Token::LeftParen => "'('",
            Token::RightParen => "')'",
            Token::Comma => "','",
            Token::Newline => "end of line",
            Token::Eof => "end of file",
        };
        f.write_str(text)
    }
}

/// Source location of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}
