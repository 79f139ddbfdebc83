//! Token definitions for the lexer

use serde::{Deserialize, Serialize};
use std::fmt;
use xcc_common::SourceSpan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    // Literals
    IntLiteral(i64),
    /// Integer literal with an `L` suffix, or too wide for `int`
    LongLiteral(i64),
    FloatLiteral(f64),
    CharLiteral(u8),
    StringLiteral(String),

    Identifier(String),

    // Keywords
    Char, Int, Long, Float, Double, Void,
    If, Else, While, For, Return, Print,

    // Operators
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    Ampersand,      // &
    Pipe,           // |
    Caret,          // ^
    Tilde,          // ~
    Bang,           // !
    Equal,          // =
    Less,           // <
    Greater,        // >

    PlusPlus,       // ++
    MinusMinus,     // --
    LeftShift,      // <<
    RightShift,     // >>
    LessEqual,      // <=
    GreaterEqual,   // >=
    EqualEqual,     // ==
    BangEqual,      // !=
    AmpersandAmpersand, // &&
    PipePipe,       // ||

    PlusEqual,      // +=
    MinusEqual,     // -=
    StarEqual,      // *=
    SlashEqual,     // /=
    PercentEqual,   // %=

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,

    EndOfFile,

    // Comments are kept in the stream for `xcc tokens`; the parser drops them
    LineComment(String),
    BlockComment(String),
}

impl TokenType {
    /// Whether this token starts a type name
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenType::Char
                | TokenType::Int
                | TokenType::Long
                | TokenType::Float
                | TokenType::Double
                | TokenType::Void
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::IntLiteral(n) => write!(f, "{n}"),
            TokenType::LongLiteral(n) => write!(f, "{n}L"),
            TokenType::FloatLiteral(v) => write!(f, "{v:?}"),
            TokenType::CharLiteral(c) => write!(f, "'{}'", (*c as char).escape_default()),
            TokenType::StringLiteral(s) => write!(f, "\"{}\"", s.escape_default()),
            TokenType::Identifier(s) => write!(f, "{s}"),

            TokenType::Char => write!(f, "char"),
            TokenType::Int => write!(f, "int"),
            TokenType::Long => write!(f, "long"),
            TokenType::Float => write!(f, "float"),
            TokenType::Double => write!(f, "double"),
            TokenType::Void => write!(f, "void"),
            TokenType::If => write!(f, "if"),
            TokenType::Else => write!(f, "else"),
            TokenType::While => write!(f, "while"),
            TokenType::For => write!(f, "for"),
            TokenType::Return => write!(f, "return"),
            TokenType::Print => write!(f, "print"),

            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Percent => write!(f, "%"),
            TokenType::Ampersand => write!(f, "&"),
            TokenType::Pipe => write!(f, "|"),
            TokenType::Caret => write!(f, "^"),
            TokenType::Tilde => write!(f, "~"),
            TokenType::Bang => write!(f, "!"),
            TokenType::Equal => write!(f, "="),
            TokenType::Less => write!(f, "<"),
            TokenType::Greater => write!(f, ">"),

            TokenType::PlusPlus => write!(f, "++"),
            TokenType::MinusMinus => write!(f, "--"),
            TokenType::LeftShift => write!(f, "<<"),
            TokenType::RightShift => write!(f, ">>"),
            TokenType::LessEqual => write!(f, "<="),
            TokenType::GreaterEqual => write!(f, ">="),
            TokenType::EqualEqual => write!(f, "=="),
            TokenType::BangEqual => write!(f, "!="),
            TokenType::AmpersandAmpersand => write!(f, "&&"),
            TokenType::PipePipe => write!(f, "||"),

            TokenType::PlusEqual => write!(f, "+="),
            TokenType::MinusEqual => write!(f, "-="),
            TokenType::StarEqual => write!(f, "*="),
            TokenType::SlashEqual => write!(f, "/="),
            TokenType::PercentEqual => write!(f, "%="),

            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::LeftBracket => write!(f, "["),
            TokenType::RightBracket => write!(f, "]"),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Comma => write!(f, ","),

            TokenType::EndOfFile => write!(f, "end of file"),
            TokenType::LineComment(s) => write!(f, "//{s}"),
            TokenType::BlockComment(s) => write!(f, "/*{s}*/"),
        }
    }
}

/// A token with location information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub span: SourceSpan,
}

impl Token {
    pub fn new(token_type: TokenType, span: SourceSpan) -> Self {
        Self { token_type, span }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.token_type, self.span.start)
    }
}
