//! Operators, delimiters and comments

use crate::lexer::{Lexer, TokenType};
use xcc_common::CompilerError;

impl Lexer<'_> {
    /// `single`, or `with_equal` when followed by `=`
    fn one_or_assign(&mut self, single: TokenType, with_equal: TokenType) -> TokenType {
        if self.eat('=') {
            with_equal
        } else {
            single
        }
    }

    pub(crate) fn tokenize_operator(&mut self) -> Result<TokenType, CompilerError> {
        let location = self.current_location();
        let Some(ch) = self.advance() else {
            return Ok(TokenType::EndOfFile);
        };
        let token = match ch {
            '+' if self.eat('+') => TokenType::PlusPlus,
            '+' => self.one_or_assign(TokenType::Plus, TokenType::PlusEqual),
            '-' if self.eat('-') => TokenType::MinusMinus,
            '-' => self.one_or_assign(TokenType::Minus, TokenType::MinusEqual),
            '*' => self.one_or_assign(TokenType::Star, TokenType::StarEqual),
            '/' => self.one_or_assign(TokenType::Slash, TokenType::SlashEqual),
            '%' => self.one_or_assign(TokenType::Percent, TokenType::PercentEqual),
            '&' if self.eat('&') => TokenType::AmpersandAmpersand,
            '&' => TokenType::Ampersand,
            '|' if self.eat('|') => TokenType::PipePipe,
            '|' => TokenType::Pipe,
            '^' => TokenType::Caret,
            '~' => TokenType::Tilde,
            '!' => self.one_or_assign(TokenType::Bang, TokenType::BangEqual),
            '=' => self.one_or_assign(TokenType::Equal, TokenType::EqualEqual),
            '<' if self.eat('<') => TokenType::LeftShift,
            '<' => self.one_or_assign(TokenType::Less, TokenType::LessEqual),
            '>' if self.eat('>') => TokenType::RightShift,
            '>' => self.one_or_assign(TokenType::Greater, TokenType::GreaterEqual),
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            ';' => TokenType::Semicolon,
            ',' => TokenType::Comma,
            other => {
                return Err(CompilerError::lexer_error(
                    format!("Unexpected character: {other:?}"),
                    location,
                ))
            }
        };
        Ok(token)
    }

    pub(crate) fn tokenize_line_comment(&mut self) -> TokenType {
        self.advance();
        self.advance();
        let mut comment = String::new();
        while let Some(ch) = self.current_char().filter(|&c| c != '\n') {
            comment.push(ch);
            self.advance();
        }
        TokenType::LineComment(comment)
    }

    pub(crate) fn tokenize_block_comment(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();
        self.advance();
        self.advance();
        let mut comment = String::new();
        loop {
            match self.current_char() {
                Some('*') if self.peek_char(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return Ok(TokenType::BlockComment(comment));
                }
                Some(ch) => {
                    comment.push(ch);
                    self.advance();
                }
                None => {
                    return Err(CompilerError::lexer_error(
                        "Unterminated block comment".to_string(),
                        start,
                    ))
                }
            }
        }
    }
}
