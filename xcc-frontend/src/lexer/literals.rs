//! Numeric, character and string literals

use crate::lexer::{Lexer, TokenType};
use xcc_common::CompilerError;

impl Lexer<'_> {
    /// Integer or float literal. Floats are pooled on the spot.
    pub(crate) fn tokenize_number(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();

        if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let mut digits = String::new();
            while let Some(ch) = self.current_char().filter(char::is_ascii_hexdigit) {
                digits.push(ch);
                self.advance();
            }
            let value = i64::from_str_radix(&digits, 16).map_err(|_| {
                CompilerError::lexer_error(format!("Invalid hex literal: 0x{digits}"), start.clone())
            })?;
            return Ok(self.integer_token(value));
        }

        let mut text = String::new();
        let mut is_float = false;
        while let Some(ch) = self.current_char() {
            match ch {
                '0'..='9' => text.push(ch),
                '.' if !is_float => {
                    is_float = true;
                    text.push(ch);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(ch);
                    self.advance();
                    if let Some(sign) = self.current_char().filter(|c| matches!(c, '+' | '-')) {
                        text.push(sign);
                        self.advance();
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| CompilerError::lexer_error(format!("Invalid float literal: {text}"), start))?;
            self.ctx.intern_float(value);
            return Ok(TokenType::FloatLiteral(value));
        }

        let value: i64 = text
            .parse()
            .map_err(|_| CompilerError::lexer_error(format!("Invalid integer literal: {text}"), start))?;
        Ok(self.integer_token(value))
    }

    /// Apply an optional `L` suffix; values outside `int` are long regardless.
    fn integer_token(&mut self, value: i64) -> TokenType {
        if self.eat('l') || self.eat('L') || i32::try_from(value).is_err() {
            TokenType::LongLiteral(value)
        } else {
            TokenType::IntLiteral(value)
        }
    }

    /// One possibly escaped character inside a quoted literal
    fn escaped_char(&mut self, quote: char) -> Result<char, CompilerError> {
        let location = self.current_location();
        let kind = if quote == '"' { "string" } else { "character" };
        match self.advance() {
            None | Some('\n') => Err(CompilerError::lexer_error(
                format!("Unterminated {kind} literal"),
                location,
            )),
            Some('\\') => {
                let escaped = match self.advance() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('0') => '\0',
                    Some('\\') => '\\',
                    Some('\'') => '\'',
                    Some('"') => '"',
                    Some(c) => {
                        return Err(CompilerError::lexer_error(
                            format!("Invalid escape sequence: \\{c}"),
                            location,
                        ))
                    }
                    None => {
                        return Err(CompilerError::lexer_error(
                            format!("Unterminated {kind} literal"),
                            location,
                        ))
                    }
                };
                Ok(escaped)
            }
            Some(c) => Ok(c),
        }
    }

    pub(crate) fn tokenize_char_literal(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();
        self.advance();
        if self.current_char() == Some('\'') {
            return Err(CompilerError::lexer_error("Empty character literal".to_string(), start));
        }
        let ch = self.escaped_char('\'')?;
        if !self.eat('\'') {
            return Err(CompilerError::lexer_error("Unterminated character literal".to_string(), start));
        }
        if !ch.is_ascii() {
            return Err(CompilerError::lexer_error(format!("Character {ch:?} is not ASCII"), start));
        }
        Ok(TokenType::CharLiteral(ch as u8))
    }

    pub(crate) fn tokenize_string_literal(&mut self) -> Result<TokenType, CompilerError> {
        self.advance();
        let mut string = String::new();
        while !self.eat('"') {
            string.push(self.escaped_char('"')?);
        }
        self.ctx.intern_string(&string);
        Ok(TokenType::StringLiteral(string))
    }
}
