//! Lexer
//!
//! Turns source text into a token stream. Float and string literals are
//! interned into the [`CompilationContext`] as they are scanned, so the
//! constant pools are complete by the time parsing ends.

pub mod literals;
pub mod operators;
pub mod token;

pub use token::{Token, TokenType};

use log::debug;
use std::collections::HashMap;
use xcc_common::{CompilationContext, CompilerError, SourceLocation, SourceTracker};

pub struct Lexer<'ctx> {
    pub(crate) input: Vec<char>,
    pub(crate) position: usize,
    tracker: SourceTracker,
    pub(crate) ctx: &'ctx mut CompilationContext,
    keywords: HashMap<&'static str, TokenType>,
}

impl<'ctx> Lexer<'ctx> {
    pub fn new(input: &str, filename: &str, ctx: &'ctx mut CompilationContext) -> Self {
        let keywords = [
            ("char", TokenType::Char),
            ("int", TokenType::Int),
            ("long", TokenType::Long),
            ("float", TokenType::Float),
            ("double", TokenType::Double),
            ("void", TokenType::Void),
            ("if", TokenType::If),
            ("else", TokenType::Else),
            ("while", TokenType::While),
            ("for", TokenType::For),
            ("return", TokenType::Return),
            ("print", TokenType::Print),
        ]
        .into_iter()
        .collect();

        Self {
            input: input.chars().collect(),
            position: 0,
            tracker: SourceTracker::new(filename),
            ctx,
            keywords,
        }
    }

    pub(crate) fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub(crate) fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        self.tracker.advance(ch);
        Some(ch)
    }

    /// Consume the next character if it is `expected`.
    pub(crate) fn eat(&mut self, expected: char) -> bool {
        if self.current_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.tracker.location()
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn tokenize_identifier(&mut self) -> TokenType {
        let mut identifier = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        match self.keywords.get(identifier.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenType::Identifier(identifier),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_whitespace();
        let start = self.current_location();

        let token_type = match self.current_char() {
            None => TokenType::EndOfFile,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.tokenize_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.tokenize_number()?,
            Some('.') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => self.tokenize_number()?,
            Some('\'') => self.tokenize_char_literal()?,
            Some('"') => self.tokenize_string_literal()?,
            Some('/') if self.peek_char(1) == Some('/') => self.tokenize_line_comment(),
            Some('/') if self.peek_char(1) == Some('*') => self.tokenize_block_comment()?,
            Some(_) => self.tokenize_operator()?,
        };

        Ok(Token::new(token_type, self.tracker.span_from(start)))
    }

    /// Tokenize the entire input, ending with an `EndOfFile` token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.token_type == TokenType::EndOfFile;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        debug!("lexed {} token(s)", tokens.len());
        Ok(tokens)
    }
}
