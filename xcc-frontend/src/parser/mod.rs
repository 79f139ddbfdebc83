//! Recursive descent parser
//!
//! Statements and declarations are parsed by plain recursive descent;
//! binary operators go through precedence climbing (see `expressions`).

pub mod declarations;
pub mod errors;
pub mod expressions;
pub mod statements;

pub use errors::ParseError;

use crate::ast::TranslationUnit;
use crate::lexer::{Token, TokenType};
use log::debug;
use std::collections::VecDeque;
use xcc_common::{CompilerError, SourceLocation, SourceSpan};

pub struct Parser {
    tokens: VecDeque<Token>,
    /// The final `EndOfFile` token, returned once the stream is drained
    eof: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: VecDeque<Token> = tokens
            .into_iter()
            .filter(|t| !matches!(t.token_type, TokenType::LineComment(_) | TokenType::BlockComment(_)))
            .collect();
        let ends_with_eof = tokens
            .back()
            .is_some_and(|t| t.token_type == TokenType::EndOfFile);
        let eof = if ends_with_eof { tokens.pop_back() } else { None };
        let eof = eof.unwrap_or_else(|| Token::new(TokenType::EndOfFile, SourceSpan::dummy()));
        Self { tokens, eof }
    }

    pub(crate) fn peek(&self) -> &Token {
        self.tokens.front().unwrap_or(&self.eof)
    }

    pub(crate) fn peek_type(&self) -> &TokenType {
        &self.peek().token_type
    }

    /// Token type `n` positions ahead of the current one
    pub(crate) fn peek_nth(&self, n: usize) -> &TokenType {
        self.tokens.get(n).map_or(&self.eof.token_type, |t| &t.token_type)
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.tokens.pop_front().unwrap_or_else(|| self.eof.clone())
    }

    /// Compares variants only, so `Identifier(_)` patterns match any name.
    pub(crate) fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(self.peek_type()) == std::mem::discriminant(token_type)
    }

    pub(crate) fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, ParseError> {
        if self.check(&token_type) {
            return Ok(self.advance());
        }
        Err(self.unexpected(format!("'{token_type}' in {context}")))
    }

    pub(crate) fn expect_identifier(&mut self, context: &str) -> Result<(String, SourceSpan), ParseError> {
        if let TokenType::Identifier(name) = self.peek_type() {
            let name = name.clone();
            let token = self.advance();
            return Ok((name, token.span));
        }
        Err(self.unexpected(format!("identifier in {context}")))
    }

    /// Error for the current token not being `expected`
    pub(crate) fn unexpected(&self, expected: String) -> ParseError {
        let found = self.peek().clone();
        if found.token_type == TokenType::EndOfFile {
            ParseError::UnexpectedEndOfFile {
                expected,
                location: found.span.start,
            }
        } else {
            ParseError::UnexpectedToken { expected, found }
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().span.start.clone()
    }

    pub(crate) fn current_span(&self) -> SourceSpan {
        self.peek().span.clone()
    }

    pub fn parse_translation_unit(&mut self) -> Result<TranslationUnit, CompilerError> {
        let start = self.current_span();
        let mut items = Vec::new();
        while !self.check(&TokenType::EndOfFile) {
            items.push(self.parse_top_level_item()?);
        }
        debug!("parsed {} top-level item(s)", items.len());
        Ok(TranslationUnit {
            items,
            span: start.extend(&self.current_span()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ast::*;
    use crate::lexer::Lexer;
    use pretty_assertions::assert_eq;
    use xcc_common::{CompilationContext, Value};

    pub(crate) fn parser_for(input: &str) -> Parser {
        let mut ctx = CompilationContext::new();
        let tokens = Lexer::new(input, "test.c", &mut ctx).tokenize().unwrap();
        Parser::new(tokens)
    }

    pub(crate) fn parse_expression_from_str(input: &str) -> Result<Expression, ParseError> {
        parser_for(input).parse_expression()
    }

    pub(crate) fn parse_statement_from_str(input: &str) -> Result<Statement, ParseError> {
        parser_for(input).parse_statement()
    }

    /// Render an expression with full parentheses to check tree shape.
    pub(crate) fn shape(expr: &Expression) -> String {
        match &expr.kind {
            ExpressionKind::Literal(Value::Int(v)) => v.to_string(),
            ExpressionKind::Literal(v) => v.to_string(),
            ExpressionKind::Identifier(name) => name.clone(),
            ExpressionKind::Binary { op, left, right } => format!("({} {op} {})", shape(left), shape(right)),
            ExpressionKind::Unary { op, operand } => match op {
                UnaryOp::PostIncrement | UnaryOp::PostDecrement => format!("({}{op})", shape(operand)),
                _ => format!("({op}{})", shape(operand)),
            },
            ExpressionKind::Assignment { op, target, value } => {
                format!("({} {op} {})", shape(target), shape(value))
            }
            ExpressionKind::Call { function, arguments } => {
                let args: Vec<String> = arguments.iter().map(shape).collect();
                format!("{function}({})", args.join(", "))
            }
            ExpressionKind::Index { array, index } => format!("{}[{}]", shape(array), shape(index)),
            ExpressionKind::Cast { target_type, operand } => format!("(({target_type}) {})", shape(operand)),
        }
    }

    #[test]
    fn test_parse_translation_unit() {
        let mut parser = parser_for("int g = 1; int f(int x); int main() { return f(g); }");
        let unit = parser.parse_translation_unit().unwrap();
        assert_eq!(unit.items.len(), 3);
        assert!(matches!(&unit.items[0], TopLevelItem::Declaration(decls) if decls[0].name == "g"));
        assert!(matches!(&unit.items[1], TopLevelItem::Function(f) if f.body.is_none()));
        assert!(matches!(&unit.items[2], TopLevelItem::Function(f) if f.body.is_some()));
    }

    #[test]
    fn test_error_reports_position() {
        let mut parser = parser_for("int main() {\n  return 1\n}");
        let err = parser.parse_translation_unit().unwrap_err();
        match err {
            CompilerError::ParseError { location, message } => {
                assert_eq!(location.line, 3);
                assert!(message.contains("';'"), "{message}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_end_of_file() {
        let err = parse_statement_from_str("while (x").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEndOfFile { .. }));
    }

    #[test]
    fn test_comments_are_skipped() {
        let expr = parse_expression_from_str("1 /* one */ + // two\n 2").unwrap();
        assert_eq!(shape(&expr), "(1 + 2)");
    }
}
