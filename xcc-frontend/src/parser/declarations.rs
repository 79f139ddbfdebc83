//! Declarations, function definitions and initializers

use crate::ast::*;
use crate::lexer::TokenType;
use crate::parser::{ParseError, Parser};
use xcc_common::SourceSpan;

impl Parser {
    pub(crate) fn parse_base_type(&mut self) -> Result<BaseType, ParseError> {
        let base = match self.peek_type() {
            TokenType::Void => BaseType::Void,
            TokenType::Char => BaseType::Char,
            TokenType::Int => BaseType::Int,
            TokenType::Long => BaseType::Long,
            TokenType::Float | TokenType::Double => BaseType::Float,
            _ => return Err(self.unexpected("type name".to_string())),
        };
        self.advance();
        Ok(base)
    }

    fn parse_pointer_depth(&mut self) -> u8 {
        let mut depth = 0;
        while self.match_token(&TokenType::Star) {
            depth += 1;
        }
        depth
    }

    /// Abstract type name, as in casts: base type and pointer stars
    pub(crate) fn parse_type_name(&mut self) -> Result<TypeSpec, ParseError> {
        let base = self.parse_base_type()?;
        Ok(TypeSpec {
            base,
            pointer_depth: self.parse_pointer_depth(),
            array_length: None,
        })
    }

    fn parse_array_suffix(&mut self) -> Result<Option<usize>, ParseError> {
        if !self.match_token(&TokenType::LeftBracket) {
            return Ok(None);
        }
        let location = self.current_location();
        let length = match self.advance().token_type {
            TokenType::IntLiteral(n) if n > 0 => n as usize,
            other => {
                return Err(ParseError::InvalidType {
                    message: format!("Array length must be a positive integer constant, found {other}"),
                    location,
                })
            }
        };
        self.expect(TokenType::RightBracket, "array declarator")?;
        Ok(Some(length))
    }

    pub(crate) fn parse_initializer(&mut self) -> Result<Initializer, ParseError> {
        if !self.check(&TokenType::LeftBrace) {
            return Ok(Initializer::Expression(self.parse_expression()?));
        }
        let start = self.advance().span;
        let mut items = Vec::new();
        while !self.check(&TokenType::RightBrace) {
            items.push(self.parse_initializer()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        let end = self.expect(TokenType::RightBrace, "initializer list")?.span;
        Ok(Initializer::List {
            items,
            span: start.extend(&end),
        })
    }

    /// Remainder of a declarator once its name is known: `[N]` and `= init`
    fn finish_declarator(
        &mut self,
        base: BaseType,
        pointer_depth: u8,
        name: String,
        span: SourceSpan,
    ) -> Result<Declaration, ParseError> {
        let array_length = self.parse_array_suffix()?;
        let initializer = if self.match_token(&TokenType::Equal) {
            Some(self.parse_initializer()?)
        } else {
            None
        };
        let span = match &initializer {
            Some(init) => span.extend(init.span()),
            None => span,
        };
        Ok(Declaration {
            name,
            decl_type: TypeSpec {
                base,
                pointer_depth,
                array_length,
            },
            initializer,
            span,
        })
    }

    fn parse_declarator(&mut self, base: BaseType) -> Result<Declaration, ParseError> {
        let pointer_depth = self.parse_pointer_depth();
        let (name, span) = self.expect_identifier("declaration")?;
        self.finish_declarator(base, pointer_depth, name, span)
    }

    /// `declarator (, declarator)* ;` after the base type, starting from an already parsed first declarator
    fn parse_declarator_list(&mut self, base: BaseType, first: Declaration) -> Result<Vec<Declaration>, ParseError> {
        let mut declarations = vec![first];
        while self.match_token(&TokenType::Comma) {
            declarations.push(self.parse_declarator(base)?);
        }
        self.expect(TokenType::Semicolon, "declaration")?;
        Ok(declarations)
    }

    /// Local declaration statement
    pub(crate) fn parse_declaration(&mut self) -> Result<Vec<Declaration>, ParseError> {
        let base = self.parse_base_type()?;
        let first = self.parse_declarator(base)?;
        self.parse_declarator_list(base, first)
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        self.expect(TokenType::LeftParen, "parameter list")?;
        let mut parameters = Vec::new();
        if self.check(&TokenType::Void) && matches!(self.peek_nth(1), TokenType::RightParen) {
            self.advance();
        }
        if !self.check(&TokenType::RightParen) {
            loop {
                let start = self.current_span();
                let base = self.parse_base_type()?;
                let mut pointer_depth = self.parse_pointer_depth();
                let (name, span) = self.expect_identifier("parameter list")?;
                // `int a[]` is a pointer parameter
                if self.match_token(&TokenType::LeftBracket) {
                    if matches!(self.peek_type(), TokenType::IntLiteral(_)) {
                        self.advance();
                    }
                    self.expect(TokenType::RightBracket, "parameter list")?;
                    pointer_depth += 1;
                }
                parameters.push(Parameter {
                    name,
                    param_type: TypeSpec {
                        base,
                        pointer_depth,
                        array_length: None,
                    },
                    span: start.extend(&span),
                });
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RightParen, "parameter list")?;
        Ok(parameters)
    }

    pub(crate) fn parse_top_level_item(&mut self) -> Result<TopLevelItem, ParseError> {
        let start = self.current_span();
        let base = self.parse_base_type()?;
        let pointer_depth = self.parse_pointer_depth();
        let (name, name_span) = self.expect_identifier("top-level declaration")?;

        if !self.check(&TokenType::LeftParen) {
            let first = self.finish_declarator(base, pointer_depth, name, start.extend(&name_span))?;
            return Ok(TopLevelItem::Declaration(self.parse_declarator_list(base, first)?));
        }

        let parameters = self.parse_parameters()?;
        let return_type = TypeSpec {
            base,
            pointer_depth,
            array_length: None,
        };
        let (body, end) = if self.check(&TokenType::Semicolon) {
            (None, self.advance().span)
        } else {
            let body = self.parse_compound_statement()?;
            let end = body.span.clone();
            (Some(body), end)
        };
        Ok(TopLevelItem::Function(FunctionDefinition {
            name,
            return_type,
            parameters,
            body,
            span: start.extend(&end),
        }))
    }
}
