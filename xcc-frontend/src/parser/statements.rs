//! Statement parsing

use crate::ast::*;
use crate::lexer::TokenType;
use crate::parser::{ParseError, Parser};

impl Parser {
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.peek_type().is_type_keyword() {
            let start = self.current_span();
            let declarations = self.parse_declaration()?;
            let span = declarations.last().map_or(start.clone(), |d| start.extend(&d.span));
            return Ok(Statement {
                kind: StatementKind::Declaration(declarations),
                span,
            });
        }

        match self.peek_type() {
            TokenType::LeftBrace => self.parse_compound_statement(),
            TokenType::If => self.parse_if_statement(),
            TokenType::While => self.parse_while_statement(),
            TokenType::For => self.parse_for_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::Print => {
                let start = self.advance().span;
                let value = self.parse_expression()?;
                let end = self.expect(TokenType::Semicolon, "print statement")?.span;
                Ok(Statement {
                    kind: StatementKind::Print(value),
                    span: start.extend(&end),
                })
            }
            TokenType::Semicolon => Ok(Statement {
                kind: StatementKind::Empty,
                span: self.advance().span,
            }),
            _ => self.parse_expression_statement(),
        }
    }

    pub(crate) fn parse_compound_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenType::LeftBrace, "block")?.span;
        let mut statements = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.check(&TokenType::EndOfFile) {
            statements.push(self.parse_statement()?);
        }
        let end = self.expect(TokenType::RightBrace, "block")?.span;
        Ok(Statement {
            kind: StatementKind::Compound(statements),
            span: start.extend(&end),
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression()?;
        let end = self.expect(TokenType::Semicolon, "expression statement")?.span;
        let span = expr.span.extend(&end);
        Ok(Statement {
            kind: StatementKind::Expression(expr),
            span,
        })
    }

    fn parse_condition(&mut self, context: &str) -> Result<Expression, ParseError> {
        self.expect(TokenType::LeftParen, context)?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::RightParen, context)?;
        Ok(condition)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenType::If, "if statement")?.span;
        let condition = self.parse_condition("if statement")?;
        let then_stmt = Box::new(self.parse_statement()?);
        // a dangling else binds to the nearest if
        let else_stmt = if self.match_token(&TokenType::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let end = else_stmt.as_ref().map_or(&then_stmt.span, |s| &s.span);
        let span = start.extend(end);
        Ok(Statement {
            kind: StatementKind::If {
                condition,
                then_stmt,
                else_stmt,
            },
            span,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenType::While, "while statement")?.span;
        let condition = self.parse_condition("while statement")?;
        let body = Box::new(self.parse_statement()?);
        let span = start.extend(&body.span);
        Ok(Statement {
            kind: StatementKind::While { condition, body },
            span,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenType::For, "for statement")?.span;
        self.expect(TokenType::LeftParen, "for statement")?;

        // the init clause brings its own semicolon
        let init = if self.match_token(&TokenType::Semicolon) {
            None
        } else if self.peek_type().is_type_keyword() {
            Some(Box::new(self.parse_statement()?))
        } else {
            Some(Box::new(self.parse_expression_statement()?))
        };

        let condition = if self.check(&TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenType::Semicolon, "for statement")?;

        let update = if self.check(&TokenType::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenType::RightParen, "for statement")?;

        let body = Box::new(self.parse_statement()?);
        let span = start.extend(&body.span);
        Ok(Statement {
            kind: StatementKind::For {
                init,
                condition,
                update,
                body,
            },
            span,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.expect(TokenType::Return, "return statement")?.span;
        let value = if self.check(&TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = self.expect(TokenType::Semicolon, "return statement")?.span;
        Ok(Statement {
            kind: StatementKind::Return(value),
            span: start.extend(&end),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::tests::{parse_statement_from_str, shape};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_if_else_binds_to_nearest_if() {
        let stmt = parse_statement_from_str("if (a) if (b) x = 1; else x = 2;").unwrap();
        let StatementKind::If { then_stmt, else_stmt, .. } = stmt.kind else {
            panic!("expected an if statement");
        };
        assert!(else_stmt.is_none());
        assert!(matches!(then_stmt.kind, StatementKind::If { else_stmt: Some(_), .. }));
    }

    #[test]
    fn test_for_with_declaration() {
        let stmt = parse_statement_from_str("for (int i = 0; i < 10; i++) print i;").unwrap();
        let StatementKind::For {
            init,
            condition,
            update,
            body,
        } = stmt.kind
        else {
            panic!("expected a for statement");
        };
        assert!(matches!(init.map(|s| s.kind), Some(StatementKind::Declaration(_))));
        assert_eq!(shape(&condition.unwrap()), "(i < 10)");
        assert_eq!(shape(&update.unwrap()), "(i++)");
        assert!(matches!(body.kind, StatementKind::Print(_)));
    }

    #[test]
    fn test_for_with_empty_clauses() {
        let stmt = parse_statement_from_str("for (;;) ;").unwrap();
        assert!(matches!(
            stmt.kind,
            StatementKind::For {
                init: None,
                condition: None,
                update: None,
                ..
            }
        ));
    }

    #[test]
    fn test_block_and_return() {
        let stmt = parse_statement_from_str("{ int x; x = 2; return x * 3; }").unwrap();
        let StatementKind::Compound(items) = stmt.kind else {
            panic!("expected a block");
        };
        assert_eq!(items.len(), 3);
        match &items[2].kind {
            StatementKind::Return(Some(value)) => assert_eq!(shape(value), "(x * 3)"),
            other => panic!("expected a return, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_return() {
        let stmt = parse_statement_from_str("return;").unwrap();
        assert_eq!(stmt.kind, StatementKind::Return(None));
    }

    #[test]
    fn test_missing_semicolon() {
        assert!(parse_statement_from_str("print 1").is_err());
        assert!(parse_statement_from_str("x = 1 y = 2;").is_err());
    }
}
