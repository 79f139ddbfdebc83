//! Expression parsing
//!
//! Binary operators are parsed by precedence climbing over the table in
//! [`binary_operator`]; assignment sits above it and associates right.

use crate::ast::*;
use crate::lexer::TokenType;
use crate::parser::{ParseError, Parser};
use xcc_common::{SourceSpan, Value};

/// Binding power and operator for a binary operator token. Higher binds tighter.
fn binary_operator(token: &TokenType) -> Option<(u8, BinaryOp)> {
    let entry = match token {
        TokenType::PipePipe => (1, BinaryOp::LogicalOr),
        TokenType::AmpersandAmpersand => (2, BinaryOp::LogicalAnd),
        TokenType::Pipe => (3, BinaryOp::BitOr),
        TokenType::Caret => (4, BinaryOp::BitXor),
        TokenType::Ampersand => (5, BinaryOp::BitAnd),
        TokenType::EqualEqual => (6, BinaryOp::Equal),
        TokenType::BangEqual => (6, BinaryOp::NotEqual),
        TokenType::Less => (7, BinaryOp::Less),
        TokenType::LessEqual => (7, BinaryOp::LessEqual),
        TokenType::Greater => (7, BinaryOp::Greater),
        TokenType::GreaterEqual => (7, BinaryOp::GreaterEqual),
        TokenType::LeftShift => (8, BinaryOp::LeftShift),
        TokenType::RightShift => (8, BinaryOp::RightShift),
        TokenType::Plus => (9, BinaryOp::Add),
        TokenType::Minus => (9, BinaryOp::Sub),
        TokenType::Star => (10, BinaryOp::Mul),
        TokenType::Slash => (10, BinaryOp::Div),
        TokenType::Percent => (10, BinaryOp::Mod),
        _ => return None,
    };
    Some(entry)
}

fn assignment_operator(token: &TokenType) -> Option<AssignOp> {
    let op = match token {
        TokenType::Equal => AssignOp::Assign,
        TokenType::PlusEqual => AssignOp::Compound(BinaryOp::Add),
        TokenType::MinusEqual => AssignOp::Compound(BinaryOp::Sub),
        TokenType::StarEqual => AssignOp::Compound(BinaryOp::Mul),
        TokenType::SlashEqual => AssignOp::Compound(BinaryOp::Div),
        TokenType::PercentEqual => AssignOp::Compound(BinaryOp::Mod),
        _ => return None,
    };
    Some(op)
}

fn span_of(left: &Expression, right: &Expression) -> SourceSpan {
    left.span.extend(&right.span)
}

impl Parser {
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        let target = self.parse_binary_expression(1)?;
        let Some(op) = assignment_operator(self.peek_type()) else {
            return Ok(target);
        };
        self.advance();
        let value = self.parse_assignment_expression()?;
        let span = span_of(&target, &value);
        Ok(Expression::new(
            ExpressionKind::Assignment {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    /// Parse operators binding at least as tightly as `min_precedence`.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary_expression()?;
        while let Some((precedence, op)) = binary_operator(self.peek_type()) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            // left associative: the right side only takes tighter operators
            let right = self.parse_binary_expression(precedence + 1)?;
            let span = span_of(&left, &right);
            left = Expression::new(
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.current_span();
        let op = match self.peek_type() {
            TokenType::Plus => UnaryOp::Plus,
            TokenType::Minus => UnaryOp::Minus,
            TokenType::Bang => UnaryOp::LogicalNot,
            TokenType::Tilde => UnaryOp::BitNot,
            TokenType::Star => UnaryOp::Dereference,
            TokenType::Ampersand => UnaryOp::AddressOf,
            TokenType::PlusPlus => UnaryOp::PreIncrement,
            TokenType::MinusMinus => UnaryOp::PreDecrement,
            TokenType::LeftParen if self.peek_nth(1).is_type_keyword() => return self.parse_cast_expression(),
            _ => return self.parse_postfix_expression(),
        };
        self.advance();
        let operand = self.parse_unary_expression()?;
        let span = start.extend(&operand.span);
        Ok(Expression::new(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_cast_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.expect(TokenType::LeftParen, "cast")?.span;
        let target_type = self.parse_type_name()?;
        self.expect(TokenType::RightParen, "cast")?;
        let operand = self.parse_unary_expression()?;
        let span = start.extend(&operand.span);
        Ok(Expression::new(
            ExpressionKind::Cast {
                target_type,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary_expression()?;
        loop {
            match self.peek_type() {
                TokenType::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self.expect(TokenType::RightBracket, "array index")?.span;
                    let span = expr.span.extend(&end);
                    expr = Expression::new(
                        ExpressionKind::Index {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenType::PlusPlus | TokenType::MinusMinus => {
                    let op = if self.check(&TokenType::PlusPlus) {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    let end = self.advance().span;
                    let span = expr.span.extend(&end);
                    expr = Expression::new(
                        ExpressionKind::Unary {
                            op,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        let token = self.peek().clone();
        let literal = match token.token_type {
            TokenType::IntLiteral(v) => Some(Value::Int(v as i32)),
            TokenType::LongLiteral(v) => Some(Value::Long(v)),
            TokenType::FloatLiteral(v) => Some(Value::Float(v)),
            TokenType::CharLiteral(c) => Some(Value::Char(c)),
            TokenType::StringLiteral(s) => Some(Value::Str(s)),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expression::new(ExpressionKind::Literal(value), token.span));
        }

        match self.peek_type() {
            TokenType::Identifier(_) => {
                let (name, span) = self.expect_identifier("expression")?;
                if self.check(&TokenType::LeftParen) {
                    return self.parse_call(name, span);
                }
                Ok(Expression::new(ExpressionKind::Identifier(name), span))
            }
            TokenType::LeftParen => {
                let start = self.advance().span;
                let mut inner = self.parse_expression()?;
                let end = self.expect(TokenType::RightParen, "parenthesized expression")?.span;
                inner.span = start.extend(&end);
                Ok(inner)
            }
            _ => Err(self.unexpected("expression".to_string())),
        }
    }

    fn parse_call(&mut self, function: String, start: SourceSpan) -> Result<Expression, ParseError> {
        self.expect(TokenType::LeftParen, "function call")?;
        let mut arguments = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                arguments.push(self.parse_assignment_expression()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(TokenType::RightParen, "function call")?.span;
        Ok(Expression::new(
            ExpressionKind::Call { function, arguments },
            start.extend(&end),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::tests::{parse_expression_from_str, shape};
    use pretty_assertions::assert_eq;

    fn parsed(input: &str) -> String {
        shape(&parse_expression_from_str(input).unwrap())
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parsed("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(parsed("a < b == c > d"), "((a < b) == (c > d))");
        assert_eq!(parsed("a || b && c | d ^ e & f"), "(a || (b && (c | (d ^ (e & f)))))");
        assert_eq!(parsed("1 << 2 + 3"), "(1 << (2 + 3))");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(parsed("10 - 4 - 3"), "((10 - 4) - 3)");
        assert_eq!(parsed("a / b % c"), "((a / b) % c)");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(parsed("a = b = 3"), "(a = (b = 3))");
        assert_eq!(parsed("x += y * 2"), "(x += (y * 2))");
    }

    #[test]
    fn test_unary_and_postfix() {
        assert_eq!(parsed("-a * !b"), "((-a) * (!b))");
        assert_eq!(parsed("*p++"), "(*(p++))");
        assert_eq!(parsed("&a[i + 1]"), "(&a[(i + 1)])");
        assert_eq!(parsed("--n"), "(--n)");
    }

    #[test]
    fn test_cast_and_parentheses() {
        assert_eq!(parsed("(float) n / 2"), "(((float) n) / 2)");
        assert_eq!(parsed("(long *) p"), "((long*) p)");
        assert_eq!(parsed("(a + b) * c"), "((a + b) * c)");
    }

    #[test]
    fn test_calls() {
        assert_eq!(parsed("f()"), "f()");
        assert_eq!(parsed("max(a, b + 1) * 2"), "(max(a, (b + 1)) * 2)");
    }

    #[test]
    fn test_missing_operand() {
        assert!(parse_expression_from_str("1 + ").is_err());
        assert!(parse_expression_from_str("(1 + 2").is_err());
    }
}
