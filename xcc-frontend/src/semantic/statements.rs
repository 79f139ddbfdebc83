//! Statement checking and local declarations

use crate::ast::*;
use crate::semantic::constants::string_chars;
use crate::semantic::errors::SemanticError;
use crate::semantic::expressions::coerce;
use crate::semantic::symbols::resolve_type;
use crate::semantic::SemanticAnalyzer;
use crate::typed_ast::{LocalInit, TypedExpr, TypedStmt};
use xcc_common::{PrimitiveType, ScalarType, SourceLocation, Symbol, Value};

impl SemanticAnalyzer {
    pub(crate) fn analyze_statement(&mut self, stmt: &Statement) -> Result<TypedStmt, SemanticError> {
        let location = stmt.span.start.clone();
        match &stmt.kind {
            StatementKind::Expression(expr) => Ok(TypedStmt::Expression {
                expr: self.analyze_expression(expr)?,
                location,
            }),
            StatementKind::Compound(statements) => {
                self.symbols.push_scope();
                let result = statements
                    .iter()
                    .map(|s| self.analyze_statement(s))
                    .collect::<Result<Vec<_>, _>>();
                self.symbols.pop_scope();
                Ok(TypedStmt::Block(result?))
            }
            StatementKind::Declaration(decls) => {
                let mut declared = decls
                    .iter()
                    .map(|decl| self.declare_local(decl))
                    .collect::<Result<Vec<_>, _>>()?;
                if declared.len() == 1 {
                    if let Some(single) = declared.pop() {
                        return Ok(single);
                    }
                }
                Ok(TypedStmt::Block(declared))
            }
            StatementKind::Print(expr) => Ok(TypedStmt::Print {
                value: self.analyze_value(expr)?,
                location,
            }),
            StatementKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                let condition = self.analyze_value(condition)?;
                let then_stmt = Box::new(self.analyze_statement(then_stmt)?);
                let else_stmt = match else_stmt {
                    Some(stmt) => Some(Box::new(self.analyze_statement(stmt)?)),
                    None => None,
                };
                Ok(TypedStmt::If {
                    condition,
                    then_stmt,
                    else_stmt,
                    location,
                })
            }
            StatementKind::While { condition, body } => Ok(TypedStmt::While {
                condition: self.analyze_value(condition)?,
                body: Box::new(self.analyze_statement(body)?),
                location,
            }),
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                // a declaration in the init clause is scoped to the loop
                self.symbols.push_scope();
                let result = self.analyze_for(init.as_deref(), condition.as_ref(), update.as_ref(), body, location);
                self.symbols.pop_scope();
                result
            }
            StatementKind::Return(value) => self.analyze_return(value.as_ref(), stmt, location),
            StatementKind::Empty => Ok(TypedStmt::Empty),
        }
    }

    fn analyze_for(
        &mut self,
        init: Option<&Statement>,
        condition: Option<&Expression>,
        update: Option<&Expression>,
        body: &Statement,
        location: SourceLocation,
    ) -> Result<TypedStmt, SemanticError> {
        let init = match init {
            Some(stmt) => Some(Box::new(self.analyze_statement(stmt)?)),
            None => None,
        };
        let condition = condition.map(|c| self.analyze_value(c)).transpose()?;
        let update = update.map(|u| self.analyze_expression(u)).transpose()?;
        let body = Box::new(self.analyze_statement(body)?);
        Ok(TypedStmt::For {
            init,
            condition,
            update,
            body,
            location,
        })
    }

    fn analyze_return(
        &mut self,
        value: Option<&Expression>,
        stmt: &Statement,
        location: SourceLocation,
    ) -> Result<TypedStmt, SemanticError> {
        let expected = self.current_return;
        let value = match value {
            Some(expr) => {
                let typed = self.analyze_value(expr)?;
                if expected.is_void() {
                    return Err(SemanticError::ReturnTypeMismatch {
                        expected,
                        found: typed.ty(),
                        span: stmt.span.clone(),
                    });
                }
                let converted = coerce(typed, expected, &expr.span).map_err(|err| match err {
                    SemanticError::TypeMismatch { found, span, .. } => SemanticError::ReturnTypeMismatch {
                        expected,
                        found,
                        span,
                    },
                    other => other,
                })?;
                Some(converted)
            }
            None if !expected.is_void() => {
                return Err(SemanticError::ReturnTypeMismatch {
                    expected,
                    found: PrimitiveType::Void,
                    span: stmt.span.clone(),
                })
            }
            None => None,
        };
        Ok(TypedStmt::Return { value, location })
    }

    fn declare_local(&mut self, decl: &Declaration) -> Result<TypedStmt, SemanticError> {
        let ty = resolve_type(&decl.decl_type, &decl.span)?;
        if ty.is_void() {
            return Err(SemanticError::unsupported(format!("void variable '{}'", decl.name), &decl.span));
        }
        let initializer = match &decl.initializer {
            Some(init) => Some(self.local_initializer(&decl.name, &ty, init)?),
            None => None,
        };
        if self.symbols.exists_in_current_scope(&decl.name) {
            return Err(SemanticError::RedefinedSymbol {
                name: decl.name.clone(),
                span: decl.span.clone(),
            });
        }
        let offset = self.frame.allocate(&decl.name, &ty, &decl.span)?;
        let symbol = Symbol::local(decl.name.as_str(), ty, offset);
        self.symbols.declare(symbol.clone(), &decl.span)?;
        Ok(TypedStmt::Declaration {
            symbol,
            initializer,
            location: decl.span.start.clone(),
        })
    }

    fn local_initializer(&mut self, name: &str, ty: &PrimitiveType, init: &Initializer) -> Result<LocalInit, SemanticError> {
        let PrimitiveType::Array { element, length } = *ty else {
            return match init {
                Initializer::Expression(expr) => {
                    let value = self.analyze_value(expr)?;
                    Ok(LocalInit::Scalar(coerce(value, *ty, &expr.span)?))
                }
                Initializer::List { span, .. } => Err(SemanticError::unsupported(
                    format!("initializer list for non-array '{name}'"),
                    span,
                )),
            };
        };

        let elements: Vec<TypedExpr> = match init {
            Initializer::Expression(Expression {
                kind: ExpressionKind::Literal(Value::Str(s)),
                ..
            }) if element == ScalarType::Char => {
                let mut chars: Vec<TypedExpr> = string_chars(s).map(TypedExpr::Literal).collect();
                if chars.len() == length + 1 {
                    chars.pop();
                }
                chars
            }
            Initializer::Expression(expr) => {
                let value = self.analyze_value(expr)?;
                return Err(SemanticError::TypeMismatch {
                    expected: *ty,
                    found: value.ty(),
                    span: expr.span.clone(),
                });
            }
            Initializer::List { .. } => {
                let mut exprs = Vec::new();
                flatten(init, &mut exprs);
                let target = PrimitiveType::Scalar(element);
                exprs
                    .into_iter()
                    .map(|expr| {
                        let value = self.analyze_value(expr)?;
                        coerce(value, target, &expr.span)
                    })
                    .collect::<Result<_, _>>()?
            }
        };

        if elements.len() > length {
            return Err(SemanticError::TooManyInitializers {
                name: name.to_string(),
                capacity: length,
                found: elements.len(),
                span: init.span().clone(),
            });
        }
        Ok(LocalInit::Elements(elements))
    }
}

fn flatten<'a>(init: &'a Initializer, out: &mut Vec<&'a Expression>) {
    match init {
        Initializer::Expression(expr) => out.push(expr),
        Initializer::List { items, .. } => {
            for item in items {
                flatten(item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::semantic::tests::{analyze_body, analyze_source, semantic_message};
    use crate::typed_ast::{LocalInit, TypedExpr, TypedStmt};
    use pretty_assertions::assert_eq;
    use xcc_common::{Address, PrimitiveType, Value};

    #[test]
    fn test_local_declaration_gets_frame_slot() {
        let stmts = analyze_body("int a = 1; float b;").unwrap();
        let TypedStmt::Declaration {
            symbol, initializer, ..
        } = &stmts[0]
        else {
            panic!("expected a declaration");
        };
        assert_eq!(symbol.address, Address::Frame(-4));
        assert_eq!(initializer, &Some(LocalInit::Scalar(TypedExpr::Literal(Value::Int(1)))));
        let TypedStmt::Declaration { symbol, .. } = &stmts[1] else {
            panic!("expected a declaration");
        };
        assert_eq!(symbol.address, Address::Frame(-16));
    }

    #[test]
    fn test_multiple_declarators_become_a_block() {
        let stmts = analyze_body("int a, b, c;").unwrap();
        assert!(matches!(&stmts[0], TypedStmt::Block(inner) if inner.len() == 3));
    }

    #[test]
    fn test_local_array_initializer() {
        let stmts = analyze_body("float v[4] = {1, 2.5};").unwrap();
        let TypedStmt::Declaration {
            initializer: Some(LocalInit::Elements(elements)),
            ..
        } = &stmts[0]
        else {
            panic!("expected an array initializer");
        };
        assert_eq!(elements.len(), 2);
        assert!(elements.iter().all(|e| e.ty() == PrimitiveType::FLOAT));
    }

    #[test]
    fn test_char_array_from_string_literal() {
        let stmts = analyze_body("char s[3] = \"abc\";").unwrap();
        let TypedStmt::Declaration {
            initializer: Some(LocalInit::Elements(elements)),
            ..
        } = &stmts[0]
        else {
            panic!("expected an array initializer");
        };
        assert_eq!(elements.len(), 3);
        assert!(analyze_body("char s[2] = \"abc\";").is_err());
    }

    #[test]
    fn test_block_scoping() {
        assert!(analyze_body("int x; { float x; x = 1.5; } x = 2;").is_ok());
        assert_eq!(semantic_message(analyze_body("{ int y; } y = 1;")), "Undefined variable: y");
    }

    #[test]
    fn test_for_init_is_scoped_to_loop() {
        assert!(analyze_body("for (int i = 0; i < 3; i++) print i; for (int i = 0; i < 3; i++) print i;").is_ok());
        assert!(analyze_body("for (int i = 0; i < 3; i++) ; print i;").is_err());
    }

    #[test]
    fn test_return_checks() {
        assert!(analyze_source("float f() { return 1; }").is_ok());
        let message = semantic_message(analyze_source("void f() { return 1; }"));
        assert_eq!(message, "Return type mismatch: expected void, found int");
        let message = semantic_message(analyze_source("int f() { return; }"));
        assert_eq!(message, "Return type mismatch: expected int, found void");
        assert!(analyze_source("int *f(float x) { return x; }").is_err());
    }

    #[test]
    fn test_void_call_as_statement_only() {
        let source = "void tick() { } int main() { tick(); return 0; }";
        assert!(analyze_source(source).is_ok());
        let message = semantic_message(analyze_source("void tick() { } int main() { print tick(); return 0; }"));
        assert_eq!(message, "Void value used in an expression");
    }

    #[test]
    fn test_argument_count() {
        let message = semantic_message(analyze_source("int f(int a, int b) { return a; } int main() { return f(1); }"));
        assert_eq!(message, "Function f: expected 2 arguments, found 1");
    }
}
