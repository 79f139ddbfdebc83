//! Semantic analysis
//!
//! Resolves names to symbols with concrete storage, checks types, inserts
//! implicit conversions and produces the typed AST. Runs in two passes:
//! first every function signature and global is collected, so functions
//! may be called before their definition; then each body is checked.

pub mod constants;
pub mod errors;
pub mod expressions;
pub mod statements;
pub mod symbols;

pub use errors::SemanticError;
pub use symbols::{FunctionSignature, SymbolTable};

use crate::ast::*;
use crate::typed_ast::{TypedFunction, TypedGlobal, TypedStmt, TypedTranslationUnit};
use log::debug;
use std::collections::HashMap;
use symbols::{resolve_type, FrameLayout};
use xcc_common::{CompilerError, FunctionInfo, PrimitiveType, Symbol};

/// Semantic analyzer context
pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    functions: HashMap<String, FunctionSignature>,
    frame: FrameLayout,
    /// Return type of the function being checked
    current_return: PrimitiveType,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            functions: HashMap::new(),
            frame: FrameLayout::new(),
            current_return: PrimitiveType::Void,
        }
    }

    /// Analyze a translation unit
    pub fn analyze(&mut self, unit: &TranslationUnit) -> Result<TypedTranslationUnit, CompilerError> {
        let mut typed = TypedTranslationUnit::default();

        for item in &unit.items {
            match item {
                TopLevelItem::Function(func) => self.declare_function(func)?,
                TopLevelItem::Declaration(decls) => {
                    for decl in decls {
                        typed.globals.push(self.declare_global(decl)?);
                    }
                }
            }
        }

        for item in &unit.items {
            if let TopLevelItem::Function(func) = item {
                if let Some(body) = &func.body {
                    typed.functions.push(self.analyze_function(func, body)?);
                }
            }
        }

        debug!(
            "semantic analysis: {} global(s), {} function(s)",
            typed.globals.len(),
            typed.functions.len()
        );
        Ok(typed)
    }

    fn declare_function(&mut self, func: &FunctionDefinition) -> Result<(), SemanticError> {
        let return_type = resolve_type(&func.return_type, &func.span)?;
        if return_type.is_array() {
            return Err(SemanticError::unsupported("functions returning arrays", &func.span));
        }
        let mut parameters = Vec::with_capacity(func.parameters.len());
        for param in &func.parameters {
            let ty = resolve_type(&param.param_type, &param.span)?;
            if ty.is_void() {
                return Err(SemanticError::unsupported(format!("void parameter '{}'", param.name), &param.span));
            }
            parameters.push(ty);
        }

        let signature = FunctionSignature {
            return_type,
            parameters,
            defined: func.body.is_some(),
        };
        let redefined = || SemanticError::RedefinedSymbol {
            name: func.name.clone(),
            span: func.span.clone(),
        };
        if self.symbols.lookup(&func.name).is_some() {
            return Err(redefined());
        }
        match self.functions.get_mut(&func.name) {
            // a prototype and a definition must agree
            Some(existing) => {
                let conflicting = existing.return_type != signature.return_type
                    || existing.parameters != signature.parameters
                    || (existing.defined && signature.defined);
                if conflicting {
                    return Err(redefined());
                }
                existing.defined |= signature.defined;
            }
            None => {
                self.functions.insert(func.name.clone(), signature);
            }
        }
        Ok(())
    }

    fn declare_global(&mut self, decl: &Declaration) -> Result<TypedGlobal, SemanticError> {
        let ty = resolve_type(&decl.decl_type, &decl.span)?;
        if ty.is_void() {
            return Err(SemanticError::unsupported(format!("void variable '{}'", decl.name), &decl.span));
        }
        if self.functions.contains_key(&decl.name) {
            return Err(SemanticError::RedefinedSymbol {
                name: decl.name.clone(),
                span: decl.span.clone(),
            });
        }
        let symbol = Symbol::global(decl.name.as_str(), ty);
        let initializer = match &decl.initializer {
            Some(init) => Some(constants::global_initializer(&decl.name, &ty, init)?),
            None => None,
        };
        self.symbols.declare(symbol.clone(), &decl.span)?;
        Ok(TypedGlobal {
            symbol,
            initializer,
            location: decl.span.start.clone(),
        })
    }

    fn analyze_function(&mut self, func: &FunctionDefinition, body: &Statement) -> Result<TypedFunction, SemanticError> {
        debug!("analyzing function {}", func.name);
        let signature = self
            .functions
            .get(&func.name)
            .cloned()
            .ok_or_else(|| SemanticError::UndefinedFunction {
                name: func.name.clone(),
                span: func.span.clone(),
            })?;
        self.current_return = signature.return_type;
        self.frame = FrameLayout::new();
        self.symbols.push_scope();

        let result = self.analyze_function_body(func, &signature, body);
        self.symbols.pop_scope();
        let (parameters, body) = result?;

        Ok(TypedFunction {
            info: FunctionInfo {
                name: func.name.clone(),
                return_type: signature.return_type,
                parameters: signature.parameters,
                stack_size: self.frame.stack_size(),
            },
            parameters,
            body,
            location: func.span.start.clone(),
        })
    }

    fn analyze_function_body(
        &mut self,
        func: &FunctionDefinition,
        signature: &FunctionSignature,
        body: &Statement,
    ) -> Result<(Vec<Symbol>, Vec<TypedStmt>), SemanticError> {
        let mut parameters = Vec::with_capacity(func.parameters.len());
        for (param, ty) in func.parameters.iter().zip(&signature.parameters) {
            let offset = self.frame.allocate(&param.name, ty, &param.span)?;
            let symbol = Symbol::local(param.name.as_str(), *ty, offset);
            self.symbols.declare(symbol.clone(), &param.span)?;
            parameters.push(symbol);
        }

        // the outermost block shares the parameter scope
        let statements = match &body.kind {
            StatementKind::Compound(statements) => statements.as_slice(),
            _ => std::slice::from_ref(body),
        };
        let body = statements
            .iter()
            .map(|stmt| self.analyze_statement(stmt))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((parameters, body))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;
    use xcc_common::{Address, CompilationContext, Initializer, ScalarType, Value};

    pub(crate) fn analyze_source(source: &str) -> Result<TypedTranslationUnit, CompilerError> {
        let mut ctx = CompilationContext::new();
        let tokens = Lexer::new(source, "test.c", &mut ctx).tokenize()?;
        let unit = Parser::new(tokens).parse_translation_unit()?;
        SemanticAnalyzer::new().analyze(&unit)
    }

    /// Analyze `body` as the body of `void f()` and return its statements.
    pub(crate) fn analyze_body(body: &str) -> Result<Vec<TypedStmt>, CompilerError> {
        let unit = analyze_source(&format!("void f() {{ {body} }}"))?;
        Ok(unit.functions.into_iter().next().map(|f| f.body).unwrap_or_default())
    }

    pub(crate) fn semantic_message(result: Result<impl std::fmt::Debug, CompilerError>) -> String {
        match result {
            Err(CompilerError::SemanticError { message, .. }) => message,
            other => panic!("expected a semantic error, got {other:?}"),
        }
    }

    #[test]
    fn test_function_frame_and_parameters() {
        let unit = analyze_source("int add(int a, long b) { char c; return a + b; }").unwrap();
        let func = &unit.functions[0];
        assert_eq!(func.info.parameters, vec![PrimitiveType::INT, PrimitiveType::LONG]);
        assert_eq!(
            func.parameters.iter().map(|p| p.address.clone()).collect::<Vec<_>>(),
            vec![Address::Frame(-4), Address::Frame(-16)]
        );
        assert_eq!(func.info.stack_size, 32);
    }

    #[test]
    fn test_call_before_definition() {
        let unit = analyze_source("int main() { return twice(2); } int twice(int x) { return x * 2; }").unwrap();
        assert_eq!(unit.functions.len(), 2);
    }

    #[test]
    fn test_prototype_must_match_definition() {
        let message = semantic_message(analyze_source("int f(int x); long f(int x) { return x; }"));
        assert!(message.contains("Redefinition"), "{message}");
        assert!(analyze_source("int f(int x); int f(int y) { return y; }").is_ok());
    }

    #[test]
    fn test_globals_are_collected_with_initializers() {
        let unit = analyze_source("int a[3] = {1, 2}; float scale = 2; char *msg = \"hi\";").unwrap();
        assert_eq!(unit.globals.len(), 3);
        assert_eq!(
            unit.globals[0].initializer,
            Some(Initializer::List(vec![
                Initializer::Value(Value::Int(1)),
                Initializer::Value(Value::Int(2)),
            ]))
        );
        assert_eq!(unit.globals[1].initializer, Some(Initializer::Value(Value::Float(2.0))));
        assert_eq!(unit.globals[2].symbol.ty, PrimitiveType::Pointer(ScalarType::Char));
    }

    #[test]
    fn test_duplicate_global() {
        let message = semantic_message(analyze_source("int x; long x;"));
        assert_eq!(message, "Redefinition of symbol: x");
    }

    #[test]
    fn test_parameter_redeclared_in_body() {
        assert!(analyze_source("int f(int x) { int x; return 0; }").is_err());
    }
}
