//! Statement lowering

use super::{located, Lowering};
use log::trace;
use xcc_codegen::{return_label, AssemblyCode, CodegenError, Reg};
use xcc_common::{CompilerError, LabelGenerator, PrimitiveType, ScalarType, SourceLocation, Symbol, Value};
use xcc_frontend::{LocalInit, TypedExpr, TypedStmt};

impl<C: AssemblyCode> Lowering<'_, C> {
    pub(super) fn lower_statement(&mut self, stmt: &TypedStmt) -> Result<(), CompilerError> {
        match stmt {
            TypedStmt::Block(stmts) => {
                for stmt in stmts {
                    self.lower_statement(stmt)?;
                }
                Ok(())
            }
            TypedStmt::Print { value, location } => {
                located(self.lower_print(value), location)?;
                self.check_statement_boundary(location)
            }
            TypedStmt::Declaration {
                symbol,
                initializer,
                location,
            } => {
                if let Some(init) = initializer {
                    located(self.lower_local_init(symbol, init), location)?;
                }
                self.check_statement_boundary(location)
            }
            TypedStmt::Expression { expr, location } => {
                located(self.discard(expr), location)?;
                self.check_statement_boundary(location)
            }
            TypedStmt::If {
                condition,
                then_stmt,
                else_stmt,
                location,
            } => self.lower_if(condition, then_stmt, else_stmt.as_deref(), location),
            TypedStmt::While {
                condition,
                body,
                location,
            } => self.lower_loop("while", None, Some(condition), None, body, location),
            TypedStmt::For {
                init,
                condition,
                update,
                body,
                location,
            } => self.lower_loop("for", init.as_deref(), condition.as_ref(), update.as_ref(), body, location),
            TypedStmt::Return { value, location } => {
                located(self.lower_return(value.as_ref()), location)?;
                self.check_statement_boundary(location)
            }
            TypedStmt::Empty => Ok(()),
        }
    }

    fn lower_if(
        &mut self,
        condition: &TypedExpr,
        then_stmt: &TypedStmt,
        else_stmt: Option<&TypedStmt>,
        location: &SourceLocation,
    ) -> Result<(), CompilerError> {
        let id = self.labels.next_id("if");
        let [then_label, false_label, end_label] =
            ["then", "false", "end"].map(|role| LabelGenerator::label("if", id, role));
        trace!("if {id} at {location}");

        located(self.lower_condition(condition, &false_label), location)?;
        self.code.label(&then_label);
        self.lower_statement(then_stmt)?;
        self.code.jump(&end_label);
        self.code.label(&false_label);
        if let Some(else_stmt) = else_stmt {
            self.lower_statement(else_stmt)?;
        }
        self.code.label(&end_label);
        Ok(())
    }

    /// `while` and `for` share one skeleton; `for` adds the init before
    /// the start label and the update after the body.
    fn lower_loop(
        &mut self,
        kind: &'static str,
        init: Option<&TypedStmt>,
        condition: Option<&TypedExpr>,
        update: Option<&TypedExpr>,
        body: &TypedStmt,
        location: &SourceLocation,
    ) -> Result<(), CompilerError> {
        if let Some(init) = init {
            self.lower_statement(init)?;
        }
        let id = self.labels.next_id(kind);
        let start = LabelGenerator::label(kind, id, "start");
        let end = LabelGenerator::label(kind, id, "end");
        trace!("{kind} {id} at {location}");

        self.code.label(&start);
        if let Some(condition) = condition {
            located(self.lower_condition(condition, &end), location)?;
        }
        self.lower_statement(body)?;
        if let Some(update) = update {
            located(self.discard(update), location)?;
        }
        self.code.jump(&start);
        self.code.label(&end);
        self.check_statement_boundary(location)
    }

    fn lower_return(&mut self, value: Option<&TypedExpr>) -> Result<(), CodegenError> {
        let function = self
            .function
            .as_ref()
            .ok_or_else(|| CodegenError::InvalidUsage("return outside of a function".to_string()))?;
        let (name, return_type) = (function.name.clone(), function.return_type);
        if let Some(value) = value {
            let reg = self.lower_expr(value)?;
            self.code.return_value(reg, return_type)?;
        }
        self.code.jump(&return_label(&name));
        Ok(())
    }

    fn lower_local_init(&mut self, symbol: &Symbol, init: &LocalInit) -> Result<(), CodegenError> {
        match init {
            LocalInit::Scalar(value) => {
                let reg = self.lower_expr(value)?;
                self.code.store_symbol(reg, symbol)?;
                self.code.free(reg)
            }
            LocalInit::Elements(elements) => {
                let PrimitiveType::Array { element, length } = symbol.ty else {
                    return Err(CodegenError::unsupported_type("element initializer", symbol.ty));
                };
                for (index, value) in elements.iter().enumerate() {
                    let reg = self.lower_expr(value)?;
                    self.code.store_element(reg, symbol, index)?;
                    self.code.free(reg)?;
                }
                if elements.len() < length {
                    // the remaining elements are zeroed from one register
                    let zero = self.zero(element)?;
                    for index in elements.len()..length {
                        self.code.store_element(zero, symbol, index)?;
                    }
                    self.code.free(zero)?;
                }
                Ok(())
            }
        }
    }

    fn zero(&mut self, element: ScalarType) -> Result<Reg, CodegenError> {
        match element {
            // floats are not immediates; convert an integer zero instead
            ScalarType::Float => {
                let reg = self.code.load_immediate(&Value::Long(0))?;
                self.code.convert(reg, ScalarType::Long, ScalarType::Float)
            }
            ScalarType::Char => self.code.load_immediate(&Value::Char(0)),
            ScalarType::Int => self.code.load_immediate(&Value::Int(0)),
            ScalarType::Long => self.code.load_immediate(&Value::Long(0)),
        }
    }

    /// Pick the runtime print routine for the value's type.
    fn lower_print(&mut self, value: &TypedExpr) -> Result<(), CodegenError> {
        let ty = value.ty();
        if let PrimitiveType::Array { element, length } = ty {
            let routine = match element {
                ScalarType::Int => "printarray",
                ScalarType::Float => "printfloatarray",
                ScalarType::Char => "printstring",
                ScalarType::Long => return Err(CodegenError::unsupported_type("print", ty)),
            };
            let address = self.lower_expr(value)?;
            if element == ScalarType::Char {
                self.code.call_function(routine, Some(address), PrimitiveType::Void)?;
            } else {
                self.code.print_array(address, routine, length)?;
            }
            return Ok(());
        }

        let routine = match ty {
            PrimitiveType::Scalar(ScalarType::Int) => "printint",
            PrimitiveType::Scalar(ScalarType::Char) => "printchar",
            PrimitiveType::Scalar(ScalarType::Long) => "printlong",
            PrimitiveType::Scalar(ScalarType::Float) => "printfloat",
            PrimitiveType::Pointer(ScalarType::Char) => "printstring",
            PrimitiveType::Pointer(_) => "printlong",
            _ => return Err(CodegenError::unsupported_type("print", ty)),
        };
        let reg = self.lower_expr(value)?;
        self.code.call_function(routine, Some(reg), PrimitiveType::Void)?;
        Ok(())
    }
}
