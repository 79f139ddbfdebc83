use indoc::indoc;
use pretty_assertions::assert_eq;
use xcc_common::{Address, CompilationContext, CompilerError, PrimitiveType, ScalarType, SourceLocation};
use xcc_frontend::{Frontend, LValue, TypedExpr, TypedStmt};

#[test]
fn test_program_with_globals_and_functions() {
    let source = indoc! {r#"
        int counts[3] = {1, 2};
        float scale = 0.5;

        float scaled(int n) {
            return n * scale;
        }

        int main() {
            int i;
            for (i = 0; i < 3; i++) {
                print scaled(counts[i]);
            }
            print "done";
            return 0;
        }
    "#};
    let mut ctx = CompilationContext::new();
    let unit = Frontend::analyze_source(source, "prog.c", &mut ctx).unwrap();

    assert_eq!(unit.globals.len(), 2);
    assert_eq!(unit.globals[0].symbol.address, Address::Global("counts".to_string()));
    assert_eq!(unit.functions.len(), 2);
    assert_eq!(unit.functions[0].info.return_type, PrimitiveType::FLOAT);
    assert_eq!(unit.functions[1].info.stack_size, 16);

    // literals were pooled while scanning
    assert_eq!(ctx.float_label(0.5), Some(".LF0"));
    assert_eq!(ctx.string_label("done"), Some(".LS0"));
}

#[test]
fn test_parameters_are_locals() {
    let source = indoc! {"
        long sum(long *values, int n) {
            long total = 0;
            while (n > 0) {
                n = n - 1;
                total += values[n];
            }
            return total;
        }
    "};
    let mut ctx = CompilationContext::new();
    let unit = Frontend::analyze_source(source, "sum.c", &mut ctx).unwrap();
    let func = &unit.functions[0];
    assert_eq!(func.parameters[0].ty, PrimitiveType::Pointer(ScalarType::Long));
    assert_eq!(func.parameters[1].address, Address::Frame(-12));

    let TypedStmt::While { body, .. } = &func.body[1] else {
        panic!("expected a while loop");
    };
    let TypedStmt::Block(stmts) = body.as_ref() else {
        panic!("expected a block");
    };
    let TypedStmt::Expression {
        expr: TypedExpr::Assign { target, value },
        ..
    } = &stmts[1]
    else {
        panic!("expected a compound assignment");
    };
    assert!(matches!(target, LValue::Variable(symbol) if symbol.name == "total"));
    assert_eq!(value.ty(), PrimitiveType::LONG);
}

#[test]
fn test_error_location_is_reported() {
    let source = indoc! {"
        int main() {
            int x;
            x = y;
            return 0;
        }
    "};
    let mut ctx = CompilationContext::new();
    match Frontend::analyze_source(source, "bad.c", &mut ctx) {
        Err(CompilerError::SemanticError { span, message }) => {
            assert_eq!(span.start, SourceLocation::new("bad.c", 3, 9));
            assert_eq!(message, "Undefined variable: y");
        }
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

#[test]
fn test_ast_serializes_to_json() {
    let mut ctx = CompilationContext::new();
    let ast = Frontend::parse_source("int x = 1;", "x.c", &mut ctx).unwrap();
    let json = serde_json::to_string(&ast).unwrap();
    assert!(json.contains("\"name\":\"x\""), "{json}");
}
