//! Lowering tests over complete programs

use crate::{generate, CodegenOptions, Lowering};
use indoc::indoc;
use pretty_assertions::assert_eq;
use xcc_codegen::{AssemblyCode, X86_64Code};
use xcc_common::{CompilationContext, CompilerError, SourceLocation, Value};
use xcc_frontend::Frontend;

fn compile(source: &str) -> Result<String, CompilerError> {
    let mut ctx = CompilationContext::new();
    let unit = Frontend::analyze_source(source, "test.c", &mut ctx)?;
    generate(&unit, &ctx, CodegenOptions::default())
}

/// Index of the first line equal to `needle`
fn line_of(asm: &str, needle: &str) -> usize {
    asm.lines()
        .position(|line| line == needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in:\n{asm}"))
}

fn count(asm: &str, needle: &str) -> usize {
    asm.lines().filter(|line| *line == needle).count()
}

#[test]
fn test_print_of_sum_releases_every_register() {
    let source = "int main() { int a = 3; int b = 4; print a + b; return 0; }";
    let mut ctx = CompilationContext::new();
    let unit = Frontend::analyze_source(source, "test.c", &mut ctx).unwrap();
    let mut code = X86_64Code::new(&ctx);
    Lowering::new(&mut code).lower_unit(&unit).unwrap();

    assert_eq!(code.net_allocations(), 0);
    assert_eq!(code.live_registers(), 0);
    let asm = code.output();
    assert!(line_of(&asm, "\tcall printint") > line_of(&asm, "main:"));
}

#[test]
fn test_while_loop_layout() {
    let asm = compile(indoc! {"
        int main() {
            int a = 0;
            while (a < 5) {
                a = a + 1;
            }
            return a;
        }
    "})
    .unwrap();

    assert_eq!(count(&asm, ".Lwhile0_start:"), 1);
    assert_eq!(count(&asm, ".Lwhile0_end:"), 1);
    let start = line_of(&asm, ".Lwhile0_start:");
    // the negated comparison branches out of the loop
    let exit = line_of(&asm, "\tjge .Lwhile0_end");
    let back = line_of(&asm, "\tjmp .Lwhile0_start");
    let end = line_of(&asm, ".Lwhile0_end:");
    assert!(start < exit && exit < back && back < end, "{asm}");
}

#[test]
fn test_if_else_layout() {
    let asm = compile(indoc! {"
        int main() {
            int x = 2;
            if (x == 1) print 1; else print 0;
            if (x) print x;
            return 0;
        }
    "})
    .unwrap();

    let branch = line_of(&asm, "\tjne .Lif0_false");
    let skip = line_of(&asm, "\tjmp .Lif0_end");
    let false_label = line_of(&asm, ".Lif0_false:");
    let end = line_of(&asm, ".Lif0_end:");
    assert!(branch < skip && skip < false_label && false_label < end, "{asm}");
    // a bare value is compared with zero
    assert!(line_of(&asm, ".Lif1_then:") > end);
}

#[test]
fn test_for_loop_runs_update_after_body() {
    let asm = compile(indoc! {"
        int main() {
            int total = 0;
            for (int i = 0; i < 10; i++) total += i;
            print total;
            return 0;
        }
    "})
    .unwrap();
    let start = line_of(&asm, ".Lfor0_start:");
    let back = line_of(&asm, "\tjmp .Lfor0_start");
    assert!(start < back);
    assert!(line_of(&asm, ".Lfor0_end:") > back);
}

#[test]
fn test_global_array_zero_fill() {
    let asm = compile("int a[3] = {1, 2};").unwrap();
    assert!(asm.contains("a:\n\t.long 1\n\t.long 2\n\t.zero 4\n"), "{asm}");
}

#[test]
fn test_constant_pools_precede_text() {
    let asm = compile(indoc! {r#"
        float half = 0.5;
        int main() {
            print 2.5;
            print "bye";
            return 0;
        }
    "#})
    .unwrap();
    let text = line_of(&asm, "\t.text");
    assert!(line_of(&asm, ".LF0:") < text);
    assert!(line_of(&asm, ".LS0:") < text);
    assert!(line_of(&asm, "half:") < text);
    assert!(line_of(&asm, "\tcall printfloat") > text);
    assert!(line_of(&asm, "\tcall printstring") > text);
}

#[test]
fn test_return_jumps_to_shared_epilogue() {
    let asm = compile(indoc! {"
        int sign(int x) {
            if (x < 0) return -1;
            return 1;
        }
    "})
    .unwrap();
    assert_eq!(count(&asm, "\tjmp .Lsign_return"), 2);
    assert_eq!(count(&asm, ".Lsign_return:"), 1);
}

#[test]
fn test_calls_with_several_arguments() {
    let asm = compile(indoc! {"
        float mix(int a, float b, long c) {
            return a * b + c;
        }
        int main() {
            print mix(1, 2.5, 3);
            return 0;
        }
    "})
    .unwrap();
    assert_eq!(count(&asm, "\tcall mix"), 1);
}

#[test]
fn test_void_call_statement() {
    let asm = compile(indoc! {"
        void show(int x) { print x; }
        int main() {
            show(4);
            return 0;
        }
    "})
    .unwrap();
    assert!(line_of(&asm, "\tcall show") > line_of(&asm, "main:"));
}

#[test]
fn test_logical_operators_short_circuit() {
    let asm = compile(indoc! {"
        int main() {
            int a = 1;
            int b = 0;
            long both = a && b;
            while (a > 5 || b) a = a - 1;
            print both;
            return 0;
        }
    "})
    .unwrap();
    let short = line_of(&asm, ".Land0_short:");
    assert!(line_of(&asm, "\tjmp .Land0_end") < short);
    assert!(line_of(&asm, ".Land0_end:") > short);
    // `||` as a loop condition branches into the body directly
    assert!(line_of(&asm, ".Lor0_true:") > line_of(&asm, ".Lwhile0_start:"));
}

#[test]
fn test_arrays_and_pointers() {
    let asm = compile(indoc! {r#"
        int main() {
            int values[4] = {3, 1};
            float weights[2];
            char name[8] = "xcc";
            int *p = values;
            p[2] = *p + 1;
            weights[1] = 0.5;
            print values;
            print weights;
            print name;
            print p;
            return 0;
        }
    "#})
    .unwrap();
    assert_eq!(count(&asm, "\tcall printarray"), 1);
    assert_eq!(count(&asm, "\tcall printfloatarray"), 1);
    assert_eq!(count(&asm, "\tcall printstring"), 1);
    assert_eq!(count(&asm, "\tcall printlong"), 1);
}

#[test]
fn test_local_float_array_is_zero_filled() {
    assert!(compile("int main() { float v[3] = {1.5}; print v; return 0; }").is_ok());
}

#[test]
fn test_unprintable_value_reports_location() {
    let source = indoc! {"
        int main() {
            long big[2];
            print big;
            return 0;
        }
    "};
    match compile(source) {
        Err(CompilerError::CodegenError { location, message }) => {
            assert_eq!(location.line, 3);
            assert!(message.contains("print"), "{message}");
        }
        other => panic!("expected a codegen error, got {other:?}"),
    }
}

#[test]
fn test_float_condition_branches_to_true_label() {
    let asm = compile(indoc! {"
        int main() {
            float x = 1.5;
            if (x < 2.0) print 1;
            return 0;
        }
    "})
    .unwrap();
    // `!(x < 2.0)` also holds for NaN, so the walker never negates
    let taken = line_of(&asm, "\tja .Lfcmp0_true");
    let skip = line_of(&asm, "\tjmp .Lif0_false");
    let true_label = line_of(&asm, ".Lfcmp0_true:");
    assert!(taken < skip && skip < true_label, "{asm}");
    assert!(true_label < line_of(&asm, ".Lif0_then:"));
    assert!(!asm.contains("\tjae .Lif0_false"));
}

#[test]
fn test_statement_boundary_follows_leak_policy() {
    let ctx = CompilationContext::new();
    let location = SourceLocation::new("test.c", 4, 5);

    let mut lenient = X86_64Code::new(&ctx).with_strict_registers(false);
    lenient.load_immediate(&Value::Int(7)).unwrap();
    Lowering::new(&mut lenient).check_statement_boundary(&location).unwrap();
    assert_eq!(lenient.live_registers(), 0);

    let mut strict = X86_64Code::new(&ctx);
    strict.load_immediate(&Value::Int(7)).unwrap();
    match Lowering::new(&mut strict).check_statement_boundary(&location) {
        Err(CompilerError::CodegenError { location, message }) => {
            assert_eq!(location.line, 4);
            assert!(message.contains("still live"), "{message}");
        }
        other => panic!("expected a leak error, got {other:?}"),
    }
}

#[test]
fn test_frame_beyond_displacement_range_is_rejected() {
    let source = indoc! {"
        int main() {
            int a[600000000];
            a[0] = 1;
            return 0;
        }
    "};
    match compile(source) {
        Err(err @ CompilerError::SemanticError { .. }) => {
            assert_eq!(err.stage(), "semantic analysis");
            assert!(err.to_string().contains("stack frame too large"), "{err}");
        }
        other => panic!("expected a semantic error, got {other:?}"),
    }
}
