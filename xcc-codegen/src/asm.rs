//! x86-64 Assembly Instruction Definitions
//!
//! A typed subset of the AT&T-syntax instruction set that the code
//! generator emits. Each variant renders to one line of GNU `as` input via
//! `Display`; operands are written source first, destination last.

use std::fmt;

/// Operand width, rendered as the AT&T mnemonic suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Long,
    Quad,
}

impl Width {
    pub fn suffix(self) -> char {
        match self {
            Width::Byte => 'b',
            Width::Long => 'l',
            Width::Quad => 'q',
        }
    }
}

/// An instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A register, by its AT&T name (`%rbx`, `%r12d`, `%xmm8`)
    Reg(&'static str),
    Imm(i64),
    /// A memory addressing expression (`-8(%rbp)`, `g(%rip)`)
    Mem(String),
}

impl Operand {
    /// Memory operand addressed through a register: `(%rbx)`
    pub fn indirect(reg: &'static str) -> Operand {
        Operand::Mem(format!("({reg})"))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(name) => write!(f, "{name}"),
            Operand::Imm(v) => write!(f, "${v}"),
            Operand::Mem(addr) => write!(f, "{addr}"),
        }
    }
}

/// Condition codes used by `setcc` and `jcc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    E,
    Ne,
    L,
    Le,
    G,
    Ge,
    A,
    Ae,
    B,
    Be,
    /// Parity set: the last `ucomisd` was unordered (a NaN operand)
    P,
    Np,
}

impl Cond {
    pub fn negate(self) -> Cond {
        match self {
            Cond::E => Cond::Ne,
            Cond::Ne => Cond::E,
            Cond::L => Cond::Ge,
            Cond::Ge => Cond::L,
            Cond::Le => Cond::G,
            Cond::G => Cond::Le,
            Cond::A => Cond::Be,
            Cond::Be => Cond::A,
            Cond::Ae => Cond::B,
            Cond::B => Cond::Ae,
            Cond::P => Cond::Np,
            Cond::Np => Cond::P,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Cond::E => "e",
            Cond::Ne => "ne",
            Cond::L => "l",
            Cond::Le => "le",
            Cond::G => "g",
            Cond::Ge => "ge",
            Cond::A => "a",
            Cond::Ae => "ae",
            Cond::B => "b",
            Cond::Be => "be",
            Cond::P => "p",
            Cond::Np => "np",
        }
    }
}

/// Two-operand integer ALU instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alu {
    Add,
    Sub,
    Imul,
    And,
    Or,
    Xor,
    Cmp,
    Test,
}

/// Scalar double-precision SSE instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sse {
    Movsd,
    Addsd,
    Subsd,
    Mulsd,
    Divsd,
    Ucomisd,
    Xorpd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    Mov(Width, Operand, Operand),
    /// 64-bit immediate load, for constants outside the sign-extended 32-bit range
    Movabs(i64, Operand),
    /// Zero-extending move, `movz{from}{to}`
    MovZx(Width, Width, Operand, Operand),
    /// Sign-extending move, `movs{from}{to}`
    MovSx(Width, Width, Operand, Operand),
    Lea(Operand, Operand),
    Alu(Alu, Width, Operand, Operand),
    Shl(Width, Operand, Operand),
    Sar(Width, Operand, Operand),
    Neg(Width, Operand),
    Not(Width, Operand),
    Inc(Width, Operand),
    Dec(Width, Operand),
    Idiv(Width, Operand),
    /// Sign-extend `%rax` into `%rdx:%rax`
    Cqo,
    Set(Cond, Operand),
    Sse(Sse, Operand, Operand),
    Cvtsi2sd(Width, Operand, Operand),
    Cvttsd2si(Width, Operand, Operand),
    Push(Operand),
    Pop(Operand),
    Jmp(String),
    Jcc(Cond, String),
    Call(String),
    Leave,
    Ret,

    Label(String),
    /// Assembler directive, emitted verbatim after a tab (`.data`, `.long 5`)
    Directive(String),
    Comment(String),
}

impl fmt::Display for Alu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alu::Add => "add",
            Alu::Sub => "sub",
            Alu::Imul => "imul",
            Alu::And => "and",
            Alu::Or => "or",
            Alu::Xor => "xor",
            Alu::Cmp => "cmp",
            Alu::Test => "test",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Sse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sse::Movsd => "movsd",
            Sse::Addsd => "addsd",
            Sse::Subsd => "subsd",
            Sse::Mulsd => "mulsd",
            Sse::Divsd => "divsd",
            Sse::Ucomisd => "ucomisd",
            Sse::Xorpd => "xorpd",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmInst::Mov(w, src, dst) => write!(f, "\tmov{} {src}, {dst}", w.suffix()),
            AsmInst::Movabs(imm, dst) => write!(f, "\tmovabsq ${imm}, {dst}"),
            AsmInst::MovZx(from, to, src, dst) => {
                write!(f, "\tmovz{}{} {src}, {dst}", from.suffix(), to.suffix())
            }
            AsmInst::MovSx(from, to, src, dst) => {
                write!(f, "\tmovs{}{} {src}, {dst}", from.suffix(), to.suffix())
            }
            AsmInst::Lea(src, dst) => write!(f, "\tleaq {src}, {dst}"),
            AsmInst::Alu(op, w, src, dst) => write!(f, "\t{op}{} {src}, {dst}", w.suffix()),
            AsmInst::Shl(w, count, dst) => write!(f, "\tshl{} {count}, {dst}", w.suffix()),
            AsmInst::Sar(w, count, dst) => write!(f, "\tsar{} {count}, {dst}", w.suffix()),
            AsmInst::Neg(w, dst) => write!(f, "\tneg{} {dst}", w.suffix()),
            AsmInst::Not(w, dst) => write!(f, "\tnot{} {dst}", w.suffix()),
            AsmInst::Inc(w, dst) => write!(f, "\tinc{} {dst}", w.suffix()),
            AsmInst::Dec(w, dst) => write!(f, "\tdec{} {dst}", w.suffix()),
            AsmInst::Idiv(w, divisor) => write!(f, "\tidiv{} {divisor}", w.suffix()),
            AsmInst::Cqo => write!(f, "\tcqo"),
            AsmInst::Set(cond, dst) => write!(f, "\tset{} {dst}", cond.suffix()),
            AsmInst::Sse(op, src, dst) => write!(f, "\t{op} {src}, {dst}"),
            AsmInst::Cvtsi2sd(w, src, dst) => write!(f, "\tcvtsi2sd{} {src}, {dst}", w.suffix()),
            AsmInst::Cvttsd2si(w, src, dst) => {
                write!(f, "\tcvttsd2si{} {src}, {dst}", w.suffix())
            }
            AsmInst::Push(src) => write!(f, "\tpushq {src}"),
            AsmInst::Pop(dst) => write!(f, "\tpopq {dst}"),
            AsmInst::Jmp(label) => write!(f, "\tjmp {label}"),
            AsmInst::Jcc(cond, label) => write!(f, "\tj{} {label}", cond.suffix()),
            AsmInst::Call(target) => write!(f, "\tcall {target}"),
            AsmInst::Leave => write!(f, "\tleave"),
            AsmInst::Ret => write!(f, "\tret"),
            AsmInst::Label(name) => write!(f, "{name}:"),
            AsmInst::Directive(text) => write!(f, "\t{text}"),
            AsmInst::Comment(text) => write!(f, "\t# {text}"),
        }
    }
}

/// Render a sequence of instructions, one per line.
pub fn emit_instructions(instructions: &[AsmInst]) -> String {
    let mut out = String::new();
    for inst in instructions {
        out.push_str(&inst.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instruction_rendering() {
        let insts = vec![
            AsmInst::Label("main".to_string()),
            AsmInst::Mov(Width::Quad, Operand::Imm(3), Operand::Reg("%rbx")),
            AsmInst::MovSx(Width::Long, Width::Quad, Operand::Mem("-4(%rbp)".into()), Operand::Reg("%r12")),
            AsmInst::Alu(Alu::Add, Width::Quad, Operand::Reg("%r12"), Operand::Reg("%rbx")),
            AsmInst::Sse(Sse::Ucomisd, Operand::Reg("%xmm9"), Operand::Reg("%xmm8")),
            AsmInst::Jcc(Cond::Be, ".Lif0_false".to_string()),
            AsmInst::Directive(".long 7".to_string()),
        ];
        let text = emit_instructions(&insts);
        assert_eq!(
            text,
            "main:\n\tmovq $3, %rbx\n\tmovslq -4(%rbp), %r12\n\taddq %r12, %rbx\n\tucomisd %xmm9, %xmm8\n\tjbe .Lif0_false\n\t.long 7\n"
        );
    }

    #[test]
    fn test_condition_negation_is_involutive() {
        for cond in [Cond::E, Cond::Ne, Cond::L, Cond::Le, Cond::G, Cond::Ge, Cond::A, Cond::Ae, Cond::B, Cond::Be, Cond::P, Cond::Np] {
            assert_eq!(cond.negate().negate(), cond);
            assert_ne!(cond.negate(), cond);
        }
    }

    #[test]
    fn test_indirect_operand() {
        assert_eq!(Operand::indirect("%rbx").to_string(), "(%rbx)");
        assert_eq!(AsmInst::Set(Cond::A, Operand::Reg("%bl")).to_string(), "\tseta %bl");
    }
}
