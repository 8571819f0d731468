//! Assembly text primitives, Intel syntax.
//!
//! Pure mappings from enum values and operands to their textual forms.
//! No state lives here; the code generator composes these into lines.

use std::fmt;

/// x86-64 registers, all widths that the generator touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    // 64-bit
    Rax,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    Rbp,
    Rsp,
    Rip,
    R8,
    R9,
    // 32-bit
    Eax,
    Ecx,
    Edx,
    Esi,
    Edi,
    R8d,
    R9d,
    // 16-bit
    Ax,
    Cx,
    Dx,
    Si,
    Di,
    R8w,
    R9w,
    // 8-bit
    Al,
    Cl,
    Dl,
    Sil,
    Dil,
    R8b,
    R9b,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Register::*;
        let name = match self {
            Rax => "rax",
            Rcx => "rcx",
            Rdx => "rdx",
            Rsi => "rsi",
            Rdi => "rdi",
            Rbp => "rbp",
            Rsp => "rsp",
            Rip => "rip",
            R8 => "r8",
            R9 => "r9",
            Eax => "eax",
            Ecx => "ecx",
            Edx => "edx",
            Esi => "esi",
            Edi => "edi",
            R8d => "r8d",
            R9d => "r9d",
            Ax => "ax",
            Cx => "cx",
            Dx => "dx",
            Si => "si",
            Di => "di",
            R8w => "r8w",
            R9w => "r9w",
            Al => "al",
            Cl => "cl",
            Dl => "dl",
            Sil => "sil",
            Dil => "dil",
            R8b => "r8b",
            R9b => "r9b",
        };
        f.write_str(name)
    }
}

/// System-V integer argument registers, 64-bit width.
pub const ARG_REGISTERS64: [Register; 6] = [
    Register::Rdi,
    Register::Rsi,
    Register::Rdx,
    Register::Rcx,
    Register::R8,
    Register::R9,
];

/// System-V integer argument registers, 32-bit width.
pub const ARG_REGISTERS32: [Register; 6] = [
    Register::Edi,
    Register::Esi,
    Register::Edx,
    Register::Ecx,
    Register::R8d,
    Register::R9d,
];

/// System-V integer argument registers, 16-bit width.
pub const ARG_REGISTERS16: [Register; 6] = [
    Register::Di,
    Register::Si,
    Register::Dx,
    Register::Cx,
    Register::R8w,
    Register::R9w,
];

/// System-V integer argument registers, 8-bit width.
pub const ARG_REGISTERS8: [Register; 6] = [
    Register::Dil,
    Register::Sil,
    Register::Dl,
    Register::Cl,
    Register::R8b,
    Register::R9b,
];

/// Instruction mnemonics the generator emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpCode {
    Mov,
    Movzx,
    Movsbq,
    Movswq,
    Movsxd,
    Lea,
    Add,
    Sub,
    Imul,
    Idiv,
    Cqo,
    Neg,
    Cmp,
    Sete,
    Setne,
    Setl,
    Setle,
    Setg,
    Setge,
    Push,
    Pop,
    Call,
    Ret,
    Jmp,
    Je,
    Syscall,
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use OpCode::*;
        let name = match self {
            Mov => "mov",
            Movzx => "movzx",
            Movsbq => "movsbq",
            Movswq => "movswq",
            Movsxd => "movsxd",
            Lea => "lea",
            Add => "add",
            Sub => "sub",
            Imul => "imul",
            Idiv => "idiv",
            Cqo => "cqo",
            Neg => "neg",
            Cmp => "cmp",
            Sete => "sete",
            Setne => "setne",
            Setl => "setl",
            Setle => "setle",
            Setg => "setg",
            Setge => "setge",
            Push => "push",
            Pop => "pop",
            Call => "call",
            Ret => "ret",
            Jmp => "jmp",
            Je => "je",
            Syscall => "syscall",
        };
        f.write_str(name)
    }
}

/// Output sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Text,
    Data,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Text => ".text",
            Section::Data => ".data",
        })
    }
}

/// Data-emission directives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataDirective {
    Zero,
    Byte,
}

impl fmt::Display for DataDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataDirective::Zero => ".zero",
            DataDirective::Byte => ".byte",
        })
    }
}

/// Symbol-visibility directives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkerDirective {
    Globl,
}

impl fmt::Display for LinkerDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkerDirective::Globl => ".globl",
        })
    }
}

/// A `[base]` or `[base ± disp]` memory operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address {
    pub base: Register,
    pub disp: i64,
}

impl Address {
    pub fn new(base: Register) -> Self {
        Self { base, disp: 0 }
    }

    pub fn with_disp(base: Register, disp: i64) -> Self {
        Self { base, disp }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disp == 0 {
            write!(f, "[{}]", self.base)
        } else if self.disp > 0 {
            write!(f, "[{} + {}]", self.base, self.disp)
        } else {
            write!(f, "[{} - {}]", self.base, -self.disp)
        }
    }
}

/// One instruction operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand<'a> {
    Reg(Register),
    Imm(i64),
    Mem(Address),
    /// Memory operand with an explicit 32-bit width, as needed by the
    /// sign-extending `movsxd` load.
    MemDword(Address),
    /// RIP-relative symbol reference, `[rip + symbol]`.
    Rip(&'a str),
    /// Bare symbol, for `call` and `jmp` targets.
    Sym(&'a str),
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(value) => write!(f, "{value}"),
            Operand::Mem(addr) => write!(f, "{addr}"),
            Operand::MemDword(addr) => write!(f, "dword ptr {addr}"),
            Operand::Rip(symbol) => write!(f, "[{} + {}]", Register::Rip, symbol),
            Operand::Sym(symbol) => f.write_str(symbol),
        }
    }
}

/// Formats `<op> <operand>, <operand>, …`.
pub fn insn(op: OpCode, operands: &[Operand]) -> String {
    let mut text = op.to_string();
    for (i, operand) in operands.iter().enumerate() {
        if i == 0 {
            text.push(' ');
        } else {
            text.push_str(", ");
        }
        text.push_str(&operand.to_string());
    }
    text
}

/// `.L.<prefix>.<id>` — control-flow labels.
pub fn make_label(prefix: &str, id: u64) -> String {
    format!(".L.{prefix}.{id}")
}

/// `.L.<prefix>.<name>` — per-function labels.
pub fn make_named_label(prefix: &str, name: &str) -> String {
    format!(".L.{prefix}.{name}")
}

/// Assembler directive text.
pub mod directive {
    use super::{DataDirective, LinkerDirective};

    pub fn globl(symbol: &str) -> String {
        format!("{} {}", LinkerDirective::Globl, symbol)
    }

    pub fn zero(size: i64) -> String {
        format!("{} {}", DataDirective::Zero, size)
    }

    pub fn byte(value: u8) -> String {
        format!("{} {}", DataDirective::Byte, value)
    }

    /// DWARF line marker; the file number is always 1.
    pub fn loc(line: u32) -> String {
        format!(".loc 1 {line}")
    }

    pub fn file(name: &str) -> String {
        format!(".file 1 \"{name}\"")
    }
}
