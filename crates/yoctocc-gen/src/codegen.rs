//! The code generator.
//!
//! Walks the typed program chain once. Every expression leaves its value
//! in RAX; binary operations evaluate right-then-left through the stack;
//! lvalues are computed as addresses in RAX and then loaded or stored
//! with the width of their type. Control flow is lowered to uniquely
//! numbered `.L.begin/.L.else/.L.end` labels, and each function gets a
//! single `.L.return.<name>` epilogue label that `return` jumps to.

use yoctocc_par::{BinOp, Expr, ExprKind, Obj, Program, Stmt, StmtKind, Type, TypeKind, UnOp};
use yoctocc_util::{align_to, Diagnostic, Result};

use crate::asm::{
    directive, insn, make_label, make_named_label, Address, OpCode, Operand, Register, Section,
    ARG_REGISTERS16, ARG_REGISTERS32, ARG_REGISTERS64, ARG_REGISTERS8,
};
use OpCode::*;
use Operand::{Imm, Mem, MemDword, Reg, Rip, Sym};
use Register::{Al, Ax, Eax, Rax, Rbp, Rdi, Rsp};

const STACK_ALIGNMENT: i64 = 16;

/// Generates the assembly for `program` as a list of output lines
/// (without trailing newlines).
///
/// Local variable offsets and frame sizes are assigned as a first step,
/// so `program` is borrowed mutably; generation itself only reads.
///
/// # Example
///
/// ```
/// use yoctocc_gen::generate;
/// use yoctocc_lex::tokenize;
/// use yoctocc_par::parse;
///
/// let tokens = tokenize("int main() { return 42; }").unwrap();
/// let mut program = parse(&tokens).unwrap();
/// let lines = generate(&mut program, "t.c").unwrap();
/// assert!(lines.contains(&"    mov rax, 42".to_string()));
/// ```
pub fn generate(program: &mut Program, file_name: &str) -> Result<Vec<String>> {
    assign_local_offsets(program);

    let generator = Generator {
        program,
        lines: Vec::new(),
        label_count: 0,
        current_fn: "",
    };
    generator.run(file_name)
}

/// Walks each function's locals, reserving `size` bytes per local below
/// RBP, and rounds the frame up to the ABI stack alignment.
fn assign_local_offsets(program: &mut Program) {
    for i in 0..program.objs.len() {
        if !program.objs[i].is_function {
            continue;
        }
        let locals = program.objs[i].locals.clone();
        let mut offset = 0;
        for id in locals {
            offset += program.objs[id.index()].ty.size;
            program.objs[id.index()].offset = -offset;
        }
        program.objs[i].stack_size = align_to(offset, STACK_ALIGNMENT);
    }
}

struct Generator<'a> {
    program: &'a Program,
    lines: Vec<String>,
    /// Monotonic counter keeping `.L.begin/.else/.end` suffixes unique
    /// within one translation unit.
    label_count: u64,
    /// Name of the function being generated, for its return label.
    current_fn: &'a str,
}

impl<'a> Generator<'a> {
    fn run(mut self, file_name: &str) -> Result<Vec<String>> {
        self.raw(".intel_syntax noprefix");
        self.emit(directive::file(file_name));
        self.emit_data();
        self.emit_text()?;
        self.raw(".section .note.GNU-stack,\"\",%progbits");
        Ok(self.lines)
    }

    // ------------------------------------------------------------------
    // Line plumbing: labels and section markers are flush-left, every
    // instruction and directive is indented.
    // ------------------------------------------------------------------

    fn raw(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn emit(&mut self, line: String) {
        self.lines.push(format!("    {line}"));
    }

    fn label(&mut self, name: &str) {
        self.lines.push(format!("{name}:"));
    }

    fn insn(&mut self, op: OpCode, operands: &[Operand]) {
        self.emit(insn(op, operands));
    }

    fn next_label(&mut self) -> u64 {
        let count = self.label_count;
        self.label_count += 1;
        count
    }

    // ------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------

    fn emit_data(&mut self) {
        let program = self.program;
        let globals: Vec<&Obj> = program
            .objs
            .iter()
            .filter(|o| !o.is_function && !o.is_local)
            .collect();
        if globals.is_empty() {
            return;
        }

        self.raw(&Section::Data.to_string());
        for var in globals {
            self.emit(directive::globl(&var.name));
            self.label(&var.name);
            match &var.init_data {
                None => self.emit(directive::zero(var.ty.size)),
                Some(bytes) => {
                    debug_assert_eq!(bytes.len() as i64 + 1, var.ty.size);
                    for &byte in bytes {
                        self.emit(directive::byte(byte));
                    }
                    // implicit NUL terminator
                    self.emit(directive::byte(0));
                }
            }
        }
    }

    fn emit_text(&mut self) -> Result<()> {
        self.raw(&Section::Text.to_string());
        self.emit_start_stub();

        let program = self.program;
        for obj in program.objs.iter().filter(|o| o.is_function) {
            self.gen_function(obj)?;
        }
        Ok(())
    }

    /// The process entry point: call `main`, then the Linux `exit`
    /// syscall with `main`'s return value as the status.
    fn emit_start_stub(&mut self) {
        self.emit(directive::globl("_start"));
        self.label("_start");
        self.insn(Call, &[Sym("main")]);
        self.insn(Mov, &[Reg(Rdi), Reg(Rax)]);
        self.insn(Mov, &[Reg(Rax), Imm(60)]);
        self.insn(Syscall, &[]);
    }

    fn gen_function(&mut self, obj: &'a Obj) -> Result<()> {
        self.current_fn = &obj.name;

        self.emit(directive::globl(&obj.name));
        self.label(&obj.name);

        // Prologue
        self.insn(Push, &[Reg(Rbp)]);
        self.insn(Mov, &[Reg(Rbp), Reg(Rsp)]);
        if obj.stack_size > 0 {
            self.insn(Sub, &[Reg(Rsp), Imm(obj.stack_size)]);
        }

        // Spill incoming arguments into their stack slots, with the
        // register width matching the parameter size.
        if obj.params.len() > ARG_REGISTERS64.len() {
            let span = obj.body.as_ref().map(|b| b.span).unwrap_or_default();
            return Err(Diagnostic::new("too many function parameters", span));
        }
        let program = self.program;
        for (i, id) in obj.params.iter().enumerate() {
            let param = &program.objs[id.index()];
            let slot = Mem(Address::with_disp(Rbp, param.offset));
            let reg = match param.ty.size {
                1 => ARG_REGISTERS8[i],
                2 => ARG_REGISTERS16[i],
                4 => ARG_REGISTERS32[i],
                _ => ARG_REGISTERS64[i],
            };
            self.insn(Mov, &[slot, Reg(reg)]);
        }

        if let Some(body) = &obj.body {
            self.gen_stmt(body)?;
        }

        // Epilogue
        self.label(&make_named_label("return", &obj.name));
        self.insn(Mov, &[Reg(Rsp), Reg(Rbp)]);
        self.insn(Pop, &[Reg(Rbp)]);
        self.insn(Ret, &[]);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn gen_stmt(&mut self, stmt: &'a Stmt) -> Result<()> {
        self.emit(directive::loc(stmt.span.line));

        match &stmt.kind {
            StmtKind::If { cond, then, els } => {
                let count = self.next_label();
                let else_label = make_label("else", count);
                let end_label = make_label("end", count);

                self.gen_expr(cond)?;
                self.insn(Cmp, &[Reg(Rax), Imm(0)]);
                self.insn(Je, &[Sym(&else_label)]);
                self.gen_stmt(then)?;
                self.insn(Jmp, &[Sym(&end_label)]);
                self.label(&else_label);
                if let Some(els) = els {
                    self.gen_stmt(els)?;
                }
                self.label(&end_label);
                Ok(())
            }
            StmtKind::For {
                init,
                cond,
                inc,
                body,
            } => {
                let count = self.next_label();
                let begin_label = make_label("begin", count);
                let end_label = make_label("end", count);

                if let Some(init) = init {
                    self.gen_stmt(init)?;
                }
                self.label(&begin_label);
                if let Some(cond) = cond {
                    self.gen_expr(cond)?;
                    self.insn(Cmp, &[Reg(Rax), Imm(0)]);
                    self.insn(Je, &[Sym(&end_label)]);
                }
                self.gen_stmt(body)?;
                if let Some(inc) = inc {
                    self.gen_expr(inc)?;
                }
                self.insn(Jmp, &[Sym(&begin_label)]);
                self.label(&end_label);
                Ok(())
            }
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.gen_stmt(stmt)?;
                }
                Ok(())
            }
            StmtKind::Return(expr) => {
                self.gen_expr(expr)?;
                let target = make_named_label("return", self.current_fn);
                self.insn(Jmp, &[Sym(&target)]);
                Ok(())
            }
            StmtKind::ExprStmt(expr) => self.gen_expr(expr),
        }
    }

    // ------------------------------------------------------------------
    // Expressions: the result always ends up in RAX.
    // ------------------------------------------------------------------

    fn gen_expr(&mut self, expr: &'a Expr) -> Result<()> {
        self.emit(directive::loc(expr.span.line));

        match &expr.kind {
            ExprKind::Num(value) => {
                self.insn(Mov, &[Reg(Rax), Imm(*value)]);
                Ok(())
            }
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => {
                self.gen_expr(operand)?;
                self.insn(Neg, &[Reg(Rax)]);
                Ok(())
            }
            ExprKind::Var(_) | ExprKind::Member { .. } => {
                self.gen_addr(expr)?;
                let ty = self.expr_ty(expr)?;
                self.load(ty);
                Ok(())
            }
            ExprKind::Unary {
                op: UnOp::Addr,
                operand,
            } => self.gen_addr(operand),
            ExprKind::Unary {
                op: UnOp::Deref,
                operand,
            } => {
                self.gen_expr(operand)?;
                let ty = self.expr_ty(expr)?;
                self.load(ty);
                Ok(())
            }
            ExprKind::Assign { lhs, rhs } => {
                self.gen_addr(lhs)?;
                self.insn(Push, &[Reg(Rax)]);
                self.gen_expr(rhs)?;
                let ty = self.expr_ty(expr)?;
                self.store(ty);
                Ok(())
            }
            ExprKind::StmtExpr { body } => {
                for stmt in body {
                    self.gen_stmt(stmt)?;
                }
                Ok(())
            }
            ExprKind::Comma { lhs, rhs } => {
                self.gen_expr(lhs)?;
                self.gen_expr(rhs)
            }
            ExprKind::FuncCall { name, args } => {
                if args.len() > ARG_REGISTERS64.len() {
                    return Err(Diagnostic::new(
                        "too many function call arguments",
                        expr.span,
                    ));
                }
                for arg in args {
                    self.gen_expr(arg)?;
                    self.insn(Push, &[Reg(Rax)]);
                }
                for i in (0..args.len()).rev() {
                    self.insn(Pop, &[Reg(ARG_REGISTERS64[i])]);
                }
                self.insn(Mov, &[Reg(Rax), Imm(0)]);
                self.insn(Call, &[Sym(name)]);
                Ok(())
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.gen_expr(rhs)?;
                self.insn(Push, &[Reg(Rax)]);
                self.gen_expr(lhs)?;
                self.insn(Pop, &[Reg(Rdi)]);

                match op {
                    BinOp::Add => self.insn(Add, &[Reg(Rax), Reg(Rdi)]),
                    BinOp::Sub => self.insn(Sub, &[Reg(Rax), Reg(Rdi)]),
                    BinOp::Mul => self.insn(Imul, &[Reg(Rax), Reg(Rdi)]),
                    BinOp::Div => {
                        self.insn(Cqo, &[]);
                        self.insn(Idiv, &[Reg(Rdi)]);
                    }
                    BinOp::Eq => self.gen_compare(Sete),
                    BinOp::Ne => self.gen_compare(Setne),
                    BinOp::Lt => self.gen_compare(Setl),
                    BinOp::Le => self.gen_compare(Setle),
                    BinOp::Gt => self.gen_compare(Setg),
                    BinOp::Ge => self.gen_compare(Setge),
                }
                Ok(())
            }
        }
    }

    fn gen_compare(&mut self, set: OpCode) {
        self.insn(Cmp, &[Reg(Rax), Reg(Rdi)]);
        self.insn(set, &[Reg(Al)]);
        self.insn(Movzx, &[Reg(Rax), Reg(Al)]);
    }

    /// Computes the address of an lvalue into RAX.
    fn gen_addr(&mut self, expr: &'a Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Var(id) => {
                let program = self.program;
                let obj = &program.objs[id.index()];
                if obj.is_local {
                    self.insn(Lea, &[Reg(Rax), Mem(Address::with_disp(Rbp, obj.offset))]);
                } else {
                    self.insn(Lea, &[Reg(Rax), Rip(&obj.name)]);
                }
                Ok(())
            }
            ExprKind::Unary {
                op: UnOp::Deref,
                operand,
            } => self.gen_expr(operand),
            ExprKind::Member { base, member } => {
                self.gen_addr(base)?;
                self.insn(Add, &[Reg(Rax), Imm(member.offset)]);
                Ok(())
            }
            ExprKind::Comma { lhs, rhs } => {
                self.gen_expr(lhs)?;
                self.gen_addr(rhs)
            }
            _ => Err(Diagnostic::new("Not an lvalue", expr.span)),
        }
    }

    fn expr_ty(&self, expr: &'a Expr) -> Result<&'a Type> {
        match &expr.ty {
            Some(ty) => Ok(ty.as_ref()),
            None => Err(Diagnostic::new(
                "internal error: expression without a type",
                expr.span,
            )),
        }
    }

    /// Loads the value at the address in RAX, sign-extending to 64 bits.
    /// Arrays decay: the address itself is the value.
    fn load(&mut self, ty: &Type) {
        if ty.kind == TypeKind::Array {
            return;
        }
        match ty.size {
            1 => self.insn(Movsbq, &[Reg(Rax), Mem(Address::new(Rax))]),
            2 => self.insn(Movswq, &[Reg(Rax), Mem(Address::new(Rax))]),
            4 => self.insn(Movsxd, &[Reg(Rax), MemDword(Address::new(Rax))]),
            _ => self.insn(Mov, &[Reg(Rax), Mem(Address::new(Rax))]),
        }
    }

    /// Stores RAX to the address on the stack top, with the width of
    /// `ty`.
    fn store(&mut self, ty: &Type) {
        self.insn(Pop, &[Reg(Rdi)]);
        let src = match ty.size {
            1 => Al,
            2 => Ax,
            4 => Eax,
            _ => Rax,
        };
        self.insn(Mov, &[Mem(Address::new(Rdi)), Reg(src)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoctocc_lex::tokenize;
    use yoctocc_par::parse;

    fn compile(src: &str) -> Vec<String> {
        let tokens = tokenize(src).unwrap();
        let mut program = parse(&tokens).unwrap();
        generate(&mut program, "test.c").unwrap()
    }

    fn index_of(lines: &[String], needle: &str) -> usize {
        lines
            .iter()
            .position(|l| l.trim() == needle)
            .unwrap_or_else(|| panic!("missing line: {needle}"))
    }

    #[test]
    fn test_preamble_and_trailer() {
        let lines = compile("int main() { return 0; }");
        assert_eq!(lines[0], ".intel_syntax noprefix");
        assert_eq!(lines[1], "    .file 1 \"test.c\"");
        assert_eq!(
            lines.last().unwrap(),
            ".section .note.GNU-stack,\"\",%progbits"
        );
    }

    #[test]
    fn test_start_stub() {
        let lines = compile("int main() { return 0; }");
        let start = index_of(&lines, "_start:");
        assert_eq!(lines[start + 1].trim(), "call main");
        assert_eq!(lines[start + 2].trim(), "mov rdi, rax");
        assert_eq!(lines[start + 3].trim(), "mov rax, 60");
        assert_eq!(lines[start + 4].trim(), "syscall");
    }

    #[test]
    fn test_empty_function_prologue_epilogue() {
        let lines = compile("int main() {}");
        let entry = index_of(&lines, "main:");
        // stack_size is 0: no sub rsp
        assert_eq!(lines[entry + 1].trim(), "push rbp");
        assert_eq!(lines[entry + 2].trim(), "mov rbp, rsp");
        assert!(!lines[entry + 3].trim().starts_with("sub rsp"));
        let ret = index_of(&lines, ".L.return.main:");
        assert_eq!(lines[ret + 1].trim(), "mov rsp, rbp");
        assert_eq!(lines[ret + 2].trim(), "pop rbp");
        assert_eq!(lines[ret + 3].trim(), "ret");
    }

    #[test]
    fn test_return_constant() {
        let lines = compile("int main() { return 42; }");
        assert!(lines.contains(&"    mov rax, 42".to_string()));
        assert!(lines.contains(&"    jmp .L.return.main".to_string()));
    }

    #[test]
    fn test_stack_size_is_16_byte_aligned() {
        let tokens = tokenize("int main() { int a; int b; int c; return 0; }").unwrap();
        let mut program = parse(&tokens).unwrap();
        generate(&mut program, "t.c").unwrap();
        let main = program.find("main").unwrap();
        assert_eq!(main.stack_size, 16); // 12 bytes of locals, rounded up
        assert_eq!(main.stack_size % 16, 0);
    }

    #[test]
    fn test_local_offsets_are_negative_and_distinct() {
        let tokens = tokenize("int main() { int a; char b; long c; return 0; }").unwrap();
        let mut program = parse(&tokens).unwrap();
        generate(&mut program, "t.c").unwrap();
        let main = program.find("main").unwrap();
        let offsets: Vec<i64> = main
            .locals
            .iter()
            .map(|id| program.obj(*id).offset)
            .collect();
        assert_eq!(offsets, [-4, -5, -13]);
    }

    #[test]
    fn test_param_spill_widths() {
        let lines = compile("int f(char c, int i, long l) { return i; } int main() { return 0; }");
        assert!(lines.contains(&"    mov [rbp - 1], dil".to_string()));
        assert!(lines.contains(&"    mov [rbp - 5], esi".to_string()));
        assert!(lines.contains(&"    mov [rbp - 13], rdx".to_string()));
    }

    #[test]
    fn test_load_widths() {
        let char_lines = compile("int main() { char c; c = 1; return c; }");
        assert!(char_lines.contains(&"    movsbq rax, [rax]".to_string()));

        let short_lines = compile("int main() { short s; s = 1; return s; }");
        assert!(short_lines.contains(&"    movswq rax, [rax]".to_string()));

        let int_lines = compile("int main() { int i; i = 1; return i; }");
        assert!(int_lines.contains(&"    movsxd rax, dword ptr [rax]".to_string()));

        let long_lines = compile("int main() { long l; l = 1; return l; }");
        assert!(long_lines.contains(&"    mov rax, [rax]".to_string()));
    }

    #[test]
    fn test_store_widths() {
        let lines = compile(
            "int main() { char c; short s; int i; long l; c = 1; s = 2; i = 3; l = 4; return 0; }",
        );
        assert!(lines.contains(&"    mov [rdi], al".to_string()));
        assert!(lines.contains(&"    mov [rdi], ax".to_string()));
        assert!(lines.contains(&"    mov [rdi], eax".to_string()));
        assert!(lines.contains(&"    mov [rdi], rax".to_string()));
    }

    #[test]
    fn test_array_load_is_a_no_op() {
        // `a` used as a value decays: lea computes the address, no load follows
        let lines = compile("int main() { int a[2]; int *p; p = a; return 0; }");
        let lea_count = lines
            .iter()
            .filter(|l| l.trim().starts_with("lea rax, [rbp"))
            .count();
        assert!(lea_count >= 2); // &a slot and p slot
        assert!(!lines.contains(&"    movsxd rax, dword ptr [rbp - 8]".to_string()));
    }

    #[test]
    fn test_binary_operands_via_stack() {
        let lines = compile("int main() { return 1 + 2; }");
        let add = index_of(&lines, "add rax, rdi");
        let pop = index_of(&lines, "pop rdi");
        assert!(pop < add);
        assert!(lines[..add]
            .iter()
            .any(|l| l.trim() == "push rax"));
    }

    #[test]
    fn test_division_uses_cqo_idiv() {
        let lines = compile("int main() { return 7 / 2; }");
        let cqo = index_of(&lines, "cqo");
        assert_eq!(lines[cqo + 1].trim(), "idiv rdi");
    }

    #[test]
    fn test_comparison_materializes_flag() {
        let lines = compile("int main() { return 1 < 2; }");
        let cmp = index_of(&lines, "cmp rax, rdi");
        assert_eq!(lines[cmp + 1].trim(), "setl al");
        assert_eq!(lines[cmp + 2].trim(), "movzx rax, al");
    }

    #[test]
    fn test_if_lowering_shape() {
        let lines = compile("int main() { if (1) return 2; else return 3; return 4; }");
        let je = index_of(&lines, "je .L.else.0");
        let jmp = index_of(&lines, "jmp .L.end.0");
        let else_def = index_of(&lines, ".L.else.0:");
        let end_def = index_of(&lines, ".L.end.0:");
        assert!(je < jmp && jmp < else_def && else_def < end_def);
    }

    #[test]
    fn test_for_lowering_shape() {
        let lines =
            compile("int main() { int i; for (i = 0; i < 3; i = i + 1) i; return i; }");
        let begin = index_of(&lines, ".L.begin.0:");
        let je = index_of(&lines, "je .L.end.0");
        let jmp = index_of(&lines, "jmp .L.begin.0");
        let end = index_of(&lines, ".L.end.0:");
        assert!(begin < je && je < jmp && jmp < end);
    }

    #[test]
    fn test_while_has_no_init_or_inc() {
        let lines = compile("int main() { int i; i = 0; while (i < 2) i = i + 1; return i; }");
        assert!(lines.iter().any(|l| l.trim() == ".L.begin.0:"));
        assert!(lines.iter().any(|l| l.trim() == "jmp .L.begin.0"));
    }

    #[test]
    fn test_label_numbers_are_unique() {
        let lines = compile(
            "int main() { int i; if (1) i = 1; if (2) i = 2; for (;;) return i; while (1) i; \
             return 0; }",
        );
        let mut seen = std::collections::HashSet::new();
        for line in &lines {
            let line = line.trim();
            if line.starts_with(".L.begin.") || line.starts_with(".L.else.") {
                if let Some(label) = line.strip_suffix(':') {
                    assert!(seen.insert(label.to_string()), "duplicate label {label}");
                }
            }
        }
        // two ifs, one for, one while: four distinct counter values
        assert!(lines.iter().any(|l| l.trim() == ".L.else.0:"));
        assert!(lines.iter().any(|l| l.trim() == ".L.else.1:"));
        assert!(lines.iter().any(|l| l.trim() == ".L.begin.2:"));
        assert!(lines.iter().any(|l| l.trim() == ".L.begin.3:"));
    }

    #[test]
    fn test_six_argument_call_packs_all_registers() {
        let lines = compile("int main() { return f(1, 2, 3, 4, 5, 6); }");
        let pops: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| l.starts_with("pop") && *l != "pop rbp")
            .collect();
        assert_eq!(pops, ["pop r9", "pop r8", "pop rcx", "pop rdx", "pop rsi", "pop rdi"]);
        let call = index_of(&lines, "call f");
        assert_eq!(lines[call - 1].trim(), "mov rax, 0");
    }

    #[test]
    fn test_seven_arguments_is_fatal() {
        let tokens = tokenize("int main() { return f(1, 2, 3, 4, 5, 6, 7); }").unwrap();
        let mut program = parse(&tokens).unwrap();
        let err = generate(&mut program, "t.c").unwrap_err();
        assert_eq!(err.message, "too many function call arguments");
    }

    #[test]
    fn test_seven_parameters_is_fatal() {
        let tokens = tokenize(
            "int f(int a, int b, int c, int d, int e, int g, int h) { return a; } \
             int main() { return 0; }",
        )
        .unwrap();
        let mut program = parse(&tokens).unwrap();
        let err = generate(&mut program, "t.c").unwrap_err();
        assert_eq!(err.message, "too many function parameters");
    }

    #[test]
    fn test_global_variable_data() {
        let lines = compile("int g; int main() { return g; }");
        let data = index_of(&lines, ".data");
        let label = index_of(&lines, "g:");
        assert!(data < label);
        assert_eq!(lines[label + 1].trim(), ".zero 4");
        assert!(lines.contains(&"    .globl g".to_string()));
        // globals are addressed rip-relative
        assert!(lines.contains(&"    lea rax, [rip + g]".to_string()));
    }

    #[test]
    fn test_data_section_omitted_without_globals() {
        let lines = compile("int main() { return 0; }");
        assert!(!lines.iter().any(|l| l.trim() == ".data"));
    }

    #[test]
    fn test_string_literal_bytes_with_nul() {
        let lines = compile("int main() { char *s; s = \"AB\"; return 0; }");
        let label = index_of(&lines, ".L..0:");
        assert_eq!(lines[label + 1].trim(), ".byte 65");
        assert_eq!(lines[label + 2].trim(), ".byte 66");
        assert_eq!(lines[label + 3].trim(), ".byte 0");
    }

    #[test]
    fn test_empty_string_literal_is_single_nul() {
        let lines = compile("int main() { char *s; s = \"\"; return 0; }");
        let label = index_of(&lines, ".L..0:");
        assert_eq!(lines[label + 1].trim(), ".byte 0");
        assert_ne!(lines[label + 2].trim(), ".byte 0");
    }

    #[test]
    fn test_member_address_adds_offset() {
        let lines =
            compile("int main() { struct { char a; int b; } s; s.b = 1; return s.b; }");
        assert!(lines.contains(&"    add rax, 4".to_string()));
    }

    #[test]
    fn test_loc_directives_carry_source_lines() {
        let lines = compile("int main() {\nreturn 42;\n}");
        assert!(lines.contains(&"    .loc 1 2".to_string()));
    }

    #[test]
    fn test_not_an_lvalue_is_fatal() {
        let tokens = tokenize("int main() { 1 = 2; return 0; }").unwrap();
        let mut program = parse(&tokens).unwrap();
        let err = generate(&mut program, "t.c").unwrap_err();
        assert_eq!(err.message, "Not an lvalue");
    }

    #[test]
    fn test_output_is_deterministic() {
        let tokens =
            tokenize("int g; int main() { char *s; s = \"hi\"; if (g) return 1; return 0; }")
                .unwrap();
        let mut program = parse(&tokens).unwrap();
        let first = generate(&mut program, "t.c").unwrap();
        let second = generate(&mut program, "t.c").unwrap();
        assert_eq!(first, second);
    }
}
