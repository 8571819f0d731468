//! yoctocc-par - Parser and semantic analysis.
//!
//! A hand-written recursive-descent parser over the token stream
//! produced by `yoctocc-lex`. The grammar, low to high precedence:
//!
//! ```text
//! program      = (function | global-var)*
//! stmt         = "return" expr ";"
//!              | "if" "(" expr ")" stmt ("else" stmt)?
//!              | "for" "(" expr-stmt expr? ";" expr? ")" stmt
//!              | "while" "(" expr ")" stmt
//!              | "{" compound-stmt
//!              | expr-stmt
//! compound-stmt= (declaration | stmt)* "}"
//! expr-stmt    = expr? ";"
//! expr         = assign ("," expr)?
//! assign       = equality ("=" assign)?
//! equality     = relational (("==" | "!=") relational)*
//! relational   = add (("<" | "<=" | ">" | ">=") add)*
//! add          = mul (("+" | "-") mul)*
//! mul          = unary (("*" | "/") unary)*
//! unary        = ("+" | "-" | "*" | "&") unary | postfix
//! postfix      = primary ("[" expr "]" | "." ident | "->" ident)*
//! primary      = "(" "{" stmt+ "}" ")" | "(" expr ")"
//!              | "sizeof" unary | "sizeof" "(" type-name ")"
//!              | ident func-args? | str | num
//! ```
//!
//! Declarations (`declspec`, `declarator`, struct/union layout) live in
//! [`decl`]; the expression ladder and the pointer-aware `+`/`-`
//! builders in [`expr`]; statements in [`stmt`]. Parsing and type
//! annotation are interleaved exactly as in a classic single-pass C
//! front end: every statement is annotated as soon as it is built, and
//! the arithmetic builders annotate their operands so pointer scaling
//! can look at operand types.

mod ast;
mod decl;
mod expr;
mod scope;
mod stmt;
pub mod types;

pub use ast::{BinOp, Expr, ExprKind, Obj, ObjId, Program, Stmt, StmtKind, UnOp};
pub use types::{Member, Param, Type, TypeKind};

use std::rc::Rc;

use yoctocc_lex::{Token, TokenKind};
use yoctocc_util::{Diagnostic, Result, Span};

use scope::ScopeStack;
use types::add_type_stmt;

/// Parses a token stream into a [`Program`].
///
/// The stream must end with an EOF token, as produced by
/// [`yoctocc_lex::tokenize`].
///
/// # Example
///
/// ```
/// use yoctocc_lex::tokenize;
/// use yoctocc_par::parse;
///
/// let tokens = tokenize("int main() { return 0; }").unwrap();
/// let program = parse(&tokens).unwrap();
/// assert!(program.find("main").unwrap().is_function);
/// ```
pub fn parse(tokens: &[Token]) -> Result<Program> {
    Parser::new(tokens).run()
}

pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    pub(crate) objs: Vec<Obj>,
    pub(crate) scope: ScopeStack,
    /// Locals of the function being parsed, parameters first.
    locals: Vec<ObjId>,
    /// Counter for anonymous string-literal globals (`.L..<n>`).
    unique_count: u64,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            objs: Vec::new(),
            scope: ScopeStack::new(),
            locals: Vec::new(),
            unique_count: 0,
        }
    }

    // program = (function-definition | global-variable)*
    fn run(mut self) -> Result<Program> {
        while !self.at_eof() {
            let base = self.declspec()?;
            if self.is_function()? {
                self.parse_function(base)?;
            } else {
                self.parse_global_variable(base)?;
            }
        }
        Ok(Program { objs: self.objs })
    }

    /// Decides function-definition vs. global-variable by speculatively
    /// parsing a declarator and checking the resulting type kind; the
    /// cursor is restored afterwards.
    fn is_function(&mut self) -> Result<bool> {
        if self.at(";") {
            return Ok(false);
        }
        let saved = self.pos;
        let result = self
            .declarator(Type::int_type())
            .map(|d| d.ty.kind == TypeKind::Func);
        self.pos = saved;
        result
    }

    fn parse_function(&mut self, base: Rc<Type>) -> Result<()> {
        let d = self.declarator(base)?;
        let func_ty = d.ty.clone();

        let id = ObjId(self.objs.len() as u32);
        self.objs.push(Obj {
            name: d.name,
            ty: d.ty,
            is_local: false,
            is_function: true,
            offset: 0,
            init_data: None,
            params: Vec::new(),
            body: None,
            locals: Vec::new(),
            stack_size: 0,
        });

        self.locals = Vec::new();
        self.scope.enter();

        // Parameters become the first locals, in declaration order.
        let mut param_ids = Vec::new();
        for param in &func_ty.params {
            param_ids.push(self.create_local(param.name.clone(), param.ty.clone()));
        }

        self.expect("{")?;
        let body = self.compound_stmt()?;

        self.scope.leave();

        let locals = std::mem::take(&mut self.locals);
        let obj = &mut self.objs[id.index()];
        obj.params = param_ids;
        obj.body = Some(body);
        obj.locals = locals;
        Ok(())
    }

    fn parse_global_variable(&mut self, base: Rc<Type>) -> Result<()> {
        let mut first = true;
        while !self.consume(";") {
            if self.at_eof() {
                return Err(self.error_here("expected ';'"));
            }
            if !first {
                self.expect(",")?;
            }
            first = false;
            let d = self.declarator(base.clone())?;
            self.create_global(d.name, d.ty);
        }
        Ok(())
    }

    pub(crate) fn create_local(&mut self, name: String, ty: Rc<Type>) -> ObjId {
        let id = ObjId(self.objs.len() as u32);
        self.objs.push(Obj {
            name: name.clone(),
            ty,
            is_local: true,
            is_function: false,
            offset: 0,
            init_data: None,
            params: Vec::new(),
            body: None,
            locals: Vec::new(),
            stack_size: 0,
        });
        self.scope.push_var(name, id);
        self.locals.push(id);
        id
    }

    pub(crate) fn create_global(&mut self, name: String, ty: Rc<Type>) -> ObjId {
        let id = ObjId(self.objs.len() as u32);
        self.objs.push(Obj {
            name: name.clone(),
            ty,
            is_local: false,
            is_function: false,
            offset: 0,
            init_data: None,
            params: Vec::new(),
            body: None,
            locals: Vec::new(),
            stack_size: 0,
        });
        self.scope.push_var(name, id);
        id
    }

    /// Fresh name for an anonymous string-literal global.
    pub(crate) fn unique_name(&mut self) -> String {
        let name = format!(".L..{}", self.unique_count);
        self.unique_count += 1;
        name
    }

    /// Annotates a finished statement in place.
    pub(crate) fn annotate(&self, stmt: &mut Stmt) -> Result<()> {
        add_type_stmt(stmt, &self.objs)
    }

    // ------------------------------------------------------------------
    // Token stream helpers
    // ------------------------------------------------------------------

    pub(crate) fn peek(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> &'a Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    pub(crate) fn bump(&mut self) -> &'a Token {
        let token = self.peek();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at(&self, s: &str) -> bool {
        self.peek().is(s)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Consumes the current token if its text is `s`.
    pub(crate) fn consume(&mut self, s: &str) -> bool {
        if self.at(s) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token or fails with a syntax error.
    pub(crate) fn expect(&mut self, s: &str) -> Result<()> {
        if self.consume(s) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected '{}'", s)))
        }
    }

    pub(crate) fn span_here(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn error_here(&self, message: &str) -> Diagnostic {
        Diagnostic::new(message, self.span_here())
    }
}
