//! Statement parsing.
//!
//! `while` is parsed into the `for` node with no init/inc, and a local
//! declaration becomes a block of expression statements (one assignment
//! per initialized declarator), so the code generator only ever sees
//! five statement shapes.

use yoctocc_util::{Result, Span};

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::Parser;

impl<'a> Parser<'a> {
    // stmt = "return" expr ";"
    //      | "if" "(" expr ")" stmt ("else" stmt)?
    //      | "for" "(" expr-stmt expr? ";" expr? ")" stmt
    //      | "while" "(" expr ")" stmt
    //      | "{" compound-stmt
    //      | expr-stmt
    pub(crate) fn stmt(&mut self) -> Result<Stmt> {
        if self.at("return") {
            let span = self.span_here();
            self.bump();
            let expr = self.expr()?;
            self.expect(";")?;
            return Ok(Stmt::new(StmtKind::Return(expr), span));
        }

        if self.at("if") {
            let span = self.span_here();
            self.bump();
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            let then = Box::new(self.stmt()?);
            let els = if self.consume("else") {
                Some(Box::new(self.stmt()?))
            } else {
                None
            };
            return Ok(Stmt::new(StmtKind::If { cond, then, els }, span));
        }

        if self.at("for") {
            let span = self.span_here();
            self.bump();
            self.expect("(")?;
            let init = Box::new(self.expr_stmt()?);
            let cond = if self.at(";") {
                None
            } else {
                Some(self.expr()?)
            };
            self.expect(";")?;
            let inc = if self.at(")") {
                None
            } else {
                Some(self.expr()?)
            };
            self.expect(")")?;
            let body = Box::new(self.stmt()?);
            return Ok(Stmt::new(
                StmtKind::For {
                    init: Some(init),
                    cond,
                    inc,
                    body,
                },
                span,
            ));
        }

        if self.at("while") {
            let span = self.span_here();
            self.bump();
            self.expect("(")?;
            let cond = self.expr()?;
            self.expect(")")?;
            let body = Box::new(self.stmt()?);
            return Ok(Stmt::new(
                StmtKind::For {
                    init: None,
                    cond: Some(cond),
                    inc: None,
                    body,
                },
                span,
            ));
        }

        if self.consume("{") {
            return self.compound_stmt();
        }

        self.expr_stmt()
    }

    // compound-stmt = (declaration | stmt)* "}"
    //
    // The opening '{' has already been consumed. Each finished
    // statement is annotated immediately, matching the single-pass
    // structure of the grammar: later statements may rely on types
    // introduced by earlier ones.
    pub(crate) fn compound_stmt(&mut self) -> Result<Stmt> {
        let (stmts, span) = self.compound_body()?;
        Ok(Stmt::block(stmts, span))
    }

    pub(crate) fn compound_body(&mut self) -> Result<(Vec<Stmt>, Span)> {
        let span = self.span_here();
        let mut stmts = Vec::new();

        self.scope.enter();
        while !self.at("}") {
            if self.at_eof() {
                return Err(self.error_here("expected '}'"));
            }
            let mut stmt = if self.is_type_name() {
                self.declaration()?
            } else {
                self.stmt()?
            };
            self.annotate(&mut stmt)?;
            stmts.push(stmt);
        }
        self.bump();
        self.scope.leave();

        Ok((stmts, span))
    }

    // expr-stmt = expr? ";"
    fn expr_stmt(&mut self) -> Result<Stmt> {
        let span = self.span_here();
        if self.consume(";") {
            // the null statement is an empty block
            return Ok(Stmt::block(Vec::new(), span));
        }

        let expr = self.expr()?;
        self.expect(";")?;
        Ok(Stmt::new(StmtKind::ExprStmt(expr), span))
    }

    // declaration = declspec (declarator ("=" expr)?
    //                          ("," declarator ("=" expr)?)*)? ";"
    fn declaration(&mut self) -> Result<Stmt> {
        let span = self.span_here();
        let base = self.declspec()?;

        let mut stmts = Vec::new();
        let mut i = 0;
        while !self.at(";") {
            if self.at_eof() {
                return Err(self.error_here("expected ';'"));
            }
            if i > 0 {
                self.expect(",")?;
            }
            i += 1;

            let d = self.declarator(base.clone())?;
            let id = self.create_local(d.name, d.ty);

            if !self.at("=") {
                continue;
            }
            let eq_span = self.span_here();
            self.bump();

            let lhs = Expr::new(ExprKind::Var(id), d.span);
            let rhs = self.assign()?;
            let assign = Expr::new(
                ExprKind::Assign {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                eq_span,
            );
            stmts.push(Stmt::new(StmtKind::ExprStmt(assign), eq_span));
        }
        self.bump();

        Ok(Stmt::block(stmts, span))
    }
}
