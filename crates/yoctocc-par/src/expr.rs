//! Expression parsing.
//!
//! The classic recursive-descent precedence ladder. `+` and `-` go
//! through pointer-aware builders that scale the integer operand by the
//! pointee size, which is also what `p[i]` desugars to (`*(p + i)`).

use std::rc::Rc;

use yoctocc_lex::TokenKind;
use yoctocc_util::{Diagnostic, Result, Span};

use crate::ast::{BinOp, Expr, ExprKind, UnOp};
use crate::types::{add_type, Type, TypeKind};
use crate::Parser;

fn expr_is_integer(expr: &Expr) -> bool {
    expr.ty.as_ref().is_some_and(|ty| ty.is_integer())
}

fn base_of(expr: &Expr) -> Option<Rc<Type>> {
    expr.ty.as_ref().and_then(|ty| ty.base.clone())
}

impl<'a> Parser<'a> {
    // expr = assign ("," expr)?
    pub(crate) fn expr(&mut self) -> Result<Expr> {
        let node = self.assign()?;

        if self.at(",") {
            let span = self.span_here();
            self.bump();
            let rhs = self.expr()?;
            return Ok(Expr::new(
                ExprKind::Comma {
                    lhs: Box::new(node),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }

        Ok(node)
    }

    // assign = equality ("=" assign)?
    pub(crate) fn assign(&mut self) -> Result<Expr> {
        let node = self.equality()?;

        if self.at("=") {
            let span = self.span_here();
            self.bump();
            let rhs = self.assign()?;
            return Ok(Expr::new(
                ExprKind::Assign {
                    lhs: Box::new(node),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }

        Ok(node)
    }

    // equality = relational (("==" | "!=") relational)*
    fn equality(&mut self) -> Result<Expr> {
        let mut node = self.relational()?;

        loop {
            let span = self.span_here();
            let op = if self.consume("==") {
                BinOp::Eq
            } else if self.consume("!=") {
                BinOp::Ne
            } else {
                return Ok(node);
            };
            let rhs = self.relational()?;
            node = Expr::binary(op, node, rhs, span);
        }
    }

    // relational = add (("<" | "<=" | ">" | ">=") add)*
    fn relational(&mut self) -> Result<Expr> {
        let mut node = self.additive()?;

        loop {
            let span = self.span_here();
            let op = if self.consume("<") {
                BinOp::Lt
            } else if self.consume("<=") {
                BinOp::Le
            } else if self.consume(">") {
                BinOp::Gt
            } else if self.consume(">=") {
                BinOp::Ge
            } else {
                return Ok(node);
            };
            let rhs = self.additive()?;
            node = Expr::binary(op, node, rhs, span);
        }
    }

    // add = mul (("+" | "-") mul)*
    fn additive(&mut self) -> Result<Expr> {
        let mut node = self.multiplicative()?;

        loop {
            let span = self.span_here();
            if self.consume("+") {
                let rhs = self.multiplicative()?;
                node = self.new_add(node, rhs, span)?;
                continue;
            }
            if self.consume("-") {
                let rhs = self.multiplicative()?;
                node = self.new_sub(node, rhs, span)?;
                continue;
            }
            return Ok(node);
        }
    }

    // mul = unary (("*" | "/") unary)*
    fn multiplicative(&mut self) -> Result<Expr> {
        let mut node = self.unary()?;

        loop {
            let span = self.span_here();
            let op = if self.consume("*") {
                BinOp::Mul
            } else if self.consume("/") {
                BinOp::Div
            } else {
                return Ok(node);
            };
            let rhs = self.unary()?;
            node = Expr::binary(op, node, rhs, span);
        }
    }

    // unary = ("+" | "-" | "*" | "&") unary | postfix
    fn unary(&mut self) -> Result<Expr> {
        if self.consume("+") {
            return self.unary();
        }
        if self.at("-") {
            let span = self.span_here();
            self.bump();
            let operand = self.unary()?;
            return Ok(Expr::unary(UnOp::Neg, operand, span));
        }
        if self.at("&") {
            let span = self.span_here();
            self.bump();
            let operand = self.unary()?;
            return Ok(Expr::unary(UnOp::Addr, operand, span));
        }
        if self.at("*") {
            let span = self.span_here();
            self.bump();
            let operand = self.unary()?;
            return Ok(Expr::unary(UnOp::Deref, operand, span));
        }
        self.postfix()
    }

    // postfix = primary ("[" expr "]" | "." ident | "->" ident)*
    fn postfix(&mut self) -> Result<Expr> {
        let mut node = self.primary()?;

        loop {
            if self.at("[") {
                // a[i] is *(a + i)
                let span = self.span_here();
                self.bump();
                let index = self.expr()?;
                self.expect("]")?;
                node = Expr::unary(UnOp::Deref, self.new_add(node, index, span)?, span);
                continue;
            }
            if self.consume(".") {
                node = self.struct_ref(node)?;
                continue;
            }
            if self.at("->") {
                // p->m is (*p).m
                let span = self.span_here();
                self.bump();
                node = Expr::unary(UnOp::Deref, node, span);
                node = self.struct_ref(node)?;
                continue;
            }
            return Ok(node);
        }
    }

    // primary = "(" "{" stmt+ "}" ")" | "(" expr ")"
    //         | "sizeof" unary | "sizeof" "(" type-name ")"
    //         | ident func-args? | str | num
    fn primary(&mut self) -> Result<Expr> {
        if self.at("(") && self.peek_ahead(1).is("{") {
            let span = self.span_here();
            self.bump();
            self.bump();
            let (body, _) = self.compound_body()?;
            self.expect(")")?;
            return Ok(Expr::new(ExprKind::StmtExpr { body }, span));
        }

        if self.consume("(") {
            let expr = self.expr()?;
            self.expect(")")?;
            return Ok(expr);
        }

        if self.at("sizeof") {
            return self.sizeof_expr();
        }

        match self.peek().kind {
            TokenKind::Ident => {
                if self.peek_ahead(1).is("(") {
                    return self.func_call();
                }
                let name = self.peek().lexeme.clone();
                let span = self.span_here();
                let Some(id) = self.scope.find_var(&name) else {
                    return Err(Diagnostic::new(format!("Undefined variable: {name}"), span));
                };
                self.bump();
                Ok(Expr::new(ExprKind::Var(id), span))
            }
            TokenKind::Str => {
                let token = self.bump();
                let ty = Type::array_of(Type::char_type(), token.bytes.len() as i64 + 1);
                let name = self.unique_name();
                let id = self.create_global(name, ty);
                self.objs[id.index()].init_data = Some(token.bytes.clone());
                Ok(Expr::new(ExprKind::Var(id), token.span))
            }
            TokenKind::Num => {
                let token = self.bump();
                Ok(Expr::num(token.value, token.span))
            }
            _ => Err(self.error_here("Expected an expression")),
        }
    }

    // funcall = ident "(" (assign ("," assign)*)? ")"
    fn func_call(&mut self) -> Result<Expr> {
        let name = self.peek().lexeme.clone();
        let span = self.span_here();
        self.bump(); // name
        self.bump(); // '('

        let mut args = Vec::new();
        while !self.at(")") {
            if self.at_eof() {
                return Err(self.error_here("expected ')'"));
            }
            if !args.is_empty() {
                self.expect(",")?;
            }
            args.push(self.assign()?);
        }
        self.bump();

        Ok(Expr::new(ExprKind::FuncCall { name, args }, span))
    }

    fn sizeof_expr(&mut self) -> Result<Expr> {
        let span = self.span_here();
        self.bump(); // sizeof

        // sizeof "(" type-name ")"
        if self.at("(") && self.is_type_name_at(1) {
            self.bump();
            let base = self.declspec()?;
            let ty = self.abstract_declarator(base)?;
            self.expect(")")?;
            return Ok(Expr::num(ty.size, span));
        }

        // sizeof unary: the operand is parsed and typed, never lowered
        let mut operand = self.unary()?;
        add_type(&mut operand, &self.objs)?;
        let size = operand.ty.as_ref().map_or(0, |ty| ty.size);
        Ok(Expr::num(size, span))
    }

    // abstract-declarator = "*"* ("[" num "]")*
    fn abstract_declarator(&mut self, base: Rc<Type>) -> Result<Rc<Type>> {
        let mut ty = base;
        while self.consume("*") {
            ty = Type::pointer_to(ty);
        }
        self.abstract_suffix(ty)
    }

    fn abstract_suffix(&mut self, ty: Rc<Type>) -> Result<Rc<Type>> {
        if self.consume("[") {
            if self.peek().kind != TokenKind::Num {
                return Err(self.error_here("expected a number"));
            }
            let len = self.bump().value;
            self.expect("]")?;
            let base = self.abstract_suffix(ty)?;
            return Ok(Type::array_of(base, len));
        }
        Ok(ty)
    }

    // "." ident and "->" ident; the member is resolved against the
    // (annotated) base type here so the node carries its offset.
    fn struct_ref(&mut self, mut base: Expr) -> Result<Expr> {
        if self.peek().kind != TokenKind::Ident {
            return Err(self.error_here("Expected an identifier"));
        }
        let name = self.peek().lexeme.clone();
        let span = self.span_here();
        self.bump();

        add_type(&mut base, &self.objs)?;
        let ty = match &base.ty {
            Some(ty) if matches!(ty.kind, TypeKind::Struct | TypeKind::Union) => ty.clone(),
            _ => {
                return Err(Diagnostic::new(
                    "Left operand is not a struct or union type",
                    span,
                ));
            }
        };

        let member = ty
            .members
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .ok_or_else(|| Diagnostic::new(format!("no member named '{name}'"), span))?;

        Ok(Expr::new(
            ExprKind::Member {
                base: Box::new(base),
                member,
            },
            span,
        ))
    }

    /// Builds `lhs + rhs` with pointer-arithmetic scaling:
    /// int + int stays as-is, `p + n` becomes `p + n * sizeof(*p)`,
    /// `n + p` is swapped to `p + n`, and `p + q` is rejected.
    pub(crate) fn new_add(&self, mut lhs: Expr, mut rhs: Expr, span: Span) -> Result<Expr> {
        add_type(&mut lhs, &self.objs)?;
        add_type(&mut rhs, &self.objs)?;

        if expr_is_integer(&lhs) && expr_is_integer(&rhs) {
            return Ok(Expr::binary(BinOp::Add, lhs, rhs, span));
        }

        if base_of(&lhs).is_some() && base_of(&rhs).is_some() {
            return Err(Diagnostic::new("Invalid addition of two pointers", span));
        }

        if base_of(&lhs).is_none() {
            std::mem::swap(&mut lhs, &mut rhs);
        }
        let Some(base) = base_of(&lhs) else {
            return Err(Diagnostic::new("invalid operands for addition", span));
        };

        let scaled = Expr::binary(BinOp::Mul, rhs, Expr::num(base.size, span), span);
        Ok(Expr::binary(BinOp::Add, lhs, scaled, span))
    }

    /// Builds `lhs - rhs`: int − int stays, `p − n` scales like
    /// addition and keeps the pointer type, `p − q` yields the element
    /// distance as an int.
    pub(crate) fn new_sub(&self, mut lhs: Expr, mut rhs: Expr, span: Span) -> Result<Expr> {
        add_type(&mut lhs, &self.objs)?;
        add_type(&mut rhs, &self.objs)?;

        if expr_is_integer(&lhs) && expr_is_integer(&rhs) {
            return Ok(Expr::binary(BinOp::Sub, lhs, rhs, span));
        }

        if let Some(base) = base_of(&lhs) {
            if expr_is_integer(&rhs) {
                let result_ty = lhs.ty.clone();
                let mut scaled = Expr::binary(BinOp::Mul, rhs, Expr::num(base.size, span), span);
                add_type(&mut scaled, &self.objs)?;
                let mut node = Expr::binary(BinOp::Sub, lhs, scaled, span);
                node.ty = result_ty;
                return Ok(node);
            }

            if base_of(&rhs).is_some() {
                let mut diff = Expr::binary(BinOp::Sub, lhs, rhs, span);
                diff.ty = Some(Type::int_type());
                return Ok(Expr::binary(
                    BinOp::Div,
                    diff,
                    Expr::num(base.size, span),
                    span,
                ));
            }
        }

        Err(Diagnostic::new(
            "Invalid subtraction involving pointers",
            span,
        ))
    }
}
