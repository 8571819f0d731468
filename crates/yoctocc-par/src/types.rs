//! Type representation and the post-parse type annotator.
//!
//! Types are immutable once built and freely shared behind [`Rc`]
//! handles. The annotator walks an expression tree bottom-up and fills
//! every node's type exactly once; a node that already has a type is
//! left untouched, which makes annotation idempotent and lets the
//! pointer-arithmetic builders pre-type the nodes they synthesize.

use std::rc::Rc;

use yoctocc_util::{Diagnostic, Result};

use crate::ast::{BinOp, Expr, ExprKind, Obj, Stmt, StmtKind, UnOp};

/// Kind tag of a [`Type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Char,
    Short,
    Int,
    Long,
    Ptr,
    Func,
    Array,
    Struct,
    Union,
}

/// A struct or union member with its resolved layout offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: Rc<Type>,
    pub offset: i64,
}

/// A function parameter as written in the declarator.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Rc<Type>,
}

/// A source-language type.
#[derive(Clone, Debug, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    /// `sizeof` value in bytes.
    pub size: i64,
    pub align: i64,
    /// Pointee for `Ptr`, element type for `Array`.
    pub base: Option<Rc<Type>>,
    /// Element count for `Array`.
    pub array_len: i64,
    /// Members for `Struct`/`Union`, in declaration order.
    pub members: Vec<Member>,
    /// Return type for `Func`.
    pub return_ty: Option<Rc<Type>>,
    /// Parameters for `Func`.
    pub params: Vec<Param>,
}

impl Type {
    fn scalar(kind: TypeKind, size: i64) -> Rc<Type> {
        Rc::new(Type {
            kind,
            size,
            align: size,
            base: None,
            array_len: 0,
            members: Vec::new(),
            return_ty: None,
            params: Vec::new(),
        })
    }

    pub fn char_type() -> Rc<Type> {
        Self::scalar(TypeKind::Char, 1)
    }

    pub fn short_type() -> Rc<Type> {
        Self::scalar(TypeKind::Short, 2)
    }

    pub fn int_type() -> Rc<Type> {
        Self::scalar(TypeKind::Int, 4)
    }

    pub fn long_type() -> Rc<Type> {
        Self::scalar(TypeKind::Long, 8)
    }

    /// Pointer to `base`. Pointers are 8/8 on x86-64.
    pub fn pointer_to(base: Rc<Type>) -> Rc<Type> {
        Rc::new(Type {
            kind: TypeKind::Ptr,
            size: 8,
            align: 8,
            base: Some(base),
            array_len: 0,
            members: Vec::new(),
            return_ty: None,
            params: Vec::new(),
        })
    }

    /// Array of `len` elements of `base`; size is `base.size * len`,
    /// alignment is the element alignment.
    pub fn array_of(base: Rc<Type>, len: i64) -> Rc<Type> {
        Rc::new(Type {
            kind: TypeKind::Array,
            size: base.size * len,
            align: base.align,
            base: Some(base),
            array_len: len,
            members: Vec::new(),
            return_ty: None,
            params: Vec::new(),
        })
    }

    /// Function returning `return_ty`.
    pub fn func_type(return_ty: Rc<Type>, params: Vec<Param>) -> Rc<Type> {
        Rc::new(Type {
            kind: TypeKind::Func,
            size: 0,
            align: 0,
            base: None,
            array_len: 0,
            members: Vec::new(),
            return_ty: Some(return_ty),
            params,
        })
    }

    /// True for the integral kinds (`char`, `short`, `int`, `long`).
    pub fn is_integer(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Char | TypeKind::Short | TypeKind::Int | TypeKind::Long
        )
    }
}

/// Annotates `stmt` and everything below it. Statements themselves have
/// no type; this exists to reach the expressions they contain.
pub fn add_type_stmt(stmt: &mut Stmt, objs: &[Obj]) -> Result<()> {
    match &mut stmt.kind {
        StmtKind::Return(expr) | StmtKind::ExprStmt(expr) => add_type(expr, objs),
        StmtKind::If { cond, then, els } => {
            add_type(cond, objs)?;
            add_type_stmt(then, objs)?;
            if let Some(els) = els {
                add_type_stmt(els, objs)?;
            }
            Ok(())
        }
        StmtKind::For {
            init,
            cond,
            inc,
            body,
        } => {
            if let Some(init) = init {
                add_type_stmt(init, objs)?;
            }
            if let Some(cond) = cond {
                add_type(cond, objs)?;
            }
            if let Some(inc) = inc {
                add_type(inc, objs)?;
            }
            add_type_stmt(body, objs)
        }
        StmtKind::Block(stmts) => {
            for stmt in stmts {
                add_type_stmt(stmt, objs)?;
            }
            Ok(())
        }
    }
}

/// Fills `expr.ty` (and recursively every child's) if not already set.
pub fn add_type(expr: &mut Expr, objs: &[Obj]) -> Result<()> {
    if expr.ty.is_some() {
        return Ok(());
    }

    let span = expr.span;
    match &mut expr.kind {
        ExprKind::Num(_) => {
            expr.ty = Some(Type::int_type());
        }
        ExprKind::Var(id) => {
            expr.ty = Some(objs[id.index()].ty.clone());
        }
        ExprKind::Unary { op, operand } => {
            add_type(operand, objs)?;
            expr.ty = match op {
                UnOp::Neg => operand.ty.clone(),
                UnOp::Addr => operand.ty.as_ref().map(|ty| {
                    // &array decays to a pointer to the element type
                    match &ty.base {
                        Some(base) if ty.kind == TypeKind::Array => {
                            Type::pointer_to(base.clone())
                        }
                        _ => Type::pointer_to(ty.clone()),
                    }
                }),
                UnOp::Deref => {
                    let base = operand.ty.as_ref().and_then(|ty| ty.base.clone());
                    match base {
                        Some(base) => Some(base),
                        None => {
                            return Err(Diagnostic::new("Invalid pointer dereference", span));
                        }
                    }
                }
            };
        }
        ExprKind::Binary { op, lhs, rhs } => {
            add_type(lhs, objs)?;
            add_type(rhs, objs)?;
            expr.ty = match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => lhs.ty.clone(),
                BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    Some(Type::int_type())
                }
            };
        }
        ExprKind::Assign { lhs, rhs } => {
            add_type(lhs, objs)?;
            add_type(rhs, objs)?;
            if let Some(ty) = &lhs.ty {
                if ty.kind == TypeKind::Array {
                    return Err(Diagnostic::new("not an lvalue", span));
                }
            }
            expr.ty = lhs.ty.clone();
        }
        ExprKind::Comma { lhs, rhs } => {
            add_type(lhs, objs)?;
            add_type(rhs, objs)?;
            expr.ty = rhs.ty.clone();
        }
        ExprKind::Member { base, member } => {
            add_type(base, objs)?;
            expr.ty = Some(member.ty.clone());
        }
        ExprKind::FuncCall { args, .. } => {
            for arg in args {
                add_type(arg, objs)?;
            }
            expr.ty = Some(Type::int_type());
        }
        ExprKind::StmtExpr { body } => {
            for stmt in body.iter_mut() {
                add_type_stmt(stmt, objs)?;
            }
            let last_ty = body.last().and_then(|stmt| match &stmt.kind {
                StmtKind::ExprStmt(expr) => expr.ty.clone(),
                _ => None,
            });
            match last_ty {
                Some(ty) => expr.ty = Some(ty),
                None => {
                    return Err(Diagnostic::new(
                        "statement expression returning void is not supported",
                        span,
                    ));
                }
            }
        }
    }

    Ok(())
}
