//! Declaration parsing: base type specifiers, declarators, type
//! suffixes, and struct/union member layout.

use std::rc::Rc;

use yoctocc_lex::TokenKind;
use yoctocc_util::{Diagnostic, Result, Span};

use crate::types::{Member, Param, Type, TypeKind};
use crate::Parser;

/// A parsed declarator: the complete type plus the declared name.
pub(crate) struct Declarator {
    pub ty: Rc<Type>,
    pub name: String,
    pub span: Span,
}

/// Result of `struct-union-decl`: either a reference to an existing
/// tagged type or a fresh definition whose members still need layout.
enum StructUnion {
    Ref(Rc<Type>),
    Def {
        tag: Option<String>,
        members: Vec<Member>,
    },
}

impl<'a> Parser<'a> {
    /// True if the current token starts a declaration.
    pub(crate) fn is_type_name(&self) -> bool {
        self.is_type_name_at(0)
    }

    pub(crate) fn is_type_name_at(&self, n: usize) -> bool {
        matches!(
            self.peek_ahead(n).lexeme.as_str(),
            "char" | "short" | "int" | "long" | "struct" | "union"
        ) && self.peek_ahead(n).kind == TokenKind::Keyword
    }

    // declspec = "char" | "short" | "int" | "long" | struct-decl | union-decl
    pub(crate) fn declspec(&mut self) -> Result<Rc<Type>> {
        if self.consume("char") {
            return Ok(Type::char_type());
        }
        if self.consume("short") {
            return Ok(Type::short_type());
        }
        if self.consume("int") {
            return Ok(Type::int_type());
        }
        if self.consume("long") {
            return Ok(Type::long_type());
        }
        if self.consume("struct") {
            return self.struct_decl();
        }
        if self.consume("union") {
            return self.union_decl();
        }
        Err(self.error_here("Expected a type specifier"))
    }

    // declarator = "*"* ident type-suffix
    pub(crate) fn declarator(&mut self, base: Rc<Type>) -> Result<Declarator> {
        let mut ty = base;
        while self.consume("*") {
            ty = Type::pointer_to(ty);
        }

        if self.peek().kind != TokenKind::Ident {
            return Err(self.error_here("Expected an identifier"));
        }
        let name = self.peek().lexeme.clone();
        let span = self.span_here();
        self.bump();

        let ty = self.type_suffix(ty)?;
        Ok(Declarator { ty, name, span })
    }

    // type-suffix = "(" func-params | "[" num "]" type-suffix | ε
    fn type_suffix(&mut self, ty: Rc<Type>) -> Result<Rc<Type>> {
        if self.consume("(") {
            return self.func_params(ty);
        }

        if self.consume("[") {
            let len = self.expect_number()?;
            self.expect("]")?;
            let base = self.type_suffix(ty)?;
            return Ok(Type::array_of(base, len));
        }

        Ok(ty)
    }

    // func-params = (param ("," param)*)? ")"
    // param       = declspec declarator
    fn func_params(&mut self, return_ty: Rc<Type>) -> Result<Rc<Type>> {
        let mut params = Vec::new();
        while !self.at(")") {
            if self.at_eof() {
                return Err(self.error_here("expected ')'"));
            }
            if !params.is_empty() {
                self.expect(",")?;
            }
            let base = self.declspec()?;
            let d = self.declarator(base)?;
            params.push(Param {
                name: d.name,
                ty: d.ty,
            });
        }
        self.bump();
        Ok(Type::func_type(return_ty, params))
    }

    // struct-decl = struct-union-decl, then sequential layout
    fn struct_decl(&mut self) -> Result<Rc<Type>> {
        match self.struct_union_decl()? {
            StructUnion::Ref(ty) => Ok(ty),
            StructUnion::Def { tag, mut members } => {
                let mut offset = 0;
                let mut align = 1;
                for member in &mut members {
                    offset = yoctocc_util::align_to(offset, member.ty.align);
                    member.offset = offset;
                    offset += member.ty.size;
                    align = align.max(member.ty.align);
                }

                let ty = Rc::new(Type {
                    kind: TypeKind::Struct,
                    size: yoctocc_util::align_to(offset, align),
                    align,
                    base: None,
                    array_len: 0,
                    members,
                    return_ty: None,
                    params: Vec::new(),
                });
                if let Some(tag) = tag {
                    self.scope.push_tag(tag, ty.clone());
                }
                Ok(ty)
            }
        }
    }

    // union-decl = struct-union-decl, members overlaid at offset 0
    fn union_decl(&mut self) -> Result<Rc<Type>> {
        match self.struct_union_decl()? {
            StructUnion::Ref(ty) => Ok(ty),
            StructUnion::Def { tag, members } => {
                let mut size = 0;
                let mut align = 1;
                for member in &members {
                    size = size.max(member.ty.size);
                    align = align.max(member.ty.align);
                }

                let ty = Rc::new(Type {
                    kind: TypeKind::Union,
                    size: yoctocc_util::align_to(size, align),
                    align,
                    base: None,
                    array_len: 0,
                    members,
                    return_ty: None,
                    params: Vec::new(),
                });
                if let Some(tag) = tag {
                    self.scope.push_tag(tag, ty.clone());
                }
                Ok(ty)
            }
        }
    }

    // struct-union-decl = ident? ("{" struct-members)?
    fn struct_union_decl(&mut self) -> Result<StructUnion> {
        let mut tag = None;
        let mut tag_span = Span::DUMMY;
        if self.peek().kind == TokenKind::Ident {
            tag = Some(self.peek().lexeme.clone());
            tag_span = self.span_here();
            self.bump();
        }

        if let Some(name) = &tag {
            if !self.at("{") {
                return match self.scope.find_tag(name) {
                    Some(ty) => Ok(StructUnion::Ref(ty)),
                    None => Err(Diagnostic::new("Unknown struct/union type", tag_span)),
                };
            }
        }

        self.expect("{")?;
        let members = self.struct_members()?;
        Ok(StructUnion::Def { tag, members })
    }

    // struct-members = (declspec declarator ("," declarator)* ";")* "}"
    fn struct_members(&mut self) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        while !self.consume("}") {
            if self.at_eof() {
                return Err(self.error_here("expected '}'"));
            }
            let base = self.declspec()?;
            let mut i = 0;
            while !self.consume(";") {
                if i > 0 {
                    self.expect(",")?;
                }
                i += 1;
                let d = self.declarator(base.clone())?;
                members.push(Member {
                    name: d.name,
                    ty: d.ty,
                    offset: 0,
                });
            }
        }
        Ok(members)
    }

    fn expect_number(&mut self) -> Result<i64> {
        if self.peek().kind != TokenKind::Num {
            return Err(self.error_here("expected a number"));
        }
        Ok(self.bump().value)
    }
}
