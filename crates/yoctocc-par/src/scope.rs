//! Lexical scopes.
//!
//! Two namespaces per scope frame: variables and struct/union tags.
//! Frames form a stack; lookups search from the innermost frame outward.
//! Within a frame a later binding shadows an earlier one of the same
//! name.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::ObjId;
use crate::types::Type;

#[derive(Default)]
struct Frame {
    vars: IndexMap<String, ObjId>,
    tags: IndexMap<String, Rc<Type>>,
}

/// The scope stack. Created with a single global frame.
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Pushes a fresh innermost frame.
    pub fn enter(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pops the innermost frame. The global frame is never popped.
    pub fn leave(&mut self) {
        debug_assert!(self.frames.len() > 1);
        self.frames.pop();
    }

    /// Binds a variable name in the innermost frame.
    pub fn push_var(&mut self, name: String, id: ObjId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.vars.insert(name, id);
        }
    }

    /// Binds a struct/union tag in the innermost frame.
    pub fn push_tag(&mut self, name: String, ty: Rc<Type>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.tags.insert(name, ty);
        }
    }

    /// Resolves a variable, innermost frame first.
    pub fn find_var(&self, name: &str) -> Option<ObjId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.vars.get(name).copied())
    }

    /// Resolves a struct/union tag, innermost frame first.
    pub fn find_tag(&self, name: &str) -> Option<Rc<Type>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.tags.get(name).cloned())
    }

    /// Current nesting depth, counting the global frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_shadows_outer() {
        let mut scope = ScopeStack::new();
        scope.push_var("x".into(), ObjId(0));
        scope.enter();
        scope.push_var("x".into(), ObjId(1));
        assert_eq!(scope.find_var("x"), Some(ObjId(1)));
        scope.leave();
        assert_eq!(scope.find_var("x"), Some(ObjId(0)));
    }

    #[test]
    fn test_outer_still_visible_from_inner() {
        let mut scope = ScopeStack::new();
        scope.push_var("a".into(), ObjId(3));
        scope.enter();
        assert_eq!(scope.find_var("a"), Some(ObjId(3)));
        assert_eq!(scope.find_var("b"), None);
    }

    #[test]
    fn test_bindings_dropped_on_leave() {
        let mut scope = ScopeStack::new();
        scope.enter();
        scope.push_var("tmp".into(), ObjId(7));
        scope.leave();
        assert_eq!(scope.find_var("tmp"), None);
    }

    #[test]
    fn test_tag_namespace_is_separate() {
        let mut scope = ScopeStack::new();
        scope.push_var("t".into(), ObjId(0));
        assert!(scope.find_tag("t").is_none());
        scope.push_tag("t".into(), Type::int_type());
        assert!(scope.find_tag("t").is_some());
        assert_eq!(scope.find_var("t"), Some(ObjId(0)));
    }

    #[test]
    fn test_depth() {
        let mut scope = ScopeStack::new();
        assert_eq!(scope.depth(), 1);
        scope.enter();
        scope.enter();
        assert_eq!(scope.depth(), 3);
        scope.leave();
        scope.leave();
        assert_eq!(scope.depth(), 1);
    }
}
