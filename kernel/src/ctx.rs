use crate::ast::{LocalVar, Term};
use indexmap::IndexMap;
use std::rc::Rc;

/// Typing context of free variables, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LocalCtx {
    vars: IndexMap<LocalVar, Rc<Term>>,
}

impl LocalCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, var: LocalVar, ty: Rc<Term>) {
        self.vars.insert(var, ty);
    }

    pub fn get(&self, var: &LocalVar) -> Option<&Rc<Term>> {
        self.vars.get(var)
    }

    pub fn contains(&self, var: &LocalVar) -> bool {
        self.vars.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn vars(&self) -> impl Iterator<Item = &LocalVar> {
        self.vars.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocalVar, &Rc<Term>)> {
        self.vars.iter()
    }
}
