use kernel::{Def, DefId};
use indexmap::IndexMap;

/// A declaration after elaboration, waiting to be checked.
#[derive(Debug, Clone)]
pub struct Decl {
    pub def: Def,
    /// Examples are checked but never exported.
    pub example: bool,
}

impl Decl {
    pub fn new(def: Def) -> Self {
        Decl {
            def,
            example: false,
        }
    }

    pub fn example(def: Def) -> Self {
        Decl { def, example: true }
    }

    pub fn id(&self) -> DefId {
        self.def.id()
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }
}

/// The declarations of one module, in source order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedModule {
    decls: IndexMap<DefId, Decl>,
}

impl ResolvedModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, decl: Decl) {
        self.decls.insert(decl.id(), decl);
    }

    pub fn with(mut self, decl: Decl) -> Self {
        self.add(decl);
        self
    }

    pub fn get(&self, id: DefId) -> Option<&Decl> {
        self.decls.get(&id)
    }

    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.decls.values()
    }

    pub fn position(&self, id: DefId) -> Option<usize> {
        self.decls.get_index_of(&id)
    }

    /// Display name of a declaration, falling back to its id.
    pub fn name_of(&self, id: DefId) -> String {
        self.get(id)
            .map(|decl| decl.name().to_string())
            .unwrap_or_else(|| format!("{:?}", id))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
