use crate::decl::ResolvedModule;
use kernel::graph::Graph;
use kernel::DefId;
use std::collections::HashSet;

/// A unit of checking: the signature or the body of one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TyckOrder {
    Head(DefId),
    Body(DefId),
}

impl TyckOrder {
    pub fn unit(&self) -> DefId {
        match self {
            TyckOrder::Head(id) | TyckOrder::Body(id) => *id,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self, TyckOrder::Head(_))
    }
}

/// Edges point from a unit to the units it needs.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: Graph<TyckOrder>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signatures need the signatures they mention; bodies need their own
    /// signature, the signatures they mention and, when recursion is
    /// involved, the bodies too. Names from outside the module are assumed
    /// to be checked already.
    pub fn from_module(module: &ResolvedModule) -> Self {
        let mut deps = DependencyGraph::new();
        for decl in module.decls() {
            let id = decl.id();
            deps.add_node(TyckOrder::Head(id));
            deps.add_edge(TyckOrder::Body(id), TyckOrder::Head(id));
        }
        for decl in module.decls() {
            let id = decl.id();
            for referenced in decl.def.header_refs() {
                if module.get(referenced).is_some() {
                    deps.add_edge(TyckOrder::Head(id), TyckOrder::Head(referenced));
                }
            }
            for referenced in decl.def.body_refs() {
                if module.get(referenced).is_some() {
                    deps.add_edge(TyckOrder::Body(id), TyckOrder::Body(referenced));
                }
            }
        }
        deps
    }

    pub fn add_node(&mut self, order: TyckOrder) {
        self.graph.add_vertex(order);
    }

    pub fn add_edge(&mut self, from: TyckOrder, to: TyckOrder) {
        self.graph.add_edge(from, to);
    }

    pub fn contains(&self, order: &TyckOrder) -> bool {
        self.graph.contains(order)
    }

    pub fn suc(&self, order: &TyckOrder) -> impl Iterator<Item = &TyckOrder> {
        self.graph.suc(order)
    }

    pub fn has_suc(&self, from: &TyckOrder, to: &TyckOrder) -> bool {
        self.graph.has_suc(from, to)
    }

    pub fn self_referencing(&self, order: &TyckOrder) -> bool {
        self.graph.self_referencing(order)
    }

    /// Components with dependencies first.
    pub fn topological_order(&self) -> Vec<Vec<TyckOrder>> {
        self.graph.topological_order()
    }

    /// Whether some member of `component` has a direct dependency in `set`.
    pub fn depends_on_any(&self, component: &[TyckOrder], set: &HashSet<TyckOrder>) -> bool {
        component
            .iter()
            .flat_map(|order| self.suc(order))
            .any(|dependency| set.contains(dependency) && !component.contains(dependency))
    }
}
