//! Checked core definitions.

use crate::ast::{DefId, Term};
use crate::pat::Pat;
use indexmap::IndexSet;
use std::rc::Rc;

/// One entry of a telescope. The type of parameter `i` may refer to the
/// earlier parameters as `Local`s, the nearest one being `Local(0)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Rc<str>,
    pub ty: Rc<Term>,
    pub explicit: bool,
}

impl Param {
    pub fn new(name: impl Into<Rc<str>>, ty: Rc<Term>) -> Self {
        Param {
            name: name.into(),
            ty,
            explicit: true,
        }
    }

    pub fn implicit(name: impl Into<Rc<str>>, ty: Rc<Term>) -> Self {
        Param {
            explicit: false,
            ..Param::new(name, ty)
        }
    }
}

/// A clause `patterns => body`. The body sees the variables bound by the
/// patterns in telescope order, collected left to right, inner first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching {
    pub patterns: Vec<Rc<Pat>>,
    pub body: Rc<Term>,
}

impl Matching {
    pub fn new(patterns: Vec<Rc<Pat>>, body: Rc<Term>) -> Self {
        Matching { patterns, body }
    }

    pub fn binding_count(&self) -> usize {
        Pat::collect_all_bindings(&self.patterns).len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FnBody {
    /// Body is a single expression under the telescope.
    Expr(Rc<Term>),
    /// Defined by pattern matching.
    Clauses(Vec<Matching>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDef {
    pub id: DefId,
    pub name: String,
    pub telescope: Vec<Param>,
    pub result: Rc<Term>,
    pub body: FnBody,
}

/// A constructor. Its telescope lives under the data type's telescope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConDef {
    pub id: DefId,
    pub name: String,
    pub data: DefId,
    pub telescope: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDef {
    pub id: DefId,
    pub name: String,
    pub telescope: Vec<Param>,
    pub cons: Vec<ConDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Def {
    Fn(Rc<FnDef>),
    Data(Rc<DataDef>),
}

impl Def {
    pub fn id(&self) -> DefId {
        match self {
            Def::Fn(def) => def.id,
            Def::Data(def) => def.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Def::Fn(def) => &def.name,
            Def::Data(def) => &def.name,
        }
    }

    pub fn telescope(&self) -> &[Param] {
        match self {
            Def::Fn(def) => &def.telescope,
            Def::Data(def) => &def.telescope,
        }
    }

    pub fn as_fn(&self) -> Option<&Rc<FnDef>> {
        match self {
            Def::Fn(def) => Some(def),
            Def::Data(_) => None,
        }
    }

    /// Function whose body is one expression rather than clauses.
    pub fn is_expr_fn(&self) -> bool {
        matches!(self, Def::Fn(def) if matches!(def.body, FnBody::Expr(_)))
    }

    /// Terms of the signature, each paired with the number of binders in
    /// scope where it appears.
    pub fn signature_terms(&self) -> Vec<(usize, &Rc<Term>)> {
        let mut terms = telescope_terms(self.telescope(), 0);
        if let Def::Fn(def) = self {
            terms.push((def.telescope.len(), &def.result));
        }
        terms
    }

    /// Terms of the body (function clauses, constructor telescopes),
    /// each paired with its binder depth.
    pub fn body_terms(&self) -> Vec<(usize, &Rc<Term>)> {
        match self {
            Def::Fn(def) => match &def.body {
                FnBody::Expr(body) => vec![(def.telescope.len(), body)],
                FnBody::Clauses(clauses) => clauses
                    .iter()
                    .map(|clause| (clause.binding_count(), &clause.body))
                    .collect(),
            },
            Def::Data(def) => def
                .cons
                .iter()
                .flat_map(|con| telescope_terms(&con.telescope, def.telescope.len()))
                .collect(),
        }
    }

    pub fn header_refs(&self) -> IndexSet<DefId> {
        let mut refs = IndexSet::new();
        for (_, term) in self.signature_terms() {
            term.collect_refs(&mut refs);
        }
        refs
    }

    pub fn body_refs(&self) -> IndexSet<DefId> {
        let mut refs = IndexSet::new();
        for (_, term) in self.body_terms() {
            term.collect_refs(&mut refs);
        }
        if let Def::Fn(def) = self {
            if let FnBody::Clauses(clauses) = &def.body {
                for pat in clauses.iter().flat_map(|clause| &clause.patterns) {
                    pat.collect_refs(&mut refs);
                }
            }
        }
        refs
    }
}

fn telescope_terms(telescope: &[Param], base: usize) -> Vec<(usize, &Rc<Term>)> {
    telescope
        .iter()
        .enumerate()
        .map(|(index, param)| (base + index, &param.ty))
        .collect()
}
