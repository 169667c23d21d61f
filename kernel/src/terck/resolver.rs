use super::graph::CallGraph;
use super::relation::{CallMatrix, Relation};
use crate::ast::{DefId, LocalVar, Term};
use crate::def::{Def, FnBody, FnDef, Matching};
use crate::normalize::Whnf;
use crate::pat::Pat;
use crate::shape::ShapeRecognition;
use indexmap::IndexMap;
use log::trace;
use std::rc::Rc;

/// Definitions whose calls are recorded, with their arities.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    arities: IndexMap<DefId, usize>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs<'a>(defs: impl IntoIterator<Item = &'a Def>) -> Self {
        let mut targets = TargetSet::new();
        for def in defs {
            targets.insert(def.id(), def.telescope().len());
        }
        targets
    }

    pub fn insert(&mut self, id: DefId, arity: usize) {
        self.arities.insert(id, arity);
    }

    pub fn arity(&self, id: DefId) -> Option<usize> {
        self.arities.get(&id).copied()
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.arities.contains_key(&id)
    }
}

/// Walks the body of one function and records a call matrix for every
/// call to a target.
pub struct CallResolver<'a, N: Whnf + ?Sized> {
    normalizer: &'a N,
    caller: &'a FnDef,
    targets: &'a TargetSet,
    graph: &'a mut CallGraph,
}

impl<'a, N: Whnf + ?Sized> CallResolver<'a, N> {
    pub fn new(
        normalizer: &'a N,
        caller: &'a FnDef,
        targets: &'a TargetSet,
        graph: &'a mut CallGraph,
    ) -> Self {
        CallResolver {
            normalizer,
            caller,
            targets,
            graph,
        }
    }

    pub fn check(&mut self) {
        let caller = self.caller;
        match &caller.body {
            FnBody::Clauses(clauses) => clauses.iter().for_each(|clause| self.check_clause(clause)),
            FnBody::Expr(body) => {
                // an expression body matches every parameter with a plain binder
                let vars: Vec<LocalVar> = caller
                    .telescope
                    .iter()
                    .map(|param| LocalVar::fresh(param.name.clone()))
                    .collect();
                let patterns: Vec<Rc<Pat>> = vars
                    .iter()
                    .zip(&caller.telescope)
                    .map(|(var, param)| Pat::bind(var, param.ty.clone()))
                    .collect();
                let body = body.instantiate_tele_vars(&vars);
                self.visit_term(&body, &patterns);
            }
        }
    }

    fn check_clause(&mut self, clause: &Matching) {
        let vars: Vec<LocalVar> = Pat::collect_all_bindings(&clause.patterns)
            .into_iter()
            .map(|(var, _)| var)
            .collect();
        let body = clause.body.instantiate_tele_vars(&vars);
        self.visit_term(&body, &clause.patterns);
    }

    fn visit_term(&mut self, term: &Rc<Term>, patterns: &[Rc<Pat>]) {
        match &**term {
            Term::FnCall(call) | Term::DataCall(call) => {
                self.resolve_call(term, call.def, &call.args, patterns)
            }
            Term::ConCall(call) => self.resolve_call(term, call.head.con, &call.args, patterns),
            _ => {}
        }
        term.visit_children(|_, child| self.visit_term(child, patterns));
    }

    fn resolve_call(&mut self, term: &Rc<Term>, callee: DefId, args: &[Rc<Term>], patterns: &[Rc<Pat>]) {
        let Some(arity) = self.targets.arity(callee) else {
            return;
        };
        let mut matrix = CallMatrix::new(
            term.clone(),
            self.caller.id,
            callee,
            self.caller.telescope.len(),
            arity,
        );
        for (row, pat) in patterns.iter().enumerate() {
            for (col, arg) in args.iter().enumerate().take(arity) {
                matrix.set(row, col, self.compare(arg, pat));
            }
        }
        trace!("call {} -> {:?}:\n{}", self.caller.name, callee, matrix);
        self.graph.put(matrix);
    }

    /// How `term` relates to what `pat` matched.
    pub fn compare(&self, term: &Rc<Term>, pat: &Pat) -> Relation {
        match pat {
            Pat::Con { head, args } => self.compare_con(term, head.con, args, true),
            Pat::Bind { var, .. } => {
                if let Term::Free(name) = &**term {
                    return if name == var { Relation::Equal } else { Relation::Unknown };
                }
                match head_of(term) {
                    Term::Free(name) if name == var => Relation::LessThan,
                    _ => Relation::Unknown,
                }
            }
            Pat::ShapedInt { repr, recognition } => self.compare_shaped(term, *repr, recognition),
            Pat::Tuple(_) | Pat::Absurd | Pat::Meta { .. } => Relation::Unknown,
        }
    }

    /// `reduce` allows a single normalization of `term`.
    fn compare_con(&self, term: &Rc<Term>, con: DefId, pats: &[Rc<Pat>], reduce: bool) -> Relation {
        if let Some((term_con, con_args)) = term.as_con_call_like() {
            if term_con != con || con_args.len() != pats.len() {
                return Relation::Unknown;
            }
            let relation = self.compare_con_args(&con_args, pats);
            if relation != Relation::Unknown {
                return relation;
            }
            let reduced: Vec<Rc<Term>> = con_args.iter().map(|arg| self.normalizer.whnf(arg)).collect();
            return self.compare_con_args(&reduced, pats);
        }
        // the term may be one of the sub-patterns, hence smaller than the whole
        if pats.iter().any(|sub| self.compare(term, sub) != Relation::Unknown) {
            return Relation::LessThan;
        }
        if !reduce {
            return Relation::Unknown;
        }
        let reduced = self.normalizer.whnf(term);
        match &*reduced {
            Term::ConCall(_) | Term::Integer(_) => self.compare_con(&reduced, con, pats, false),
            Term::PApp(..) => {
                let mut head = &reduced;
                while let Term::PApp(fun, _) = &**head {
                    head = fun;
                }
                self.compare_con(head, con, pats, false)
            }
            _ => Relation::Unknown,
        }
    }

    /// Peels `suc` calls off `term` one numeral unit at a time; the literal
    /// is never unfolded into its constructor form. A term that is neither a
    /// numeral nor a constructor call is normalized once, and a path
    /// application it reduces to is compared by its head.
    fn compare_shaped(&self, term: &Rc<Term>, mut repr: usize, recognition: &ShapeRecognition) -> Relation {
        let mut term = term.clone();
        let mut reduced = false;
        loop {
            let next = match &*term {
                Term::Integer(lit) if lit.recognition.shape == recognition.shape => {
                    return Relation::from_ordering(lit.repr.cmp(&repr));
                }
                Term::Integer(_) => return Relation::Unknown,
                Term::ConCall(call) if repr == 0 => {
                    return if call.head.con == recognition.zero && call.args.is_empty() {
                        Relation::Equal
                    } else {
                        Relation::Unknown
                    };
                }
                Term::ConCall(call) => match call.args.as_slice() {
                    [pred] if call.head.con == recognition.suc => {
                        repr -= 1;
                        reduced = false;
                        pred.clone()
                    }
                    _ => return Relation::Unknown,
                },
                Term::PApp(fun, _) if reduced => fun.clone(),
                _ if !reduced => {
                    reduced = true;
                    self.normalizer.whnf(&term)
                }
                _ => return Relation::Unknown,
            };
            term = next;
        }
    }

    fn compare_con_args(&self, args: &[Rc<Term>], pats: &[Rc<Pat>]) -> Relation {
        Relation::product(args.iter().zip(pats).map(|(arg, pat)| self.compare(arg, pat)))
    }
}

/// Head of an application or projection spine.
fn head_of(term: &Term) -> &Term {
    match term {
        Term::App(fun, _) | Term::PApp(fun, _) => head_of(fun),
        Term::Proj(of, _) => head_of(of),
        _ => term,
    }
}

/// Record the calls that `fns` make to `targets` into `graph`.
pub fn resolve_calls<N: Whnf + ?Sized>(
    normalizer: &N,
    fns: &[Rc<FnDef>],
    targets: &TargetSet,
    graph: &mut CallGraph,
) {
    for def in fns {
        CallResolver::new(normalizer, def, targets, graph).check();
    }
}
