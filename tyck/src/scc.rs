use crate::checker::DeclChecker;
use crate::decl::{Decl, ResolvedModule};
use crate::diagnostics::{CountingReporter, Diagnostic, DiagnosticHandler};
use crate::error::{SccTyckingFailed, TyckError};
use crate::order::{DependencyGraph, TyckOrder};
use indexmap::IndexSet;
use kernel::terck::{resolve_calls, CallGraph, TargetSet};
use kernel::{Def, DefId, Env, FnDef, ShapeRegistry};
use log::{debug, warn};
use std::collections::HashSet;
use std::rc::Rc;

/// Checks one strongly connected component of the dependency graph at a
/// time and accumulates the accepted definitions.
///
/// A component is committed only once all of its units pass, so nothing
/// from a failing component reaches the environment.
pub struct SccTycker<'a> {
    module: &'a ResolvedModule,
    graph: &'a DependencyGraph,
    checker: &'a mut dyn DeclChecker,
    shapes: &'a mut dyn ShapeRegistry,
    reporter: CountingReporter<'a>,
    env: Env,
    checked_headers: HashSet<DefId>,
    /// Headers accepted while checking the current component
    fresh_headers: Vec<DefId>,
    well_typed: Vec<Def>,
    keep_examples: bool,
}

impl<'a> SccTycker<'a> {
    pub fn new(
        module: &'a ResolvedModule,
        graph: &'a DependencyGraph,
        checker: &'a mut dyn DeclChecker,
        shapes: &'a mut dyn ShapeRegistry,
        reporter: &'a mut dyn DiagnosticHandler,
    ) -> Self {
        SccTycker {
            module,
            graph,
            checker,
            shapes,
            reporter: CountingReporter::new(reporter),
            env: Env::new(),
            checked_headers: HashSet::new(),
            fresh_headers: Vec::new(),
            well_typed: Vec::new(),
            keep_examples: false,
        }
    }

    /// Definitions visible to normalization, e.g. from imports.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn keep_examples(mut self, keep: bool) -> Self {
        self.keep_examples = keep;
        self
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn well_typed(&self) -> &[Def] {
        &self.well_typed
    }

    pub fn into_well_typed(self) -> Vec<Def> {
        self.well_typed
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.reporter.handle(diagnostic);
    }

    pub fn tyck_scc(&mut self, scc: &[TyckOrder]) -> Result<(), SccTyckingFailed> {
        debug!("checking component {:?}", scc);
        self.fresh_headers.clear();
        let result = match scc {
            [] => Ok(()),
            [order] => self.check_unit(*order),
            _ => self.check_mutual(scc),
        };
        if result.is_err() {
            for id in self.fresh_headers.drain(..) {
                self.checked_headers.remove(&id);
            }
            self.reporter.clear();
        }
        result
    }

    fn check_unit(&mut self, order: TyckOrder) -> Result<(), SccTyckingFailed> {
        let decl = self.decl(order)?;
        match order {
            TyckOrder::Head(_) => {
                if self.graph.self_referencing(&order) {
                    return self.fail(
                        vec![order],
                        TyckError::SelfReference {
                            name: decl.name().to_string(),
                        },
                    );
                }
                self.check_header(order, decl)
            }
            TyckOrder::Body(_) => {
                let recursive = self.graph.self_referencing(&order);
                if recursive && decl.def.is_expr_fn() {
                    return self.fail(
                        vec![order],
                        TyckError::BadRecursion {
                            name: decl.name().to_string(),
                        },
                    );
                }
                self.check_header(order, decl)?;
                let def = self.check_body(order, decl)?;
                let pending = vec![(decl, def)];
                if recursive {
                    self.check_termination(&pending, &[order])?;
                }
                self.commit(pending);
                Ok(())
            }
        }
    }

    fn check_mutual(&mut self, scc: &[TyckOrder]) -> Result<(), SccTyckingFailed> {
        let heads = scc.iter().filter(|order| order.is_head()).count();
        if heads >= 2 {
            let mut names: Vec<String> = scc.iter().map(|order| self.module.name_of(order.unit())).collect();
            names.sort();
            names.dedup();
            return self.fail(scc.to_vec(), TyckError::CircularSignature { names });
        }

        let mut units: Vec<DefId> = scc.iter().map(TyckOrder::unit).collect::<IndexSet<_>>().into_iter().collect();
        units.sort_by_key(|id| self.module.position(*id));
        if let [unit] = units.as_slice() {
            return self.check_unit(TyckOrder::Body(*unit));
        }

        let mut decls = Vec::with_capacity(units.len());
        for unit in &units {
            let order = TyckOrder::Body(*unit);
            let decl = self.decl(order)?;
            self.check_header(order, decl)?;
            decls.push(decl);
        }
        let mut pending = Vec::with_capacity(decls.len());
        for decl in decls {
            let def = self.check_body(TyckOrder::Body(decl.id()), decl)?;
            pending.push((decl, def));
        }
        self.check_termination(&pending, scc)?;
        self.commit(pending);
        Ok(())
    }

    /// Signatures are checked at most once.
    fn check_header(&mut self, order: TyckOrder, decl: &Decl) -> Result<(), SccTyckingFailed> {
        if self.checked_headers.contains(&decl.id()) {
            return Ok(());
        }
        self.checker.check_header(decl, &mut self.reporter);
        if self.reporter.any_error() {
            return Err(SccTyckingFailed::of(order));
        }
        self.checked_headers.insert(decl.id());
        self.fresh_headers.push(decl.id());
        Ok(())
    }

    fn check_body(&mut self, order: TyckOrder, decl: &Decl) -> Result<Def, SccTyckingFailed> {
        let def = self.checker.check_body(decl, &mut self.reporter);
        if self.reporter.any_error() {
            return Err(SccTyckingFailed::of(order));
        }
        match def {
            Some(def) => Ok(def),
            None => Err(self.report_failure(
                vec![order],
                TyckError::MissingDefinition {
                    name: decl.name().to_string(),
                },
            )),
        }
    }

    fn check_termination(&mut self, pending: &[(&Decl, Def)], scc: &[TyckOrder]) -> Result<(), SccTyckingFailed> {
        let fns: Vec<Rc<FnDef>> = pending.iter().filter_map(|(_, def)| def.as_fn().cloned()).collect();
        if fns.is_empty() {
            return Ok(());
        }
        let targets = TargetSet::from_defs(pending.iter().map(|(_, def)| def));
        let mut calls = CallGraph::new();
        resolve_calls(&self.env, &fns, &targets, &mut calls);

        let bad = calls.find_bad_recursion();
        if bad.is_empty() {
            return Ok(());
        }
        let components = calls.components();
        let mut failing: IndexSet<DefId> = IndexSet::new();
        for matrix in &bad {
            if !failing.insert(matrix.caller()) {
                continue;
            }
            let cycle: Vec<DefId> = components
                .iter()
                .find(|component| component.contains(&matrix.caller()))
                .cloned()
                .unwrap_or_else(|| vec![matrix.caller()]);
            warn!("termination check failed for {}:\n{}", self.module.name_of(matrix.caller()), matrix);
            let error = TyckError::TerminationFailure {
                name: self.module.name_of(matrix.caller()),
                cycle: cycle.iter().map(|id| self.module.name_of(*id)).collect(),
            };
            self.reporter.handle(error.to_diagnostic());
        }
        let what = scc
            .iter()
            .copied()
            .filter(|order| !order.is_head() && failing.contains(&order.unit()))
            .collect::<Vec<_>>();
        Err(SccTyckingFailed::new(if what.is_empty() { scc.to_vec() } else { what }))
    }

    fn commit(&mut self, pending: Vec<(&Decl, Def)>) {
        for (decl, def) in pending {
            if decl.example && !self.keep_examples {
                debug!("{} is an example, not exported", decl.name());
                continue;
            }
            self.env.add_definition(&def);
            self.shapes.recognize(&def);
            self.well_typed.push(def);
        }
    }

    fn decl(&mut self, order: TyckOrder) -> Result<&'a Decl, SccTyckingFailed> {
        let module = self.module;
        match module.get(order.unit()) {
            Some(decl) => Ok(decl),
            None => Err(self.report_failure(
                vec![order],
                TyckError::Unreachable(format!("{:?} is not declared in this module", order)),
            )),
        }
    }

    fn report_failure(&mut self, what: Vec<TyckOrder>, error: TyckError) -> SccTyckingFailed {
        self.reporter.handle(error.to_diagnostic());
        SccTyckingFailed::new(what)
    }

    fn fail(&mut self, what: Vec<TyckOrder>, error: TyckError) -> Result<(), SccTyckingFailed> {
        Err(self.report_failure(what, error))
    }
}
