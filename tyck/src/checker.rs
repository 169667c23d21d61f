use crate::decl::{Decl, ResolvedModule};
use crate::diagnostics::DiagnosticHandler;
use crate::error::TyckError;
use kernel::{Def, DefId, Term};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Checks individual declarations on behalf of the scheduler.
///
/// Failures are reported through `reporter`; the scheduler decides what
/// a failure means for the rest of the component.
pub trait DeclChecker {
    fn check_header(&mut self, decl: &Decl, reporter: &mut dyn DiagnosticHandler);

    /// The accepted definition, or `None` if the body was rejected.
    fn check_body(&mut self, decl: &Decl, reporter: &mut dyn DiagnosticHandler) -> Option<Def>;
}

/// Structural checks on elaborated core definitions: every bound variable
/// has a binder, and every referenced definition has a checked signature.
/// Only bodies may mention the definition they belong to.
#[derive(Debug, Default)]
pub struct CoreChecker {
    headers: HashSet<DefId>,
    names: HashMap<DefId, String>,
}

impl CoreChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_module(module: &ResolvedModule) -> Self {
        CoreChecker {
            headers: HashSet::new(),
            names: module
                .decls()
                .map(|decl| (decl.id(), decl.name().to_string()))
                .collect(),
        }
    }

    /// Treat the signatures of `known` (imports) as checked.
    pub fn with_known(mut self, known: impl IntoIterator<Item = DefId>) -> Self {
        self.headers.extend(known);
        self
    }

    pub fn knows(&self, id: DefId) -> bool {
        self.headers.contains(&id)
    }

    fn name_of(&self, id: DefId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("{:?}", id))
    }

    fn check(
        &self,
        decl: &Decl,
        terms: Vec<(usize, &Rc<Term>)>,
        refs: impl IntoIterator<Item = DefId>,
        recursive: bool,
    ) -> Vec<TyckError> {
        let mut errors = Vec::new();
        for (depth, term) in terms {
            if let Some((index, depth)) = term.first_ill_scoped(depth) {
                errors.push(TyckError::IllScoped {
                    name: decl.name().to_string(),
                    index,
                    depth,
                });
            }
        }
        for referenced in refs {
            if recursive && referenced == decl.id() {
                continue;
            }
            if !self.knows(referenced) {
                errors.push(TyckError::NotYetTycked {
                    name: decl.name().to_string(),
                    referenced: self.name_of(referenced),
                });
            }
        }
        errors
    }
}

/// `true` if there was nothing to report.
fn report_all(errors: Vec<TyckError>, reporter: &mut dyn DiagnosticHandler) -> bool {
    let ok = errors.is_empty();
    for error in errors {
        reporter.handle(error.to_diagnostic());
    }
    ok
}

impl DeclChecker for CoreChecker {
    fn check_header(&mut self, decl: &Decl, reporter: &mut dyn DiagnosticHandler) {
        let errors = self.check(decl, decl.def.signature_terms(), decl.def.header_refs(), false);
        if report_all(errors, reporter) {
            debug!("signature of {} accepted", decl.name());
            self.headers.insert(decl.id());
        }
    }

    fn check_body(&mut self, decl: &Decl, reporter: &mut dyn DiagnosticHandler) -> Option<Def> {
        let errors = self.check(decl, decl.def.body_terms(), decl.def.body_refs(), true);
        report_all(errors, reporter).then(|| decl.def.clone())
    }
}
