use crate::checker::{CoreChecker, DeclChecker};
use crate::decl::ResolvedModule;
use crate::diagnostics::{DelayedReporter, Diagnostic, DiagnosticHandler};
use crate::order::{DependencyGraph, TyckOrder};
use crate::scc::SccTycker;
use kernel::{Def, Env, EvalConfig, ShapeFactory, ShapeRegistry};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Module checking options
#[derive(Debug, Clone)]
pub struct ModuleOptions {
    /// Do not check components that depend on a failed or skipped one.
    pub skip_dependents: bool,
    /// Export example declarations along with the rest.
    pub keep_examples: bool,
    pub eval: EvalConfig,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        ModuleOptions {
            skip_dependents: true,
            keep_examples: false,
            eval: EvalConfig::default(),
        }
    }
}

/// Outcome of checking one module.
#[derive(Debug, Default)]
pub struct ModuleReport {
    /// Accepted definitions in checking order
    pub well_typed: Vec<Def>,
    pub failed: Vec<TyckOrder>,
    pub skipped: Vec<TyckOrder>,
}

impl ModuleReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.well_typed.iter().map(Def::name).collect()
    }
}

/// Check every declaration of `module`, dependencies first.
///
/// Diagnostics are buffered and handed to `reporter` once the module is
/// done. `on_tycked` receives the accepted definitions exactly once, even
/// when some components failed.
pub fn check_module(
    module: &ResolvedModule,
    graph: &DependencyGraph,
    checker: &mut dyn DeclChecker,
    shapes: &mut dyn ShapeRegistry,
    reporter: &mut dyn DiagnosticHandler,
    options: &ModuleOptions,
    on_tycked: Option<&mut dyn FnMut(&[Def])>,
) -> ModuleReport {
    let order = graph.topological_order();
    debug!("module has {} components", order.len());

    let mut report = ModuleReport::default();
    let mut delayed = DelayedReporter::new(reporter);
    {
        let mut tycker = SccTycker::new(module, graph, checker, shapes, &mut delayed)
            .with_env(Env::with_config(options.eval))
            .keep_examples(options.keep_examples);
        // units that must not be relied upon
        let mut poisoned: HashSet<TyckOrder> = HashSet::new();

        for scc in &order {
            if options.skip_dependents && graph.depends_on_any(scc, &poisoned) {
                let names: Vec<String> = scc.iter().map(|o| module.name_of(o.unit())).collect();
                warn!("skipping {:?}: depends on a declaration that failed", names);
                let mut diagnostic = Diagnostic::warning(format!(
                    "Skipped {} because a dependency failed to check",
                    names.join(", ")
                ))
                .with_code("W0301");
                diagnostic.decls = names;
                tycker.report(diagnostic);
                poisoned.extend(scc.iter().copied());
                report.skipped.extend(scc.iter().copied());
                continue;
            }
            if let Err(failure) = tycker.tyck_scc(scc) {
                debug!("component failed at {:?}", failure.what);
                poisoned.extend(scc.iter().copied());
                report.failed.extend(failure.what);
            }
        }
        report.well_typed = tycker.into_well_typed();
    }
    delayed.flush();
    drop(delayed);

    info!(
        "checked module: {} accepted, {} failed, {} skipped",
        report.well_typed.len(),
        report.failed.len(),
        report.skipped.len()
    );
    if let Some(callback) = on_tycked {
        callback(report.well_typed.as_slice());
    }
    report
}

/// [`check_module`] with the structural core checker, a fresh shape
/// registry and default options.
pub fn tyck_module(module: &ResolvedModule, reporter: &mut dyn DiagnosticHandler) -> ModuleReport {
    let graph = DependencyGraph::from_module(module);
    let mut checker = CoreChecker::for_module(module);
    let mut shapes = ShapeFactory::new();
    check_module(
        module,
        &graph,
        &mut checker,
        &mut shapes,
        reporter,
        &ModuleOptions::default(),
        None,
    )
}
