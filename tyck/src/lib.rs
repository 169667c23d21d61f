pub mod checker;
pub mod decl;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod order;
pub mod scc;

pub use checker::{CoreChecker, DeclChecker};
pub use decl::{Decl, ResolvedModule};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticHandler, Level};
pub use driver::{check_module, tyck_module, ModuleOptions, ModuleReport};
pub use error::{SccTyckingFailed, TyckError};
pub use order::{DependencyGraph, TyckOrder};
pub use scc::SccTycker;
