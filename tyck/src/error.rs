use crate::diagnostics::Diagnostic;
use crate::order::TyckOrder;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TyckError {
    #[error("Circular signature dependency found between {}", .names.join(", "))]
    CircularSignature { names: Vec<String> },
    #[error("Self-reference found in the signature of {name}")]
    SelfReference { name: String },
    #[error("The recursive definition {name} is not defined by pattern matching")]
    BadRecursion { name: String },
    #[error("The recursion of {name} may not terminate: no argument decreases along the cycle {}", .cycle.join(" -> "))]
    TerminationFailure { name: String, cycle: Vec<String> },
    #[error("{referenced} is used in {name} before it has been checked")]
    NotYetTycked { name: String, referenced: String },
    #[error("Bound variable #{index} escapes its {depth} enclosing binder(s) in {name}")]
    IllScoped {
        name: String,
        index: usize,
        depth: usize,
    },
    #[error("Checking {name} produced no definition")]
    MissingDefinition { name: String },
    #[error("Unreachable scheduler state: {0}")]
    Unreachable(String),
}

impl TyckError {
    pub fn code(&self) -> &'static str {
        match self {
            TyckError::CircularSignature { .. } => "E0301",
            TyckError::SelfReference { .. } => "E0302",
            TyckError::BadRecursion { .. } => "E0303",
            TyckError::TerminationFailure { .. } => "E0304",
            TyckError::NotYetTycked { .. } => "E0305",
            TyckError::IllScoped { .. } => "E0306",
            TyckError::MissingDefinition { .. } => "E0307",
            TyckError::Unreachable(_) => "E0399",
        }
    }

    fn decls(&self) -> Vec<String> {
        match self {
            TyckError::CircularSignature { names } => names.clone(),
            TyckError::SelfReference { name }
            | TyckError::BadRecursion { name }
            | TyckError::TerminationFailure { name, .. }
            | TyckError::NotYetTycked { name, .. }
            | TyckError::IllScoped { name, .. }
            | TyckError::MissingDefinition { name } => vec![name.clone()],
            TyckError::Unreachable(_) => vec![],
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(self.to_string()).with_code(self.code());
        diagnostic.decls = self.decls();
        diagnostic
    }
}

/// A component could not be accepted; `what` holds the failing units.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to check {} unit(s)", .what.len())]
pub struct SccTyckingFailed {
    pub what: Vec<TyckOrder>,
}

impl SccTyckingFailed {
    pub fn new(what: Vec<TyckOrder>) -> Self {
        Self { what }
    }

    pub fn of(order: TyckOrder) -> Self {
        Self::new(vec![order])
    }
}
