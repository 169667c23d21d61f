//! Size-change termination checking.
//!
//! [`CallResolver`] turns every recursive call into a [`CallMatrix`]
//! relating the arguments to the parameters of the caller. A set of
//! definitions terminates when, after closing the [`CallGraph`] under
//! composition, every idempotent self-call strictly decreases some
//! parameter.

pub mod graph;
pub mod relation;
pub mod resolver;

pub use graph::CallGraph;
pub use relation::{CallMatrix, Relation};
pub use resolver::{resolve_calls, CallResolver, TargetSet};
