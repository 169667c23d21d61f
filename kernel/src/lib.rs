pub mod ast;
pub mod ctx;
pub mod def;
pub mod graph;
pub mod normalize;
pub mod pat;
pub mod shape;
pub mod terck;
pub mod test_support;

pub use ast::*;
pub use ctx::LocalCtx;
pub use def::{ConDef, DataDef, Def, FnBody, FnDef, Matching, Param};
pub use normalize::{default_eval_fuel, Env, EvalConfig, Whnf, DEFAULT_WHNF_FUEL};
pub use pat::{Pat, PatToTermError};
pub use shape::{Shape, ShapeFactory, ShapeRecognition, ShapeRegistry};
