use crate::ast::{ConHead, DefId, Term};
use crate::def::{DataDef, Def};
use indexmap::IndexMap;
use log::debug;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `zero` plus `suc` taking one argument of the type itself
    Nat,
}

/// Evidence that a data type has a known shape, with its constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeRecognition {
    pub shape: Shape,
    pub data: DefId,
    pub zero: DefId,
    pub suc: DefId,
}

impl ShapeRecognition {
    pub fn con_head(&self, con: DefId) -> ConHead {
        ConHead {
            data: self.data,
            con,
            ulift: 0,
            data_args: vec![],
        }
    }
}

/// Learns shapes from definitions as they are accepted.
pub trait ShapeRegistry {
    fn recognize(&mut self, def: &Def) -> Option<ShapeRecognition>;
}

#[derive(Debug, Default)]
pub struct ShapeFactory {
    discovered: IndexMap<DefId, ShapeRecognition>,
}

impl ShapeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, data: DefId) -> Option<&ShapeRecognition> {
        self.discovered.get(&data)
    }

    /// Numeral `n` of a recognized data type.
    pub fn integer(&self, data: DefId, n: usize) -> Option<Rc<Term>> {
        self.find(data)
            .map(|recognition| Term::integer(n, recognition.clone()))
    }

    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }
}

impl ShapeRegistry for ShapeFactory {
    fn recognize(&mut self, def: &Def) -> Option<ShapeRecognition> {
        let Def::Data(data) = def else {
            return None;
        };
        let recognition = recognize_nat(data)?;
        debug!("recognized `{}` as {:?}", data.name, recognition.shape);
        self.discovered.insert(data.id, recognition.clone());
        Some(recognition)
    }
}

fn recognize_nat(data: &DataDef) -> Option<ShapeRecognition> {
    if !data.telescope.is_empty() || data.cons.len() != 2 {
        return None;
    }
    let zero = data.cons.iter().find(|con| con.telescope.is_empty())?;
    let is_self = |ty: &Rc<Term>| {
        matches!(&**ty, Term::DataCall(call) if call.def == data.id && call.args.is_empty())
    };
    let suc = data
        .cons
        .iter()
        .find(|con| matches!(con.telescope.as_slice(), [param] if is_self(&param.ty)))?;
    Some(ShapeRecognition {
        shape: Shape::Nat,
        data: data.id,
        zero: zero.id,
        suc: suc.id,
    })
}
