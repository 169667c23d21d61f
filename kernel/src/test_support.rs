//! Builders shared by unit and integration tests.

use crate::ast::{DefId, Term};
use crate::def::{ConDef, DataDef, Def, FnBody, FnDef, Param};
use crate::pat::Pat;
use crate::shape::{Shape, ShapeRecognition};
use std::rc::Rc;

/// `data Nat | zero | suc Nat`
pub struct NatFixture {
    pub id: DefId,
    pub zero: DefId,
    pub suc: DefId,
    pub data: Rc<DataDef>,
}

pub fn nat() -> NatFixture {
    nat_named("Nat")
}

pub fn nat_named(name: &str) -> NatFixture {
    let id = DefId::new(name);
    let zero = DefId::new(format!("{name}::zero"));
    let suc = DefId::new(format!("{name}::suc"));
    let data = Rc::new(DataDef {
        id,
        name: name.to_string(),
        telescope: vec![],
        cons: vec![
            ConDef {
                id: zero,
                name: "zero".to_string(),
                data: id,
                telescope: vec![],
            },
            ConDef {
                id: suc,
                name: "suc".to_string(),
                data: id,
                telescope: vec![Param::new("n", Term::data_call(id, vec![]))],
            },
        ],
    });
    NatFixture { id, zero, suc, data }
}

impl NatFixture {
    pub fn def(&self) -> Def {
        Def::Data(self.data.clone())
    }

    pub fn ty(&self) -> Rc<Term> {
        Term::data_call(self.id, vec![])
    }

    pub fn recognition(&self) -> ShapeRecognition {
        ShapeRecognition {
            shape: Shape::Nat,
            data: self.id,
            zero: self.zero,
            suc: self.suc,
        }
    }

    pub fn zero_term(&self) -> Rc<Term> {
        Term::con_call(self.id, self.zero, vec![])
    }

    pub fn suc_term(&self, n: Rc<Term>) -> Rc<Term> {
        Term::con_call(self.id, self.suc, vec![n])
    }

    pub fn zero_pat(&self) -> Rc<Pat> {
        Pat::con(self.recognition().con_head(self.zero), vec![])
    }

    pub fn suc_pat(&self, n: Rc<Pat>) -> Rc<Pat> {
        Pat::con(self.recognition().con_head(self.suc), vec![n])
    }
}

pub fn param(name: &str, ty: Rc<Term>) -> Param {
    Param::new(name, ty)
}

pub fn fn_def(name: &str, telescope: Vec<Param>, result: Rc<Term>, body: FnBody) -> Rc<FnDef> {
    Rc::new(FnDef {
        id: DefId::new(name),
        name: name.to_string(),
        telescope,
        result,
        body,
    })
}
