#![allow(dead_code)]

use kernel::test_support::{fn_def, nat, param, NatFixture};
use kernel::{Def, DefId, FnBody, LocalVar, Matching, Pat, Term};
use std::collections::HashMap;
use std::rc::Rc;
use tyck::{CoreChecker, Decl, DeclChecker, Diagnostic, DiagnosticHandler, ResolvedModule};

pub fn id(name: &str) -> DefId {
    DefId::new(name)
}

pub fn call(name: &str, args: Vec<Rc<Term>>) -> Rc<Term> {
    Term::fn_call(id(name), args)
}

/// Module that starts with `data Nat`.
pub fn nat_module() -> (NatFixture, ResolvedModule) {
    let nat = nat();
    let module = ResolvedModule::new().with(Decl::new(nat.def()));
    (nat, module)
}

/// `name (x : Nat) : Nat` with an expression body.
pub fn expr_fn(nat: &NatFixture, name: &str, body: Rc<Term>) -> Decl {
    Decl::new(Def::Fn(fn_def(
        name,
        vec![param("x", nat.ty())],
        nat.ty(),
        FnBody::Expr(body),
    )))
}

/// `name zero = zero; name (suc n) = <recursive>` where `recursive` builds
/// the body from the index of `n`.
pub fn structural_fn(nat: &NatFixture, name: &str, recursive: impl FnOnce(Rc<Term>) -> Rc<Term>) -> Decl {
    let n = LocalVar::fresh("n");
    Decl::new(Def::Fn(fn_def(
        name,
        vec![param("x", nat.ty())],
        nat.ty(),
        FnBody::Clauses(vec![
            Matching::new(vec![nat.zero_pat()], nat.zero_term()),
            Matching::new(vec![nat.suc_pat(Pat::bind(&n, nat.ty()))], recursive(Term::local(0))),
        ]),
    )))
}

/// `name x = <body>` matching with a single binder.
pub fn catch_all_fn(nat: &NatFixture, name: &str, body: impl FnOnce(Rc<Term>) -> Rc<Term>) -> Decl {
    let x = LocalVar::fresh("x");
    Decl::new(Def::Fn(fn_def(
        name,
        vec![param("x", nat.ty())],
        nat.ty(),
        FnBody::Clauses(vec![Matching::new(vec![Pat::bind(&x, nat.ty())], body(Term::local(0)))]),
    )))
}

/// `name : <result>` with no parameters and body `zero`.
pub fn constant(nat: &NatFixture, name: &str, result: Rc<Term>) -> Decl {
    Decl::new(Def::Fn(fn_def(name, vec![], result, FnBody::Expr(nat.zero_term()))))
}

/// Body refers to a variable with no binder.
pub fn ill_scoped(nat: &NatFixture, name: &str) -> Decl {
    expr_fn(nat, name, Term::local(7))
}

pub fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(Diagnostic::message_with_code).collect()
}

/// Counts how often each signature and body is checked.
pub struct RecordingChecker {
    pub inner: CoreChecker,
    pub headers: HashMap<DefId, usize>,
    pub bodies: HashMap<DefId, usize>,
}

impl RecordingChecker {
    pub fn new(module: &ResolvedModule) -> Self {
        RecordingChecker {
            inner: CoreChecker::for_module(module),
            headers: HashMap::new(),
            bodies: HashMap::new(),
        }
    }
}

impl DeclChecker for RecordingChecker {
    fn check_header(&mut self, decl: &Decl, reporter: &mut dyn DiagnosticHandler) {
        *self.headers.entry(decl.id()).or_default() += 1;
        self.inner.check_header(decl, reporter);
    }

    fn check_body(&mut self, decl: &Decl, reporter: &mut dyn DiagnosticHandler) -> Option<Def> {
        *self.bodies.entry(decl.id()).or_default() += 1;
        self.inner.check_body(decl, reporter)
    }
}

/// Accepts every header and silently drops every body.
pub struct SilentChecker;

impl DeclChecker for SilentChecker {
    fn check_header(&mut self, _decl: &Decl, _reporter: &mut dyn DiagnosticHandler) {}

    fn check_body(&mut self, _decl: &Decl, _reporter: &mut dyn DiagnosticHandler) -> Option<Def> {
        None
    }
}
