use crate::ast::{Call, DefId, Term};
use crate::def::{DataDef, Def, FnBody, FnDef, Matching};
use crate::pat::Pat;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;

pub const DEFAULT_WHNF_FUEL: usize = 4096;
const WHNF_FUEL_ENV: &str = "TYCK_WHNF_FUEL";

/// Unfolding budget per `whnf` call. Read once from `TYCK_WHNF_FUEL`.
pub fn default_eval_fuel() -> usize {
    static FUEL: OnceLock<usize> = OnceLock::new();
    *FUEL.get_or_init(|| {
        std::env::var(WHNF_FUEL_ENV)
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|fuel| *fuel > 0)
            .unwrap_or(DEFAULT_WHNF_FUEL)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub fuel: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            fuel: default_eval_fuel(),
        }
    }
}

/// Weak-head normalization.
pub trait Whnf {
    fn whnf(&self, term: &Rc<Term>) -> Rc<Term>;
}

/// Definitions that have been accepted and may be unfolded.
#[derive(Debug, Clone, Default)]
pub struct Env {
    fns: HashMap<DefId, Rc<FnDef>>,
    datas: HashMap<DefId, Rc<DataDef>>,
    config: EvalConfig,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Env {
            config,
            ..Self::default()
        }
    }

    pub fn add_definition(&mut self, def: &Def) {
        match def {
            Def::Fn(def) => {
                self.fns.insert(def.id, def.clone());
            }
            Def::Data(def) => {
                self.datas.insert(def.id, def.clone());
            }
        }
    }

    pub fn get_fn(&self, id: DefId) -> Option<&Rc<FnDef>> {
        self.fns.get(&id)
    }

    pub fn get_data(&self, id: DefId) -> Option<&Rc<DataDef>> {
        self.datas.get(&id)
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.fns.contains_key(&id) || self.datas.contains_key(&id)
    }

    pub fn config(&self) -> EvalConfig {
        self.config
    }

    fn whnf_with_fuel(&self, term: &Rc<Term>, fuel: &mut usize) -> Rc<Term> {
        match &**term {
            Term::App(fun, arg) => {
                let new_fun = self.whnf_with_fuel(fun, fuel);
                if let Term::Lam(body) = &*new_fun {
                    return self.whnf_with_fuel(&body.instantiate(arg), fuel);
                }
                if Rc::ptr_eq(&new_fun, fun) {
                    term.clone()
                } else {
                    Term::app(new_fun, arg.clone())
                }
            }
            Term::Proj(of, index) => {
                let new_of = self.whnf_with_fuel(of, fuel);
                if let Term::Tup(elements) = &*new_of {
                    if let Some(element) = elements.get(*index) {
                        return self.whnf_with_fuel(element, fuel);
                    }
                }
                if Rc::ptr_eq(&new_of, of) {
                    term.clone()
                } else {
                    Term::proj(new_of, *index)
                }
            }
            Term::FnCall(call) => {
                if *fuel == 0 {
                    debug!("whnf fuel exhausted at {:?}", call.def);
                    return term.clone();
                }
                *fuel -= 1;
                match self.unfold(call, fuel) {
                    Some(unfolded) => self.whnf_with_fuel(&unfolded, fuel),
                    None => term.clone(),
                }
            }
            _ => term.clone(),
        }
    }

    fn unfold(&self, call: &Call, fuel: &mut usize) -> Option<Rc<Term>> {
        let def = self.fns.get(&call.def)?;
        if call.args.len() != def.telescope.len() {
            return None;
        }
        match &def.body {
            FnBody::Expr(body) => Some(body.instantiate_tele(&call.args)),
            FnBody::Clauses(clauses) => self.unfold_clauses(clauses, &call.args, fuel),
        }
    }

    /// First matching clause wins. A stuck clause blocks the later ones.
    fn unfold_clauses(
        &self,
        clauses: &[Matching],
        args: &[Rc<Term>],
        fuel: &mut usize,
    ) -> Option<Rc<Term>> {
        for clause in clauses {
            let mut bound = Vec::new();
            let outcome = clause
                .patterns
                .iter()
                .zip(args)
                .try_for_each(|(pat, arg)| self.match_pat(pat, arg, &mut bound, fuel));
            match outcome {
                Ok(()) => return Some(clause.body.instantiate_tele(&bound)),
                Err(MatchFailure::Mismatch) => continue,
                Err(MatchFailure::Stuck) => return None,
            }
        }
        None
    }

    fn match_pat(
        &self,
        pat: &Pat,
        term: &Rc<Term>,
        bound: &mut Vec<Rc<Term>>,
        fuel: &mut usize,
    ) -> Result<(), MatchFailure> {
        match pat {
            Pat::Bind { .. } => {
                bound.push(term.clone());
                Ok(())
            }
            Pat::Absurd
            | Pat::Meta {
                solution: None, ..
            } => Err(MatchFailure::Stuck),
            Pat::Meta {
                solution: Some(solution),
                ..
            } => self.match_pat(solution, term, bound, fuel),
            Pat::Tuple(pats) => {
                let term = self.whnf_with_fuel(term, fuel);
                match &*term {
                    Term::Tup(elements) if elements.len() == pats.len() => pats
                        .iter()
                        .zip(elements)
                        .try_for_each(|(pat, element)| self.match_pat(pat, element, bound, fuel)),
                    _ => Err(MatchFailure::Stuck),
                }
            }
            Pat::Con { head, args } => {
                let term = self.whnf_with_fuel(term, fuel);
                let Some((con, con_args)) = term.as_con_call_like() else {
                    return Err(MatchFailure::Stuck);
                };
                if con != head.con || con_args.len() != args.len() {
                    return Err(MatchFailure::Mismatch);
                }
                args.iter()
                    .zip(&con_args)
                    .try_for_each(|(pat, arg)| self.match_pat(pat, arg, bound, fuel))
            }
            Pat::ShapedInt { repr, recognition } => {
                let term = self.whnf_with_fuel(term, fuel);
                match &*term {
                    Term::Integer(lit) if lit.recognition.data == recognition.data => {
                        if lit.repr == *repr {
                            Ok(())
                        } else {
                            Err(MatchFailure::Mismatch)
                        }
                    }
                    _ => {
                        let form = Pat::shaped_constructor_form(*repr, recognition);
                        self.match_pat(&form, &term, bound, fuel)
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchFailure {
    Mismatch,
    Stuck,
}

impl Whnf for Env {
    fn whnf(&self, term: &Rc<Term>) -> Rc<Term> {
        let mut fuel = self.config.fuel;
        self.whnf_with_fuel(term, &mut fuel)
    }
}
