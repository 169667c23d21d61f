use crate::pat::Pat;
use crate::shape::ShapeRecognition;
use indexmap::IndexSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Names
// =============================================================================

/// Identity of a global definition (function, data type or constructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u64);

impl DefId {
    pub fn new(name: impl AsRef<str>) -> Self {
        DefId(stable_hash64("def", name.as_ref()))
    }
}

fn stable_hash64(tag: &str, name: &str) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for b in tag.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash ^= b':' as u64;
    hash = hash.wrapping_mul(FNV_PRIME);
    for b in name.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(0);

/// Handle of one bound source variable. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u64);

/// One concrete occurrence of a bound source variable.
///
/// Two `LocalVar`s are equal iff they were produced by the same call to
/// [`LocalVar::fresh`]; the display name never takes part in equality or
/// hashing, so shadowing cannot cause capture.
#[derive(Clone)]
pub struct LocalVar {
    id: VarId,
    name: Rc<str>,
}

impl LocalVar {
    pub fn fresh(name: impl Into<Rc<str>>) -> Self {
        LocalVar {
            id: VarId(NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
        }
    }

    pub fn id(&self) -> VarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for LocalVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LocalVar {}

impl Hash for LocalVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for LocalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id.0)
    }
}

// =============================================================================
// Terms
// =============================================================================

/// A call to a global definition: `f {ulift} args`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub def: DefId,
    pub ulift: usize,
    pub args: Vec<Rc<Term>>,
}

/// The constructor part of a constructor call, including the data type
/// it belongs to and the arguments of that data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConHead {
    pub data: DefId,
    pub con: DefId,
    pub ulift: usize,
    pub data_args: Vec<Rc<Term>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConCall {
    pub head: ConHead,
    pub args: Vec<Rc<Term>>,
}

/// A numeral literal of a data type recognized as Nat-shaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntegerTerm {
    pub repr: usize,
    pub recognition: ShapeRecognition,
}

impl IntegerTerm {
    /// The constructor this literal stands for: `zero` for 0, `suc` otherwise.
    pub fn con_ref(&self) -> DefId {
        if self.repr == 0 {
            self.recognition.zero
        } else {
            self.recognition.suc
        }
    }

    pub fn con_args(&self) -> Vec<Rc<Term>> {
        if self.repr == 0 {
            vec![]
        } else {
            vec![Rc::new(Term::Integer(IntegerTerm {
                repr: self.repr - 1,
                recognition: self.recognition.clone(),
            }))]
        }
    }
}

/// Core terms in locally nameless form.
///
/// `Free` names a variable that is in scope but not bound inside the term;
/// `Local` is a de Bruijn index that is only meaningful under enough
/// enclosing binders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Free(LocalVar),
    Local(usize),
    Lam(Rc<Term>),
    App(Rc<Term>, Rc<Term>),
    Tup(Vec<Rc<Term>>),
    Proj(Rc<Term>, usize),
    /// Path application
    PApp(Rc<Term>, Rc<Term>),
    FnCall(Call),
    DataCall(Call),
    ConCall(ConCall),
    Integer(IntegerTerm),
    /// Stand-in for a pattern hole read back as a term
    MetaPat(Rc<Pat>),
    Sort(usize),
}

// Helper constructors for convenience
impl Term {
    pub fn free(var: &LocalVar) -> Rc<Self> {
        Rc::new(Term::Free(var.clone()))
    }

    pub fn local(index: usize) -> Rc<Self> {
        Rc::new(Term::Local(index))
    }

    pub fn lam(body: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::Lam(body))
    }

    pub fn app(f: Rc<Term>, a: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::App(f, a))
    }

    pub fn tup(elements: Vec<Rc<Term>>) -> Rc<Self> {
        Rc::new(Term::Tup(elements))
    }

    pub fn proj(of: Rc<Term>, index: usize) -> Rc<Self> {
        Rc::new(Term::Proj(of, index))
    }

    pub fn papp(f: Rc<Term>, a: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::PApp(f, a))
    }

    pub fn fn_call(def: DefId, args: Vec<Rc<Term>>) -> Rc<Self> {
        Rc::new(Term::FnCall(Call { def, ulift: 0, args }))
    }

    pub fn data_call(def: DefId, args: Vec<Rc<Term>>) -> Rc<Self> {
        Rc::new(Term::DataCall(Call { def, ulift: 0, args }))
    }

    pub fn con_call(data: DefId, con: DefId, args: Vec<Rc<Term>>) -> Rc<Self> {
        Rc::new(Term::ConCall(ConCall {
            head: ConHead {
                data,
                con,
                ulift: 0,
                data_args: vec![],
            },
            args,
        }))
    }

    pub fn integer(repr: usize, recognition: ShapeRecognition) -> Rc<Self> {
        Rc::new(Term::Integer(IntegerTerm { repr, recognition }))
    }

    pub fn sort(level: usize) -> Rc<Self> {
        Rc::new(Term::Sort(level))
    }

    /// Constructor reference and constructor arguments, for terms that
    /// behave as constructor calls (including numeral literals).
    pub fn as_con_call_like(&self) -> Option<(DefId, Vec<Rc<Term>>)> {
        match self {
            Term::ConCall(call) => Some((call.head.con, call.args.clone())),
            Term::Integer(lit) => Some((lit.con_ref(), lit.con_args())),
            _ => None,
        }
    }

    /// Visit the immediate children together with the number of binders
    /// each child lives under, relative to this node.
    pub fn visit_children(&self, mut f: impl FnMut(usize, &Rc<Term>)) {
        match self {
            Term::Free(_)
            | Term::Local(_)
            | Term::Integer(_)
            | Term::MetaPat(_)
            | Term::Sort(_) => {}
            Term::Lam(body) => f(1, body),
            Term::App(fun, arg) | Term::PApp(fun, arg) => {
                f(0, fun);
                f(0, arg);
            }
            Term::Tup(elements) => elements.iter().for_each(|e| f(0, e)),
            Term::Proj(of, _) => f(0, of),
            Term::FnCall(call) | Term::DataCall(call) => call.args.iter().for_each(|a| f(0, a)),
            Term::ConCall(call) => {
                call.head.data_args.iter().for_each(|a| f(0, a));
                call.args.iter().for_each(|a| f(0, a));
            }
        }
    }

    /// Rebuild this node by applying `f` to every immediate child.
    ///
    /// `f` receives the number of binders introduced between this node and
    /// the child. When every child comes back pointer-equal, the original
    /// node is returned.
    pub fn descent(self: &Rc<Self>, mut f: impl FnMut(usize, &Rc<Term>) -> Rc<Term>) -> Rc<Term> {
        match &**self {
            Term::Free(_)
            | Term::Local(_)
            | Term::Integer(_)
            | Term::MetaPat(_)
            | Term::Sort(_) => self.clone(),
            Term::Lam(body) => {
                let new_body = f(1, body);
                if Rc::ptr_eq(&new_body, body) {
                    self.clone()
                } else {
                    Term::lam(new_body)
                }
            }
            Term::App(fun, arg) => match map_pair(fun, arg, &mut f) {
                Some((fun, arg)) => Term::app(fun, arg),
                None => self.clone(),
            },
            Term::PApp(fun, arg) => match map_pair(fun, arg, &mut f) {
                Some((fun, arg)) => Term::papp(fun, arg),
                None => self.clone(),
            },
            Term::Tup(elements) => match map_args(elements, &mut f) {
                Some(elements) => Term::tup(elements),
                None => self.clone(),
            },
            Term::Proj(of, index) => {
                let new_of = f(0, of);
                if Rc::ptr_eq(&new_of, of) {
                    self.clone()
                } else {
                    Term::proj(new_of, *index)
                }
            }
            Term::FnCall(call) => match map_args(&call.args, &mut f) {
                Some(args) => Rc::new(Term::FnCall(Call { args, ..call.clone() })),
                None => self.clone(),
            },
            Term::DataCall(call) => match map_args(&call.args, &mut f) {
                Some(args) => Rc::new(Term::DataCall(Call { args, ..call.clone() })),
                None => self.clone(),
            },
            Term::ConCall(call) => {
                let data_args = map_args(&call.head.data_args, &mut f);
                let args = map_args(&call.args, &mut f);
                if data_args.is_none() && args.is_none() {
                    return self.clone();
                }
                Rc::new(Term::ConCall(ConCall {
                    head: ConHead {
                        data_args: data_args.unwrap_or_else(|| call.head.data_args.clone()),
                        ..call.head.clone()
                    },
                    args: args.unwrap_or_else(|| call.args.clone()),
                }))
            }
        }
    }

    // =========================================================================
    // Binding and substitution
    // =========================================================================

    /// Abstract `var` over this term, turning each `Free(var)` found under
    /// `depth` binders into `Local(depth)`.
    pub fn bind_at(self: &Rc<Self>, var: &LocalVar, depth: usize) -> Rc<Term> {
        match &**self {
            Term::Free(name) if name == var => Term::local(depth),
            _ => self.descent(|binders, child| child.bind_at(var, depth + binders)),
        }
    }

    pub fn bind(self: &Rc<Self>, var: &LocalVar) -> Rc<Term> {
        self.bind_at(var, 0)
    }

    /// `vars[0]` becomes `Local(0)`, `vars[1]` becomes `Local(1)` and so on.
    pub fn bind_all(self: &Rc<Self>, vars: &[LocalVar]) -> Rc<Term> {
        vars.iter()
            .enumerate()
            .fold(self.clone(), |acc, (index, var)| acc.bind_at(var, index))
    }

    /// Bind in telescope order: the last variable becomes `Local(0)`.
    pub fn bind_tele(self: &Rc<Self>, vars: &[LocalVar]) -> Rc<Term> {
        let reversed: Vec<LocalVar> = vars.iter().rev().cloned().collect();
        self.bind_all(&reversed)
    }

    /// Replace `Local(from + i)` with `args[i]`. Other indices are left alone.
    ///
    /// Applications whose function position becomes a lambda are reduced on
    /// the spot instead of being rebuilt.
    pub fn replace_all_from(self: &Rc<Self>, from: usize, args: &[Rc<Term>]) -> Rc<Term> {
        if args.is_empty() {
            return self.clone();
        }
        match &**self {
            Term::Local(index) if *index >= from && *index < from + args.len() => {
                args[*index - from].clone()
            }
            Term::App(fun, arg) => {
                let new_fun = fun.replace_all_from(from, args);
                let new_arg = arg.replace_all_from(from, args);
                if let Term::Lam(body) = &*new_fun {
                    return body.instantiate(&new_arg);
                }
                if Rc::ptr_eq(&new_fun, fun) && Rc::ptr_eq(&new_arg, arg) {
                    self.clone()
                } else {
                    Term::app(new_fun, new_arg)
                }
            }
            _ => self.descent(|binders, child| child.replace_all_from(from + binders, args)),
        }
    }

    pub fn replace(self: &Rc<Self>, index: usize, arg: &Rc<Term>) -> Rc<Term> {
        self.replace_all_from(index, std::slice::from_ref(arg))
    }

    pub fn instantiate(self: &Rc<Self>, arg: &Rc<Term>) -> Rc<Term> {
        self.replace(0, arg)
    }

    pub fn instantiate_var(self: &Rc<Self>, var: &LocalVar) -> Rc<Term> {
        self.instantiate(&Term::free(var))
    }

    /// `Local(i)` becomes `args[i]`.
    pub fn instantiate_all(self: &Rc<Self>, args: &[Rc<Term>]) -> Rc<Term> {
        self.replace_all_from(0, args)
    }

    /// Instantiate in telescope order: the last argument replaces `Local(0)`.
    pub fn instantiate_tele(self: &Rc<Self>, args: &[Rc<Term>]) -> Rc<Term> {
        let reversed: Vec<Rc<Term>> = args.iter().rev().cloned().collect();
        self.instantiate_all(&reversed)
    }

    pub fn instantiate_tele_vars(self: &Rc<Self>, vars: &[LocalVar]) -> Rc<Term> {
        let args: Vec<Rc<Term>> = vars.iter().map(Term::free).collect();
        self.instantiate_tele(&args)
    }

    /// Substitute `term` for the free variable `var`. `term` must not
    /// contain loose `Local`s.
    pub fn replace_with(self: &Rc<Self>, var: &LocalVar, term: &Rc<Term>) -> Rc<Term> {
        self.bind(var).instantiate(term)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The first `Local(i)` that escapes its binders when this term sits
    /// under `depth` binders, as `(i, depth at the occurrence)`.
    pub fn first_ill_scoped(&self, depth: usize) -> Option<(usize, usize)> {
        if let Term::Local(index) = self {
            return (*index >= depth).then_some((*index, depth));
        }
        let mut found = None;
        self.visit_children(|binders, child| {
            if found.is_none() {
                found = child.first_ill_scoped(depth + binders);
            }
        });
        found
    }

    pub fn is_well_scoped(&self, depth: usize) -> bool {
        self.first_ill_scoped(depth).is_none()
    }

    /// Every global definition this term refers to. Constructor calls and
    /// numerals count as references to their data type.
    pub fn collect_refs(&self, refs: &mut IndexSet<DefId>) {
        match self {
            Term::FnCall(call) | Term::DataCall(call) => {
                refs.insert(call.def);
            }
            Term::ConCall(call) => {
                refs.insert(call.head.data);
            }
            Term::Integer(lit) => {
                refs.insert(lit.recognition.data);
            }
            _ => {}
        }
        self.visit_children(|_, child| child.collect_refs(refs));
    }
}

fn map_pair(
    first: &Rc<Term>,
    second: &Rc<Term>,
    f: &mut impl FnMut(usize, &Rc<Term>) -> Rc<Term>,
) -> Option<(Rc<Term>, Rc<Term>)> {
    let new_first = f(0, first);
    let new_second = f(0, second);
    if Rc::ptr_eq(&new_first, first) && Rc::ptr_eq(&new_second, second) {
        None
    } else {
        Some((new_first, new_second))
    }
}

/// `None` when every argument came back pointer-equal.
fn map_args(
    args: &[Rc<Term>],
    f: &mut impl FnMut(usize, &Rc<Term>) -> Rc<Term>,
) -> Option<Vec<Rc<Term>>> {
    let mapped: Vec<Rc<Term>> = args.iter().map(|arg| f(0, arg)).collect();
    if mapped.iter().zip(args).all(|(new, old)| Rc::ptr_eq(new, old)) {
        None
    } else {
        Some(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_binding_order() {
        // λx. λy. x y
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");
        let body = Term::app(Term::free(&x), Term::free(&y));
        // λy. x y => λ. x 0
        let lam_y = Term::lam(body.bind(&y));
        // λx. λ. x 0 => λ. λ. 1 0
        let lam_xy = Term::lam(lam_y.bind(&x));

        let expected = Term::lam(Term::lam(Term::app(Term::local(1), Term::local(0))));
        assert_eq!(lam_xy, expected);
    }

    #[test]
    fn test_same_name_is_not_same_variable() {
        let outer = LocalVar::fresh("x");
        let inner = LocalVar::fresh("x");
        assert_ne!(outer, inner);

        let term = Term::app(Term::free(&outer), Term::free(&inner));
        let bound = term.bind(&inner);
        assert_eq!(bound, Term::app(Term::free(&outer), Term::local(0)));
    }

    #[test]
    fn test_bind_absent_variable_keeps_identity() {
        let x = LocalVar::fresh("x");
        let y = LocalVar::fresh("y");
        let term = Term::lam(Term::app(Term::free(&x), Term::local(0)));
        let bound = term.bind(&y);
        assert!(Rc::ptr_eq(&term, &bound));
    }

    #[test]
    fn test_instantiate_inverts_bind() {
        let x = LocalVar::fresh("x");
        let c = LocalVar::fresh("c");
        let term = Term::lam(Term::app(Term::free(&x), Term::free(&c)));
        let round = term.bind(&x).instantiate_var(&x);
        assert_eq!(round, term);
    }

    #[test]
    fn test_replace_leaves_other_indices() {
        let a = LocalVar::fresh("a");
        let term = Term::app(Term::local(0), Term::local(3));
        let replaced = term.instantiate(&Term::free(&a));
        assert_eq!(replaced, Term::app(Term::free(&a), Term::local(3)));
    }

    #[test]
    fn test_replace_under_binder_targets_shifted_index() {
        let a = LocalVar::fresh("a");
        // λ. 0 1, instantiate index 0 from outside => λ. 0 a
        let term = Term::lam(Term::app(Term::local(0), Term::local(1)));
        let replaced = term.instantiate(&Term::free(&a));
        assert_eq!(replaced, Term::lam(Term::app(Term::local(0), Term::free(&a))));
    }

    #[test]
    fn test_beta_shortcut_during_replace() {
        let c = LocalVar::fresh("c");
        let r = LocalVar::fresh("r");
        // (λ. 0 c) 0, replacing index 0 with r
        let body = Term::app(Term::local(0), Term::free(&c));
        let redex = Term::app(Term::lam(body.clone()), Term::local(0));

        let replaced = redex.replace(0, &Term::free(&r));
        let expected = body.instantiate(&Term::local(0).replace(0, &Term::free(&r)));
        assert_eq!(replaced, expected);
        assert_eq!(replaced, Term::app(Term::free(&r), Term::free(&c)));
        assert!(!matches!(&*replaced, Term::App(f, _) if matches!(&**f, Term::Lam(_))));
    }

    #[test]
    fn test_telescope_order() {
        let a = LocalVar::fresh("a");
        let b = LocalVar::fresh("b");
        let term = Term::app(Term::free(&a), Term::free(&b));

        let bound = term.bind_tele(&[a.clone(), b.clone()]);
        assert_eq!(bound, Term::app(Term::local(1), Term::local(0)));
        assert_eq!(bound.instantiate_tele_vars(&[a, b]), term);
    }

    #[test]
    fn test_well_scoped() {
        let term = Term::lam(Term::app(Term::local(0), Term::local(1)));
        assert!(!term.is_well_scoped(0));
        assert!(term.is_well_scoped(1));
        assert_eq!(term.first_ill_scoped(0), Some((1, 1)));
    }

    #[test]
    fn test_collect_refs_resolves_constructors_to_data() {
        let nat = DefId::new("Nat");
        let suc = DefId::new("Nat::suc");
        let zero = DefId::new("Nat::zero");
        let f = DefId::new("f");
        let term = Term::fn_call(f, vec![Term::con_call(nat, suc, vec![Term::con_call(nat, zero, vec![])])]);

        let mut refs = IndexSet::new();
        term.collect_refs(&mut refs);
        assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec![f, nat]);
    }
}
