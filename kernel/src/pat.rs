use crate::ast::{ConHead, DefId, LocalVar, Term};
use crate::ctx::LocalCtx;
use crate::shape::ShapeRecognition;
use indexmap::IndexSet;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatToTermError {
    #[error("absurd pattern has no term counterpart")]
    Absurd,
}

/// Patterns of function clauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pat {
    /// Matches nothing
    Absurd,
    Bind {
        var: LocalVar,
        ty: Rc<Term>,
    },
    Tuple(Vec<Rc<Pat>>),
    Con {
        head: ConHead,
        args: Vec<Rc<Pat>>,
    },
    /// Numeral of a Nat-shaped type.
    ShapedInt {
        repr: usize,
        recognition: ShapeRecognition,
    },
    /// Hole left by elaboration; `solution` is filled once inferred.
    Meta {
        solution: Option<Rc<Pat>>,
        fake_bind: Rc<str>,
        ty: Rc<Term>,
    },
}

impl Pat {
    pub fn bind(var: &LocalVar, ty: Rc<Term>) -> Rc<Self> {
        Rc::new(Pat::Bind {
            var: var.clone(),
            ty,
        })
    }

    pub fn con(head: ConHead, args: Vec<Rc<Pat>>) -> Rc<Self> {
        Rc::new(Pat::Con { head, args })
    }

    pub fn shaped_int(repr: usize, recognition: ShapeRecognition) -> Rc<Self> {
        Rc::new(Pat::ShapedInt { repr, recognition })
    }

    /// The `zero`/`suc` pattern a numeral pattern stands for.
    pub fn shaped_constructor_form(repr: usize, recognition: &ShapeRecognition) -> Rc<Pat> {
        if repr == 0 {
            Pat::con(recognition.con_head(recognition.zero), vec![])
        } else {
            Pat::con(
                recognition.con_head(recognition.suc),
                vec![Pat::shaped_int(repr - 1, recognition.clone())],
            )
        }
    }

    /// Rebuild with `pat_op` applied to sub-patterns and `term_op` to
    /// embedded types. Unchanged children keep the original node.
    pub fn descent(
        self: &Rc<Self>,
        mut pat_op: impl FnMut(&Rc<Pat>) -> Rc<Pat>,
        mut term_op: impl FnMut(&Rc<Term>) -> Rc<Term>,
    ) -> Rc<Pat> {
        match &**self {
            Pat::Absurd | Pat::ShapedInt { .. } => self.clone(),
            Pat::Bind { var, ty } => {
                let new_ty = term_op(ty);
                if Rc::ptr_eq(&new_ty, ty) {
                    self.clone()
                } else {
                    Pat::bind(var, new_ty)
                }
            }
            Pat::Tuple(elements) => match map_pats(elements, &mut pat_op) {
                Some(elements) => Rc::new(Pat::Tuple(elements)),
                None => self.clone(),
            },
            Pat::Con { head, args } => match map_pats(args, &mut pat_op) {
                Some(args) => Pat::con(head.clone(), args),
                None => self.clone(),
            },
            Pat::Meta {
                solution,
                fake_bind,
                ty,
            } => {
                let new_solution = solution.as_ref().map(&mut pat_op);
                let new_ty = term_op(ty);
                let same_solution = match (solution, &new_solution) {
                    (Some(old), Some(new)) => Rc::ptr_eq(old, new),
                    _ => true,
                };
                if same_solution && Rc::ptr_eq(&new_ty, ty) {
                    self.clone()
                } else {
                    Rc::new(Pat::Meta {
                        solution: new_solution,
                        fake_bind: fake_bind.clone(),
                        ty: new_ty,
                    })
                }
            }
        }
    }

    /// Feed every binding to `consumer`, children before later siblings.
    /// Solved metas contribute the bindings of their solution.
    pub fn consume_bindings(&self, consumer: &mut impl FnMut(&LocalVar, &Rc<Term>)) {
        match self {
            Pat::Bind { var, ty } => consumer(var, ty),
            Pat::Tuple(elements) => elements.iter().for_each(|e| e.consume_bindings(consumer)),
            Pat::Con { args, .. } => args.iter().for_each(|a| a.consume_bindings(consumer)),
            Pat::Meta {
                solution: Some(solution),
                ..
            } => solution.consume_bindings(consumer),
            Pat::Absurd | Pat::ShapedInt { .. } | Pat::Meta { solution: None, .. } => {}
        }
    }

    pub fn collect_bindings(&self) -> Vec<(LocalVar, Rc<Term>)> {
        let mut bindings = Vec::new();
        self.consume_bindings(&mut |var, ty| bindings.push((var.clone(), ty.clone())));
        bindings
    }

    pub fn collect_all_bindings(pats: &[Rc<Pat>]) -> Vec<(LocalVar, Rc<Term>)> {
        pats.iter().flat_map(|pat| pat.collect_bindings()).collect()
    }

    /// Register every binding in `ctx`, passing its type through `type_mapper`.
    pub fn store_bindings(
        &self,
        ctx: &mut LocalCtx,
        mut type_mapper: impl FnMut(&Rc<Term>) -> Rc<Term>,
    ) {
        self.consume_bindings(&mut |var, ty| ctx.put(var.clone(), type_mapper(ty)));
    }

    /// Replace metas by their solutions; unsolved ones become fresh binders.
    pub fn inline(self: &Rc<Self>, ctx: &mut LocalCtx) -> Rc<Pat> {
        match &**self {
            Pat::Meta {
                solution: Some(solution),
                ..
            } => solution.inline(ctx),
            Pat::Meta {
                solution: None,
                fake_bind,
                ty,
            } => {
                let var = LocalVar::fresh(fake_bind.clone());
                ctx.put(var.clone(), ty.clone());
                Pat::bind(&var, ty.clone())
            }
            Pat::Tuple(_) | Pat::Con { .. } => self.descent(|pat| pat.inline(ctx), |ty| ty.clone()),
            Pat::Absurd | Pat::Bind { .. } | Pat::ShapedInt { .. } => self.clone(),
        }
    }

    /// Read the pattern back as the term it matches.
    pub fn to_term(self: &Rc<Self>) -> Result<Rc<Term>, PatToTermError> {
        match &**self {
            Pat::Absurd => Err(PatToTermError::Absurd),
            Pat::Bind { var, .. } => Ok(Term::free(var)),
            Pat::Tuple(elements) => Ok(Term::tup(
                elements.iter().map(Pat::to_term).collect::<Result<_, _>>()?,
            )),
            Pat::Con { head, args } => Ok(Rc::new(Term::ConCall(crate::ast::ConCall {
                head: head.clone(),
                args: args.iter().map(Pat::to_term).collect::<Result<_, _>>()?,
            }))),
            Pat::ShapedInt { repr, recognition } => Ok(Term::integer(*repr, recognition.clone())),
            Pat::Meta { .. } => Ok(Rc::new(Term::MetaPat(self.clone()))),
        }
    }

    /// Data types the pattern mentions, through constructors, numerals and
    /// binder types.
    pub fn collect_refs(&self, refs: &mut IndexSet<DefId>) {
        match self {
            Pat::Absurd => {}
            Pat::Bind { ty, .. } => ty.collect_refs(refs),
            Pat::Tuple(elements) => elements.iter().for_each(|e| e.collect_refs(refs)),
            Pat::Con { head, args } => {
                refs.insert(head.data);
                args.iter().for_each(|a| a.collect_refs(refs));
            }
            Pat::ShapedInt { recognition, .. } => {
                refs.insert(recognition.data);
            }
            Pat::Meta { solution, ty, .. } => {
                if let Some(solution) = solution {
                    solution.collect_refs(refs);
                }
                ty.collect_refs(refs);
            }
        }
    }
}

fn map_pats(pats: &[Rc<Pat>], f: &mut impl FnMut(&Rc<Pat>) -> Rc<Pat>) -> Option<Vec<Rc<Pat>>> {
    let mapped: Vec<Rc<Pat>> = pats.iter().map(|pat| f(pat)).collect();
    if mapped.iter().zip(pats).all(|(new, old)| Rc::ptr_eq(new, old)) {
        None
    } else {
        Some(mapped)
    }
}
