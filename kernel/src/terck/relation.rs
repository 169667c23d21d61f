use crate::ast::{DefId, Term};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// How a call argument relates to a parameter of the caller.
///
/// Variants are ordered by how much they tell us: `Unknown < Equal < LessThan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    Unknown,
    Equal,
    LessThan,
}

impl Relation {
    /// `Less` decreases, `Equal` stays, `Greater` tells nothing.
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Relation::LessThan,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Unknown,
        }
    }

    /// Sequential composition.
    pub fn mul(self, other: Relation) -> Relation {
        match (self, other) {
            (Relation::Unknown, _) | (_, Relation::Unknown) => Relation::Unknown,
            (Relation::Equal, Relation::Equal) => Relation::Equal,
            _ => Relation::LessThan,
        }
    }

    /// Best of two alternatives.
    pub fn add(self, other: Relation) -> Relation {
        self.max(other)
    }

    /// Fold with `mul`, starting from `Equal`.
    pub fn product(relations: impl IntoIterator<Item = Relation>) -> Relation {
        relations.into_iter().fold(Relation::Equal, Relation::mul)
    }

    pub fn is_decreasing(self) -> bool {
        self == Relation::LessThan
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Relation::Unknown => "?",
            Relation::Equal => "=",
            Relation::LessThan => "<",
        };
        f.write_str(symbol)
    }
}

/// Relations between the parameters of `caller` (rows) and the arguments
/// passed to `callee` (columns) at one call site.
#[derive(Debug, Clone)]
pub struct CallMatrix {
    call: Rc<Term>,
    caller: DefId,
    callee: DefId,
    rows: usize,
    cols: usize,
    cells: Vec<Relation>,
}

impl CallMatrix {
    pub fn new(call: Rc<Term>, caller: DefId, callee: DefId, rows: usize, cols: usize) -> Self {
        CallMatrix {
            call,
            caller,
            callee,
            rows,
            cols,
            cells: vec![Relation::Unknown; rows * cols],
        }
    }

    pub fn call(&self) -> &Rc<Term> {
        &self.call
    }

    pub fn caller(&self) -> DefId {
        self.caller
    }

    pub fn callee(&self) -> DefId {
        self.callee
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Out-of-range cells read as `Unknown`.
    pub fn get(&self, row: usize, col: usize) -> Relation {
        if row >= self.rows || col >= self.cols {
            return Relation::Unknown;
        }
        self.cells[row * self.cols + col]
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, relation: Relation) {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = relation;
        }
    }

    /// The matrix of calling `self` and then `next`; `None` unless
    /// `self.callee` is `next.caller`.
    pub fn combine(&self, next: &CallMatrix) -> Option<CallMatrix> {
        if self.callee != next.caller || self.cols != next.rows {
            return None;
        }
        let mut result = CallMatrix::new(self.call.clone(), self.caller, next.callee, self.rows, next.cols);
        for i in 0..self.rows {
            for k in 0..next.cols {
                let best = (0..self.cols)
                    .map(|j| self.get(i, j).mul(next.get(j, k)))
                    .fold(Relation::Unknown, Relation::add);
                result.set(i, k, best);
            }
        }
        Some(result)
    }

    /// Same endpoints and same relations, regardless of call site.
    pub fn same_relations(&self, other: &CallMatrix) -> bool {
        self.caller == other.caller
            && self.callee == other.callee
            && self.rows == other.rows
            && self.cols == other.cols
            && self.cells == other.cells
    }

    pub fn is_idempotent(&self) -> bool {
        self.combine(self).is_some_and(|square| square.same_relations(self))
    }

    pub fn has_decreasing_diagonal(&self) -> bool {
        (0..self.rows.min(self.cols)).any(|i| self.get(i, i).is_decreasing())
    }
}

impl fmt::Display for CallMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = (0..self.cols).map(|col| self.get(row, col).to_string()).collect();
            f.write_str(&line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Relation::{Equal, LessThan, Unknown};

    #[test]
    fn test_mul_table() {
        let all = [Unknown, Equal, LessThan];
        for a in all {
            assert_eq!(a.mul(Unknown), Unknown);
            assert_eq!(Unknown.mul(a), Unknown);
            assert_eq!(Equal.mul(a), a);
            assert_eq!(a.mul(Equal), a);
        }
        assert_eq!(LessThan.mul(LessThan), LessThan);
    }

    #[test]
    fn test_add_is_max() {
        assert_eq!(Unknown.add(Equal), Equal);
        assert_eq!(LessThan.add(Equal), LessThan);
        assert_eq!(Unknown.add(Unknown), Unknown);
    }

    #[test]
    fn test_from_ordering() {
        assert_eq!(Relation::from_ordering(1.cmp(&2)), LessThan);
        assert_eq!(Relation::from_ordering(2.cmp(&2)), Equal);
        assert_eq!(Relation::from_ordering(3.cmp(&2)), Unknown);
    }

    #[test]
    fn test_product_defaults_to_equal() {
        assert_eq!(Relation::product([]), Equal);
        assert_eq!(Relation::product([Equal, LessThan]), LessThan);
        assert_eq!(Relation::product([LessThan, Unknown]), Unknown);
    }

    fn matrix(caller: &str, callee: &str, rows: &[&[Relation]]) -> CallMatrix {
        let cols = rows.first().map_or(0, |row| row.len());
        let mut matrix = CallMatrix::new(Term::sort(0), DefId::new(caller), DefId::new(callee), rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            for (j, relation) in row.iter().enumerate() {
                matrix.set(i, j, *relation);
            }
        }
        matrix
    }

    #[test]
    fn test_combine_takes_best_path() {
        // f(x, y) calls g(y, x - 1); g(a, b) calls h(b)
        let f_g = matrix("f", "g", &[&[Unknown, LessThan], &[Equal, Unknown]]);
        let g_h = matrix("g", "h", &[&[Unknown], &[Equal]]);
        let f_h = f_g.combine(&g_h).expect("endpoints line up");

        assert_eq!(f_h.caller(), DefId::new("f"));
        assert_eq!(f_h.callee(), DefId::new("h"));
        assert_eq!(f_h.get(0, 0), LessThan);
        assert_eq!(f_h.get(1, 0), Unknown);
        assert!(g_h.combine(&f_g).is_none());
    }

    #[test]
    fn test_idempotence_and_diagonal() {
        let swap = matrix("f", "f", &[&[Unknown, Equal], &[Equal, Unknown]]);
        assert!(!swap.is_idempotent());
        assert!(swap.combine(&swap).is_some_and(|sq| sq.is_idempotent()));

        let shrink = matrix("f", "f", &[&[LessThan, Unknown], &[Unknown, Equal]]);
        assert!(shrink.is_idempotent());
        assert!(shrink.has_decreasing_diagonal());
    }

    #[test]
    fn test_display() {
        let m = matrix("f", "g", &[&[LessThan, Unknown], &[Unknown, Equal]]);
        insta::assert_snapshot!(m.to_string(), @r"
        < ?
        ? =
        ");
    }
}
