use super::relation::CallMatrix;
use crate::ast::DefId;
use crate::graph::Graph;
use indexmap::IndexMap;
use log::debug;

/// Call matrices grouped by caller and callee.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    edges: IndexMap<DefId, IndexMap<DefId, Vec<CallMatrix>>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a matrix. Returns `false` if one with the same relations is
    /// already present between the same endpoints.
    pub fn put(&mut self, matrix: CallMatrix) -> bool {
        let matrices = self
            .edges
            .entry(matrix.caller())
            .or_default()
            .entry(matrix.callee())
            .or_default();
        if matrices.iter().any(|known| known.same_relations(&matrix)) {
            return false;
        }
        matrices.push(matrix);
        true
    }

    pub fn matrices(&self, caller: DefId, callee: DefId) -> &[CallMatrix] {
        self.edges
            .get(&caller)
            .and_then(|callees| callees.get(&callee))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every matrix whose caller is `caller`.
    pub fn calls_from(&self, caller: DefId) -> impl Iterator<Item = &CallMatrix> {
        self.edges.get(&caller).into_iter().flat_map(|callees| callees.values().flatten())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallMatrix> {
        self.edges.values().flat_map(|callees| callees.values().flatten())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Close under composition: every path of calls gets a matrix.
    pub fn complete(&self) -> CallGraph {
        let mut closure = self.clone();
        loop {
            let known: Vec<CallMatrix> = closure.iter().cloned().collect();
            let mut added = false;
            for path in &known {
                for step in self.calls_from(path.callee()) {
                    if let Some(longer) = path.combine(step) {
                        added |= closure.put(longer);
                    }
                }
            }
            if !added {
                debug!("call graph closed with {} matrices", closure.len());
                return closure;
            }
        }
    }

    /// Idempotent self-calls in the completed graph that decrease in no
    /// parameter. Empty means every recursive path terminates.
    pub fn find_bad_recursion(&self) -> Vec<CallMatrix> {
        let complete = self.complete();
        complete
            .iter()
            .filter(|matrix| matrix.caller() == matrix.callee())
            .filter(|matrix| matrix.is_idempotent() && !matrix.has_decreasing_diagonal())
            .cloned()
            .collect()
    }

    /// Strongly connected components of the caller/callee relation.
    pub fn components(&self) -> Vec<Vec<DefId>> {
        let mut graph = Graph::new();
        for matrix in self.iter() {
            graph.add_edge(matrix.caller(), matrix.callee());
        }
        graph.topological_order()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Term;
    use crate::terck::relation::Relation::{self, Equal, LessThan, Unknown};

    fn call(caller: &str, callee: &str, rows: &[&[Relation]]) -> CallMatrix {
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
    fn test_put_deduplicates() {
        let mut graph = CallGraph::new();
        assert!(graph.put(call("f", "f", &[&[LessThan]])));
        assert!(!graph.put(call("f", "f", &[&[LessThan]])));
        assert!(graph.put(call("f", "f", &[&[Equal]])));
        assert_eq!(graph.matrices(DefId::new("f"), DefId::new("f")).len(), 2);
    }

    #[test]
    fn test_structural_recursion_is_accepted() {
        let mut graph = CallGraph::new();
        graph.put(call("f", "f", &[&[LessThan]]));
        assert!(graph.find_bad_recursion().is_empty());
    }

    #[test]
    fn test_non_decreasing_self_call_is_rejected() {
        let mut graph = CallGraph::new();
        graph.put(call("f", "f", &[&[Equal]]));
        let bad = graph.find_bad_recursion();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].caller(), DefId::new("f"));
    }

    #[test]
    fn test_permuting_arguments_needs_completion() {
        // f(x, y) = f(y, x - 1): only the square decreases x
        let mut graph = CallGraph::new();
        graph.put(call("f", "f", &[&[Unknown, LessThan], &[Equal, Unknown]]));
        assert!(graph.find_bad_recursion().is_empty());

        // f(x, y) = f(y, x): no path ever decreases
        let mut swapping = CallGraph::new();
        swapping.put(call("f", "f", &[&[Unknown, Equal], &[Equal, Unknown]]));
        assert!(!swapping.find_bad_recursion().is_empty());
    }

    #[test]
    fn test_mutual_recursion_through_closure() {
        let mut graph = CallGraph::new();
        graph.put(call("even", "odd", &[&[LessThan]]));
        graph.put(call("odd", "even", &[&[Equal]]));
        let complete = graph.complete();
        assert_eq!(complete.matrices(DefId::new("even"), DefId::new("even")).len(), 1);
        assert!(graph.find_bad_recursion().is_empty());
        assert_eq!(graph.components(), vec![vec![DefId::new("even"), DefId::new("odd")]]);
    }
}
