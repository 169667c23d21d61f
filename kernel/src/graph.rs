use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

/// Directed graph with deterministic (insertion) vertex order.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    edges: IndexMap<T, IndexSet<T>>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Graph {
            edges: IndexMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> Graph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: T) {
        self.edges.entry(vertex).or_default();
    }

    pub fn add_edge(&mut self, from: T, to: T) {
        self.edges.entry(from).or_default().insert(to.clone());
        self.add_vertex(to);
    }

    pub fn contains(&self, vertex: &T) -> bool {
        self.edges.contains_key(vertex)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &T> {
        self.edges.keys()
    }

    pub fn suc(&self, vertex: &T) -> impl Iterator<Item = &T> {
        self.edges.get(vertex).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether `target` is reachable from `from` through at least one edge.
    pub fn has_suc(&self, from: &T, target: &T) -> bool {
        let mut visited = IndexSet::new();
        let mut pending: Vec<&T> = self.suc(from).collect();
        while let Some(vertex) = pending.pop() {
            if vertex == target {
                return true;
            }
            if visited.insert(vertex) {
                pending.extend(self.suc(vertex));
            }
        }
        false
    }

    pub fn self_referencing(&self, vertex: &T) -> bool {
        self.has_suc(vertex, vertex)
    }

    /// Strongly connected components, every component listed after all the
    /// components it has edges into. Members keep insertion order.
    pub fn topological_order(&self) -> Vec<Vec<T>> {
        let mut tarjan = Tarjan {
            index: vec![None; self.edges.len()],
            low: vec![0; self.edges.len()],
            on_stack: vec![false; self.edges.len()],
            stack: Vec::new(),
            next: 0,
            components: Vec::new(),
        };
        for vertex in 0..self.edges.len() {
            if tarjan.index[vertex].is_none() {
                self.strong_connect(vertex, &mut tarjan);
            }
        }
        tarjan
            .components
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .filter_map(|i| self.edges.get_index(i).map(|(vertex, _)| vertex.clone()))
                    .collect()
            })
            .collect()
    }

    fn strong_connect(&self, vertex: usize, tarjan: &mut Tarjan) {
        tarjan.index[vertex] = Some(tarjan.next);
        tarjan.low[vertex] = tarjan.next;
        tarjan.next += 1;
        tarjan.stack.push(vertex);
        tarjan.on_stack[vertex] = true;

        let successors: Vec<usize> = self
            .edges
            .get_index(vertex)
            .into_iter()
            .flat_map(|(_, targets)| targets.iter())
            .filter_map(|target| self.edges.get_index_of(target))
            .collect();
        for successor in successors {
            match tarjan.index[successor] {
                None => {
                    self.strong_connect(successor, tarjan);
                    tarjan.low[vertex] = tarjan.low[vertex].min(tarjan.low[successor]);
                }
                Some(index) if tarjan.on_stack[successor] => {
                    tarjan.low[vertex] = tarjan.low[vertex].min(index);
                }
                Some(_) => {}
            }
        }

        if tarjan.index[vertex] == Some(tarjan.low[vertex]) {
            let mut component = Vec::new();
            while let Some(member) = tarjan.stack.pop() {
                tarjan.on_stack[member] = false;
                component.push(member);
                if member == vertex {
                    break;
                }
            }
            component.sort_unstable();
            tarjan.components.push(component);
        }
    }
}

struct Tarjan {
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next: usize,
    components: Vec<Vec<usize>>,
}
