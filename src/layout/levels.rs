//! Level and tree assignment.
//!
//! Roots are nodes without dependencies. Levels are longest paths from the roots,
//! relaxed in dependency order, so a node reached through several parents ends up one
//! column right of its deepest parent. Nodes held back by a loop take one more than
//! their deepest levelled parent, breadth first. Roots whose reach overlaps share a tree.
//!
//! Two fallbacks keep cyclic input placeable, and both are tagged
//! [`TreeRoot::SyntheticRoot`] rather than silently rewriting dependencies:
//! - no root at all: the node with the fewest dependencies is walked as if it had none;
//! - nodes no root reaches: grouped by connectivity and walked breadth-first from their
//!   lowest in-degree member.

use super::{LayoutTree, TreeRoot};
use crate::graph::TaskGraph;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelAssignment {
    pub levels: HashMap<String, usize>,
    pub tree_of: HashMap<String, usize>,
    pub trees: Vec<LayoutTree>,
}

impl LevelAssignment {
    pub fn level(&self, name: &str) -> Option<usize> {
        self.levels.get(name).copied()
    }

    pub fn tree(&self, name: &str) -> Option<usize> {
        self.tree_of.get(name).copied()
    }
}

pub fn assign_levels(graph: &TaskGraph) -> LevelAssignment {
    let mut assignment = LevelAssignment::default();
    if graph.is_empty() {
        return assignment;
    }

    let roots = select_roots(graph);

    // Step 1: longest-path levels from every root
    relax_levels(graph, &roots, &mut assignment.levels);

    // Step 2: roots whose reach overlaps form one tree
    let mut owner: HashMap<String, usize> = HashMap::new();
    let mut sets = DisjointSet::new(roots.len());
    for (root_idx, (name, _)) in roots.iter().enumerate() {
        let mut queue: VecDeque<&str> = VecDeque::from([name.as_str()]);
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            match owner.get(current) {
                Some(&other) if other != root_idx => sets.union(other, root_idx),
                Some(_) => {}
                None => {
                    owner.insert(current.to_string(), root_idx);
                }
            }
            if let Some(node) = graph.get(current) {
                queue.extend(node.dependents.iter().map(|name| name.as_str()));
            }
        }
    }

    let mut tree_for_set: HashMap<usize, usize> = HashMap::new();
    for (root_idx, (name, kind)) in roots.iter().enumerate() {
        let set = sets.find(root_idx);
        let tree_idx = *tree_for_set.entry(set).or_insert_with(|| {
            assignment.trees.push(LayoutTree::new(assignment.trees.len()));
            assignment.trees.len() - 1
        });
        let id = graph.get(name).map(|node| node.id.clone()).unwrap_or_default();
        assignment.trees[tree_idx].roots.push(kind.with_id(id));
    }
    for name in graph.names() {
        if let Some(&root_idx) = owner.get(name) {
            let tree_idx = tree_for_set[&sets.find(root_idx)];
            assignment.tree_of.insert(name.to_string(), tree_idx);
            assignment.trees[tree_idx].members.push(name.to_string());
        }
    }

    // Step 3: sweep what no root reached
    sweep_unreached(graph, &mut assignment);
    assignment
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Rooted,
    Synthetic,
}

impl RootKind {
    fn with_id(self, id: String) -> TreeRoot {
        match self {
            RootKind::Rooted => TreeRoot::Rooted(id),
            RootKind::Synthetic => TreeRoot::SyntheticRoot(id),
        }
    }
}

fn select_roots(graph: &TaskGraph) -> Vec<(String, RootKind)> {
    let roots: Vec<(String, RootKind)> = graph
        .nodes()
        .filter(|node| node.is_root())
        .map(|node| (node.name.clone(), RootKind::Rooted))
        .collect();
    if !roots.is_empty() {
        return roots;
    }

    // Every node has a dependency, so the whole graph sits on cycles
    let fallback = graph
        .nodes()
        .enumerate()
        .min_by_key(|(idx, node)| (node.dependencies.len(), *idx))
        .map(|(_, node)| node);
    match fallback {
        Some(node) => {
            debug!(
                task = %node.name,
                ignored = ?node.dependencies,
                "no root task found, laying out from synthetic root"
            );
            vec![(node.name.clone(), RootKind::Synthetic)]
        }
        None => Vec::new(),
    }
}

fn relax_levels(
    graph: &TaskGraph,
    roots: &[(String, RootKind)],
    levels: &mut HashMap<String, usize>,
) {
    // Unlevelled dependencies per node; a synthetic root ignores its own
    let mut pending: HashMap<&str, usize> = graph
        .nodes()
        .map(|node| (node.name.as_str(), node.dependencies.len()))
        .collect();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for (name, _) in roots {
        if let Some(node) = graph.get(name) {
            pending.insert(node.name.as_str(), 0);
            levels.insert(node.name.clone(), 0);
            queue.push_back(node.name.as_str());
        }
    }

    while let Some(current) = queue.pop_front() {
        let level = levels.get(current).copied().unwrap_or(0);
        let Some(node) = graph.get(current) else {
            continue;
        };
        for dependent in &node.dependents {
            let Some(count) = pending.get_mut(dependent.as_str()) else {
                continue;
            };
            if *count == 0 {
                continue;
            }
            *count -= 1;
            let entry = levels.entry(dependent.clone()).or_insert(0);
            *entry = (*entry).max(level + 1);
            if *count == 0 {
                queue.push_back(dependent.as_str());
            }
        }
    }

    // Nodes a loop holds back: levelled once, breadth first from the partial levels
    let is_stuck = |name: &str| pending.get(name).is_some_and(|&count| count > 0);
    let mut stuck: VecDeque<&str> = graph
        .names()
        .filter(|name| is_stuck(name) && levels.contains_key(*name))
        .collect();
    let mut queued: HashSet<&str> = stuck.iter().copied().collect();
    while let Some(current) = stuck.pop_front() {
        let level = levels.get(current).copied().unwrap_or(0);
        let Some(node) = graph.get(current) else {
            continue;
        };
        for dependent in &node.dependents {
            let dependent = dependent.as_str();
            if is_stuck(dependent) && queued.insert(dependent) {
                let entry = levels.entry(dependent.to_string()).or_insert(0);
                *entry = (*entry).max(level + 1);
                stuck.push_back(dependent);
            }
        }
    }
}

fn sweep_unreached(graph: &TaskGraph, assignment: &mut LevelAssignment) {
    let leftover: Vec<&str> = graph
        .names()
        .filter(|name| !assignment.tree_of.contains_key(*name))
        .collect();
    if leftover.is_empty() {
        return;
    }
    debug!(count = leftover.len(), "tasks unreachable from any root, grouping into synthetic trees");

    let leftover_set: HashSet<&str> = leftover.iter().copied().collect();
    let mut grouped: HashSet<&str> = HashSet::new();

    for &seed in &leftover {
        if grouped.contains(seed) {
            continue;
        }

        // Connected component of unreached nodes, edges taken in both directions
        let mut component: Vec<&str> = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([seed]);
        grouped.insert(seed);
        while let Some(current) = queue.pop_front() {
            component.push(current);
            let Some(node) = graph.get(current) else {
                continue;
            };
            for next in node.dependencies.iter().chain(node.dependents.iter()) {
                let next = next.as_str();
                if leftover_set.contains(next) && grouped.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        component.sort_by_key(|name| graph.index_of(name));

        let tree_idx = assignment.trees.len();
        let mut tree = LayoutTree::new(tree_idx);

        // Breadth-first levels from the lowest in-degree member still unlevelled
        let mut levelled: HashSet<&str> = HashSet::new();
        while levelled.len() < component.len() {
            let Some(start) = component
                .iter()
                .copied()
                .filter(|name| !levelled.contains(name))
                .min_by_key(|name| {
                    let degree = graph.get(name).map_or(0, |node| node.dependencies.len());
                    (degree, graph.index_of(name))
                })
            else {
                break;
            };
            if let Some(node) = graph.get(start) {
                tree.roots.push(TreeRoot::SyntheticRoot(node.id.clone()));
            }

            let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(start, 0)]);
            levelled.insert(start);
            while let Some((current, level)) = queue.pop_front() {
                assignment.levels.insert(current.to_string(), level);
                let Some(node) = graph.get(current) else {
                    continue;
                };
                for dependent in &node.dependents {
                    let dependent = dependent.as_str();
                    if leftover_set.contains(dependent) && levelled.insert(dependent) {
                        queue.push_back((dependent, level + 1));
                    }
                }
            }
        }

        for name in component {
            assignment.tree_of.insert(name.to_string(), tree_idx);
            tree.members.push(name.to_string());
        }
        assignment.trees.push(tree);
    }
}

/// Union-find over root positions.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    /// The smaller index stays the representative so trees keep root order.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}
