//! Index-based feature DAG.
//!
//! Node `i` of the [`DiGraph`] is feature `i` of the declaration-ordered list, and an edge
//! `a -> b` means `a` depends on `b`. Conflicts are not part of the graph. A built graph
//! holds no pointers or interior mutability, so it can sit in a `static`.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::catalogue::{Feature, Purpose};
use crate::error::ResolutionError;

#[derive(Debug)]
pub struct FeatureGraph {
    features: Vec<Feature>,
    /// Canonical names and aliases, lowercased.
    index: BTreeMap<String, usize>,
    deps: DiGraph<(), ()>,
    conflicts: Vec<Vec<usize>>,
}

/// A purpose-checked, dependency-closed feature set.
#[derive(Debug, Clone)]
pub struct ResolvedFeatures<'g> {
    graph: &'g FeatureGraph,
    members: BTreeSet<usize>,
    order: Vec<usize>,
}

impl FeatureGraph {
    /// Build the graph, rejecting duplicate keys, undeclared references, and cycles.
    pub fn build(features: Vec<Feature>) -> Result<Self, ResolutionError> {
        let mut index = BTreeMap::new();
        for (idx, feature) in features.iter().enumerate() {
            for key in std::iter::once(feature.name).chain(feature.aliases.iter().copied()) {
                if index.insert(key.to_ascii_lowercase(), idx).is_some() {
                    return Err(ResolutionError::DuplicateFeature(key.to_string()));
                }
            }
        }

        let edges = |feature: &Feature, names: &[&str]| -> Result<Vec<usize>, ResolutionError> {
            names
                .iter()
                .map(|name| {
                    features
                        .iter()
                        .position(|f| f.name == *name)
                        .ok_or_else(|| ResolutionError::UnresolvedDependency {
                            feature: feature.name.to_string(),
                            dependency: name.to_string(),
                        })
                })
                .collect()
        };

        let mut deps = DiGraph::with_capacity(features.len(), features.len());
        for _ in &features {
            deps.add_node(());
        }
        let mut conflicts = Vec::with_capacity(features.len());
        for (idx, feature) in features.iter().enumerate() {
            for dep in edges(feature, feature.depends_on)? {
                deps.add_edge(NodeIndex::new(idx), NodeIndex::new(dep), ());
            }
            conflicts.push(edges(feature, feature.conflicts_with)?);
        }

        if let Err(cycle) = toposort(&deps, None) {
            return Err(ResolutionError::CyclicDependency {
                feature: features[cycle.node_id().index()].name.to_string(),
            });
        }

        Ok(Self {
            features,
            index,
            deps,
            conflicts,
        })
    }

    fn depends_on(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.deps
            .neighbors_directed(NodeIndex::new(idx), Direction::Outgoing)
            .map(|n| n.index())
    }

    fn dependents(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.deps
            .neighbors_directed(NodeIndex::new(idx), Direction::Incoming)
            .map(|n| n.index())
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, idx: usize) -> &Feature {
        &self.features[idx]
    }

    /// Index of a feature by name or alias, ignoring case and surrounding whitespace.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(&name.trim().to_ascii_lowercase()).copied()
    }

    /// Resolve `requested` for a validator of the given `purpose`.
    ///
    /// The result contains every requested feature plus its transitive dependencies.
    /// Fails on unknown names, on any member whose purpose differs from `purpose`, and on
    /// any pair of members that conflict.
    pub fn resolve<'a, I>(&self, purpose: Purpose, requested: I) -> Result<ResolvedFeatures<'_>, ResolutionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut members = BTreeSet::new();
        let mut stack = Vec::new();
        for name in requested {
            let idx = self
                .lookup(name)
                .ok_or_else(|| ResolutionError::UnknownFeature(name.to_string()))?;
            stack.push(idx);
        }
        while let Some(idx) = stack.pop() {
            if members.insert(idx) {
                stack.extend(self.depends_on(idx));
            }
        }

        for &idx in &members {
            let feature = &self.features[idx];
            if let Some(expected) = feature.purpose {
                if expected != purpose {
                    return Err(ResolutionError::PurposeConflict {
                        feature: feature.name.to_string(),
                        expected: expected.to_string(),
                    });
                }
            }
        }

        for &idx in &members {
            if let Some(&other) = self.conflicts[idx].iter().find(|c| members.contains(c)) {
                return Err(ResolutionError::Conflict {
                    feature: self.features[idx].name.to_string(),
                    other: self.features[other].name.to_string(),
                });
            }
        }

        let order = self.render_order(&members);
        Ok(ResolvedFeatures {
            graph: self,
            members,
            order,
        })
    }

    /// Kahn's algorithm restricted to `members`; the ready queue pops the lowest
    /// declaration index first.
    fn render_order(&self, members: &BTreeSet<usize>) -> Vec<usize> {
        let mut pending: BTreeMap<usize, usize> = members
            .iter()
            .map(|&idx| {
                let deps = self.depends_on(idx).filter(|d| members.contains(d)).count();
                (idx, deps)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .filter(|(_, &deps)| deps == 0)
            .map(|(&idx, _)| Reverse(idx))
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(idx);
            for dependent in self.dependents(idx) {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(Reverse(dependent));
                    }
                }
            }
        }
        order
    }

    /// Remove `name` from `selected`, along with every selected feature that depends on it
    /// directly or through other features. Returns the remaining canonical names in
    /// declaration order.
    pub fn remove_cascade<'a, I>(&self, selected: I, name: &str) -> Result<Vec<&str>, ResolutionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let target = self
            .lookup(name)
            .ok_or_else(|| ResolutionError::UnknownFeature(name.to_string()))?;

        let mut kept = BTreeSet::new();
        for name in selected {
            let idx = self
                .lookup(name)
                .ok_or_else(|| ResolutionError::UnknownFeature(name.to_string()))?;
            kept.insert(idx);
        }

        let mut removed = BTreeSet::new();
        let mut stack = vec![target];
        while let Some(idx) = stack.pop() {
            if removed.insert(idx) {
                kept.remove(&idx);
                stack.extend(self.dependents(idx));
            }
        }

        Ok(kept.into_iter().map(|idx| self.features[idx].name).collect())
    }
}

impl<'g> ResolvedFeatures<'g> {
    /// Features in render order: dependencies first, ties by declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'g Feature> + '_ {
        self.order.iter().map(|&idx| self.graph.feature(idx))
    }

    /// Canonical names in render order.
    pub fn names(&self) -> Vec<&'g str> {
        self.iter().map(|f| f.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.graph
            .lookup(name)
            .is_some_and(|idx| self.members.contains(&idx))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
