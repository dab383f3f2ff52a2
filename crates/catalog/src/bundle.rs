//! Bundle composition graph.
//!
//! Bundle membership is a directed acyclic graph (bundle -> component). A
//! component may itself be a bundle, so every edge insertion is checked for
//! cycles and for the nesting depth it would create. Backends load the current
//! edges, run [`BundleGraph::check_insert`] and insert inside one transaction.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use wareflow_core::{DomainError, ProductId};

/// Default cap on the number of edges along any bundle path.
pub const DEFAULT_MAX_BUNDLE_DEPTH: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BundleViolation {
    #[error("product {0} cannot contain itself")]
    SelfReference(ProductId),

    #[error("adding {component} to {bundle} would create a cycle")]
    Cycle {
        bundle: ProductId,
        component: ProductId,
    },

    #[error("bundle nesting depth {depth} exceeds the maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("{component} is already a component of {bundle}")]
    Duplicate {
        bundle: ProductId,
        component: ProductId,
    },
}

impl From<BundleViolation> for DomainError {
    fn from(value: BundleViolation) -> Self {
        match value {
            BundleViolation::Duplicate { .. } => DomainError::conflict(value.to_string()),
            _ => DomainError::validation(value.to_string()),
        }
    }
}

/// In-memory view of the bundle edges, built per check.
#[derive(Debug, Clone, Default)]
pub struct BundleGraph {
    children: BTreeMap<ProductId, BTreeSet<ProductId>>,
    parents: BTreeMap<ProductId, BTreeSet<ProductId>>,
}

impl BundleGraph {
    pub fn from_edges(edges: impl IntoIterator<Item = (ProductId, ProductId)>) -> Self {
        let mut graph = Self::default();
        for (bundle, component) in edges {
            graph.children.entry(bundle).or_default().insert(component);
            graph.parents.entry(component).or_default().insert(bundle);
        }
        graph
    }

    pub fn contains_edge(&self, bundle: ProductId, component: ProductId) -> bool {
        self.children
            .get(&bundle)
            .is_some_and(|c| c.contains(&component))
    }

    /// Whether `to` is reachable from `from` by following bundle -> component edges.
    pub fn reaches(&self, from: ProductId, to: ProductId) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !seen.insert(node) {
                continue;
            }
            if let Some(next) = self.children.get(&node) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    /// Longest path (in edges) from `node` down to a leaf component.
    pub fn depth_below(&self, node: ProductId) -> usize {
        longest_path(&self.children, node, &mut HashMap::new())
    }

    /// Longest path (in edges) from a root bundle down to `node`.
    pub fn depth_above(&self, node: ProductId) -> usize {
        longest_path(&self.parents, node, &mut HashMap::new())
    }

    /// Validate adding the edge `bundle -> component`.
    pub fn check_insert(
        &self,
        bundle: ProductId,
        component: ProductId,
        max_depth: usize,
    ) -> Result<(), BundleViolation> {
        if bundle == component {
            return Err(BundleViolation::SelfReference(bundle));
        }
        if self.contains_edge(bundle, component) {
            return Err(BundleViolation::Duplicate { bundle, component });
        }
        if self.reaches(component, bundle) {
            return Err(BundleViolation::Cycle { bundle, component });
        }

        let depth = self.depth_above(bundle) + 1 + self.depth_below(component);
        if depth > max_depth {
            return Err(BundleViolation::DepthExceeded {
                depth,
                max: max_depth,
            });
        }
        Ok(())
    }
}

// The graph is acyclic by construction, so plain memoised DFS terminates.
fn longest_path(
    edges: &BTreeMap<ProductId, BTreeSet<ProductId>>,
    node: ProductId,
    memo: &mut HashMap<ProductId, usize>,
) -> usize {
    if let Some(d) = memo.get(&node) {
        return *d;
    }
    let depth = edges
        .get(&node)
        .map(|next| {
            next.iter()
                .map(|n| 1 + longest_path(edges, *n, memo))
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    memo.insert(node, depth);
    depth
}
