use anyhow::bail;
use approx::relative_eq;
use hashbrown::HashSet;
use itertools::Itertools;
use log::{debug, info, warn};

use crate::parsimony::ZeroCostEdges;
use crate::tree::{NodeIdx, Tree};
use crate::Result;

/// Smallest trees reachable from one tree by contracting zero-cost edges.
#[derive(Debug, Clone)]
pub struct ContractionResult {
    /// Score of the input tree, which every contracted tree shares.
    pub score: f64,
    /// Node count of the result trees.
    pub size: usize,
    pub trees: Vec<Tree>,
    /// Number of edge contractions performed during the search.
    pub contractions: usize,
}

/// Depth-first search over sequences of zero-cost edge contractions.
///
/// After every contraction only the path from the contracted edge to the root is
/// rescored, and the contraction is undone before the next edge is tried.
#[derive(Debug)]
pub struct EdgeContractor<Z: ZeroCostEdges> {
    scorer: Z,
    best_size: usize,
    trees: Vec<Tree>,
    seen: HashSet<String>,
    contractions: usize,
}

impl<Z: ZeroCostEdges> EdgeContractor<Z> {
    pub fn new(scorer: Z) -> Self {
        Self {
            scorer,
            best_size: usize::MAX,
            trees: Vec::new(),
            seen: HashSet::new(),
            contractions: 0,
        }
    }

    /// Contracts `tree`, merging its smallest contracted trees with those found so far.
    /// Returns the score of the tree.
    pub fn add(&mut self, tree: &Tree) -> Result<f64> {
        let mut tree = tree.compacted();
        let score = self.scorer.bottom_up(&tree)?;
        debug!("Contracting {} with score {}", tree, score);
        self.search(&mut tree)?;
        Ok(score)
    }

    pub fn finish(self, score: f64) -> ContractionResult {
        info!(
            "Contracted to {} trees of {} nodes with {} contractions",
            self.trees.len(),
            self.best_size,
            self.contractions
        );
        ContractionResult {
            score,
            size: self.best_size,
            trees: self.trees,
            contractions: self.contractions,
        }
    }

    fn search(&mut self, tree: &mut Tree) -> Result<()> {
        let edges = self.scorer.top_down(tree)?;
        let size = tree.size();
        if size.saturating_sub(edges.len()) > self.best_size {
            return Ok(());
        }
        if edges.is_empty() {
            self.merge(tree, size);
            return Ok(());
        }
        for edge in edges {
            let contraction = tree.contract(edge.parent, edge.child)?;
            self.contractions += 1;
            self.scorer.refresh_path(tree, edge.parent)?;
            self.search(tree)?;
            tree.uncontract(contraction);
            self.scorer.refresh_path(tree, edge.child)?;
        }
        Ok(())
    }

    fn merge(&mut self, tree: &Tree, size: usize) {
        if size < self.best_size {
            self.best_size = size;
            self.trees.clear();
            self.seen.clear();
        }
        if self.seen.insert(canonical_form(tree, tree.root())) {
            self.trees.push(tree.compacted());
        }
    }
}

/// Newick-like key of the subtree at `idx` with children sorted, equal for trees that only
/// differ in child order.
fn canonical_form(tree: &Tree, idx: NodeIdx) -> String {
    let node = tree.node(idx);
    let children = node
        .children
        .iter()
        .map(|&child| canonical_form(tree, child))
        .sorted()
        .join(",");
    let label = if node.labelled { node.id.as_str() } else { "" };
    format!("({children}){label}")
}

/// Contracts zero-cost edges of `tree` until none are left, keeping every smallest tree.
///
/// # Example
/// ```
/// use mptrees::contraction::contract;
/// use mptrees::parsimony::Hartigan;
/// use mptrees::species::{fill_states, world_set, Species};
/// use mptrees::tree::tree_parser::from_newick;
/// let species = vec![
///     Species::new("A", b"A"),
///     Species::new("B", b"A"),
///     Species::new("C", b"C"),
/// ];
/// let mut tree = from_newick("((A,B),C);").unwrap().pop().unwrap();
/// fill_states(&mut tree, &species).unwrap();
/// let result = contract(&tree, Hartigan::new(world_set(&species).unwrap())).unwrap();
/// assert_eq!(result.score, 1.0);
/// assert_eq!(result.size, 3);
/// ```
pub fn contract<Z: ZeroCostEdges>(tree: &Tree, scorer: Z) -> Result<ContractionResult> {
    let mut contractor = EdgeContractor::new(scorer);
    let score = contractor.add(tree)?;
    Ok(contractor.finish(score))
}

/// Contracts every tree of a set of equally parsimonious trees and keeps the smallest
/// contracted trees over the whole set.
pub fn contract_all<Z: ZeroCostEdges>(trees: &[Tree], scorer: Z) -> Result<ContractionResult> {
    let Some((first, rest)) = trees.split_first() else {
        bail!("No trees to contract");
    };
    let mut contractor = EdgeContractor::new(scorer);
    let score = contractor.add(first)?;
    for tree in rest {
        let other = contractor.add(tree)?;
        if !relative_eq!(score, other) {
            warn!("Contracting trees with different scores {} and {}", score, other);
        }
    }
    Ok(contractor.finish(score))
}
