use std::fmt::{Debug, Display};

use anyhow::bail;
use dyn_clone::DynClone;
use log::debug;
use nalgebra::DMatrix;

use crate::alphabets::{Alphabet, CharacterList};
use crate::tree::{NodeIdx, Tree};
use crate::Result;

pub mod fitch;
pub use fitch::*;
pub mod hartigan;
pub use hartigan::*;
pub mod sankoff;
pub use sankoff::*;

pub type CostMatrix = DMatrix<f64>;

/// A parent-child edge of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent: NodeIdx,
    pub child: NodeIdx,
}

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.parent, self.child)
    }
}

/// A parsimony scoring algorithm. Per-node working state lives in the scorer and is indexed
/// by [`NodeIdx`], so one scorer can be reused across every tree of a search.
pub trait ParsimonyScorer: Debug + DynClone + Send {
    /// Scores the tree rooted at `tree.root()`, refreshing the per-node state of every
    /// reachable node.
    fn bottom_up(&mut self, tree: &Tree) -> Result<f64>;

    /// Whether nodes may have more than two children (three at the root).
    fn supports_multifurcation(&self) -> bool {
        true
    }
}

dyn_clone::clone_trait_object!(ParsimonyScorer);

/// Scorers that can also find the zero-cost edges of a tree, used for edge contraction.
pub trait ZeroCostEdges: ParsimonyScorer {
    /// Assigns final states top-down and returns the edges, in preorder of their child,
    /// whose contraction does not change the score. Edges between two labelled nodes are
    /// never reported. Needs a preceding [`ParsimonyScorer::bottom_up`].
    fn top_down(&mut self, tree: &Tree) -> Result<Vec<Edge>>;

    /// Recomputes the bottom-up state of one node from the current state of its children.
    fn update_node(&mut self, tree: &Tree, idx: NodeIdx) -> Result<()>;

    /// Recomputes the bottom-up state of `node` and all its ancestors after a local change.
    fn refresh_path(&mut self, tree: &Tree, node: NodeIdx) -> Result<()> {
        let mut current = Some(node);
        while let Some(idx) = current {
            self.update_node(tree, idx)?;
            current = tree.parent(idx);
        }
        Ok(())
    }

    /// Final state sets of the last top-down pass, indexed by node.
    fn assignments(&self) -> &[CharacterList];
}

dyn_clone::clone_trait_object!(ZeroCostEdges);

impl ParsimonyScorer for Box<dyn ParsimonyScorer> {
    fn bottom_up(&mut self, tree: &Tree) -> Result<f64> {
        (**self).bottom_up(tree)
    }

    fn supports_multifurcation(&self) -> bool {
        (**self).supports_multifurcation()
    }
}

impl ParsimonyScorer for Box<dyn ZeroCostEdges> {
    fn bottom_up(&mut self, tree: &Tree) -> Result<f64> {
        (**self).bottom_up(tree)
    }

    fn supports_multifurcation(&self) -> bool {
        (**self).supports_multifurcation()
    }
}

impl ZeroCostEdges for Box<dyn ZeroCostEdges> {
    fn top_down(&mut self, tree: &Tree) -> Result<Vec<Edge>> {
        (**self).top_down(tree)
    }

    fn update_node(&mut self, tree: &Tree, idx: NodeIdx) -> Result<()> {
        (**self).update_node(tree, idx)
    }

    fn refresh_path(&mut self, tree: &Tree, node: NodeIdx) -> Result<()> {
        (**self).refresh_path(tree, node)
    }

    fn assignments(&self) -> &[CharacterList] {
        (**self).assignments()
    }
}

/// Scores a tree.
pub fn score<S: ParsimonyScorer + ?Sized>(tree: &Tree, scorer: &mut S) -> Result<f64> {
    let score = scorer.bottom_up(tree)?;
    debug!("Scored {} at {}", tree, score);
    Ok(score)
}

/// Scores a tree and returns its zero-cost edges.
pub fn zero_cost_edges<Z: ZeroCostEdges + ?Sized>(
    tree: &Tree,
    scorer: &mut Z,
) -> Result<(f64, Vec<Edge>)> {
    let score = scorer.bottom_up(tree)?;
    let edges = scorer.top_down(tree)?;
    Ok((score, edges))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScoringModel {
    /// Unweighted scoring of binary trees
    Fitch,
    /// Unweighted scoring of trees of any degree
    Hartigan,
    /// Weighted scoring with a state-to-state cost matrix
    Sankoff,
}

impl Display for ScoringModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringModel::Fitch => write!(f, "Fitch"),
            ScoringModel::Hartigan => write!(f, "Hartigan"),
            ScoringModel::Sankoff => write!(f, "Sankoff"),
        }
    }
}

/// Builds the scorers of a run from the model and its inputs.
///
/// # Example
/// ```
/// use mptrees::parsimony::{ScoringBuilder, ScoringModel};
/// use mptrees::species::{world_set, Species};
/// let species = vec![Species::new("A", b"AC"), Species::new("B", b"GC")];
/// let builder = ScoringBuilder::new(ScoringModel::Fitch).world_set(world_set(&species).unwrap());
/// assert!(builder.build().is_ok());
/// // Fitch cannot find zero-cost edges, contraction falls back to Hartigan
/// assert!(builder.build_contraction().is_ok());
/// assert!(ScoringBuilder::new(ScoringModel::Sankoff).build().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ScoringBuilder {
    model: ScoringModel,
    world: Option<CharacterList>,
    weights: Option<(Alphabet, CostMatrix)>,
}

impl ScoringBuilder {
    pub fn new(model: ScoringModel) -> Self {
        Self {
            model,
            world: None,
            weights: None,
        }
    }

    pub fn world_set(mut self, world: CharacterList) -> Self {
        self.world = Some(world);
        self
    }

    pub fn weights(mut self, alphabet: Alphabet, weights: CostMatrix) -> Self {
        self.weights = Some((alphabet, weights));
        self
    }

    pub fn model(&self) -> ScoringModel {
        self.model
    }

    /// Scorer used to evaluate candidate trees.
    pub fn build(&self) -> Result<Box<dyn ParsimonyScorer>> {
        Ok(match self.model {
            ScoringModel::Fitch => Box::new(Fitch::new()),
            ScoringModel::Hartigan => Box::new(self.hartigan()?),
            ScoringModel::Sankoff => Box::new(self.sankoff()?),
        })
    }

    /// Scorer used to contract zero-cost edges, Hartigan stands in for Fitch.
    pub fn build_contraction(&self) -> Result<Box<dyn ZeroCostEdges>> {
        Ok(match self.model {
            ScoringModel::Fitch | ScoringModel::Hartigan => Box::new(self.hartigan()?),
            ScoringModel::Sankoff => Box::new(self.sankoff()?),
        })
    }

    fn hartigan(&self) -> Result<Hartigan> {
        match &self.world {
            Some(world) => Ok(Hartigan::new(world.clone())),
            None => bail!("Hartigan scoring requires the world set of the characters"),
        }
    }

    fn sankoff(&self) -> Result<Sankoff> {
        match &self.weights {
            Some((alphabet, weights)) => Sankoff::new(alphabet.clone(), weights.clone()),
            None => bail!("Sankoff scoring requires a cost matrix"),
        }
    }
}
