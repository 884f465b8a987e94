use std::fmt::Display;

use anyhow::bail;
use approx::relative_eq;
use log::{debug, info};

use crate::parsimony::ParsimonyScorer;
use crate::species::{validate, Species};
use crate::tree::{Node, NodeIdx, Tree};
use crate::Result;

/// Which trees the enumerator builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TreeShape {
    /// Unrooted binary trees with unlabelled internal nodes and species at the leaves
    Cubic,
    /// Rooted trees of any degree whose internal nodes may carry species
    Mixed,
}

impl Display for TreeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeShape::Cubic => write!(f, "cubic"),
            TreeShape::Mixed => write!(f, "mixed"),
        }
    }
}

/// Most parsimonious trees found by a search.
#[derive(Debug, Clone)]
pub struct EnumerationResult {
    pub score: f64,
    pub trees: Vec<Tree>,
    /// Number of complete trees that were scored.
    pub visited: usize,
}

impl EnumerationResult {
    /// Node count of the smallest tree found.
    pub fn min_size(&self) -> Option<usize> {
        self.trees.iter().map(Tree::size).min()
    }

    /// The trees with the fewest nodes.
    pub fn compact_trees(&self) -> Vec<&Tree> {
        let Some(min) = self.min_size() else {
            return Vec::new();
        };
        self.trees.iter().filter(|t| t.size() == min).collect()
    }
}

/// Branch and bound search over every tree shape that can be grown by inserting the species
/// one at a time in input order.
///
/// A single working tree is grown in place; every graft is undone after the recursive call
/// returns, so the tree is back to its prior state before the next graft is tried.
#[derive(Debug)]
pub struct TopologyEnumerator<S: ParsimonyScorer> {
    species: Vec<Species>,
    shape: TreeShape,
    scorer: Option<S>,
    best: Option<f64>,
    trees: Vec<Tree>,
    visited: usize,
}

impl<S: ParsimonyScorer> TopologyEnumerator<S> {
    pub fn new(species: &[Species], scorer: S, shape: TreeShape) -> Result<Self> {
        validate(species)?;
        if shape == TreeShape::Mixed && !scorer.supports_multifurcation() {
            bail!("Mixed trees need a scorer that supports multifurcations");
        }
        Ok(Self {
            species: species.to_vec(),
            shape,
            scorer: Some(scorer),
            best: None,
            trees: Vec::new(),
            visited: 0,
        })
    }

    fn unscored(species: Vec<Species>, shape: TreeShape) -> Self {
        Self {
            species,
            shape,
            scorer: None,
            best: None,
            trees: Vec::new(),
            visited: 0,
        }
    }

    pub fn run(mut self) -> Result<EnumerationResult> {
        info!(
            "Enumerating {} trees of {} species",
            self.shape,
            self.species.len()
        );
        let (mut tree, next) = self.seed();
        self.insert(&mut tree, next)?;
        let result = EnumerationResult {
            score: self.best.unwrap_or_default(),
            trees: self.trees,
            visited: self.visited,
        };
        info!(
            "Found {} {} trees with score {} after scoring {} complete trees",
            result.trees.len(),
            self.shape,
            result.score,
            result.visited
        );
        Ok(result)
    }

    /// Starting tree and the index of the first species still to insert.
    pub(crate) fn seed(&self) -> (Tree, usize) {
        let species = &self.species;
        let mut tree = Tree::with_root(Node::from_species(&species[0]));
        if species.len() == 1 {
            return (tree, 1);
        }
        if self.shape == TreeShape::Cubic && species.len() >= 3 {
            tree = Tree::with_root(Node::new_unlabelled(species[0].chars()));
            for s in &species[..3] {
                let leaf = tree.add_node(Node::from_species(s));
                tree.link(tree.root(), leaf);
            }
            return (tree, 3);
        }
        let leaf = tree.add_node(Node::from_species(&species[1]));
        tree.link(tree.root(), leaf);
        (tree, 2)
    }

    /// Tries every graft of species `next` into `tree` and recurses, leaving `tree` as it
    /// was found.
    pub(crate) fn insert(&mut self, tree: &mut Tree, next: usize) -> Result<()> {
        if next == self.species.len() {
            return self.complete(tree);
        }
        if let (Some(scorer), Some(best)) = (&mut self.scorer, self.best) {
            let partial = scorer.bottom_up(tree)?;
            if partial > best && !relative_eq!(partial, best) {
                return Ok(());
            }
        }
        for pos in tree.preorder() {
            let is_root = tree.is_root(pos);
            match self.shape {
                TreeShape::Cubic => {
                    if !is_root {
                        self.bifurcate(tree, pos, next)?;
                    }
                }
                TreeShape::Mixed => {
                    if !is_root {
                        self.bifurcate(tree, pos, next)?;
                        self.insert_above(tree, pos, next)?;
                    }
                    self.attach(tree, pos, next)?;
                    if !tree.node(pos).labelled {
                        self.relabel(tree, pos, next)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// New unlabelled node on the edge above `pos` with the leaf as its second child.
    fn bifurcate(&mut self, tree: &mut Tree, pos: NodeIdx, next: usize) -> Result<()> {
        let internal = tree.add_node(Node::new_unlabelled(tree.chars()));
        tree.splice(pos, internal)?;
        let leaf = tree.add_node(Node::from_species(&self.species[next]));
        tree.link(internal, leaf);
        self.insert(tree, next + 1)?;
        tree.unlink(internal, leaf)?;
        tree.pop_node(leaf);
        tree.unsplice(pos, internal)?;
        tree.pop_node(internal);
        Ok(())
    }

    /// The species as a labelled node on the edge above `pos`.
    fn insert_above(&mut self, tree: &mut Tree, pos: NodeIdx, next: usize) -> Result<()> {
        let node = tree.add_node(Node::from_species(&self.species[next]));
        tree.splice(pos, node)?;
        self.insert(tree, next + 1)?;
        tree.unsplice(pos, node)?;
        tree.pop_node(node);
        Ok(())
    }

    /// The species as a new leaf below `pos`.
    fn attach(&mut self, tree: &mut Tree, pos: NodeIdx, next: usize) -> Result<()> {
        let leaf = tree.add_node(Node::from_species(&self.species[next]));
        tree.link(pos, leaf);
        self.insert(tree, next + 1)?;
        tree.unlink(pos, leaf)?;
        tree.pop_node(leaf);
        Ok(())
    }

    /// The species as the label of the unlabelled node `pos`.
    fn relabel(&mut self, tree: &mut Tree, pos: NodeIdx, next: usize) -> Result<()> {
        let relabel = tree.relabel(pos, &self.species[next]);
        self.insert(tree, next + 1)?;
        tree.restore_label(relabel);
        Ok(())
    }

    fn complete(&mut self, tree: &Tree) -> Result<()> {
        self.visited += 1;
        let Some(scorer) = &mut self.scorer else {
            return Ok(());
        };
        let score = scorer.bottom_up(tree)?;
        match self.best {
            Some(best) if relative_eq!(score, best) => self.trees.push(tree.compacted()),
            Some(best) if score > best => {}
            _ => {
                debug!("New best score {} for {}", score, tree);
                self.best = Some(score);
                self.trees.clear();
                self.trees.push(tree.compacted());
            }
        }
        Ok(())
    }
}

/// Finds every most parsimonious tree of the given shape for the species.
///
/// # Example
/// ```
/// use mptrees::enumeration::{enumerate, TreeShape};
/// use mptrees::parsimony::Hartigan;
/// use mptrees::species::{world_set, Species};
/// let species = vec![
///     Species::new("A", b"AA"),
///     Species::new("B", b"AC"),
///     Species::new("C", b"GC"),
///     Species::new("D", b"GC"),
/// ];
/// let scorer = Hartigan::new(world_set(&species).unwrap());
/// let result = enumerate(&species, scorer, TreeShape::Cubic).unwrap();
/// assert_eq!(result.score, 2.0);
/// assert_eq!(result.visited, 3);
/// ```
pub fn enumerate<S: ParsimonyScorer>(
    species: &[Species],
    scorer: S,
    shape: TreeShape,
) -> Result<EnumerationResult> {
    TopologyEnumerator::new(species, scorer, shape)?.run()
}

/// Number of trees of the given shape on `n` leaves, found by unscored enumeration.
/// For cubic trees this is (2n-5)!!.
pub fn count_topologies(n: usize, shape: TreeShape) -> Result<usize> {
    if n == 0 {
        bail!("No species given, at least one leaf is required");
    }
    let species = (0..n)
        .map(|i| Species::new(&format!("L{i}"), b""))
        .collect::<Vec<_>>();
    let mut enumerator = TopologyEnumerator::<Box<dyn ParsimonyScorer>>::unscored(species, shape);
    let (mut tree, next) = enumerator.seed();
    enumerator.insert(&mut tree, next)?;
    Ok(enumerator.visited)
}
