use anyhow::bail;
use log::debug;
use nalgebra::DMatrix;

use crate::alphabets::{Alphabet, CharacterList, ParsimonySet};
use crate::parsimony::{CostMatrix, Edge, ParsimonyScorer, ZeroCostEdges};
use crate::tree::{NodeIdx, Tree};
use crate::Result;

/// Sankoff's weighted parsimony over a state-to-state cost matrix.
///
/// Every node holds a characters x states table of the cheapest cost of its subtree given
/// each state at the node. For every parent state, each child also records which of its own
/// states reach that minimum (`parent_fits`), from which the top-down pass rebuilds the
/// optimal state sets.
#[derive(Debug, Clone)]
pub struct Sankoff {
    alphabet: Alphabet,
    weights: CostMatrix,
    costs: Vec<DMatrix<f64>>,
    parent_fits: Vec<Vec<Vec<ParsimonySet>>>,
    assigned: Vec<CharacterList>,
}

impl Sankoff {
    /// Creates the scorer, `weights[(s, t)]` is the cost of a change between the states at
    /// positions `s` and `t` of the alphabet.
    ///
    /// # Example
    /// ```
    /// use mptrees::alphabets::dna_alphabet;
    /// use mptrees::parsimony::{CostMatrix, Sankoff};
    /// let weights = CostMatrix::from_fn(4, 4, |i, j| if i == j { 0.0 } else { 1.0 });
    /// assert!(Sankoff::new(dna_alphabet().clone(), weights).is_ok());
    /// let negative = CostMatrix::from_element(4, 4, -1.0);
    /// assert!(Sankoff::new(dna_alphabet().clone(), negative).is_err());
    /// ```
    pub fn new(alphabet: Alphabet, weights: CostMatrix) -> Result<Self> {
        if !weights.is_square() {
            bail!(
                "Cost matrix must be square, got {}x{}",
                weights.nrows(),
                weights.ncols()
            );
        }
        if weights.nrows() != alphabet.len() {
            bail!(
                "Cost matrix is {}x{} but the {} has {} symbols",
                weights.nrows(),
                weights.ncols(),
                alphabet,
                alphabet.len()
            );
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("Cost matrix entries must be finite and non-negative");
        }
        if (0..weights.nrows()).any(|i| weights[(i, i)] != 0.0) {
            bail!("Cost matrix diagonal must be zero");
        }
        debug!("Sankoff scoring over the {} with costs {}", alphabet, weights);
        Ok(Self {
            alphabet,
            weights,
            costs: Vec::new(),
            parent_fits: Vec::new(),
            assigned: Vec::new(),
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn prepare(&mut self, tree: &Tree) {
        let chars = tree.chars();
        let states = self.alphabet.len();
        self.costs.resize(tree.len(), DMatrix::zeros(chars, states));
        self.parent_fits
            .resize(tree.len(), vec![vec![ParsimonySet::new(); states]; chars]);
        self.assigned.resize(tree.len(), CharacterList::new(chars));
    }

    /// Cost table of a node before its children are added: zero everywhere for unlabelled
    /// nodes, zero at the observed states and infinite elsewhere for labelled ones.
    fn initial_costs(&self, tree: &Tree, idx: NodeIdx) -> Result<DMatrix<f64>> {
        let node = tree.node(idx);
        let chars = tree.chars();
        if node.states.len() != chars {
            bail!("{} has {} characters, expected {}", node, node.states.len(), chars);
        }
        let mut costs = DMatrix::zeros(chars, self.alphabet.len());
        if !node.labelled {
            if node.is_leaf() {
                bail!("Cannot score unlabelled leaf {}", idx);
            }
            return Ok(costs);
        }
        costs.fill(f64::INFINITY);
        for (i, set) in node.states.iter().enumerate() {
            for &state in set.iter() {
                let Some(s) = self.alphabet.index(state) else {
                    bail!(
                        "State {} of {} is not in the {}",
                        char::from(state),
                        node.id,
                        self.alphabet
                    );
                };
                costs[(i, s)] = 0.0;
            }
        }
        Ok(costs)
    }

    /// A change between `s` and `t` that costs nothing in either direction. Merging the two
    /// nodes of an edge is only free if the merged node may take either state.
    fn free_change(&self, s: usize, t: usize) -> bool {
        self.weights[(s, t)] == 0.0 && self.weights[(t, s)] == 0.0
    }

    fn state_index(&self, state: u8) -> usize {
        self.alphabet.index(state).unwrap_or_default()
    }
}

impl ParsimonyScorer for Sankoff {
    fn bottom_up(&mut self, tree: &Tree) -> Result<f64> {
        self.prepare(tree);
        for idx in tree.postorder() {
            self.update_node(tree, idx)?;
        }
        let root_costs = &self.costs[tree.root().0];
        Ok(root_costs
            .row_iter()
            .map(|row| row.iter().copied().fold(f64::INFINITY, f64::min))
            .sum())
    }
}

impl ZeroCostEdges for Sankoff {
    fn top_down(&mut self, tree: &Tree) -> Result<Vec<Edge>> {
        if self.costs.len() < tree.len() {
            bail!("Top-down pass requires a bottom-up pass over the same tree");
        }
        let chars = tree.chars();
        let mut edges = Vec::new();
        for idx in tree.preorder() {
            let Some(parent) = tree.parent(idx) else {
                let costs = &self.costs[idx.0];
                self.assigned[idx.0] = costs
                    .row_iter()
                    .map(|row| {
                        let min = row.iter().copied().fold(f64::INFINITY, f64::min);
                        row.iter()
                            .enumerate()
                            .filter(|&(_, &c)| c == min)
                            .map(|(s, _)| self.alphabet.symbol(s))
                            .collect::<ParsimonySet>()
                    })
                    .collect();
                continue;
            };
            let mut zero_cost = true;
            let assigned: CharacterList = (0..chars)
                .map(|i| {
                    let from_parent = &self.assigned[parent.0][i];
                    let states = from_parent.iter().fold(ParsimonySet::new(), |acc, &s| {
                        &acc | &self.parent_fits[idx.0][i][self.state_index(s)]
                    });
                    zero_cost &= states.iter().any(|&t| {
                        from_parent
                            .iter()
                            .any(|&s| self.free_change(self.state_index(s), self.state_index(t)))
                    });
                    states
                })
                .collect();
            self.assigned[idx.0] = assigned;
            if zero_cost && !(tree.node(parent).labelled && tree.node(idx).labelled) {
                edges.push(Edge { parent, child: idx });
            }
        }
        Ok(edges)
    }

    fn update_node(&mut self, tree: &Tree, idx: NodeIdx) -> Result<()> {
        let mut costs = self.initial_costs(tree, idx)?;
        let states = self.alphabet.len();
        for &child in tree.children(idx) {
            let child_costs = &self.costs[child.0];
            let mut fits = vec![vec![ParsimonySet::new(); states]; tree.chars()];
            for (i, char_fits) in fits.iter_mut().enumerate() {
                for (s, fit) in char_fits.iter_mut().enumerate() {
                    let mut min = f64::INFINITY;
                    for t in 0..states {
                        let cost = child_costs[(i, t)] + self.weights[(s, t)];
                        if cost < min {
                            min = cost;
                            fit.clear();
                        }
                        if cost == min {
                            fit.insert(self.alphabet.symbol(t));
                        }
                    }
                    if costs[(i, s)].is_finite() {
                        costs[(i, s)] += min;
                    }
                }
            }
            self.parent_fits[child.0] = fits;
        }
        self.costs[idx.0] = costs;
        Ok(())
    }

    fn assignments(&self) -> &[CharacterList] {
        &self.assigned
    }
}
