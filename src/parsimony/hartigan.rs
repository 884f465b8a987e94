use anyhow::bail;
use hashbrown::HashMap;

use crate::alphabets::CharacterList;
use crate::parsimony::{Edge, ParsimonyScorer, ZeroCostEdges};
use crate::tree::{NodeIdx, Tree};
use crate::Result;

/// Hartigan's unweighted parsimony for trees of any degree.
///
/// Bottom-up, every node keeps per character the states found in the most children (upper
/// set) and the states found in one child fewer (lower set). The top-down pass uses both
/// sets to assign final states and to detect edges that can be contracted for free.
#[derive(Debug, Clone)]
pub struct Hartigan {
    world: CharacterList,
    upper: Vec<CharacterList>,
    lower: Vec<CharacterList>,
    assigned: Vec<CharacterList>,
}

impl Hartigan {
    /// Creates the scorer from the world set, the states observed for every character.
    pub fn new(world: CharacterList) -> Self {
        Self {
            world,
            upper: Vec::new(),
            lower: Vec::new(),
            assigned: Vec::new(),
        }
    }

    fn prepare(&mut self, tree: &Tree) -> Result<()> {
        if tree.chars() != self.world.len() {
            bail!(
                "Tree has {} characters but the world set has {}",
                tree.chars(),
                self.world.len()
            );
        }
        let empty = CharacterList::new(tree.chars());
        self.upper.resize(tree.len(), empty.clone());
        self.lower.resize(tree.len(), empty.clone());
        self.assigned.resize(tree.len(), empty);
        Ok(())
    }

    /// Recomputes the upper and lower sets of one node from those of its children and
    /// returns the node's contribution to the score.
    fn rescore_node(&mut self, tree: &Tree, idx: NodeIdx) -> Result<usize> {
        let node = tree.node(idx);
        let chars = self.world.len();
        if node.states.len() != chars {
            bail!("{} has {} characters, expected {}", node, node.states.len(), chars);
        }
        if node.is_leaf() && !node.labelled {
            bail!("Cannot score unlabelled leaf {}", idx);
        }
        if node.labelled {
            let mut score = 0;
            for i in 0..chars {
                score += node
                    .children
                    .iter()
                    .filter(|c| self.upper[c.0][i].is_disjoint(&node.states[i]))
                    .count();
            }
            self.upper[idx.0] = node.states.clone();
            self.lower[idx.0] = CharacterList::new(chars);
            return Ok(score);
        }

        let mut score = 0;
        let mut upper = CharacterList::new(chars);
        let mut lower = CharacterList::new(chars);
        for i in 0..chars {
            let mut counts: HashMap<u8, usize> = self.world[i].iter().map(|&s| (s, 0)).collect();
            for child in &node.children {
                for &state in self.upper[child.0][i].iter() {
                    *counts.entry(state).or_insert(0) += 1;
                }
            }
            let k = counts.values().copied().max().unwrap_or_default();
            upper[i] = counts
                .iter()
                .filter(|&(_, &count)| count == k)
                .map(|(&state, _)| state)
                .collect();
            if let Some(below) = k.checked_sub(1) {
                lower[i] = counts
                    .iter()
                    .filter(|&(_, &count)| count == below)
                    .map(|(&state, _)| state)
                    .collect();
            }
            score += node.children.len() - k;
        }
        self.upper[idx.0] = upper;
        self.lower[idx.0] = lower;
        Ok(score)
    }
}

impl ParsimonyScorer for Hartigan {
    fn bottom_up(&mut self, tree: &Tree) -> Result<f64> {
        self.prepare(tree)?;
        let mut score = 0;
        for idx in tree.postorder() {
            score += self.rescore_node(tree, idx)?;
        }
        Ok(score as f64)
    }
}

impl ZeroCostEdges for Hartigan {
    fn top_down(&mut self, tree: &Tree) -> Result<Vec<Edge>> {
        if self.upper.len() < tree.len() {
            bail!("Top-down pass requires a bottom-up pass over the same tree");
        }
        let chars = self.world.len();
        let mut edges = Vec::new();
        for idx in tree.preorder() {
            let Some(parent) = tree.parent(idx) else {
                self.assigned[idx.0] = self.upper[idx.0].clone();
                continue;
            };
            let mut zero_cost = true;
            let assigned: CharacterList = (0..chars)
                .map(|i| {
                    let from_parent = &self.assigned[parent.0][i];
                    let upper = &self.upper[idx.0][i];
                    let states = if from_parent.is_subset(upper) {
                        from_parent.clone()
                    } else {
                        upper | &(&self.lower[idx.0][i] & from_parent)
                    };
                    zero_cost &= !states.is_disjoint(from_parent);
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
        self.rescore_node(tree, idx)?;
        Ok(())
    }

    fn assignments(&self) -> &[CharacterList] {
        &self.assigned
    }
}
