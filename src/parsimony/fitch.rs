use anyhow::bail;

use crate::alphabets::CharacterList;
use crate::parsimony::ParsimonyScorer;
use crate::tree::Tree;
use crate::Result;

/// Fitch's unweighted parsimony for binary trees.
///
/// Children are combined left to right: at every character the intersection of the sets is
/// kept if it is non-empty, otherwise the union at a cost of one. A root with three children
/// (an unrooted binary tree) is scored as if it were rerooted on the edge above its last
/// child. Labelled internal nodes keep their own states and pay one per child whose set
/// misses them.
#[derive(Debug, Clone, Default)]
pub struct Fitch {
    sets: Vec<CharacterList>,
}

impl Fitch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParsimonyScorer for Fitch {
    fn bottom_up(&mut self, tree: &Tree) -> Result<f64> {
        let chars = tree.chars();
        self.sets.resize(tree.len(), CharacterList::default());
        let mut score = 0;
        for idx in tree.postorder() {
            let node = tree.node(idx);
            if node.states.len() != chars {
                bail!("{} has {} characters, expected {}", node, node.states.len(), chars);
            }
            if node.is_leaf() {
                if !node.labelled {
                    bail!("Cannot score unlabelled leaf {}", idx);
                }
                self.sets[idx.0] = node.states.clone();
                continue;
            }
            let max_children = if tree.is_root(idx) { 3 } else { 2 };
            if node.children.len() > max_children {
                bail!(
                    "Fitch scoring needs a binary tree, {} has {} children",
                    node,
                    node.children.len()
                );
            }
            if node.labelled {
                for i in 0..chars {
                    score += node
                        .children
                        .iter()
                        .filter(|c| self.sets[c.0][i].is_disjoint(&node.states[i]))
                        .count();
                }
                self.sets[idx.0] = node.states.clone();
            } else {
                let mut acc = self.sets[node.children[0].0].clone();
                for child in &node.children[1..] {
                    let child_sets = &self.sets[child.0];
                    for i in 0..chars {
                        let intersection = &acc[i] & &child_sets[i];
                        if intersection.is_empty() {
                            acc[i] = &acc[i] | &child_sets[i];
                            score += 1;
                        } else {
                            acc[i] = intersection;
                        }
                    }
                }
                self.sets[idx.0] = acc;
            }
        }
        Ok(score as f64)
    }

    fn supports_multifurcation(&self) -> bool {
        false
    }
}
