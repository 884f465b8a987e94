use std::fmt::{Debug, Display};

use crate::alphabets::CharacterList;
use crate::species::Species;
use crate::tree::NodeIdx;

#[derive(Clone, PartialEq)]
pub struct Node {
    pub idx: NodeIdx,
    pub parent: Option<NodeIdx>,
    pub children: Vec<NodeIdx>,
    /// Weight of the edge to the parent, carried through Newick branch lengths.
    pub cost: f64,
    pub id: String,
    pub labelled: bool,
    /// Observed states of a labelled node, empty sets for unlabelled ones.
    pub states: CharacterList,
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.labelled {
            write!(f, "{} with id {}", self.idx, self.id)
        } else {
            write!(f, "{}", self.idx)
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.labelled {
            writeln!(
                f,
                "({}) {:?} [{}], parent: {:?}, children: {:?}",
                self.id, self.idx, self.states, self.parent, self.children,
            )
        } else {
            writeln!(
                f,
                "{:?}, parent: {:?}, children: {:?}",
                self.idx, self.parent, self.children,
            )
        }
    }
}

impl Node {
    pub fn new_unlabelled(chars: usize) -> Self {
        Self {
            idx: NodeIdx(0),
            parent: None,
            children: Vec::new(),
            cost: 0.0,
            id: String::new(),
            labelled: false,
            states: CharacterList::new(chars),
        }
    }

    pub fn from_species(species: &Species) -> Self {
        Self {
            idx: NodeIdx(0),
            parent: None,
            children: Vec::new(),
            cost: 0.0,
            id: species.id.clone(),
            labelled: true,
            states: species.states.clone(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
