use std::fmt::Display;

use anyhow::bail;
use itertools::Itertools;

use crate::alphabets::CharacterList;
use crate::species::Species;
use crate::Result;

pub mod tree_node;
pub use tree_node::*;
pub mod tree_parser;

/// Stable position of a node in the tree arena. Indices stay valid across every paired
/// mutation below, nodes are only ever added or removed at the end of the arena.
#[derive(Debug, PartialEq, Clone, Copy, PartialOrd, Eq, Ord, Hash)]
pub struct NodeIdx(pub usize);

impl From<NodeIdx> for usize {
    fn from(node_idx: NodeIdx) -> usize {
        node_idx.0
    }
}

impl Display for NodeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// Undo record of [`Tree::relabel`].
#[derive(Debug)]
pub struct Relabel {
    node: NodeIdx,
    id: String,
    labelled: bool,
    states: CharacterList,
}

/// Undo record of [`Tree::contract`].
#[derive(Debug)]
pub struct Contraction {
    parent: NodeIdx,
    child: NodeIdx,
    position: usize,
    grandchildren: usize,
    adopted: Option<Relabel>,
}

impl Contraction {
    pub fn parent(&self) -> NodeIdx {
        self.parent
    }
}

/// Rooted tree stored as an arena of nodes with parent indices and ordered child lists.
///
/// Every structural mutation comes as a pair whose second half restores the exact prior
/// state (including child order), so backtracking searches can mutate a single tree in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: NodeIdx,
    nodes: Vec<Node>,
    chars: usize,
}

impl Tree {
    /// Creates an empty tree whose nodes all have `chars` characters.
    pub fn new(chars: usize) -> Self {
        Self {
            root: NodeIdx(0),
            nodes: Vec::new(),
            chars,
        }
    }

    /// Creates a tree with a single (root) node.
    pub fn with_root(root: Node) -> Self {
        let mut tree = Tree::new(root.states.len());
        tree.add_node(root);
        tree
    }

    pub fn chars(&self) -> usize {
        self.chars
    }

    pub(crate) fn set_chars(&mut self, chars: usize) {
        self.chars = chars;
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    pub fn set_root(&mut self, idx: NodeIdx) {
        debug_assert!(self.nodes[idx.0].parent.is_none());
        self.root = idx;
    }

    pub fn is_root(&self, idx: NodeIdx) -> bool {
        idx == self.root
    }

    /// Number of arena slots, including nodes currently detached by a contraction.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.0]
    }

    pub fn children(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.nodes[idx.0].children
    }

    pub fn parent(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx.0].parent
    }

    /// Pushes a detached node to the arena and returns its index.
    pub fn add_node(&mut self, mut node: Node) -> NodeIdx {
        debug_assert_eq!(node.states.len(), self.chars);
        let idx = NodeIdx(self.nodes.len());
        node.idx = idx;
        self.nodes.push(node);
        idx
    }

    /// Removes the most recently added node, which must be detached.
    pub fn pop_node(&mut self, idx: NodeIdx) {
        debug_assert_eq!(idx.0 + 1, self.nodes.len());
        debug_assert!(self.nodes[idx.0].parent.is_none());
        debug_assert!(self.nodes[idx.0].children.is_empty());
        self.nodes.pop();
    }

    /// Appends `child` to the children of `parent`.
    pub fn link(&mut self, parent: NodeIdx, child: NodeIdx) {
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detaches `child` from `parent`, returning the position it occupied.
    pub fn unlink(&mut self, parent: NodeIdx, child: NodeIdx) -> Result<usize> {
        let position = self.child_slot(parent, child)?;
        self.nodes[parent.0].children.remove(position);
        self.nodes[child.0].parent = None;
        Ok(position)
    }

    /// Re-attaches `child` at `position`, undoing an [`Tree::unlink`].
    pub fn relink(&mut self, parent: NodeIdx, child: NodeIdx, position: usize) {
        self.nodes[parent.0].children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Subdivides the edge above `node` with the detached node `new`, which takes the place
    /// of `node` among its parent's children and gets `node` as its only child.
    pub fn splice(&mut self, node: NodeIdx, new: NodeIdx) -> Result<()> {
        let Some(parent) = self.nodes[node.0].parent else {
            bail!("Cannot subdivide the edge above the root {node}");
        };
        let slot = self.child_slot(parent, node)?;
        self.nodes[parent.0].children[slot] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[new.0].children.push(node);
        self.nodes[node.0].parent = Some(new);
        Ok(())
    }

    /// Undoes [`Tree::splice`], leaving `new` detached.
    pub fn unsplice(&mut self, node: NodeIdx, new: NodeIdx) -> Result<()> {
        if self.nodes[node.0].parent != Some(new) {
            bail!("Cannot undo the subdivision, {node} is not a child of {new}");
        }
        if let Some(parent) = self.nodes[new.0].parent {
            let slot = self.child_slot(parent, new)?;
            self.nodes[parent.0].children[slot] = node;
        }
        let parent = self.nodes[new.0].parent.take();
        self.nodes[node.0].parent = parent;
        self.nodes[new.0].children.retain(|&c| c != node);
        Ok(())
    }

    fn child_slot(&self, parent: NodeIdx, child: NodeIdx) -> Result<usize> {
        match self.nodes[parent.0].children.iter().position(|&c| c == child) {
            Some(slot) => Ok(slot),
            None => bail!("{child} is not a child of {parent}"),
        }
    }

    /// Gives `idx` the label and states of `species`.
    pub fn relabel(&mut self, idx: NodeIdx, species: &Species) -> Relabel {
        self.set_label(idx, species.id.clone(), species.states.clone())
    }

    pub fn restore_label(&mut self, relabel: Relabel) {
        let node = &mut self.nodes[relabel.node.0];
        node.id = relabel.id;
        node.labelled = relabel.labelled;
        node.states = relabel.states;
    }

    fn set_label(&mut self, idx: NodeIdx, id: String, states: CharacterList) -> Relabel {
        let node = &mut self.nodes[idx.0];
        Relabel {
            node: idx,
            id: std::mem::replace(&mut node.id, id),
            labelled: std::mem::replace(&mut node.labelled, true),
            states: std::mem::replace(&mut node.states, states),
        }
    }

    /// Merges `child` into `parent`: the grandchildren are appended to the parent's
    /// children, the child is detached and, if it is labelled, the parent adopts its label
    /// and states. Two labelled nodes are never merged.
    pub fn contract(&mut self, parent: NodeIdx, child: NodeIdx) -> Result<Contraction> {
        if self.nodes[child.0].parent != Some(parent) {
            bail!("Cannot contract {parent} and {child}, they are not adjacent");
        }
        if self.nodes[parent.0].labelled && self.nodes[child.0].labelled {
            bail!(
                "Cannot contract the edge between labelled nodes {} and {}",
                self.nodes[parent.0].id,
                self.nodes[child.0].id
            );
        }
        let position = self.unlink(parent, child)?;
        let grandchildren = std::mem::take(&mut self.nodes[child.0].children);
        for &grandchild in &grandchildren {
            self.nodes[grandchild.0].parent = Some(parent);
        }
        let count = grandchildren.len();
        self.nodes[parent.0].children.extend(grandchildren);
        let adopted = if self.nodes[child.0].labelled {
            let id = self.nodes[child.0].id.clone();
            let states = self.nodes[child.0].states.clone();
            Some(self.set_label(parent, id, states))
        } else {
            None
        };
        Ok(Contraction {
            parent,
            child,
            position,
            grandchildren: count,
            adopted,
        })
    }

    /// Undoes [`Tree::contract`] exactly.
    pub fn uncontract(&mut self, contraction: Contraction) {
        let Contraction {
            parent,
            child,
            position,
            grandchildren,
            adopted,
        } = contraction;
        if let Some(relabel) = adopted {
            self.restore_label(relabel);
        }
        let siblings = &mut self.nodes[parent.0].children;
        let grandchildren = siblings.split_off(siblings.len() - grandchildren);
        for &grandchild in &grandchildren {
            self.nodes[grandchild.0].parent = Some(child);
        }
        self.nodes[child.0].children = grandchildren;
        self.relink(parent, child, position);
    }

    pub fn preorder(&self) -> Vec<NodeIdx> {
        self.preorder_subroot(self.root)
    }

    pub fn preorder_subroot(&self, subroot_idx: NodeIdx) -> Vec<NodeIdx> {
        let mut order = Vec::<NodeIdx>::with_capacity(self.nodes.len());
        let mut stack = vec![subroot_idx];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx.0].children.iter().rev());
        }
        order
    }

    /// Children before parents, siblings in reverse order.
    pub fn postorder(&self) -> Vec<NodeIdx> {
        let mut order = Vec::<NodeIdx>::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx.0].children.iter());
        }
        order.reverse();
        order
    }

    /// Number of nodes reachable from the root.
    pub fn size(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.preorder().len()
    }

    pub fn leaves(&self) -> Vec<NodeIdx> {
        self.preorder()
            .into_iter()
            .filter(|&idx| self.nodes[idx.0].is_leaf())
            .collect()
    }

    pub fn labelled_count(&self) -> usize {
        self.preorder()
            .into_iter()
            .filter(|&idx| self.nodes[idx.0].labelled)
            .count()
    }

    pub fn labels(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .filter(|&idx| self.nodes[idx.0].labelled)
            .map(|idx| self.nodes[idx.0].id.clone())
            .collect()
    }

    /// Deep copy of the subtree rooted at `idx` into a fresh arena holding only reachable
    /// nodes, numbered in preorder.
    pub fn clone_subtree(&self, idx: NodeIdx) -> Tree {
        let order = self.preorder_subroot(idx);
        let mut new_idx = vec![None; self.nodes.len()];
        for (i, &old) in order.iter().enumerate() {
            new_idx[old.0] = Some(NodeIdx(i));
        }
        let remap = |old: NodeIdx| new_idx[old.0].unwrap_or(old);
        let nodes = order
            .iter()
            .map(|&old| {
                let node = &self.nodes[old.0];
                Node {
                    idx: remap(old),
                    parent: if old == idx { None } else { node.parent.map(remap) },
                    children: node.children.iter().map(|&c| remap(c)).collect(),
                    cost: node.cost,
                    id: node.id.clone(),
                    labelled: node.labelled,
                    states: node.states.clone(),
                }
            })
            .collect();
        Tree {
            root: NodeIdx(0),
            nodes,
            chars: self.chars,
        }
    }

    /// Compacted deep copy of the whole tree.
    pub fn compacted(&self) -> Tree {
        self.clone_subtree(self.root)
    }

    /// Newick representation, labels of internal nodes follow their closing bracket and
    /// non-zero edge costs are written as branch lengths.
    ///
    /// # Example
    /// ```
    /// use mptrees::tree::tree_parser::from_newick;
    /// let tree = from_newick("((A,B)C,D:2.5);").unwrap().pop().unwrap();
    /// assert_eq!(tree.to_newick(), "((A,B)C,D:2.5);");
    /// ```
    pub fn to_newick(&self) -> String {
        self.to_annotated_newick(&[])
    }

    /// Newick representation with the per-character state sets of `annotations[idx]`
    /// written in brackets after each node, e.g. `(A[AC],B[A{CT}])[AC];`.
    pub fn to_annotated_newick(&self, annotations: &[CharacterList]) -> String {
        if self.nodes.is_empty() {
            return String::from(";");
        }
        format!("{};", self.subtree_to_newick(self.root, annotations))
    }

    fn subtree_to_newick(&self, idx: NodeIdx, annotations: &[CharacterList]) -> String {
        let node = &self.nodes[idx.0];
        let mut newick = String::new();
        if !node.children.is_empty() {
            let children = node
                .children
                .iter()
                .map(|&child| self.subtree_to_newick(child, annotations))
                .join(",");
            newick.push_str(&format!("({children})"));
        }
        if node.labelled {
            newick.push_str(&node.id);
        }
        if let Some(states) = annotations.get(idx.0) {
            newick.push_str(&format!("[{}]", states));
        }
        if node.cost != 0.0 {
            newick.push_str(&format!(":{}", node.cost));
        }
        newick
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_newick())
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
