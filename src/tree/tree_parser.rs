use std::fmt;

use anyhow::bail;
use itertools::Itertools;
use log::info;
use pest::{error::Error as PestError, iterators::Pair, Parser};
use pest_derive::Parser;

use crate::alphabets::{CharacterList, ParsimonySet};
use crate::tree::{Node, NodeIdx, Tree};
use crate::Result;

#[derive(Parser)]
#[grammar = "./tree/newick.pest"]
pub struct NewickParser;

#[derive(Debug)]
pub(crate) struct ParsingError(pub(crate) Box<PestError<Rule>>);

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Malformed newick string")?;
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParsingError {}

/// Parses every `;`-terminated tree of a Newick string.
///
/// Labels become labelled nodes, an optional bracketed annotation after a node gives its
/// per-character states (a symbol or a `{...}` set per character) and branch lengths are
/// kept as edge costs. Nodes are numbered in preorder, the root is node 0.
///
/// # Example
/// ```
/// use mptrees::tree::tree_parser::from_newick;
/// let trees = from_newick("((A[AC],B[AG])[A{CG}],C[TT]); (A,B);").unwrap();
/// assert_eq!(trees.len(), 2);
/// assert_eq!(trees[0].chars(), 2);
/// assert_eq!(trees[0].size(), 5);
/// assert_eq!(trees[1].chars(), 0);
/// ```
pub fn from_newick(newick_string: &str) -> Result<Vec<Tree>> {
    info!("Parsing newick trees.");
    let mut pairs = match NewickParser::parse(Rule::newick, newick_string) {
        Ok(pairs) => pairs,
        Err(e) => bail!(ParsingError(Box::new(e))),
    };
    let mut trees = Vec::new();
    if let Some(newick_rule) = pairs.next() {
        for tree_rule in newick_rule.into_inner() {
            if tree_rule.as_rule() != Rule::tree {
                continue;
            }
            if let Some(node_rule) = tree_rule.into_inner().next() {
                let mut tree = Tree::new(0);
                tree.root = tree.parse_node_rule(node_rule, None);
                tree.complete()?;
                trees.push(tree);
            }
        }
    }
    if trees.is_empty() {
        bail!("No trees found in the newick string");
    }
    info!("Finished parsing {} newick trees successfully.", trees.len());
    Ok(trees)
}

impl Tree {
    fn parse_node_rule(&mut self, node_rule: Pair<Rule>, parent: Option<NodeIdx>) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len());
        let mut node = Node::new_unlabelled(0);
        node.idx = idx;
        node.parent = parent;
        self.nodes.push(node);

        let mut children = Vec::new();
        for rule in node_rule.into_inner() {
            match rule.as_rule() {
                Rule::children => {
                    for child_rule in rule.into_inner() {
                        children.push(self.parse_node_rule(child_rule, Some(idx)));
                    }
                }
                Rule::label => {
                    self.nodes[idx.0].id = rule.as_str().to_string();
                    self.nodes[idx.0].labelled = true;
                }
                Rule::annotation => self.nodes[idx.0].states = Tree::parse_annotation_rule(rule),
                Rule::branch_length => self.nodes[idx.0].cost = Tree::parse_branch_length_rule(rule),
                _ => unreachable!(),
            }
        }
        self.nodes[idx.0].children = children;
        idx
    }

    /// Settles the number of characters from the annotations and gives every node without
    /// one empty state sets of that length.
    fn complete(&mut self) -> Result<()> {
        let lengths = self
            .nodes
            .iter()
            .map(|n| n.states.len())
            .filter(|&l| l > 0)
            .unique()
            .collect::<Vec<_>>();
        if lengths.len() > 1 {
            bail!(
                "Inconsistent numbers of annotated characters in newick tree: {:?}",
                lengths
            );
        }
        self.chars = lengths.first().copied().unwrap_or_default();
        for node in self.nodes.iter_mut() {
            if node.states.is_empty() {
                node.states = CharacterList::new(self.chars);
            }
        }
        Ok(())
    }

    fn parse_annotation_rule(rule: Pair<Rule>) -> CharacterList {
        rule.into_inner()
            .map(|character| match character.as_rule() {
                Rule::state_set => character
                    .into_inner()
                    .flat_map(|state| state.as_str().bytes())
                    .map(|s| s.to_ascii_uppercase())
                    .collect::<ParsimonySet>(),
                _ => character
                    .as_str()
                    .bytes()
                    .map(|s| s.to_ascii_uppercase())
                    .collect::<ParsimonySet>(),
            })
            .collect()
    }

    fn parse_branch_length_rule(rule: Pair<Rule>) -> f64 {
        rule.into_inner()
            .next()
            .map(|number| number.as_str().trim().parse::<f64>().unwrap_or_default())
            .unwrap_or_default()
    }
}
