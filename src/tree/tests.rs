use rstest::*;

use crate::alphabets::CharacterList;
use crate::species::Species;
use crate::tree;
use crate::tree::tree_parser::from_newick;
use crate::tree::{Node, NodeIdx};

#[test]
fn link_then_unlink_restores_tree() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let new = tree.add_node(Node::new_unlabelled(0));
    tree.link(tree.root(), new);
    assert_eq!(tree.size(), 6);
    assert_eq!(tree.children(tree.root()).len(), 3);

    let position = tree.unlink(tree.root(), new).unwrap();
    assert_eq!(position, 2);
    tree.pop_node(new);
    assert_eq!(tree, before);
}

#[test]
fn unlink_then_relink_keeps_child_order() {
    let mut tree = tree!("(A,B,C);");
    let before = tree.clone();
    let position = tree.unlink(NodeIdx(0), NodeIdx(2)).unwrap();
    assert_eq!(position, 1);
    assert_eq!(tree.to_newick(), "(A,C);");
    tree.relink(NodeIdx(0), NodeIdx(2), position);
    assert_eq!(tree, before);
}

#[test]
fn splice_subdivides_edge_in_place() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let new = tree.add_node(Node::new_unlabelled(0));
    tree.splice(NodeIdx(2), new).unwrap();
    assert_eq!(tree.to_newick(), "(((A),B),C);");
    assert_eq!(tree.parent(NodeIdx(2)), Some(new));
    assert_eq!(tree.parent(new), Some(NodeIdx(1)));

    tree.unsplice(NodeIdx(2), new).unwrap();
    tree.pop_node(new);
    assert_eq!(tree, before);
}

#[test]
fn splice_above_root_fails() {
    let mut tree = tree!("(A,B);");
    let new = tree.add_node(Node::new_unlabelled(0));
    let res = tree.splice(tree.root(), new);
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("above the root"));
}

#[test]
fn unlink_of_a_non_child_fails() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let res = tree.unlink(NodeIdx(0), NodeIdx(2));
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("is not a child of"));
    assert_eq!(tree, before);
}

#[test]
fn unsplice_without_a_subdivision_fails() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let res = tree.unsplice(NodeIdx(2), NodeIdx(4));
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("is not a child of"));
    assert_eq!(tree, before);
}

#[test]
fn contract_unlabelled_child() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let contraction = tree.contract(NodeIdx(0), NodeIdx(1)).unwrap();
    assert_eq!(contraction.parent(), NodeIdx(0));
    assert_eq!(tree.to_newick(), "(C,A,B);");
    assert_eq!(tree.size(), 4);
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.parent(NodeIdx(2)), Some(NodeIdx(0)));

    tree.uncontract(contraction);
    assert_eq!(tree, before);
}

#[test]
fn contract_labelled_child_moves_label() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let contraction = tree.contract(NodeIdx(1), NodeIdx(2)).unwrap();
    assert_eq!(tree.to_newick(), "((B)A,C);");
    assert!(tree.node(NodeIdx(1)).labelled);
    assert_eq!(tree.labelled_count(), 3);

    tree.uncontract(contraction);
    assert_eq!(tree, before);
}

#[test]
fn contract_keeps_grandchildren_order() {
    let mut tree = tree!("((A,(B,C,D)),E);");
    let before = tree.clone();
    let contraction = tree.contract(NodeIdx(1), NodeIdx(3)).unwrap();
    assert_eq!(tree.to_newick(), "((A,B,C,D),E);");
    tree.uncontract(contraction);
    assert_eq!(tree, before);
}

#[rstest]
#[case::both_labelled("((B)A,C);", 1, 2, "labelled nodes")]
#[case::not_adjacent("((A,B),C);", 0, 2, "not adjacent")]
fn contract_invalid_edge(
    #[case] newick: &str,
    #[case] parent: usize,
    #[case] child: usize,
    #[case] error: &str,
) {
    let mut tree = tree!(newick);
    let before = tree.clone();
    let res = tree.contract(NodeIdx(parent), NodeIdx(child));
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains(error));
    assert_eq!(tree, before);
}

#[test]
fn relabel_and_restore() {
    let mut tree = tree!("((A,B),C);");
    let before = tree.clone();
    let relabel = tree.relabel(NodeIdx(1), &Species::new("D", b""));
    assert_eq!(tree.to_newick(), "((A,B)D,C);");
    assert_eq!(tree.labelled_count(), 4);
    tree.restore_label(relabel);
    assert_eq!(tree, before);
}

#[test]
fn clone_subtree_is_independent() {
    let tree = tree!("((A,B)X,C);");
    let mut subtree = tree.clone_subtree(NodeIdx(1));
    assert_eq!(subtree.to_newick(), "(A,B)X;");
    assert_eq!(subtree.size(), 3);
    assert_eq!(subtree.parent(subtree.root()), None);

    let new = subtree.add_node(Node::new_unlabelled(0));
    subtree.link(subtree.root(), new);
    assert_eq!(subtree.size(), 4);
    assert_eq!(tree.size(), 5);
}

#[test]
fn compacted_drops_detached_nodes() {
    let mut tree = tree!("((A,B),C);");
    tree.contract(NodeIdx(0), NodeIdx(1)).unwrap();
    let compact = tree.compacted();
    assert_eq!(compact.len(), 4);
    assert_eq!(compact.size(), 4);
    assert_eq!(compact.to_newick(), "(C,A,B);");
    for (i, idx) in compact.preorder().into_iter().enumerate() {
        assert_eq!(idx, NodeIdx(i));
    }
}

#[test]
fn traversal_orders() {
    let tree = tree!("((A,B),C);");
    let preorder = tree.preorder();
    assert_eq!(preorder, (0..5).map(NodeIdx).collect::<Vec<_>>());
    let postorder = tree.postorder();
    assert_eq!(
        postorder,
        vec![NodeIdx(2), NodeIdx(3), NodeIdx(1), NodeIdx(4), NodeIdx(0)]
    );
}

#[test]
fn leaves_and_labels() {
    let tree = tree!("((A,B)X,C);");
    let leaves = tree
        .leaves()
        .into_iter()
        .map(|idx| tree.node(idx).id.clone())
        .collect::<Vec<_>>();
    assert_eq!(leaves, vec!["A", "B", "C"]);
    assert_eq!(tree.labels(), vec!["X", "A", "B", "C"]);
    assert_eq!(tree.labelled_count(), 4);
}

#[rstest]
#[case::binary("((A,B),C);")]
#[case::labelled_internal("(A,B,(C,D)E)F;")]
#[case::multifurcations("((A,B,C)D,(E)F,G,(H,I,J,K));")]
#[case::branch_length("((A:1.5,B),C:0.25);")]
#[case::single_node("A;")]
fn newick_round_trip(#[case] newick: &str) {
    let tree = tree!(newick);
    assert_eq!(tree.to_newick(), newick);
    assert_eq!(tree!(&tree.to_newick()), tree);
}

#[test]
fn newick_whitespace_and_several_trees() {
    let trees = from_newick(" ( A , B ) ;\n(C,D)E;\n").unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].to_newick(), "(A,B);");
    assert_eq!(trees[1].to_newick(), "(C,D)E;");
}

#[test]
fn newick_annotations() {
    let newick = "((A[AC],B[AG])[A{CG}],C[TT])[{AT}T];";
    let tree = tree!(newick);
    assert_eq!(tree.chars(), 2);
    assert_eq!(tree.node(NodeIdx(1)).states.to_string(), "A{CG}");
    assert!(!tree.node(NodeIdx(1)).labelled);
    let states = (0..tree.len())
        .map(|i| tree.node(NodeIdx(i)).states.clone())
        .collect::<Vec<_>>();
    assert_eq!(tree.to_annotated_newick(&states), newick);
}

#[test]
fn newick_partial_annotations_are_padded() {
    let tree = tree!("(A[AC],B);");
    assert_eq!(tree.chars(), 2);
    assert_eq!(tree.node(NodeIdx(2)).states, CharacterList::new(2));
}

#[rstest]
#[case::unbalanced("((A,B);", "Malformed newick")]
#[case::no_terminator("(A,B)", "Malformed newick")]
#[case::empty("", "No trees found")]
#[case::inconsistent_annotation("(A[AC],B[A]);", "Inconsistent")]
fn newick_errors(#[case] newick: &str, #[case] error: &str) {
    let res = from_newick(newick);
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains(error));
}
