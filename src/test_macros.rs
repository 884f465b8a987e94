#[macro_export]
macro_rules! tree {
    ($e:expr) => {{
        use $crate::tree::tree_parser::from_newick;
        from_newick($e).unwrap().pop().unwrap()
    }};
}

#[macro_export]
macro_rules! species {
    ($($id:expr => $states:expr),* $(,)?) => {{
        use $crate::species::Species;
        vec![$(Species::new($id, $states)),*]
    }};
}

/// Parses a tree and fills its labelled nodes with the states of the given species.
#[macro_export]
macro_rules! filled_tree {
    ($newick:expr, $species:expr) => {{
        use $crate::species::fill_states;
        let mut tree = $crate::tree!($newick);
        fill_states(&mut tree, &$species).unwrap();
        tree
    }};
}
