use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use assert_matches::assert_matches;
use rstest::*;
use tempfile::tempdir;

use crate::io::{
    read_newick_from_file, read_species, read_weights, write_newick_to_file, DataError,
};
use crate::tree;

#[rstest]
#[case::lines("./data/species_small.txt")]
#[case::fasta("./data/species_small.fasta")]
fn reading_species(#[case] path: &str) {
    let species = read_species(&PathBuf::from(path)).unwrap();
    assert_eq!(species.len(), 4);
    let lines = species.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(lines, vec!["A:AA", "B:AC", "C:GC", "D:GC"]);
}

#[test]
fn reading_reference_species() {
    let species = read_species(&PathBuf::from("./data/reference_species.txt")).unwrap();
    assert_eq!(species.len(), 26);
    assert_eq!(species[25].id, "Z");
    assert!(species.iter().all(|s| s.chars() == 30));
}

#[rstest]
#[case::malformed("./data/species_malformed.txt", "Malformed species on line 2")]
#[case::ragged("./data/species_ragged.txt", "Species B has 3 characters, expected 2")]
#[case::duplicate("./data/species_duplicate.txt", "Duplicate species label A")]
#[case::empty("./data/species_empty.txt", "No species found")]
fn reading_incorrect_species(#[case] path: &str, #[case] error: &str) {
    let res = read_species(&PathBuf::from(path));
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains(error));
}

#[test]
fn reading_nonexistent_species() {
    assert!(read_species(&PathBuf::from("./data/species_nonexistent.txt")).is_err());
}

#[test]
fn species_errors_are_data_errors() {
    let err = read_species(&PathBuf::from("./data/species_malformed.txt")).unwrap_err();
    assert_matches!(err.downcast_ref::<DataError>(), Some(_));
}

#[test]
fn reading_weights_with_header() {
    let (alphabet, weights) =
        read_weights(&PathBuf::from("./data/weights_transitions.txt")).unwrap();
    assert_eq!(alphabet.symbols(), b"AGTC");
    assert_eq!(weights.nrows(), 4);
    assert_eq!(weights[(0, 1)], 1.0);
    assert_eq!(weights[(2, 3)], 1.0);
    assert_eq!(weights[(1, 3)], 2.5);
}

#[test]
fn reading_weights_default_alphabet() {
    let (alphabet, weights) = read_weights(&PathBuf::from("./data/weights_uneven.txt")).unwrap();
    assert_eq!(alphabet.symbols(), b"AGTC");
    assert_eq!(weights[(0, 3)], 9.0);
    assert_eq!(weights[(3, 0)], 9.0);
}

#[test]
fn reading_weights_custom_alphabet() {
    let (alphabet, weights) = read_weights(&PathBuf::from("./data/weights_binary.txt")).unwrap();
    assert_eq!(alphabet.symbols(), b"XY");
    assert_eq!(weights[(0, 1)], 2.0);
    assert_eq!(weights[(1, 0)], 3.0);
}

#[rstest]
#[case::not_square("./data/weights_not_square.txt", "4x4 matrix")]
#[case::negative("./data/weights_negative.txt", "non-negative")]
fn reading_incorrect_weights(#[case] path: &str, #[case] error: &str) {
    let res = read_weights(&PathBuf::from(path));
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains(error));
}

#[test]
fn reading_weights_with_invalid_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weights.txt");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "A G T C").unwrap();
    writeln!(file, "0 1 1 1").unwrap();
    writeln!(file, "1 0 one 1").unwrap();
    writeln!(file, "1 1 0 1").unwrap();
    writeln!(file, "1 1 1 0").unwrap();
    let res = read_weights(&path);
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("Invalid number"));
}

#[test]
fn reading_newick() {
    let trees = read_newick_from_file(&PathBuf::from("./data/tree.newick")).unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].to_newick(), "((A,B),C,D);");
    assert_eq!(trees[1].to_newick(), "(((B,C),D))A;");
}

#[test]
fn reading_malformed_newick() {
    let res = read_newick_from_file(&PathBuf::from("./data/tree_malformed.newick"));
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("Malformed newick"));
}

#[test]
fn writing_newick() {
    let trees = vec![tree!("((A,B),C);"), tree!("(B,C)A;")];
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.newick");
    write_newick_to_file(&trees, &path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "((A,B),C);\n(B,C)A;\n");
    assert_eq!(read_newick_from_file(&path).unwrap(), trees);
}

#[test]
fn writing_newick_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.newick");
    File::create(&path).unwrap();
    let res = write_newick_to_file(&[tree!("(A,B);")], &path);
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains("already exists"));
}
