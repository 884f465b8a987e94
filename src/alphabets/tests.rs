use rstest::*;

use crate::alphabets::{dna_alphabet, Alphabet, CharacterList, ParsimonySet, DNA_BASES};

#[test]
fn parsimony_set_operations() {
    let a = ParsimonySet::from_slice(b"AC");
    let b = ParsimonySet::from_slice(b"CG");
    assert_eq!(&a & &b, ParsimonySet::single(b'C'));
    assert_eq!(&a | &b, ParsimonySet::from_slice(b"ACG"));
    assert_eq!(&a - &b, ParsimonySet::single(b'A'));
    assert_eq!(&a ^ &b, ParsimonySet::from_slice(b"AG"));
    assert!((&a & &ParsimonySet::single(b'T')).is_empty());
}

#[test]
fn parsimony_set_display_is_sorted() {
    let set = ParsimonySet::from_slice(b"TGA");
    assert_eq!(set.to_string(), "[A G T]");
    assert_eq!(set.sorted(), b"AGT".to_vec());
}

#[test]
fn parsimony_set_insert_through_deref() {
    let mut set = ParsimonySet::new();
    set.insert(b'A');
    set.insert(b'A');
    assert_eq!(set.len(), 1);
}

#[test]
fn character_list_fixed_length() {
    let mut chars = CharacterList::new(3);
    assert_eq!(chars.len(), 3);
    chars[2].insert(b'G');
    chars[2].insert(b'C');
    assert_eq!(chars.len(), 3);
    assert_eq!(chars.to_string(), "{}{}{CG}");
}

#[test]
fn character_list_retain() {
    let mut chars = CharacterList::from_states(b"ACGT");
    chars.retain_characters(&[1, 3]);
    assert_eq!(chars, CharacterList::from_states(b"CT"));
}

#[rstest]
#[case::adenine(b'A', 0)]
#[case::guanine(b'G', 1)]
#[case::thymine(b'T', 2)]
#[case::cytosine(b'C', 3)]
#[case::lowercase(b'c', 3)]
fn dna_alphabet_order(#[case] symbol: u8, #[case] index: usize) {
    assert_eq!(dna_alphabet().index(symbol), Some(index));
    assert_eq!(dna_alphabet().symbol(index), symbol.to_ascii_uppercase());
}

#[test]
fn dna_alphabet_rejects_unknown() {
    assert_eq!(dna_alphabet().index(b'N'), None);
    assert!(dna_alphabet().is_word(DNA_BASES));
    assert!(!dna_alphabet().is_word(b"ACGN"));
}

#[rstest]
#[case::empty(b"", "at least one symbol")]
#[case::duplicate(b"ACA", "Duplicate symbol A")]
fn invalid_alphabet(#[case] symbols: &[u8], #[case] error: &str) {
    let res = Alphabet::new(symbols);
    assert!(res.is_err());
    assert!(res.unwrap_err().to_string().contains(error));
}

#[test]
fn custom_alphabet_is_uppercased() {
    let alphabet = Alphabet::new(b"xy").unwrap();
    assert_eq!(alphabet.symbols(), b"XY");
    assert_eq!(alphabet.index(b'x'), Some(0));
    assert_eq!(alphabet.to_string(), "alphabet [X Y]");
}
