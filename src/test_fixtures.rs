use crate::species::{remove_uninformative, Species};

/// 26 reference species with 30 DNA characters each.
pub(crate) const REFERENCE_SPECIES: [&str; 26] = [
    "A:GAGGACCCCAGATATTACGCGGGTCGAACA",
    "B:GAAGATCCCAGATACTTTGCCGGAGAACAA",
    "C:GAGGATCCGCGTTACTTTAGCGGTATTCAA",
    "D:GAGGACCCCCGTTACTTTGCCGGCGAGGCC",
    "E:GAGGATCCCAGATATTTTGCGGGTGAGGCT",
    "F:GAAGACCCGCGCTACTTTGCCGGCACCGGC",
    "G:GAAGATCCCAGACGTTTCTTCGCAGGAGAA",
    "H:GAAGATCCACGCTACTATGCAGGACCTCAA",
    "I:GAAGACCCTCGCTATTACGCCGGTCCGCAA",
    "J:GAGGACCCACGATATTACGCGGGAGAAGGA",
    "K:GAGGATCCGCGCTACTTTGCCGGCCCGCAG",
    "L:GAAGACCCGCGATATTTTGCCGGAGAATCA",
    "M:GAAGATCCTCGATATTTTGCCGGTCCGCAA",
    "N:GAGGACCCGCGCTACTTTGCCGGCGAGGCC",
    "O:GAAGACCCGCGTTATTTTGCCGGTACCAGC",
    "P:GAGGACCCGAGAATGTTCGCTGGCGTTGCC",
    "Q:GAGGATCCTAGGTTTTATGCGGGCGAGGGC",
    "R:GAAGACCCACGTTATTTCGCCGGCACCAGC",
    "S:GAGGACCCCAGATATTTTGCGGGTGAGGCT",
    "T:GAAGACCCGCGTTACTATGCGGGCACAGAT",
    "U:GAGGACCCGCGTTACTATGCGGGCACAGAC",
    "V:GAAGACCCGCGTTACTATGCGGGCACAGAT",
    "W:GAAGACCCGCGCTACTTTGCCGGCACCGGC",
    "X:AAGGACCCTTGTTATATTTCCGGCCCGCGT",
    "Y:GAGGACCCGCGCTACTTCGCGGGCGAAGGA",
    "Z:GAGGACCCGCGTTACTATGCGGGCACAGAT",
];

/// The first `n` reference species, with uninformative characters removed if `informative`.
pub(crate) fn reference_species(n: usize, informative: bool) -> Vec<Species> {
    let mut species = REFERENCE_SPECIES[..n]
        .iter()
        .map(|line| {
            let (id, states) = line.split_once(':').unwrap();
            Species::new(id, states.as_bytes())
        })
        .collect::<Vec<_>>();
    if informative {
        remove_uninformative(&mut species).unwrap();
    }
    species
}
