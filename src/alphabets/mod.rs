use std::fmt::Display;

use anyhow::bail;
use itertools::join;
use lazy_static::lazy_static;

use crate::Result;

mod character_list;
pub use character_list::*;
mod parsimony_set;
pub use parsimony_set::*;

/// Nucleotides in the order used by the rows and columns of DNA weight matrices.
pub static DNA_BASES: &[u8] = b"AGTC";

/// Ordered set of state symbols, maps a symbol to its row/column in a cost matrix.
#[derive(Debug, PartialEq, Clone)]
pub struct Alphabet {
    symbols: Vec<u8>,
    index: Vec<Option<usize>>,
}

lazy_static! {
    static ref DNA_ALPHABET: Alphabet = Alphabet {
        symbols: DNA_BASES.to_vec(),
        index: symbol_index(DNA_BASES),
    };
}

fn symbol_index(symbols: &[u8]) -> Vec<Option<usize>> {
    let mut index = vec![None; 256];
    for (i, &symbol) in symbols.iter().enumerate() {
        index[symbol as usize] = Some(i);
        index[symbol.to_ascii_lowercase() as usize] = Some(i);
    }
    index
}

pub fn dna_alphabet() -> &'static Alphabet {
    &DNA_ALPHABET
}

impl Alphabet {
    /// Builds an alphabet from upper-case symbols, failing on duplicates or an empty list.
    ///
    /// # Example
    /// ```
    /// use mptrees::alphabets::Alphabet;
    /// let alphabet = Alphabet::new(b"01").unwrap();
    /// assert_eq!(alphabet.len(), 2);
    /// assert_eq!(alphabet.index(b'1'), Some(1));
    /// assert!(Alphabet::new(b"00").is_err());
    /// ```
    pub fn new(symbols: &[u8]) -> Result<Self> {
        if symbols.is_empty() {
            bail!("Alphabet must contain at least one symbol");
        }
        let symbols = symbols.to_ascii_uppercase();
        for (i, s) in symbols.iter().enumerate() {
            if symbols[..i].contains(s) {
                bail!("Duplicate symbol {} in alphabet", char::from(*s));
            }
        }
        Ok(Self {
            index: symbol_index(&symbols),
            symbols,
        })
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn symbol(&self, index: usize) -> u8 {
        self.symbols[index]
    }

    pub fn index(&self, symbol: u8) -> Option<usize> {
        self.index[symbol as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_word(&self, word: &[u8]) -> bool {
        word.iter().all(|&c| self.index(c).is_some())
    }
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "alphabet [{}]",
            join(self.symbols.iter().map(|&s| char::from(s)), " ")
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
