use anyhow::Error;

pub mod alphabets;
pub mod contraction;
pub mod enumeration;
pub mod io;
pub mod parsimony;
pub mod species;
pub mod timing;
pub mod tree;

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test_fixtures;
mod test_macros;
