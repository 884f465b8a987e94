use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::bail;
use bio::io::fasta::Reader;
use log::{info, warn};

use crate::alphabets::{dna_alphabet, Alphabet};
use crate::parsimony::CostMatrix;
use crate::species::{validate, Species};
use crate::tree::{tree_parser, Tree};
use crate::Result;

pub(crate) struct DataError {
    pub(crate) message: String,
}
impl fmt::Debug for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl Error for DataError {}

/// Reads species from a file, one `label:STATES` line per species, or from a fasta file
/// when the extension is `.fa` or `.fasta`. States are converted to uppercase, blank lines
/// and lines starting with `#` are skipped.
///
/// # Example
/// ```
/// use mptrees::io::read_species;
/// use std::path::PathBuf;
/// let species = read_species(&PathBuf::from("./data/reference_species.txt")).unwrap();
/// # assert_eq!(species.len(), 26);
/// # assert_eq!(species[0].id, "A");
/// # assert!(species.iter().all(|s| s.chars() == 30));
/// ```
pub fn read_species(path: &Path) -> Result<Vec<Species>> {
    info!("Reading species from file {}", path.display());
    let is_fasta = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "fa" | "fasta"));
    let species = if is_fasta {
        read_fasta_species(path)?
    } else {
        read_species_lines(&fs::read_to_string(path)?)?
    };
    if species.is_empty() {
        bail!(DataError {
            message: String::from("No species found in file")
        });
    }
    let chars = validate(&species)?;
    info!("Read {} species with {} characters", species.len(), chars);
    Ok(species)
}

fn read_species_lines(content: &str) -> Result<Vec<Species>> {
    let mut species = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((id, states)) = line.split_once(':') else {
            bail!(DataError {
                message: format!("Malformed species on line {}, expected label:STATES", number + 1)
            });
        };
        let states = states.trim().to_ascii_uppercase();
        if states.chars().any(char::is_whitespace) {
            bail!(DataError {
                message: format!("Whitespace in the states of species {} on line {}", id.trim(), number + 1)
            });
        }
        species.push(Species::new(id.trim(), states.as_bytes()));
    }
    Ok(species)
}

fn read_fasta_species(path: &Path) -> Result<Vec<Species>> {
    let reader = Reader::from_file(path)?;
    let mut species = Vec::new();
    for result in reader.records() {
        let rec = result?;
        if let Err(e) = rec.check() {
            bail!(DataError {
                message: e.to_string()
            });
        }
        species.push(Species::new(rec.id(), &rec.seq().to_ascii_uppercase()));
    }
    Ok(species)
}

/// Reads a state-to-state cost matrix. An optional first line lists the state symbols in
/// the order of the rows and columns, otherwise the DNA order `A G T C` is used.
///
/// # Example
/// ```
/// use mptrees::io::read_weights;
/// use std::path::PathBuf;
/// let (alphabet, weights) = read_weights(&PathBuf::from("./data/weights_transitions.txt")).unwrap();
/// # assert_eq!(alphabet.symbols(), b"AGTC");
/// # assert_eq!(weights[(0, 2)], 2.5);
/// ```
pub fn read_weights(path: &Path) -> Result<(Alphabet, CostMatrix)> {
    info!("Reading weights from file {}", path.display());
    let content = fs::read_to_string(path)?;
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .peekable();

    let header = lines.peek().and_then(|line| {
        let is_numeric = line.split_whitespace().all(|t| t.parse::<f64>().is_ok());
        (!is_numeric).then(|| line.split_whitespace().collect::<String>())
    });
    let alphabet = match header {
        Some(symbols) => {
            lines.next();
            Alphabet::new(symbols.as_bytes())?
        }
        None => dna_alphabet().clone(),
    };

    let mut rows = Vec::new();
    for line in lines {
        let row = line
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>();
        let Ok(row) = row else {
            bail!(DataError {
                message: format!("Invalid number in weights row \"{line}\"")
            });
        };
        rows.push(row);
    }

    let n = alphabet.len();
    if rows.len() != n || rows.iter().any(|r| r.len() != n) {
        bail!(DataError {
            message: format!("Weights must be a {n}x{n} matrix for the {alphabet}")
        });
    }
    if rows.iter().flatten().any(|&w| w < 0.0 || !w.is_finite()) {
        bail!(DataError {
            message: String::from("Weights must be finite and non-negative")
        });
    }
    let weights = CostMatrix::from_row_iterator(n, n, rows.into_iter().flatten());
    if weights != weights.transpose() {
        warn!("Weights are not symmetric, costs depend on the direction of change");
    }
    info!("Read {n}x{n} weights for the {alphabet}");
    Ok((alphabet, weights))
}

/// Reads newick trees from a file, returning a vector of trees.
///
/// # Example
/// ```
/// use mptrees::io::read_newick_from_file;
/// use std::path::PathBuf;
/// let trees = read_newick_from_file(&PathBuf::from("./data/tree.newick")).unwrap();
/// # assert_eq!(trees.len(), 2);
/// # assert_eq!(trees[0].leaves().len(), 4);
/// ```
pub fn read_newick_from_file(path: &Path) -> Result<Vec<Tree>> {
    info!("Reading newick trees from file {}", path.display());
    let newick = fs::read_to_string(path)?;
    let trees = tree_parser::from_newick(&newick)?;
    info!("Read {} trees successfully", trees.len());
    Ok(trees)
}

/// Writes newick trees to the given file path, one per line. Will return an error if the
/// file already exists.
pub fn write_newick_to_file(trees: &[Tree], path: &Path) -> Result<()> {
    info!("Writing newick trees to file {}", path.display());
    if path.exists() {
        bail!(DataError {
            message: String::from("File already exists")
        });
    }
    let mut writer = File::create(path)?;
    for tree in trees {
        writer.write_all(tree.to_newick().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    info!("Finished writing successfully");
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests;
