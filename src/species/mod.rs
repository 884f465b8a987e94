use std::fmt::Display;

use anyhow::bail;
use hashbrown::{HashMap, HashSet};
use log::{info, warn};

use crate::alphabets::{CharacterList, ParsimonySet};
use crate::tree::Tree;
use crate::Result;

/// An observed taxon: a label and one state per character.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: String,
    pub states: CharacterList,
}

impl Species {
    pub fn new(id: &str, states: &[u8]) -> Self {
        Self {
            id: id.to_string(),
            states: CharacterList::from_states(states),
        }
    }

    pub fn chars(&self) -> usize {
        self.states.len()
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.states)
    }
}

/// Checks that there is at least one species, that labels are unique and that every
/// species has the same number of characters, which is returned.
pub fn validate(species: &[Species]) -> Result<usize> {
    let Some(first) = species.first() else {
        bail!("No species given, at least one leaf is required");
    };
    let chars = first.chars();
    let mut seen = HashSet::with_capacity(species.len());
    for s in species {
        if s.id.is_empty() {
            bail!("Species with an empty label found");
        }
        if !seen.insert(s.id.as_str()) {
            bail!("Duplicate species label {}", s.id);
        }
        if s.chars() != chars {
            bail!(
                "Species {} has {} characters, expected {}",
                s.id,
                s.chars(),
                chars
            );
        }
    }
    Ok(chars)
}

/// Removes characters whose state is identical across all species, since they cannot
/// change the score of any tree. Returns the number of characters removed.
pub fn remove_uninformative(species: &mut [Species]) -> Result<usize> {
    let chars = validate(species)?;
    let keep: Vec<usize> = (0..chars)
        .filter(|&i| species.iter().any(|s| s.states[i] != species[0].states[i]))
        .collect();
    let removed = chars - keep.len();
    if removed > 0 {
        for s in species.iter_mut() {
            s.states.retain_characters(&keep);
        }
        info!("Removed {removed} uninformative characters, {} left", keep.len());
    }
    if keep.is_empty() {
        warn!("All characters are uninformative, every tree has score zero");
    }
    Ok(removed)
}

/// Per character, the set of every state observed across the species.
///
/// # Example
/// ```
/// use mptrees::species::{world_set, Species};
/// let species = vec![Species::new("A", b"AC"), Species::new("B", b"GC")];
/// let world = world_set(&species).unwrap();
/// assert_eq!(world[0].len(), 2);
/// assert_eq!(world[1].len(), 1);
/// ```
pub fn world_set(species: &[Species]) -> Result<CharacterList> {
    let chars = validate(species)?;
    Ok((0..chars)
        .map(|i| {
            species
                .iter()
                .fold(ParsimonySet::new(), |acc, s| &acc | &s.states[i])
        })
        .collect())
}

/// Assigns the states of `species` to the labelled nodes of `tree` by label. Unlabelled
/// nodes get empty state sets of the right length.
pub fn fill_states(tree: &mut Tree, species: &[Species]) -> Result<()> {
    let chars = validate(species)?;
    let by_id: HashMap<&str, &Species> = species.iter().map(|s| (s.id.as_str(), s)).collect();
    tree.set_chars(chars);
    for idx in tree.preorder() {
        let node = tree.node_mut(idx);
        if node.labelled {
            let Some(s) = by_id.get(node.id.as_str()) else {
                bail!("No species data for tree label {}", node.id);
            };
            node.states = s.states.clone();
        } else if node.is_leaf() {
            bail!("Found an unlabelled leaf, every leaf must be a species");
        } else {
            node.states = CharacterList::new(chars);
        }
    }
    Ok(())
}
