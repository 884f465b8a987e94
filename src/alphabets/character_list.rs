use std::fmt::Display;
use std::ops::{Deref, DerefMut};

use crate::alphabets::ParsimonySet;

/// Per-character state sets of one node. The length is fixed at creation: elements are
/// mutated in place through `DerefMut` to a slice, which cannot grow or shrink.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct CharacterList(Vec<ParsimonySet>);

impl CharacterList {
    /// Creates a list of `chars` empty sets.
    pub fn new(chars: usize) -> Self {
        Self(vec![ParsimonySet::new(); chars])
    }

    /// Creates a list with one singleton set per observed state.
    ///
    /// # Example
    /// ```
    /// use mptrees::alphabets::CharacterList;
    /// let states = CharacterList::from_states(b"ACG");
    /// assert_eq!(states.len(), 3);
    /// assert!(states[1].contains(&b'C'));
    /// assert_eq!(states.to_string(), "ACG");
    /// ```
    pub fn from_states(states: &[u8]) -> Self {
        Self(states.iter().map(|&s| ParsimonySet::single(s)).collect())
    }

    /// Removes the characters whose index is not in `keep`, preserving order.
    pub(crate) fn retain_characters(&mut self, keep: &[usize]) {
        self.0 = keep.iter().map(|&i| self.0[i].clone()).collect();
    }
}

impl FromIterator<ParsimonySet> for CharacterList {
    fn from_iter<I: IntoIterator<Item = ParsimonySet>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Deref for CharacterList {
    type Target = [ParsimonySet];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CharacterList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Writes a single state as the symbol itself and anything else as `{...}`.
impl Display for CharacterList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for set in self.0.iter() {
            let states = set.sorted();
            if states.len() == 1 {
                write!(f, "{}", char::from(states[0]))?;
            } else {
                write!(f, "{{")?;
                for s in states {
                    write!(f, "{}", char::from(s))?;
                }
                write!(f, "}}")?;
            }
        }
        Ok(())
    }
}
