use std::fmt::Display;
use std::ops::{BitAnd, BitOr, BitXor, Deref, DerefMut, Sub};

use hashbrown::{hash_set::IntoIter, hash_set::Iter, HashSet};
use itertools::join;

/// Set of candidate states of one character at one node.
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ParsimonySet {
    pub s: HashSet<u8>,
}

impl ParsimonySet {
    pub fn new() -> Self {
        Self { s: HashSet::new() }
    }

    pub fn single(state: u8) -> Self {
        ParsimonySet::from_iter([state])
    }

    pub fn from_slice(states: &[u8]) -> Self {
        ParsimonySet::from_iter(states.iter().copied())
    }

    /// States in ascending order, used wherever output has to be deterministic.
    pub fn sorted(&self) -> Vec<u8> {
        let mut states: Vec<u8> = self.s.iter().copied().collect();
        states.sort_unstable();
        states
    }
}

impl std::iter::FromIterator<u8> for ParsimonySet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        ParsimonySet {
            s: HashSet::from_iter(iter),
        }
    }
}

impl Deref for ParsimonySet {
    type Target = HashSet<u8>;

    fn deref(&self) -> &Self::Target {
        &self.s
    }
}

impl DerefMut for ParsimonySet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.s
    }
}

impl Display for ParsimonySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chars: Vec<char> = self.sorted().into_iter().map(char::from).collect();
        write!(f, "[{}]", join(chars.iter(), " "))
    }
}

impl<'a> IntoIterator for &'a ParsimonySet {
    type Item = &'a u8;
    type IntoIter = Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.s.iter()
    }
}

impl IntoIterator for ParsimonySet {
    type Item = u8;
    type IntoIter = IntoIter<u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.s.into_iter()
    }
}

impl BitAnd for &ParsimonySet {
    type Output = ParsimonySet;

    fn bitand(self, rhs: Self) -> Self::Output {
        ParsimonySet {
            s: self.s.intersection(&rhs.s).copied().collect(),
        }
    }
}

impl BitOr for &ParsimonySet {
    type Output = ParsimonySet;

    fn bitor(self, rhs: Self) -> Self::Output {
        ParsimonySet {
            s: self.s.union(&rhs.s).copied().collect(),
        }
    }
}

impl Sub for &ParsimonySet {
    type Output = ParsimonySet;

    fn sub(self, rhs: Self) -> Self::Output {
        ParsimonySet {
            s: self.s.difference(&rhs.s).copied().collect(),
        }
    }
}

impl BitXor for &ParsimonySet {
    type Output = ParsimonySet;

    fn bitxor(self, rhs: Self) -> Self::Output {
        ParsimonySet {
            s: self.s.symmetric_difference(&rhs.s).copied().collect(),
        }
    }
}
