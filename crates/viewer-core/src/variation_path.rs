//! Branch choices that select the visible line through a game tree.

use std::fmt;

/// A sequence of branch indices, one per branching decision below the first move.
///
/// Entry `k` picks which variation to follow from the node at ply `k + 1`.
/// The first move is always the mainline move of the root. Entries that
/// exceed the number of variations at their node fall back to the mainline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VariationPath(Vec<usize>);

impl VariationPath {
    /// Creates an empty path, which selects the mainline everywhere.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Branch choice for the node at ply `k + 1`, if the path reaches that far.
    pub fn get(&self, k: usize) -> Option<usize> {
        self.0.get(k).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for VariationPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl FromIterator<usize> for VariationPath {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VariationPath {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for VariationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}
