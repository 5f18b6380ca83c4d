//! Alphabet-coded symbol sequences and their homology score.

use std::fmt;

use crate::alphabet::{Alphabet, Symbol};

/// An ordered list of [`Symbol`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence {
    symbols: Vec<Symbol>,
}

impl Sequence {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Sequence { symbols }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Sequence {
            symbols: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn first(&self) -> Option<Symbol> {
        self.symbols.first().copied()
    }

    pub fn last(&self) -> Option<Symbol> {
        self.symbols.last().copied()
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    /// Copy of `len` symbols starting at `start`.
    ///
    /// Panics when the range runs past the end, like slice indexing.
    pub fn subsequence(&self, start: usize, len: usize) -> Sequence {
        Sequence::new(self.symbols[start..start + len].to_vec())
    }

    /// New sequence holding `self` followed by `other`.
    pub fn concat(&self, other: &Sequence) -> Sequence {
        let mut symbols = Vec::with_capacity(self.len() + other.len());
        symbols.extend_from_slice(&self.symbols);
        symbols.extend_from_slice(&other.symbols);
        Sequence::new(symbols)
    }

    pub fn reversed(&self) -> Sequence {
        self.symbols.iter().rev().copied().collect()
    }

    /// Homology score against another sequence; see [`similarity`].
    pub fn similarity(&self, other: &Sequence, alphabet: &Alphabet) -> i32 {
        similarity(&self.symbols, &other.symbols, alphabet)
    }

    /// Render the sequence back to text.
    pub fn display<'a>(&'a self, alphabet: &'a Alphabet) -> SequenceDisplay<'a> {
        SequenceDisplay {
            sequence: self,
            alphabet,
        }
    }
}

impl FromIterator<Symbol> for Sequence {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Sequence::new(iter.into_iter().collect())
    }
}

impl Extend<Symbol> for Sequence {
    fn extend<I: IntoIterator<Item = Symbol>>(&mut self, iter: I) {
        self.symbols.extend(iter);
    }
}

impl AsRef<[Symbol]> for Sequence {
    fn as_ref(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// Sum of per-position symbol scores between two equal-length sequences.
///
/// Sequences of different length have no defined similarity and score 0.
pub fn similarity(left: &[Symbol], right: &[Symbol], alphabet: &Alphabet) -> i32 {
    if left.len() != right.len() {
        log::trace!(
            "similarity requested for unequal lengths {} and {}; scoring 0",
            left.len(),
            right.len()
        );
        return 0;
    }
    left.iter()
        .zip(right)
        .map(|(&a, &b)| alphabet.score(a, b))
        .sum()
}

/// [`fmt::Display`] adapter returned by [`Sequence::display`].
pub struct SequenceDisplay<'a> {
    sequence: &'a Sequence,
    alphabet: &'a Alphabet,
}

impl fmt::Display for SequenceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &symbol in self.sequence.as_slice() {
            write!(f, "{}", self.alphabet.char_of(symbol))?;
        }
        Ok(())
    }
}
