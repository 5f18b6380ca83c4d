//! Symbol alphabets and the integer scoring matrices that define homology.
//!
//! An [`Alphabet`] is built once per assembly run and shared read-only by
//! every phase. Symbols are small copyable codes into its ordered symbol
//! list; the scoring matrix is indexed by those codes and need not be
//! symmetric.

use std::collections::HashMap;
use std::fmt;

use crate::sequence::Sequence;

/// Errors raised while building an alphabet or decoding text into it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("alphabet has no symbols")]
    Empty,
    #[error("alphabet has {0} symbols, at most 256 are supported")]
    TooManySymbols(usize),
    #[error("symbol '{0}' appears more than once")]
    DuplicateSymbol(char),
    #[error("scoring matrix has {found} rows, expected {expected}")]
    MatrixRows { expected: usize, found: usize },
    #[error("scoring matrix row {row} has {found} entries, expected {expected}")]
    MatrixShape {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid score '{token}' on line {line}")]
    InvalidScore { token: String, line: usize },
    #[error("malformed score table on line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },
    #[error("symbol '{symbol}' at position {position} is not in the alphabet")]
    UnknownSymbol { symbol: char, position: usize },
}

/// A single alphabet-coded symbol.
///
/// Only meaningful together with the [`Alphabet`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
    pub(crate) fn new(code: u8) -> Self {
        Symbol(code)
    }

    /// Index of this symbol in its alphabet's ordered symbol list.
    #[inline]
    pub fn code(self) -> usize {
        self.0 as usize
    }
}

/// Ordered list of distinct symbols plus a square scoring matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
    index: HashMap<char, Symbol>,
    /// Row-major `len * len` matrix, `scores[a * len + b]`.
    scores: Vec<i32>,
}

/// The twenty standard amino acids, in one-letter code.
pub const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

impl Alphabet {
    /// Build an alphabet from its symbols and a row-per-symbol scoring matrix.
    pub fn new(symbols: &[char], matrix: Vec<Vec<i32>>) -> Result<Self, AlphabetError> {
        let index = build_index(symbols)?;
        let n = symbols.len();
        if matrix.len() != n {
            return Err(AlphabetError::MatrixRows {
                expected: n,
                found: matrix.len(),
            });
        }

        let mut scores = Vec::with_capacity(n * n);
        for (row, values) in matrix.into_iter().enumerate() {
            if values.len() != n {
                return Err(AlphabetError::MatrixShape {
                    row,
                    expected: n,
                    found: values.len(),
                });
            }
            scores.extend(values);
        }

        Ok(Alphabet {
            symbols: symbols.to_vec(),
            index,
            scores,
        })
    }

    /// Alphabet whose matrix scores `matching` on the diagonal and
    /// `mismatching` everywhere else.
    pub fn identity(symbols: &str, matching: i32, mismatching: i32) -> Result<Self, AlphabetError> {
        let symbols: Vec<char> = symbols.chars().collect();
        let n = symbols.len();
        let matrix = (0..n)
            .map(|row| {
                (0..n)
                    .map(|col| if row == col { matching } else { mismatching })
                    .collect()
            })
            .collect();
        Alphabet::new(&symbols, matrix)
    }

    /// Parse a score table.
    ///
    /// The first non-empty, non-`#` line lists the symbols. Every following
    /// line starts with a symbol and holds that symbol's row of scores, in
    /// header order. Fields are separated by whitespace and/or commas. Rows
    /// may come in any order but each header symbol needs exactly one.
    pub fn from_table(text: &str) -> Result<Self, AlphabetError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (header_line, header) = lines.next().ok_or(AlphabetError::Empty)?;
        let mut symbols = Vec::new();
        for token in fields(header) {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => symbols.push(c),
                _ => {
                    return Err(AlphabetError::MalformedTable {
                        line: header_line,
                        reason: format!("header field '{token}' is not a single symbol"),
                    })
                }
            }
        }
        let index = build_index(&symbols)?;
        let n = symbols.len();

        let mut rows: Vec<Option<Vec<i32>>> = vec![None; n];
        for (line_no, line) in lines {
            let mut tokens = fields(line);
            let label = tokens.next().unwrap_or_default();
            let mut label_chars = label.chars();
            let symbol = match (label_chars.next(), label_chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(AlphabetError::MalformedTable {
                        line: line_no,
                        reason: format!("row label '{label}' is not a single symbol"),
                    })
                }
            };
            let row = index
                .get(&symbol)
                .map(|s| s.code())
                .ok_or_else(|| AlphabetError::MalformedTable {
                    line: line_no,
                    reason: format!("row label '{symbol}' is not in the header"),
                })?;
            if rows[row].is_some() {
                return Err(AlphabetError::MalformedTable {
                    line: line_no,
                    reason: format!("second row for symbol '{symbol}'"),
                });
            }

            let values = tokens
                .map(|token| {
                    token.parse::<i32>().map_err(|_| AlphabetError::InvalidScore {
                        token: token.to_string(),
                        line: line_no,
                    })
                })
                .collect::<Result<Vec<i32>, _>>()?;
            if values.len() != n {
                return Err(AlphabetError::MatrixShape {
                    row,
                    expected: n,
                    found: values.len(),
                });
            }
            rows[row] = Some(values);
        }

        let found = rows.iter().filter(|r| r.is_some()).count();
        let matrix: Vec<Vec<i32>> = rows.into_iter().flatten().collect();
        if found != n {
            return Err(AlphabetError::MatrixRows { expected: n, found });
        }
        Alphabet::new(&symbols, matrix)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Look up the code of a character, if it belongs to this alphabet.
    pub fn symbol(&self, c: char) -> Option<Symbol> {
        self.index.get(&c).copied()
    }

    /// The character a symbol stands for.
    pub fn char_of(&self, symbol: Symbol) -> char {
        self.symbols[symbol.code()]
    }

    /// Score of aligning `a` against `b`.
    #[inline]
    pub fn score(&self, a: Symbol, b: Symbol) -> i32 {
        self.scores[a.code() * self.symbols.len() + b.code()]
    }

    /// Decode text into a [`Sequence`], failing on the first unknown symbol.
    pub fn decode(&self, text: &str) -> Result<Sequence, AlphabetError> {
        text.chars()
            .enumerate()
            .map(|(position, symbol)| {
                self.symbol(symbol)
                    .ok_or(AlphabetError::UnknownSymbol { symbol, position })
            })
            .collect()
    }
}

impl Default for Alphabet {
    /// The standard amino acids with identity scoring (1 on the diagonal).
    fn default() -> Self {
        let symbols: Vec<char> = AMINO_ACIDS.chars().collect();
        let n = symbols.len();
        let scores = (0..n * n)
            .map(|i| if i / n == i % n { 1 } else { 0 })
            .collect();
        let index = symbols
            .iter()
            .enumerate()
            .map(|(code, &c)| (c, Symbol::new(code as u8)))
            .collect();
        Alphabet {
            symbols,
            index,
            scores,
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "\t{c}")?;
        }
        for (row, c) in self.symbols.iter().enumerate() {
            write!(f, "\n{c}")?;
            let n = self.symbols.len();
            for score in &self.scores[row * n..(row + 1) * n] {
                write!(f, "\t{score}")?;
            }
        }
        Ok(())
    }
}

fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
}

fn build_index(symbols: &[char]) -> Result<HashMap<char, Symbol>, AlphabetError> {
    if symbols.is_empty() {
        return Err(AlphabetError::Empty);
    }
    if symbols.len() > u8::MAX as usize + 1 {
        return Err(AlphabetError::TooManySymbols(symbols.len()));
    }
    let mut index = HashMap::with_capacity(symbols.len());
    for (code, &c) in symbols.iter().enumerate() {
        if index.insert(c, Symbol::new(code as u8)).is_some() {
            return Err(AlphabetError::DuplicateSymbol(c));
        }
    }
    Ok(index)
}
