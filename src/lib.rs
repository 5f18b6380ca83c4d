//! kmer_condense library
//!
//! Builds a de Bruijn graph over similarity-deduplicated (K-1)-mers of
//! short peptide reads and condenses its non-branching paths into contigs:
//! k-mer generation, (K-1)-mer deduplication, edge linking, the condensation
//! walk, and contig edge remapping with overlap trimming.

pub mod alphabet;
pub mod assembler;
pub mod condense;
pub mod config;
pub mod graph;
pub mod kmer;
pub mod sequence;

pub use alphabet::{Alphabet, AlphabetError, Symbol, AMINO_ACIDS};
pub use assembler::{assemble, Assembly, MetaInformation};
pub use condense::{condense, remap_and_trim, walk_paths, CondensedNode};
pub use config::{AssemblyConfig, ConfigurationError, DEFAULT_K};
pub use graph::{DeBruijnGraph, Edge, Node};
pub use kmer::{deduplicate, generate_kmers, split_kmers, Kmer, Representative};
pub use sequence::{similarity, Sequence, SequenceDisplay};
