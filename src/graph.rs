//! De Bruijn graph over deduplicated (K-1)-mers.
//!
//! Nodes live in a flat arena and refer to each other by index, so cycles in
//! the graph need no shared ownership. Every observed k-mer links the nodes
//! homologous to its leading (K-1)-mer to the nodes homologous to its
//! trailing (K-1)-mer.

use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::alphabet::{Alphabet, Symbol};
use crate::kmer::{Kmer, Representative};
use crate::sequence::{similarity, Sequence};

/// One adjacency entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Index of the node at the other end.
    pub target: usize,
    /// Similarity of the target node to the linking k-mer's leading (K-1)-mer.
    pub prefix_similarity: i32,
    /// Similarity of the target node to the linking k-mer's trailing (K-1)-mer.
    pub suffix_similarity: i32,
}

/// A graph vertex: one (K-1)-mer and the reads it was seen in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub sequence: Sequence,
    /// Indices of contributing reads; duplicates allowed, order irrelevant.
    pub origins: Vec<usize>,
    pub forward_edges: Vec<Edge>,
    pub backward_edges: Vec<Edge>,
}

impl Node {
    pub fn new(sequence: Sequence, origins: Vec<usize>) -> Self {
        Node {
            sequence,
            origins,
            forward_edges: Vec::new(),
            backward_edges: Vec::new(),
        }
    }

    pub(crate) fn first_symbol(&self) -> Symbol {
        self.sequence.as_slice()[0]
    }

    pub(crate) fn last_symbol(&self) -> Symbol {
        self.sequence.as_slice()[self.sequence.len() - 1]
    }

    fn add_forward_edge(&mut self, edge: Edge) -> bool {
        add_unique(&mut self.forward_edges, edge)
    }

    fn add_backward_edge(&mut self, edge: Edge) -> bool {
        add_unique(&mut self.backward_edges, edge)
    }
}

fn add_unique(edges: &mut Vec<Edge>, edge: Edge) -> bool {
    if edges.iter().any(|e| e.target == edge.target) {
        return false;
    }
    edges.push(edge);
    true
}

/// The fine-grained graph: nodes are unique (K-1)-mers, edges observed k-mers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeBruijnGraph {
    k: usize,
    nodes: Vec<Node>,
}

impl DeBruijnGraph {
    /// Graph with one node per representative and no edges yet.
    pub fn from_representatives(k: usize, representatives: Vec<Representative>) -> Self {
        let nodes = representatives
            .into_iter()
            .map(|rep| {
                debug_assert_eq!(rep.sequence.len(), k - 1);
                Node::new(rep.sequence, rep.origins)
            })
            .collect();
        DeBruijnGraph { k, nodes }
    }

    /// Graph over the given (K-1)-mer sequences, each with no origins.
    /// Meant for building graphs edge by edge with [`DeBruijnGraph::add_edge`].
    pub fn from_sequences(k: usize, sequences: Vec<Sequence>) -> Self {
        let nodes = sequences
            .into_iter()
            .map(|sequence| Node::new(sequence, Vec::new()))
            .collect();
        DeBruijnGraph { k, nodes }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of forward adjacency entries over all nodes.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.forward_edges.len()).sum()
    }

    /// Add `from -> to` with the forward annotation `forward` on `from` and
    /// the mirrored `to -> from` entry with annotation `backward` on `to`.
    /// Either entry is skipped when its node already points at that target.
    /// Returns whether the forward entry was new.
    pub fn add_edge(
        &mut self,
        from: usize,
        to: usize,
        forward: (i32, i32),
        backward: (i32, i32),
    ) -> bool {
        assert!(
            from < self.nodes.len() && to < self.nodes.len(),
            "edge {from} -> {to} outside graph of {} nodes",
            self.nodes.len()
        );
        let added = self.nodes[from].add_forward_edge(Edge {
            target: to,
            prefix_similarity: forward.0,
            suffix_similarity: forward.1,
        });
        self.nodes[to].add_backward_edge(Edge {
            target: from,
            prefix_similarity: backward.0,
            suffix_similarity: backward.1,
        });
        added
    }

    /// Link nodes for every k-mer.
    ///
    /// For a k-mer with leading (K-1)-mer `p` and trailing (K-1)-mer `s`,
    /// every node `i` with `similarity(i, p) >= minimum_homology` gets an edge
    /// to every other node `j` with `similarity(j, s) >= minimum_homology`.
    /// Identical k-mers are linked once. Returns the number of distinct
    /// k-mers processed.
    pub fn link_kmers(
        &mut self,
        kmers: &[Kmer],
        alphabet: &Alphabet,
        minimum_homology: i32,
        parallel: bool,
    ) -> usize {
        let mut seen: HashSet<&Sequence> = HashSet::with_capacity(kmers.len());
        for kmer in kmers {
            if !seen.insert(&kmer.sequence) {
                continue;
            }
            let symbols = kmer.sequence.as_slice();
            let span = symbols.len() - 1;
            let prefix = &symbols[..span];
            let suffix = &symbols[1..];

            let prefix_similarity = self.similarities(prefix, alphabet, parallel);
            let suffix_similarity = self.similarities(suffix, alphabet, parallel);

            let sources: Vec<usize> = (0..self.nodes.len())
                .filter(|&i| prefix_similarity[i] >= minimum_homology)
                .collect();
            let targets: Vec<usize> = (0..self.nodes.len())
                .filter(|&j| suffix_similarity[j] >= minimum_homology)
                .collect();

            for &i in &sources {
                for &j in &targets {
                    if i == j {
                        continue;
                    }
                    self.add_edge(
                        i,
                        j,
                        (prefix_similarity[j], suffix_similarity[j]),
                        (prefix_similarity[i], suffix_similarity[i]),
                    );
                }
            }
        }
        seen.len()
    }

    /// Similarity of every node's sequence to `window`, in node order.
    fn similarities(&self, window: &[Symbol], alphabet: &Alphabet, parallel: bool) -> Vec<i32> {
        let score = |node: &Node| similarity(node.sequence.as_slice(), window, alphabet);

        #[cfg(feature = "parallel")]
        {
            if parallel {
                return self.nodes.par_iter().map(score).collect();
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        self.nodes.iter().map(score).collect()
    }
}
