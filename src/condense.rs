//! Condensation of the de Bruijn graph into contigs.
//!
//! Every maximal non-branching path becomes one [`CondensedNode`]. The
//! condensation runs in two steps:
//!
//! 1. [`walk_paths`] seeds a contig at each unvisited node in index order
//!    and extends it forward and backward. Endpoint adjacency is recorded
//!    as fine-grained node indices.
//! 2. [`remap_and_trim`] rewrites that adjacency into contig indices and
//!    moves the (K-1)-length junction overlap of singly-connected contigs
//!    into their prefix or suffix.
//!
//! [`condense`] runs both.

use std::collections::HashMap;

use crate::alphabet::Symbol;
use crate::graph::{DeBruijnGraph, Edge, Node};
use crate::sequence::Sequence;

/// A contig: one maximal simple path of the fine-grained graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedNode {
    /// Contig sequence, with trimmed junction overlaps removed.
    pub sequence: Sequence,
    /// The (K-1)-mer trimmed off the front, when there was exactly one predecessor.
    pub prefix: Option<Sequence>,
    /// The (K-1)-mer trimmed off the back, when there was exactly one successor.
    pub suffix: Option<Sequence>,
    /// Fine-grained index of the last node on the path.
    pub forward_index: usize,
    /// Fine-grained index of the first node on the path.
    pub backward_index: usize,
    /// Successors. Fine-grained node indices until remapped, contig indices after.
    pub forward_edges: Vec<usize>,
    /// Predecessors. Fine-grained node indices until remapped, contig indices after.
    pub backward_edges: Vec<usize>,
    /// Reads that contributed to any node on the path, sorted and unique.
    pub origins: Vec<usize>,
    /// Fine-grained nodes on the path, first to last.
    pub nodes: Vec<usize>,
}

impl CondensedNode {
    /// Prefix, sequence and suffix joined back together.
    ///
    /// When both overlaps were trimmed off a short contig they share
    /// symbols; the shared part is emitted once.
    pub fn full_sequence(&self) -> Sequence {
        let mut full = Sequence::with_capacity(
            self.sequence.len()
                + self.prefix.as_ref().map_or(0, Sequence::len)
                + self.suffix.as_ref().map_or(0, Sequence::len),
        );
        if let Some(prefix) = &self.prefix {
            full.extend(prefix.as_slice().iter().copied());
        }
        full.extend(self.sequence.as_slice().iter().copied());
        if let Some(suffix) = &self.suffix {
            let shared = if self.prefix.is_some() {
                // Both junctions present: the path plus one context symbol each side.
                let untrimmed = suffix.len() + self.nodes.len() + 1;
                (full.len() + suffix.len()).saturating_sub(untrimmed)
            } else {
                0
            };
            full.extend(suffix.as_slice()[shared.min(suffix.len())..].iter().copied());
        }
        full
    }

    /// Whether the contig links to itself in either direction.
    pub fn has_self_loop(&self, own_index: usize) -> bool {
        self.forward_edges.contains(&own_index) || self.backward_edges.contains(&own_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn edges(self, node: &Node) -> &[Edge] {
        match self {
            Direction::Forward => &node.forward_edges,
            Direction::Backward => &node.backward_edges,
        }
    }

    fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Condense `graph` into contigs with remapped, trimmed adjacency.
pub fn condense(graph: &DeBruijnGraph) -> Vec<CondensedNode> {
    let mut contigs = walk_paths(graph);
    remap_and_trim(graph, &mut contigs);
    contigs
}

/// Collapse every maximal simple path into one contig.
///
/// Nodes are scanned in index order; each unvisited node seeds a contig that
/// is extended while the current node has exactly one edge in the walking
/// direction and the next node is unvisited, is not the seed, and has
/// exactly one edge pointing back. Every node ends up in exactly one
/// contig. Returned adjacency still uses fine-grained node indices.
pub fn walk_paths(graph: &DeBruijnGraph) -> Vec<CondensedNode> {
    let nodes = graph.nodes();
    let mut visited = vec![false; nodes.len()];
    let mut contigs = Vec::new();

    for seed in 0..nodes.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let forward = walk(nodes, seed, Direction::Forward, &mut visited);
        let backward = walk(nodes, seed, Direction::Backward, &mut visited);

        let mut path: Vec<usize> = Vec::with_capacity(forward.len() + backward.len() + 1);
        path.extend(backward.iter().rev());
        path.push(seed);
        path.extend(&forward);

        let contig = build_contig(nodes, path, backward.len());
        log::trace!(
            "seed {seed}: {} nodes, ends {}..{}",
            contig.nodes.len(),
            contig.backward_index,
            contig.forward_index
        );
        contigs.push(contig);
    }

    debug_assert!(visited.iter().all(|&v| v));
    contigs
}

/// Extend from `seed` in one direction, returning the nodes taken in walk order.
fn walk(nodes: &[Node], seed: usize, direction: Direction, visited: &mut [bool]) -> Vec<usize> {
    let mut taken = Vec::new();
    let mut current = seed;
    while let [edge] = direction.edges(&nodes[current]) {
        let next = edge.target;
        if next == seed {
            log::trace!("cycle through seed {seed}");
            break;
        }
        if visited[next] || direction.reverse().edges(&nodes[next]).len() != 1 {
            break;
        }
        visited[next] = true;
        taken.push(next);
        current = next;
    }
    taken
}

/// The single neighbour of `node` in `direction`, unless it lies on `path`.
fn junction(node: &Node, direction: Direction, path: &[usize]) -> Option<usize> {
    match direction.edges(node) {
        [edge] if !path.contains(&edge.target) => Some(edge.target),
        _ => None,
    }
}

fn build_contig(nodes: &[Node], path: Vec<usize>, seed_offset: usize) -> CondensedNode {
    let backward_index = path[0];
    let forward_index = path[path.len() - 1];
    let first = &nodes[backward_index];
    let last = &nodes[forward_index];

    // A unique neighbour beyond either end is a junction; one symbol of it is
    // kept so the shared (K-1)-mer overlap is present for trimming.
    let before = junction(first, Direction::Backward, &path);
    let after = junction(last, Direction::Forward, &path);

    let seed = &nodes[path[seed_offset]];
    let mut symbols: Vec<Symbol> = Vec::with_capacity(seed.sequence.len() + path.len() + 1);
    if let Some(index) = before {
        symbols.push(nodes[index].first_symbol());
    }
    symbols.extend(path[..seed_offset].iter().map(|&i| nodes[i].first_symbol()));
    symbols.extend(seed.sequence.as_slice().iter().copied());
    symbols.extend(path[seed_offset + 1..].iter().map(|&i| nodes[i].last_symbol()));
    if let Some(index) = after {
        symbols.push(nodes[index].last_symbol());
    }

    let mut origins: Vec<usize> = path
        .iter()
        .flat_map(|&i| nodes[i].origins.iter().copied())
        .collect();
    origins.sort_unstable();
    origins.dedup();

    CondensedNode {
        sequence: Sequence::new(symbols),
        prefix: None,
        suffix: None,
        forward_index,
        backward_index,
        forward_edges: last.forward_edges.iter().map(|e| e.target).collect(),
        backward_edges: first.backward_edges.iter().map(|e| e.target).collect(),
        origins,
        nodes: path,
    }
}

/// Rewrite contig adjacency from node indices to contig indices, then trim.
///
/// A successor node `t` of a contig's last node maps to the contig that
/// starts at `t`; a predecessor node `s` of its first node maps to the contig
/// that ends at `s`. Edge lists come out sorted and deduplicated. A contig
/// without a self-loop then loses its first K-1 symbols into `prefix` when
/// it has exactly one predecessor, and its last K-1 symbols into `suffix`
/// when it has exactly one successor.
///
/// Call once, on the output of [`walk_paths`] for the same graph.
pub fn remap_and_trim(graph: &DeBruijnGraph, contigs: &mut [CondensedNode]) {
    let starting_at: HashMap<usize, usize> = contigs
        .iter()
        .enumerate()
        .map(|(index, contig)| (contig.backward_index, index))
        .collect();
    let ending_at: HashMap<usize, usize> = contigs
        .iter()
        .enumerate()
        .map(|(index, contig)| (contig.forward_index, index))
        .collect();

    for contig in contigs.iter_mut() {
        debug_assert!(contig.forward_edges.iter().all(|&t| graph
            .node(t)
            .backward_edges
            .iter()
            .any(|e| e.target == contig.forward_index)));

        contig.forward_edges = remap(&contig.forward_edges, &starting_at, "start");
        contig.backward_edges = remap(&contig.backward_edges, &ending_at, "end");
    }

    let overlap = graph.k() - 1;
    for (index, contig) in contigs.iter_mut().enumerate() {
        trim(contig, index, overlap);
    }
}

fn remap(targets: &[usize], by_endpoint: &HashMap<usize, usize>, endpoint: &str) -> Vec<usize> {
    let mut mapped: Vec<usize> = targets
        .iter()
        .map(|node| {
            *by_endpoint.get(node).unwrap_or_else(|| {
                panic!("graph node {node} is not the {endpoint} of any contig")
            })
        })
        .collect();
    mapped.sort_unstable();
    mapped.dedup();
    mapped
}

fn trim(contig: &mut CondensedNode, own_index: usize, overlap: usize) {
    if contig.has_self_loop(own_index) {
        return;
    }
    let trim_prefix = contig.backward_edges.len() == 1;
    let trim_suffix = contig.forward_edges.len() == 1;
    if !trim_prefix && !trim_suffix {
        return;
    }

    let len = contig.sequence.len();
    let overlap = overlap.min(len);
    let mut start = 0;
    let mut end = len;
    if trim_prefix {
        contig.prefix = Some(contig.sequence.subsequence(0, overlap));
        start = overlap;
    }
    if trim_suffix {
        contig.suffix = Some(contig.sequence.subsequence(len - overlap, overlap));
        end = len - overlap;
    }
    contig.sequence = if start < end {
        contig.sequence.subsequence(start, end - start)
    } else {
        Sequence::default()
    };
}
