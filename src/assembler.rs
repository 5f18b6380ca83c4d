//! End-to-end assembly: k-mers, deduplication, graph, condensation.

use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::alphabet::Alphabet;
use crate::condense::{remap_and_trim, walk_paths, CondensedNode};
use crate::config::{AssemblyConfig, ConfigurationError};
use crate::graph::DeBruijnGraph;
use crate::kmer::{deduplicate, generate_kmers, split_kmers};
use crate::sequence::Sequence;

/// Counts and phase timings gathered during one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaInformation {
    pub reads: usize,
    pub kmers: usize,
    /// Distinct k-mer sequences that produced edges.
    pub distinct_kmers: usize,
    /// (K-1)-mers before deduplication, two per k-mer.
    pub raw_kmer_halves: usize,
    /// Graph nodes after deduplication.
    pub nodes: usize,
    pub edges: usize,
    pub contigs: usize,
    pub condensed_edges: usize,
    pub longest_contig: usize,
    pub trimmed_prefixes: usize,
    pub trimmed_suffixes: usize,
    pub kmer_ms: u64,
    pub dedup_ms: u64,
    pub graph_ms: u64,
    pub condense_ms: u64,
    pub remap_ms: u64,
    pub total_ms: u64,
}

/// Result of [`assemble`].
#[derive(Debug, Clone)]
pub struct Assembly {
    /// The fine-grained de Bruijn graph.
    pub graph: DeBruijnGraph,
    /// Condensed graph; edges index into this list.
    pub contigs: Vec<CondensedNode>,
    pub meta: MetaInformation,
}

impl Assembly {
    /// Contig sequences rendered as text, in contig order.
    pub fn contig_strings(&self, alphabet: &Alphabet) -> Vec<String> {
        self.contigs
            .iter()
            .map(|c| c.sequence.display(alphabet).to_string())
            .collect()
    }
}

fn millis(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Assemble `reads` into a condensed de Bruijn graph.
///
/// The configuration is validated before any work starts. Reads shorter
/// than `k` contribute nothing.
pub fn assemble(
    reads: &[Sequence],
    alphabet: &Alphabet,
    config: AssemblyConfig,
) -> Result<Assembly, ConfigurationError> {
    config.validate(reads.len())?;
    Ok(with_workers(&config, |parallel| {
        run(reads, alphabet, &config, parallel)
    }))
}

/// Run `job` on a rayon pool of `max_workers` threads when threading is
/// requested and available, otherwise on the calling thread.
fn with_workers<T, F>(config: &AssemblyConfig, job: F) -> T
where
    T: Send,
    F: FnOnce(bool) -> T + Send,
{
    if !config.use_threads {
        return job(false);
    }

    #[cfg(feature = "parallel")]
    {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers.max(1))
            .build()
        {
            Ok(pool) => pool.install(|| job(true)),
            Err(error) => {
                log::warn!("Failed to build rayon thread pool ({error}); running sequentially");
                job(false)
            }
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        log::warn!(
            "Threaded assembly requested, but the 'parallel' feature is not enabled; falling back to sequential mode"
        );
        job(false)
    }
}

fn run(
    reads: &[Sequence],
    alphabet: &Alphabet,
    config: &AssemblyConfig,
    parallel: bool,
) -> Assembly {
    let total = Instant::now();
    let mut meta = MetaInformation {
        reads: reads.len(),
        ..MetaInformation::default()
    };

    let start = Instant::now();
    let kmers = generate_kmers(reads, config.k, config.reverse);
    let halves = split_kmers(&kmers);
    meta.kmers = kmers.len();
    meta.raw_kmer_halves = halves.len();
    meta.kmer_ms = millis(start);
    info!(
        "Generated {} k-mers ({} (K-1)-mers) from {} reads in {} ms",
        meta.kmers, meta.raw_kmer_halves, meta.reads, meta.kmer_ms
    );

    let start = Instant::now();
    let representatives = deduplicate(&halves, alphabet, config.duplicate_threshold, parallel);
    meta.nodes = representatives.len();
    meta.dedup_ms = millis(start);
    info!(
        "Deduplicated to {} (K-1)-mers in {} ms",
        meta.nodes, meta.dedup_ms
    );

    let start = Instant::now();
    let mut graph = DeBruijnGraph::from_representatives(config.k, representatives);
    meta.distinct_kmers = graph.link_kmers(&kmers, alphabet, config.minimum_homology, parallel);
    meta.edges = graph.edge_count();
    meta.graph_ms = millis(start);
    info!(
        "Linked {} nodes with {} edges from {} distinct k-mers in {} ms",
        meta.nodes, meta.edges, meta.distinct_kmers, meta.graph_ms
    );

    let start = Instant::now();
    let mut contigs = walk_paths(&graph);
    meta.condense_ms = millis(start);
    info!("Condensed into {} contigs in {} ms", contigs.len(), meta.condense_ms);

    let start = Instant::now();
    remap_and_trim(&graph, &mut contigs);
    meta.remap_ms = millis(start);

    meta.contigs = contigs.len();
    meta.condensed_edges = contigs.iter().map(|c| c.forward_edges.len()).sum();
    meta.longest_contig = contigs
        .iter()
        .map(|c| c.full_sequence().len())
        .max()
        .unwrap_or(0);
    meta.trimmed_prefixes = contigs.iter().filter(|c| c.prefix.is_some()).count();
    meta.trimmed_suffixes = contigs.iter().filter(|c| c.suffix.is_some()).count();
    info!(
        "Remapped {} contig edges in {} ms ({} prefixes, {} suffixes trimmed)",
        meta.condensed_edges, meta.remap_ms, meta.trimmed_prefixes, meta.trimmed_suffixes
    );

    for (index, contig) in contigs.iter().enumerate() {
        debug!(
            "contig {index}: {} symbols over {} nodes, origins {:?}, forward {:?}, backward {:?}",
            contig.sequence.len(),
            contig.nodes.len(),
            contig.origins,
            contig.forward_edges,
            contig.backward_edges
        );
    }

    meta.total_ms = millis(total);
    Assembly {
        graph,
        contigs,
        meta,
    }
}
