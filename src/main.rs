use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use bio::io::{fasta, fastq};
use clap::Parser;
use flate2::read::MultiGzDecoder;
use log::{debug, info};
use serde_json::json;

use kmer_condense::{assemble, Alphabet, Assembly, AssemblyConfig, Sequence, DEFAULT_K};

/// Condense short peptide reads into contigs over a de Bruijn graph
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Reads as FASTA, FASTQ or one sequence per line (optionally gzipped)
    reads: PathBuf,

    /// Score table for the alphabet (default: 20 amino acids, identity scoring)
    #[arg(long)]
    alphabet: Option<PathBuf>,

    /// K-mer length; graph nodes are (K-1)-mers
    #[arg(short, long, default_value_t = DEFAULT_K)]
    k: usize,

    /// Minimum similarity for a k-mer to link two nodes (default: k - 1)
    #[arg(long)]
    minimum_homology: Option<i32>,

    /// Similarity at which (K-1)-mers collapse into one node (default: k - 1)
    #[arg(long)]
    duplicate_threshold: Option<i32>,

    /// Also ingest every k-mer reversed
    #[arg(long)]
    reverse: bool,

    /// Enable threaded similarity scans (needs the 'parallel' feature)
    #[arg(long, default_value_t = false)]
    threads: bool,

    /// Number of worker threads (default: max available - 1)
    #[arg(long, default_value_t = num_cpus::get().saturating_sub(1).max(1))]
    max_workers: usize,

    /// Write contigs here instead of stdout
    #[arg(long)]
    output_fasta: Option<PathBuf>,

    /// Optional output file for the condensed graph (JSON nodes and edges)
    #[arg(long)]
    export_graph_json: Option<PathBuf>,

    /// Optional output file for run statistics (JSON)
    #[arg(long)]
    meta_json: Option<PathBuf>,

    /// Wrap FASTA lines to this width (0 = no-wrap)
    #[arg(long, default_value_t = 60)]
    fasta_line_width: usize,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

impl Args {
    fn log_level(&self) -> &'static str {
        if self.trace {
            "trace"
        } else if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "error"
        }
    }

    fn config(&self) -> AssemblyConfig {
        let base = AssemblyConfig::with_k(self.k);
        AssemblyConfig {
            minimum_homology: self.minimum_homology.unwrap_or(base.minimum_homology),
            duplicate_threshold: self.duplicate_threshold.unwrap_or(base.duplicate_threshold),
            reverse: self.reverse,
            use_threads: self.threads,
            max_workers: self.max_workers,
            ..base
        }
    }
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    info!("reads: {}", args.reads.display());

    if let Err(error) = run_pipeline(&args) {
        eprintln!("Assembly failed: {error:?}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceFormat {
    Fastq,
    Fasta,
    Lines,
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

fn infer_format(path: &Path) -> SequenceFormat {
    let mut ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if is_gzip(path) {
        ext = path
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
    }

    match ext.as_str() {
        "fastq" | "fq" => SequenceFormat::Fastq,
        "fasta" | "fa" | "faa" => SequenceFormat::Fasta,
        _ => SequenceFormat::Lines,
    }
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| anyhow!("Encountered non-UTF-8 symbols in sequence data"))
}

fn read_sequences(path: &Path) -> Result<Vec<String>> {
    let reader = open_reader(path)?;
    let mut sequences = Vec::new();
    match infer_format(path) {
        SequenceFormat::Fastq => {
            for record in fastq::Reader::new(reader).records() {
                let record = record.with_context(|| {
                    format!("Error reading FASTQ record from {}", path.display())
                })?;
                sequences.push(utf8(record.seq())?);
            }
        }
        SequenceFormat::Fasta => {
            for record in fasta::Reader::new(reader).records() {
                let record = record.with_context(|| {
                    format!("Error reading FASTA record from {}", path.display())
                })?;
                sequences.push(utf8(record.seq())?);
            }
        }
        SequenceFormat::Lines => {
            for line in reader.lines() {
                let line = line.with_context(|| format!("Error reading {}", path.display()))?;
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    sequences.push(trimmed.to_owned());
                }
            }
        }
    }
    Ok(sequences)
}

fn load_alphabet(path: Option<&Path>) -> Result<Alphabet> {
    match path {
        None => Ok(Alphabet::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read alphabet {}", path.display()))?;
            Alphabet::from_table(&text)
                .with_context(|| format!("Invalid alphabet table {}", path.display()))
        }
    }
}

fn create_output(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

fn write_wrapped<W: Write>(out: &mut W, text: &str, width: usize) -> io::Result<()> {
    if width == 0 || text.is_empty() {
        return writeln!(out, "{text}");
    }
    let chars: Vec<char> = text.chars().collect();
    for line in chars.chunks(width) {
        writeln!(out, "{}", line.iter().collect::<String>())?;
    }
    Ok(())
}

fn write_fasta<W: Write>(
    out: &mut W,
    assembly: &Assembly,
    alphabet: &Alphabet,
    width: usize,
) -> io::Result<()> {
    for (index, contig) in assembly.contigs.iter().enumerate() {
        writeln!(
            out,
            ">contig_{index} length={} nodes={} origins={}",
            contig.sequence.len(),
            contig.nodes.len(),
            contig
                .origins
                .iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join(",")
        )?;
        write_wrapped(out, &contig.sequence.display(alphabet).to_string(), width)?;
    }
    Ok(())
}

fn graph_json(assembly: &Assembly, alphabet: &Alphabet) -> serde_json::Value {
    let text = |seq: &Sequence| seq.display(alphabet).to_string();
    let nodes: Vec<_> = assembly
        .contigs
        .iter()
        .enumerate()
        .map(|(idx, contig)| {
            json!({
                "id": idx,
                "sequence": text(&contig.sequence),
                "prefix": contig.prefix.as_ref().map(text),
                "suffix": contig.suffix.as_ref().map(text),
                "origins": contig.origins,
                "graph_nodes": contig.nodes,
            })
        })
        .collect();
    let edges: Vec<_> = assembly
        .contigs
        .iter()
        .enumerate()
        .flat_map(|(source, contig)| {
            contig
                .forward_edges
                .iter()
                .map(move |&target| json!({"source": source, "target": target}))
        })
        .collect();
    json!({"k": assembly.graph.k(), "nodes": nodes, "edges": edges})
}

fn run_pipeline(args: &Args) -> Result<Assembly> {
    let alphabet = load_alphabet(args.alphabet.as_deref())?;
    let raw = read_sequences(&args.reads)
        .with_context(|| format!("Failed to parse reads from {}", args.reads.display()))?;
    let reads = raw
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            alphabet
                .decode(text)
                .with_context(|| format!("Failed to decode read {idx}"))
        })
        .collect::<Result<Vec<Sequence>>>()?;
    info!("Loaded {} reads", reads.len());

    let config = args.config();
    debug!("{config:?}");
    let assembly = assemble(&reads, &alphabet, config).context("Assembly rejected")?;
    info!(
        "{} contigs, longest {} symbols",
        assembly.meta.contigs, assembly.meta.longest_contig
    );

    match &args.output_fasta {
        Some(path) => {
            let mut file = create_output(path)?;
            write_fasta(&mut file, &assembly, &alphabet, args.fasta_line_width)?;
            info!("Contigs written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            write_fasta(&mut stdout.lock(), &assembly, &alphabet, args.fasta_line_width)?;
        }
    }

    if let Some(path) = &args.export_graph_json {
        let mut file = create_output(path)?;
        writeln!(
            file,
            "{}",
            serde_json::to_string_pretty(&graph_json(&assembly, &alphabet))?
        )?;
        info!("Condensed graph written to {}", path.display());
    }

    if let Some(path) = &args.meta_json {
        let mut file = create_output(path)?;
        writeln!(file, "{}", serde_json::to_string_pretty(&assembly.meta)?)?;
        info!("Run statistics written to {}", path.display());
    }

    Ok(assembly)
}

#[cfg(test)]
mod smoke {
    use super::*;

    #[test]
    fn smoke_run() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let reads = dir.path().join("reads.txt");
        let fasta = dir.path().join("out").join("contigs.fasta");
        let graph = dir.path().join("graph.json");
        let meta = dir.path().join("meta.json");
        std::fs::write(&reads, "ACDEF\nDEFGH\n\n").unwrap();

        let args = Args::parse_from([
            "kmer-condense",
            reads.to_str().unwrap(),
            "-k",
            "3",
            "--output-fasta",
            fasta.to_str().unwrap(),
            "--export-graph-json",
            graph.to_str().unwrap(),
            "--meta-json",
            meta.to_str().unwrap(),
        ]);
        let assembly = run_pipeline(&args).expect("pipeline");
        assert_eq!(assembly.meta.reads, 2);
        assert_eq!(assembly.meta.contigs, 1);

        let written = std::fs::read_to_string(&fasta).unwrap();
        assert!(written.starts_with(">contig_0 length=7"));
        assert!(written.contains("ACDEFGH"));

        let graph: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&graph).unwrap()).unwrap();
        assert_eq!(graph["nodes"][0]["sequence"], "ACDEFGH");
        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&meta).unwrap()).unwrap();
        assert_eq!(meta["contigs"], 1);
    }

    #[test]
    fn fasta_input_with_unknown_symbol_fails() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let reads = dir.path().join("reads.fasta");
        std::fs::write(&reads, ">r0\nACDEF\n>r1\nACXZF\n").unwrap();
        let args = Args::parse_from(["kmer-condense", reads.to_str().unwrap(), "-k", "3"]);
        let error = run_pipeline(&args).unwrap_err();
        assert!(format!("{error:#}").contains("Failed to decode read 1"));
    }

    #[test]
    fn wraps_fasta_lines() {
        let mut out = Vec::new();
        write_wrapped(&mut out, "ABCDEFG", 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ABC\nDEF\nG\n");
    }

    #[test]
    fn gzipped_extension_uses_inner_format() {
        assert_eq!(infer_format(Path::new("r.fq.gz")), SequenceFormat::Fastq);
        assert_eq!(infer_format(Path::new("r.fasta")), SequenceFormat::Fasta);
        assert_eq!(infer_format(Path::new("r.txt")), SequenceFormat::Lines);
    }
}
