//! End-to-end assembly of small hand-checked read sets.
//!
//! These tests verify that:
//! 1. Linear, overlapping and disjoint reads condense to the expected contigs
//! 2. Branch points split contigs and trim the shared junction overlap
//! 3. Cycles terminate as a single self-looping contig
//! 4. Invalid configurations fail before any work

#[cfg(test)]
mod tests {
    use kmer_condense::{
        assemble, Alphabet, Assembly, AssemblyConfig, ConfigurationError, Sequence,
    };

    fn alphabet() -> Alphabet {
        Alphabet::identity("ABCDEFGH", 1, 0).unwrap()
    }

    fn reads(alphabet: &Alphabet, texts: &[&str]) -> Vec<Sequence> {
        texts.iter().map(|t| alphabet.decode(t).unwrap()).collect()
    }

    /// K=3, exact linking, duplicates merged at similarity 1.
    fn exact_config() -> AssemblyConfig {
        AssemblyConfig {
            minimum_homology: 2,
            duplicate_threshold: 1,
            ..AssemblyConfig::with_k(3)
        }
    }

    fn run(texts: &[&str], config: AssemblyConfig) -> (Alphabet, Assembly) {
        let alphabet = alphabet();
        let assembly = assemble(&reads(&alphabet, texts), &alphabet, config).unwrap();
        (alphabet, assembly)
    }

    /// A single read is one linear path.
    #[test]
    fn test_linear_path() {
        let (alphabet, assembly) = run(&["ABCDE"], exact_config());
        assert_eq!(assembly.contig_strings(&alphabet), vec!["ABCDE"]);
        let contig = &assembly.contigs[0];
        assert!(contig.forward_edges.is_empty());
        assert!(contig.backward_edges.is_empty());
        assert_eq!(contig.origins, vec![0]);
        assert_eq!(contig.prefix, None);
        assert_eq!(contig.suffix, None);
    }

    /// Overlapping reads share (K-1)-mer nodes and merge into one contig.
    #[test]
    fn test_overlap_merge() {
        let (alphabet, assembly) = run(&["ABCDE", "CDEFG"], exact_config());
        assert_eq!(assembly.graph.len(), 6);
        assert_eq!(assembly.contig_strings(&alphabet), vec!["ABCDEFG"]);
        assert_eq!(assembly.contigs[0].origins, vec![0, 1]);
        assert_eq!(assembly.contigs[0].nodes.len(), 6);
    }

    /// Reads with nothing in common stay apart. Homopolymer reads collapse
    /// to a single node without a self-edge, so each contig is that node.
    #[test]
    fn test_disjoint_contigs() {
        let (alphabet, assembly) = run(&["AAAA", "GGGG"], exact_config());
        assert_eq!(assembly.contig_strings(&alphabet), vec!["AA", "GG"]);
        for contig in &assembly.contigs {
            assert!(contig.forward_edges.is_empty());
            assert!(contig.backward_edges.is_empty());
        }
        assert_eq!(assembly.contigs[0].origins, vec![0]);
        assert_eq!(assembly.contigs[1].origins, vec![1]);
    }

    /// A shared prefix node branches into two single-symbol contigs.
    #[test]
    fn test_branch_point() {
        // At duplicate threshold 1, "BC" and "BD" would merge into one node.
        let config = AssemblyConfig {
            duplicate_threshold: 2,
            ..exact_config()
        };
        let (alphabet, assembly) = run(&["ABC", "ABD"], config);
        assert_eq!(assembly.contig_strings(&alphabet), vec!["AB", "C", "D"]);

        let branch = &assembly.contigs[0];
        assert_eq!(branch.forward_edges, vec![1, 2]);
        assert!(branch.backward_edges.is_empty());
        assert_eq!(branch.origins, vec![0, 1]);

        let ab = alphabet.decode("AB").unwrap();
        for (index, contig) in assembly.contigs.iter().enumerate().skip(1) {
            assert_eq!(contig.backward_edges, vec![0]);
            assert_eq!(contig.prefix.as_ref(), Some(&ab));
            assert_eq!(contig.suffix, None);
            assert_eq!(contig.origins, vec![index - 1]);
        }
        assert_eq!(
            assembly.contigs[1].full_sequence().display(&alphabet).to_string(),
            "ABC"
        );
    }

    /// A read that wraps onto itself produces one cyclic contig.
    #[test]
    fn test_cycle_terminates() {
        let (alphabet, assembly) = run(&["ABCAB"], exact_config());
        assert_eq!(assembly.graph.len(), 3);
        assert_eq!(assembly.contigs.len(), 1);
        let contig = &assembly.contigs[0];
        assert_eq!(contig.sequence.display(&alphabet).to_string(), "ABCA");
        assert_eq!(contig.forward_edges, vec![0]);
        assert_eq!(contig.backward_edges, vec![0]);
        assert_eq!(contig.prefix, None);
        assert_eq!(contig.suffix, None);
    }

    /// Reversed k-mers form their own mirrored path.
    #[test]
    fn test_reverse_kmers() {
        // "CB" scores 1 against "AB", so duplicates must match exactly here.
        let config = AssemblyConfig {
            reverse: true,
            duplicate_threshold: 2,
            ..exact_config()
        };
        let (alphabet, assembly) = run(&["ABCD"], config);
        assert_eq!(assembly.meta.kmers, 4);
        assert_eq!(assembly.contig_strings(&alphabet), vec!["ABCD", "DCBA"]);
    }

    /// Reads shorter than K add nothing but still count.
    #[test]
    fn test_short_reads_are_skipped() {
        let (alphabet, assembly) = run(&["ABCDE", "AB"], exact_config());
        assert_eq!(assembly.meta.reads, 2);
        assert_eq!(assembly.contig_strings(&alphabet), vec!["ABCDE"]);
        assert_eq!(assembly.contigs[0].origins, vec![0]);
    }

    /// Merging at a tip trims the upstream contig's suffix.
    #[test]
    fn test_merge_trims_suffix() {
        let config = AssemblyConfig {
            duplicate_threshold: 2,
            ..exact_config()
        };
        let (alphabet, assembly) = run(&["ABCD", "EBCD"], config);
        assert_eq!(assembly.contig_strings(&alphabet), vec!["A", "BCD", "E"]);
        assert_eq!(assembly.contigs[1].backward_edges, vec![0, 2]);
        let bc = alphabet.decode("BC").unwrap();
        assert_eq!(assembly.contigs[0].suffix.as_ref(), Some(&bc));
        assert_eq!(assembly.contigs[2].suffix.as_ref(), Some(&bc));
        assert_eq!(assembly.meta.trimmed_suffixes, 2);
        assert_eq!(assembly.meta.trimmed_prefixes, 0);
    }

    /// Each invalid parameter is reported before any phase runs.
    #[test]
    fn test_configuration_errors() {
        let alphabet = alphabet();
        let input = reads(&alphabet, &["ABCDE"]);

        let error = assemble(&input, &alphabet, AssemblyConfig::with_k(1)).unwrap_err();
        assert_eq!(error, ConfigurationError::KmerTooShort(1));

        let negative = AssemblyConfig {
            minimum_homology: -2,
            ..AssemblyConfig::with_k(3)
        };
        let error = assemble(&input, &alphabet, negative).unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::NegativeThreshold {
                name: "minimum_homology",
                value: -2
            }
        ));

        let error = assemble(&[], &alphabet, AssemblyConfig::with_k(3)).unwrap_err();
        assert_eq!(error, ConfigurationError::NoReads);
    }

    /// Decoding rejects symbols outside the alphabet with their position.
    #[test]
    fn test_unknown_symbol() {
        let alphabet = alphabet();
        let error = alphabet.decode("ABZ").unwrap_err();
        assert_eq!(
            error,
            kmer_condense::AlphabetError::UnknownSymbol {
                symbol: 'Z',
                position: 2
            }
        );
    }
}
