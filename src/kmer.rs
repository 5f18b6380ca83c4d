//! K-mer generation and similarity-based (K-1)-mer deduplication.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::alphabet::Alphabet;
use crate::sequence::{similarity, Sequence};

/// A fixed-length window of a read, tagged with the index of that read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kmer {
    pub sequence: Sequence,
    pub origin: usize,
}

/// A distinct (K-1)-mer together with every read that contributed it.
///
/// Origins keep duplicates; their order is insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representative {
    pub sequence: Sequence,
    pub origins: Vec<usize>,
}

/// Slice every read into all overlapping windows of length `k`.
///
/// Reads shorter than `k` contribute nothing. With `reverse` set, each
/// window is followed directly by its reversed copy under the same origin.
pub fn generate_kmers(reads: &[Sequence], k: usize, reverse: bool) -> Vec<Kmer> {
    let mut kmers = Vec::new();
    for (origin, read) in reads.iter().enumerate() {
        if read.len() < k {
            log::trace!("read {origin} (length {}) is shorter than k={k}", read.len());
            continue;
        }
        for window in read.as_slice().windows(k) {
            let sequence = Sequence::new(window.to_vec());
            if reverse {
                let reversed = sequence.reversed();
                kmers.push(Kmer { sequence, origin });
                kmers.push(Kmer {
                    sequence: reversed,
                    origin,
                });
            } else {
                kmers.push(Kmer { sequence, origin });
            }
        }
    }
    kmers
}

/// Split each k-mer into its leading and trailing (K-1)-mer, in that order.
pub fn split_kmers(kmers: &[Kmer]) -> Vec<Kmer> {
    let mut halves = Vec::with_capacity(kmers.len() * 2);
    for kmer in kmers {
        let len = kmer.sequence.len().saturating_sub(1);
        halves.push(Kmer {
            sequence: kmer.sequence.subsequence(0, len),
            origin: kmer.origin,
        });
        halves.push(Kmer {
            sequence: kmer.sequence.subsequence(1, len),
            origin: kmer.origin,
        });
    }
    halves
}

/// Collapse near-duplicate (K-1)-mers.
///
/// Each entry is compared with the accepted representatives in acceptance
/// order and merged into the first one scoring at least
/// `duplicate_threshold`; otherwise it becomes a new representative.
/// The result depends on input order. With `parallel` set (and the
/// `parallel` feature built) the scan over representatives runs on the
/// current rayon pool but still picks the earliest match.
pub fn deduplicate(
    kmers: &[Kmer],
    alphabet: &Alphabet,
    duplicate_threshold: i32,
    parallel: bool,
) -> Vec<Representative> {
    let mut representatives: Vec<Representative> = Vec::new();
    for kmer in kmers {
        let merged = first_match(
            &representatives,
            &kmer.sequence,
            alphabet,
            duplicate_threshold,
            parallel,
        );
        match merged {
            Some(index) => representatives[index].origins.push(kmer.origin),
            None => representatives.push(Representative {
                sequence: kmer.sequence.clone(),
                origins: vec![kmer.origin],
            }),
        }
    }
    representatives
}

fn first_match(
    representatives: &[Representative],
    candidate: &Sequence,
    alphabet: &Alphabet,
    threshold: i32,
    parallel: bool,
) -> Option<usize> {
    let matches = |rep: &Representative| {
        similarity(rep.sequence.as_slice(), candidate.as_slice(), alphabet) >= threshold
    };

    #[cfg(feature = "parallel")]
    {
        if parallel {
            return representatives.par_iter().position_first(matches);
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    representatives.iter().position(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> Alphabet {
        Alphabet::identity("ABCDEFG", 1, 0).unwrap()
    }

    fn texts(alphabet: &Alphabet, kmers: &[Kmer]) -> Vec<String> {
        kmers
            .iter()
            .map(|k| k.sequence.display(alphabet).to_string())
            .collect()
    }

    #[test]
    fn windows_every_read() {
        let alphabet = alphabet();
        let reads = vec![
            alphabet.decode("ABCDE").unwrap(),
            alphabet.decode("AB").unwrap(),
            alphabet.decode("FGA").unwrap(),
        ];
        let kmers = generate_kmers(&reads, 3, false);
        assert_eq!(texts(&alphabet, &kmers), vec!["ABC", "BCD", "CDE", "FGA"]);
        assert_eq!(
            kmers.iter().map(|k| k.origin).collect::<Vec<_>>(),
            vec![0, 0, 0, 2]
        );
    }

    #[test]
    fn reverse_follows_each_kmer() {
        let alphabet = alphabet();
        let reads = vec![alphabet.decode("ABCD").unwrap()];
        let kmers = generate_kmers(&reads, 3, true);
        assert_eq!(texts(&alphabet, &kmers), vec!["ABC", "CBA", "BCD", "DCB"]);
        assert!(kmers.iter().all(|k| k.origin == 0));
    }

    #[test]
    fn splits_into_leading_and_trailing() {
        let alphabet = alphabet();
        let reads = vec![alphabet.decode("ABCD").unwrap()];
        let halves = split_kmers(&generate_kmers(&reads, 3, false));
        assert_eq!(texts(&alphabet, &halves), vec!["AB", "BC", "BC", "CD"]);
    }

    #[test]
    fn exact_threshold_merges_identical_only() {
        let alphabet = alphabet();
        let reads = vec![
            alphabet.decode("ABCD").unwrap(),
            alphabet.decode("BCE").unwrap(),
        ];
        let halves = split_kmers(&generate_kmers(&reads, 3, false));
        let reps = deduplicate(&halves, &alphabet, 2, false);
        let seqs: Vec<String> = reps
            .iter()
            .map(|r| r.sequence.display(&alphabet).to_string())
            .collect();
        assert_eq!(seqs, vec!["AB", "BC", "CD", "CE"]);
        assert_eq!(reps[1].origins, vec![0, 0, 1]);
    }

    #[test]
    fn loose_threshold_merges_into_earliest() {
        let alphabet = alphabet();
        let entries: Vec<Kmer> = ["AB", "CB", "AD", "CD"]
            .iter()
            .enumerate()
            .map(|(origin, text)| Kmer {
                sequence: alphabet.decode(text).unwrap(),
                origin,
            })
            .collect();
        // "CB" and "AD" share one symbol with "AB" and merge into it. "CD"
        // shares nothing with "AB" and starts a new representative.
        let reps = deduplicate(&entries, &alphabet, 1, false);
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].origins, vec![0, 1, 2]);
        assert_eq!(reps[1].sequence, alphabet.decode("CD").unwrap());
        assert_eq!(reps[1].origins, vec![3]);
    }
}
