// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::{Mutex, RwLock};

use anyhow::{anyhow, Context, Result};
use bio::io::fasta;
use lru_time_cache::LruCache;

use crate::constants::REFERENCE_BUFFER_CAPACITY;
use crate::errors::Error;

/// Reference sequences, fetched by contig and half-open coordinates.
pub trait ReferenceSource {
    /// Contig names and lengths in file order.
    fn contigs(&self) -> Vec<(String, u64)>;

    /// The full sequence of a contig.
    fn contig_seq(&self, contig: &str) -> Result<Arc<Vec<u8>>>;

    /// The sequence in `[start, end)`, clamped to the contig bounds.
    fn fetch(&self, contig: &str, start: i64, end: i64) -> Result<Vec<u8>> {
        let seq = self.contig_seq(contig)?;
        let clamp = |pos: i64| pos.max(0).min(seq.len() as i64) as usize;
        let (start, end) = (clamp(start), clamp(end));
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(seq[start..end].to_vec())
    }
}

fn unknown_contig(contig: &str) -> anyhow::Error {
    Error::UnknownReferenceContig {
        contig: contig.to_owned(),
    }
    .into()
}

/// A lazy buffer for indexed reference sequences.
pub struct Buffer {
    reader: RwLock<fasta::IndexedReader<fs::File>>,
    sequences: Mutex<LruCache<String, Arc<Vec<u8>>>>,
    reference_path: PathBuf,
}

impl Buffer {
    pub fn from_path<P: AsRef<Path> + std::fmt::Debug>(path: P, capacity: usize) -> Result<Self> {
        let fasta = fasta::IndexedReader::from_file(&path).with_context(|| {
            format!(
                "Failed to open indexed reference {}",
                path.as_ref().display()
            )
        })?;
        Ok(Buffer {
            reader: RwLock::new(fasta),
            sequences: Mutex::new(LruCache::with_capacity(capacity)),
            reference_path: path.as_ref().to_path_buf(),
        })
    }

    fn sequences(&self) -> Result<Vec<fasta::Sequence>> {
        let reader = self
            .reader
            .read()
            .map_err(|_| anyhow!("Reference reader lock poisoned"))?;
        Ok(reader.index.sequences())
    }
}

impl ReferenceSource for Buffer {
    fn contigs(&self) -> Vec<(String, u64)> {
        self.sequences()
            .map(|sequences| {
                sequences
                    .into_iter()
                    .map(|sequence| (sequence.name, sequence.len))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Load given contig. This is O(1) if the contig was loaded before.
    fn contig_seq(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        let mut sequences = self
            .sequences
            .lock()
            .map_err(|_| anyhow!("Reference cache lock poisoned"))?;

        if let Some(sequence) = sequences.get(contig) {
            return Ok(Arc::clone(sequence));
        }
        if !self.sequences()?.iter().any(|sequence| sequence.name == contig) {
            return Err(unknown_contig(contig));
        }

        let mut sequence = Vec::new();
        {
            let mut reader = self
                .reader
                .write()
                .map_err(|_| anyhow!("Reference reader lock poisoned"))?;
            reader
                .fetch_all(contig)
                .and_then(|_| reader.read(&mut sequence))
                .with_context(|| {
                    format!(
                        "Failed to read contig {} from {}",
                        contig,
                        self.reference_path.display()
                    )
                })?;
        }
        let sequence = Arc::new(sequence);
        sequences.insert(contig.to_owned(), Arc::clone(&sequence));
        Ok(sequence)
    }
}

/// Reference sequences held in memory, in file order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    contigs: Vec<(String, Arc<Vec<u8>>)>,
}

impl InMemoryReference {
    pub fn new(contigs: Vec<(String, Vec<u8>)>) -> Self {
        InMemoryReference {
            contigs: contigs
                .into_iter()
                .map(|(name, seq)| (name, Arc::new(seq)))
                .collect(),
        }
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut contigs = Vec::new();
        for record in fasta::Reader::new(reader).records() {
            let record = record.context("Failed to parse FASTA record")?;
            contigs.push((record.id().to_owned(), record.seq().to_vec()));
        }
        Ok(InMemoryReference::new(contigs))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(path.as_ref())
            .with_context(|| format!("Failed to open reference {}", path.as_ref().display()))?;
        InMemoryReference::from_reader(io::BufReader::new(file))
    }
}

impl ReferenceSource for InMemoryReference {
    fn contigs(&self) -> Vec<(String, u64)> {
        self.contigs
            .iter()
            .map(|(name, seq)| (name.clone(), seq.len() as u64))
            .collect()
    }

    fn contig_seq(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        self.contigs
            .iter()
            .find(|(name, _)| name == contig)
            .map(|(_, seq)| Arc::clone(seq))
            .ok_or_else(|| unknown_contig(contig))
    }
}

/// A FASTA reference, indexed if a `.fai` index is present next to it and
/// loaded into memory otherwise.
pub enum FastaReference {
    Indexed(Buffer),
    InMemory(InMemoryReference),
}

impl FastaReference {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut index_path = path.as_os_str().to_owned();
        index_path.push(".fai");
        if Path::new(&index_path).exists() {
            Ok(FastaReference::Indexed(Buffer::from_path(
                path,
                REFERENCE_BUFFER_CAPACITY,
            )?))
        } else {
            info!(
                "No index found for reference {}, loading it into memory",
                path.display()
            );
            Ok(FastaReference::InMemory(InMemoryReference::from_path(path)?))
        }
    }
}

impl ReferenceSource for FastaReference {
    fn contigs(&self) -> Vec<(String, u64)> {
        match self {
            FastaReference::Indexed(buffer) => buffer.contigs(),
            FastaReference::InMemory(reference) => reference.contigs(),
        }
    }

    fn contig_seq(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        match self {
            FastaReference::Indexed(buffer) => buffer.contig_seq(contig),
            FastaReference::InMemory(reference) => reference.contig_seq(contig),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FASTA: &[u8] = b">chr1 first\nACGTGATACA\n>chr2\nTTAGGC\nTTAG\n";

    #[test]
    fn test_in_memory_reference() {
        let reference = InMemoryReference::from_reader(FASTA).unwrap();
        assert_eq!(
            reference.contigs(),
            vec![("chr1".to_owned(), 10), ("chr2".to_owned(), 10)]
        );
        assert_eq!(reference.fetch("chr1", 2, 5).unwrap(), b"GTG".to_vec());
        assert_eq!(reference.fetch("chr2", 0, 10).unwrap(), b"TTAGGCTTAG".to_vec());
    }

    #[test]
    fn test_fetch_is_clamped() {
        let reference = InMemoryReference::from_reader(FASTA).unwrap();
        assert_eq!(reference.fetch("chr1", -3, 2).unwrap(), b"AC".to_vec());
        assert_eq!(reference.fetch("chr1", 8, 20).unwrap(), b"CA".to_vec());
        assert!(reference.fetch("chr1", 12, 20).unwrap().is_empty());
        assert!(reference.fetch("chr1", -5, -1).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_contig() {
        let reference = InMemoryReference::from_reader(FASTA).unwrap();
        let err = reference.fetch("chrX", 0, 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::UnknownReferenceContig {
                contig: "chrX".to_owned()
            })
        );
    }

    #[test]
    fn test_indexed_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b">chr1\nACGTGATACA\n>chr2\nTTAGGC\n").unwrap();
        // chromosome, length, offset, line bases, line width
        fs::write(
            dir.path().join("ref.fa.fai"),
            "chr1\t10\t6\t10\t11\nchr2\t6\t23\t6\t7\n",
        )
        .unwrap();

        let buffer = Buffer::from_path(&path, 1).unwrap();
        assert_eq!(
            buffer.contigs(),
            vec![("chr1".to_owned(), 10), ("chr2".to_owned(), 6)]
        );
        assert_eq!(buffer.fetch("chr1", 3, 6).unwrap(), b"TGA".to_vec());
        assert_eq!(buffer.fetch("chr2", 0, 100).unwrap(), b"TTAGGC".to_vec());
        // evicted and reloaded
        assert_eq!(buffer.fetch("chr1", 0, 2).unwrap(), b"AC".to_vec());
        assert!(buffer.fetch("chrX", 0, 2).is_err());
    }

    #[test]
    fn test_fasta_reference_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa");
        fs::write(&path, FASTA).unwrap();
        let reference = FastaReference::from_path(&path).unwrap();
        assert!(matches!(reference, FastaReference::InMemory(_)));
        assert_eq!(reference.fetch("chr2", 4, 8).unwrap(), b"GCTT".to_vec());
    }
}
