//! FASTA/FASTQ input adapter.
//!
//! Supplies byte streams of one genome assembly's contigs to
//! `crate::signature::calc_signature`. Gzip is handled transparently by
//! extension; the underlying parser is picked by the `rust-bio` /
//! `needletail` feature switch.

use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::GambitError;

/// One genome assembly: a display accession (derived from the file stem)
/// and the raw nucleotide bytes of each contig/record.
#[derive(Debug, Clone)]
pub struct FastaGenome {
    pub accession: String,
    pub contigs: Vec<Vec<u8>>,
}

/// `true` if `path` ends in `.gz` (case-insensitive).
#[must_use]
fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn accession_from_path(path: &Path) -> String {
    let stem = path.file_stem().unwrap_or_else(|| OsStr::new("genome"));
    let stem_str = stem.to_string_lossy();
    // Strip a second extension left over from e.g. `foo.fasta.gz` ->
    // `foo.fasta` -> `foo`.
    Path::new(stem_str.as_ref())
        .file_stem()
        .map_or_else(|| stem_str.into_owned(), |s| s.to_string_lossy().into_owned())
}

/// Reads every contig of one genome assembly from a (optionally gzipped)
/// FASTA file.
///
/// # Errors
///
/// Returns `GambitError::Io` if the file cannot be opened or read, or if
/// the FASTA parser (`bio::io::fasta`, or `needletail` under the
/// `needletail` feature) reports malformed input.
pub fn read_genome(path: impl AsRef<Path>) -> Result<FastaGenome, GambitError> {
    let path = path.as_ref();
    let accession = accession_from_path(path);

    let bytes = read_all_bytes(path)?;
    let contigs = parse_fasta(&bytes, path)?;

    Ok(FastaGenome { accession, contigs })
}

fn read_all_bytes(path: &Path) -> Result<Vec<u8>, GambitError> {
    let file = File::open(path).map_err(|e| GambitError::io(e, path))?;
    let mut buf = Vec::new();
    if is_gzip_path(path) {
        GzDecoder::new(file)
            .read_to_end(&mut buf)
            .map_err(|e| GambitError::io(e, path))?;
    } else {
        std::io::BufReader::new(file)
            .read_to_end(&mut buf)
            .map_err(|e| GambitError::io(e, path))?;
    }
    Ok(buf)
}

#[cfg(feature = "needletail")]
fn parse_fasta(bytes: &[u8], path: &Path) -> Result<Vec<Vec<u8>>, GambitError> {
    let mut reader = needletail::parse_fastx_reader(bytes).map_err(|e| {
        GambitError::io(std::io::Error::other(e.to_string()), path)
    })?;
    let mut contigs = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| GambitError::io(std::io::Error::other(e.to_string()), path))?;
        contigs.push(record.seq().into_owned());
    }
    Ok(contigs)
}

#[cfg(not(feature = "needletail"))]
fn parse_fasta(bytes: &[u8], path: &Path) -> Result<Vec<Vec<u8>>, GambitError> {
    let reader = bio::io::fasta::Reader::new(bytes);
    let mut contigs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| GambitError::io(e, path))?;
        contigs.push(record.seq().to_vec());
    }
    Ok(contigs)
}
