//! Signature file format.
//!
//! A durable, random-access container for a `SignatureArray` plus metadata:
//! a versioned header, a `KmerSpec` record, a `bounds` array, a `values`
//! array (optionally gzip-compressed in fixed-size blocks), optional
//! per-signature string IDs, and an optional JSON metadata blob.
//!
//! Backed by `memmap2` for constant-time `open` and zero-copy `get` on the
//! uncompressed path.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use memmap2::Mmap;

use crate::error::GambitError;
use crate::kmer::{IndexDtype, KmerSpec};
use crate::signature::Signature;

const MAGIC: &[u8; 8] = b"GAMBITSG";
const VERSION: u32 = 1;

const FLAG_HAS_IDS: u32 = 1 << 0;
const FLAG_COMPRESSED: u32 = 1 << 1;

/// Whether a store's `values` section is stored raw or in gzip-compressed
/// blocks, each indexed by `(compressed_offset, compressed_len,
/// first_signature_index)` so random access decompresses only the
/// containing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    None,
    Gzip { signatures_per_block: u32 },
}

/// Capability set shared by every signature container the Jaccard engine
/// (`crate::jaccard`) runs against: mapped-file, in-memory, or compressed.
/// Implementers decide their own storage; the engine is generic over this
/// trait rather than a concrete type.
pub trait SignatureContainer: Send + Sync {
    /// Number of signatures in the container.
    fn len(&self) -> usize;

    /// `true` if the container holds no signatures.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the `i`th signature. Borrowed (zero-copy) for uncompressed
    /// stores and in-memory containers; owned only for the compressed path,
    /// where a block must be decompressed first.
    fn get(&self, i: usize) -> Cow<'_, [u64]>;
}

/// A mapped, read-only view of a `.gs` signature file.
pub struct SignatureStore {
    mmap: Mmap,
    spec: KmerSpec,
    n: u64,
    bounds_offset: usize,
    values_offset: usize,
    compression: CompressionMode,
    block_index: Vec<BlockEntry>,
    ids: Option<Vec<String>>,
    metadata: Option<serde_json::Value>,
    decompress_cache: Mutex<Option<(usize, Vec<u8>)>>,
}

#[derive(Debug, Clone, Copy)]
struct BlockEntry {
    first_signature_index: u64,
    compressed_offset: u64,
    compressed_len: u64,
    uncompressed_len: u64,
}

impl SignatureStore {
    /// Opens a signature file, memory-mapping it and parsing the header and
    /// index structures (bounds, block index, ids, metadata), then walks
    /// every signature once to check it is strictly sorted and in range —
    /// `values` itself stays in the mapping rather than being copied out.
    ///
    /// # Errors
    ///
    /// Returns `GambitError::CorruptSignatureFile` if the magic, version,
    /// or any structural invariant (monotone bounds, per-signature sortedness,
    /// in-range values) does not hold, and `GambitError::Io` for filesystem
    /// failures.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GambitError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GambitError::io(e, path))?;
        // SAFETY: the file is opened read-only and not concurrently
        // truncated by this process; `memmap2::Mmap::map` documents this
        // as the caller's responsibility.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| GambitError::io(e, path))?;

        let mut cursor = Cursor::new(&mmap);
        let magic = cursor.take(path, 8)?;
        if magic != MAGIC {
            return corrupt(path, "bad magic bytes");
        }
        let version = cursor.u32(path)?;
        if version != VERSION {
            return corrupt(path, &format!("unsupported version {version}"));
        }
        let flags = cursor.u32(path)?;

        let prefix_len = cursor.u8(path)? as usize;
        let prefix = cursor.take(path, prefix_len)?.to_vec();
        let k = cursor.u8(path)?;
        let dtype_tag = cursor.u8(path)?;
        let dtype = IndexDtype::from_tag(dtype_tag)
            .ok_or_else(|| GambitError::CorruptSignatureFile {
                path: path.to_path_buf(),
                details: format!("unknown index dtype tag {dtype_tag}"),
            })?;
        let spec = KmerSpec::new(&prefix, k).map_err(|_| GambitError::CorruptSignatureFile {
            path: path.to_path_buf(),
            details: "invalid KmerSpec in header".into(),
        })?;
        if spec.index_dtype() != dtype {
            return corrupt(path, "stored dtype does not match (prefix, k)");
        }

        let n = cursor.u64(path)?;

        let bounds_offset = cursor.pos();
        let mut bounds = Vec::with_capacity(n as usize + 1);
        for _ in 0..=n {
            bounds.push(cursor.u64(path)?);
        }
        for w in bounds.windows(2) {
            if w[0] > w[1] {
                return corrupt(path, "bounds array is not monotone non-decreasing");
            }
        }
        if bounds[0] != 0 {
            return corrupt(path, "bounds[0] must be 0");
        }
        let total_values = bounds[n as usize];

        let compressed = flags & FLAG_COMPRESSED != 0;
        let (compression, block_index, values_offset) = if compressed {
            let block_count = cursor.u32(path)?;
            let mut blocks = Vec::with_capacity(block_count as usize);
            for _ in 0..block_count {
                blocks.push(BlockEntry {
                    first_signature_index: cursor.u64(path)?,
                    compressed_offset: cursor.u64(path)?,
                    compressed_len: cursor.u64(path)?,
                    uncompressed_len: cursor.u64(path)?,
                });
            }
            #[allow(clippy::cast_possible_truncation)]
            let signatures_per_block = match blocks.as_slice() {
                [first, second, ..] => (second.first_signature_index - first.first_signature_index) as u32,
                _ => n as u32,
            };
            let values_offset = cursor.pos();
            let total_compressed: u64 = blocks.iter().map(|b| b.compressed_len).sum();
            cursor.skip(path, total_compressed as usize)?;
            (
                CompressionMode::Gzip {
                    signatures_per_block,
                },
                blocks,
                values_offset,
            )
        } else {
            let values_offset = cursor.pos();
            let byte_len = total_values as usize * dtype.byte_width();
            cursor.skip(path, byte_len)?;
            (CompressionMode::None, Vec::new(), values_offset)
        };

        let ids = if flags & FLAG_HAS_IDS != 0 {
            let mut ids = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let len = cursor.u32(path)? as usize;
                let bytes = cursor.take(path, len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| GambitError::CorruptSignatureFile {
                        path: path.to_path_buf(),
                        details: "non-UTF-8 signature id".into(),
                    })?
                    .to_owned();
                ids.push(s);
            }
            Some(ids)
        } else {
            None
        };

        let metadata_len = cursor.u32(path)? as usize;
        let metadata = if metadata_len > 0 {
            let bytes = cursor.take(path, metadata_len)?;
            Some(serde_json::from_slice(bytes)?)
        } else {
            None
        };

        let store = Self {
            mmap,
            spec,
            n,
            bounds_offset,
            values_offset,
            compression,
            block_index,
            ids,
            metadata,
            decompress_cache: Mutex::new(None),
        };
        store.validate_signatures(path)?;
        Ok(store)
    }

    /// Checks that every stored signature is strictly sorted and that every
    /// value falls within `[0, 4^k)`.
    fn validate_signatures(&self, path: &Path) -> Result<(), GambitError> {
        let nkmers = self.spec.nkmers();
        for i in 0..self.n as usize {
            let sig = self.get(i);
            for w in sig.windows(2) {
                if w[0] >= w[1] {
                    return corrupt(path, &format!("signature {i} is not strictly sorted"));
                }
            }
            if let Some(&last) = sig.last() {
                if u128::from(last) >= nkmers {
                    return corrupt(path, &format!("signature {i} contains a value out of range for k"));
                }
            }
        }
        Ok(())
    }

    /// Number of signatures in this store.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.n
    }

    /// `true` if the store holds no signatures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// The `KmerSpec` shared by every signature in this store.
    #[must_use]
    pub fn spec(&self) -> &KmerSpec {
        &self.spec
    }

    /// The per-signature string IDs, if the store was written with any.
    #[must_use]
    pub fn ids(&self) -> Option<&[String]> {
        self.ids.as_deref()
    }

    /// The free-form JSON metadata blob, if the store was written with one.
    #[must_use]
    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    fn bound(&self, i: usize) -> u64 {
        let off = self.bounds_offset + i * 8;
        u64::from_le_bytes(self.mmap[off..off + 8].try_into().unwrap())
    }

    fn read_uncompressed(&self, i: usize) -> Vec<u64> {
        let start = self.bound(i) as usize;
        let end = self.bound(i + 1) as usize;
        let width = self.spec.index_dtype().byte_width();
        let base = self.values_offset + start * width;
        (0..end - start)
            .map(|j| {
                let off = base + j * width;
                match self.spec.index_dtype() {
                    IndexDtype::U16 => {
                        u64::from(u16::from_le_bytes(self.mmap[off..off + 2].try_into().unwrap()))
                    }
                    IndexDtype::U32 => {
                        u64::from(u32::from_le_bytes(self.mmap[off..off + 4].try_into().unwrap()))
                    }
                    IndexDtype::U64 => {
                        u64::from_le_bytes(self.mmap[off..off + 8].try_into().unwrap())
                    }
                }
            })
            .collect()
    }

    fn read_compressed(&self, i: usize) -> Vec<u64> {
        let first = self.bound(i) as usize;
        let last = self.bound(i + 1) as usize;
        let width = self.spec.index_dtype().byte_width();

        let block_idx = self
            .block_index
            .iter()
            .rposition(|b| (b.first_signature_index as usize) <= i)
            .unwrap_or(0);
        let block = self.block_index[block_idx];

        let mut guard = self.decompress_cache.lock().unwrap_or_else(|e| e.into_inner());
        if guard.as_ref().map(|(idx, _)| *idx) != Some(block_idx) {
            let start = self.values_offset + block.compressed_offset as usize;
            let end = start + block.compressed_len as usize;
            let mut decoder = GzDecoder::new(&self.mmap[start..end]);
            let mut out = Vec::with_capacity(block.uncompressed_len as usize);
            // The block was produced by this crate's own writer; a failure
            // here means the file is corrupt, which open() would already
            // have had no way to detect without fully decompressing every
            // block up front, so we tolerate the panic-free fallback of an
            // empty block on I/O error rather than threading a Result
            // through this cache helper.
            let _ = decoder.read_to_end(&mut out);
            *guard = Some((block_idx, out));
        }
        let block_bytes = &guard.as_ref().unwrap().1;

        // `block` signatures are packed back-to-back starting at the
        // block's first signature; offset within the block is relative to
        // that signature's own bound, not to signature 0's.
        let block_first_bound = self.bound(block.first_signature_index as usize) as usize;
        let rel_start = (first - block_first_bound) * width;
        let rel_end = (last - block_first_bound) * width;

        (0..(rel_end - rel_start) / width)
            .map(|j| {
                let off = rel_start + j * width;
                match self.spec.index_dtype() {
                    IndexDtype::U16 => u64::from(u16::from_le_bytes(
                        block_bytes[off..off + 2].try_into().unwrap(),
                    )),
                    IndexDtype::U32 => u64::from(u32::from_le_bytes(
                        block_bytes[off..off + 4].try_into().unwrap(),
                    )),
                    IndexDtype::U64 => {
                        u64::from_le_bytes(block_bytes[off..off + 8].try_into().unwrap())
                    }
                }
            })
            .collect()
    }

    /// Streams signatures in batches of `batch`, yielding `(start_index,
    /// Vec<Signature>)` pairs, for scans that should not hold the whole
    /// store's signatures in memory at once.
    pub fn iter_chunks(&self, batch: usize) -> impl Iterator<Item = (u64, Vec<Signature>)> + '_ {
        let batch = batch.max(1);
        let n = self.n as usize;
        (0..n).step_by(batch).map(move |start| {
            let end = (start + batch).min(n);
            let chunk = (start..end).map(|i| self.get(i).into_owned()).collect();
            (start as u64, chunk)
        })
    }
}

impl SignatureContainer for SignatureStore {
    fn len(&self) -> usize {
        self.n as usize
    }

    fn get(&self, i: usize) -> Cow<'_, [u64]> {
        // The mapped bytes are little-endian and dtype-width packed, not a
        // native-endian [u64] layout, so even the uncompressed path widens
        // through an owned Vec rather than aliasing the mapping directly:
        // there is no free reinterpretation across dtype widths.
        match self.compression {
            CompressionMode::None => Cow::Owned(self.read_uncompressed(i)),
            CompressionMode::Gzip { .. } => Cow::Owned(self.read_compressed(i)),
        }
    }
}

/// Writes a new `.gs` file atomically: staged to a temp path alongside
/// `path`, then renamed into place, so a reader never observes a partially
/// written file.
///
/// # Errors
///
/// Returns `GambitError::Io` on any filesystem failure.
pub fn create(
    path: impl AsRef<Path>,
    spec: &KmerSpec,
    signatures: &[Signature],
    ids: Option<&[String]>,
    metadata: Option<&serde_json::Value>,
    compression: CompressionMode,
) -> Result<(), GambitError> {
    let path = path.as_ref();
    let tmp_path = temp_path_for(path);
    {
        let file = File::create(&tmp_path).map_err(|e| GambitError::io(e, &tmp_path))?;
        let mut writer = BufWriter::new(file);
        write_store(&mut writer, spec, signatures, ids, metadata, compression)
            .map_err(|e| GambitError::io(e, &tmp_path))?;
        writer.flush().map_err(|e| GambitError::io(e, &tmp_path))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| GambitError::io(e, &tmp_path))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| GambitError::io(e, path))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[allow(clippy::too_many_lines)]
fn write_store<W: Write>(
    w: &mut W,
    spec: &KmerSpec,
    signatures: &[Signature],
    ids: Option<&[String]>,
    metadata: Option<&serde_json::Value>,
    compression: CompressionMode,
) -> std::io::Result<()> {
    let dtype = spec.index_dtype();
    let n = signatures.len() as u64;

    let mut flags = 0u32;
    if ids.is_some() {
        flags |= FLAG_HAS_IDS;
    }
    if matches!(compression, CompressionMode::Gzip { .. }) {
        flags |= FLAG_COMPRESSED;
    }

    w.write_all(MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&flags.to_le_bytes())?;

    #[allow(clippy::cast_possible_truncation)]
    w.write_all(&[spec.prefix().len() as u8])?;
    w.write_all(spec.prefix())?;
    w.write_all(&[spec.k()])?;
    w.write_all(&[dtype.tag()])?;
    w.write_all(&n.to_le_bytes())?;

    let mut bounds = Vec::with_capacity(signatures.len() + 1);
    let mut acc = 0u64;
    bounds.push(acc);
    for sig in signatures {
        acc += sig.len() as u64;
        bounds.push(acc);
    }
    for b in &bounds {
        w.write_all(&b.to_le_bytes())?;
    }

    match compression {
        CompressionMode::None => {
            for sig in signatures {
                write_values(w, sig, dtype)?;
            }
        }
        CompressionMode::Gzip {
            signatures_per_block,
        } => {
            let spb = signatures_per_block.max(1) as usize;
            let mut blocks = Vec::new();
            let mut compressed_payload = Vec::new();

            for (block_start, chunk) in signatures.chunks(spb).enumerate() {
                let first_signature_index = (block_start * spb) as u64;
                let mut raw = Vec::new();
                for sig in chunk {
                    write_values(&mut raw, sig, dtype)?;
                }
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&raw)?;
                let compressed = encoder.finish()?;

                blocks.push(BlockEntry {
                    first_signature_index,
                    compressed_offset: compressed_payload.len() as u64,
                    compressed_len: compressed.len() as u64,
                    uncompressed_len: raw.len() as u64,
                });
                compressed_payload.extend_from_slice(&compressed);
            }

            #[allow(clippy::cast_possible_truncation)]
            w.write_all(&(blocks.len() as u32).to_le_bytes())?;
            for b in &blocks {
                w.write_all(&b.first_signature_index.to_le_bytes())?;
                w.write_all(&b.compressed_offset.to_le_bytes())?;
                w.write_all(&b.compressed_len.to_le_bytes())?;
                w.write_all(&b.uncompressed_len.to_le_bytes())?;
            }
            w.write_all(&compressed_payload)?;
        }
    }

    if let Some(ids) = ids {
        for id in ids {
            let bytes = id.as_bytes();
            #[allow(clippy::cast_possible_truncation)]
            w.write_all(&(bytes.len() as u32).to_le_bytes())?;
            w.write_all(bytes)?;
        }
    }

    match metadata {
        Some(value) => {
            let bytes = serde_json::to_vec(value).unwrap_or_default();
            #[allow(clippy::cast_possible_truncation)]
            w.write_all(&(bytes.len() as u32).to_le_bytes())?;
            w.write_all(&bytes)?;
        }
        None => w.write_all(&0u32.to_le_bytes())?,
    }

    Ok(())
}

fn write_values<W: Write>(w: &mut W, sig: &Signature, dtype: IndexDtype) -> std::io::Result<()> {
    for &v in sig {
        match dtype {
            IndexDtype::U16 => w.write_all(&(v as u16).to_le_bytes())?,
            IndexDtype::U32 => w.write_all(&(v as u32).to_le_bytes())?,
            IndexDtype::U64 => w.write_all(&v.to_le_bytes())?,
        }
    }
    Ok(())
}

fn corrupt<T>(path: &Path, details: &str) -> Result<T, GambitError> {
    Err(GambitError::CorruptSignatureFile {
        path: path.to_path_buf(),
        details: details.to_owned(),
    })
}

/// A cursor over a byte slice with bounds-checked primitive reads, used
/// only while parsing a mapped file's header and index structures.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn take(&mut self, path: &Path, len: usize) -> Result<&'a [u8], GambitError> {
        if self.pos + len > self.bytes.len() {
            return Err(GambitError::CorruptSignatureFile {
                path: path.to_path_buf(),
                details: "unexpected end of file".into(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, path: &Path, len: usize) -> Result<(), GambitError> {
        self.take(path, len).map(|_| ())
    }

    fn u8(&mut self, path: &Path) -> Result<u8, GambitError> {
        Ok(self.take(path, 1)?[0])
    }

    fn u32(&mut self, path: &Path) -> Result<u32, GambitError> {
        Ok(u32::from_le_bytes(self.take(path, 4)?.try_into().unwrap()))
    }

    fn u64(&mut self, path: &Path) -> Result<u64, GambitError> {
        Ok(u64::from_le_bytes(self.take(path, 8)?.try_into().unwrap()))
    }
}
