//! Reference DB view.
//!
//! A read-only facade binding a [`SignatureStore`] to a
//! [`GenomeMetadataStore`], performing the integrity check once at load
//! time. This is an explicit value passed to each classifier call rather
//! than an ambient global.

use std::borrow::Cow;
use std::path::Path;

use serde_json::Value;

use crate::error::GambitError;
use crate::kmer::KmerSpec;
use crate::metadata::{Genome, GenomeMetadataStore};
use crate::store::{SignatureContainer, SignatureStore};
use crate::taxonomy::{Forest, TaxonId};

/// The read-only, loaded reference set: signatures, genome records, and the
/// taxonomy forest, bound together and integrity-checked.
pub struct ReferenceDb {
    store: SignatureStore,
    metadata: GenomeMetadataStore,
}

impl ReferenceDb {
    /// Opens the signature store at `signature_path` and the metadata
    /// tables in `metadata_dir`, checking that they agree before returning.
    ///
    /// # Errors
    ///
    /// Propagates `GambitError::CorruptSignatureFile`/`Csv`/`Io` from the
    /// underlying loads, and returns `GambitError::ReferenceMismatch` if the
    /// two disagree on genome identity.
    pub fn open(
        signature_path: impl AsRef<Path>,
        metadata_dir: impl AsRef<Path>,
    ) -> Result<Self, GambitError> {
        let store = SignatureStore::open(signature_path)?;
        let metadata = GenomeMetadataStore::load(metadata_dir)?;
        metadata.check_integrity(store.ids())?;
        Ok(Self { store, metadata })
    }

    /// Number of references in this DB.
    #[must_use]
    pub fn num_refs(&self) -> usize {
        self.store.len() as usize
    }

    /// The `i`th reference signature.
    #[must_use]
    pub fn signature(&self, i: usize) -> Cow<'_, [u64]> {
        self.store.get(i)
    }

    /// The genome record bound to reference `i`.
    #[must_use]
    pub fn genome(&self, i: usize) -> &Genome {
        self.metadata.genome(i)
    }

    /// The taxon assigned to reference `i`, if any.
    #[must_use]
    pub fn taxon_of(&self, i: usize) -> Option<TaxonId> {
        self.metadata.taxon_of(i)
    }

    /// The taxonomy forest backing this reference set.
    #[must_use]
    pub fn taxonomy(&self) -> &Forest {
        self.metadata.forest()
    }

    /// The `KmerSpec` every reference (and any query compared against it)
    /// must share.
    #[must_use]
    pub fn store_spec(&self) -> &KmerSpec {
        self.store.spec()
    }

    /// Opaque, passed-through parameters (e.g. `classification_version`)
    /// carried in the signature file's metadata blob.
    #[must_use]
    pub fn parameters(&self) -> Option<&Value> {
        self.store.metadata()
    }

    /// The underlying store, for callers (the Jaccard engine) that need
    /// the `SignatureContainer` capability set directly.
    #[must_use]
    pub fn store(&self) -> &dyn SignatureContainer {
        &self.store
    }
}
