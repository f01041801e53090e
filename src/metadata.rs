//! Genome/taxon metadata store.
//!
//! Exposes a `genome` table and a `taxon` table over two CSV files
//! (`genome.csv`, `taxon.csv`), parsed with `csv` + `serde`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::GambitError;
use crate::taxonomy::{Forest, Taxon, TaxonId};

/// A reference genome: a stable accession, a display description, the
/// index of its signature within the paired `SignatureStore`, and an
/// optional taxon assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    pub accession: String,
    pub description: String,
    pub signature_index: u64,
    pub taxon: Option<TaxonId>,
}

#[derive(Debug, Deserialize)]
struct GenomeRow {
    accession: String,
    description: String,
    signature_index: u64,
    taxon_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaxonRow {
    id: String,
    name: String,
    rank: String,
    ncbi_id: Option<u64>,
    parent_id: Option<String>,
    threshold: Option<f32>,
    report: bool,
}

/// The loaded, read-only genome/taxon metadata: a forest of taxa plus the
/// genomes bound to them, indexed by signature index for `O(1)` lookup from
/// a distance vector slot.
#[derive(Debug, Clone)]
pub struct GenomeMetadataStore {
    genomes_by_signature: Vec<Genome>,
    forest: Forest,
}

impl GenomeMetadataStore {
    /// Parses `taxon.csv` and `genome.csv` from `dir`, builds the taxonomy
    /// arena, and returns the combined store.
    ///
    /// # Errors
    ///
    /// Returns `GambitError::Csv`/`GambitError::Io` on malformed or missing
    /// files, and `GambitError::CorruptSignatureFile`-adjacent
    /// `GambitError::ReferenceMismatch`-class errors are *not* raised
    /// here — see [`GenomeMetadataStore::check_integrity`], which callers
    /// run once the paired `SignatureStore` is available.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, GambitError> {
        let dir = dir.as_ref();
        let taxon_path = dir.join("taxon.csv");
        let genome_path = dir.join("genome.csv");

        let mut forest = Forest::new();
        let mut id_map: HashMap<String, TaxonId> = HashMap::new();
        let mut pending_parents: Vec<(TaxonId, String)> = Vec::new();

        let mut reader =
            csv::Reader::from_path(&taxon_path).map_err(|e| GambitError::csv(e, &taxon_path))?;
        for record in reader.deserialize() {
            let row: TaxonRow = record.map_err(|e| GambitError::csv(e, &taxon_path))?;
            let taxon = Taxon {
                name: row.name,
                rank: row.rank,
                ncbi_id: row.ncbi_id,
                parent: None,
                children: Vec::new(),
                threshold: row.threshold,
                report: row.report,
            };
            let taxon_id = forest.insert(taxon);
            if let Some(parent_id) = row.parent_id.filter(|s| !s.is_empty()) {
                pending_parents.push((taxon_id, parent_id));
            }
            id_map.insert(row.id, taxon_id);
        }

        for (child, parent_id) in pending_parents {
            if let Some(&parent) = id_map.get(&parent_id) {
                forest.get_mut(child).parent = Some(parent);
                forest.add_child(parent, child);
            }
        }

        let mut genomes_by_signature: Vec<Genome> = Vec::new();
        let mut reader =
            csv::Reader::from_path(&genome_path).map_err(|e| GambitError::csv(e, &genome_path))?;
        for record in reader.deserialize() {
            let row: GenomeRow = record.map_err(|e| GambitError::csv(e, &genome_path))?;
            let taxon = row
                .taxon_id
                .filter(|s| !s.is_empty())
                .and_then(|id| id_map.get(&id).copied());
            let genome = Genome {
                accession: row.accession,
                description: row.description,
                signature_index: row.signature_index,
                taxon,
            };
            let idx = genome.signature_index as usize;
            if genomes_by_signature.len() <= idx {
                genomes_by_signature.resize(
                    idx + 1,
                    Genome {
                        accession: String::new(),
                        description: String::new(),
                        signature_index: 0,
                        taxon: None,
                    },
                );
            }
            genomes_by_signature[idx] = genome;
        }

        Ok(Self {
            genomes_by_signature,
            forest,
        })
    }

    /// Checks that the set of signature IDs carried by a `SignatureStore`
    /// equals the set of genome accessions in this metadata store, per
    /// the integrity check below.
    ///
    /// # Errors
    ///
    /// Returns `GambitError::ReferenceMismatch` on any discrepancy.
    pub fn check_integrity(&self, store_ids: Option<&[String]>) -> Result<(), GambitError> {
        let Some(store_ids) = store_ids else {
            return Ok(());
        };
        if store_ids.len() != self.genomes_by_signature.len() {
            return Err(GambitError::ReferenceMismatch {
                details: format!(
                    "store has {} signatures but metadata has {} genomes",
                    store_ids.len(),
                    self.genomes_by_signature.len()
                ),
            });
        }
        for (i, (store_id, genome)) in store_ids.iter().zip(&self.genomes_by_signature).enumerate() {
            if store_id != &genome.accession {
                return Err(GambitError::ReferenceMismatch {
                    details: format!(
                        "signature {i} id '{store_id}' does not match genome accession '{}'",
                        genome.accession
                    ),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn num_genomes(&self) -> usize {
        self.genomes_by_signature.len()
    }

    #[must_use]
    pub fn genome(&self, signature_index: usize) -> &Genome {
        &self.genomes_by_signature[signature_index]
    }

    #[must_use]
    pub fn taxon_of(&self, signature_index: usize) -> Option<TaxonId> {
        self.genomes_by_signature[signature_index].taxon
    }

    #[must_use]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }
}
