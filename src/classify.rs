//! Classifier.
//!
//! From a distance vector over the reference set plus the reference DB's
//! taxonomy, produces a conservative prediction: the most specific
//! reportable taxon whose threshold is met, preferring no prediction over
//! a wrong one.

use crate::refdb::ReferenceDb;
use crate::taxonomy::TaxonId;

/// A non-fatal note about how a classification was (or was not) reached.
/// Never a `GambitError` — always surfaced only through
/// [`ClassificationResult::warnings`] — never a `GambitError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// `closest`'s taxon has an unset threshold.
    NoThreshold,
    /// Strict-mode reconciliation found multiple incomparable matching
    /// taxa and backed off to their common ancestor.
    InconsistentMatches,
    /// No taxon passed, even though some ancestor's threshold was in play.
    NoPrediction,
}

/// The classifier's output for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// The most specific reportable taxon meeting its threshold.
    pub predicted: Option<TaxonId>,
    /// The reference index that drove `predicted`, when a prediction was made.
    pub primary: Option<usize>,
    /// The reference index with minimum distance to the query (always
    /// present when the reference set is non-empty).
    pub closest: usize,
    /// The next most specific taxon that did not meet its threshold.
    pub next: Option<TaxonId>,
    pub warnings: Vec<Warning>,
}

/// Classifies a query against `refdb` given its pairwise `distances`
/// (`distances[i]` = distance to reference `i`). `distances.len()` must
/// equal `refdb.num_refs()`.
///
/// `strict` selects between the two reconciliation algorithms: in
/// non-strict mode, the prediction walks up from the single closest
/// reference's taxon; in strict mode, every reportable taxon with at least
/// one in-threshold reference anywhere in its subtree is a candidate, and
/// conflicting candidates are reconciled via their common ancestor.
///
/// Returns `None` if `distances` is empty (there is no reference set to
/// classify against).
#[must_use]
pub fn classify(refdb: &ReferenceDb, distances: &[f32], strict: bool) -> Option<ClassificationResult> {
    if distances.is_empty() {
        return None;
    }
    let closest = argmin(distances);
    if strict {
        Some(classify_strict(refdb, distances, closest))
    } else {
        Some(classify_non_strict(refdb, distances, closest))
    }
}

/// Index of the minimum-distance reference, tie-broken to the smallest
/// index.
fn argmin(distances: &[f32]) -> usize {
    let mut best = 0;
    for (i, &d) in distances.iter().enumerate().skip(1) {
        if d < distances[best] {
            best = i;
        }
    }
    best
}

fn classify_non_strict(refdb: &ReferenceDb, distances: &[f32], closest: usize) -> ClassificationResult {
    let dmin = distances[closest];
    let mut warnings = Vec::new();
    let mut predicted = None;
    let mut primary = None;
    let mut next = None;

    if let Some(start) = refdb.taxon_of(closest) {
        let forest = refdb.taxonomy();
        if forest.get(start).threshold.is_none() {
            warnings.push(Warning::NoThreshold);
        }

        let chain = std::iter::once(start).chain(forest.ancestors(start));
        let mut threshold_met_somewhere = false;
        for node in chain {
            let taxon = forest.get(node);
            match taxon.threshold {
                Some(tau) if tau >= dmin => {
                    threshold_met_somewhere = true;
                    if taxon.report {
                        predicted = Some(node);
                        primary = Some(closest);
                        break;
                    }
                }
                Some(tau) if tau < dmin && next.is_none() => {
                    next = Some(node);
                }
                _ => {}
            }
        }

        if predicted.is_none() && threshold_met_somewhere {
            warnings.push(Warning::NoPrediction);
        }
    }

    ClassificationResult {
        predicted,
        primary,
        closest,
        next,
        warnings,
    }
}

/// `true` if some reference in `t`'s subtree is within `t`'s own threshold
/// of the query.
fn taxon_has_match(refdb: &ReferenceDb, distances: &[f32], t: TaxonId) -> bool {
    let forest = refdb.taxonomy();
    let Some(tau) = forest.get(t).threshold else {
        return false;
    };
    (0..distances.len()).any(|i| {
        refdb
            .taxon_of(i)
            .is_some_and(|ti| forest.is_ancestor_or_self(t, ti) && distances[i] <= tau)
    })
}

fn classify_strict(refdb: &ReferenceDb, distances: &[f32], closest: usize) -> ClassificationResult {
    let forest = refdb.taxonomy();
    let mut warnings = Vec::new();

    let candidates: Vec<TaxonId> = forest
        .ids()
        .filter(|&t| forest.get(t).report && taxon_has_match(refdb, distances, t))
        .collect();

    // Keep only the deepest candidates: drop any candidate that is a
    // (strict) ancestor of another candidate, since the more specific one
    // already subsumes it.
    let reduced: Vec<TaxonId> = candidates
        .iter()
        .copied()
        .filter(|&t| {
            !candidates
                .iter()
                .any(|&other| other != t && forest.is_ancestor_or_self(t, other))
        })
        .collect();

    let predicted = match reduced.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => {
            warnings.push(Warning::InconsistentMatches);
            let backoff = many
                .iter()
                .copied()
                .reduce(|acc, t| forest.lowest_common_ancestor(acc, t).unwrap_or(acc));
            match backoff {
                Some(t) if forest.get(t).report && taxon_has_match(refdb, distances, t) => Some(t),
                _ => {
                    warnings.push(Warning::NoPrediction);
                    None
                }
            }
        }
    };

    let primary = predicted.map(|t| {
        (0..distances.len())
            .filter(|&i| refdb.taxon_of(i).is_some_and(|ti| forest.is_ancestor_or_self(t, ti)))
            .min_by(|&a, &b| distances[a].total_cmp(&distances[b]))
            .unwrap_or(closest)
    });

    ClassificationResult {
        predicted,
        primary,
        closest,
        next: None,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::KmerSpec;
    use crate::store::{self, CompressionMode};
    use std::io::Write;
    use tempfile::TempDir;

    fn build_db(dir: &Path) -> ReferenceDb {
        let mut taxon_csv = std::fs::File::create(dir.join("taxon.csv")).unwrap();
        writeln!(taxon_csv, "id,name,rank,ncbi_id,parent_id,threshold,report").unwrap();
        writeln!(taxon_csv, "genus,Escherichia,genus,,,0.3,true").unwrap();
        writeln!(taxon_csv, "species,Escherichia coli,species,,genus,0.2,true").unwrap();

        let mut genome_csv = std::fs::File::create(dir.join("genome.csv")).unwrap();
        writeln!(genome_csv, "accession,description,signature_index,taxon_id").unwrap();
        writeln!(genome_csv, "ref0,closest ref,0,species").unwrap();
        writeln!(genome_csv, "ref1,second ref,1,species").unwrap();
        writeln!(genome_csv, "ref2,third ref,2,species").unwrap();

        let spec = KmerSpec::new(b"ATGAC", 3).unwrap();
        let signature_path = dir.join("references.gs");
        store::create(
            &signature_path,
            &spec,
            &[vec![0u64], vec![1u64], vec![2u64]],
            Some(&["ref0".to_owned(), "ref1".to_owned(), "ref2".to_owned()]),
            None,
            CompressionMode::None,
        )
        .unwrap();

        ReferenceDb::open(&signature_path, dir).unwrap()
    }

    /// Like `build_db`, but with an extra, non-reportable `kingdom` ancestor
    /// above `genus` whose threshold can be met even when no reportable
    /// ancestor's is — the genuine taxonomy-gap case for `NoPrediction`.
    fn build_db_with_unreportable_kingdom(dir: &Path) -> ReferenceDb {
        let mut taxon_csv = std::fs::File::create(dir.join("taxon.csv")).unwrap();
        writeln!(taxon_csv, "id,name,rank,ncbi_id,parent_id,threshold,report").unwrap();
        writeln!(taxon_csv, "kingdom,Bacteria,kingdom,,,0.6,false").unwrap();
        writeln!(taxon_csv, "genus,Escherichia,genus,,kingdom,0.3,true").unwrap();
        writeln!(taxon_csv, "species,Escherichia coli,species,,genus,0.2,true").unwrap();

        let mut genome_csv = std::fs::File::create(dir.join("genome.csv")).unwrap();
        writeln!(genome_csv, "accession,description,signature_index,taxon_id").unwrap();
        writeln!(genome_csv, "ref0,closest ref,0,species").unwrap();
        writeln!(genome_csv, "ref1,second ref,1,species").unwrap();
        writeln!(genome_csv, "ref2,third ref,2,species").unwrap();

        let spec = KmerSpec::new(b"ATGAC", 3).unwrap();
        let signature_path = dir.join("references.gs");
        store::create(
            &signature_path,
            &spec,
            &[vec![0u64], vec![1u64], vec![2u64]],
            Some(&["ref0".to_owned(), "ref1".to_owned(), "ref2".to_owned()]),
            None,
            CompressionMode::None,
        )
        .unwrap();

        ReferenceDb::open(&signature_path, dir).unwrap()
    }

    use std::path::Path;

    #[test]
    fn s6_non_strict_predicts_species_when_closest_meets_threshold() {
        let dir = TempDir::new().unwrap();
        let db = build_db(dir.path());
        let result = classify(&db, &[0.1, 0.5, 0.9], false).unwrap();
        assert_eq!(result.closest, 0);
        let predicted = result.predicted.unwrap();
        assert_eq!(db.taxonomy().get(predicted).name, "Escherichia coli");
        assert!(result.next.is_none());
    }

    #[test]
    fn s7_non_strict_backs_off_to_genus_when_species_threshold_missed() {
        let dir = TempDir::new().unwrap();
        let db = build_db(dir.path());
        let result = classify(&db, &[0.25, 0.5, 0.9], false).unwrap();
        let predicted = result.predicted.unwrap();
        assert_eq!(db.taxonomy().get(predicted).name, "Escherichia");
        let next = result.next.unwrap();
        assert_eq!(db.taxonomy().get(next).name, "Escherichia coli");
    }

    #[test]
    fn non_strict_no_prediction_without_warning_when_query_is_far_from_everything() {
        let dir = TempDir::new().unwrap();
        let db = build_db(dir.path());
        let result = classify(&db, &[0.9, 0.95, 0.99], false).unwrap();
        assert!(result.predicted.is_none());
        assert!(!result.warnings.contains(&Warning::NoPrediction));
    }

    #[test]
    fn non_strict_no_prediction_warns_when_a_non_reportable_ancestor_threshold_is_met() {
        let dir = TempDir::new().unwrap();
        let db = build_db_with_unreportable_kingdom(dir.path());
        // species (0.2) and genus (0.3) both miss at dmin=0.5, but kingdom
        // (0.6, report=false) is met: a taxonomy gap, not a distant query.
        let result = classify(&db, &[0.5, 0.9, 0.9], false).unwrap();
        assert!(result.predicted.is_none());
        assert!(result.warnings.contains(&Warning::NoPrediction));
    }

    #[test]
    fn strict_predicts_species_when_one_matches() {
        let dir = TempDir::new().unwrap();
        let db = build_db(dir.path());
        let result = classify(&db, &[0.1, 0.9, 0.9], true).unwrap();
        let predicted = result.predicted.unwrap();
        assert_eq!(db.taxonomy().get(predicted).name, "Escherichia coli");
    }

    #[test]
    fn empty_distances_yields_no_result() {
        let dir = TempDir::new().unwrap();
        let db = build_db(dir.path());
        assert!(classify(&db, &[], false).is_none());
    }
}
