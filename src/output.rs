//! Result serialization.
//!
//! Renders one [`ClassificationResult`] per query into a CSV or JSON row:
//! `query`, `predicted.{name,rank,ncbi_id,threshold}`,
//! `closest.{distance,description}`, `next.{name,rank,ncbi_id,threshold}`.

use serde::Serialize;

use crate::classify::ClassificationResult;
use crate::error::GambitError;
use crate::refdb::ReferenceDb;
use crate::taxonomy::{Forest, TaxonId};

/// Output format selected on the CLI (`--format`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize, Default)]
struct TaxonFields {
    name: Option<String>,
    rank: Option<String>,
    ncbi_id: Option<u64>,
    threshold: Option<f32>,
}

impl TaxonFields {
    fn of(forest: &Forest, id: Option<TaxonId>) -> Self {
        match id {
            None => Self::default(),
            Some(id) => {
                let t = forest.get(id);
                Self {
                    name: Some(t.name.clone()),
                    rank: Some(t.rank.clone()),
                    ncbi_id: t.ncbi_id,
                    threshold: t.threshold,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResultRow {
    query: String,
    #[serde(rename = "predicted.name")]
    predicted_name: Option<String>,
    #[serde(rename = "predicted.rank")]
    predicted_rank: Option<String>,
    #[serde(rename = "predicted.ncbi_id")]
    predicted_ncbi_id: Option<u64>,
    #[serde(rename = "predicted.threshold")]
    predicted_threshold: Option<f32>,
    #[serde(rename = "closest.distance")]
    closest_distance: f32,
    #[serde(rename = "closest.description")]
    closest_description: String,
    #[serde(rename = "next.name")]
    next_name: Option<String>,
    #[serde(rename = "next.rank")]
    next_rank: Option<String>,
    #[serde(rename = "next.ncbi_id")]
    next_ncbi_id: Option<u64>,
    #[serde(rename = "next.threshold")]
    next_threshold: Option<f32>,
}

fn to_row(query: &str, refdb: &ReferenceDb, distances: &[f32], result: &ClassificationResult) -> ResultRow {
    let forest = refdb.taxonomy();
    let predicted = TaxonFields::of(forest, result.predicted);
    let next = TaxonFields::of(forest, result.next);
    let closest = refdb.genome(result.closest);

    ResultRow {
        query: query.to_owned(),
        predicted_name: predicted.name,
        predicted_rank: predicted.rank,
        predicted_ncbi_id: predicted.ncbi_id,
        predicted_threshold: predicted.threshold,
        closest_distance: distances[result.closest],
        closest_description: closest.description.clone(),
        next_name: next.name,
        next_rank: next.rank,
        next_ncbi_id: next.ncbi_id,
        next_threshold: next.threshold,
    }
}

/// Writes one CSV header line followed by one row per query.
///
/// # Errors
///
/// Returns `GambitError::Io` if the underlying writer fails.
pub fn write_csv<W: std::io::Write>(
    w: W,
    refdb: &ReferenceDb,
    rows: &[(String, Vec<f32>, ClassificationResult)],
) -> Result<(), GambitError> {
    let mut writer = csv::Writer::from_writer(w);
    for (query, distances, result) in rows {
        let row = to_row(query, refdb, distances, result);
        writer
            .serialize(&row)
            .map_err(|e| GambitError::csv(e, "<stdout>"))?;
    }
    writer.flush().map_err(|e| GambitError::io(e, "<stdout>"))?;
    Ok(())
}

/// Writes a JSON array with one object per query.
///
/// # Errors
///
/// Returns `GambitError::Json`/`GambitError::Io` on serialization or write
/// failure.
pub fn write_json<W: std::io::Write>(
    w: W,
    refdb: &ReferenceDb,
    rows: &[(String, Vec<f32>, ClassificationResult)],
) -> Result<(), GambitError> {
    let values: Vec<ResultRow> = rows
        .iter()
        .map(|(query, distances, result)| to_row(query, refdb, distances, result))
        .collect();
    serde_json::to_writer_pretty(w, &values)?;
    Ok(())
}
