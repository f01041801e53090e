//! # gambit
//!
//! GAMBIT identifies bacterial genome assemblies by computing a compact
//! k-mer signature of each query and comparing it, under the Jaccard
//! distance, against a curated reference set; the closest reference plus a
//! taxonomy tree yields a taxonomic prediction.
//!
//! The library is organized around the six components of the core design:
//!
//! | Component | Module |
//! |---|---|
//! | C1 K-mer codec | [`kmer`] |
//! | C2 Signature builder | [`signature`] |
//! | C3 Jaccard engine | [`jaccard`] |
//! | C4 Signature store | [`store`] |
//! | C5 Reference DB view | [`refdb`], [`taxonomy`], [`metadata`] |
//! | C6 Classifier | [`classify`] |
//!
//! plus the ambient collaborators a runnable binary needs: [`fasta`] input,
//! [`output`] serialization, [`concurrency`] worker pools, [`progress`]
//! cancellation, [`error`] types, and the [`cli`]/[`run`] glue the `gambit`
//! binary (`main.rs`) is built from.
//!
//! Typical use, classifying one assembly against an on-disk reference set:
//!
//! ```no_run
//! use gambit::concurrency::WorkerPool;
//! use gambit::progress::CancellationToken;
//! use gambit::run;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), gambit::error::GambitError> {
//! let refdb = run::open_refdb(&PathBuf::from("db"))?;
//! let pool = WorkerPool::new(0)?;
//! let token = CancellationToken::new();
//! let rows = run::run_query(&refdb, &[PathBuf::from("query.fasta")], false, &pool, &token)?;
//! for (query, _distances, result) in &rows {
//!     println!("{query}: predicted={:?} closest={}", result.predicted, result.closest);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod cli;
pub mod concurrency;
pub mod error;
pub mod fasta;
pub mod jaccard;
pub mod kmer;
pub mod metadata;
pub mod output;
pub mod progress;
pub mod refdb;
pub mod run;
pub mod signature;
pub mod store;
pub mod taxonomy;
