//! Classifying one assembly against a reference database, using the
//! library API directly rather than going through the `gambit` binary.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic_count -- /path/to/db query.fasta
//! ```

use std::env;
use std::path::PathBuf;
use std::process;

use gambit::concurrency::WorkerPool;
use gambit::progress::CancellationToken;
use gambit::run;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <db_dir> <query.fasta>", args[0]);
        process::exit(1);
    }
    let db_dir = PathBuf::from(&args[1]);
    let query_path = PathBuf::from(&args[2]);

    let refdb = match run::open_refdb(&db_dir) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open reference database: {e}");
            process::exit(1);
        }
    };

    let pool = WorkerPool::new(0).expect("worker pool");
    let token = CancellationToken::new();
    let rows = match run::run_query(&refdb, &[query_path], false, &pool, &token) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("query failed: {e}");
            process::exit(1);
        }
    };

    for (query, distances, result) in &rows {
        let closest = refdb.genome(result.closest);
        println!("query: {query}");
        println!("  closest: {} (distance {:.4})", closest.accession, distances[result.closest]);
        match result.predicted {
            Some(taxon) => println!("  predicted: {}", refdb.taxonomy().get(taxon).name),
            None => println!("  predicted: (none)"),
        }
        if !result.warnings.is_empty() {
            println!("  warnings: {:?}", result.warnings);
        }
    }
}
