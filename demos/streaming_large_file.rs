//! Streaming a large signature store in batches, rather than loading every
//! signature into memory at once.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example streaming_large_file -- references.gs
//! ```

use std::env;
use std::process;

use gambit::store::SignatureStore;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <references.gs>", args[0]);
        process::exit(1);
    }

    let store = match SignatureStore::open(&args[1]) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("failed to open store: {e}");
            process::exit(1);
        }
    };

    println!("store holds {} signatures under spec {}", store.len(), store.spec());

    let mut total_kmers = 0u64;
    let mut seen = 0u64;
    for (start, chunk) in store.iter_chunks(256) {
        for signature in &chunk {
            total_kmers += signature.len() as u64;
        }
        seen += chunk.len() as u64;
        eprint!("\r  processed {seen:>8} signatures (batch starting at {start})");
    }

    eprintln!();
    println!("total k-mers across all signatures: {total_kmers}");
}
