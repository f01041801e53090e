//! Building a signature store with progress reporting.
//!
//! Demonstrates polling a `ProgressTracker` from a separate thread while
//! `build-store`'s genome-reading pass runs, so a caller can show a
//! progress indicator for a large batch of assemblies.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example progress_bar -- out.gs genome1.fasta genome2.fasta ...
//! ```

use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gambit::concurrency::WorkerPool;
use gambit::kmer::KmerSpec;
use gambit::progress::{CancellationToken, ProgressTracker};
use gambit::store::CompressionMode;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <output.gs> <genome.fasta>...", args[0]);
        process::exit(1);
    }
    let output = std::path::PathBuf::from(&args[1]);
    let inputs: Vec<std::path::PathBuf> = args[2..].iter().map(std::path::PathBuf::from).collect();

    let spec = KmerSpec::default_spec();
    let pool = WorkerPool::new(0).expect("worker pool");
    let token = CancellationToken::new();

    // `run_build_store` takes ownership of its own internal tracker, so for
    // a live progress display we drive the same read-then-scan steps here
    // rather than through the convenience wrapper.
    let tracker = Arc::new(ProgressTracker::new());
    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let reporter_tracker = Arc::clone(&tracker);
    let reporter_done = Arc::clone(&done);
    let reporter = std::thread::spawn(move || {
        while !reporter_done.load(std::sync::atomic::Ordering::Relaxed) {
            let progress = reporter_tracker.snapshot();
            eprint!(
                "\r  genomes read: {:>6}  bases scanned: {:>12}",
                progress.sequences_processed, progress.bases_processed
            );
            let _ = io::stderr().flush();
            std::thread::sleep(Duration::from_millis(100));
        }
    });

    let start = Instant::now();
    let mut ids = Vec::with_capacity(inputs.len());
    let mut contigs_per_genome = Vec::with_capacity(inputs.len());
    for path in &inputs {
        match gambit::fasta::read_genome(path) {
            Ok(genome) => {
                let bases: u64 = genome.contigs.iter().map(|c| c.len() as u64).sum();
                tracker.record_sequence(bases);
                ids.push(genome.accession);
                contigs_per_genome.push(genome.contigs);
            }
            Err(e) => {
                eprintln!("\nerror reading {}: {e}", path.display());
                process::exit(1);
            }
        }
    }

    let signatures = gambit::signature::calc_signatures_parallel(&spec, &contigs_per_genome, &pool, &token)
        .into_iter()
        .map(|s| s.expect("not cancelled"))
        .collect::<Vec<_>>();

    done.store(true, std::sync::atomic::Ordering::Relaxed);
    reporter.join().expect("reporter thread panicked");

    gambit::store::create(&output, &spec, &signatures, Some(&ids), None, CompressionMode::None)
        .expect("failed to write signature store");

    eprintln!("\nwrote {} signatures to {} in {:.2?}", signatures.len(), output.display(), start.elapsed());
}
