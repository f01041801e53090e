//! End-to-end CLI tests: drive the `gambit` binary itself (build a store,
//! then query it) rather than calling library functions directly.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::process::Command;

fn gambit_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gambit"))
}

fn write_fixture_db(dir: &std::path::Path) {
    let mut taxon_csv = std::fs::File::create(dir.join("taxon.csv")).unwrap();
    writeln!(taxon_csv, "id,name,rank,ncbi_id,parent_id,threshold,report").unwrap();
    writeln!(taxon_csv, "genus,Escherichia,genus,561,,0.3,true").unwrap();
    writeln!(taxon_csv, "species,Escherichia coli,species,562,genus,0.2,true").unwrap();

    let mut genome_csv = std::fs::File::create(dir.join("genome.csv")).unwrap();
    writeln!(genome_csv, "accession,description,signature_index,taxon_id").unwrap();
    writeln!(genome_csv, "ref0,E. coli K-12,0,species").unwrap();
}

#[test]
fn cli_help_flag() {
    let output = gambit_cmd().arg("--help").output().expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gambit"));
}

#[test]
fn cli_version_flag() {
    let output = gambit_cmd().arg("--version").output().expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_missing_subcommand_fails() {
    let output = gambit_cmd().output().expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn build_store_then_query_round_trips_through_the_binary() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture_db(dir.path());

    let genome_fasta = dir.path().join("ref0.fasta");
    std::fs::write(&genome_fasta, b">contig\nATGACAAAATGACCCC\n").unwrap();

    let store_path = dir.path().join("references.gs");
    let status = gambit_cmd()
        .args(["build-store", "--prefix", "ATGAC", "--k", "3", "--output"])
        .arg(&store_path)
        .arg(&genome_fasta)
        .status()
        .expect("failed to run build-store");
    assert!(status.success());
    assert!(store_path.exists());

    let query_fasta = dir.path().join("query.fasta");
    std::fs::write(&query_fasta, b">contig\nATGACAAAATGACCCC\n").unwrap();

    let output = gambit_cmd()
        .args(["query", "--db"])
        .arg(dir.path())
        .arg(&query_fasta)
        .output()
        .expect("failed to run query");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Escherichia coli"));
}

#[test]
fn query_without_db_fails_with_nonzero_exit() {
    let dir = tempfile::TempDir::new().unwrap();
    let query_fasta = dir.path().join("query.fasta");
    std::fs::write(&query_fasta, b">c\nACGT\n").unwrap();

    let output = gambit_cmd()
        .env_remove("GAMBIT_DB_PATH")
        .args(["query"])
        .arg(&query_fasta)
        .output()
        .expect("failed to run query");
    assert!(!output.status.success());
}

#[test]
fn query_against_corrupt_store_exits_with_code_two() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture_db(dir.path());
    std::fs::write(dir.path().join("references.gs"), b"NOT A GAMBIT FILE").unwrap();

    let query_fasta = dir.path().join("query.fasta");
    std::fs::write(&query_fasta, b">c\nACGT\n").unwrap();

    let output = gambit_cmd()
        .args(["query", "--db"])
        .arg(dir.path())
        .arg(&query_fasta)
        .output()
        .expect("failed to run query");
    assert_eq!(output.status.code(), Some(2));
}
