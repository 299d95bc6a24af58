use std::fs;
use std::path::PathBuf;

use clap::Parser;
use pretty_assertions::assert_eq;
use sweeps::{ShowcaseSnapshot, SnapshotSweep};
use tools::{Cli, Command, run};

fn write_snapshot(dir: &tempfile::TempDir, snap: &ShowcaseSnapshot) -> PathBuf {
    let path = dir.path().join("snapshot.json");
    fs::write(&path, snap.to_json_pretty().unwrap()).unwrap();
    path
}

fn sample() -> ShowcaseSnapshot {
    let mut snap = ShowcaseSnapshot::new("m1");
    snap.sweeps.push(SnapshotSweep::new("s10", "p10", Some("10")));
    snap.sweeps.push(SnapshotSweep::new("s2", "p2", Some("2")));
    snap.sweeps.push(SnapshotSweep::new("sx", "px", None));
    snap
}

fn run_args(args: &[&str]) -> Result<String, String> {
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    run(cli, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn parses_lookup_by_pano() {
    let cli = Cli::try_parse_from(["sweepmap", "lookup", "snap.json", "--pano", "p2"]).unwrap();
    match cli.command {
        Command::Lookup { snapshot, target } => {
            assert_eq!(snapshot, PathBuf::from("snap.json"));
            assert_eq!(target.pano.as_deref(), Some("p2"));
            assert_eq!(target.sweep, None);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn lookup_needs_exactly_one_target() {
    assert!(Cli::try_parse_from(["sweepmap", "lookup", "snap.json"]).is_err());
    assert!(
        Cli::try_parse_from(["sweepmap", "lookup", "snap.json", "--sweep", "a", "--pano", "b"])
            .is_err()
    );
}

#[test]
fn table_prints_sorted_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(&dir, &sample());
    let out = run_args(&["sweepmap", "table", path.to_str().unwrap()]).unwrap();
    assert_eq!(
        out,
        "Sweep #\tSweep ID\tPano ID\n2\ts2\tp2\n10\ts10\tp10\nN/A\tsx\tpx\n"
    );
}

#[test]
fn empty_table_prints_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(&dir, &ShowcaseSnapshot::new("m1"));
    let out = run_args(&["sweepmap", "table", path.to_str().unwrap()]).unwrap();
    assert_eq!(out, "No sweep ID conversions available.\n");
}

#[test]
fn export_writes_csv_in_table_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(&dir, &sample());
    let csv_path = dir.path().join("out.csv");
    let out = run_args(&[
        "sweepmap",
        "export",
        path.to_str().unwrap(),
        "--out",
        csv_path.to_str().unwrap(),
    ])
    .unwrap();

    assert!(out.starts_with("wrote "));
    assert!(out.contains("(3 rows, blake3="));
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        "\"Sweep #\",\"Sweep ID\",\"Pano ID\"\n\"2\",\"s2\",\"p2\"\n\"10\",\"s10\",\"p10\"\n\"N/A\",\"sx\",\"px\""
    );
}

#[test]
fn lookup_resolves_legacy_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(&dir, &sample());
    let out = run_args(&["sweepmap", "lookup", path.to_str().unwrap(), "--pano", " p10 "]).unwrap();
    assert_eq!(
        out,
        "Navigated to sweep with Legacy ID: p10\nSweep ID: s10\nPano ID: p10\nScan #: 10\n"
    );
}

#[test]
fn lookup_reports_unknown_legacy_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(&dir, &sample());
    let err = run_args(&["sweepmap", "lookup", path.to_str().unwrap(), "--pano", "nope"]).unwrap_err();
    assert_eq!(err, "Legacy Sweep ID \"nope\" not found.");
}

#[test]
fn lookup_reports_move_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut snap = sample();
    snap.move_errors.insert("s2".into(), "blocked".to_string());
    let path = write_snapshot(&dir, &snap);

    let err = run_args(&["sweepmap", "lookup", path.to_str().unwrap(), "--sweep", "s2"]).unwrap_err();
    assert_eq!(err, "Error navigating to sweep: blocked");
    let err = run_args(&["sweepmap", "lookup", path.to_str().unwrap(), "--sweep", "ghost"]).unwrap_err();
    assert_eq!(err, "Error navigating to sweep: Invalid Sweep ID");
}

#[test]
fn missing_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = run_args(&["sweepmap", "table", missing.to_str().unwrap()]).unwrap_err();
    assert!(err.starts_with("read "));
}
