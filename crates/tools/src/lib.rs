//! `sweepmap`: runs the sweep reconciliation core against an offline
//! showcase snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sweeps::{
    MoveOptions, NO_CONVERSIONS, NavigationMode, ReconciliationTable, ShowcaseSnapshot, SnapshotShowcase,
    TableView, Transition, encode_csv, export_file_name, navigate,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sweep and pano id reconciliation for showcase snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the sorted reconciliation table
    Table {
        /// Snapshot JSON file
        snapshot: PathBuf,
    },

    /// Write the reconciliation table as CSV
    Export {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Output path (default: sweep_id_map_<model>.csv in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Navigate the snapshot by sweep id or legacy pano id
    Lookup {
        /// Snapshot JSON file
        snapshot: PathBuf,

        #[command(flatten)]
        target: LookupTarget,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct LookupTarget {
    /// Sweep id to move to
    #[arg(long)]
    pub sweep: Option<String>,

    /// Legacy pano id to resolve and move to
    #[arg(long)]
    pub pano: Option<String>,
}

impl LookupTarget {
    fn query(&self) -> (&str, NavigationMode) {
        match (&self.sweep, &self.pano) {
            (Some(sweep), _) => (sweep, NavigationMode::Sweep),
            (None, Some(pano)) => (pano, NavigationMode::Pano),
            (None, None) => ("", NavigationMode::Sweep),
        }
    }
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<(), String> {
    match cli.command {
        Command::Table { snapshot } => cmd_table(&snapshot, out),
        Command::Export { snapshot, out: path } => cmd_export(&snapshot, path, out),
        Command::Lookup { snapshot, target } => cmd_lookup(&snapshot, &target, out),
    }
}

pub fn read_snapshot(path: &Path) -> Result<ShowcaseSnapshot, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    ShowcaseSnapshot::from_json(&raw).map_err(|e| format!("parse {path:?}: {e}"))
}

fn cmd_table(snapshot: &Path, out: &mut impl Write) -> Result<(), String> {
    let snap = read_snapshot(snapshot)?;
    let table = snap.reconciliation_table();
    write_table(&table, out).map_err(|e| format!("write: {e}"))
}

/// Tab separated, one row per line, or the placeholder when empty.
pub fn write_table(table: &ReconciliationTable, out: &mut impl Write) -> std::io::Result<()> {
    match table.view() {
        TableView::Placeholder => writeln!(out, "{NO_CONVERSIONS}"),
        TableView::Rows(rows) => {
            writeln!(out, "Sweep #\tSweep ID\tPano ID")?;
            for row in rows {
                writeln!(out, "{}\t{}\t{}", row.label, row.sweep_id, row.pano_id)?;
            }
            Ok(())
        }
    }
}

fn cmd_export(snapshot: &Path, path: Option<PathBuf>, out: &mut impl Write) -> Result<(), String> {
    let snap = read_snapshot(snapshot)?;
    let table = snap.reconciliation_table();
    let path = path.unwrap_or_else(|| PathBuf::from(export_file_name(&snap.model)));

    let file = fs::File::create(&path).map_err(|e| format!("create {path:?}: {e}"))?;
    let mut writer = HashingWriter::new(file);
    writer
        .write_all(encode_csv(table.rows()).as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| format!("write {path:?}: {e}"))?;

    tracing::info!(path = %path.display(), rows = table.len(), "csv exported");
    writeln!(
        out,
        "wrote {} ({} rows, blake3={})",
        path.display(),
        table.len(),
        writer.finalize_hex()
    )
    .map_err(|e| format!("write: {e}"))
}

fn cmd_lookup(snapshot: &Path, target: &LookupTarget, out: &mut impl Write) -> Result<(), String> {
    let snap = read_snapshot(snapshot)?;
    let table = snap.reconciliation_table();
    let showcase = SnapshotShowcase::new(snap);
    let (query, mode) = target.query();
    let options = MoveOptions {
        transition: Transition::Instant,
    };

    let navigated = pollster::block_on(navigate(Some(&showcase), &table, query, mode, options))
        .map_err(|e| e.to_string())?;
    writeln!(out, "{}", navigated.success_text()).map_err(|e| format!("write: {e}"))?;
    if let Some(row) = table.row_for_sweep(&navigated.sweep_id) {
        writeln!(out, "Sweep ID: {}", row.sweep_id).map_err(|e| format!("write: {e}"))?;
        writeln!(out, "Pano ID: {}", row.pano_id).map_err(|e| format!("write: {e}"))?;
        writeln!(out, "Scan #: {}", row.label).map_err(|e| format!("write: {e}"))?;
    }
    Ok(())
}

struct HashingWriter<W> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    fn finalize_hex(&self) -> String {
        let hex = self.hasher.finalize().to_hex();
        hex.as_str()[..16].to_string()
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
