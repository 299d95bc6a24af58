use std::collections::BTreeMap;

use foundation::{PanoId, SweepId};

use crate::idmap::IdentifierMap;
use crate::labels::{Label, LabelTable};

pub const NO_CONVERSIONS: &str = "No sweep ID conversions available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationRow {
    pub label: Label,
    pub sweep_id: SweepId,
    pub pano_id: PanoId,
}

impl ReconciliationRow {
    pub fn new(label: Label, sweep_id: SweepId, pano_id: PanoId) -> Self {
        Self {
            label,
            sweep_id,
            pano_id,
        }
    }

    fn sort_key(&self) -> SortKey {
        let lower = self.label.as_str().to_lowercase();
        SortKey {
            rank: Rank::of(&lower),
            lower,
            exact: self.label.as_str().to_string(),
            sweep_id: self.sweep_id.clone(),
        }
    }
}

/// Numbered labels first (ascending by value), then everything else.
///
/// Variant order matters: the derived `Ord` puts `Numbered` before `Unnumbered`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    /// First run of decimal digits with leading zeros stripped. Comparing
    /// `(len, digits)` orders by numeric value without overflow.
    Numbered { len: usize, digits: String },
    Unnumbered,
}

impl Rank {
    fn of(lower: &str) -> Self {
        let Some(start) = lower.find(|c: char| c.is_ascii_digit()) else {
            return Rank::Unnumbered;
        };
        let run = &lower[start..];
        let end = run.find(|c: char| !c.is_ascii_digit()).unwrap_or(run.len());
        let trimmed = run[..end].trim_start_matches('0');
        let digits = if trimmed.is_empty() { "0" } else { trimmed };
        Rank::Numbered {
            len: digits.len(),
            digits: digits.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    rank: Rank,
    lower: String,
    exact: String,
    sweep_id: SweepId,
}

/// Sorts rows into display order.
///
/// Equal numbers fall back to the lower-cased label, then the exact label,
/// then the sweep id, so the order is total and re-sorting is a no-op.
pub fn sort_rows(rows: &mut [ReconciliationRow]) {
    rows.sort_by_cached_key(ReconciliationRow::sort_key);
}

/// What the conversion table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableView<'a> {
    /// Render [`NO_CONVERSIONS`] instead of an empty grid.
    Placeholder,
    Rows(&'a [ReconciliationRow]),
}

/// Sorted (label, sweep id, pano id) projection of the identifier map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationTable {
    rows: Vec<ReconciliationRow>,
}

impl ReconciliationTable {
    pub fn rebuild(map: &IdentifierMap, labels: &LabelTable) -> Self {
        let mut rows: Vec<ReconciliationRow> = map
            .iter()
            .map(|(sweep, pano)| {
                let label = labels.get(sweep).cloned().unwrap_or(Label::Missing);
                ReconciliationRow::new(label, sweep.clone(), pano.clone())
            })
            .collect();
        sort_rows(&mut rows);

        let table = Self { rows };
        let duplicates = table.duplicate_pano_ids();
        if !duplicates.is_empty() {
            tracing::warn!(
                count = duplicates.len(),
                first = %duplicates[0],
                "pano ids map to several sweeps; reverse lookup takes the first row"
            );
        }
        table
    }

    pub fn rows(&self) -> &[ReconciliationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn view(&self) -> TableView<'_> {
        if self.rows.is_empty() {
            TableView::Placeholder
        } else {
            TableView::Rows(&self.rows)
        }
    }

    /// Sweep for `pano`: the first matching row in display order.
    pub fn reverse_lookup(&self, pano: &PanoId) -> Option<&SweepId> {
        self.rows
            .iter()
            .find(|row| &row.pano_id == pano)
            .map(|row| &row.sweep_id)
    }

    pub fn row_for_sweep(&self, sweep: &SweepId) -> Option<&ReconciliationRow> {
        self.rows.iter().find(|row| &row.sweep_id == sweep)
    }

    /// Pano ids that appear on more than one row, in sorted order.
    pub fn duplicate_pano_ids(&self) -> Vec<PanoId> {
        let mut counts: BTreeMap<&PanoId, usize> = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(&row.pano_id).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(pano, _)| pano.clone())
            .collect()
    }
}
