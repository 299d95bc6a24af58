use std::collections::BTreeMap;

use foundation::{PanoId, SweepId};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, LabelErrorKind};
use crate::labels::{Label, LabelTable, resolve_label};
use crate::showcase::Showcase;

/// Sweep id → pano id, as produced by the showcase for one model.
///
/// Keys are unique by construction. The map is replaced wholesale when the
/// model changes and is otherwise read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierMap {
    entries: BTreeMap<SweepId, PanoId>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sweep: &SweepId) -> Option<&PanoId> {
        self.entries.get(sweep)
    }

    pub fn contains(&self, sweep: &SweepId) -> bool {
        self.entries.contains_key(sweep)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SweepId, &PanoId)> {
        self.entries.iter()
    }

    pub fn sweeps(&self) -> impl Iterator<Item = &SweepId> {
        self.entries.keys()
    }
}

impl FromIterator<(SweepId, PanoId)> for IdentifierMap {
    fn from_iter<I: IntoIterator<Item = (SweepId, PanoId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The label phase failed as a whole; no labels were kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPhaseError {
    pub message: String,
}

impl std::fmt::Display for LabelPhaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not fetch sweep labels: {}", self.message)
    }
}

impl std::error::Error for LabelPhaseError {}

/// Result of a successful identifier map build.
///
/// When `label_error` is set, `labels` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapBuild {
    pub map: IdentifierMap,
    pub labels: LabelTable,
    pub label_error: Option<LabelPhaseError>,
}

/// Fetches the identifier map, then a label for every sweep in it.
///
/// Label lookups are dispatched together; an individual failure marks only
/// that sweep as [`Label::Failed`]. A lookup reporting the label service as
/// unavailable fails the whole phase and leaves the label table empty.
pub async fn build_identifier_map<S: Showcase>(showcase: &S) -> Result<MapBuild, ConversionError> {
    let map = showcase.create_id_map().await.inspect_err(|err| {
        tracing::error!(%err, "identifier map creation failed");
    })?;
    tracing::info!(sweeps = map.len(), "identifier map created");

    let (labels, label_error) = match fetch_labels(showcase, &map).await {
        Ok(labels) => (labels, None),
        Err(err) => {
            tracing::error!(%err, "label phase failed");
            (LabelTable::new(), Some(err))
        }
    };

    Ok(MapBuild {
        map,
        labels,
        label_error,
    })
}

async fn fetch_labels<S: Showcase>(
    showcase: &S,
    map: &IdentifierMap,
) -> Result<LabelTable, LabelPhaseError> {
    let lookups = map
        .sweeps()
        .map(move |sweep| async move { (sweep, resolve_label(showcase, sweep).await) });

    let mut labels = LabelTable::new();
    for (sweep, result) in join_all(lookups).await {
        let label = match result {
            Ok(label) => label,
            Err(err) if err.kind == LabelErrorKind::Unavailable => {
                return Err(LabelPhaseError {
                    message: err.message,
                });
            }
            Err(err) => {
                tracing::warn!(%sweep, %err, "label lookup failed");
                Label::Failed
            }
        };
        labels.insert(sweep.clone(), label);
    }
    Ok(labels)
}
