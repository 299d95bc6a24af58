//! Offline showcase backed by a JSON snapshot.
//!
//! Used by the command line tool and by tests. Failures can be injected per
//! sweep so every error path of the panel can be exercised without a viewer.

use std::cell::RefCell;
use std::collections::BTreeMap;

use credentials::SdkKey;
use foundation::{ModelSid, PanoId, SweepId};
use serde::{Deserialize, Serialize};

use crate::error::{ConnectionError, ConversionError, LabelError, MoveError, QueryError};
use crate::idmap::IdentifierMap;
use crate::labels::{Label, LabelTable};
use crate::showcase::{Connector, LocationSink, MoveOptions, Showcase, Subscription};
use crate::table::ReconciliationTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSweep {
    pub sweep_id: SweepId,
    pub pano_id: PanoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SnapshotSweep {
    pub fn new(sweep_id: &str, pano_id: &str, label: Option<&str>) -> Self {
        Self {
            sweep_id: SweepId::new(sweep_id),
            pano_id: PanoId::new(pano_id),
            label: label.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowcaseSnapshot {
    pub model: ModelSid,
    #[serde(default)]
    pub sweeps: Vec<SnapshotSweep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<SweepId>,
    /// When set, building the identifier map fails with this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_error: Option<String>,
    /// Sweeps whose label lookup fails.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_errors: Vec<SweepId>,
    /// Every label lookup reports the service as unavailable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub label_service_down: bool,
    /// Sweeps whose move fails; an empty message means "no detail".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub move_errors: BTreeMap<SweepId, String>,
}

impl ShowcaseSnapshot {
    pub fn new(model: &str) -> Self {
        Self {
            model: ModelSid::new(model),
            sweeps: Vec::new(),
            current: None,
            map_error: None,
            label_errors: Vec::new(),
            label_service_down: false,
            move_errors: BTreeMap::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn identifier_map(&self) -> IdentifierMap {
        self.sweeps
            .iter()
            .map(|s| (s.sweep_id.clone(), s.pano_id.clone()))
            .collect()
    }

    /// Labels as a live showcase would resolve them, computed synchronously.
    pub fn labels(&self) -> LabelTable {
        if self.label_service_down {
            return LabelTable::new();
        }
        self.sweeps
            .iter()
            .map(|s| {
                let label = if self.label_errors.contains(&s.sweep_id) {
                    Label::Failed
                } else {
                    Label::from_service(s.label.clone())
                };
                (s.sweep_id.clone(), label)
            })
            .collect()
    }

    pub fn reconciliation_table(&self) -> ReconciliationTable {
        ReconciliationTable::rebuild(&self.identifier_map(), &self.labels())
    }

    fn sweep(&self, sweep: &SweepId) -> Option<&SnapshotSweep> {
        self.sweeps.iter().find(|s| &s.sweep_id == sweep)
    }
}

#[derive(Debug)]
pub struct SnapshotShowcase {
    snapshot: ShowcaseSnapshot,
    current: RefCell<Option<SweepId>>,
    moves: RefCell<Vec<SweepId>>,
    sinks: RefCell<Vec<LocationSink>>,
}

impl SnapshotShowcase {
    pub fn new(snapshot: ShowcaseSnapshot) -> Self {
        let current = snapshot.current.clone();
        Self {
            snapshot,
            current: RefCell::new(current),
            moves: RefCell::new(Vec::new()),
            sinks: RefCell::new(Vec::new()),
        }
    }

    /// Successful moves, oldest first.
    #[cfg(test)]
    pub fn moves(&self) -> Vec<SweepId> {
        self.moves.borrow().clone()
    }

    /// Changes the current sweep and notifies live subscribers.
    pub fn push_location(&self, sweep: SweepId) {
        *self.current.borrow_mut() = Some(sweep.clone());
        self.sinks
            .borrow_mut()
            .retain(|sink| sink.push(sweep.clone()));
    }
}

impl Showcase for SnapshotShowcase {
    async fn create_id_map(&self) -> Result<IdentifierMap, ConversionError> {
        match &self.snapshot.map_error {
            Some(message) => Err(ConversionError {
                message: message.clone(),
            }),
            None => Ok(self.snapshot.identifier_map()),
        }
    }

    async fn label_for(&self, sweep: &SweepId) -> Result<Option<String>, LabelError> {
        if self.snapshot.label_service_down {
            return Err(LabelError::unavailable("label service is down"));
        }
        if self.snapshot.label_errors.contains(sweep) {
            return Err(LabelError::item(format!("no label data for {sweep}")));
        }
        Ok(self.snapshot.sweep(sweep).and_then(|s| s.label.clone()))
    }

    async fn current_sweep(&self) -> Result<Option<SweepId>, QueryError> {
        Ok(self.current.borrow().clone())
    }

    fn subscribe_current_sweep(&self) -> Subscription {
        let (sink, subscription) = Subscription::channel(|| {});
        self.sinks.borrow_mut().push(sink);
        subscription
    }

    async fn move_to(&self, sweep: &SweepId, _options: MoveOptions) -> Result<(), MoveError> {
        if let Some(message) = self.snapshot.move_errors.get(sweep) {
            return Err(MoveError::new(message.as_str()));
        }
        if self.snapshot.sweep(sweep).is_none() {
            return Err(MoveError::default());
        }
        self.moves.borrow_mut().push(sweep.clone());
        self.push_location(sweep.clone());
        Ok(())
    }
}

/// Connects to snapshots by model id, accepting any key except `rejected_key`.
#[derive(Debug, Default)]
pub struct SnapshotConnector {
    pub models: BTreeMap<ModelSid, ShowcaseSnapshot>,
    pub rejected_key: Option<String>,
}

impl SnapshotConnector {
    pub fn new(snapshots: impl IntoIterator<Item = ShowcaseSnapshot>) -> Self {
        Self {
            models: snapshots
                .into_iter()
                .map(|snap| (snap.model.clone(), snap))
                .collect(),
            rejected_key: None,
        }
    }
}

impl Connector for SnapshotConnector {
    type Showcase = SnapshotShowcase;

    async fn connect(
        &self,
        model: &ModelSid,
        key: &SdkKey,
    ) -> Result<SnapshotShowcase, ConnectionError> {
        if self.rejected_key.as_deref() == Some(key.expose()) {
            return Err(ConnectionError {
                message: "invalid SDK key".to_string(),
            });
        }
        let snapshot = self.models.get(model).ok_or_else(|| ConnectionError {
            message: format!("unknown model {model}"),
        })?;
        Ok(SnapshotShowcase::new(snapshot.clone()))
    }
}
