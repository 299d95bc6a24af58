use foundation::{Generation, PanoId, SweepId};

use crate::idmap::IdentifierMap;
use crate::labels::{LABEL_MISSING, Label, resolve_label_or_failed};
use crate::showcase::Showcase;

/// What the "current location" panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentLocation {
    pub sweep_id: SweepId,
    pub pano_id: Option<PanoId>,
    pub label: Label,
}

impl CurrentLocation {
    pub fn pano_text(&self) -> &str {
        self.pano_id.as_ref().map_or(LABEL_MISSING, PanoId::as_str)
    }
}

/// A location change that has been observed but not yet resolved.
///
/// The pano id is taken from the map at observation time; only the label
/// needs a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTicket {
    pub generation: Generation,
    seq: u64,
    sweep_id: SweepId,
    pano_id: Option<PanoId>,
}

impl LocationTicket {
    pub fn sweep_id(&self) -> &SweepId {
        &self.sweep_id
    }

    /// Fetches the label. A failed lookup yields [`Label::Failed`] and still
    /// carries the pano id through.
    pub async fn resolve<S: Showcase>(self, showcase: &S) -> ResolvedLocation {
        let label = resolve_label_or_failed(showcase, &self.sweep_id).await;
        ResolvedLocation {
            generation: self.generation,
            seq: self.seq,
            location: CurrentLocation {
                sweep_id: self.sweep_id,
                pano_id: self.pano_id,
                label,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub generation: Generation,
    seq: u64,
    pub location: CurrentLocation,
}

/// Last-write-wins holder for the current location.
///
/// Writes are ordered by observation, not by completion: a resolution that
/// finishes after a later observation has already been applied is dropped, so
/// the displayed fields always come from a single observation.
#[derive(Debug, Default)]
pub struct LocationTracker {
    next_seq: u64,
    applied_seq: Option<u64>,
    current: Option<CurrentLocation>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CurrentLocation> {
        self.current.as_ref()
    }

    pub fn observe(
        &mut self,
        sweep_id: SweepId,
        map: &IdentifierMap,
        generation: Generation,
    ) -> LocationTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        let pano_id = map.get(&sweep_id).cloned();
        tracing::debug!(%sweep_id, seq, "location observed");
        LocationTicket {
            generation,
            seq,
            sweep_id,
            pano_id,
        }
    }

    /// Returns whether `resolved` replaced the displayed location.
    pub fn apply(&mut self, resolved: ResolvedLocation) -> bool {
        if self.applied_seq.is_some_and(|applied| resolved.seq <= applied) {
            tracing::debug!(seq = resolved.seq, "dropping superseded location");
            return false;
        }
        self.applied_seq = Some(resolved.seq);
        self.current = Some(resolved.location);
        true
    }

    pub fn reset(&mut self) {
        self.applied_seq = None;
        self.current = None;
    }
}
