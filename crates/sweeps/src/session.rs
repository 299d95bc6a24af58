use foundation::{Generation, GenerationCounter, ModelSid, SweepId};
use futures::future::AbortHandle;

use crate::idmap::{IdentifierMap, MapBuild};
use crate::labels::LabelTable;
use crate::model::{ModelSelectError, ModelSelector};
use crate::table::ReconciliationTable;
use crate::tracker::{CurrentLocation, LocationTicket, LocationTracker, ResolvedLocation};

/// Everything derived from the active model, plus the generation that guards it.
///
/// All asynchronous results are applied through a method that takes the
/// generation they were started under; anything from an earlier generation is
/// dropped.
#[derive(Debug)]
pub struct Session {
    model: ModelSelector,
    generations: GenerationCounter,
    map: IdentifierMap,
    labels: LabelTable,
    table: ReconciliationTable,
    tracker: LocationTracker,
    follower: Option<AbortHandle>,
}

impl Session {
    pub fn new(model: ModelSid) -> Self {
        let mut generations = GenerationCounter::new();
        generations.advance();
        Self {
            model: ModelSelector::new(model),
            generations,
            map: IdentifierMap::new(),
            labels: LabelTable::new(),
            table: ReconciliationTable::default(),
            tracker: LocationTracker::new(),
            follower: None,
        }
    }

    pub fn model(&self) -> &ModelSid {
        self.model.active()
    }

    pub fn generation(&self) -> Generation {
        self.generations.current()
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generations.is_current(generation)
    }

    /// Invalidates all derived state, optionally switching model, and stops
    /// the location follower. Returns the new generation.
    pub fn reset(&mut self, model: Option<ModelSid>) -> Generation {
        if let Some(model) = model {
            self.model = ModelSelector::new(model);
        }
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
        self.map = IdentifierMap::new();
        self.labels = LabelTable::new();
        self.table = ReconciliationTable::default();
        self.tracker.reset();
        let generation = self.generations.advance();
        tracing::info!(model = %self.model(), %generation, "session reset");
        generation
    }

    /// Switches to the operator's model entry and resets. A rejected entry
    /// leaves the session untouched.
    pub fn select_model(&mut self, raw: &str) -> Result<Generation, ModelSelectError> {
        let previous = self.model.select(raw)?;
        tracing::debug!(%previous, model = %self.model(), "model selected");
        Ok(self.reset(None))
    }

    /// Installs a map build started under `generation`; a stale build is dropped.
    pub fn install(&mut self, generation: Generation, build: MapBuild) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(%generation, "dropping stale identifier map");
            return false;
        }
        self.table = ReconciliationTable::rebuild(&build.map, &build.labels);
        self.map = build.map;
        self.labels = build.labels;
        true
    }

    pub fn map(&self) -> &IdentifierMap {
        &self.map
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn table(&self) -> &ReconciliationTable {
        &self.table
    }

    pub fn current_location(&self) -> Option<&CurrentLocation> {
        self.tracker.current()
    }

    /// Starts resolving `sweep` for a caller working under `generation`.
    ///
    /// The ticket carries the caller's generation, so a sweep queried before a
    /// model switch is dropped by [`Session::apply_location`].
    pub fn observe_location(&mut self, generation: Generation, sweep: SweepId) -> LocationTicket {
        self.tracker.observe(sweep, &self.map, generation)
    }

    pub fn apply_location(&mut self, resolved: ResolvedLocation) -> bool {
        if !self.is_current(resolved.generation) {
            tracing::debug!(generation = %resolved.generation, "dropping stale location");
            return false;
        }
        self.tracker.apply(resolved)
    }

    /// Registers the task following location pushes so `reset` can stop it.
    ///
    /// A follower for a stale generation is aborted immediately.
    pub fn attach_follower(&mut self, generation: Generation, handle: AbortHandle) -> bool {
        if !self.is_current(generation) {
            handle.abort();
            return false;
        }
        if let Some(previous) = self.follower.replace(handle) {
            previous.abort();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Label;
    use crate::snapshot::{ShowcaseSnapshot, SnapshotShowcase, SnapshotSweep};
    use foundation::PanoId;

    fn build() -> MapBuild {
        let mut snap = ShowcaseSnapshot::new("m1");
        snap.sweeps.push(SnapshotSweep::new("s1", "p1", Some("Scan 1")));
        MapBuild {
            map: snap.identifier_map(),
            labels: snap.labels(),
            label_error: None,
        }
    }

    #[test]
    fn install_rebuilds_table() {
        let mut s = Session::new(ModelSid::new("m1"));
        assert!(s.table().is_empty());
        assert!(s.install(s.generation(), build()));
        assert_eq!(s.table().len(), 1);
        assert_eq!(s.map().get(&SweepId::new("s1")), Some(&PanoId::new("p1")));
        assert_eq!(s.labels().get(&SweepId::new("s1")), Some(&Label::Resolved("Scan 1".into())));
    }

    #[test]
    fn stale_build_is_dropped_after_reset() {
        let mut s = Session::new(ModelSid::new("m1"));
        let old = s.generation();
        let new = s.reset(Some(ModelSid::new("m2")));
        assert!(new > old);
        assert_eq!(s.model(), &ModelSid::new("m2"));
        assert!(!s.install(old, build()));
        assert!(s.table().is_empty());
    }

    #[test]
    fn select_model_resets_only_on_valid_entry() {
        let mut s = Session::new(ModelSid::new("m1"));
        s.install(s.generation(), build());
        let before = s.generation();

        assert!(s.select_model("  ").is_err());
        assert_eq!(s.generation(), before);
        assert_eq!(s.table().len(), 1);

        let after = s.select_model("https://my.matterport.com/show/?m=m2").unwrap();
        assert!(after > before);
        assert_eq!(s.model(), &ModelSid::new("m2"));
        assert!(s.table().is_empty());
    }

    #[test]
    fn reset_clears_everything_derived() {
        let mut s = Session::new(ModelSid::new("m1"));
        s.install(s.generation(), build());
        let ticket = s.observe_location(s.generation(), SweepId::new("s1"));
        let sc = SnapshotShowcase::new(ShowcaseSnapshot::new("m1"));
        assert!(s.apply_location(pollster::block_on(ticket.resolve(&sc))));
        assert!(s.current_location().is_some());

        s.reset(None);
        assert_eq!(s.model(), &ModelSid::new("m1"));
        assert!(s.map().is_empty());
        assert!(s.labels().is_empty());
        assert!(s.table().is_empty());
        assert!(s.current_location().is_none());
    }

    #[test]
    fn location_from_previous_generation_is_dropped() {
        let mut s = Session::new(ModelSid::new("m1"));
        s.install(s.generation(), build());
        let ticket = s.observe_location(s.generation(), SweepId::new("s1"));
        s.reset(None);
        let sc = SnapshotShowcase::new(ShowcaseSnapshot::new("m1"));
        assert!(!s.apply_location(pollster::block_on(ticket.resolve(&sc))));
        assert!(s.current_location().is_none());
    }

    #[test]
    fn ticket_from_older_generation_is_dropped_even_if_observed_later() {
        let mut s = Session::new(ModelSid::new("m1"));
        let old = s.generation();
        s.reset(Some(ModelSid::new("m2")));
        let ticket = s.observe_location(old, SweepId::new("s1"));
        let sc = SnapshotShowcase::new(ShowcaseSnapshot::new("m1"));
        assert!(!s.apply_location(pollster::block_on(ticket.resolve(&sc))));
        assert!(s.current_location().is_none());
    }

    #[test]
    fn reset_aborts_follower() {
        let mut s = Session::new(ModelSid::new("m1"));
        let (handle, registration) = AbortHandle::new_pair();
        assert!(s.attach_follower(s.generation(), handle));
        s.reset(None);
        let follower = futures::future::Abortable::new(futures::future::pending::<()>(), registration);
        assert!(pollster::block_on(follower).is_err());
    }

    #[test]
    fn stale_follower_is_aborted_on_attach() {
        let mut s = Session::new(ModelSid::new("m1"));
        let old = s.generation();
        s.reset(None);
        let (handle, registration) = AbortHandle::new_pair();
        assert!(!s.attach_follower(old, handle));
        let follower = futures::future::Abortable::new(futures::future::pending::<()>(), registration);
        assert!(pollster::block_on(follower).is_err());
    }
}
