//! Async flows that connect a [`Session`] to a live showcase.
//!
//! The session sits in a `RefCell` shared with the UI. Borrows are taken only
//! between awaits, never across one.

use std::cell::RefCell;

use credentials::SdkKey;
use foundation::{Generation, SweepId};
use futures::StreamExt;

use crate::error::{ConnectionError, ConversionError, QueryError};
use crate::idmap::{LabelPhaseError, build_identifier_map};
use crate::session::Session;
use crate::showcase::{Connector, Showcase, Subscription};
use crate::tracker::CurrentLocation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No SDK key is stored; the operator must enter one.
    MissingCredential,
    Connection(ConnectionError),
    Conversion(ConversionError),
    /// The session moved to another generation while loading.
    Superseded,
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::MissingCredential => {
                write!(f, "Please enter your Matterport SDK key to continue.")
            }
            LoadError::Connection(_) => write!(f, "Error loading Matterport Showcase."),
            LoadError::Conversion(_) => write!(f, "Error: Could not create ID map."),
            LoadError::Superseded => write!(f, "load superseded by a newer one"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Connection(err) => Some(err),
            LoadError::Conversion(err) => Some(err),
            _ => None,
        }
    }
}

/// A showcase connected and mapped for one generation.
#[derive(Debug)]
pub struct Loaded<S> {
    pub generation: Generation,
    pub showcase: S,
    /// Set when labels could not be fetched; the table then shows "N/A".
    pub label_error: Option<LabelPhaseError>,
}

/// Connects to the session's model and installs its identifier map.
pub async fn load_model<C: Connector>(
    session: &RefCell<Session>,
    connector: &C,
    key: Option<&SdkKey>,
) -> Result<Loaded<C::Showcase>, LoadError> {
    let key = key.ok_or(LoadError::MissingCredential)?;
    let (generation, model) = {
        let s = session.borrow();
        (s.generation(), s.model().clone())
    };
    tracing::info!(%model, %generation, key = %key.fingerprint(), "connecting showcase");

    let showcase = connector
        .connect(&model, key)
        .await
        .map_err(LoadError::Connection)?;
    if !session.borrow().is_current(generation) {
        return Err(LoadError::Superseded);
    }

    let build = build_identifier_map(&showcase)
        .await
        .map_err(LoadError::Conversion)?;
    let label_error = build.label_error.clone();
    if !session.borrow_mut().install(generation, build) {
        return Err(LoadError::Superseded);
    }

    Ok(Loaded {
        generation,
        showcase,
        label_error,
    })
}

/// Observes `sweep` under `generation`, resolves its label and applies the
/// result.
///
/// Returns the displayed location if this observation was applied.
pub async fn refresh_location<S: Showcase>(
    session: &RefCell<Session>,
    showcase: &S,
    generation: Generation,
    sweep: SweepId,
) -> Option<CurrentLocation> {
    let ticket = {
        let mut s = session.borrow_mut();
        if !s.is_current(generation) {
            tracing::debug!(%generation, %sweep, "dropping stale sweep observation");
            return None;
        }
        s.observe_location(generation, sweep)
    };
    let resolved = ticket.resolve(showcase).await;
    let mut s = session.borrow_mut();
    if s.apply_location(resolved) {
        s.current_location().cloned()
    } else {
        None
    }
}

/// One-off "where is the viewer now" query for the load running under
/// `generation`. An answer that arrives after a model switch is dropped.
pub async fn sync_current_location<S: Showcase>(
    session: &RefCell<Session>,
    showcase: &S,
    generation: Generation,
) -> Result<Option<CurrentLocation>, QueryError> {
    match showcase.current_sweep().await? {
        Some(sweep) => Ok(refresh_location(session, showcase, generation, sweep).await),
        None => Ok(None),
    }
}

/// Applies every pushed location until the stream ends or `generation` goes
/// stale. `on_update` runs after each applied change.
pub async fn follow_locations<S: Showcase>(
    session: &RefCell<Session>,
    showcase: &S,
    mut subscription: Subscription,
    generation: Generation,
    mut on_update: impl FnMut(&CurrentLocation),
) {
    while let Some(sweep) = subscription.next().await {
        if !session.borrow().is_current(generation) {
            break;
        }
        tracing::debug!(%sweep, "sweep changed");
        if let Some(location) = refresh_location(session, showcase, generation, sweep).await {
            on_update(&location);
        }
    }
    tracing::debug!(%generation, "location follower stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LabelError, MoveError};
    use crate::idmap::IdentifierMap;
    use crate::labels::Label;
    use crate::showcase::MoveOptions;
    use crate::snapshot::{ShowcaseSnapshot, SnapshotConnector, SnapshotShowcase, SnapshotSweep};
    use foundation::{ModelSid, PanoId};
    use pretty_assertions::assert_eq;

    fn snapshot(model: &str) -> ShowcaseSnapshot {
        let mut snap = ShowcaseSnapshot::new(model);
        snap.sweeps.push(SnapshotSweep::new("s1", "p1", Some("Scan 1")));
        snap.sweeps.push(SnapshotSweep::new("s2", "p2", Some("Scan 2")));
        snap.current = Some(SweepId::new("s2"));
        snap
    }

    fn key() -> SdkKey {
        SdkKey::parse("key").unwrap()
    }

    #[test]
    fn load_installs_table_and_syncs_location() {
        let session = RefCell::new(Session::new(ModelSid::new("m1")));
        let connector = SnapshotConnector::new([snapshot("m1")]);
        pollster::block_on(async {
            let loaded = load_model(&session, &connector, Some(&key())).await.unwrap();
            assert_eq!(loaded.label_error, None);
            assert_eq!(session.borrow().table().len(), 2);

            let location = sync_current_location(&session, &loaded.showcase, loaded.generation)
                .await
                .unwrap();
            assert_eq!(
                location,
                Some(CurrentLocation {
                    sweep_id: SweepId::new("s2"),
                    pano_id: Some(PanoId::new("p2")),
                    label: Label::Resolved("Scan 2".into()),
                })
            );
        });
    }

    #[test]
    fn missing_key_blocks_loading() {
        let session = RefCell::new(Session::new(ModelSid::new("m1")));
        let connector = SnapshotConnector::new([snapshot("m1")]);
        let err = pollster::block_on(load_model(&session, &connector, None)).unwrap_err();
        assert_eq!(err, LoadError::MissingCredential);
    }

    #[test]
    fn connection_and_conversion_errors_are_reported() {
        let session = RefCell::new(Session::new(ModelSid::new("nope")));
        let mut broken = snapshot("m1");
        broken.map_error = Some("boom".into());
        let connector = SnapshotConnector::new([broken]);

        let err = pollster::block_on(load_model(&session, &connector, Some(&key()))).unwrap_err();
        assert!(matches!(err, LoadError::Connection(_)));
        assert_eq!(err.to_string(), "Error loading Matterport Showcase.");

        session.borrow_mut().reset(Some(ModelSid::new("m1")));
        let err = pollster::block_on(load_model(&session, &connector, Some(&key()))).unwrap_err();
        assert!(matches!(err, LoadError::Conversion(_)));
        assert!(session.borrow().table().is_empty());
    }

    /// Switches the session's model while a connect is in flight.
    struct SwitchingConnector<'a> {
        inner: SnapshotConnector,
        session: &'a RefCell<Session>,
    }

    impl Connector for SwitchingConnector<'_> {
        type Showcase = SnapshotShowcase;

        async fn connect(
            &self,
            model: &ModelSid,
            key: &SdkKey,
        ) -> Result<SnapshotShowcase, ConnectionError> {
            self.session.borrow_mut().reset(Some(ModelSid::new("m2")));
            self.inner.connect(model, key).await
        }
    }

    #[test]
    fn model_switch_mid_load_discards_stale_result() {
        let session = RefCell::new(Session::new(ModelSid::new("m1")));
        let connector = SwitchingConnector {
            inner: SnapshotConnector::new([snapshot("m1"), snapshot("m2")]),
            session: &session,
        };
        let err = pollster::block_on(load_model(&session, &connector, Some(&key()))).unwrap_err();
        assert_eq!(err, LoadError::Superseded);
        assert!(session.borrow().table().is_empty());
        assert_eq!(session.borrow().model(), &ModelSid::new("m2"));
    }

    /// Switches the session's model while the current-sweep query is pending.
    struct SwitchingShowcase<'a> {
        inner: SnapshotShowcase,
        session: &'a RefCell<Session>,
    }

    impl Showcase for SwitchingShowcase<'_> {
        async fn create_id_map(&self) -> Result<IdentifierMap, ConversionError> {
            self.inner.create_id_map().await
        }

        async fn label_for(&self, sweep: &SweepId) -> Result<Option<String>, LabelError> {
            self.inner.label_for(sweep).await
        }

        async fn current_sweep(&self) -> Result<Option<SweepId>, QueryError> {
            self.session.borrow_mut().reset(Some(ModelSid::new("m2")));
            self.inner.current_sweep().await
        }

        fn subscribe_current_sweep(&self) -> Subscription {
            self.inner.subscribe_current_sweep()
        }

        async fn move_to(&self, sweep: &SweepId, options: MoveOptions) -> Result<(), MoveError> {
            self.inner.move_to(sweep, options).await
        }
    }

    #[test]
    fn model_switch_during_location_query_discards_old_sweep() {
        let session = RefCell::new(Session::new(ModelSid::new("m1")));
        let connector = SnapshotConnector::new([snapshot("m1")]);
        pollster::block_on(async {
            let loaded = load_model(&session, &connector, Some(&key())).await.unwrap();
            let showcase = SwitchingShowcase {
                inner: loaded.showcase,
                session: &session,
            };
            let location = sync_current_location(&session, &showcase, loaded.generation)
                .await
                .unwrap();
            assert_eq!(location, None);
        });
        assert_eq!(session.borrow().model(), &ModelSid::new("m2"));
        assert!(session.borrow().current_location().is_none());
    }

    #[test]
    fn follower_applies_pushes_until_stream_ends() {
        let session = RefCell::new(Session::new(ModelSid::new("m1")));
        let connector = SnapshotConnector::new([snapshot("m1")]);
        pollster::block_on(async {
            let loaded = load_model(&session, &connector, Some(&key())).await.unwrap();
            let (sink, subscription) = Subscription::channel(|| {});
            sink.push(SweepId::new("s1"));
            sink.push(SweepId::new("unknown"));
            drop(sink);

            let mut seen = Vec::new();
            follow_locations(&session, &loaded.showcase, subscription, loaded.generation, |l| {
                seen.push((l.sweep_id.clone(), l.pano_text().to_string()))
            })
            .await;

            assert_eq!(
                seen,
                vec![
                    (SweepId::new("s1"), "p1".to_string()),
                    (SweepId::new("unknown"), "N/A".to_string()),
                ]
            );
        });
    }

    #[test]
    fn follower_stops_on_stale_generation() {
        let session = RefCell::new(Session::new(ModelSid::new("m1")));
        let connector = SnapshotConnector::new([snapshot("m1")]);
        pollster::block_on(async {
            let loaded = load_model(&session, &connector, Some(&key())).await.unwrap();
            let subscription = loaded.showcase.subscribe_current_sweep();
            session.borrow_mut().reset(None);
            loaded
                .showcase
                .move_to(&SweepId::new("s1"), MoveOptions::default())
                .await
                .unwrap();

            let mut updates = 0;
            follow_locations(&session, &loaded.showcase, subscription, loaded.generation, |_| {
                updates += 1
            })
            .await;
            assert_eq!(updates, 0);
            assert!(session.borrow().current_location().is_none());
        });
    }
}
