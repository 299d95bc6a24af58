//! Sweep identifier reconciliation for an embedded 3D showcase.
//!
//! The showcase itself is an external collaborator reached through the
//! [`Showcase`] and [`Connector`] traits; everything here is plain state and
//! async orchestration on a single thread.

pub mod driver;
pub mod error;
pub mod export;
pub mod idmap;
pub mod labels;
pub mod model;
pub mod navigate;
pub mod session;
pub mod showcase;
pub mod snapshot;
pub mod table;
pub mod tracker;

pub use driver::{LoadError, Loaded, follow_locations, load_model, refresh_location, sync_current_location};
pub use error::*;
pub use export::{encode_csv, export_file_name};
pub use idmap::{IdentifierMap, LabelPhaseError, MapBuild, build_identifier_map};
pub use labels::{Label, LabelTable, resolve_label, resolve_label_or_failed};
pub use model::{ModelSelectError, ModelSelector, ModelUrlError, model_from_showcase_url, showcase_url};
pub use navigate::{NavigateError, Navigated, NavigationMode, NavigationRequest, navigate};
pub use session::Session;
pub use showcase::{Connector, LocationSink, MoveOptions, Showcase, Subscription, Transition};
pub use snapshot::{ShowcaseSnapshot, SnapshotConnector, SnapshotShowcase, SnapshotSweep};
pub use table::{NO_CONVERSIONS, ReconciliationRow, ReconciliationTable, TableView, sort_rows};
pub use tracker::{CurrentLocation, LocationTicket, LocationTracker, ResolvedLocation};

pub use foundation::{Generation, ModelSid, PanoId, SweepId};
