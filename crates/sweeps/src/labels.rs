use std::collections::BTreeMap;

use foundation::SweepId;

use crate::error::LabelError;
use crate::showcase::Showcase;

pub const LABEL_MISSING: &str = "N/A";
pub const LABEL_FAILED: &str = "Error";

/// Human-readable sweep label ("Scan #"), or one of the two sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Resolved(String),
    Missing,
    Failed,
}

impl Label {
    /// Maps a raw service answer. Only absent or empty text counts as
    /// missing; whitespace is shown as given.
    pub fn from_service(raw: Option<String>) -> Self {
        match raw {
            Some(text) if !text.is_empty() => Label::Resolved(text),
            _ => Label::Missing,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Resolved(text) => text,
            Label::Missing => LABEL_MISSING,
            Label::Failed => LABEL_FAILED,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type LabelTable = BTreeMap<SweepId, Label>;

/// Fetches the label for one sweep.
///
/// The service's "no label" answer becomes [`Label::Missing`]; failures are
/// returned so callers can choose between degrading the entry and aborting.
pub async fn resolve_label<S: Showcase>(
    showcase: &S,
    sweep: &SweepId,
) -> Result<Label, LabelError> {
    let raw = showcase.label_for(sweep).await?;
    tracing::trace!(%sweep, label = ?raw, "label resolved");
    Ok(Label::from_service(raw))
}

/// Like [`resolve_label`] but a failure degrades to [`Label::Failed`].
pub async fn resolve_label_or_failed<S: Showcase>(showcase: &S, sweep: &SweepId) -> Label {
    match resolve_label(showcase, sweep).await {
        Ok(label) => label,
        Err(err) => {
            tracing::warn!(%sweep, %err, "label lookup failed");
            Label::Failed
        }
    }
}
