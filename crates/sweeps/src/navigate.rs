use foundation::{PanoId, SweepId};

use crate::error::MoveError;
use crate::showcase::{MoveOptions, Showcase};
use crate::table::ReconciliationTable;

/// Which identifier scheme the operator typed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NavigationMode {
    Sweep,
    Pano,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateError {
    NotConnected,
    EmptyQuery(NavigationMode),
    /// No row carries this pano id; nothing was sent to the showcase.
    NotFound(PanoId),
    Move {
        mode: NavigationMode,
        error: MoveError,
    },
}

impl std::fmt::Display for NavigateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigateError::NotConnected => write!(f, "Matterport Showcase not yet loaded."),
            NavigateError::EmptyQuery(NavigationMode::Sweep) => write!(f, "Please enter a Sweep ID."),
            NavigateError::EmptyQuery(NavigationMode::Pano) => write!(f, "Please enter a Pano ID."),
            NavigateError::NotFound(pano) => write!(f, "Legacy Sweep ID \"{pano}\" not found."),
            NavigateError::Move {
                mode: NavigationMode::Sweep,
                error,
            } => write!(f, "Error navigating to sweep: {}", error.detail()),
            NavigateError::Move {
                mode: NavigationMode::Pano,
                error,
            } => write!(f, "Error navigating: {}", error.detail()),
        }
    }
}

impl std::error::Error for NavigateError {}

/// A validated move, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub mode: NavigationMode,
    /// Trimmed operator input.
    pub query: String,
    pub target: SweepId,
}

impl NavigationRequest {
    /// Validates `query` and, in pano mode, resolves it through `table`.
    pub fn prepare(
        table: &ReconciliationTable,
        query: &str,
        mode: NavigationMode,
    ) -> Result<Self, NavigateError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NavigateError::EmptyQuery(mode));
        }
        let target = match mode {
            NavigationMode::Sweep => SweepId::new(query),
            NavigationMode::Pano => {
                let pano = PanoId::new(query);
                table
                    .reverse_lookup(&pano)
                    .cloned()
                    .ok_or(NavigateError::NotFound(pano))?
            }
        };
        Ok(Self {
            mode,
            query: query.to_string(),
            target,
        })
    }

    pub async fn dispatch<S: Showcase>(
        self,
        showcase: &S,
        options: MoveOptions,
    ) -> Result<Navigated, NavigateError> {
        tracing::debug!(target_sweep = %self.target, mode = ?self.mode, "moving");
        showcase
            .move_to(&self.target, options)
            .await
            .map_err(|error| {
                tracing::warn!(target_sweep = %self.target, %error, "move failed");
                NavigateError::Move {
                    mode: self.mode,
                    error,
                }
            })?;
        Ok(Navigated {
            mode: self.mode,
            query: self.query,
            sweep_id: self.target,
        })
    }
}

/// A confirmed move. The caller clears its input field on receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigated {
    pub mode: NavigationMode,
    pub query: String,
    pub sweep_id: SweepId,
}

impl Navigated {
    pub fn success_text(&self) -> String {
        match self.mode {
            NavigationMode::Sweep => format!("Navigated to sweep: {}", self.sweep_id),
            NavigationMode::Pano => {
                format!("Navigated to sweep with Legacy ID: {}", self.query)
            }
        }
    }
}

/// Validates, resolves and sends one navigation request.
pub async fn navigate<S: Showcase>(
    showcase: Option<&S>,
    table: &ReconciliationTable,
    query: &str,
    mode: NavigationMode,
    options: MoveOptions,
) -> Result<Navigated, NavigateError> {
    let showcase = showcase.ok_or(NavigateError::NotConnected)?;
    let request = NavigationRequest::prepare(table, query, mode)?;
    request.dispatch(showcase, options).await
}
