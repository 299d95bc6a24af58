/// Fallback detail shown when a move fails without a service message.
pub const DEFAULT_MOVE_ERROR: &str = "Invalid Sweep ID";

/// The showcase could not be connected (bad credential, SDK missing, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    pub message: String,
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "showcase connection failed: {}", self.message)
    }
}

impl std::error::Error for ConnectionError {}

/// The showcase could not produce the sweep → pano identifier map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub message: String,
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "identifier map unavailable: {}", self.message)
    }
}

impl std::error::Error for ConversionError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LabelErrorKind {
    /// Only this sweep's label failed.
    Item,
    /// The label service itself is gone; no further lookups can succeed.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelError {
    pub kind: LabelErrorKind,
    pub message: String,
}

impl LabelError {
    pub fn item(message: impl Into<String>) -> Self {
        Self {
            kind: LabelErrorKind::Item,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: LabelErrorKind::Unavailable,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LabelErrorKind::Item => write!(f, "label lookup failed: {}", self.message),
            LabelErrorKind::Unavailable => write!(f, "label service unavailable: {}", self.message),
        }
    }
}

impl std::error::Error for LabelError {}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveError {
    pub message: Option<String>,
}

impl MoveError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    /// Service-supplied detail, or [`DEFAULT_MOVE_ERROR`].
    pub fn detail(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_MOVE_ERROR)
    }
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.detail())
    }
}

impl std::error::Error for MoveError {}

/// The "where is the viewer now" query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub message: String,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "current sweep query failed: {}", self.message)
    }
}

impl std::error::Error for QueryError {}
