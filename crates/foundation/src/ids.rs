//! Identifier newtypes for the two sweep naming schemes and the model selector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyId;

impl std::fmt::Display for EmptyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "identifier is empty")
    }
}

impl std::error::Error for EmptyId {}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps `raw` with surrounding whitespace trimmed.
            pub fn new(raw: impl AsRef<str>) -> Self {
                Self(raw.as_ref().trim().to_string())
            }

            /// Like [`Self::new`] but rejects blank input.
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, EmptyId> {
                let id = Self::new(raw);
                if id.0.is_empty() { Err(EmptyId) } else { Ok(id) }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }
    };
}

string_id!(
    /// Current-scheme location identifier, native to the showcase.
    SweepId
);
string_id!(
    /// Legacy ("pano") location identifier kept for external references.
    PanoId
);
string_id!(
    /// Identifier of the loaded 3D model.
    ModelSid
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_whitespace() {
        assert_eq!(SweepId::new("  abc \n").as_str(), "abc");
    }

    #[test]
    fn parse_rejects_blank() {
        assert_eq!(PanoId::parse("   "), Err(EmptyId));
        assert_eq!(ModelSid::parse(" m1 ").unwrap().as_str(), "m1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&SweepId::new("s1")).unwrap();
        assert_eq!(json, "\"s1\"");
        let back: PanoId = serde_json::from_str("\"p9\"").unwrap();
        assert_eq!(back, PanoId::new("p9"));
    }
}
