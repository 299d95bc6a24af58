use serde::{Deserialize, Serialize};
use sweeps::Transition;
use sweeps::model::{DEFAULT_MODEL, DEFAULT_SHOWCASE_ORIGIN};

pub const DEFAULT_IFRAME_ID: &str = "matterport-iframe";

/// Panel settings. Every field may be omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub initial_model: String,
    pub showcase_origin: String,
    pub iframe_id: String,
    pub transition: Transition,
    pub notice_ttl_ms: u64,
    pub credential_ttl_days: u32,
    pub cookie_name: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            initial_model: DEFAULT_MODEL.to_string(),
            showcase_origin: DEFAULT_SHOWCASE_ORIGIN.to_string(),
            iframe_id: DEFAULT_IFRAME_ID.to_string(),
            transition: Transition::Fly,
            notice_ttl_ms: runtime::NOTICE_TTL_MS,
            credential_ttl_days: credentials::DEFAULT_TTL_DAYS,
            cookie_name: credentials::DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

impl PanelConfig {
    /// Parses `raw`; a blank string yields the defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_config_is_default() {
        assert_eq!(PanelConfig::from_json("  ").unwrap(), PanelConfig::default());
        assert_eq!(PanelConfig::from_json("{}").unwrap(), PanelConfig::default());
    }

    #[test]
    fn defaults_match_the_hosted_panel() {
        let config = PanelConfig::default();
        assert_eq!(config.initial_model, "YeNsHyWcrMM");
        assert_eq!(config.showcase_origin, "https://my.matterport.com");
        assert_eq!(config.notice_ttl_ms, 5_000);
        assert_eq!(config.credential_ttl_days, 30);
        assert_eq!(config.cookie_name, "matterportSdkKey");
        assert_eq!(config.transition, Transition::Fly);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = PanelConfig::from_json(
            r#"{"initial_model":"abc","transition":"transition.instant","notice_ttl_ms":100}"#,
        )
        .unwrap();
        assert_eq!(config.initial_model, "abc");
        assert_eq!(config.transition, Transition::Instant);
        assert_eq!(config.notice_ttl_ms, 100);
        assert_eq!(config.iframe_id, DEFAULT_IFRAME_ID);
    }

    #[test]
    fn unknown_transition_is_rejected() {
        assert!(PanelConfig::from_json(r#"{"transition":"warp"}"#).is_err());
    }
}
