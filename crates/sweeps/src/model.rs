use foundation::ModelSid;
use url::Url;

pub const DEFAULT_MODEL: &str = "YeNsHyWcrMM";
pub const DEFAULT_SHOWCASE_ORIGIN: &str = "https://my.matterport.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelUrlError {
    BadOrigin(String),
    /// The URL has no `m` query parameter.
    MissingModel,
}

impl std::fmt::Display for ModelUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelUrlError::BadOrigin(msg) => write!(f, "invalid showcase origin: {msg}"),
            ModelUrlError::MissingModel => write!(f, "Model SID not found."),
        }
    }
}

impl std::error::Error for ModelUrlError {}

/// Why an operator's model entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelectError {
    Blank,
    Url(ModelUrlError),
}

impl std::fmt::Display for ModelSelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSelectError::Blank => write!(f, "Please enter a Model ID."),
            ModelSelectError::Url(err) => write!(f, "Error: {err}"),
        }
    }
}

impl std::error::Error for ModelSelectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelSelectError::Blank => None,
            ModelSelectError::Url(err) => Some(err),
        }
    }
}

/// `<origin>/show/?m=<model>&qs=1&play=1`
pub fn showcase_url(origin: &str, model: &ModelSid) -> Result<Url, ModelUrlError> {
    let mut url = Url::parse(origin)
        .and_then(|base| base.join("/show/"))
        .map_err(|e| ModelUrlError::BadOrigin(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("m", model.as_str())
        .append_pair("qs", "1")
        .append_pair("play", "1");
    Ok(url)
}

pub fn model_from_showcase_url(url: &str) -> Result<ModelSid, ModelUrlError> {
    let url = Url::parse(url).map_err(|e| ModelUrlError::BadOrigin(e.to_string()))?;
    url.query_pairs()
        .find(|(k, _)| k == "m")
        .and_then(|(_, v)| ModelSid::parse(&*v).ok())
        .ok_or(ModelUrlError::MissingModel)
}

/// The operator's active model choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    active: ModelSid,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(ModelSid::new(DEFAULT_MODEL))
    }
}

impl ModelSelector {
    pub fn new(active: ModelSid) -> Self {
        Self { active }
    }

    pub fn active(&self) -> &ModelSid {
        &self.active
    }

    /// Switches to `raw`, a bare model id or a pasted showcase URL, and
    /// returns the previous model.
    pub fn select(&mut self, raw: &str) -> Result<ModelSid, ModelSelectError> {
        let raw = raw.trim();
        let next = if raw.starts_with("http://") || raw.starts_with("https://") {
            model_from_showcase_url(raw).map_err(ModelSelectError::Url)?
        } else {
            ModelSid::parse(raw).map_err(|_| ModelSelectError::Blank)?
        };
        Ok(std::mem::replace(&mut self.active, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_showcase_url() {
        let url = showcase_url(DEFAULT_SHOWCASE_ORIGIN, &ModelSid::new("abc")).unwrap();
        assert_eq!(url.as_str(), "https://my.matterport.com/show/?m=abc&qs=1&play=1");
    }

    #[test]
    fn recovers_model_from_url() {
        let m = model_from_showcase_url("https://my.matterport.com/show/?m=abc&qs=1&play=1");
        assert_eq!(m, Ok(ModelSid::new("abc")));
        assert_eq!(
            model_from_showcase_url("https://my.matterport.com/show/?qs=1"),
            Err(ModelUrlError::MissingModel)
        );
        assert!(matches!(
            model_from_showcase_url("not a url"),
            Err(ModelUrlError::BadOrigin(_))
        ));
    }

    #[test]
    fn url_round_trips_model() {
        let model = ModelSid::new("Ye Ns&x");
        let url = showcase_url("https://example.test", &model).unwrap();
        assert_eq!(model_from_showcase_url(url.as_str()), Ok(model));
    }

    #[test]
    fn selector_rejects_blank_and_returns_previous() {
        let mut sel = ModelSelector::default();
        assert_eq!(sel.active().as_str(), DEFAULT_MODEL);
        assert!(sel.select("  ").is_err());
        assert_eq!(sel.select(" next ").unwrap().as_str(), DEFAULT_MODEL);
        assert_eq!(sel.active().as_str(), "next");
    }

    #[test]
    fn selector_accepts_pasted_showcase_url() {
        let mut sel = ModelSelector::default();
        sel.select("https://my.matterport.com/show/?m=xyz&play=1").unwrap();
        assert_eq!(sel.active().as_str(), "xyz");
    }

    #[test]
    fn selector_errors_use_operator_wording() {
        let mut sel = ModelSelector::new(ModelSid::new("keep"));
        assert_eq!(sel.select("   ").unwrap_err().to_string(), "Please enter a Model ID.");
        assert_eq!(
            sel.select("https://my.matterport.com/show/?play=1")
                .unwrap_err()
                .to_string(),
            "Error: Model SID not found."
        );
        assert_eq!(sel.active().as_str(), "keep");
    }
}
