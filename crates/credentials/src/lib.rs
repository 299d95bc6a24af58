/// Default cookie name the SDK key is persisted under.
pub const DEFAULT_COOKIE_NAME: &str = "matterportSdkKey";

/// Default lifetime of the persisted SDK key.
pub const DEFAULT_TTL_DAYS: u32 = 30;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Client-held secret required to connect to the showcase.
///
/// Restricted to characters that survive a cookie round trip unencoded.
#[derive(Clone, PartialEq, Eq)]
pub struct SdkKey(String);

impl SdkKey {
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(CredentialError::Invalid("SDK key is empty".to_string()));
        }
        if let Some(c) = key.chars().find(|c| !is_cookie_safe(*c)) {
            return Err(CredentialError::Invalid(format!(
                "SDK key contains unsupported character {c:?}"
            )));
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short, stable digest safe to put in logs.
    pub fn fingerprint(&self) -> String {
        let hex = blake3::hash(self.0.as_bytes()).to_hex();
        hex.as_str()[..12].to_string()
    }
}

impl std::fmt::Debug for SdkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SdkKey({})", self.fingerprint())
    }
}

fn is_cookie_safe(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\' | '=')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    StorageUnavailable,
    Invalid(String),
    Io(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::StorageUnavailable => write!(f, "browser cookie storage unavailable"),
            CredentialError::Invalid(msg) => write!(f, "invalid credential: {msg}"),
            CredentialError::Io(msg) => write!(f, "credential storage error: {msg}"),
        }
    }
}

impl std::error::Error for CredentialError {}

pub trait CredentialStore {
    fn load(&self) -> Result<Option<SdkKey>, CredentialError>;
    fn save(&mut self, key: &SdkKey) -> Result<(), CredentialError>;
    fn clear(&mut self) -> Result<(), CredentialError>;
}

/// Builds the `document.cookie` assignment that persists `key` for `ttl_days`,
/// scoped to the whole site and withheld from cross-site requests.
pub fn cookie_assignment(name: &str, key: &SdkKey, ttl_days: u32) -> String {
    let max_age = u64::from(ttl_days) * SECONDS_PER_DAY;
    format!(
        "{name}={}; max-age={max_age}; path=/; SameSite=Strict",
        key.expose()
    )
}

/// Assignment that immediately expires the cookie called `name`.
pub fn cookie_removal(name: &str) -> String {
    format!("{name}=; max-age=0; path=/; SameSite=Strict")
}

/// Finds `name` in a `document.cookie` style header.
///
/// Returns `None` when the cookie is missing or its value is empty.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(|pair| pair.trim_start_matches(' '))
        .find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    key: Option<SdkKey>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<SdkKey>, CredentialError> {
        Ok(self.key.clone())
    }

    fn save(&mut self, key: &SdkKey) -> Result<(), CredentialError> {
        self.key = Some(key.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        self.key = None;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_cookie {
    use super::{
        CredentialError, CredentialStore, SdkKey, cookie_assignment, cookie_removal, find_cookie,
    };
    use wasm_bindgen::JsCast;

    #[derive(Debug)]
    pub struct CookieCredentialStore {
        name: String,
        ttl_days: u32,
    }

    impl CookieCredentialStore {
        pub fn new(name: impl Into<String>, ttl_days: u32) -> Result<Self, CredentialError> {
            let store = Self {
                name: name.into(),
                ttl_days,
            };
            // Fail early rather than on first save.
            html_document()?;
            Ok(store)
        }

        fn write(&self, assignment: &str) -> Result<(), CredentialError> {
            html_document()?
                .set_cookie(assignment)
                .map_err(|e| CredentialError::Io(format!("set cookie failed: {:?}", e)))
        }
    }

    impl CredentialStore for CookieCredentialStore {
        fn load(&self) -> Result<Option<SdkKey>, CredentialError> {
            let header = html_document()?
                .cookie()
                .map_err(|e| CredentialError::Io(format!("read cookie failed: {:?}", e)))?;
            match find_cookie(&header, &self.name) {
                // A hand-edited cookie that no longer parses counts as absent.
                Some(raw) => Ok(SdkKey::parse(raw).ok()),
                None => Ok(None),
            }
        }

        fn save(&mut self, key: &SdkKey) -> Result<(), CredentialError> {
            tracing::info!(key = %key.fingerprint(), "persisting SDK key");
            self.write(&cookie_assignment(&self.name, key, self.ttl_days))
        }

        fn clear(&mut self) -> Result<(), CredentialError> {
            self.write(&cookie_removal(&self.name))
        }
    }

    fn html_document() -> Result<web_sys::HtmlDocument, CredentialError> {
        let win = web_sys::window().ok_or(CredentialError::StorageUnavailable)?;
        win.document()
            .ok_or(CredentialError::StorageUnavailable)?
            .dyn_into::<web_sys::HtmlDocument>()
            .map_err(|_| CredentialError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_cookie::CookieCredentialStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct CookieCredentialStore;

#[cfg(not(target_arch = "wasm32"))]
impl CookieCredentialStore {
    pub fn new(_name: impl Into<String>, _ttl_days: u32) -> Result<Self, CredentialError> {
        Err(CredentialError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CredentialStore for CookieCredentialStore {
    fn load(&self) -> Result<Option<SdkKey>, CredentialError> {
        Err(CredentialError::StorageUnavailable)
    }

    fn save(&mut self, _key: &SdkKey) -> Result<(), CredentialError> {
        Err(CredentialError::StorageUnavailable)
    }

    fn clear(&mut self) -> Result<(), CredentialError> {
        Err(CredentialError::StorageUnavailable)
    }
}
