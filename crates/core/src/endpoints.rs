use reqwest::Url;

use crate::errors::{MediaApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://agonp.jp";

/// Name of the anti-forgery cookie issued by the media-state endpoint.
pub const CSRF_COOKIE_NAME: &str = "fuel_csrf_token";

/// Sentinel identifiers for the csrf priming call and the no-argument
/// prepare call. They only need to exist on the site; they are unrelated to
/// the episode being downloaded.
#[derive(Debug, Clone)]
pub struct ProbeIdentifiers {
    pub program_id: String,
    pub episode_id: String,
}

impl Default for ProbeIdentifiers {
    fn default() -> Self {
        Self {
            program_id: "21".to_string(),
            episode_id: "22".to_string(),
        }
    }
}

/// Fixed site endpoints relative to a configurable base url.
#[derive(Debug, Clone)]
pub struct SiteEndpoints {
    base: Url,
}

impl SiteEndpoints {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|_| MediaApiError::BaseUrl)?;
        if base.cannot_be_a_base() {
            return Err(MediaApiError::BaseUrl);
        }
        Ok(Self { base })
    }

    fn join(&self, path: &str) -> Url {
        self.base.join(path).expect("site endpoint paths are static")
    }

    /// Authenticated-session probe target.
    pub fn mypage(&self) -> Url {
        self.join("/mypage")
    }

    pub fn login(&self) -> Url {
        self.join("/auth/login")
    }

    pub fn episode_view(&self, episode_id: &str) -> Url {
        self.join(&format!("/episodes/view/{episode_id}"))
    }

    pub fn media_url_api(&self) -> Url {
        self.join("/api/v1/episodes/media_url.json")
    }

    pub fn media_state_api(&self) -> Url {
        self.join("/api/v1/programs/episodes/view.json")
    }
}
