use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::endpoints::{CSRF_COOKIE_NAME, ProbeIdentifiers, SiteEndpoints};
use crate::errors::{MediaApiError, Result};
use crate::session::{RequestDescriptor, Session};

pub const DEFAULT_MEDIA_FORMAT: &str = "mp4";
pub const DEFAULT_MEDIA_SIZE: &str = "small";

/// Fixed `time` field the media-state endpoint expects outside playback.
const PREPARE_TIME_SENTINEL: &str = "-1";

static POSITIVE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d*$").expect("id regex must compile"));

pub fn is_positive_id(raw: &str) -> bool {
    POSITIVE_ID_RE.is_match(raw)
}

pub fn ensure_positive_id(field: &'static str, given: &str) -> Result<()> {
    if is_positive_id(given) {
        Ok(())
    } else {
        Err(MediaApiError::InvalidIdentifier {
            field,
            given: given.to_string(),
        })
    }
}

/// Only an exact `mp3` passes through; everything else is served as `mp4`.
pub fn normalize_media_format(raw: &str) -> &'static str {
    if raw == "mp3" { "mp3" } else { DEFAULT_MEDIA_FORMAT }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    data: ApiData,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    #[serde(default)]
    success: bool,
    url: Option<String>,
    error: Option<String>,
    result: Option<ApiStateData>,
}

#[derive(Debug, Deserialize)]
struct ApiStateData {
    state: String,
}

/// Client for the stateful media api: csrf token cache, media-url lookup and
/// media-state priming. Must only be used on an authenticated session; the
/// site answers anonymous calls with `success: false`.
pub struct MediaApi {
    session: Session,
    endpoints: SiteEndpoints,
    probe: ProbeIdentifiers,
}

impl MediaApi {
    pub fn new(session: Session, endpoints: SiteEndpoints, probe: ProbeIdentifiers) -> Self {
        Self {
            session,
            endpoints,
            probe,
        }
    }

    /// Returns the anti-forgery token for the media-state endpoint.
    ///
    /// The cookie jar is the cache: if `fuel_csrf_token` is already present
    /// and no refresh is forced, no request is made. Refreshing works by
    /// posting a throwaway state call with the sentinel identifiers and an
    /// empty token field; only its Set-Cookie side effect matters and the
    /// response body is ignored.
    pub async fn csrf_token(&self, force_refresh: bool) -> Result<String> {
        let state_url = self.endpoints.media_state_api();

        if !force_refresh
            && let Some(token) = self.session.find_cookie(&state_url, CSRF_COOKIE_NAME)
        {
            debug!("csrf token cookie already present; skipping refresh");
            return Ok(token);
        }

        info!("requesting a fresh csrf token cookie");
        let descriptor = RequestDescriptor::post_form(
            state_url.clone(),
            vec![
                ("format", DEFAULT_MEDIA_FORMAT.to_string()),
                ("program_id", self.probe.program_id.clone()),
                ("episode_id", self.probe.episode_id.clone()),
                ("time", PREPARE_TIME_SENTINEL.to_string()),
                (CSRF_COOKIE_NAME, String::new()),
            ],
        );
        self.session
            .send(descriptor, "priming the csrf token cookie")
            .await?;

        self.session
            .find_cookie(&state_url, CSRF_COOKIE_NAME)
            .ok_or(MediaApiError::CsrfCookieMissing)
    }

    /// Resolves the playable url for an episode.
    pub async fn media_url(
        &self,
        episode_id: &str,
        media_format: &str,
        size: &str,
    ) -> Result<String> {
        ensure_positive_id("episodeId", episode_id)?;
        let media_format = normalize_media_format(media_format);

        let mut url = self.endpoints.media_url_api();
        url.query_pairs_mut()
            .append_pair("episode_id", episode_id)
            .append_pair("format", media_format)
            .append_pair("size", size);

        info!(episode_id, format = media_format, size, "resolving media url");
        let context = format!("resolving media url for episode {episode_id}");
        let response = self
            .session
            .send(RequestDescriptor::get(url), &context)
            .await?;
        let data = Self::parse_envelope(response, &context).await?;

        data.url.ok_or(MediaApiError::MissingField {
            field: "data.url",
            context,
        })
    }

    /// Posts a media-state call and returns the opaque server-side state.
    ///
    /// With `token: None` a cached (or freshly issued) csrf token is used.
    pub async fn media_state(
        &self,
        token: Option<String>,
        program_id: &str,
        episode_id: &str,
        media_format: &str,
    ) -> Result<String> {
        ensure_positive_id("programId", program_id)?;
        ensure_positive_id("episodeId", episode_id)?;
        let media_format = normalize_media_format(media_format);

        let token = match token {
            Some(token) => token,
            None => self.csrf_token(false).await?,
        };

        info!(program_id, episode_id, format = media_format, "requesting media state");
        let descriptor = RequestDescriptor::post_form(
            self.endpoints.media_state_api(),
            vec![
                ("format", media_format.to_string()),
                ("program_id", program_id.to_string()),
                ("episode_id", episode_id.to_string()),
                ("time", PREPARE_TIME_SENTINEL.to_string()),
                (CSRF_COOKIE_NAME, token),
            ],
        );
        let context = format!("requesting media state for episode {episode_id}");
        let response = self.session.send(descriptor, &context).await?;
        let data = Self::parse_envelope(response, &context).await?;

        data.result
            .map(|result| result.state)
            .ok_or(MediaApiError::MissingField {
                field: "data.result.state",
                context,
            })
    }

    /// Primes the server-side media state ahead of a download.
    ///
    /// Without identifiers this runs against the sentinel pair, which is only
    /// useful as a connectivity self-test.
    pub async fn prepare_media_request(
        &self,
        identifiers: Option<(&str, &str)>,
    ) -> Result<String> {
        let (program_id, episode_id) = match identifiers {
            Some((program_id, episode_id)) => {
                ensure_positive_id("programId", program_id)?;
                ensure_positive_id("episodeId", episode_id)?;
                (program_id, episode_id)
            }
            None => (
                self.probe.program_id.as_str(),
                self.probe.episode_id.as_str(),
            ),
        };

        self.media_state(None, program_id, episode_id, DEFAULT_MEDIA_FORMAT)
            .await
    }

    async fn parse_envelope(response: reqwest::Response, context: &str) -> Result<ApiData> {
        let body = response
            .text()
            .await
            .map_err(|source| MediaApiError::ResponseBody {
                context: context.to_string(),
                source,
            })?;

        let envelope: ApiEnvelope =
            serde_json::from_str(&body).map_err(|source| MediaApiError::Json {
                context: context.to_string(),
                source,
            })?;

        let data = envelope.data;
        if !data.success {
            return Err(MediaApiError::Api {
                context: context.to_string(),
                message: data.error.unwrap_or_else(|| "unknown".to_string()),
            });
        }

        Ok(data)
    }
}
