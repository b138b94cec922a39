use serde::Deserialize;
use tracing::{debug, info};

use agon_core::{MediaApi, RequestDescriptor, Session, SiteEndpoints, ensure_positive_id};

use crate::errors::{AgonError, Result};
use crate::page::parse_episode_page;

/// Submit marker the login form expects alongside the credentials.
const LOGIN_SUBMIT_LABEL: &str = "ログイン";

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeInfo {
    pub title: String,
    pub program_id: String,
    pub episode_id: String,
    /// Raw `media_mode` token from the page; coerced to a supported format
    /// only at api-call time.
    pub media_format: String,
}

/// Product of a completed resolution, ready for the downloader.
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub media_url: String,
    /// Episode view url; the site expects it as the `Referer` of the media GET.
    pub referer: String,
}

pub struct AgonClient {
    session: Session,
    endpoints: SiteEndpoints,
    api: MediaApi,
}

impl AgonClient {
    pub(crate) fn new(session: Session, endpoints: SiteEndpoints, api: MediaApi) -> Self {
        Self {
            session,
            endpoints,
            api,
        }
    }

    /// The session shared by every call, for callers that stream the
    /// resolved url themselves.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn media_api(&self) -> &MediaApi {
        &self.api
    }

    /// Submits the login form with full redirect-following.
    ///
    /// The site signals rejected credentials by landing back on the login
    /// form, not with a distinct status code; success is the absence of that
    /// redirect target.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let login_url = self.endpoints.login();
        let descriptor = RequestDescriptor::post_form(
            login_url.clone(),
            vec![
                ("email", credentials.email.clone()),
                ("password", credentials.password.clone()),
                ("submit", LOGIN_SUBMIT_LABEL.to_string()),
            ],
        );
        let response = self
            .session
            .send(descriptor, "submitting the login form")
            .await?;

        if response.url().as_str().contains(login_url.as_str()) {
            return Err(AgonError::LoginRejected);
        }

        info!("login accepted");
        Ok(())
    }

    /// Probes the account home page and logs in only when the probe is
    /// redirected away from it.
    pub async fn login_if_needed(&self, credentials: &Credentials) -> Result<()> {
        let mypage = self.endpoints.mypage();
        let response = self
            .session
            .send(RequestDescriptor::get(mypage.clone()), "probing login state")
            .await?;

        if response.url().as_str().contains(mypage.as_str()) {
            debug!("session already authenticated");
            return Ok(());
        }

        self.login(credentials).await
    }

    /// Fetches an episode view page and recovers its metadata.
    pub async fn get_episode_info(&self, episode_id: &str) -> Result<EpisodeInfo> {
        ensure_positive_id("episodeId", episode_id)?;

        let context = format!("loading episode page {episode_id}");
        let response = self
            .session
            .send(
                RequestDescriptor::get(self.endpoints.episode_view(episode_id)),
                &context,
            )
            .await?;
        let body = response
            .text()
            .await
            .map_err(|source| AgonError::ResponseBody { context, source })?;

        let parsed = parse_episode_page(&body)?;
        debug!(program_id = %parsed.program_id, format = %parsed.media_format, "episode metadata extracted");

        Ok(EpisodeInfo {
            title: parsed.title,
            program_id: parsed.program_id,
            episode_id: episode_id.to_string(),
            media_format: parsed.media_format,
        })
    }

    /// Resolves the playable url and primes the server-side media state.
    ///
    /// Both calls must succeed before the url is fetched; the site rejects
    /// the download otherwise.
    pub async fn resolve_media(&self, info: &EpisodeInfo, size: &str) -> Result<ResolvedMedia> {
        let media_url = self
            .api
            .media_url(&info.episode_id, &info.media_format, size)
            .await?;
        self.api
            .prepare_media_request(Some((&info.program_id, &info.episode_id)))
            .await?;

        Ok(ResolvedMedia {
            media_url,
            referer: self.endpoints.episode_view(&info.episode_id).to_string(),
        })
    }
}
