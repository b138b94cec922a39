use agon_core::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, MediaApi, ProbeIdentifiers, Session, SiteEndpoints,
};

use crate::client::AgonClient;
use crate::errors::Result;

pub struct AgonBuilder {
    base_url: String,
    user_agent: String,
    probe: ProbeIdentifiers,
}

impl AgonBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            probe: ProbeIdentifiers::default(),
        }
    }

    /// Overrides the site base url (mainly for tests against a local server).
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Overrides the sentinel identifiers used by the csrf priming call.
    pub fn probe_identifiers(mut self, program_id: &str, episode_id: &str) -> Self {
        self.probe = ProbeIdentifiers {
            program_id: program_id.to_string(),
            episode_id: episode_id.to_string(),
        };
        self
    }

    /// Builds an [`AgonClient`] using the configured options.
    pub fn build(&self) -> Result<AgonClient> {
        let endpoints = SiteEndpoints::new(&self.base_url)?;
        let session = Session::new(&self.user_agent)?;
        let api = MediaApi::new(session.clone(), endpoints.clone(), self.probe.clone());
        Ok(AgonClient::new(session, endpoints, api))
    }
}

impl Default for AgonBuilder {
    fn default() -> Self {
        Self::new()
    }
}
