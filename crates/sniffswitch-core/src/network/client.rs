use std::time::Duration;

use tracing::trace;

use crate::config::SnifferSettings;
use crate::error::{Error, Result};
use crate::game::{GameState, parse_state};

/// Anything that can report the current game state.
///
/// Implementations must not keep per-call state: polling twice in a row
/// has no side effects.
pub trait StateSource {
    fn fetch_state(&self) -> Result<GameState>;
}

/// Blocking client for the RockSniffer status endpoint
pub struct SnifferClient {
    agent: ureq::Agent,
    url: String,
}

impl SnifferClient {
    pub fn new(settings: &SnifferSettings) -> Self {
        Self::with_url(settings.url(), settings.timeout)
    }

    pub fn with_url(url: String, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn get_body(&self) -> Result<String> {
        let mut resp = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| Error::Network(format!("GET {} failed: {}", self.url, e)))?;
        resp.body_mut().read_to_string().map_err(|e| {
            Error::Network(format!("failed to read response from {}: {}", self.url, e))
        })
    }
}

impl StateSource for SnifferClient {
    fn fetch_state(&self) -> Result<GameState> {
        let body = self.get_body()?;
        trace!("RockSniffer response: {}", body);
        parse_state(&body)
    }
}
