//! Continuation token carried in a posted message.
//!
//! The lookup keys travel as base64url-encoded JSON in a query parameter of a
//! placeholder URL, so a later "add" reply can recover them without keeping
//! any server-side state.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Placeholder host the token URL is attached to.
pub const DATA_URL: &str = "https://tonies.local";

const DATA_PARAM: &str = "data";

/// Lookup keys of an identified tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagToken {
    pub ruid: String,
    pub auth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
}

impl TagToken {
    pub fn new(ruid: impl Into<String>, auth: impl Into<String>) -> Self {
        Self {
            ruid: ruid.into(),
            auth: auth.into(),
            episode: None,
        }
    }

    pub fn with_episode(mut self, episode: Option<String>) -> Self {
        self.episode = episode;
        self
    }

    /// Base64url JSON form.
    pub fn encode(&self) -> Result<String> {
        Ok(URL_SAFE.encode(serde_json::to_vec(self)?))
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let json = URL_SAFE
            .decode(encoded)
            .map_err(|e| Error::InvalidToken(format!("base64: {e}")))?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Token embedded in the placeholder URL.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(format!("{DATA_URL}?{DATA_PARAM}={}", self.encode()?))
    }

    pub fn from_data_url(url: &str) -> Result<Self> {
        if !url.starts_with(DATA_URL) {
            return Err(Error::InvalidToken("not a tonie data URL".into()));
        }
        let parsed = Url::parse(url).map_err(|e| Error::InvalidToken(e.to_string()))?;
        let encoded = parsed
            .query_pairs()
            .find(|(key, _)| key == DATA_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| Error::InvalidToken("missing data parameter".into()))?;
        debug!(len = encoded.len(), "Decoding tonie data");
        Self::decode(&encoded)
    }

    /// Label shown to the user: the episode, or the rUID when unknown.
    pub fn display_name(&self) -> String {
        match &self.episode {
            Some(episode) if !episode.is_empty() => episode.clone(),
            _ => format!("rUID: {}", self.ruid),
        }
    }
}
