//! Tag identification pipeline.
//!
//! One inbound dump runs decode → content header → catalog lookup → message,
//! each stage feeding the next. The catalog is injected and shared; nothing
//! else outlives a single call.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::catalog::{Catalog, ResolvedMetadata};
use crate::content::{AudioHeader, ContentClient};
use crate::message::TonieMessage;
use crate::nfc::DecodedTag;
use crate::token::TagToken;
use crate::{Error, Result};

/// Something that can register a tag given its lookup keys.
pub trait Registrar {
    fn register(&self, token: &TagToken) -> impl Future<Output = Result<()>> + Send;
}

/// Result of a successful identification.
#[derive(Debug, Clone)]
pub struct Identified {
    pub token: TagToken,
    pub header: AudioHeader,
    pub metadata: ResolvedMetadata,
    pub message: TonieMessage,
}

/// Identification pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    content: ContentClient,
    catalog: Arc<Catalog>,
}

impl Pipeline {
    pub fn new(content: ContentClient, catalog: Arc<Catalog>) -> Self {
        Self { content, catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Identify the tonie in a raw NFC dump.
    ///
    /// `link` points at the submitted dump and ends up in the message.
    #[instrument(skip_all)]
    pub async fn identify(&self, dump: &str, link: Option<&str>) -> Result<Identified> {
        let tag = DecodedTag::parse(dump);
        let (ruid, auth) = tag.keys().inspect_err(|e| warn!(error = %e, "Unusable tag"))?;
        debug!(ruid, "Valid NFC data found");

        let header = self.content.resolve(ruid, auth).await?;
        let audio_id = header.audio_id_str();
        debug!(audio_id, "Resolved audio id");

        let metadata = self
            .catalog
            .lookup(&audio_id, header.hash.as_deref())?
            .ok_or_else(|| {
                warn!(audio_id, "No matching tonie found");
                Error::NotFound(audio_id.clone())
            })?;

        let token = TagToken::new(ruid, auth).with_episode(metadata.episode.clone());
        let message = TonieMessage::compose(&metadata, link, &token)?;
        info!(
            audio_id,
            series = metadata.series.as_deref().unwrap_or_default(),
            episode = metadata.episode.as_deref().unwrap_or_default(),
            "Identified tonie"
        );

        Ok(Identified {
            token,
            header,
            metadata,
            message,
        })
    }
}

/// Handle an "add" reply: recover the keys from a token URL and register them.
///
/// Returns the label of the registered tonie.
#[instrument(skip_all)]
pub async fn add<R: Registrar>(registrar: Option<&R>, data_url: &str) -> Result<String> {
    let token = TagToken::from_data_url(data_url)?;
    let name = token.display_name();

    let Some(registrar) = registrar else {
        warn!("No registrar configured");
        return Err(Error::RegistrationUnavailable);
    };

    match registrar.register(&token).await {
        Ok(()) => {
            info!(tonie = %name, "Successfully added tonie");
            Ok(name)
        }
        Err(e) => {
            warn!(tonie = %name, error = %e, "Failed to add tonie");
            Err(e)
        }
    }
}
