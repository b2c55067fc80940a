//! Tonies catalog (`tonies.json`) snapshot and lookup.
//!
//! The catalog is a list of articles; each article has one or more variants
//! ("data") that share descriptive fields; each variant lists the audio builds
//! ("ids") that belong to it. An audio id from a content header is resolved by
//! scanning article → variant → id in document order.
//!
//! The whole document is fetched again on every refresh and swapped in as one
//! [`CatalogSnapshot`]. Readers clone an `Arc` of the current snapshot, so a
//! lookup running during a refresh sees either the old or the new document.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::{Error, Result};

// ============================================================================
// Document types
// ============================================================================

/// One article in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub article: Option<String>,
    pub data: Vec<Variant>,
}

/// A release variant of an article.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Variant {
    pub series: Option<String>,
    pub episode: Option<String>,
    /// Release date as a unix timestamp.
    pub release: Option<Release>,
    pub language: Option<String>,
    pub category: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<u32>,
    pub age: Option<u32>,
    pub origin: Option<String>,
    pub image: Option<String>,
    pub sample: Option<String>,
    pub web: Option<String>,
    pub shop_id: Option<String>,
    pub track_desc: Vec<String>,
    pub ids: Vec<IdRecord>,
}

/// One audio build of a variant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdRecord {
    pub audio_id: Option<u64>,
    pub hash: Option<String>,
    pub size: Option<u64>,
    pub tracks: Option<u32>,
    pub confidence: Option<i64>,
}

/// Release timestamp; some documents store it as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Release {
    Timestamp(i64),
    Text(String),
}

impl Release {
    /// Seconds since the unix epoch, if the value is numeric.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Release::Timestamp(ts) => Some(*ts),
            Release::Text(text) => text.trim().parse().ok(),
        }
    }
}

// ============================================================================
// Resolved metadata
// ============================================================================

/// Flattened view of one variant and one of its audio builds.
///
/// Every field is present; values missing in the document are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetadata {
    pub article: Option<String>,
    pub series: Option<String>,
    pub episode: Option<String>,
    pub release: Option<i64>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub runtime: Option<u32>,
    pub age: Option<u32>,
    pub origin: Option<String>,
    pub image: Option<String>,
    pub sample: Option<String>,
    pub web: Option<String>,
    pub shop_id: Option<String>,
    pub tracks: Vec<String>,
    pub audio_id: u64,
    pub hash: Option<String>,
    pub size: Option<u64>,
    pub track_count: Option<u32>,
    pub confidence: Option<i64>,
}

impl ResolvedMetadata {
    fn new(entry: &CatalogEntry, variant: &Variant, id: &IdRecord, audio_id: u64) -> Self {
        Self {
            article: entry.article.clone(),
            series: variant.series.clone(),
            episode: variant.episode.clone(),
            release: variant.release.as_ref().and_then(Release::timestamp),
            language: variant.language.clone(),
            category: variant.category.clone(),
            runtime: variant.runtime,
            age: variant.age,
            origin: variant.origin.clone(),
            image: variant.image.clone(),
            sample: variant.sample.clone(),
            web: variant.web.clone(),
            shop_id: variant.shop_id.clone(),
            tracks: variant.track_desc.clone(),
            audio_id,
            hash: id.hash.clone(),
            size: id.size,
            track_count: id.tracks,
            confidence: id.confidence,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Position of an id record inside the document.
#[derive(Debug, Clone, Copy)]
struct Slot {
    entry: usize,
    variant: usize,
    id: usize,
}

/// An immutable, fully parsed catalog document.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    entries: Vec<CatalogEntry>,
    /// First occurrence of each audio id in document order.
    index: HashMap<u64, Slot>,
}

impl CatalogSnapshot {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut index = HashMap::new();
        for (e, entry) in entries.iter().enumerate() {
            for (v, variant) in entry.data.iter().enumerate() {
                for (i, id) in variant.ids.iter().enumerate() {
                    if let Some(audio_id) = id.audio_id {
                        index.entry(audio_id).or_insert(Slot {
                            entry: e,
                            variant: v,
                            id: i,
                        });
                    }
                }
            }
        }
        Self { entries, index }
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_slice(data)?;
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of distinct audio ids.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Find the first id record with this audio id.
    ///
    /// A stored hash that differs from `hash` is logged and the record is
    /// still returned; the catalog may lag behind the exact build.
    pub fn find(&self, audio_id: u64, hash: Option<&str>) -> Option<ResolvedMetadata> {
        let slot = self.index.get(&audio_id)?;
        let entry = &self.entries[slot.entry];
        let variant = &entry.data[slot.variant];
        let id = &variant.ids[slot.id];

        if let (Some(wanted), Some(stored)) = (hash, id.hash.as_deref())
            && !wanted.eq_ignore_ascii_case(stored)
        {
            warn!(
                audio_id,
                expected = wanted,
                catalog = stored,
                "Hash mismatch, using catalog entry anyway"
            );
        }

        Some(ResolvedMetadata::new(entry, variant, id, audio_id))
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Periodically refreshed catalog shared by all lookups.
#[derive(Debug)]
pub struct Catalog {
    client: Client,
    url: String,
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl Catalog {
    /// Create an empty catalog backed by the document at `url`.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            snapshot: RwLock::new(None),
        }
    }

    /// Current snapshot, if one has been loaded.
    pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot.read().clone()
    }

    /// Install a complete snapshot.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        *self.snapshot.write() = Some(Arc::new(snapshot));
    }

    /// Fetch the catalog document and swap it in.
    ///
    /// On failure the previous snapshot stays in place.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn refresh(&self) -> Result<()> {
        match self.fetch().await {
            Ok(snapshot) => {
                info!(audio_ids = snapshot.len(), "Catalog updated");
                self.replace(snapshot);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, stale = self.snapshot.read().is_some(), "Failed to fetch catalog");
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<CatalogSnapshot> {
        debug!("Fetching catalog");
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        debug!(bytes = body.len(), "Got catalog");
        CatalogSnapshot::from_json(&body)
    }

    /// Refresh now and then every `period`, for the life of the process.
    pub fn spawn_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let catalog = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Errors are logged by refresh; keep serving the old snapshot.
                let _ = catalog.refresh().await;
            }
        })
    }

    /// Resolve an audio id (decimal string) to catalog metadata.
    ///
    /// Returns `Ok(None)` when no entry matches.
    pub fn lookup(&self, audio_id: &str, hash: Option<&str>) -> Result<Option<ResolvedMetadata>> {
        let trimmed = audio_id.trim();
        let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAudioId(audio_id.to_string()));
        }
        let snapshot = self.snapshot().ok_or(Error::CatalogUnavailable)?;
        // Negative or overflowing ids are well formed but cannot be in the catalog.
        Ok(trimmed
            .parse::<u64>()
            .ok()
            .and_then(|id| snapshot.find(id, hash)))
    }
}
