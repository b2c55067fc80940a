//! # toniefinder
//!
//! Identify tonie figurines from Flipper Zero NFC dumps.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use toniefinder::{Catalog, Config, ContentClient, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> toniefinder::Result<()> {
//!     let config = Config::new("https://example.org/tonies.json")
//!         .with_client_cert("client.crt", "private.key");
//!
//!     let catalog = Arc::new(Catalog::new(reqwest::Client::new(), &config.json_url));
//!     catalog.spawn_refresh(config.refresh_period);
//!
//!     let pipeline = Pipeline::new(ContentClient::new(&config)?, catalog);
//!     let dump = std::fs::read_to_string("tonie.nfc")?;
//!     let identified = pipeline.identify(&dump, None).await?;
//!     println!("{}", identified.message);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod message;
pub mod nfc;
pub mod pipeline;
pub mod teddycloud;
pub mod token;

// Re-export main public API
pub use catalog::{Catalog, CatalogSnapshot, ResolvedMetadata};
pub use config::Config;
pub use content::{AudioHeader, ContentClient};
pub use message::TonieMessage;
pub use nfc::DecodedTag;
pub use pipeline::{Identified, Pipeline, Registrar};
pub use teddycloud::TeddyCloud;
pub use token::TagToken;

pub use error::Error;

/// Result type for toniefinder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Generated protobuf types.
pub mod proto {
    pub mod toniebox {
        include!("proto/toniebox.rs");
    }
}
