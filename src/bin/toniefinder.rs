//! Command line front end.
//!
//! Run with: cargo run --bin toniefinder -- identify tonie.nfc
//! Run with debug: RUST_LOG=toniefinder=debug cargo run --bin toniefinder -- watch

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use toniefinder::config::DEFAULT_CONTENT_URL;
use toniefinder::{Catalog, Config, ContentClient, Pipeline, TeddyCloud};

#[derive(Parser, Debug)]
#[command(name = "toniefinder")]
#[command(about = "Identify tonies from Flipper NFC dumps")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Identify the tonies in the given .nfc files
    Identify { files: Vec<PathBuf> },
    /// Read .nfc paths from stdin and identify each, refreshing the catalog in the background
    Watch,
    /// Register a tonie with TeddyCloud using the data URL of an identify result
    Add { data_url: String },
}

#[derive(Args, Debug)]
struct Settings {
    /// PEM client certificate for the content server
    #[arg(long, global = true, env = "CLIENT_CERT_PATH")]
    client_cert: Option<PathBuf>,

    /// PEM private key for the content server
    #[arg(long, global = true, env = "CLIENT_KEY_PATH")]
    client_key: Option<PathBuf>,

    /// URL of the tonies.json catalog
    #[arg(long, global = true, env = "JSON_URL")]
    json_url: Option<String>,

    /// Content server base URL
    #[arg(long, global = true, default_value = DEFAULT_CONTENT_URL, env = "TONIES_CONTENT_URL")]
    content_url: String,

    /// TeddyCloud base URL; registration is disabled without it
    #[arg(long, global = true, env = "TEDDYCLOUD_API")]
    teddycloud_api: Option<String>,

    /// Catalog refresh period in hours
    #[arg(long, global = true, default_value = "24", env = "CATALOG_REFRESH_HOURS")]
    refresh_hours: u64,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30", env = "REQUEST_TIMEOUT_SECS")]
    timeout: u64,
}

impl Settings {
    fn config(&self) -> Config {
        let mut config = Config::new(self.json_url.clone().unwrap_or_default())
            .with_content_url(&self.content_url)
            .with_teddycloud_url(self.teddycloud_api.clone())
            .with_refresh_period(Duration::from_secs(self.refresh_hours * 60 * 60))
            .with_timeout(Duration::from_secs(self.timeout));
        if let (Some(cert), Some(key)) = (&self.client_cert, &self.client_key) {
            config = config.with_client_cert(cert, key);
        }
        config
    }
}

fn pipeline(config: &Config) -> Result<Pipeline> {
    if config.json_url.is_empty() {
        bail!("JSON_URL is not set");
    }
    let content = ContentClient::new(config).context("Failed to set up content server client")?;
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;
    let catalog = Arc::new(Catalog::new(client, &config.json_url));
    Ok(Pipeline::new(content, catalog))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "toniefinder=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.settings.config();

    match cli.command {
        Command::Identify { files } => {
            let pipeline = pipeline(&config)?;
            pipeline
                .catalog()
                .refresh()
                .await
                .context("Failed to load catalog")?;

            for file in files {
                identify_file(&pipeline, &file).await;
            }
        }
        Command::Watch => {
            let pipeline = pipeline(&config)?;
            pipeline.catalog().spawn_refresh(config.refresh_period);

            info!("Reading .nfc paths from stdin");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let path = line.trim();
                if path.is_empty() {
                    continue;
                }
                identify_file(&pipeline, Path::new(path)).await;
            }
        }
        Command::Add { data_url } => {
            let registrar = TeddyCloud::from_config(&config)?;
            match toniefinder::pipeline::add(registrar.as_ref(), &data_url).await {
                Ok(name) => println!("Successfully added tonie: {name}"),
                Err(e) => {
                    println!("Failed to add tonie: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// One file is one inbound event; failures are reported and never abort the loop.
async fn identify_file(pipeline: &Pipeline, path: &Path) {
    let is_nfc = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("nfc"));
    if !is_nfc {
        info!(path = %path.display(), "Ignoring non-NFC file");
        return;
    }

    info!(path = %path.display(), "Processing NFC file");
    let dump = match tokio::fs::read_to_string(path).await {
        Ok(dump) => dump,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read NFC file");
            return;
        }
    };

    let link = path.to_string_lossy();
    match pipeline.identify(&dump, Some(&*link)).await {
        Ok(identified) => println!("{}\n", identified.message),
        Err(e) => println!("{}: {e}\n", path.display()),
    }
}
