//! Content server access.
//!
//! The first bytes of every tonie audio file are a header block:
//!
//! ```text
//! [header_len: u32 big-endian] [TonieboxAudioFileHeader: header_len bytes] [audio ...]
//! ```
//!
//! Only the header is needed to learn the audio id, so requests ask for the
//! first 4096 bytes of the file instead of the whole (possibly huge) payload.

use prost::Message;
use reqwest::header::{AUTHORIZATION, RANGE};
use reqwest::{Client, Identity, StatusCode};
use tracing::{debug, instrument, trace, warn};

use crate::config::Config;
use crate::proto::toniebox::TonieboxAudioFileHeader;
use crate::{Error, Result};

/// Byte range covering the header block.
const HEADER_RANGE: &str = "bytes=0-4095";

/// Size of the big-endian length prefix.
const LENGTH_PREFIX: usize = 4;

/// Header fields extracted from a content response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHeader {
    /// Declared length of the encoded header.
    pub header_length: u32,
    pub audio_id: u32,
    /// SHA-1 of the audio data as lower-case hex, if present.
    pub hash: Option<String>,
    /// Audio payload size in bytes.
    pub size: u64,
    pub track_count: usize,
}

impl AudioHeader {
    /// Parse a response body: 4-byte big-endian length, then the protobuf header.
    ///
    /// Fails with [`Error::TruncatedHeader`] when fewer bytes than declared are
    /// available, and with [`Error::Proto`] when the header does not decode.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let Some((prefix, rest)) = data.split_first_chunk::<LENGTH_PREFIX>() else {
            return Err(Error::TruncatedHeader {
                expected: LENGTH_PREFIX,
                actual: data.len(),
            });
        };
        let header_length = u32::from_be_bytes(*prefix);
        let len = header_length as usize;

        if rest.len() < len {
            warn!(expected = len, got = rest.len(), "Incomplete content header");
            return Err(Error::TruncatedHeader {
                expected: len,
                actual: rest.len(),
            });
        }

        let header = TonieboxAudioFileHeader::decode(&rest[..len])?;
        trace!(
            header_length,
            audio_id = header.audio_id,
            num_bytes = header.num_bytes,
            tracks = header.track_page_nums.len(),
            "Decoded content header"
        );

        Ok(Self {
            header_length,
            audio_id: header.audio_id,
            hash: to_hex(&header.sha1_hash),
            size: header.num_bytes,
            track_count: header.track_page_nums.len(),
        })
    }

    /// Audio id in the string form used by the catalog lookup.
    pub fn audio_id_str(&self) -> String {
        self.audio_id.to_string()
    }
}

fn to_hex(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    Some(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Client for the vendor content server.
#[derive(Debug, Clone)]
pub struct ContentClient {
    client: Client,
    base_url: String,
}

impl ContentClient {
    /// Build a client from configuration.
    ///
    /// Loads the mTLS certificate and key once. Server certificate validation
    /// is disabled for the content server.
    pub fn new(config: &Config) -> Result<Self> {
        let cert = config
            .client_cert
            .as_ref()
            .ok_or_else(|| Error::Config("client certificate not configured".into()))?;

        let mut pem = std::fs::read(&cert.cert_path)?;
        pem.push(b'\n');
        pem.extend(std::fs::read(&cert.key_path)?);
        let identity = Identity::from_pem(&pem).map_err(|e| {
            Error::Config(format!(
                "invalid client certificate {} / {}: {e}",
                cert.cert_path.display(),
                cert.key_path.display()
            ))
        })?;

        warn!(
            url = %config.content_url,
            "Server certificate validation disabled for content server"
        );

        let client = Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .danger_accept_invalid_certs(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self::with_client(client, &config.content_url))
    }

    /// Use a prepared HTTP client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the content header for a tag and extract its audio id.
    ///
    /// Single attempt; the caller re-triggers by submitting the tag again.
    #[instrument(skip_all, fields(ruid = %ruid))]
    pub async fn resolve(&self, ruid: &str, auth: &str) -> Result<AudioHeader> {
        if ruid.is_empty() {
            return Err(Error::InvalidArgument("ruid"));
        }
        if auth.is_empty() {
            return Err(Error::InvalidArgument("auth"));
        }

        let url = format!("{}/v2/content/{}", self.base_url, ruid);
        debug!(url, "Fetching content header");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("BD {auth}"))
            .header(RANGE, HEADER_RANGE)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            warn!(status = status.as_u16(), "Unexpected response code");
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), status = status.as_u16(), "Got content header");

        AudioHeader::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(header: &TonieboxAudioFileHeader) -> Vec<u8> {
        let encoded = header.encode_to_vec();
        let mut buf = (encoded.len() as u32).to_be_bytes().to_vec();
        buf.extend(encoded);
        buf
    }

    #[test]
    fn parses_audio_id() {
        let data = frame(&TonieboxAudioFileHeader {
            audio_id: 123_456,
            ..Default::default()
        });
        let header = AudioHeader::parse(&data).unwrap();
        assert_eq!(header.audio_id_str(), "123456");
        assert_eq!(header.hash, None);
    }

    #[test]
    fn parses_extended_fields() {
        let data = frame(&TonieboxAudioFileHeader {
            sha1_hash: vec![0xde, 0xad, 0xbe, 0xef],
            num_bytes: 75_874_560,
            audio_id: 1_573_736_339,
            track_page_nums: vec![0, 120, 400],
            fill: vec![0; 32],
        });
        let header = AudioHeader::parse(&data).unwrap();
        assert_eq!(header.audio_id, 1_573_736_339);
        assert_eq!(header.hash.as_deref(), Some("deadbeef"));
        assert_eq!(header.size, 75_874_560);
        assert_eq!(header.track_count, 3);
        assert_eq!(header.header_length as usize, data.len() - 4);
    }

    #[test]
    fn trailing_audio_bytes_are_ignored() {
        let mut data = frame(&TonieboxAudioFileHeader {
            audio_id: 7,
            ..Default::default()
        });
        data.extend([0x4f, 0x67, 0x67, 0x53]);
        assert_eq!(AudioHeader::parse(&data).unwrap().audio_id, 7);
    }

    #[test]
    fn short_prefix_is_truncated() {
        let err = AudioHeader::parse(&[0, 0]).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { expected: 4, actual: 2 }));
    }

    #[test]
    fn short_body_is_truncated() {
        let mut data = 100u32.to_be_bytes().to_vec();
        data.extend([0x18, 0x2a, 0, 0, 0, 0, 0, 0, 0, 0]);
        let err = AudioHeader::parse(&data).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedHeader {
                expected: 100,
                actual: 10
            }
        ));
    }

    #[test]
    fn malformed_header_is_decode_error() {
        let mut data = 3u32.to_be_bytes().to_vec();
        data.extend([0xff, 0xff, 0xff]);
        assert!(matches!(AudioHeader::parse(&data), Err(Error::Proto(_))));
    }

    #[test]
    fn empty_header_decodes_to_defaults() {
        let header = AudioHeader::parse(&0u32.to_be_bytes()).unwrap();
        assert_eq!(header.audio_id, 0);
        assert_eq!(header.track_count, 0);
    }

    #[tokio::test]
    async fn resolve_rejects_empty_arguments() {
        let client = ContentClient::with_client(Client::new(), "http://127.0.0.1:9");
        assert!(matches!(
            client.resolve("", "aa").await,
            Err(Error::InvalidArgument("ruid"))
        ));
        assert!(matches!(
            client.resolve("aa", "").await,
            Err(Error::InvalidArgument("auth"))
        ));
    }

    #[test]
    fn new_requires_client_cert() {
        let config = Config::new("http://catalog.invalid");
        assert!(matches!(ContentClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn malformed_pem_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("client.crt");
        let key = dir.path().join("client.key");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let config = Config::new("http://catalog.invalid").with_client_cert(&cert, &key);
        match ContentClient::new(&config) {
            Err(Error::Config(msg)) => assert!(msg.contains("client.crt")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
