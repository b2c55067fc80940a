//! Decode a tonie content header from a saved response or a hex string.
//!
//! Usage: cargo run --bin decode <path | hex>
//!
//! Input is the start of a content response: 4-byte big-endian length
//! followed by the TonieboxAudioFileHeader protobuf.

use std::path::Path;

use anyhow::{Context, Result, bail};
use prost::Message;
use toniefinder::proto::toniebox::TonieboxAudioFileHeader;

fn main() -> Result<()> {
    let Some(input) = std::env::args().nth(1) else {
        bail!("Usage: decode <path | hex>");
    };

    let data = read_input(&input)?;
    println!("Raw bytes: {} bytes", data.len());
    println!();

    decode_frame(&data);
    Ok(())
}

/// A saved response body, or its hex dump (spaces allowed).
fn read_input(input: &str) -> Result<Vec<u8>> {
    if Path::new(input).is_file() {
        return std::fs::read(input).with_context(|| format!("Failed to read {input}"));
    }

    let hex: Vec<u8> = input.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if !hex.len().is_multiple_of(2) {
        bail!("Odd number of hex digits");
    }
    hex.chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .with_context(|| format!("Not a file or hex string: {input}"))
        })
        .collect()
}

fn decode_frame(data: &[u8]) {
    let Some((prefix, rest)) = data.split_first_chunk::<4>() else {
        eprintln!("Too short for a length prefix: {} bytes", data.len());
        return;
    };
    let header_len = u32::from_be_bytes(*prefix) as usize;
    println!("Header length: {header_len} bytes ({} available)", rest.len());

    if rest.len() < header_len {
        eprintln!("Incomplete: expected {} bytes, got {}", header_len, rest.len());
        return;
    }

    match TonieboxAudioFileHeader::decode(&rest[..header_len]) {
        Ok(header) => {
            let hash: String = header.sha1_hash.iter().map(|b| format!("{:02x}", b)).collect();
            println!("TonieboxAudioFileHeader:");
            println!("  audio_id: {}", header.audio_id);
            println!("  sha1_hash: {hash}");
            println!("  num_bytes: {}", header.num_bytes);
            println!("  track_page_nums: {:?}", header.track_page_nums);
            println!("  fill: {} bytes", header.fill.len());
        }
        Err(e) => {
            eprintln!("Failed to decode TonieboxAudioFileHeader: {e}");
            println!("Raw: {:02x?}", &rest[..header_len.min(64)]);
        }
    }
}
