//! Flipper Zero NFC dump parsing.
//!
//! A tonie tag dump contains, among other lines:
//!
//! ```text
//! UID: E0 04 03 50 0A 1B 2C 3D
//! Data Content: 3F 2A 11 ...
//! ```
//!
//! The UID is stored little-endian on the tag; the content server expects it
//! reversed ("rUID"). The data content is the auth token and is used verbatim.

use crate::{Error, Result};

const UID_MARKER: &str = "UID:";
const DATA_MARKER: &str = "Data Content:";

/// Tag identity extracted from a dump.
///
/// Either field may be missing if the dump lacked the corresponding line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTag {
    ruid: Option<String>,
    auth: Option<String>,
}

impl DecodedTag {
    /// Parse a raw dump. Never fails; check [`is_valid`](Self::is_valid).
    pub fn parse(text: &str) -> Self {
        let mut tag = Self::default();
        // The earliest marker line decides, even when its value is empty.
        let (mut uid_seen, mut data_seen) = (false, false);

        for line in text.lines() {
            if !uid_seen && let Some(rest) = line.strip_prefix(UID_MARKER) {
                uid_seen = true;
                tag.ruid = non_empty(reverse_uid(rest));
            } else if !data_seen && let Some(rest) = line.strip_prefix(DATA_MARKER) {
                data_seen = true;
                tag.auth = non_empty(compact(rest));
            }
        }

        tag
    }

    /// Reversed UID as lower-case hex.
    pub fn ruid(&self) -> Option<&str> {
        self.ruid.as_deref()
    }

    /// Auth token as lower-case hex.
    pub fn auth(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    /// Both UID and auth data are present.
    pub fn is_valid(&self) -> bool {
        self.ruid.is_some() && self.auth.is_some()
    }

    /// Auth token is all zeros: a blank, rewritable tag.
    pub fn is_custom_tag(&self) -> bool {
        self.auth
            .as_deref()
            .is_some_and(|auth| auth.chars().all(|c| c == '0'))
    }

    /// Lookup keys `(ruid, auth)` for a catalog tag.
    pub fn keys(&self) -> Result<(&str, &str)> {
        let (Some(ruid), Some(auth)) = (self.ruid(), self.auth()) else {
            return Err(Error::IncompleteTag);
        };
        if self.is_custom_tag() {
            return Err(Error::CustomTag);
        }
        Ok((ruid, auth))
    }
}

/// Drop whitespace and `:` separators, lower-case.
fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Compact the UID and reverse its byte order.
fn reverse_uid(s: &str) -> String {
    let hex: Vec<char> = compact(s).chars().collect();
    hex.chunks(2).rev().flatten().collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DUMP: &str = "Filetype: Flipper NFC device\n\
        Version: 4\n\
        Device type: SLIX\n\
        UID: E0 04 03 50 0A 1B 2C 3D\n\
        Data Content: 3F 2A 11 00 AB CD EF 01\n";

    #[test]
    fn parses_flipper_dump() {
        let tag = DecodedTag::parse(DUMP);
        assert!(tag.is_valid());
        assert!(!tag.is_custom_tag());
        assert_eq!(tag.ruid(), Some("3d2c1b0a500304e0"));
        assert_eq!(tag.auth(), Some("3f2a1100abcdef01"));
    }

    #[rstest]
    #[case("UID: 04 A2 3B 99", "993ba204")]
    #[case("UID: AA BB CC DD", "ddccbbaa")]
    #[case("UID:aa:bb:cc", "ccbbaa")]
    #[case("UID: 01", "01")]
    fn reverses_uid_bytes(#[case] line: &str, #[case] expected: &str) {
        let tag = DecodedTag::parse(line);
        assert_eq!(tag.ruid(), Some(expected));
    }

    #[test]
    fn auth_is_not_reversed() {
        let tag = DecodedTag::parse("Data Content: 01 02 03");
        assert_eq!(tag.auth(), Some("010203"));
    }

    #[test]
    fn missing_lines_leave_fields_unset() {
        let tag = DecodedTag::parse("UID: 01 02\n");
        assert!(!tag.is_valid());
        assert_eq!(tag.auth(), None);
        assert!(matches!(tag.keys(), Err(Error::IncompleteTag)));

        let tag = DecodedTag::parse("garbage\nmore garbage");
        assert_eq!(tag, DecodedTag::default());
    }

    #[test]
    fn empty_marker_leaves_field_unset() {
        let tag = DecodedTag::parse("UID:   \nData Content: 00");
        assert_eq!(tag.ruid(), None);
        assert!(!tag.is_valid());
    }

    #[test]
    fn first_marker_wins() {
        let tag = DecodedTag::parse("UID: 01 02\nData Content: aa\nUID: 03 04\nData Content: bb");
        assert_eq!(tag.ruid(), Some("0201"));
        assert_eq!(tag.auth(), Some("aa"));
    }

    #[test]
    fn empty_first_marker_is_not_overridden() {
        let tag = DecodedTag::parse("UID:\nUID: 01 02\nData Content:\nData Content: aa");
        assert_eq!(tag.ruid(), None);
        assert_eq!(tag.auth(), None);
        assert!(matches!(tag.keys(), Err(Error::IncompleteTag)));
    }

    #[rstest]
    #[case("00000000", true)]
    #[case("0", true)]
    #[case("00000001", false)]
    #[case("a0000000", false)]
    fn custom_tag_detection(#[case] auth: &str, #[case] custom: bool) {
        let tag = DecodedTag::parse(&format!("UID: 11 22\nData Content: {auth}"));
        assert_eq!(tag.is_custom_tag(), custom);
        if custom {
            assert!(matches!(tag.keys(), Err(Error::CustomTag)));
        } else {
            assert_eq!(tag.keys().unwrap(), ("2211", auth));
        }
    }

    #[test]
    fn no_auth_is_not_custom() {
        assert!(!DecodedTag::parse("UID: 11").is_custom_tag());
    }
}
