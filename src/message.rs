//! Notification composed from catalog metadata.

use std::fmt;

use chrono::DateTime;

use crate::Result;
use crate::catalog::ResolvedMetadata;
use crate::token::TagToken;

/// A named field of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Chat-ready description of an identified tonie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonieMessage {
    pub title: String,
    pub description: String,
    /// Link to the submitted dump.
    pub url: Option<String>,
    pub fields: Vec<Field>,
    pub thumbnail: Option<String>,
    pub footer: Option<String>,
    /// Continuation token URL, parsed back by the "add" reply.
    pub footer_icon_url: String,
}

impl TonieMessage {
    /// Fails only if the token cannot be encoded.
    pub fn compose(
        metadata: &ResolvedMetadata,
        url: Option<&str>,
        token: &TagToken,
    ) -> Result<Self> {
        let mut fields = Vec::new();

        if let Some(language) = &metadata.language {
            fields.push(Field {
                name: "Language".into(),
                value: language.clone(),
                inline: true,
            });
        }
        if let Some(category) = &metadata.category {
            fields.push(Field {
                name: "Category".into(),
                value: category.clone(),
                inline: true,
            });
        }
        if !metadata.tracks.is_empty() {
            let listing = metadata
                .tracks
                .iter()
                .enumerate()
                .map(|(i, track)| format!("{}. {}", i + 1, track))
                .collect::<Vec<_>>()
                .join("\n");
            fields.push(Field {
                name: format!("Tracks [{}]", metadata.tracks.len()),
                value: listing,
                inline: false,
            });
        }

        Ok(Self {
            title: metadata
                .episode
                .clone()
                .unwrap_or_else(|| "No episode available".into()),
            description: metadata
                .series
                .clone()
                .unwrap_or_else(|| "No series available".into()),
            url: url.map(str::to_string),
            fields,
            thumbnail: metadata.image.clone(),
            footer: metadata.release.and_then(release_footer),
            footer_icon_url: token.to_data_url()?,
        })
    }
}

fn release_footer(timestamp: i64) -> Option<String> {
    let date = DateTime::from_timestamp(timestamp, 0)?;
    Some(format!("Released: {}", date.format("%Y-%m-%d")))
}

impl fmt::Display for TonieMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.description)?;
        if let Some(url) = &self.url {
            writeln!(f, "{url}")?;
        }
        for field in &self.fields {
            if field.inline {
                writeln!(f, "{}: {}", field.name, field.value)?;
            } else {
                writeln!(f, "{}:\n{}", field.name, field.value)?;
            }
        }
        if let Some(thumbnail) = &self.thumbnail {
            writeln!(f, "Image: {thumbnail}")?;
        }
        if let Some(footer) = &self.footer {
            writeln!(f, "{footer}")?;
        }
        write!(f, "{}", self.footer_icon_url)
    }
}
