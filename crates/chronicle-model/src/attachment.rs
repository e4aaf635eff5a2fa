use serde::{Deserialize, Serialize};

use crate::id::Id;

const CDN: &str = "https://cdn.discordapp.com";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "wmv", "flv", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "opus"];

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Id,
    pub url: String,
    #[serde(rename = "filename")]
    pub file_name: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl Attachment {
    fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    fn has_extension_in(&self, set: &[&str]) -> bool {
        self.extension()
            .map(|ext| set.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    pub fn is_image(&self) -> bool {
        self.has_extension_in(IMAGE_EXTENSIONS)
    }

    pub fn is_video(&self) -> bool {
        self.has_extension_in(VIDEO_EXTENSIONS)
    }

    pub fn is_audio(&self) -> bool {
        self.has_extension_in(AUDIO_EXTENSIONS)
    }

    pub fn is_spoiler(&self) -> bool {
        self.file_name.starts_with("SPOILER_")
    }
}

/// An emoji, either a guild custom emoji (with an id) or a standard unicode
/// emoji (name holds the literal characters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default, deserialize_with = "nullable_name")]
    pub name: String,
    #[serde(default, rename = "animated")]
    pub is_animated: bool,
}

fn nullable_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Emoji {
    pub fn custom(id: Id, name: &str, is_animated: bool) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            is_animated,
        }
    }

    pub fn standard(chars: &str) -> Self {
        Self {
            id: None,
            name: chars.to_string(),
            is_animated: false,
        }
    }

    /// Identity used for reaction lookups and de-duplication: the id for
    /// custom emoji, the literal characters otherwise.
    pub fn code(&self) -> String {
        match self.id {
            Some(id) => format!("{}:{id}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn image_url(&self) -> String {
        match self.id {
            Some(id) => {
                let ext = if self.is_animated { "gif" } else { "png" };
                format!("{CDN}/emojis/{id}.{ext}")
            }
            None => {
                let code = self
                    .name
                    .chars()
                    .map(|c| format!("{:x}", c as u32))
                    .collect::<Vec<_>>()
                    .join("-");
                format!("https://cdn.jsdelivr.net/gh/jdecked/twemoji@latest/assets/svg/{code}.svg")
            }
        }
    }
}

/// Aggregated reactions on a message: one entry per emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: Emoji,
    pub count: u64,
}

/// The sticker image encoding advertised by the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum StickerFormat {
    Png,
    Apng,
    Lottie,
    Gif,
    Other(u8),
}

impl From<u8> for StickerFormat {
    fn from(raw: u8) -> Self {
        match raw {
            1 => Self::Png,
            2 => Self::Apng,
            3 => Self::Lottie,
            4 => Self::Gif,
            other => Self::Other(other),
        }
    }
}

impl From<StickerFormat> for u8 {
    fn from(format: StickerFormat) -> u8 {
        match format {
            StickerFormat::Png => 1,
            StickerFormat::Apng => 2,
            StickerFormat::Lottie => 3,
            StickerFormat::Gif => 4,
            StickerFormat::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: Id,
    pub name: String,
    #[serde(rename = "format_type")]
    pub format: StickerFormat,
}

impl Sticker {
    pub fn source_url(&self) -> String {
        let ext = match self.format {
            StickerFormat::Lottie => "json",
            StickerFormat::Gif => "gif",
            _ => "png",
        };
        format!("{CDN}/stickers/{}.{ext}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(file_name: &str) -> Attachment {
        Attachment {
            id: Id::new(1),
            url: format!("https://cdn.example.com/{file_name}"),
            file_name: file_name.to_string(),
            size_bytes: 1024,
            width: None,
            height: None,
        }
    }

    #[test]
    fn media_kind_from_extension() {
        assert!(attachment("photo.PNG").is_image());
        assert!(attachment("clip.mp4").is_video());
        assert!(attachment("song.flac").is_audio());
        assert!(!attachment("notes.txt").is_image());
        assert!(!attachment("no_extension").is_image());
    }

    #[test]
    fn spoiler_prefix() {
        assert!(attachment("SPOILER_secret.png").is_spoiler());
        assert!(!attachment("secret.png").is_spoiler());
    }

    #[test]
    fn emoji_codes() {
        let custom = Emoji::custom(Id::new(7), "pepe", false);
        assert_eq!(custom.code(), "pepe:7");
        assert_eq!(custom.image_url(), "https://cdn.discordapp.com/emojis/7.png");

        let standard = Emoji::standard("🔥");
        assert_eq!(standard.code(), "🔥");
        assert!(standard.image_url().ends_with("1f525.svg"));
    }

    #[test]
    fn reaction_emoji_parses_null_name() {
        // Deleted custom emoji come back with a null name.
        let reaction: Reaction =
            serde_json::from_str(r#"{"emoji":{"id":"5","name":null},"count":3}"#).unwrap();
        assert_eq!(reaction.emoji.name, "");
        assert_eq!(reaction.count, 3);
    }
}
