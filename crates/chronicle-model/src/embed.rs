use serde::{Deserialize, Serialize};

use crate::role::Color;

/// Hosts that only permit one image per embed. When such a host needs to show
/// several images it sends follow-up image-only embeds with the same url.
const ONE_IMAGE_PER_EMBED_HOSTS: &[&str] = &["twitter.com", "x.com"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default, rename = "inline")]
    pub is_inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, deserialize_with = "crate::role::nullable_color")]
    pub color: Option<Color>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<EmbedAuthor>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default)]
    pub thumbnail: Option<EmbedImage>,
    #[serde(default)]
    pub image: Option<EmbedImage>,
    // Populated by normalisation when a host splits a gallery into multiple
    // single-image embeds.
    #[serde(default)]
    pub images: Vec<EmbedImage>,
    #[serde(default)]
    pub footer: Option<EmbedFooter>,
    #[serde(default)]
    pub video: Option<EmbedImage>,
}

impl Embed {
    /// All images carried by this embed, primary first.
    pub fn all_images(&self) -> Vec<&EmbedImage> {
        self.image.iter().chain(self.images.iter()).collect()
    }

    fn is_image_only(&self) -> bool {
        self.image.is_some()
            && self.title.is_none()
            && self.description.is_none()
            && self.author.is_none()
            && self.fields.is_empty()
            && self.footer.is_none()
    }

    fn url_host(&self) -> Option<&str> {
        let url = self.url.as_deref()?;
        let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))?;
        let host = rest.split(['/', '?', '#']).next()?;
        Some(host.strip_prefix("www.").unwrap_or(host))
    }

    fn is_gallery_head(&self) -> bool {
        self.url_host()
            .map(|host| ONE_IMAGE_PER_EMBED_HOSTS.contains(&host))
            .unwrap_or(false)
    }
}

/// Collapse gallery embeds: a follow-up image-only embed sharing the url of a
/// preceding one-image-per-embed host entry is absorbed into it.
///
/// The pass is transitive (one head can absorb several trailers) and
/// idempotent — running it over already-normalised input changes nothing.
pub fn normalize_embeds(embeds: Vec<Embed>) -> Vec<Embed> {
    let mut result: Vec<Embed> = Vec::with_capacity(embeds.len());

    for embed in embeds {
        if let Some(last) = result.last_mut() {
            let absorbable = last.is_gallery_head()
                && embed.is_image_only()
                && last.url.is_some()
                && last.url == embed.url;
            if absorbable {
                if let Some(image) = embed.image {
                    last.images.push(image);
                }
                continue;
            }
        }
        result.push(embed);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str) -> EmbedImage {
        EmbedImage {
            url: url.to_string(),
            width: None,
            height: None,
        }
    }

    fn gallery_head(url: &str, img: &str) -> Embed {
        Embed {
            title: Some("A post".into()),
            url: Some(url.to_string()),
            image: Some(image(img)),
            ..empty()
        }
    }

    fn image_only(url: &str, img: &str) -> Embed {
        Embed {
            url: Some(url.to_string()),
            image: Some(image(img)),
            ..empty()
        }
    }

    fn empty() -> Embed {
        Embed {
            title: None,
            url: None,
            timestamp: None,
            color: None,
            description: None,
            author: None,
            fields: Vec::new(),
            thumbnail: None,
            image: None,
            images: Vec::new(),
            footer: None,
            video: None,
        }
    }

    #[test]
    fn absorbs_consecutive_gallery_images() {
        let url = "https://twitter.com/user/status/1";
        let embeds = vec![
            gallery_head(url, "https://img/1.png"),
            image_only(url, "https://img/2.png"),
            image_only(url, "https://img/3.png"),
        ];

        let normalized = normalize_embeds(embeds);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].all_images().len(), 3);
    }

    #[test]
    fn unrelated_hosts_left_alone() {
        let embeds = vec![
            gallery_head("https://example.com/a", "https://img/1.png"),
            image_only("https://example.com/a", "https://img/2.png"),
        ];
        assert_eq!(normalize_embeds(embeds).len(), 2);
    }

    #[test]
    fn different_urls_not_merged() {
        let embeds = vec![
            gallery_head("https://twitter.com/u/1", "https://img/1.png"),
            image_only("https://twitter.com/u/2", "https://img/2.png"),
        ];
        assert_eq!(normalize_embeds(embeds).len(), 2);
    }

    #[test]
    fn normalization_is_idempotent() {
        let url = "https://x.com/user/status/9";
        let embeds = vec![
            gallery_head(url, "https://img/1.png"),
            image_only(url, "https://img/2.png"),
        ];

        let once = normalize_embeds(embeds);
        let twice = normalize_embeds(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn no_two_consecutive_embeds_share_a_gallery_url() {
        let url = "https://twitter.com/user/status/5";
        let embeds = vec![
            gallery_head(url, "https://img/1.png"),
            image_only(url, "https://img/2.png"),
            gallery_head("https://twitter.com/other/2", "https://img/3.png"),
        ];

        let normalized = normalize_embeds(embeds);
        for pair in normalized.windows(2) {
            assert!(
                !(pair[0].is_gallery_head() && pair[0].url == pair[1].url
                    && pair[1].is_image_only())
            );
        }
    }
}
