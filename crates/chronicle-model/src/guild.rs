use serde::{Deserialize, Serialize};

use crate::id::Id;

const CDN: &str = "https://cdn.discordapp.com";

/// A guild (server) the exported channel belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Id,
    pub name: String,
    #[serde(default, rename = "icon")]
    pub icon_hash: Option<String>,
}

impl Guild {
    /// Sentinel guild used for direct-message channels, which have no guild
    /// of their own.
    pub fn direct_messages() -> Self {
        Self {
            id: Id::new(0),
            name: "Direct Messages".to_string(),
            icon_hash: None,
        }
    }

    pub fn is_direct_messages(&self) -> bool {
        self.id.value() == 0
    }

    pub fn icon_url(&self) -> String {
        match &self.icon_hash {
            Some(hash) => format!("{CDN}/icons/{}/{hash}.png", self.id),
            None => format!("{CDN}/embed/avatars/0.png"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dm_sentinel() {
        let guild = Guild::direct_messages();
        assert!(guild.is_direct_messages());
        assert_eq!(guild.name, "Direct Messages");
    }

    #[test]
    fn icon_url_falls_back_when_unset() {
        let guild = Guild {
            id: Id::new(42),
            name: "test".into(),
            icon_hash: None,
        };
        assert!(guild.icon_url().contains("embed/avatars"));
    }

    #[test]
    fn parses_wire_json() {
        let guild: Guild =
            serde_json::from_str(r#"{"id":"123","name":"My Guild","icon":"abc","owner_id":"9"}"#)
                .unwrap();
        assert_eq!(guild.id.value(), 123);
        assert_eq!(guild.icon_url(), "https://cdn.discordapp.com/icons/123/abc.png");
    }
}
