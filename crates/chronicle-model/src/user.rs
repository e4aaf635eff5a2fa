use serde::{Deserialize, Deserializer, Serialize};

use crate::id::Id;

const CDN: &str = "https://cdn.discordapp.com";

/// A user account as returned by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(rename = "username")]
    pub name: String,
    #[serde(default, rename = "global_name")]
    pub display_name: Option<String>,
    #[serde(default, rename = "bot")]
    pub is_bot: bool,
    // Accounts migrated to the unified-username scheme report "0"; that is
    // normalised to None here and never special-cased again.
    #[serde(default, deserialize_with = "discriminator_from_raw")]
    pub discriminator: Option<u16>,
    #[serde(default, rename = "avatar")]
    pub avatar_hash: Option<String>,
}

fn discriminator_from_raw<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.parse::<u16>().ok())
        .filter(|&d| d != 0))
}

impl User {
    /// The name with the legacy `#0000` discriminator suffix when present.
    pub fn full_name(&self) -> String {
        match self.discriminator {
            Some(d) => format!("{}#{d:04}", self.name),
            None => self.name.clone(),
        }
    }

    /// The name shown in rendered output, preferring the profile display name.
    pub fn display_name_or_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn avatar_url(&self) -> String {
        if let Some(hash) = &self.avatar_hash {
            let ext = if hash.starts_with("a_") { "gif" } else { "png" };
            return format!("{CDN}/avatars/{}/{hash}.{ext}?size=512", self.id);
        }
        // Default avatars cycle through a fixed set; the index derivation
        // differs between the legacy and unified username schemes.
        let index = match self.discriminator {
            Some(d) => u64::from(d) % 5,
            None => (self.id.value() >> 22) % 6,
        };
        format!("{CDN}/embed/avatars/{index}.png")
    }
}

/// A user's guild-scoped profile: nickname, roles and avatar override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default, rename = "nick")]
    pub nickname: Option<String>,
    #[serde(default, rename = "roles")]
    pub role_ids: Vec<Id>,
    #[serde(default, rename = "avatar")]
    pub guild_avatar_hash: Option<String>,
    #[serde(default, skip_serializing)]
    pub guild_id: Option<Id>,
}

impl Member {
    /// Fallback member for users who are no longer in the guild.
    pub fn from_user(user: User) -> Self {
        Self {
            user,
            nickname: None,
            role_ids: Vec::new(),
            guild_avatar_hash: None,
            guild_id: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .unwrap_or_else(|| self.user.display_name_or_name())
    }

    pub fn avatar_url(&self) -> String {
        match (&self.guild_avatar_hash, self.guild_id) {
            (Some(hash), Some(guild_id)) => {
                let ext = if hash.starts_with("a_") { "gif" } else { "png" };
                format!(
                    "{CDN}/guilds/{guild_id}/users/{}/avatars/{hash}.{ext}?size=512",
                    self.user.id
                )
            }
            _ => self.user.avatar_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(json: &str) -> User {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn zero_discriminator_normalises_to_none() {
        let u = user(r#"{"id":"1","username":"alice","discriminator":"0"}"#);
        assert_eq!(u.discriminator, None);
        assert_eq!(u.full_name(), "alice");
    }

    #[test]
    fn legacy_discriminator_kept_and_padded() {
        let u = user(r#"{"id":"1","username":"bob","discriminator":"0042"}"#);
        assert_eq!(u.discriminator, Some(42));
        assert_eq!(u.full_name(), "bob#0042");
    }

    #[test]
    fn default_avatar_derivation() {
        let legacy = user(r#"{"id":"1","username":"a","discriminator":"0007"}"#);
        assert!(legacy.avatar_url().ends_with("embed/avatars/2.png"));

        let unified = user(r#"{"id":"175928847299117063","username":"b"}"#);
        let index = (175928847299117063u64 >> 22) % 6;
        assert!(unified
            .avatar_url()
            .ends_with(&format!("embed/avatars/{index}.png")));
    }

    #[test]
    fn member_display_name_prefers_nickname() {
        let u = user(r#"{"id":"1","username":"alice","global_name":"Alice A"}"#);
        let mut member = Member::from_user(u);
        assert_eq!(member.display_name(), "Alice A");
        member.nickname = Some("al".into());
        assert_eq!(member.display_name(), "al");
    }

    #[test]
    fn fallback_member_has_no_roles() {
        let member = Member::from_user(user(r#"{"id":"1","username":"gone"}"#));
        assert!(member.role_ids.is_empty());
        assert_eq!(member.nickname, None);
    }
}
