use serde::{Deserialize, Serialize};

use crate::id::Id;
use crate::user::User;

/// The upstream channel type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    GuildText,
    DirectMessage,
    GuildVoice,
    GroupDirectMessage,
    Category,
    News,
    NewsThread,
    PublicThread,
    PrivateThread,
    Stage,
    Forum,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::GuildText,
            1 => Self::DirectMessage,
            2 => Self::GuildVoice,
            3 => Self::GroupDirectMessage,
            4 => Self::Category,
            5 => Self::News,
            10 => Self::NewsThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::Stage,
            15 => Self::Forum,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> u8 {
        match kind {
            ChannelKind::GuildText => 0,
            ChannelKind::DirectMessage => 1,
            ChannelKind::GuildVoice => 2,
            ChannelKind::GroupDirectMessage => 3,
            ChannelKind::Category => 4,
            ChannelKind::News => 5,
            ChannelKind::NewsThread => 10,
            ChannelKind::PublicThread => 11,
            ChannelKind::PrivateThread => 12,
            ChannelKind::Stage => 13,
            ChannelKind::Forum => 15,
            ChannelKind::Other(other) => other,
        }
    }
}

impl ChannelKind {
    pub fn is_thread(self) -> bool {
        matches!(
            self,
            Self::NewsThread | Self::PublicThread | Self::PrivateThread
        )
    }

    pub fn is_direct(self) -> bool {
        matches!(self, Self::DirectMessage | Self::GroupDirectMessage)
    }

    pub fn is_voice(self) -> bool {
        matches!(self, Self::GuildVoice | Self::Stage)
    }
}

/// A channel or thread.
///
/// Channels form a forest of at most two levels: category → channel → thread.
/// The parent back-reference is resolved by the client after fetching, not
/// parsed from the wire payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub guild_id: Option<Id>,
    #[serde(default)]
    pub parent_id: Option<Id>,
    #[serde(skip)]
    pub parent: Option<Box<Channel>>,
    #[serde(default, rename = "name")]
    raw_name: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub last_message_id: Option<Id>,
    #[serde(default)]
    recipients: Option<Vec<User>>,
}

impl Channel {
    /// Display name: the wire name when set, otherwise derived from DM
    /// recipients, otherwise the raw id.
    pub fn name(&self) -> String {
        if let Some(name) = &self.raw_name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        if let Some(recipients) = &self.recipients {
            if !recipients.is_empty() {
                return recipients
                    .iter()
                    .map(|u| u.display_name_or_name().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
            }
        }
        self.id.to_string()
    }

    /// Parent names joined down to this channel, e.g. `Info / rules / q&a`.
    pub fn hierarchical_name(&self) -> String {
        let mut parts = vec![self.name()];
        let mut cursor = self.parent.as_deref();
        while let Some(parent) = cursor {
            parts.push(parent.name());
            cursor = parent.parent.as_deref();
        }
        parts.reverse();
        parts.join(" / ")
    }

    pub fn is_empty(&self) -> bool {
        self.last_message_id.is_none()
    }

    /// Whether any message can exist strictly after the given cursor.
    pub fn may_have_messages_after(&self, cursor: Id) -> bool {
        match self.last_message_id {
            Some(last) => cursor < last,
            None => false,
        }
    }

    /// Whether any message can exist strictly before the given cursor.
    ///
    /// The channel's own id bounds the earliest possible message id.
    pub fn may_have_messages_before(&self, cursor: Id) -> bool {
        !self.is_empty() && cursor > self.id
    }

    pub fn with_parent(mut self, parent: Option<Channel>) -> Self {
        self.parent = parent.map(Box::new);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(json: &str) -> Channel {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn kind_mapping_round_trips() {
        for raw in [0u8, 1, 2, 3, 4, 5, 10, 11, 12, 13, 15, 99] {
            assert_eq!(u8::from(ChannelKind::from(raw)), raw);
        }
        assert!(ChannelKind::from(11).is_thread());
        assert!(!ChannelKind::from(0).is_thread());
    }

    #[test]
    fn empty_channel_has_no_messages_in_any_range() {
        let ch = channel(r#"{"id":"100","type":0,"name":"general"}"#);
        assert!(ch.is_empty());
        assert!(!ch.may_have_messages_after(Id::new(1)));
        assert!(!ch.may_have_messages_before(Id::new(u64::MAX)));
    }

    #[test]
    fn range_probes_respect_bounds() {
        let ch = channel(r#"{"id":"100","type":0,"name":"general","last_message_id":"500"}"#);
        assert!(ch.may_have_messages_after(Id::new(499)));
        assert!(!ch.may_have_messages_after(Id::new(500)));
        assert!(ch.may_have_messages_before(Id::new(101)));
        assert!(!ch.may_have_messages_before(Id::new(100)));
    }

    #[test]
    fn hierarchical_name_joins_parents() {
        let category = channel(r#"{"id":"1","type":4,"name":"Info"}"#);
        let parent = channel(r#"{"id":"2","type":0,"name":"rules"}"#).with_parent(Some(category));
        let thread = channel(r#"{"id":"3","type":11,"name":"q&a"}"#).with_parent(Some(parent));
        assert_eq!(thread.hierarchical_name(), "Info / rules / q&a");
    }

    #[test]
    fn dm_name_from_recipients() {
        let ch = channel(
            r#"{"id":"9","type":1,"recipients":[{"id":"1","username":"alice"},{"id":"2","username":"bob"}]}"#,
        );
        assert_eq!(ch.name(), "alice, bob");
    }
}
