use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attachment::{Attachment, Reaction, Sticker};
use crate::embed::{normalize_embeds, Embed};
use crate::error::Result;
use crate::id::Id;
use crate::user::User;

/// The upstream message type discriminator.
///
/// Kinds 1 through 18 are system notifications: server events rendered with a
/// fallback text rather than user-authored content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum MessageKind {
    Default,
    RecipientAdd,
    RecipientRemove,
    Call,
    ChannelNameChange,
    ChannelIconChange,
    ChannelPinnedMessage,
    GuildMemberJoin,
    GuildBoost,
    GuildBoostTier1,
    GuildBoostTier2,
    GuildBoostTier3,
    ChannelFollowAdd,
    GuildDiscoveryDisqualified,
    GuildDiscoveryRequalified,
    GuildDiscoveryGracePeriodInitialWarning,
    GuildDiscoveryGracePeriodFinalWarning,
    ThreadCreated,
    Reply,
    ChatInputCommand,
    ThreadStarterMessage,
    GuildInviteReminder,
    ContextMenuCommand,
    AutoModerationAction,
    RoleSubscriptionPurchase,
    InteractionPremiumUpsell,
    StageStart,
    StageEnd,
    StageSpeaker,
    StageTopic,
    GuildApplicationPremiumSubscription,
    Other(u8),
}

impl From<u8> for MessageKind {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Default,
            1 => Self::RecipientAdd,
            2 => Self::RecipientRemove,
            3 => Self::Call,
            4 => Self::ChannelNameChange,
            5 => Self::ChannelIconChange,
            6 => Self::ChannelPinnedMessage,
            7 => Self::GuildMemberJoin,
            8 => Self::GuildBoost,
            9 => Self::GuildBoostTier1,
            10 => Self::GuildBoostTier2,
            11 => Self::GuildBoostTier3,
            12 => Self::ChannelFollowAdd,
            14 => Self::GuildDiscoveryDisqualified,
            15 => Self::GuildDiscoveryRequalified,
            16 => Self::GuildDiscoveryGracePeriodInitialWarning,
            17 => Self::GuildDiscoveryGracePeriodFinalWarning,
            18 => Self::ThreadCreated,
            19 => Self::Reply,
            20 => Self::ChatInputCommand,
            21 => Self::ThreadStarterMessage,
            22 => Self::GuildInviteReminder,
            23 => Self::ContextMenuCommand,
            24 => Self::AutoModerationAction,
            25 => Self::RoleSubscriptionPurchase,
            26 => Self::InteractionPremiumUpsell,
            27 => Self::StageStart,
            28 => Self::StageEnd,
            29 => Self::StageSpeaker,
            31 => Self::StageTopic,
            32 => Self::GuildApplicationPremiumSubscription,
            other => Self::Other(other),
        }
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> u8 {
        match kind {
            MessageKind::Default => 0,
            MessageKind::RecipientAdd => 1,
            MessageKind::RecipientRemove => 2,
            MessageKind::Call => 3,
            MessageKind::ChannelNameChange => 4,
            MessageKind::ChannelIconChange => 5,
            MessageKind::ChannelPinnedMessage => 6,
            MessageKind::GuildMemberJoin => 7,
            MessageKind::GuildBoost => 8,
            MessageKind::GuildBoostTier1 => 9,
            MessageKind::GuildBoostTier2 => 10,
            MessageKind::GuildBoostTier3 => 11,
            MessageKind::ChannelFollowAdd => 12,
            MessageKind::GuildDiscoveryDisqualified => 14,
            MessageKind::GuildDiscoveryRequalified => 15,
            MessageKind::GuildDiscoveryGracePeriodInitialWarning => 16,
            MessageKind::GuildDiscoveryGracePeriodFinalWarning => 17,
            MessageKind::ThreadCreated => 18,
            MessageKind::Reply => 19,
            MessageKind::ChatInputCommand => 20,
            MessageKind::ThreadStarterMessage => 21,
            MessageKind::GuildInviteReminder => 22,
            MessageKind::ContextMenuCommand => 23,
            MessageKind::AutoModerationAction => 24,
            MessageKind::RoleSubscriptionPurchase => 25,
            MessageKind::InteractionPremiumUpsell => 26,
            MessageKind::StageStart => 27,
            MessageKind::StageEnd => 28,
            MessageKind::StageSpeaker => 29,
            MessageKind::StageTopic => 31,
            MessageKind::GuildApplicationPremiumSubscription => 32,
            MessageKind::Other(other) => other,
        }
    }
}

impl MessageKind {
    pub fn raw(self) -> u8 {
        self.into()
    }
}

bitflags! {
    /// Message flag bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MessageFlags: u64 {
        const CROSSPOSTED = 1;
        const IS_CROSSPOST = 1 << 1;
        const SUPPRESS_EMBEDS = 1 << 2;
        const SOURCE_MESSAGE_DELETED = 1 << 3;
        const URGENT = 1 << 4;
        const HAS_THREAD = 1 << 5;
        const EPHEMERAL = 1 << 6;
        const LOADING = 1 << 7;
    }
}

impl<'de> Deserialize<'de> for MessageFlags {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u64::deserialize(deserializer)?;
        Ok(Self::from_bits_retain(raw))
    }
}

impl Serialize for MessageFlags {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

/// Pointer to the message a reply refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    #[serde(default)]
    pub message_id: Option<Id>,
    #[serde(default)]
    pub channel_id: Option<Id>,
    #[serde(default)]
    pub guild_id: Option<Id>,
}

/// The slash-command or context-menu invocation that produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Id,
    pub name: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CallInfo {
    #[serde(default)]
    ended_timestamp: Option<DateTime<Utc>>,
}

/// A single chat message with all referenced metadata inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub flags: MessageFlags,
    pub author: User,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    call: Option<CallInfo>,
    #[serde(default, rename = "pinned")]
    pub is_pinned: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default, rename = "sticker_items")]
    pub stickers: Vec<Sticker>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, rename = "mentions")]
    pub mentioned_users: Vec<User>,
    #[serde(default, rename = "message_reference")]
    pub reference: Option<MessageReference>,
    // The upstream inlines at most the direct parent; the chain is never
    // traversed further.
    #[serde(default)]
    pub referenced_message: Option<Box<Message>>,
    #[serde(default)]
    pub interaction: Option<Interaction>,
}

impl Message {
    /// Single point of translation from wire JSON. Applies embed
    /// normalisation to the message and its inlined parent.
    pub fn parse(value: serde_json::Value) -> Result<Self> {
        let mut message: Message = serde_json::from_value(value)?;
        message.embeds = normalize_embeds(std::mem::take(&mut message.embeds));
        if let Some(parent) = &mut message.referenced_message {
            parent.embeds = normalize_embeds(std::mem::take(&mut parent.embeds));
        }
        Ok(message)
    }

    pub fn is_system_notification(&self) -> bool {
        (1..=18).contains(&self.kind.raw())
    }

    pub fn is_reply(&self) -> bool {
        self.kind == MessageKind::Reply
    }

    /// Replies and interaction responses both render with a reference header.
    pub fn is_reply_like(&self) -> bool {
        self.is_reply() || self.interaction.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
            && self.attachments.is_empty()
            && self.embeds.is_empty()
            && self.stickers.is_empty()
    }

    pub fn call_ended_timestamp(&self) -> Option<DateTime<Utc>> {
        self.call.as_ref().and_then(|c| c.ended_timestamp)
    }

    /// Every user this message refers to: the author, mentioned users, the
    /// interaction invoker and the author of the replied-to message.
    pub fn referenced_users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = vec![&self.author];
        users.extend(self.mentioned_users.iter());
        if let Some(interaction) = &self.interaction {
            users.push(&interaction.user);
        }
        if let Some(parent) = &self.referenced_message {
            users.push(&parent.author);
        }

        let mut seen = std::collections::HashSet::new();
        users.retain(|u| seen.insert(u.id));
        users
    }

    /// Fallback text for system notifications.
    pub fn system_notification_text(&self) -> Option<String> {
        let author = self.author.display_name_or_name();
        let text = match self.kind {
            MessageKind::RecipientAdd => format!("{author} added a recipient."),
            MessageKind::RecipientRemove => format!("{author} removed a recipient."),
            MessageKind::Call => {
                let duration = self
                    .call_ended_timestamp()
                    .map(|ended| ended - self.timestamp);
                match duration {
                    Some(d) => format!(
                        "{author} started a call that lasted {} minutes.",
                        d.num_minutes()
                    ),
                    None => format!("{author} started a call."),
                }
            }
            MessageKind::ChannelNameChange => format!("{author} changed the channel name."),
            MessageKind::ChannelIconChange => format!("{author} changed the channel icon."),
            MessageKind::ChannelPinnedMessage => format!("{author} pinned a message."),
            MessageKind::GuildMemberJoin => format!("{author} joined the server."),
            MessageKind::GuildBoost
            | MessageKind::GuildBoostTier1
            | MessageKind::GuildBoostTier2
            | MessageKind::GuildBoostTier3 => format!("{author} boosted the server."),
            MessageKind::ChannelFollowAdd => {
                format!("{author} has added this channel to the list of followed channels.")
            }
            MessageKind::ThreadCreated => format!("{author} started a thread."),
            _ if self.is_system_notification() => format!("{author} triggered a server event."),
            _ => return None,
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(kind: u8) -> serde_json::Value {
        json!({
            "id": "175928847299117063",
            "type": kind,
            "author": {"id": "1", "username": "alice"},
            "timestamp": "2016-04-30T11:18:25.796000+00:00",
            "content": "hello"
        })
    }

    #[test]
    fn parses_minimal_wire_message() {
        let message = Message::parse(minimal(0)).unwrap();
        assert_eq!(message.kind, MessageKind::Default);
        assert!(!message.is_system_notification());
        assert!(!message.is_reply_like());
        assert!(!message.is_empty());
    }

    #[test]
    fn kind_raw_round_trip() {
        for raw in (0u8..=32).chain([55]) {
            assert_eq!(MessageKind::from(raw).raw(), raw);
        }
    }

    #[test]
    fn system_notification_range() {
        assert!(Message::parse(minimal(6)).unwrap().is_system_notification());
        assert!(Message::parse(minimal(18)).unwrap().is_system_notification());
        assert!(!Message::parse(minimal(0)).unwrap().is_system_notification());
        assert!(!Message::parse(minimal(19)).unwrap().is_system_notification());
    }

    #[test]
    fn reply_like_includes_interactions() {
        let mut value = minimal(0);
        value["interaction"] = json!({
            "id": "2",
            "name": "roll",
            "user": {"id": "3", "username": "bob"}
        });
        let message = Message::parse(value).unwrap();
        assert!(!message.is_reply());
        assert!(message.is_reply_like());
    }

    #[test]
    fn empty_message_detection() {
        let mut value = minimal(0);
        value["content"] = json!("   ");
        let message = Message::parse(value).unwrap();
        assert!(message.is_empty());
    }

    #[test]
    fn referenced_users_deduplicated() {
        let mut value = minimal(19);
        value["mentions"] = json!([
            {"id": "1", "username": "alice"},
            {"id": "3", "username": "bob"}
        ]);
        value["referenced_message"] = {
            let mut parent = minimal(0);
            parent["author"] = json!({"id": "3", "username": "bob"});
            parent
        };
        let message = Message::parse(value).unwrap();
        let ids: Vec<u64> = message
            .referenced_users()
            .iter()
            .map(|u| u.id.value())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn flags_from_raw_bits() {
        let mut value = minimal(0);
        value["flags"] = json!(4);
        let message = Message::parse(value).unwrap();
        assert!(message.flags.contains(MessageFlags::SUPPRESS_EMBEDS));
    }

    #[test]
    fn pinned_system_text() {
        let message = Message::parse(minimal(6)).unwrap();
        assert_eq!(
            message.system_notification_text().unwrap(),
            "alice pinned a message."
        );
    }
}
