//! JSON writer.
//!
//! Messages are accumulated in memory and one pretty-printed document is
//! emitted on postamble, so the file is a single well-formed object even
//! though the writer interface is streaming.

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::{json, Value};
use tracing::warn;

use chronicle_markdown::{parse, MarkdownNode};
use chronicle_model::{Emoji, Message, MessageKind, User};

use crate::context::ExportContext;
use crate::error::Result;
use crate::sink::CountingSink;
use crate::writers::render_plain_content;

pub struct JsonWriter {
    context: Arc<ExportContext>,
    sink: CountingSink,
    messages: Vec<Value>,
}

impl JsonWriter {
    pub async fn create(context: Arc<ExportContext>, path: &Path) -> Result<Self> {
        Ok(Self {
            context,
            sink: CountingSink::create(path).await?,
            messages: Vec::new(),
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    pub async fn write_preamble(&mut self) -> Result<()> {
        Ok(())
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        let value = self.message_value(message).await;
        self.messages.push(value);
        Ok(())
    }

    pub async fn write_postamble(&mut self) -> Result<()> {
        let context = &self.context;
        let message_count = self.messages.len();
        let document = json!({
            "guild": {
                "id": context.guild.id,
                "name": context.guild.name,
                "iconUrl": context.guild.icon_url(),
            },
            "channel": {
                "id": context.channel.id,
                "name": context.channel.name(),
                "categoryName": context.channel.parent.as_deref().map(|p| p.name()),
                "topic": context.channel.topic,
            },
            "dateRange": {
                "after": context.options.after.map(|id| id.timestamp()),
                "before": context.options.before.map(|id| id.timestamp()),
            },
            "exportedAt": chrono::Utc::now(),
            "messages": std::mem::take(&mut self.messages),
            "messageCount": message_count,
        });

        let rendered =
            serde_json::to_string_pretty(&document).map_err(chronicle_model::ModelError::from)?;
        self.sink.write_str(&rendered).await?;
        self.sink.write_str("\n").await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }

    async fn message_value(&self, message: &Message) -> Value {
        let context = &self.context;

        let mut attachments = Vec::with_capacity(message.attachments.len());
        for attachment in &message.attachments {
            attachments.push(json!({
                "id": attachment.id,
                "url": context.resolve_asset_url(&attachment.url).await,
                "fileName": attachment.file_name,
                "fileSizeBytes": attachment.size_bytes,
                "width": attachment.width,
                "height": attachment.height,
            }));
        }

        let mut reactions = Vec::with_capacity(message.reactions.len());
        for reaction in &message.reactions {
            reactions.push(json!({
                "emoji": emoji_value(&reaction.emoji),
                "count": reaction.count,
                "users": self.reaction_users(message, &reaction.emoji).await,
            }));
        }

        json!({
            "id": message.id,
            "type": kind_name(message.kind),
            "timestamp": message.timestamp,
            "timestampEdited": message.edited_timestamp,
            "callEndedTimestamp": message.call_ended_timestamp(),
            "isPinned": message.is_pinned,
            "content": render_plain_content(context, message),
            "author": self.user_value(&message.author),
            "attachments": attachments,
            "embeds": message.embeds,
            "stickers": message.stickers.iter().map(|s| json!({
                "id": s.id,
                "name": s.name,
                "sourceUrl": s.source_url(),
            })).collect::<Vec<_>>(),
            "reactions": reactions,
            "mentions": message.mentioned_users.iter().map(|u| self.user_value(u)).collect::<Vec<_>>(),
            "reference": message.reference,
            "interaction": message.interaction.as_ref().map(|i| json!({
                "id": i.id,
                "name": i.name,
                "user": self.user_value(&i.user),
            })),
            "inlineEmojis": inline_emojis(&message.content),
        })
    }

    fn user_value(&self, user: &User) -> Value {
        let context = &self.context;
        let member = context.member(user.id);
        json!({
            "id": user.id,
            "name": user.name,
            "discriminator": user.discriminator.map(|d| format!("{d:04}")),
            "nickname": context.display_name(user),
            "color": context.user_color(user.id).map(|c| c.to_hex()),
            "isBot": user.is_bot,
            "roles": context.member_roles(user.id).iter().map(|r| json!({
                "id": r.id,
                "name": r.name,
                "color": r.color.map(|c| c.to_hex()),
                "position": r.position,
            })).collect::<Vec<_>>(),
            "avatarUrl": member.map(|m| m.avatar_url()).unwrap_or_else(|| user.avatar_url()),
        })
    }

    /// First page of reacting users; failures degrade to an empty list.
    async fn reaction_users(&self, message: &Message, emoji: &Emoji) -> Vec<Value> {
        let mut users = Vec::new();
        let mut stream = self
            .context
            .client
            .get_message_reactions(self.context.channel.id, message.id, emoji)
            .take(100);
        while let Some(user) = stream.next().await {
            match user {
                Ok(user) => users.push(self.user_value(&user)),
                Err(err) => {
                    warn!(error = %err, "failed to enumerate reaction users");
                    break;
                }
            }
        }
        users
    }
}

/// Distinct emoji referenced inline in the raw content.
fn inline_emojis(content: &str) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    let mut emojis = Vec::new();
    collect_emojis(&parse(content), &mut seen, &mut emojis);
    emojis
}

fn collect_emojis(
    nodes: &[MarkdownNode],
    seen: &mut std::collections::HashSet<String>,
    out: &mut Vec<Value>,
) {
    for node in nodes {
        match node {
            MarkdownNode::Emoji(emoji) => {
                if seen.insert(emoji.code()) {
                    out.push(emoji_value(emoji));
                }
            }
            MarkdownNode::List { items } => {
                for item in items {
                    collect_emojis(item, seen, out);
                }
            }
            other => collect_emojis(other.children(), seen, out),
        }
    }
}

fn emoji_value(emoji: &Emoji) -> Value {
    json!({
        "id": emoji.id,
        "name": emoji.name,
        "code": emoji.code(),
        "isAnimated": emoji.is_animated,
        "imageUrl": emoji.image_url(),
    })
}

fn kind_name(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Default => "Default",
        MessageKind::RecipientAdd => "RecipientAdd",
        MessageKind::RecipientRemove => "RecipientRemove",
        MessageKind::Call => "Call",
        MessageKind::ChannelNameChange => "ChannelNameChange",
        MessageKind::ChannelIconChange => "ChannelIconChange",
        MessageKind::ChannelPinnedMessage => "ChannelPinnedMessage",
        MessageKind::GuildMemberJoin => "GuildMemberJoin",
        MessageKind::GuildBoost => "GuildBoost",
        MessageKind::GuildBoostTier1 => "GuildBoostTier1",
        MessageKind::GuildBoostTier2 => "GuildBoostTier2",
        MessageKind::GuildBoostTier3 => "GuildBoostTier3",
        MessageKind::ChannelFollowAdd => "ChannelFollowAdd",
        MessageKind::GuildDiscoveryDisqualified => "GuildDiscoveryDisqualified",
        MessageKind::GuildDiscoveryRequalified => "GuildDiscoveryRequalified",
        MessageKind::GuildDiscoveryGracePeriodInitialWarning => {
            "GuildDiscoveryGracePeriodInitialWarning"
        }
        MessageKind::GuildDiscoveryGracePeriodFinalWarning => {
            "GuildDiscoveryGracePeriodFinalWarning"
        }
        MessageKind::ThreadCreated => "ThreadCreated",
        MessageKind::Reply => "Reply",
        MessageKind::ChatInputCommand => "ChatInputCommand",
        MessageKind::ThreadStarterMessage => "ThreadStarterMessage",
        MessageKind::GuildInviteReminder => "GuildInviteReminder",
        MessageKind::ContextMenuCommand => "ContextMenuCommand",
        MessageKind::AutoModerationAction => "AutoModerationAction",
        MessageKind::RoleSubscriptionPurchase => "RoleSubscriptionPurchase",
        MessageKind::InteractionPremiumUpsell => "InteractionPremiumUpsell",
        MessageKind::StageStart => "StageStart",
        MessageKind::StageEnd => "StageEnd",
        MessageKind::StageSpeaker => "StageSpeaker",
        MessageKind::StageTopic => "StageTopic",
        MessageKind::GuildApplicationPremiumSubscription => "GuildApplicationPremiumSubscription",
        MessageKind::Other(_) => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_emojis_deduplicate() {
        let emojis = inline_emojis("<:pepe:1> 🔥 <:pepe:1> 🔥");
        assert_eq!(emojis.len(), 2);
    }

    #[test]
    fn kind_names_cover_replies() {
        assert_eq!(kind_name(MessageKind::Reply), "Reply");
        assert_eq!(kind_name(MessageKind::Other(99)), "Unknown");
    }
}
