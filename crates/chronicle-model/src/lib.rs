//! Immutable domain model for the chronicle export engine.
//!
//! Every entity is a value object: constructed once from wire JSON (unknown
//! fields ignored, missing optionals `None`) and never mutated afterwards.

pub mod attachment;
pub mod channel;
pub mod embed;
pub mod error;
pub mod guild;
pub mod id;
pub mod message;
pub mod role;
pub mod user;

pub use attachment::{Attachment, Emoji, Reaction, Sticker, StickerFormat};
pub use channel::{Channel, ChannelKind};
pub use embed::{normalize_embeds, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage};
pub use error::{ModelError, Result};
pub use guild::Guild;
pub use id::Id;
pub use message::{Interaction, Message, MessageFlags, MessageKind, MessageReference};
pub use role::{Color, Role};
pub use user::{Member, User};
