//! Format writers.
//!
//! Every writer follows the same lifecycle: preamble, messages, postamble,
//! close. Dispatch is a plain tagged union; the five formats share the
//! [`CountingSink`](crate::sink::CountingSink) byte accounting underneath.

use std::path::Path;
use std::sync::Arc;

use chronicle_markdown::{parse_minimal, MarkdownNode, MentionKind};
use chronicle_model::Message;

use crate::config::ExportFormat;
use crate::context::ExportContext;
use crate::error::Result;

pub mod csv;
pub mod html;
pub mod json;
pub mod plain_text;

pub use self::csv::CsvWriter;
pub use self::html::{HtmlTheme, HtmlWriter};
pub use self::json::JsonWriter;
pub use self::plain_text::PlainTextWriter;

pub enum FormatWriter {
    PlainText(PlainTextWriter),
    Csv(CsvWriter),
    Json(JsonWriter),
    Html(HtmlWriter),
}

impl FormatWriter {
    pub async fn create(
        context: Arc<ExportContext>,
        format: ExportFormat,
        path: &Path,
    ) -> Result<Self> {
        Ok(match format {
            ExportFormat::PlainText => {
                Self::PlainText(PlainTextWriter::create(context, path).await?)
            }
            ExportFormat::Csv => Self::Csv(CsvWriter::create(context, path).await?),
            ExportFormat::Json => Self::Json(JsonWriter::create(context, path).await?),
            ExportFormat::HtmlDark => {
                Self::Html(HtmlWriter::create(context, path, HtmlTheme::Dark).await?)
            }
            ExportFormat::HtmlLight => {
                Self::Html(HtmlWriter::create(context, path, HtmlTheme::Light).await?)
            }
        })
    }

    pub async fn write_preamble(&mut self) -> Result<()> {
        match self {
            Self::PlainText(w) => w.write_preamble().await,
            Self::Csv(w) => w.write_preamble().await,
            Self::Json(w) => w.write_preamble().await,
            Self::Html(w) => w.write_preamble().await,
        }
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        match self {
            Self::PlainText(w) => w.write_message(message).await,
            Self::Csv(w) => w.write_message(message).await,
            Self::Json(w) => w.write_message(message).await,
            Self::Html(w) => w.write_message(message).await,
        }
    }

    pub async fn write_postamble(&mut self) -> Result<()> {
        match self {
            Self::PlainText(w) => w.write_postamble().await,
            Self::Csv(w) => w.write_postamble().await,
            Self::Json(w) => w.write_postamble().await,
            Self::Html(w) => w.write_postamble().await,
        }
    }

    pub async fn close(&mut self) -> Result<()> {
        match self {
            Self::PlainText(w) => w.close().await,
            Self::Csv(w) => w.close().await,
            Self::Json(w) => w.close().await,
            Self::Html(w) => w.close().await,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::PlainText(w) => w.bytes_written(),
            Self::Csv(w) => w.bytes_written(),
            Self::Json(w) => w.bytes_written(),
            Self::Html(w) => w.bytes_written(),
        }
    }
}

/// Render message content for the plain formats: the minimal markdown
/// profile keeps mentions, custom emoji and timestamps meaningful while
/// styling markers stay verbatim.
pub(crate) fn render_plain_content(context: &ExportContext, message: &Message) -> String {
    if message.is_system_notification() {
        return message.system_notification_text().unwrap_or_default();
    }
    if !context.options.should_format_markdown {
        return message.content.clone();
    }
    plain_from_nodes(context, message, &parse_minimal(&message.content))
}

fn plain_from_nodes(
    context: &ExportContext,
    message: &Message,
    nodes: &[MarkdownNode],
) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            MarkdownNode::Text(text) => out.push_str(text),
            MarkdownNode::Emoji(emoji) => match emoji.id {
                Some(_) => {
                    out.push(':');
                    out.push_str(&emoji.name);
                    out.push(':');
                }
                None => out.push_str(&emoji.name),
            },
            MarkdownNode::Mention { kind, target_id } => {
                render_plain_mention(context, message, *kind, *target_id, &mut out)
            }
            MarkdownNode::Timestamp { instant, format } => match instant {
                Some(instant) => out.push_str(&context.format_timestamp(*instant, *format)),
                None => out.push_str("Invalid date"),
            },
            // The minimal profile produces no other node kinds; emit their
            // raw text if they ever appear.
            other => out.push_str(&chronicle_markdown::to_plain_text(std::slice::from_ref(
                other,
            ))),
        }
    }
    out
}

fn render_plain_mention(
    context: &ExportContext,
    message: &Message,
    kind: MentionKind,
    target_id: Option<chronicle_model::Id>,
    out: &mut String,
) {
    match kind {
        MentionKind::Everyone => out.push_str("@everyone"),
        MentionKind::Here => out.push_str("@here"),
        MentionKind::User => {
            let name = target_id
                .and_then(|id| {
                    // Prefer the mention objects carried by the message; the
                    // member cache covers targets referenced elsewhere.
                    message
                        .mentioned_users
                        .iter()
                        .find(|u| u.id == id)
                        .map(|u| context.display_name(u))
                        .or_else(|| context.member(id).map(|m| m.display_name().to_string()))
                })
                .unwrap_or_else(|| "Unknown".to_string());
            out.push('@');
            out.push_str(&name);
        }
        MentionKind::Channel => {
            let name = target_id
                .map(|id| context.channel_name(id))
                .unwrap_or_else(|| "deleted-channel".to_string());
            out.push('#');
            out.push_str(&name);
        }
        MentionKind::Role => {
            let name = target_id
                .map(|id| context.role_name(id))
                .unwrap_or_else(|| "deleted-role".to_string());
            out.push('@');
            out.push_str(&name);
        }
    }
}
