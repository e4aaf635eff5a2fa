//! HTML writer.
//!
//! Messages render in groups: consecutive messages join one author block
//! when they share author id and rendered display name, sit within seven
//! minutes of each other, and neither side is a reply-like or crosses the
//! system-notification boundary. Groups are buffered and flushed whole.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;

use chronicle_markdown::{parse, parse_minimal, FormattingKind, MarkdownNode, MentionKind};
use chronicle_model::{Message, User};

use crate::context::ExportContext;
use crate::error::Result;
use crate::sink::CountingSink;

const GROUP_WINDOW_MINUTES: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlTheme {
    Dark,
    Light,
}

pub struct HtmlWriter {
    context: Arc<ExportContext>,
    sink: CountingSink,
    theme: HtmlTheme,
    pending: Vec<Message>,
    messages_written: u64,
}

impl HtmlWriter {
    pub async fn create(
        context: Arc<ExportContext>,
        path: &Path,
        theme: HtmlTheme,
    ) -> Result<Self> {
        Ok(Self {
            context,
            sink: CountingSink::create(path).await?,
            theme,
            pending: Vec::new(),
            messages_written: 0,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    pub async fn write_preamble(&mut self) -> Result<()> {
        let context = &self.context;
        let theme_css = match self.theme {
            HtmlTheme::Dark => DARK_CSS,
            HtmlTheme::Light => LIGHT_CSS,
        };

        let title = format!(
            "{} - {}",
            escape(&context.guild.name),
            escape(&context.channel.hierarchical_name())
        );

        let mut head = String::new();
        head.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
        head.push_str("<meta charset=\"utf-8\">\n");
        head.push_str("<meta name=\"viewport\" content=\"width=device-width\">\n");
        head.push_str(&format!("<title>{title}</title>\n"));
        head.push_str(&format!("<style>\n{CORE_CSS}\n{theme_css}\n</style>\n"));
        head.push_str(&format!("<script>\n{SCRIPT}\n</script>\n"));
        head.push_str("</head>\n<body>\n");

        head.push_str("<div class=\"preamble\">\n");
        head.push_str(&format!(
            "<div class=\"preamble__guild-name\">{}</div>\n",
            escape(&context.guild.name)
        ));
        head.push_str(&format!(
            "<div class=\"preamble__channel-name\">{}</div>\n",
            escape(&context.channel.hierarchical_name())
        ));
        if let Some(topic) = &context.channel.topic {
            head.push_str(&format!(
                "<div class=\"preamble__channel-topic\">{}</div>\n",
                escape(topic)
            ));
        }
        head.push_str("</div>\n<div class=\"chatlog\">\n");

        self.sink.write_str(&head).await?;
        Ok(())
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        if let Some(last) = self.pending.last() {
            if !self.can_join_group(last, message) {
                self.flush_group().await?;
            }
        }
        self.pending.push(message.clone());
        self.messages_written += 1;
        Ok(())
    }

    pub async fn write_postamble(&mut self) -> Result<()> {
        self.flush_group().await?;
        let footer = format!(
            "</div>\n<div class=\"postamble\">Exported {} message(s)</div>\n</body>\n</html>\n",
            self.messages_written
        );
        self.sink.write_str(&footer).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }

    fn can_join_group(&self, previous: &Message, next: &Message) -> bool {
        let context = &self.context;
        previous.author.id == next.author.id
            && context.display_name(&previous.author) == context.display_name(&next.author)
            && (next.timestamp - previous.timestamp) < Duration::minutes(GROUP_WINDOW_MINUTES)
            && next.timestamp >= previous.timestamp
            && !previous.is_reply_like()
            && !next.is_reply_like()
            && previous.is_system_notification() == next.is_system_notification()
    }

    async fn flush_group(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let group = std::mem::take(&mut self.pending);
        let html = self.render_group(&group).await;
        self.sink.write_str(&html).await?;
        Ok(())
    }

    async fn render_group(&self, group: &[Message]) -> String {
        let context = &self.context;
        let first = &group[0];
        let author = &first.author;

        let mut out = String::new();
        out.push_str("<div class=\"chatlog__message-group\">\n");

        let avatar = context
            .resolve_asset_url(
                &context
                    .member(author.id)
                    .map(|m| m.avatar_url())
                    .unwrap_or_else(|| author.avatar_url()),
            )
            .await;
        out.push_str(&format!(
            "<div class=\"chatlog__avatar-column\"><img class=\"chatlog__avatar\" src=\"{}\" alt=\"Avatar\" loading=\"lazy\"></div>\n",
            escape(&encode_path(&avatar))
        ));

        out.push_str("<div class=\"chatlog__messages\">\n");
        out.push_str(&self.render_group_header(first));

        for message in group {
            out.push_str(&self.render_message(message).await);
        }

        out.push_str("</div>\n</div>\n");
        out
    }

    fn render_group_header(&self, first: &Message) -> String {
        let context = &self.context;
        let author = &first.author;
        let name = escape(&context.display_name(author));
        let color_style = context
            .user_color(author.id)
            .map(|c| format!(" style=\"color: {}\"", c.to_hex()))
            .unwrap_or_default();
        let bot_tag = if author.is_bot {
            "<span class=\"chatlog__bot-tag\">BOT</span> "
        } else {
            ""
        };
        let stamp = escape(&context.format_timestamp(first.timestamp, None));
        let full_stamp = escape(&context.format_timestamp(first.timestamp, Some('F')));

        format!(
            "<div class=\"chatlog__header\"><span class=\"chatlog__author\" title=\"{}\"{color_style}>{name}</span> {bot_tag}<span class=\"chatlog__timestamp\" title=\"{full_stamp}\">{stamp}</span></div>\n",
            escape(&author.full_name()),
        )
    }

    async fn render_message(&self, message: &Message) -> String {
        let context = &self.context;
        let mut out = String::new();

        out.push_str(&format!(
            "<div class=\"chatlog__message-container\" id=\"chatlog__message-container-{}\">\n<div class=\"chatlog__message\">\n",
            message.id
        ));

        if message.is_reply_like() {
            out.push_str(&self.render_reference(message));
        }

        if message.is_system_notification() {
            out.push_str(&format!(
                "<div class=\"chatlog__system-notification\">{}</div>\n",
                escape(&message.system_notification_text().unwrap_or_default())
            ));
        } else if !message.content.is_empty() {
            out.push_str("<div class=\"chatlog__content\">");
            out.push_str(&self.render_content(message).await);
            if message.edited_timestamp.is_some() {
                out.push_str("<span class=\"chatlog__edited-timestamp\">(edited)</span>");
            }
            out.push_str("</div>\n");
        }

        for attachment in &message.attachments {
            let url = context.resolve_asset_url(&attachment.url).await;
            let href = escape(&encode_path(&url));
            let spoiler = if attachment.is_spoiler() {
                " chatlog__attachment--hidden"
            } else {
                ""
            };
            if attachment.is_image() {
                out.push_str(&format!(
                    "<div class=\"chatlog__attachment{spoiler}\" onclick=\"showSpoiler(event, this)\"><a href=\"{href}\"><img class=\"chatlog__attachment-media\" src=\"{href}\" alt=\"{}\" loading=\"lazy\"></a></div>\n",
                    escape(&attachment.file_name)
                ));
            } else if attachment.is_video() {
                out.push_str(&format!(
                    "<div class=\"chatlog__attachment{spoiler}\"><video class=\"chatlog__attachment-media\" controls src=\"{href}\"></video></div>\n"
                ));
            } else if attachment.is_audio() {
                out.push_str(&format!(
                    "<div class=\"chatlog__attachment\"><audio controls src=\"{href}\"></audio></div>\n"
                ));
            } else {
                out.push_str(&format!(
                    "<div class=\"chatlog__attachment\"><a href=\"{href}\">{} ({} bytes)</a></div>\n",
                    escape(&attachment.file_name),
                    attachment.size_bytes
                ));
            }
        }

        for embed in &message.embeds {
            out.push_str(&self.render_embed(embed).await);
        }

        for sticker in &message.stickers {
            let url = context.resolve_asset_url(&sticker.source_url()).await;
            out.push_str(&format!(
                "<div class=\"chatlog__sticker\"><img class=\"chatlog__sticker-image\" src=\"{}\" alt=\"{}\" loading=\"lazy\"></div>\n",
                escape(&encode_path(&url)),
                escape(&sticker.name)
            ));
        }

        if !message.reactions.is_empty() {
            out.push_str("<div class=\"chatlog__reactions\">");
            for reaction in &message.reactions {
                let image = context.resolve_asset_url(&reaction.emoji.image_url()).await;
                out.push_str(&format!(
                    "<span class=\"chatlog__reaction\" title=\"{}\"><img class=\"chatlog__emoji chatlog__emoji--small\" src=\"{}\" alt=\"{}\" loading=\"lazy\"> {}</span>",
                    escape(&reaction.emoji.code()),
                    escape(&encode_path(&image)),
                    escape(&reaction.emoji.name),
                    reaction.count
                ));
            }
            out.push_str("</div>\n");
        }

        out.push_str("</div>\n</div>\n");
        out
    }

    fn render_reference(&self, message: &Message) -> String {
        let context = &self.context;

        if let Some(interaction) = &message.interaction {
            return format!(
                "<div class=\"chatlog__reference\">{} used <span class=\"chatlog__reference-command\">/{}</span></div>\n",
                escape(&context.display_name(&interaction.user)),
                escape(&interaction.name)
            );
        }

        match (&message.referenced_message, &message.reference) {
            (Some(parent), _) => {
                let snippet: String = parent.content.chars().take(80).collect();
                format!(
                    "<div class=\"chatlog__reference\" onclick=\"scrollToMessage(event, '{}')\">Reply to <span class=\"chatlog__reference-author\">{}</span>: {}</div>\n",
                    parent.id,
                    escape(&context.display_name(&parent.author)),
                    escape(&snippet)
                )
            }
            (None, Some(_)) => {
                "<div class=\"chatlog__reference\">Original message was deleted</div>\n".to_string()
            }
            (None, None) => String::new(),
        }
    }

    async fn render_content(&self, message: &Message) -> String {
        let context = &self.context;
        let nodes = if context.options.should_format_markdown {
            parse(&message.content)
        } else {
            parse_minimal(&message.content)
        };

        let jumbo = is_jumbo(&nodes);
        let emoji_urls = self.resolve_emoji_urls(&nodes).await;

        let renderer = HtmlRenderer {
            context,
            message,
            jumbo,
            emoji_urls: &emoji_urls,
        };
        renderer.render(&nodes)
    }

    /// Emoji images are the only markdown nodes that may need asset
    /// downloads; resolve them up front so rendering itself stays
    /// synchronous.
    async fn resolve_emoji_urls(&self, nodes: &[MarkdownNode]) -> HashMap<String, String> {
        let mut urls = HashMap::new();
        let mut stack: Vec<&MarkdownNode> = nodes.iter().collect();
        while let Some(node) = stack.pop() {
            match node {
                MarkdownNode::Emoji(emoji) => {
                    let source = emoji.image_url();
                    if !urls.contains_key(&source) {
                        let resolved = self.context.resolve_asset_url(&source).await;
                        urls.insert(source, resolved);
                    }
                }
                MarkdownNode::List { items } => {
                    stack.extend(items.iter().flatten());
                }
                other => stack.extend(other.children().iter()),
            }
        }
        urls
    }

    async fn render_embed(&self, embed: &chronicle_model::Embed) -> String {
        let context = &self.context;
        let mut out = String::new();

        let color_style = embed
            .color
            .map(|c| format!(" style=\"border-left-color: {}\"", c.to_hex()))
            .unwrap_or_default();
        out.push_str(&format!("<div class=\"chatlog__embed\"{color_style}>\n"));

        if let Some(author) = &embed.author {
            if let Some(name) = &author.name {
                out.push_str(&format!(
                    "<div class=\"chatlog__embed-author\">{}</div>\n",
                    escape(name)
                ));
            }
        }
        if let Some(title) = &embed.title {
            match &embed.url {
                Some(url) => out.push_str(&format!(
                    "<div class=\"chatlog__embed-title\"><a href=\"{}\">{}</a></div>\n",
                    escape(url),
                    escape(title)
                )),
                None => out.push_str(&format!(
                    "<div class=\"chatlog__embed-title\">{}</div>\n",
                    escape(title)
                )),
            }
        }
        if let Some(description) = &embed.description {
            out.push_str(&format!(
                "<div class=\"chatlog__embed-description\">{}</div>\n",
                escape(description)
            ));
        }
        for field in &embed.fields {
            out.push_str(&format!(
                "<div class=\"chatlog__embed-field\"><div class=\"chatlog__embed-field-name\">{}</div><div class=\"chatlog__embed-field-value\">{}</div></div>\n",
                escape(&field.name),
                escape(&field.value)
            ));
        }
        for image in embed.all_images() {
            let url = context.resolve_asset_url(&image.url).await;
            out.push_str(&format!(
                "<div class=\"chatlog__embed-image-container\"><img class=\"chatlog__embed-image\" src=\"{}\" loading=\"lazy\"></div>\n",
                escape(&encode_path(&url))
            ));
        }
        if let Some(footer) = &embed.footer {
            out.push_str(&format!(
                "<div class=\"chatlog__embed-footer\">{}</div>\n",
                escape(&footer.text)
            ));
        }

        out.push_str("</div>\n");
        out
    }
}

struct HtmlRenderer<'a> {
    context: &'a ExportContext,
    message: &'a Message,
    jumbo: bool,
    emoji_urls: &'a HashMap<String, String>,
}

impl HtmlRenderer<'_> {
    fn render(&self, nodes: &[MarkdownNode]) -> String {
        let mut out = String::new();
        for node in nodes {
            self.render_node(node, &mut out);
        }
        out
    }

    fn render_node(&self, node: &MarkdownNode, out: &mut String) {
        match node {
            MarkdownNode::Text(text) => out.push_str(&escape(text)),
            MarkdownNode::Formatting { kind, children } => {
                let inner = self.render(children);
                let rendered = match kind {
                    FormattingKind::Bold => format!("<strong>{inner}</strong>"),
                    FormattingKind::Italic => format!("<em>{inner}</em>"),
                    FormattingKind::Underline => format!("<u>{inner}</u>"),
                    FormattingKind::Strikethrough => format!("<s>{inner}</s>"),
                    FormattingKind::Spoiler => format!(
                        "<span class=\"chatlog__markdown-spoiler chatlog__markdown-spoiler--hidden\" onclick=\"showSpoiler(event, this)\">{inner}</span>"
                    ),
                    FormattingKind::Quote => format!(
                        "<blockquote class=\"chatlog__markdown-quote\">{inner}</blockquote>"
                    ),
                };
                out.push_str(&rendered);
            }
            MarkdownNode::Heading { level, children } => {
                let inner = self.render(children);
                out.push_str(&format!("<h{level}>{inner}</h{level}>"));
            }
            MarkdownNode::List { items } => {
                out.push_str("<ul>");
                for item in items {
                    out.push_str(&format!("<li>{}</li>", self.render(item)));
                }
                out.push_str("</ul>");
            }
            MarkdownNode::InlineCode { code } => {
                out.push_str(&format!(
                    "<code class=\"chatlog__markdown-pre--inline\">{}</code>",
                    escape(code)
                ));
            }
            MarkdownNode::MultiLineCode { language, code } => {
                let class = language
                    .as_deref()
                    .map(|l| format!(" class=\"language-{}\"", escape(l)))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "<pre class=\"chatlog__markdown-pre\"><code{class}>{}</code></pre>",
                    escape(code)
                ));
            }
            MarkdownNode::Link { url, children } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape(url),
                    self.render(children)
                ));
            }
            MarkdownNode::Emoji(emoji) => {
                let source = emoji.image_url();
                let resolved = self.emoji_urls.get(&source).unwrap_or(&source);
                let size_class = if self.jumbo {
                    "chatlog__emoji chatlog__emoji--large"
                } else {
                    "chatlog__emoji"
                };
                out.push_str(&format!(
                    "<img class=\"{size_class}\" src=\"{}\" alt=\"{}\" title=\"{}\" loading=\"lazy\">",
                    escape(&encode_path(resolved)),
                    escape(&emoji.name),
                    escape(&emoji.code())
                ));
            }
            MarkdownNode::Mention { kind, target_id } => {
                let label = match kind {
                    MentionKind::Everyone => "@everyone".to_string(),
                    MentionKind::Here => "@here".to_string(),
                    MentionKind::User => {
                        let name = target_id
                            .and_then(|id| {
                                self.message
                                    .mentioned_users
                                    .iter()
                                    .find(|u| u.id == id)
                                    .map(|u: &User| self.context.display_name(u))
                                    .or_else(|| {
                                        self.context
                                            .member(id)
                                            .map(|m| m.display_name().to_string())
                                    })
                            })
                            .unwrap_or_else(|| "Unknown".to_string());
                        format!("@{name}")
                    }
                    MentionKind::Channel => {
                        format!(
                            "#{}",
                            target_id
                                .map(|id| self.context.channel_name(id))
                                .unwrap_or_else(|| "deleted-channel".to_string())
                        )
                    }
                    MentionKind::Role => {
                        format!(
                            "@{}",
                            target_id
                                .map(|id| self.context.role_name(id))
                                .unwrap_or_else(|| "deleted-role".to_string())
                        )
                    }
                };
                out.push_str(&format!(
                    "<span class=\"chatlog__markdown-mention\">{}</span>",
                    escape(&label)
                ));
            }
            MarkdownNode::Timestamp { instant, format } => match instant {
                Some(instant) => {
                    let rendered = self.context.format_timestamp(*instant, *format);
                    let full = self.context.format_timestamp(*instant, Some('F'));
                    out.push_str(&format!(
                        "<span class=\"chatlog__markdown-timestamp\" title=\"{}\">{}</span>",
                        escape(&full),
                        escape(&rendered)
                    ));
                }
                None => out.push_str("<span class=\"chatlog__markdown-timestamp\">Invalid date</span>"),
            },
        }
    }
}

/// A message renders jumbo emoji when every node is an emoji or whitespace.
fn is_jumbo(nodes: &[MarkdownNode]) -> bool {
    let mut saw_emoji = false;
    for node in nodes {
        match node {
            MarkdownNode::Emoji(_) => saw_emoji = true,
            node if node.is_whitespace_text() => {}
            _ => return false,
        }
    }
    saw_emoji
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encode each path segment of a local asset reference; urls with a
/// scheme pass through untouched.
fn encode_path(path: &str) -> String {
    if path.contains("://") {
        return path.to_string();
    }
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

const SCRIPT: &str = r#"function showSpoiler(event, element) {
    if (element && element.classList.contains("chatlog__markdown-spoiler--hidden")) {
        event.preventDefault();
        element.classList.remove("chatlog__markdown-spoiler--hidden");
    }
    if (element && element.classList.contains("chatlog__attachment--hidden")) {
        event.preventDefault();
        element.classList.remove("chatlog__attachment--hidden");
    }
}

function scrollToMessage(event, id) {
    const container = document.getElementById("chatlog__message-container-" + id);
    if (!container) return;
    event.preventDefault();
    container.scrollIntoView({ behavior: "smooth", block: "center" });
    container.classList.add("chatlog__message-container--highlighted");
    setTimeout(() => container.classList.remove("chatlog__message-container--highlighted"), 2000);
}"#;

const CORE_CSS: &str = r#"html { box-sizing: border-box; }
*, *::before, *::after { box-sizing: inherit; }
body {
    margin: 0;
    padding: 1rem 2rem;
    font-family: "Helvetica Neue", Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.4;
}
a { text-decoration: none; }
a:hover { text-decoration: underline; }
img { object-fit: contain; }
.preamble { margin-bottom: 1rem; padding-bottom: 1rem; border-bottom: 1px solid; }
.preamble__guild-name { font-size: 1.4rem; font-weight: 600; }
.preamble__channel-name { font-size: 1.1rem; }
.preamble__channel-topic { font-size: 0.9rem; opacity: 0.8; }
.postamble { margin-top: 1rem; padding-top: 1rem; border-top: 1px solid; font-size: 0.85rem; }
.chatlog { display: flex; flex-direction: column; }
.chatlog__message-group { display: flex; margin-top: 1rem; }
.chatlog__avatar-column { width: 40px; flex-shrink: 0; }
.chatlog__avatar { width: 40px; height: 40px; border-radius: 50%; }
.chatlog__messages { flex: 1; min-width: 0; margin-left: 1rem; }
.chatlog__header { margin-bottom: 0.1rem; }
.chatlog__author { font-weight: 500; }
.chatlog__bot-tag {
    padding: 0 0.3rem;
    border-radius: 3px;
    font-size: 0.625rem;
    font-weight: 600;
    vertical-align: middle;
}
.chatlog__timestamp { margin-left: 0.4rem; font-size: 0.75rem; }
.chatlog__content { word-wrap: break-word; white-space: pre-wrap; }
.chatlog__edited-timestamp { margin-left: 0.25rem; font-size: 0.7rem; }
.chatlog__system-notification { font-style: italic; opacity: 0.8; }
.chatlog__reference { font-size: 0.85rem; opacity: 0.8; cursor: pointer; margin-bottom: 0.2rem; }
.chatlog__reference-author { font-weight: 500; }
.chatlog__attachment { margin-top: 0.3rem; }
.chatlog__attachment--hidden { filter: blur(40px); cursor: pointer; }
.chatlog__attachment-media { max-width: 45vw; max-height: 500px; border-radius: 3px; }
.chatlog__sticker-image { width: 160px; height: 160px; }
.chatlog__embed {
    margin-top: 0.3rem;
    padding: 0.5rem 0.8rem;
    border-left: 4px solid;
    border-radius: 3px;
    max-width: 520px;
}
.chatlog__embed-title { font-weight: 600; }
.chatlog__embed-field-name { font-weight: 600; font-size: 0.875rem; margin-top: 0.3rem; }
.chatlog__embed-footer { margin-top: 0.4rem; font-size: 0.75rem; opacity: 0.8; }
.chatlog__embed-image { max-width: 500px; max-height: 400px; border-radius: 3px; }
.chatlog__reactions { margin-top: 0.3rem; }
.chatlog__reaction {
    display: inline-flex;
    align-items: center;
    gap: 0.25rem;
    padding: 0.1rem 0.4rem;
    margin-right: 0.25rem;
    border-radius: 8px;
    font-size: 0.85rem;
}
.chatlog__emoji { width: 1.4em; height: 1.4em; vertical-align: -0.3em; }
.chatlog__emoji--small { width: 1em; height: 1em; }
.chatlog__emoji--large { width: 2.8em; height: 2.8em; }
.chatlog__markdown-mention { font-weight: 500; border-radius: 3px; padding: 0 2px; }
.chatlog__markdown-pre { padding: 0.5rem; border-radius: 4px; overflow-x: auto; }
.chatlog__markdown-pre--inline { padding: 0.1rem 0.3rem; border-radius: 3px; }
.chatlog__markdown-quote { margin: 0.2rem 0; padding-left: 0.6rem; border-left: 4px solid; }
.chatlog__markdown-spoiler { border-radius: 3px; }
.chatlog__markdown-spoiler--hidden { cursor: pointer; color: transparent; }
.chatlog__message-container--highlighted { transition: background-color 1s; }"#;

const DARK_CSS: &str = r#"body { background-color: #36393e; color: #dcddde; }
a { color: #00aff4; }
.preamble, .postamble { border-color: #4f545c; color: #b9bbbe; }
.chatlog__author { color: #ffffff; }
.chatlog__timestamp, .chatlog__edited-timestamp { color: #a3a6aa; }
.chatlog__bot-tag { background-color: #5865f2; color: #ffffff; }
.chatlog__embed { background-color: #2f3136; border-left-color: #4f545c; }
.chatlog__reaction { background-color: #2f3136; }
.chatlog__markdown-mention { background-color: rgba(88, 101, 242, 0.3); color: #dee0fc; }
.chatlog__markdown-pre, .chatlog__markdown-pre--inline { background-color: #2f3136; }
.chatlog__markdown-quote { border-left-color: #4f545c; }
.chatlog__markdown-spoiler { background-color: rgba(255, 255, 255, 0.1); }
.chatlog__markdown-spoiler--hidden { background-color: #202225; }
.chatlog__message-container--highlighted { background-color: rgba(114, 137, 218, 0.2); }"#;

const LIGHT_CSS: &str = r#"body { background-color: #ffffff; color: #2e3338; }
a { color: #0068e0; }
.preamble, .postamble { border-color: #e3e5e8; color: #4f5660; }
.chatlog__author { color: #060607; }
.chatlog__timestamp, .chatlog__edited-timestamp { color: #5e6772; }
.chatlog__bot-tag { background-color: #5865f2; color: #ffffff; }
.chatlog__embed { background-color: #f2f3f5; border-left-color: #e3e5e8; }
.chatlog__reaction { background-color: #f2f3f5; }
.chatlog__markdown-mention { background-color: rgba(88, 101, 242, 0.15); color: #505cdc; }
.chatlog__markdown-pre, .chatlog__markdown-pre--inline { background-color: #f2f3f5; }
.chatlog__markdown-quote { border-left-color: #c7ccd1; }
.chatlog__markdown-spoiler { background-color: rgba(0, 0, 0, 0.08); }
.chatlog__markdown-spoiler--hidden { background-color: #b9bbbe; }
.chatlog__message-container--highlighted { background-color: rgba(88, 101, 242, 0.15); }"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn jumbo_detection() {
        assert!(is_jumbo(&parse("🔥🔥")));
        assert!(is_jumbo(&parse("🔥 🔥")));
        assert!(!is_jumbo(&parse("fire 🔥")));
        assert!(!is_jumbo(&parse("no emoji")));
    }

    #[test]
    fn local_paths_are_segment_encoded() {
        assert_eq!(
            encode_path("out_Files/my photo.png"),
            "out_Files/my%20photo.png"
        );
        assert_eq!(
            encode_path("https://cdn.example.com/a b.png"),
            "https://cdn.example.com/a b.png"
        );
    }
}
