//! Plain-text writer.

use std::path::Path;
use std::sync::Arc;

use chronicle_model::Message;

use crate::context::ExportContext;
use crate::error::Result;
use crate::sink::CountingSink;
use crate::writers::render_plain_content;

const BANNER: &str = "==============================================================";

pub struct PlainTextWriter {
    context: Arc<ExportContext>,
    sink: CountingSink,
    messages_written: u64,
}

impl PlainTextWriter {
    pub async fn create(context: Arc<ExportContext>, path: &Path) -> Result<Self> {
        Ok(Self {
            context,
            sink: CountingSink::create(path).await?,
            messages_written: 0,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    pub async fn write_preamble(&mut self) -> Result<()> {
        let context = &self.context;
        let mut header = String::new();
        header.push_str(BANNER);
        header.push('\n');
        header.push_str(&format!("Guild: {}\n", context.guild.name));
        header.push_str(&format!("Channel: {}\n", context.channel.hierarchical_name()));
        if let Some(topic) = &context.channel.topic {
            header.push_str(&format!("Topic: {topic}\n"));
        }
        if let Some(after) = context.options.after {
            header.push_str(&format!("After: {}\n", after.timestamp().format("%Y-%m-%d %H:%M")));
        }
        if let Some(before) = context.options.before {
            header.push_str(&format!("Before: {}\n", before.timestamp().format("%Y-%m-%d %H:%M")));
        }
        header.push_str(BANNER);
        header.push_str("\n\n");

        self.sink.write_str(&header).await?;
        Ok(())
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        let context = self.context.clone();
        let mut block = String::new();

        let stamp = context.format_timestamp(message.timestamp, None);
        block.push_str(&format!("[{stamp}] {}\n", message.author.full_name()));

        let content = render_plain_content(&context, message);
        if !content.is_empty() {
            block.push_str(&content);
            block.push('\n');
        }
        if message.edited_timestamp.is_some() {
            block.push_str("(edited)\n");
        }

        if !message.attachments.is_empty() {
            block.push_str("{Attachments}\n");
            for attachment in &message.attachments {
                let url = context.resolve_asset_url(&attachment.url).await;
                block.push_str(&url);
                block.push('\n');
            }
        }

        for embed in &message.embeds {
            block.push_str("{Embed}\n");
            for line in [
                embed.author.as_ref().and_then(|a| a.name.clone()),
                embed.url.clone(),
                embed.title.clone(),
                embed.description.clone(),
            ]
            .into_iter()
            .flatten()
            {
                block.push_str(&line);
                block.push('\n');
            }
            for field in &embed.fields {
                block.push_str(&format!("{}: {}\n", field.name, field.value));
            }
            for image in embed.all_images() {
                let url = context.resolve_asset_url(&image.url).await;
                block.push_str(&url);
                block.push('\n');
            }
        }

        if !message.stickers.is_empty() {
            block.push_str("{Stickers}\n");
            for sticker in &message.stickers {
                let url = context.resolve_asset_url(&sticker.source_url()).await;
                block.push_str(&format!("{} ({url})\n", sticker.name));
            }
        }

        if !message.reactions.is_empty() {
            block.push_str("{Reactions}\n");
            let line = message
                .reactions
                .iter()
                .map(|r| {
                    if r.count > 1 {
                        format!("{} ({})", r.emoji.code(), r.count)
                    } else {
                        r.emoji.code()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            block.push_str(&line);
            block.push('\n');
        }

        block.push('\n');
        self.sink.write_str(&block).await?;
        self.messages_written += 1;
        Ok(())
    }

    pub async fn write_postamble(&mut self) -> Result<()> {
        let footer = format!(
            "{BANNER}\nExported {} message(s)\n{BANNER}\n",
            self.messages_written
        );
        self.sink.write_str(&footer).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}
