//! CSV writer: UTF-8 BOM, fixed header, RFC 4180 quoting.

use std::path::Path;
use std::sync::Arc;

use chronicle_model::Message;

use crate::context::ExportContext;
use crate::error::Result;
use crate::sink::CountingSink;
use crate::writers::render_plain_content;

const BOM: &str = "\u{FEFF}";
const HEADER: &str = "AuthorID,Author,Date,Content,Attachments,Reactions";

pub struct CsvWriter {
    context: Arc<ExportContext>,
    sink: CountingSink,
}

impl CsvWriter {
    pub async fn create(context: Arc<ExportContext>, path: &Path) -> Result<Self> {
        Ok(Self {
            context,
            sink: CountingSink::create(path).await?,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    pub async fn write_preamble(&mut self) -> Result<()> {
        self.sink.write_str(BOM).await?;
        self.sink.write_str(HEADER).await?;
        self.sink.write_str("\n").await?;
        Ok(())
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        let context = self.context.clone();

        let mut attachments = Vec::with_capacity(message.attachments.len());
        for attachment in &message.attachments {
            attachments.push(context.resolve_asset_url(&attachment.url).await);
        }

        let reactions = message
            .reactions
            .iter()
            .map(|r| format!("{} ({})", r.emoji.code(), r.count))
            .collect::<Vec<_>>()
            .join(",");

        let row = [
            message.author.id.to_string(),
            message.author.full_name(),
            context.format_timestamp(message.timestamp, None),
            render_plain_content(&context, message),
            attachments.join(","),
            reactions,
        ]
        .map(|field| quote(&field))
        .join(",");

        self.sink.write_str(&row).await?;
        self.sink.write_str("\n").await?;
        Ok(())
    }

    pub async fn write_postamble(&mut self) -> Result<()> {
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

/// RFC 4180: fields holding commas, quotes or line breaks are wrapped in
/// double quotes, embedded quotes doubled.
fn quote(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(quote("hello"), "hello");
        assert_eq!(quote(""), "");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
