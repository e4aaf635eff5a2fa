//! Writer lifecycle and partition rollover.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use chronicle_model::Message;

use crate::config::ExportFormat;
use crate::context::ExportContext;
use crate::error::Result;
use crate::partition::PartitionLimit;
use crate::path_template::partition_path;
use crate::writers::FormatWriter;

/// A buffered file writer that counts every byte it emits.
pub struct CountingSink {
    inner: BufWriter<File>,
    bytes: u64,
}

impl CountingSink {
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = File::create(path).await?;
        Ok(Self {
            inner: BufWriter::new(file),
            bytes: 0,
        })
    }

    pub async fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        self.write_bytes(s.as_bytes()).await
    }

    pub async fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(bytes).await?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub async fn close(&mut self) -> std::io::Result<()> {
        self.inner.flush().await
    }
}

/// Owns the current format writer and rolls partitions when the configured
/// limit trips.
pub struct PartitionedSink {
    context: Arc<ExportContext>,
    format: ExportFormat,
    limit: PartitionLimit,
    base_path: PathBuf,
    writer: Option<FormatWriter>,
    partition_index: u32,
    messages_in_partition: u64,
    messages_total: u64,
}

impl PartitionedSink {
    pub fn new(
        context: Arc<ExportContext>,
        format: ExportFormat,
        limit: PartitionLimit,
        base_path: PathBuf,
    ) -> Self {
        Self {
            context,
            format,
            limit,
            base_path,
            writer: None,
            partition_index: 0,
            messages_in_partition: 0,
            messages_total: 0,
        }
    }

    pub fn messages_written(&self) -> u64 {
        self.messages_total
    }

    async fn open_partition(&mut self) -> Result<()> {
        let path = partition_path(&self.base_path, self.partition_index);
        debug!(path = %path.display(), partition = self.partition_index, "opening partition");

        let mut writer = FormatWriter::create(self.context.clone(), self.format, &path).await?;
        writer.write_preamble().await?;
        self.writer = Some(writer);
        self.messages_in_partition = 0;
        Ok(())
    }

    async fn close_current(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.write_postamble().await?;
            writer.close().await?;
        }
        Ok(())
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        match &self.writer {
            None => self.open_partition().await?,
            Some(writer) => {
                if self
                    .limit
                    .is_reached(self.messages_in_partition, writer.bytes_written())
                {
                    self.close_current().await?;
                    self.partition_index += 1;
                    self.open_partition().await?;
                }
            }
        }

        let writer = self.writer.as_mut().expect("partition writer just opened");
        writer.write_message(message).await?;
        self.messages_in_partition += 1;
        self.messages_total += 1;
        Ok(())
    }

    /// Finish the export. A run that never wrote a message still produces
    /// one file holding only preamble and postamble.
    pub async fn finish(&mut self) -> Result<u64> {
        if self.writer.is_none() {
            self.open_partition().await?;
        }
        self.close_current().await?;
        info!(
            messages = self.messages_total,
            partitions = self.partition_index + 1,
            "export finished"
        );
        Ok(self.messages_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use chronicle_client::{ApiClient, RateLimitPreference, Token, TokenKind};
    use chronicle_model::{Channel, Guild, Message};

    use crate::config::ExportOptions;
    use crate::partition::FileSize;

    fn context(output_dir: &Path) -> Arc<ExportContext> {
        let client = Arc::new(
            ApiClient::new(
                Token::new("test-token", TokenKind::User),
                RateLimitPreference::IgnoreAll,
            )
            .expect("client should build"),
        );
        let guild: Guild = serde_json::from_str(r#"{"id":"1","name":"Test Guild"}"#).unwrap();
        let channel: Channel = serde_json::from_str(
            r#"{"id":"2","type":0,"name":"general","last_message_id":"99"}"#,
        )
        .unwrap();
        Arc::new(ExportContext::new(
            client,
            ExportOptions::default(),
            guild,
            channel,
            output_dir.to_path_buf(),
            None,
        ))
    }

    fn message(id: u64, content: &str) -> Message {
        Message::parse(json!({
            "id": id.to_string(),
            "type": 0,
            "author": {"id": "7", "username": "tester"},
            "timestamp": "2021-06-01T10:00:00+00:00",
            "content": content
        }))
        .unwrap()
    }

    fn count_message_headers(text: &str) -> usize {
        text.lines().filter(|line| line.starts_with('[')).count()
    }

    #[tokio::test]
    async fn count_limit_rolls_into_second_partition() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("export.txt");
        let mut sink = PartitionedSink::new(
            context(dir.path()),
            ExportFormat::PlainText,
            PartitionLimit::MessageCount(3),
            base.clone(),
        );

        for id in 1..=4u64 {
            sink.write_message(&message(id, "hello")).await.unwrap();
        }
        assert_eq!(sink.finish().await.unwrap(), 4);

        let first = std::fs::read_to_string(&base).unwrap();
        let second =
            std::fs::read_to_string(dir.path().join("export [part 2].txt")).unwrap();
        assert_eq!(count_message_headers(&first), 3);
        assert_eq!(count_message_headers(&second), 1);
    }

    #[tokio::test]
    async fn null_limit_keeps_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("export.txt");
        let mut sink = PartitionedSink::new(
            context(dir.path()),
            ExportFormat::PlainText,
            PartitionLimit::Null,
            base.clone(),
        );

        for id in 1..=10u64 {
            sink.write_message(&message(id, "hello")).await.unwrap();
        }
        sink.finish().await.unwrap();

        assert!(base.exists());
        assert!(!dir.path().join("export [part 2].txt").exists());
    }

    #[tokio::test]
    async fn empty_export_still_writes_preamble_and_postamble() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("empty.txt");
        let mut sink = PartitionedSink::new(
            context(dir.path()),
            ExportFormat::PlainText,
            PartitionLimit::Null,
            base.clone(),
        );

        assert_eq!(sink.finish().await.unwrap(), 0);
        let text = std::fs::read_to_string(&base).unwrap();
        assert!(text.contains("Test Guild"));
        assert!(text.contains("Exported 0 message(s)"));
    }

    #[tokio::test]
    async fn byte_size_limit_never_exceeded_by_more_than_one_message() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("export.txt");
        let limit_bytes = 600u64;
        let mut sink = PartitionedSink::new(
            context(dir.path()),
            ExportFormat::PlainText,
            PartitionLimit::ByteSize(FileSize::from_bytes(limit_bytes)),
            base.clone(),
        );

        for id in 1..=20u64 {
            sink.write_message(&message(id, &"x".repeat(80))).await.unwrap();
        }
        sink.finish().await.unwrap();

        // Every partition stays within limit + one message's worth of bytes.
        let mut index = 0;
        loop {
            let path = crate::path_template::partition_path(&base, index);
            if !path.exists() {
                break;
            }
            let len = std::fs::metadata(&path).unwrap().len();
            assert!(len < limit_bytes + 400, "partition {index} is {len} bytes");
            index += 1;
        }
        assert!(index >= 2, "expected multiple partitions");
    }

    #[tokio::test]
    async fn byte_counter_matches_file_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counted.txt");

        let mut writer =
            FormatWriter::create(context(dir.path()), ExportFormat::PlainText, &path)
                .await
                .unwrap();
        writer.write_preamble().await.unwrap();
        writer.write_message(&message(1, "first")).await.unwrap();
        writer.write_message(&message(2, "second")).await.unwrap();
        writer.write_postamble().await.unwrap();
        writer.close().await.unwrap();

        let reported = writer.bytes_written();
        let actual = std::fs::metadata(&path).unwrap().len();
        assert_eq!(reported, actual);
    }

    #[tokio::test]
    async fn csv_and_json_outputs_are_well_formed() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("out.csv");
        let mut writer =
            FormatWriter::create(context(dir.path()), ExportFormat::Csv, &csv_path)
                .await
                .unwrap();
        writer.write_preamble().await.unwrap();
        writer.write_message(&message(1, "has,comma")).await.unwrap();
        writer.write_postamble().await.unwrap();
        writer.close().await.unwrap();

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with('\u{FEFF}'));
        assert!(csv.contains("AuthorID,Author,Date,Content,Attachments,Reactions"));
        assert!(csv.contains("\"has,comma\""));

        let json_path = dir.path().join("out.json");
        let mut writer =
            FormatWriter::create(context(dir.path()), ExportFormat::Json, &json_path)
                .await
                .unwrap();
        writer.write_preamble().await.unwrap();
        writer.write_message(&message(1, "hello")).await.unwrap();
        writer.write_postamble().await.unwrap();
        writer.close().await.unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(document["messageCount"], 1);
        assert_eq!(document["messages"][0]["content"], "hello");
        assert_eq!(document["guild"]["name"], "Test Guild");
    }

    #[tokio::test]
    async fn html_groups_consecutive_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let mut writer =
            FormatWriter::create(context(dir.path()), ExportFormat::HtmlDark, &path)
                .await
                .unwrap();
        writer.write_preamble().await.unwrap();
        // Same author, same minute: one group.
        writer.write_message(&message(1, "one")).await.unwrap();
        writer.write_message(&message(2, "two")).await.unwrap();
        writer.write_postamble().await.unwrap();
        writer.close().await.unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert_eq!(html.matches("<div class=\"chatlog__message-group\">").count(), 1);
        assert!(html.contains("chatlog__message-container-1"));
        assert!(html.contains("chatlog__message-container-2"));
        assert!(html.contains("Exported 2 message(s)"));
    }
}
