//! The export pipeline.
//!
//! Stitches client → batcher → member resolver → filter → partitioned sink.
//! One pipeline handles one channel; callers wanting parallel exports run
//! several pipelines, each with its own context.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use futures::StreamExt;
use tracing::{debug, info};

use chronicle_client::{ApiClient, ProgressFn};
use chronicle_model::{ChannelKind, Id, Message, User};

use crate::assets::AssetCache;
use crate::config::ExportRequest;
use crate::context::ExportContext;
use crate::error::{ExportError, Result};
use crate::filter::MessageFilter;
use crate::path_template::{default_file_name, expand_template, TemplateContext};
use crate::sink::PartitionedSink;

/// Messages buffered before member resolution and writing.
const BATCH_SIZE: usize = 50;

/// Concurrent member look-ups within one batch.
const MEMBER_PARALLELISM: usize = 10;

/// Cooperative cancellation handle. Cancelling aborts pagination between
/// pages; partial output stays on disk.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub messages_written: u64,
}

/// Export one channel. Progress reporting is advisory; errors carry an
/// [`is_fatal`](ExportError::is_fatal) flag distinguishing "abort the job"
/// from "skip this channel".
pub async fn export_channel(
    request: &ExportRequest,
    progress: Option<ProgressFn>,
) -> Result<ExportSummary> {
    export_channel_with_cancellation(request, progress, CancelFlag::new()).await
}

pub async fn export_channel_with_cancellation(
    request: &ExportRequest,
    progress: Option<ProgressFn>,
    cancel: CancelFlag,
) -> Result<ExportSummary> {
    let options = request.options.clone();

    let client = Arc::new(
        ApiClient::connect(&options.token, options.rate_limit_preference).await?,
    );

    let channel = client.get_channel(request.channel_id).await?;
    if channel.kind == ChannelKind::Forum {
        return Err(ExportError::UnsupportedChannel);
    }

    let guild = client
        .get_guild(channel.guild_id.unwrap_or(Id::new(0)))
        .await?;

    info!(
        guild = %guild.name,
        channel = %channel.name(),
        format = ?options.format,
        "starting export"
    );

    let template_ctx = TemplateContext {
        guild: &guild,
        channel: &channel,
        after: options.after,
        before: options.before,
    };
    let output_path = resolve_output_path(&request.output_path, &template_ctx, &options);
    let output_dir = output_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let assets = if options.should_download_assets {
        let dir = match &options.assets_dir_path {
            Some(template) => PathBuf::from(expand_template(template, &template_ctx)),
            None => PathBuf::from(format!("{}_Files", output_path.display())),
        };
        Some(AssetCache::new(dir, options.should_reuse_assets))
    } else {
        None
    };

    let filter = MessageFilter::parse(&options.message_filter)?;
    let format = options.format;
    let partition_limit = options.partition_limit;
    let after = options.after;
    let before = options.before;

    let context = Arc::new(ExportContext::new(
        client.clone(),
        options,
        guild.clone(),
        channel.clone(),
        output_dir,
        assets,
    ));
    context.populate_channels_and_roles().await?;

    let mut sink = PartitionedSink::new(context.clone(), format, partition_limit, output_path.clone());

    // An empty channel (or an empty requested range) still yields a file
    // with preamble and postamble, but reports the soft-empty error.
    let provably_empty = channel.is_empty()
        || matches!(after, Some(a) if !channel.may_have_messages_after(a))
        || matches!(before, Some(b) if !channel.may_have_messages_before(b));
    if provably_empty {
        sink.finish().await?;
        return Err(ExportError::ChannelEmpty(channel.name()));
    }

    let guild_name = guild.name.clone();
    let channel_name = channel.name();
    let mut stream = client.get_messages(channel.id, after, before, progress);
    let mut batch: Vec<Message> = Vec::with_capacity(BATCH_SIZE);

    while let Some(item) = stream.next().await {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        batch.push(item?);
        if batch.len() >= BATCH_SIZE {
            process_batch(&context, &filter, &mut sink, &mut batch, &guild_name, &channel_name)
                .await?;
        }
    }
    drop(stream);

    if !batch.is_empty() {
        process_batch(&context, &filter, &mut sink, &mut batch, &guild_name, &channel_name)
            .await?;
    }

    let messages_written = sink.finish().await?;
    Ok(ExportSummary {
        output_path,
        messages_written,
    })
}

/// Resolve every user the batch references, then filter and write its
/// messages in order. Member resolution runs in bounded-parallel groups and
/// completes before the first message of the batch reaches the writer.
async fn process_batch(
    context: &Arc<ExportContext>,
    filter: &MessageFilter,
    sink: &mut PartitionedSink,
    batch: &mut Vec<Message>,
    guild_name: &str,
    channel_name: &str,
) -> Result<()> {
    let mut seen: HashSet<Id> = HashSet::new();
    let mut users: Vec<User> = Vec::new();
    for message in batch.iter() {
        for user in message.referenced_users() {
            if seen.insert(user.id) {
                users.push(user.clone());
            }
        }
    }

    debug!(
        messages = batch.len(),
        users = users.len(),
        "resolving batch members"
    );
    for chunk in users.chunks(MEMBER_PARALLELISM) {
        let results = join_all(chunk.iter().map(|user| context.populate_member(user))).await;
        for result in results {
            result?;
        }
    }

    for message in batch.drain(..) {
        if !filter.matches(&message) {
            continue;
        }
        sink.write_message(&message)
            .await
            .map_err(|err| err.wrap_write(guild_name, channel_name, message.id))?;
    }
    Ok(())
}

/// A directory-like output path gets the default file name appended;
/// anything else is used as-is after `%`-template expansion.
fn resolve_output_path(
    raw: &std::path::Path,
    template_ctx: &TemplateContext<'_>,
    options: &crate::config::ExportOptions,
) -> PathBuf {
    let expanded = expand_template(&raw.to_string_lossy(), template_ctx);
    let expanded_path = PathBuf::from(&expanded);

    let treat_as_dir = expanded.ends_with('/')
        || expanded.ends_with(std::path::MAIN_SEPARATOR)
        || expanded_path.is_dir();
    if treat_as_dir {
        expanded_path.join(default_file_name(template_ctx, options.format.extension()))
    } else {
        expanded_path
    }
}
