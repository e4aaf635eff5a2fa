//! Authenticated access to the upstream HTTP API.
//!
//! All fetches go through one retrying request core that also feeds the
//! [`RateBudget`]. List endpoints are exposed as lazy [`BoxStream`]s: finite,
//! single-pass, fetched one page at a time with no prefetch, so consumer
//! backpressure is implicit.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use chronicle_model::{Channel, Emoji, Guild, Id, Member, Message, Role, User};

use crate::error::{ClientError, Result};
use crate::rate_limit::RateBudget;
use crate::retry::{self, MAX_ATTEMPTS};
use crate::token::{RateLimitPreference, Token, TokenKind};

const API_BASE: &str = "https://discord.com/api/v10";
const PAGE_SIZE: usize = 100;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Progress callback invoked with a fraction in `[0, 1]`. Advisory only.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// The application record behind a bot token.
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: Id,
    #[serde(default)]
    pub flags: u64,
}

impl Application {
    const GATEWAY_MESSAGE_CONTENT: u64 = 1 << 18;
    const GATEWAY_MESSAGE_CONTENT_LIMITED: u64 = 1 << 19;

    pub fn has_message_content_intent(&self) -> bool {
        self.flags & (Self::GATEWAY_MESSAGE_CONTENT | Self::GATEWAY_MESSAGE_CONTENT_LIMITED) != 0
    }
}

/// A guild invite, resolved from its code.
#[derive(Debug, Clone, Deserialize)]
pub struct Invite {
    pub code: String,
    #[serde(default)]
    pub guild: Option<Guild>,
    #[serde(default)]
    pub channel: Option<Channel>,
}

pub struct ApiClient {
    http: reqwest::Client,
    token: Token,
    preference: RateLimitPreference,
    budget: RateBudget,
    application: OnceCell<Option<Application>>,
}

impl ApiClient {
    /// Build a client for a token whose kind is already known.
    pub fn new(token: Token, preference: RateLimitPreference) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(IDLE_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            token,
            preference,
            budget: RateBudget::new(),
            application: OnceCell::new(),
        })
    }

    /// Resolve the token kind and build a client.
    ///
    /// The kind is discovered by probing `GET /users/@me` twice: first with
    /// the raw token, then with a `Bot `-prefixed one. Whichever answers with
    /// anything other than 401 wins; failing both is fatal.
    pub async fn connect(raw_token: &str, preference: RateLimitPreference) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(IDLE_TIMEOUT)
            .build()?;

        for kind in [TokenKind::User, TokenKind::Bot] {
            let token = Token::new(raw_token, kind);
            let response = http
                .get(format!("{API_BASE}/users/@me"))
                .header(reqwest::header::AUTHORIZATION, token.header_value())
                .send()
                .await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                debug!(kind = ?kind, "resolved token kind");
                return Ok(Self::new(token, preference)?);
            }
        }

        Err(ClientError::InvalidToken)
    }

    pub fn token_kind(&self) -> TokenKind {
        self.token.kind()
    }

    fn respects_budget(&self) -> bool {
        self.preference.is_respected_for(self.token.kind())
    }

    /// Request core: retry with backoff, then budget accounting.
    async fn get_response(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{API_BASE}/{path}");
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = self
                .http
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, self.token.header_value())
                .send()
                .await;

            let response = match outcome {
                Ok(response) => response,
                Err(err) if attempt < MAX_ATTEMPTS => {
                    let delay = retry::backoff_delay(attempt - 1);
                    warn!(path, error = %err, attempt, "transport error, retrying");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            self.budget.observe(response.headers());
            if self.respects_budget() {
                self.budget.pause_if_depleted().await;
            }

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::UNAUTHORIZED {
                return Err(ClientError::InvalidToken);
            }
            if retry::is_retryable(status) && attempt < MAX_ATTEMPTS {
                let delay =
                    retry::retry_after(&response).unwrap_or_else(|| retry::backoff_delay(attempt - 1));
                warn!(path, %status, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(ClientError::Status {
                status,
                path: path.to_string(),
            });
        }
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let response = self.get_response(path).await?;
        Ok(response.json().await?)
    }

    /// Like [`get_json`], but 403/404 become `None` instead of an error.
    async fn try_get_json(&self, path: &str) -> Result<Option<serde_json::Value>> {
        match self.get_json(path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if !err.is_fatal() => Ok(None),
            Err(err) => Err(err),
        }
    }

    // ---- single-item fetches ----

    pub async fn get_guild(&self, guild_id: Id) -> Result<Guild> {
        if guild_id.value() == 0 {
            return Ok(Guild::direct_messages());
        }
        let value = self.get_json(&format!("guilds/{guild_id}")).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch a channel and resolve its parent chain (thread → channel →
    /// category, at most two levels).
    pub async fn get_channel(&self, channel_id: Id) -> Result<Channel> {
        let mut channel = self.fetch_channel(channel_id).await?;
        if let Some(parent_id) = channel.parent_id {
            if let Some(mut parent) = self.try_fetch_channel(parent_id).await? {
                if let Some(grandparent_id) = parent.parent_id {
                    if let Some(grandparent) = self.try_fetch_channel(grandparent_id).await? {
                        parent = parent.with_parent(Some(grandparent));
                    }
                }
                channel = channel.with_parent(Some(parent));
            }
        }
        Ok(channel)
    }

    async fn fetch_channel(&self, channel_id: Id) -> Result<Channel> {
        let value = self.get_json(&format!("channels/{channel_id}")).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn try_fetch_channel(&self, channel_id: Id) -> Result<Option<Channel>> {
        Ok(self
            .try_get_json(&format!("channels/{channel_id}"))
            .await?
            .map(serde_json::from_value)
            .transpose()?)
    }

    /// The application record, fetched once and cached. `None` for user
    /// tokens or when the endpoint is unavailable.
    pub async fn get_application(&self) -> Result<Option<Application>> {
        self.application
            .get_or_try_init(|| async {
                if self.token.kind() != TokenKind::Bot {
                    return Ok(None);
                }
                Ok(self
                    .try_get_json("applications/@me")
                    .await?
                    .map(serde_json::from_value)
                    .transpose()?)
            })
            .await
            .map(|app| app.clone())
    }

    pub async fn try_get_user(&self, user_id: Id) -> Result<Option<User>> {
        Ok(self
            .try_get_json(&format!("users/{user_id}"))
            .await?
            .map(serde_json::from_value)
            .transpose()?)
    }

    pub async fn try_get_member(&self, guild_id: Id, user_id: Id) -> Result<Option<Member>> {
        if guild_id.value() == 0 {
            return Ok(None);
        }
        let value = self
            .try_get_json(&format!("guilds/{guild_id}/members/{user_id}"))
            .await?;
        let member = value
            .map(serde_json::from_value::<Member>)
            .transpose()?
            .map(|mut member| {
                member.guild_id = Some(guild_id);
                member
            });
        Ok(member)
    }

    pub async fn try_get_invite(&self, code: &str) -> Result<Option<Invite>> {
        Ok(self
            .try_get_json(&format!("invites/{}", percent_encode(code)))
            .await?
            .map(serde_json::from_value)
            .transpose()?)
    }

    // ---- lazy streams ----

    /// All guilds visible to the current token, ascending by id.
    pub fn get_user_guilds(&self) -> BoxStream<'_, Result<Guild>> {
        stream::unfold(Some(Id::new(0)), move |cursor| async move {
            let after = cursor?;
            let page: Vec<Guild> = match self
                .get_json(&format!("users/@me/guilds?limit={PAGE_SIZE}&after={after}"))
                .await
                .and_then(|v| serde_json::from_value(v).map_err(ClientError::from))
            {
                Ok(page) => page,
                Err(err) => return Some((vec![Err(err)], None)),
            };

            let next = match page.last() {
                Some(last) if page.len() >= PAGE_SIZE => Some(last.id),
                _ => None,
            };
            Some((page.into_iter().map(Ok).collect(), next))
        })
        .flat_map(stream::iter)
        .boxed()
    }

    /// Direct-message channels of the current user.
    pub fn get_user_dm_channels(&self) -> BoxStream<'_, Result<Channel>> {
        self.list_stream("users/@me/channels".to_string())
    }

    /// Channels of a guild with category parents attached. Guild id 0 yields
    /// the user's DM channels instead.
    pub fn get_guild_channels(&self, guild_id: Id) -> BoxStream<'_, Result<Channel>> {
        if guild_id.value() == 0 {
            return self.get_user_dm_channels();
        }

        stream::once(async move {
            let value = self.get_json(&format!("guilds/{guild_id}/channels")).await?;
            let channels: Vec<Channel> = serde_json::from_value(value)?;

            let categories: Vec<Channel> = channels
                .iter()
                .filter(|c| c.kind == chronicle_model::ChannelKind::Category)
                .cloned()
                .collect();

            Ok(channels
                .into_iter()
                .map(|channel| {
                    let parent = channel
                        .parent_id
                        .and_then(|pid| categories.iter().find(|c| c.id == pid).cloned());
                    channel.with_parent(parent)
                })
                .collect::<Vec<_>>())
        })
        .map(|result: Result<Vec<Channel>>| match result {
            Ok(items) => items.into_iter().map(Ok).collect(),
            Err(err) => vec![Err(err)],
        })
        .flat_map(stream::iter)
        .boxed()
    }

    /// Active threads of a guild. Parents are resolved against the given
    /// channel list.
    pub fn get_guild_threads<'a>(
        &'a self,
        guild_id: Id,
        parents: &'a [Channel],
    ) -> BoxStream<'a, Result<Channel>> {
        stream::once(async move {
            if guild_id.value() == 0 {
                return Ok(Vec::new());
            }
            let value = self
                .get_json(&format!("guilds/{guild_id}/threads/active"))
                .await?;
            let threads: Vec<Channel> = match value.get("threads") {
                Some(list) => serde_json::from_value(list.clone())?,
                None => Vec::new(),
            };
            Ok(threads
                .into_iter()
                .map(|thread| {
                    let parent = thread
                        .parent_id
                        .and_then(|pid| parents.iter().find(|c| c.id == pid).cloned());
                    thread.with_parent(parent)
                })
                .collect::<Vec<_>>())
        })
        .map(|result: Result<Vec<Channel>>| match result {
            Ok(items) => items.into_iter().map(Ok).collect(),
            Err(err) => vec![Err(err)],
        })
        .flat_map(stream::iter)
        .boxed()
    }

    pub fn get_guild_roles(&self, guild_id: Id) -> BoxStream<'_, Result<Role>> {
        if guild_id.value() == 0 {
            return stream::empty().boxed();
        }
        self.list_stream(format!("guilds/{guild_id}/roles"))
    }

    /// Messages in ascending id order within `(after, before)`.
    ///
    /// Pages of up to 100 are fetched with an `after` cursor; the upstream
    /// returns each page newest-first and the page is reversed before being
    /// emitted. A short page ends the stream.
    pub fn get_messages(
        &self,
        channel_id: Id,
        after: Option<Id>,
        before: Option<Id>,
        progress: Option<ProgressFn>,
    ) -> BoxStream<'_, Result<Message>> {
        let pager = MessagePager {
            client: self,
            channel_id,
            cursor: after.unwrap_or(Id::new(0)),
            before,
            span: None,
            started: false,
            done: false,
            progress,
        };

        stream::unfold(pager, |mut pager| async move {
            if pager.done {
                return None;
            }
            match pager.next_page().await {
                Ok(page) if page.is_empty() => None,
                Ok(page) => Some((page.into_iter().map(Ok).collect::<Vec<_>>(), pager)),
                Err(err) => {
                    pager.done = true;
                    Some((vec![Err(err)], pager))
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }

    /// Users who reacted with the given emoji, ascending by user id.
    pub fn get_message_reactions(
        &self,
        channel_id: Id,
        message_id: Id,
        emoji: &Emoji,
    ) -> BoxStream<'_, Result<User>> {
        let reaction_path = match emoji.id {
            Some(id) => format!("{}:{id}", emoji.name),
            None => percent_encode(&emoji.name),
        };

        stream::unfold(Some(Id::new(0)), move |cursor| {
            let path = reaction_path.clone();
            async move {
                let after = cursor?;
                let page: Vec<User> = match self
                    .get_json(&format!(
                        "channels/{channel_id}/messages/{message_id}/reactions/{path}?limit={PAGE_SIZE}&after={after}"
                    ))
                    .await
                    .and_then(|v| serde_json::from_value(v).map_err(ClientError::from))
                {
                    Ok(page) => page,
                    Err(err) => return Some((vec![Err(err)], None)),
                };

                let next = match page.last() {
                    Some(last) if page.len() >= PAGE_SIZE => Some(last.id),
                    _ => None,
                };
                Some((page.into_iter().map(Ok).collect::<Vec<_>>(), next))
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }

    /// One-shot list endpoint exposed as a stream.
    fn list_stream<T>(&self, path: String) -> BoxStream<'_, Result<T>>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        stream::once(async move {
            let value = self.get_json(&path).await?;
            let items: Vec<T> = serde_json::from_value(value)?;
            Ok(items)
        })
        .map(|result: Result<Vec<T>>| match result {
            Ok(items) => items.into_iter().map(Ok).collect(),
            Err(err) => vec![Err(err)],
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

struct MessagePager<'a> {
    client: &'a ApiClient,
    channel_id: Id,
    cursor: Id,
    before: Option<Id>,
    /// Millisecond timestamps of the first emitted and last reachable
    /// message, for progress interpolation.
    span: Option<(i64, i64)>,
    started: bool,
    done: bool,
    progress: Option<ProgressFn>,
}

impl MessagePager<'_> {
    async fn next_page(&mut self) -> Result<Vec<Message>> {
        if !self.started {
            self.started = true;
            self.probe_last().await?;
        }

        let value = self
            .client
            .get_json(&format!(
                "channels/{}/messages?limit={PAGE_SIZE}&after={}",
                self.channel_id, self.cursor
            ))
            .await?;
        let raw = match value.as_array() {
            Some(items) => items.clone(),
            None => Vec::new(),
        };
        let short_page = raw.len() < PAGE_SIZE;

        // Newest-first on the wire; ascending on the way out.
        let mut page = raw
            .into_iter()
            .rev()
            .map(Message::parse)
            .collect::<chronicle_model::Result<Vec<_>>>()?;

        if page.is_empty() {
            self.done = true;
            return Ok(page);
        }

        self.check_content_intent(&page).await?;

        if let Some(last) = page.last() {
            self.cursor = last.id;
        }
        if short_page {
            self.done = true;
        }

        if let Some(before) = self.before {
            let len_before = page.len();
            page.retain(|m| m.id < before);
            if page.len() < len_before {
                self.done = true;
            }
        }

        self.report_progress(&page);
        Ok(page)
    }

    /// Probe the newest message in range once so progress can be reported
    /// as a timestamp fraction.
    async fn probe_last(&mut self) -> Result<()> {
        let query = match self.before {
            Some(before) => format!("limit=1&before={before}"),
            None => "limit=1".to_string(),
        };
        let value = self
            .client
            .get_json(&format!("channels/{}/messages?{query}", self.channel_id))
            .await?;
        if let Some(last) = value.as_array().and_then(|a| a.first()) {
            let last = Message::parse(last.clone())?;
            self.span = Some((0, last.timestamp.timestamp_millis()));
        }
        Ok(())
    }

    /// A full page of empty contents from a bot token whose application
    /// lacks the message-content intent means every later page would be
    /// empty too; fail fast instead of silently exporting husks.
    async fn check_content_intent(&self, page: &[Message]) -> Result<()> {
        if self.client.token.kind() != TokenKind::Bot {
            return Ok(());
        }
        let all_empty = page
            .iter()
            .all(|m| m.content.is_empty() && !m.is_system_notification());
        if !all_empty {
            return Ok(());
        }
        match self.client.get_application().await? {
            Some(app) if !app.has_message_content_intent() => {
                Err(ClientError::MissingContentIntent)
            }
            _ => Ok(()),
        }
    }

    fn report_progress(&mut self, page: &[Message]) {
        let (Some(callback), Some(newest)) = (&self.progress, page.last()) else {
            return;
        };
        let Some((first_ms, last_ms)) = &mut self.span else {
            return;
        };
        if *first_ms == 0 {
            *first_ms = page[0].timestamp.timestamp_millis();
        }
        let total = *last_ms - *first_ms;
        let fraction = if total <= 0 {
            1.0
        } else {
            (newest.timestamp.timestamp_millis() - *first_ms) as f64 / total as f64
        };
        callback(fraction.clamp(0.0, 1.0));
    }
}

/// Percent-encode everything outside the unreserved set.
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_encoding_unicode() {
        assert_eq!(percent_encode("abc-123"), "abc-123");
        assert_eq!(percent_encode("🔥"), "%F0%9F%94%A5");
        assert_eq!(percent_encode("a b"), "a%20b");
    }

    #[test]
    fn application_intent_bits() {
        let none = Application { id: Id::new(1), flags: 0 };
        assert!(!none.has_message_content_intent());

        let full = Application { id: Id::new(1), flags: 1 << 18 };
        let limited = Application { id: Id::new(1), flags: 1 << 19 };
        assert!(full.has_message_content_intent());
        assert!(limited.has_message_content_intent());
    }

    #[test]
    fn invite_parses_partial_payload() {
        let invite: Invite = serde_json::from_str(
            r#"{"code":"abc123","guild":{"id":"1","name":"g"},"channel":null}"#,
        )
        .unwrap();
        assert_eq!(invite.code, "abc123");
        assert!(invite.guild.is_some());
        assert!(invite.channel.is_none());
    }
}
