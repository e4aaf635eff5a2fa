//! Per-export cache and resolver.
//!
//! Tier-1 caches (members, channels, roles) are filled once at start and
//! incrementally as users are referenced; tier-2 values (ordered roles,
//! author colour) are derived from tier-1 on demand. The orchestrator is the
//! single writer; writers read only after the current batch's member
//! resolution has completed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, warn};

use chronicle_client::ApiClient;
use chronicle_model::{Channel, Color, Guild, Id, Member, Role, User};

use crate::assets::AssetCache;
use crate::config::ExportOptions;
use crate::error::Result;

pub struct ExportContext {
    pub client: Arc<ApiClient>,
    pub options: ExportOptions,
    pub guild: Guild,
    pub channel: Channel,
    /// Directory of the output file; asset paths inside it are emitted
    /// relative, anything outside stays absolute.
    output_dir: PathBuf,
    assets: Option<AssetCache>,
    members: Mutex<HashMap<Id, Option<Member>>>,
    channels: Mutex<HashMap<Id, Channel>>,
    roles: Mutex<HashMap<Id, Role>>,
}

impl ExportContext {
    pub fn new(
        client: Arc<ApiClient>,
        options: ExportOptions,
        guild: Guild,
        channel: Channel,
        output_dir: PathBuf,
        assets: Option<AssetCache>,
    ) -> Self {
        Self {
            client,
            options,
            guild,
            channel,
            output_dir,
            assets,
            members: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
        }
    }

    /// Fill the channel and role caches once, before the first batch.
    /// Active threads are merged in alongside the regular channels so thread
    /// mentions resolve too.
    pub async fn populate_channels_and_roles(&self) -> Result<()> {
        let channels: Vec<Channel> = self
            .client
            .get_guild_channels(self.guild.id)
            .try_collect()
            .await?;

        let mut threads = self.client.get_guild_threads(self.guild.id, &channels);
        while let Some(thread) = threads.next().await {
            let thread = thread?;
            self.channels
                .lock()
                .expect("channel cache lock poisoned")
                .insert(thread.id, thread);
        }
        drop(threads);

        {
            let mut cache = self.channels.lock().expect("channel cache lock poisoned");
            for channel in channels {
                cache.insert(channel.id, channel);
            }
        }

        let mut roles = self.client.get_guild_roles(self.guild.id);
        while let Some(role) = roles.next().await {
            let role = role?;
            self.roles
                .lock()
                .expect("role cache lock poisoned")
                .insert(role.id, role);
        }

        debug!(
            channels = self.channels.lock().expect("channel cache lock poisoned").len(),
            roles = self.roles.lock().expect("role cache lock poisoned").len(),
            "populated channel and role caches"
        );
        Ok(())
    }

    /// Resolve the guild member behind a referenced user, caching the result.
    ///
    /// A 404 (user left the guild) caches a fallback member synthesised from
    /// the user object so the id is never queried again.
    pub async fn populate_member(&self, user: &User) -> Result<()> {
        if self.member_cached(user.id) {
            return Ok(());
        }

        let member = self
            .client
            .try_get_member(self.guild.id, user.id)
            .await?
            .unwrap_or_else(|| Member::from_user(user.clone()));

        self.members
            .lock()
            .expect("member cache lock poisoned")
            .insert(user.id, Some(member));
        Ok(())
    }

    /// Resolve a member by bare id (mention targets outside the batch).
    /// Negative results are cached too, so a dead id is fetched only once.
    pub async fn populate_member_by_id(&self, user_id: Id) -> Result<()> {
        if self.member_cached(user_id) {
            return Ok(());
        }

        let member = match self.client.try_get_member(self.guild.id, user_id).await? {
            Some(member) => Some(member),
            None => self
                .client
                .try_get_user(user_id)
                .await?
                .map(Member::from_user),
        };

        self.members
            .lock()
            .expect("member cache lock poisoned")
            .insert(user_id, member);
        Ok(())
    }

    fn member_cached(&self, user_id: Id) -> bool {
        self.members
            .lock()
            .expect("member cache lock poisoned")
            .contains_key(&user_id)
    }

    pub fn member(&self, user_id: Id) -> Option<Member> {
        self.members
            .lock()
            .expect("member cache lock poisoned")
            .get(&user_id)
            .cloned()
            .flatten()
    }

    /// Rendered name of a user: guild nickname when known, profile name
    /// otherwise.
    pub fn display_name(&self, user: &User) -> String {
        match self.member(user.id) {
            Some(member) => member.display_name().to_string(),
            None => user.display_name_or_name().to_string(),
        }
    }

    pub fn channel_name(&self, channel_id: Id) -> String {
        self.channels
            .lock()
            .expect("channel cache lock poisoned")
            .get(&channel_id)
            .map(|c| c.name())
            .unwrap_or_else(|| "deleted-channel".to_string())
    }

    pub fn role(&self, role_id: Id) -> Option<Role> {
        self.roles
            .lock()
            .expect("role cache lock poisoned")
            .get(&role_id)
            .cloned()
    }

    pub fn role_name(&self, role_id: Id) -> String {
        self.role(role_id)
            .map(|r| r.name)
            .unwrap_or_else(|| "deleted-role".to_string())
    }

    /// The user's roles ordered by position, highest first.
    pub fn member_roles(&self, user_id: Id) -> Vec<Role> {
        let Some(member) = self.member(user_id) else {
            return Vec::new();
        };
        let mut roles: Vec<Role> = member
            .role_ids
            .iter()
            .filter_map(|id| self.role(*id))
            .collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position));
        roles
    }

    /// The colour a user renders with: the first explicit colour among their
    /// roles, highest position first.
    pub fn user_color(&self, user_id: Id) -> Option<Color> {
        self.member_roles(user_id)
            .into_iter()
            .find_map(|role| role.color)
    }

    /// Map an asset url to its exported form. With downloads disabled the
    /// url passes through; download failures are swallowed and fall back to
    /// the original url.
    pub async fn resolve_asset_url(&self, url: &str) -> String {
        if !self.options.should_download_assets {
            return url.to_string();
        }
        let Some(assets) = &self.assets else {
            return url.to_string();
        };

        match assets.resolve(url).await {
            Ok(path) => self.present_asset_path(&path),
            Err(err) => {
                warn!(url, error = %err, "asset download failed, keeping url");
                url.to_string()
            }
        }
    }

    /// Relative when the asset sits inside the output directory, absolute
    /// otherwise.
    fn present_asset_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.output_dir) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    /// Format an instant with one of the upstream format codes
    /// `{g, d, t, f, F, R}`. `None` renders the default (`g`).
    pub fn format_timestamp(&self, instant: DateTime<Utc>, code: Option<char>) -> String {
        let code = code.unwrap_or('g');
        if code == 'R' || code == 'r' {
            return relative_time(instant, Utc::now());
        }

        let pattern = self.date_pattern(code);
        if self.options.is_utc_normalization_enabled {
            instant.format(pattern).to_string()
        } else {
            instant.with_timezone(&Local).format(pattern).to_string()
        }
    }

    fn date_pattern(&self, code: char) -> &'static str {
        // Day-first ordering for non-English locales; full localisation is
        // out of proportion for an archive tool.
        let day_first = self
            .options
            .locale
            .as_deref()
            .map(|tag| !tag.to_ascii_lowercase().starts_with("en"))
            .unwrap_or(false);

        match (code, day_first) {
            ('d', false) => "%m/%d/%Y",
            ('d', true) => "%d/%m/%Y",
            ('D', false) => "%B %d, %Y",
            ('D', true) => "%d %B %Y",
            ('t', false) => "%I:%M %p",
            ('t', true) => "%H:%M",
            ('T', false) => "%I:%M:%S %p",
            ('T', true) => "%H:%M:%S",
            ('f', false) => "%A, %B %d, %Y %I:%M %p",
            ('f', true) => "%A %d %B %Y %H:%M",
            ('F', false) => "%A, %B %d, %Y %I:%M:%S %p",
            ('F', true) => "%A %d %B %Y %H:%M:%S",
            (_, false) => "%m/%d/%Y %I:%M %p",
            (_, true) => "%d/%m/%Y %H:%M",
        }
    }
}

fn relative_time(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - instant;
    let (magnitude, unit) = if delta.num_seconds().abs() < 60 {
        return "just now".to_string();
    } else if delta.num_minutes().abs() < 60 {
        (delta.num_minutes(), "minute")
    } else if delta.num_hours().abs() < 24 {
        (delta.num_hours(), "hour")
    } else {
        (delta.num_days(), "day")
    };

    let plural = if magnitude.abs() == 1 { "" } else { "s" };
    if magnitude >= 0 {
        format!("{} {unit}{plural} ago", magnitude.abs())
    } else {
        format!("in {} {unit}{plural}", magnitude.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let t = |secs: i64| relative_time(now - chrono::Duration::seconds(secs), now);

        assert_eq!(t(5), "just now");
        assert_eq!(t(120), "2 minutes ago");
        assert_eq!(t(3600 * 3), "3 hours ago");
        assert_eq!(t(86_400 * 2), "2 days ago");
        assert_eq!(
            relative_time(now + chrono::Duration::minutes(10), now),
            "in 10 minutes"
        );
    }
}
