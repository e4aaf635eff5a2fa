use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use chronicle_client::RateLimitPreference;
use chronicle_model::Id;

use crate::partition::PartitionLimit;

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    PlainText,
    HtmlDark,
    HtmlLight,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::HtmlDark | Self::HtmlLight => "html",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn is_html(self) -> bool {
        matches!(self, Self::HtmlDark | Self::HtmlLight)
    }
}

/// The full configuration surface of one export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Authentication token. The kind (user/bot) is resolved by probing.
    pub token: String,
    pub rate_limit_preference: RateLimitPreference,
    pub format: ExportFormat,
    /// Only messages with ids strictly greater than this are exported.
    pub after: Option<Id>,
    /// Only messages with ids strictly smaller than this are exported.
    pub before: Option<Id>,
    pub partition_limit: PartitionLimit,
    /// Filter expression; empty means export everything.
    pub message_filter: String,
    pub should_format_markdown: bool,
    pub should_download_assets: bool,
    /// Reuse previously downloaded assets. Only meaningful together with
    /// `should_download_assets`.
    pub should_reuse_assets: bool,
    /// `%`-template for the asset sidecar directory. `None` derives
    /// `<output>_Files/` from the output path.
    pub assets_dir_path: Option<String>,
    /// BCP-47 tag for date formatting; unknown or unset falls back to `en`.
    pub locale: Option<String>,
    pub is_utc_normalization_enabled: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            token: String::new(),
            rate_limit_preference: RateLimitPreference::RespectAll,
            format: ExportFormat::HtmlDark,
            after: None,
            before: None,
            partition_limit: PartitionLimit::Null,
            message_filter: String::new(),
            should_format_markdown: true,
            should_download_assets: false,
            should_reuse_assets: false,
            assets_dir_path: None,
            locale: None,
            is_utc_normalization_enabled: false,
        }
    }
}

/// One export job: a channel, a destination and the options to apply.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub channel_id: Id,
    /// Output file path, may contain `%`-template codes.
    pub output_path: PathBuf,
    pub options: ExportOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ExportOptions::default();
        assert_eq!(options.rate_limit_preference, RateLimitPreference::RespectAll);
        assert!(options.should_format_markdown);
        assert!(!options.should_download_assets);
        assert!(!options.should_reuse_assets);
        assert!(!options.is_utc_normalization_enabled);
        assert!(matches!(options.partition_limit, PartitionLimit::Null));
    }

    #[test]
    fn format_extensions() {
        assert_eq!(ExportFormat::PlainText.extension(), "txt");
        assert_eq!(ExportFormat::HtmlDark.extension(), "html");
        assert_eq!(ExportFormat::HtmlLight.extension(), "html");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
    }
}
