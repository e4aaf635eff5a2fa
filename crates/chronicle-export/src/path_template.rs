//! Output path templating and filesystem-safe naming.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use chronicle_model::{Channel, Guild, Id};

const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace characters that common filesystems reject.
pub fn sanitize_file_name(input: &str) -> String {
    input
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) || c.is_control() { '_' } else { c })
        .collect()
}

/// Values substituted into `%`-templates.
pub struct TemplateContext<'a> {
    pub guild: &'a Guild,
    pub channel: &'a Channel,
    pub after: Option<Id>,
    pub before: Option<Id>,
}

impl TemplateContext<'_> {
    fn parent(&self) -> Option<&Channel> {
        self.channel.parent.as_deref()
    }

    fn date_code(&self, id: Option<Id>) -> String {
        id.map(|id| id.timestamp().format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Expand the supported `%`-codes. Unrecognised codes pass through verbatim;
/// every substituted value is sanitised.
///
/// Codes: `%g`/`%G` guild id/name, `%t`/`%T` parent id/name, `%c`/`%C`
/// channel id/name, `%p`/`%P` channel/parent position, `%a`/`%b` after/before
/// date, `%d` current date, `%%` a literal percent.
pub fn expand_template(template: &str, ctx: &TemplateContext<'_>) -> String {
    expand_template_at(template, ctx, Utc::now())
}

fn expand_template_at(template: &str, ctx: &TemplateContext<'_>, now: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&code) = chars.peek() else {
            out.push('%');
            break;
        };
        let substitution = match code {
            'g' => Some(ctx.guild.id.to_string()),
            'G' => Some(ctx.guild.name.clone()),
            't' => Some(ctx.parent().map(|p| p.id.to_string()).unwrap_or_default()),
            'T' => Some(ctx.parent().map(|p| p.name()).unwrap_or_default()),
            'c' => Some(ctx.channel.id.to_string()),
            'C' => Some(ctx.channel.name()),
            'p' => Some(ctx.channel.position.unwrap_or(0).to_string()),
            'P' => Some(
                ctx.parent()
                    .and_then(|p| p.position)
                    .unwrap_or(0)
                    .to_string(),
            ),
            'a' => Some(ctx.date_code(ctx.after)),
            'b' => Some(ctx.date_code(ctx.before)),
            'd' => Some(now.format("%Y-%m-%d").to_string()),
            '%' => Some("%".to_string()),
            _ => None,
        };
        match substitution {
            Some(value) => {
                chars.next();
                if code == '%' {
                    out.push('%');
                } else {
                    out.push_str(&sanitize_file_name(&value));
                }
            }
            None => out.push('%'),
        }
    }

    out
}

/// The default output file name:
/// `<guild> - [<parent> - ]<channel> [<id>][ (range)].<ext>`.
pub fn default_file_name(ctx: &TemplateContext<'_>, extension: &str) -> String {
    let mut name = format!("{} - ", ctx.guild.name);
    if let Some(parent) = ctx.parent() {
        name.push_str(&format!("{} - ", parent.name()));
    }
    name.push_str(&format!("{} [{}]", ctx.channel.name(), ctx.channel.id));

    let range = match (ctx.after, ctx.before) {
        (Some(after), Some(before)) => Some(format!(
            "{} to {}",
            ctx.date_code(Some(after)),
            ctx.date_code(Some(before))
        )),
        (Some(after), None) => Some(format!("after {}", ctx.date_code(Some(after)))),
        (None, Some(before)) => Some(format!("before {}", ctx.date_code(Some(before)))),
        (None, None) => None,
    };
    if let Some(range) = range {
        name.push_str(&format!(" ({range})"));
    }

    format!("{}.{extension}", sanitize_file_name(&name))
}

/// Inject `" [part N]"` before the extension. Partition 0 keeps the base
/// path untouched; the first rolled-over file is `[part 2]`.
pub fn partition_path(base: &Path, partition_index: u32) -> PathBuf {
    if partition_index == 0 {
        return base.to_path_buf();
    }
    let suffix = format!(" [part {}]", partition_index + 1);
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let file_name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };
    base.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn guild() -> Guild {
        serde_json::from_str(r#"{"id":"10","name":"My Guild"}"#).unwrap()
    }

    fn channel() -> Channel {
        let parent: Channel =
            serde_json::from_str(r#"{"id":"20","type":4,"name":"Info","position":1}"#).unwrap();
        let channel: Channel =
            serde_json::from_str(r#"{"id":"30","type":0,"name":"general","position":3}"#).unwrap();
        channel.with_parent(Some(parent))
    }

    #[test]
    fn sanitizes_illegal_characters() {
        assert_eq!(sanitize_file_name("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_file_name("fine name"), "fine name");
    }

    #[test]
    fn expands_known_codes() {
        let guild = guild();
        let channel = channel();
        let ctx = TemplateContext { guild: &guild, channel: &channel, after: None, before: None };

        assert_eq!(expand_template("%G/%C", &ctx), "My Guild/general");
        assert_eq!(expand_template("%g-%c-%p", &ctx), "10-30-3");
        assert_eq!(expand_template("%T [%t] pos %P", &ctx), "Info [20] pos 1");
        assert_eq!(expand_template("100%%", &ctx), "100%");
        // Unknown codes pass through.
        assert_eq!(expand_template("%x%C", &ctx), "%xgeneral");
    }

    #[test]
    fn default_name_with_range() {
        let guild = guild();
        let channel = channel();
        let after = Id::from_date(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        let ctx = TemplateContext {
            guild: &guild,
            channel: &channel,
            after: Some(after),
            before: None,
        };

        let name = default_file_name(&ctx, "html");
        assert_eq!(name, "My Guild - Info - general [30] (after 2021-01-01).html");
    }

    #[test]
    fn partition_paths() {
        let base = Path::new("/tmp/export.html");
        assert_eq!(partition_path(base, 0), PathBuf::from("/tmp/export.html"));
        assert_eq!(
            partition_path(base, 1),
            PathBuf::from("/tmp/export [part 2].html")
        );
        assert_eq!(
            partition_path(Path::new("/tmp/no_ext"), 2),
            PathBuf::from("/tmp/no_ext [part 3]")
        );
    }
}
