//! Shortcode → unicode emoji table.
//!
//! Only names present here resolve to emoji nodes; anything else stays plain
//! text, matching how the upstream client treats unknown shortcodes.

pub(crate) const EMOJI_SHORTCODES: &[(&str, &str)] = &[
    ("smile", "😄"),
    ("smiley", "😃"),
    ("grin", "😁"),
    ("grinning", "😀"),
    ("joy", "😂"),
    ("rofl", "🤣"),
    ("slight_smile", "🙂"),
    ("wink", "😉"),
    ("blush", "😊"),
    ("heart_eyes", "😍"),
    ("thinking", "🤔"),
    ("neutral_face", "😐"),
    ("expressionless", "😑"),
    ("unamused", "😒"),
    ("sweat_smile", "😅"),
    ("cry", "😢"),
    ("sob", "😭"),
    ("rage", "😡"),
    ("scream", "😱"),
    ("skull", "💀"),
    ("ghost", "👻"),
    ("clown", "🤡"),
    ("heart", "❤️"),
    ("broken_heart", "💔"),
    ("fire", "🔥"),
    ("sparkles", "✨"),
    ("star", "⭐"),
    ("zap", "⚡"),
    ("boom", "💥"),
    ("tada", "🎉"),
    ("confetti_ball", "🎊"),
    ("thumbsup", "👍"),
    ("+1", "👍"),
    ("thumbsdown", "👎"),
    ("-1", "👎"),
    ("clap", "👏"),
    ("wave", "👋"),
    ("ok_hand", "👌"),
    ("pray", "🙏"),
    ("muscle", "💪"),
    ("eyes", "👀"),
    ("brain", "🧠"),
    ("rocket", "🚀"),
    ("hourglass", "⌛"),
    ("warning", "⚠️"),
    ("question", "❓"),
    ("exclamation", "❗"),
    ("check", "✔️"),
    ("white_check_mark", "✅"),
    ("x", "❌"),
    ("100", "💯"),
];

pub(crate) fn lookup(name: &str) -> Option<&'static str> {
    EMOJI_SHORTCODES
        .iter()
        .find(|(code, _)| *code == name)
        .map(|(_, emoji)| *emoji)
}
