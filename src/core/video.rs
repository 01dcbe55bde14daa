use regex::Regex;
use std::sync::OnceLock;

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(?:www\.)?youtu(?:\.be/|be\.com/(?:embed/|watch\?v=))([A-Za-z0-9_-]+)")
            .expect("hardcoded pattern")
    })
}

fn bare_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("hardcoded pattern"))
}

/// Extract a canonical video id from a share URL or a bare id
///
/// Accepts `youtu.be/<id>`, `youtube.com/watch?v=<id>` and
/// `youtube.com/embed/<id>` forms with optional scheme and `www.`, or a
/// string that is already an id. Returns `None` for anything else.
pub fn parse_video_id(input: &str) -> Option<String> {
    if let Some(captures) = url_pattern().captures(input) {
        return Some(captures[1].to_string());
    }

    if bare_id_pattern().is_match(input) {
        return Some(input.to_string());
    }

    None
}
