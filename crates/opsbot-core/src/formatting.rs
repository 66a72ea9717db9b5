/// Hard cap for a single outgoing reply (messenger message limit headroom).
pub const REPLY_LIMIT: usize = 4000;

const REPLY_KEEP: usize = 3997;

/// Cap a reply at [`REPLY_LIMIT`] chars, with a visible `...` marker when cut.
pub fn truncate_reply(s: &str) -> String {
    if s.chars().count() <= REPLY_LIMIT {
        return s.to_string();
    }
    let mut out: String = s.chars().take(REPLY_KEEP).collect();
    out.push_str("...");
    out
}

/// Plain char-count clip, used to bound error detail text.
pub fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `1. a\n2. b\n...` list used for findings and stored contacts.
pub fn format_numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_reply_caps_at_limit_with_marker() {
        let long = "x".repeat(REPLY_LIMIT + 500);
        let out = truncate_reply(&long);
        assert_eq!(out.chars().count(), REPLY_LIMIT);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncate_reply_leaves_short_text_alone() {
        assert_eq!(truncate_reply("uptime: 3 days"), "uptime: 3 days");
    }

    #[test]
    fn clip_is_char_based() {
        assert_eq!(clip("привет", 3), "при");
    }

    #[test]
    fn numbered_list_format() {
        let items = vec!["a@b.ru".to_string(), "c@d.ru".to_string()];
        assert_eq!(format_numbered(&items), "1. a@b.ru\n2. c@d.ru");
    }
}
