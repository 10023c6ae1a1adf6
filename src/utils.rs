use std::borrow::Cow;

pub fn truncate_str(s: &str, len: usize) -> Cow<'_, str> {
    if s.chars().count() > len {
        let owned = s
            .chars()
            .take(len.saturating_sub(3))
            .chain("...".chars())
            .collect();
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(s)
    }
}

/// Trims whitespace and a single trailing slash so `https://youtube.com/@foo/` and
/// `https://youtube.com/@foo` compare equal
pub fn normalize_channel_input(value: &str) -> &str {
    let text = value.trim();
    text.strip_suffix('/').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("abcdefghij", 8), "abcde...");
        // Multi-byte chars shouldn't split
        assert_eq!(truncate_str("ééééééé", 5), "éé...");
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_channel_input("  @handle  "), "@handle");
        assert_eq!(
            normalize_channel_input("https://www.youtube.com/@handle/"),
            "https://www.youtube.com/@handle"
        );
        // Only a single slash gets stripped
        assert_eq!(normalize_channel_input("foo//"), "foo/");
        assert_eq!(normalize_channel_input(" / "), "");
    }
}
