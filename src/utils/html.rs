use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive,
/// dangerous tags (like <script>, <iframe>) and attributes (like onclick)
/// are stripped. Applied to every client-supplied HTML field (raw question
/// content, gap markup, cloze choice text) before it is persisted, as a
/// fail-safe against stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = clean_html("hello <script>alert(1)</script>world");
        assert!(!cleaned.contains("script"));
        assert!(cleaned.contains("hello"));
    }

    #[test]
    fn keeps_safe_markup() {
        assert_eq!(clean_html("<b>bold</b>"), "<b>bold</b>");
    }
}
