//! String utilities shared by the scraping plugins.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x?[0-9a-fA-F]+);").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Trim `text` to at most `max` characters, cutting back to a word boundary
/// and appending an ellipsis when something was dropped.
pub fn trim_to_length(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }

    let keep = max.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    let cut = match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &truncated[..pos],
        _ => truncated.as_str(),
    };
    format!("{}...", cut.trim_end())
}

/// Decode the HTML entities that show up in scraped markup. Named entities
/// cover the common set; numeric references are decoded in full.
pub fn decode_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let body = &caps[1];
        let parsed = match body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => body.parse(),
        };
        parsed
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Strip HTML tags and collapse runs of whitespace.
pub fn strip_tags(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(trim_to_length("a short plot", 500), "a short plot");
    }

    #[test]
    fn long_text_is_cut_at_a_word_boundary() {
        let trimmed = trim_to_length("one two three four five six", 17);
        assert_eq!(trimmed, "one two three...");
        assert!(trimmed.chars().count() <= 17);
    }

    #[test]
    fn named_entities_decode() {
        assert_eq!(
            decode_entities("Fast &amp; Furious &quot;9&quot;"),
            "Fast & Furious \"9\""
        );
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(decode_entities("caf&#233;"), "café");
        assert_eq!(decode_entities("caf&#xE9;"), "café");
    }

    #[test]
    fn unknown_numeric_entities_are_left_alone() {
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
    }

    #[test]
    fn tags_are_stripped_and_whitespace_collapsed() {
        assert_eq!(
            strip_tags("<p>A  plot\nwith <b>markup</b>.</p>"),
            "A plot with markup."
        );
    }
}
