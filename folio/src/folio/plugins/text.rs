use once_cell::sync::Lazy;
use regex::Regex;

use super::entities::decode_entities;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br regex"));

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|section|article|blockquote|table|thead|tbody|tfoot|tr|td|th|caption)\b[^>]*>",
    )
    .expect("block regex")
});

static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("list item regex"));

static LIST_ITEM_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</li\s*>").expect("list item close regex"));

static LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:ul|ol)\b[^>]*>").expect("list regex"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// UTF-8 em dash, en dash and horizontal bar read back as Windows-1252 or
/// Latin-1, the latter being what `&#226;&#128;&#148;` style references give.
const MOJIBAKE_DASHES: [&str; 6] = [
    "â€”",
    "â€“",
    "â€•",
    "â\u{80}\u{94}",
    "â\u{80}\u{93}",
    "â\u{80}\u{95}",
];

/// Remove every `<...>` tag and trim. Entities are left for [`decode_entities`].
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").trim().to_string()
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Visible text of a fragment on one line: stripped, decoded and collapsed.
pub fn inline_text(html: &str) -> String {
    collapse_whitespace(&decode_entities(&strip_tags(html)))
}

/// Convert block-level markup to newline-delimited text, dropping divider lines.
pub fn to_plain_text(html: &str) -> String {
    let text = BREAK_RE.replace_all(html, "\n");
    let text = BLOCK_RE.replace_all(&text, "\n");
    let text = LIST_ITEM_RE.replace_all(&text, "\n- ");
    let text = LIST_ITEM_CLOSE_RE.replace_all(&text, "");
    let text = LIST_RE.replace_all(&text, "\n");

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| collapse_whitespace(&decode_entities(&strip_tags(line))))
        .filter(|line| !line.is_empty())
        .filter(|line| !is_separator_line(line))
        .collect();

    lines.join("\n").trim().to_string()
}

/// A line made only of divider glyphs: two or more dashes, underscores or
/// asterisks, a lone en/em dash, or mis-encoded dash sequences.
pub fn is_separator_line(line: &str) -> bool {
    let mut rest = line.trim();
    if rest.is_empty() {
        return false;
    }

    let mut glyphs = 0usize;
    let mut lone_long_dash = false;

    while !rest.is_empty() {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if let Some(bad) = MOJIBAKE_DASHES.iter().find(|m| rest.starts_with(**m)) {
            glyphs += 2;
            rest = &rest[bad.len()..];
            continue;
        }

        let mut chars = rest.chars();
        let Some(c) = chars.next() else {
            break;
        };
        match c {
            '-' | '‐' | '‑' | '‒' | '―' | '_' | '*' => {}
            '–' | '—' => lone_long_dash = true,
            _ => return false,
        }
        glyphs += 1;
        rest = chars.as_str();
    }

    glyphs >= 2 || (glyphs == 1 && lone_long_dash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_trims() {
        assert_eq!(strip_tags("  <p>Hello <b>world</b></p>\n"), "Hello world");
        assert_eq!(strip_tags("a < b"), "a < b");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn stripping_keeps_entities_encoded() {
        assert_eq!(strip_tags("<em>Tom &amp; Jerry</em>"), "Tom &amp; Jerry");
    }

    #[test]
    fn drops_dash_only_lines() {
        assert_eq!(
            to_plain_text("<p>First line.</p>&#8212;<p>Second line.</p>"),
            "First line.\nSecond line."
        );
    }

    #[test]
    fn converts_lists_and_breaks() {
        let html = "<p>Options:<br>pick one</p><ul><li>Red</li><li>Blue</li></ul>";
        assert_eq!(to_plain_text(html), "Options:\npick one\n- Red\n- Blue");
    }

    #[test]
    fn recognises_divider_variants() {
        assert!(is_separator_line("---"));
        assert!(is_separator_line("- - -"));
        assert!(is_separator_line("____"));
        assert!(is_separator_line("***"));
        assert!(is_separator_line("—"));
        assert!(is_separator_line("–"));
        assert!(is_separator_line("â€”"));
        assert!(is_separator_line("——"));
    }

    #[test]
    fn keeps_text_lines() {
        assert!(!is_separator_line("-"));
        assert!(!is_separator_line("— quoted"));
        assert!(!is_separator_line("*Note*"));
        assert!(!is_separator_line(""));
    }

    #[test]
    fn table_cells_become_lines() {
        let html = "<table><tr><td>Plan</td><td>Price</td></tr><tr><td>------</td><td>-----</td></tr></table>";
        assert_eq!(to_plain_text(html), "Plan\nPrice");
    }

    #[test]
    fn collapses_whitespace_within_lines() {
        assert_eq!(
            to_plain_text("<p>Yes,\t  within   30 days.</p><p>  Two\u{a0} spaces </p>"),
            "Yes, within 30 days.\nTwo spaces"
        );
    }

    #[test]
    fn drops_entity_encoded_mojibake_dashes() {
        assert_eq!(to_plain_text("<p>a</p>&#226;&#128;&#148;<p>b</p>"), "a\nb");
        assert_eq!(to_plain_text("<p>a</p>&acirc;&#128;&#147;<p>b</p>"), "a\nb");
        assert_eq!(to_plain_text("<p>a</p>&#226;&#8364;&#8221;<p>b</p>"), "a\nb");
        assert!(is_separator_line("â\u{80}\u{94}"));
    }
}
