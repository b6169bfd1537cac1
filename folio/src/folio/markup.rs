//! Tag scanning shared by the body rewriters.
//!
//! CMS markup is not guaranteed to be well formed, so nothing here builds a
//! tree. Every helper works on byte offsets into the original string, which
//! lets callers splice or slice the source without re-serializing it.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h([1-6])\b([^>]*)>").expect("heading open regex"));

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:^|\s)(?P<name>[a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'=<>`]+))"#,
    )
    .expect("attribute regex")
});

/// One `<hN>...</hN>` element located in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    /// Offset of the `<` that opens the heading.
    pub start: usize,
    /// Offset just past the `>` of the opening tag.
    pub open_end: usize,
    /// Offset of the `<` of the closing tag.
    pub close_start: usize,
    /// Offset just past the closing tag.
    pub end: usize,
    /// Span of the attribute text inside the opening tag.
    pub attrs: Range<usize>,
}

impl Heading {
    pub fn inner<'a>(&self, html: &'a str) -> &'a str {
        &html[self.open_end..self.close_start]
    }

    pub fn attrs<'a>(&self, html: &'a str) -> &'a str {
        &html[self.attrs.clone()]
    }

    pub fn outer<'a>(&self, html: &'a str) -> &'a str {
        &html[self.start..self.end]
    }
}

/// All headings whose level is in `levels`, in document order.
///
/// Headings never nest, so scanning resumes after each closing tag. A heading
/// without a matching close is skipped.
pub fn headings(html: &str, levels: &[u8]) -> Vec<Heading> {
    headings_in(html, 0..html.len(), levels)
}

/// Like [`headings`] but restricted to headings fully inside `range`.
pub fn headings_in(html: &str, range: Range<usize>, levels: &[u8]) -> Vec<Heading> {
    let lower = html.to_ascii_lowercase();
    let mut found = Vec::new();
    // Once a level has no closing tag after some offset, none exists further on.
    let mut unclosed = [false; 7];
    let mut pos = range.start;

    while pos < range.end {
        let Some(caps) = HEADING_OPEN_RE.captures_at(html, pos) else {
            break;
        };
        let (Some(open), Some(level), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };
        if open.end() > range.end {
            break;
        }

        let level: u8 = level.as_str().parse().unwrap_or(0);
        if !levels.contains(&level) {
            pos = open.end();
            continue;
        }

        let idx = usize::from(level);
        let close = if unclosed[idx] {
            None
        } else {
            find_close_tag(&lower, open.end(), &format!("</h{level}"))
        };

        match close {
            Some((close_start, end)) if end <= range.end => {
                found.push(Heading {
                    level,
                    start: open.start(),
                    open_end: open.end(),
                    close_start,
                    end,
                    attrs: attrs.range(),
                });
                pos = end;
            }
            Some(_) => break,
            None => {
                unclosed[idx] = true;
                pos = open.end();
            }
        }
    }

    found
}

/// Find `needle` (already lower-case, e.g. `</h2`) at or after `from` in the
/// lower-cased document and return the span up to and including its `>`.
pub fn find_close_tag(lower: &str, from: usize, needle: &str) -> Option<(usize, usize)> {
    let mut search = from;
    while let Some(rel) = lower.get(search..)?.find(needle) {
        let start = search + rel;
        let after = start + needle.len();
        // `</h2` must not match a longer name such as `</h2x`.
        match lower.as_bytes().get(after) {
            Some(b) if b.is_ascii_alphanumeric() => {
                search = after;
                continue;
            }
            _ => {}
        }
        let gt = lower[after..].find('>')?;
        return Some((start, after + gt + 1));
    }
    None
}

/// Value of attribute `name` (case-insensitive) from an opening tag's attribute text.
pub fn attr_value(attrs: &str, name: &str) -> Option<String> {
    attr_span(attrs, name).map(|span| attrs[span].to_string())
}

/// Byte span of the value of attribute `name` within `attrs`.
pub fn attr_span(attrs: &str, name: &str) -> Option<Range<usize>> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        let attr = caps.name("name")?;
        if !attr.as_str().eq_ignore_ascii_case(name) {
            return None;
        }
        caps.name("dq")
            .or_else(|| caps.name("sq"))
            .or_else(|| caps.name("bare"))
            .map(|m| m.range())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_headings_in_order() {
        let html = "<h1>Title</h1><p>x</p><H2 class=\"a\">One</H2><h3>Sub</h3><h2>Two</h2>";
        let found = headings(html, &[2]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].inner(html), "One");
        assert_eq!(found[0].attrs(html).trim(), "class=\"a\"");
        assert_eq!(found[1].outer(html), "<h2>Two</h2>");

        let all = headings(html, &[1, 2, 3]);
        let levels: Vec<u8> = all.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 2]);
    }

    #[test]
    fn skips_unclosed_headings() {
        let html = "<h2>Broken<p>text</p><h3>Fine</h3>";
        assert!(headings(html, &[2]).is_empty());
        assert_eq!(headings(html, &[2, 3]).len(), 1);
    }

    #[test]
    fn does_not_match_header_or_longer_names() {
        let html = "<header>Top</header><h2>Real</h2>";
        let found = headings(html, &[2]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner(html), "Real");
    }

    #[test]
    fn respects_range_bounds() {
        let html = "<h3>A</h3><h3>B</h3><h3>C</h3>";
        let found = headings_in(html, 10..20, &[3]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner(html), "B");
    }

    #[test]
    fn reads_attribute_values() {
        let attrs = r#" class="x" ID='intro' data-id=7"#;
        assert_eq!(attr_value(attrs, "id").as_deref(), Some("intro"));
        assert_eq!(attr_value(attrs, "data-id").as_deref(), Some("7"));
        assert_eq!(attr_value(attrs, "class").as_deref(), Some("x"));
        assert_eq!(attr_value(attrs, "href"), None);
        assert_eq!(attr_value("", "id"), None);
    }
}
