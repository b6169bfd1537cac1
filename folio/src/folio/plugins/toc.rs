use std::collections::{HashMap, HashSet};

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::folio::markup::{self, Heading};
use crate::folio::types::{PostDocument, TocItem, TocResult};

use super::entities::escape_attr;
use super::text::inline_text;
use super::traits::Transformer;

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug regex"));

/// Fragment-safe slug: lower-case ASCII alphanumerics joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '‘' | '’' | '“' | '”' | '„' | '«' | '»'))
        .collect();
    let slug = NON_ALNUM_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}

/// Tracks ids handed out while walking one document.
struct IdAllocator {
    /// Ids authors wrote on headings, claimed before any slug is generated.
    reserved: HashSet<String>,
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl IdAllocator {
    fn new(reserved: HashSet<String>) -> Self {
        Self {
            reserved,
            used: HashSet::new(),
            next_suffix: HashMap::new(),
        }
    }

    /// First use of `base` keeps it; later ones get `-2`, `-3`, ... A heading's
    /// own authored id is not a collision for itself.
    fn allocate(&mut self, base: &str, authored: bool) -> String {
        let taken = |this: &Self, candidate: &str| {
            this.used.contains(candidate) || (!authored && this.reserved.contains(candidate))
        };

        let id = if taken(self, base) {
            let mut n = self.next_suffix.get(base).copied().unwrap_or(2);
            let mut candidate = format!("{base}-{n}");
            while taken(self, &candidate) {
                n += 1;
                candidate = format!("{base}-{n}");
            }
            self.next_suffix.insert(base.to_string(), n + 1);
            candidate
        } else {
            base.to_string()
        };

        self.used.insert(id.clone());
        id
    }
}

/// Give every non-empty level-2 heading a unique id and list them in order.
///
/// Authored ids are kept verbatim unless an earlier heading already claimed
/// the same id. Generated slugs never collide with an authored id anywhere in
/// the document.
pub fn build_toc(html: &str) -> TocResult {
    // (heading, text, id as written, id trimmed)
    let headings: Vec<(Heading, String, Option<String>, Option<String>)> =
        markup::headings(html, &[2])
            .into_iter()
            .map(|h| {
                let text = inline_text(h.inner(html));
                let raw = markup::attr_value(h.attrs(html), "id");
                let authored = raw
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
                (h, text, raw, authored)
            })
            .filter(|(_, text, _, _)| !text.is_empty())
            .collect();

    let reserved = headings
        .iter()
        .filter_map(|(_, _, _, authored)| authored.clone())
        .collect();
    let mut ids = IdAllocator::new(reserved);

    let mut toc = Vec::with_capacity(headings.len());
    let mut content = String::with_capacity(html.len() + headings.len() * 16);
    let mut cursor = 0;

    for (heading, text, raw, authored) in headings {
        let id = match &authored {
            Some(existing) => ids.allocate(existing, true),
            None => ids.allocate(&slugify(&text), false),
        };

        // Padded ids are rewritten too, so the anchor matches the toc entry.
        if raw.as_deref() != Some(id.as_str()) {
            content.push_str(&html[cursor..heading.start]);
            content.push_str(&retag(html, &heading, &id));
            cursor = heading.open_end;
        }

        toc.push(TocItem { id, text });
    }

    content.push_str(&html[cursor..]);
    TocResult { toc, content }
}

/// Opening tag of `heading` carrying `id`, replacing any id it already had.
fn retag(html: &str, heading: &Heading, id: &str) -> String {
    let attrs = heading.attrs(html);
    let escaped = escape_attr(id);

    match markup::attr_span(attrs, "id") {
        Some(span) => {
            // Normalise the value to double quotes whatever quoting it had.
            let quote_start = attrs[..span.start]
                .rfind('=')
                .map(|eq| eq + 1)
                .unwrap_or(span.start);
            let quote_end = if attrs[span.end..].starts_with(&['"', '\''][..]) {
                span.end + 1
            } else {
                span.end
            };
            format!(
                "<h{}{}\"{}\"{}>",
                heading.level,
                &attrs[..quote_start],
                escaped,
                &attrs[quote_end..]
            )
        }
        None => format!("<h{} id=\"{}\"{}>", heading.level, escaped, attrs),
    }
}

pub struct TableOfContents;

impl Transformer for TableOfContents {
    fn transform(&self, mut doc: PostDocument) -> Result<PostDocument> {
        let TocResult { toc, content } = build_toc(&doc.html);
        doc.toc = toc;
        doc.html = content;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(result: &TocResult) -> Vec<&str> {
        result.toc.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn slugifies_heading_text() {
        assert_eq!(slugify("What's New in 2024?"), "whats-new-in-2024");
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
        assert_eq!(slugify("“Quoted” title"), "quoted-title");
        assert_eq!(slugify("???"), "section");
        assert_eq!(slugify(""), "section");
    }

    #[test]
    fn injects_ids_and_lists_headings() {
        let html = "<h2>Getting Started</h2><p>a</p><h2 class=\"x\">Next &amp; Last</h2>";
        let result = build_toc(html);
        assert_eq!(ids(&result), vec!["getting-started", "next-last"]);
        assert_eq!(result.toc[1].text, "Next & Last");
        assert_eq!(
            result.content,
            "<h2 id=\"getting-started\">Getting Started</h2><p>a</p><h2 id=\"next-last\" class=\"x\">Next &amp; Last</h2>"
        );
    }

    #[test]
    fn duplicate_text_gets_suffixes() {
        let html = "<h2>Tips</h2><h2>Tips</h2><h2>Tips</h2>";
        let result = build_toc(html);
        assert_eq!(ids(&result), vec!["tips", "tips-2", "tips-3"]);
    }

    #[test]
    fn keeps_authored_ids_untouched() {
        let html = "<h2 id='pricing'>Plans</h2><h2>Other</h2>";
        let result = build_toc(html);
        assert_eq!(ids(&result), vec!["pricing", "other"]);
        assert!(result.content.starts_with("<h2 id='pricing'>Plans</h2>"));
    }

    #[test]
    fn generated_slug_avoids_later_authored_id() {
        let html = "<h2>Pricing</h2><h2 id=\"pricing\">Plans</h2>";
        let result = build_toc(html);
        assert_eq!(ids(&result), vec!["pricing-2", "pricing"]);
        assert!(result.content.contains("<h2 id=\"pricing\">Plans</h2>"));
    }

    #[test]
    fn duplicate_authored_ids_are_rewritten() {
        let html = "<h2 id=\"faq\">One</h2><h2 id=faq data-x=\"1\">Two</h2>";
        let result = build_toc(html);
        assert_eq!(ids(&result), vec!["faq", "faq-2"]);
        assert!(result.content.ends_with("<h2 id=\"faq-2\" data-x=\"1\">Two</h2>"));
    }

    #[test]
    fn skips_empty_headings() {
        let html = "<h2><img src=\"x.png\"></h2><h2>&nbsp;</h2><h2>Real</h2>";
        let result = build_toc(html);
        assert_eq!(ids(&result), vec!["real"]);
        assert!(result.content.starts_with("<h2><img src=\"x.png\"></h2><h2>&nbsp;</h2>"));
    }

    #[test]
    fn ids_are_unique_across_mixed_sources() {
        let html = "<h2>A</h2><h2 id=\"a-2\">B</h2><h2>A</h2><h2>A</h2>";
        let result = build_toc(html);
        let found = ids(&result);
        let unique: HashSet<&str> = found.iter().copied().collect();
        assert_eq!(found.len(), 4);
        assert_eq!(unique.len(), 4);
        assert_eq!(found, vec!["a", "a-2", "a-3", "a-4"]);
    }

    #[test]
    fn empty_document() {
        let result = build_toc("");
        assert!(result.toc.is_empty());
        assert_eq!(result.content, "");
    }

    #[test]
    fn padded_authored_ids_are_trimmed_in_markup() {
        let result = build_toc("<h2 id=\" pricing \">Plans</h2><h2 id=\"  \">Blank</h2>");
        assert_eq!(ids(&result), vec!["pricing", "blank"]);
        assert_eq!(result.content, "<h2 id=\"pricing\">Plans</h2><h2 id=\"blank\">Blank</h2>");
    }
}
