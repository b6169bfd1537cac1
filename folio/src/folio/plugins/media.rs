use std::ops::Range;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::folio::markup;
use crate::folio::types::{LeadingMedia, PostDocument};

use super::traits::Transformer;

static FIGURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<figure\b[^>]*>.*?</figure\s*>").expect("figure regex"));

static MEDIA_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<img\b[^>]*>|<picture\b[^>]*>.*?</picture\s*>|<iframe\b[^>]*>(?:.*?</iframe\s*>)?|<video\b[^>]*>(?:.*?</video\s*>)?",
    )
    .expect("media tag regex")
});

static HAS_MEDIA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?:img|picture|iframe|video)\b").expect("has media regex"));

static PARAGRAPH_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p\b[^>]*>\s*$").expect("paragraph open regex"));

static PARAGRAPH_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*</p\s*>").expect("paragraph close regex"));

/// Hoist the first image, video, iframe or media `<figure>` out of the body.
///
/// A figure and a bare element starting at the same offset resolve to the
/// figure. A bare element that was the only thing in its paragraph takes the
/// emptied paragraph with it. With no media the content comes back unchanged.
pub fn extract_leading_media(html: &str) -> LeadingMedia {
    let figure = FIGURE_RE
        .find_iter(html)
        .find(|m| HAS_MEDIA_RE.is_match(m.as_str()))
        .map(|m| m.range());
    let bare = MEDIA_TAG_RE.find(html).map(|m| m.range());

    let (media, removed) = match (figure, bare) {
        (Some(fig), Some(tag)) if tag.start < fig.start => (tag.clone(), enclosing_paragraph(html, tag)),
        (Some(fig), _) => (fig.clone(), fig),
        (None, Some(tag)) => (tag.clone(), enclosing_paragraph(html, tag)),
        (None, None) => {
            return LeadingMedia {
                media_html: None,
                content_html: html.to_string(),
            };
        }
    };

    let mut content = String::with_capacity(html.len() - removed.len());
    content.push_str(&html[..removed.start]);
    content.push_str(&html[removed.end..]);

    LeadingMedia {
        media_html: Some(html[media].to_string()),
        content_html: content,
    }
}

/// Widen `tag` to its `<p>...</p>` when the paragraph holds nothing else.
fn enclosing_paragraph(html: &str, tag: Range<usize>) -> Range<usize> {
    let before = &html[..tag.start];
    let after = &html[tag.end..];

    let open = PARAGRAPH_OPEN_RE.find(before);
    let close = PARAGRAPH_CLOSE_RE.find(after);

    match (open, close) {
        (Some(open), Some(close)) => open.start()..tag.end + close.end(),
        _ => tag,
    }
}

/// `src` of the first media element in a fragment, for social previews.
pub fn media_src(fragment: &str) -> Option<String> {
    let tag = MEDIA_TAG_RE.find(fragment)?.as_str();
    let end = tag.find('>').unwrap_or(tag.len());
    markup::attr_value(&tag[..end], "src")
}

/// Lifts the first media element out of the body unless the post already
/// has a featured image to lead with.
pub struct LeadingMediaExtractor;

impl Transformer for LeadingMediaExtractor {
    fn transform(&self, mut doc: PostDocument) -> Result<PostDocument> {
        let has_featured = doc
            .post
            .featured_image
            .as_deref()
            .is_some_and(|src| !src.trim().is_empty());
        if has_featured {
            return Ok(doc);
        }

        let LeadingMedia {
            media_html,
            content_html,
        } = extract_leading_media(&doc.html);
        doc.leading_media = media_html;
        doc.html = content_html;
        Ok(doc)
    }
}
