use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use crate::folio::types::PostDocument;

use super::entities::{decode_entities, escape_attr, escape_text};
use super::text::inline_text;
use super::traits::Transformer;

pub const DEFAULT_EMBED_TITLE: &str = "YouTube video player";

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id regex"));

static OEMBED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<figure\b[^>]*>\s*<oembed\b[^>]*?\burl\s*=\s*["'](?P<wrapped>[^"']+)["'][^>]*>(?:\s*</oembed>)?\s*(?:<figcaption\b[^>]*>(?P<caption>.*?)</figcaption>\s*)?</figure>|<oembed\b[^>]*?\burl\s*=\s*["'](?P<bare>[^"']+)["'][^>]*>(?:\s*</oembed>)?"#,
    )
    .expect("oembed regex")
});

static BLOCK_WRAPPER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<figure\b[^>]*>\s*<div\b[^>]*\bclass\s*=\s*["'][^"']*__wrapper[^"']*["'][^>]*>\s*(?P<wrapped>https?://[^\s<"']+)\s*</div>\s*(?:<figcaption\b[^>]*>(?P<caption>.*?)</figcaption>\s*)?</figure>|<div\b[^>]*\bclass\s*=\s*["'][^"']*__wrapper[^"']*["'][^>]*>\s*(?P<bare>https?://[^\s<"']+)\s*</div>"#,
    )
    .expect("block embed regex")
});

static BARE_URL_PARAGRAPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<p\b[^>]*>\s*(?P<url>https?://[^\s<"']+)\s*</p>"#).expect("bare url regex")
});

static ANCHOR_PARAGRAPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<p\b[^>]*>\s*<a\b[^>]*?\bhref\s*=\s*["'](?P<url>[^"']+)["'][^>]*>[^<]*</a>\s*</p>"#,
    )
    .expect("anchor paragraph regex")
});

static SHORTCODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<p\b[^>]*>\s*\[embed\]\s*(?P<url>[^\[<]*?)\s*\[/embed\]\s*</p>"#)
        .expect("embed shortcode regex")
});

/// Extract a YouTube video id from short-link, watch, embed and shorts URLs,
/// falling back to a `v` query parameter.
pub fn extract_video_id(raw_url: &str) -> Option<String> {
    let decoded = decode_entities(raw_url.trim());
    let url = Url::parse(&decoded).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host.as_str());

    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let from_path = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            match (segments.next(), segments.next()) {
                (Some("embed" | "shorts" | "live" | "v"), Some(id)) => Some(id.to_string()),
                _ => None,
            }
        }
        _ => return None,
    };

    from_path
        .filter(|id| VIDEO_ID_RE.is_match(id))
        .or_else(|| {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
                .filter(|id| VIDEO_ID_RE.is_match(id))
        })
}

/// The one markup shape every recognised embed is rewritten into.
pub fn embed_markup(video_id: &str, title: &str, caption: Option<&str>) -> String {
    let caption_html = caption
        .map(|c| format!(r#"<figcaption class="video-embed__caption">{}</figcaption>"#, escape_text(c)))
        .unwrap_or_default();

    format!(
        r#"<figure class="video-embed"><div class="video-embed__frame aspect-video"><iframe class="video-embed__iframe" src="https://www.youtube.com/embed/{id}" title="{title}" loading="lazy" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share" referrerpolicy="strict-origin-when-cross-origin" allowfullscreen></iframe></div>{caption_html}</figure>"#,
        id = escape_attr(video_id),
        title = escape_attr(title),
    )
}

/// Rewrite legacy video embeds into [`embed_markup`] with the default title.
pub fn normalize_embeds(html: &str) -> String {
    normalize_embeds_with_title(html, DEFAULT_EMBED_TITLE)
}

/// Rewrite, in order: `<oembed>` tags, block-embed `__wrapper` divs, bare-URL
/// paragraphs, anchor-only paragraphs and `[embed]` shortcodes. A match whose
/// URL yields no video id is left exactly as it was.
pub fn normalize_embeds_with_title(html: &str, default_title: &str) -> String {
    let passes: [&Lazy<Regex>; 5] = [
        &OEMBED_RE,
        &BLOCK_WRAPPER_RE,
        &BARE_URL_PARAGRAPH_RE,
        &ANCHOR_PARAGRAPH_RE,
        &SHORTCODE_RE,
    ];

    passes.iter().fold(html.to_string(), |doc, re| {
        if !re.is_match(&doc) {
            return doc;
        }
        re.replace_all(&doc, |caps: &Captures| rewrite_match(caps, default_title))
            .into_owned()
    })
}

fn rewrite_match(caps: &Captures, default_title: &str) -> String {
    let original = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

    let url = ["wrapped", "bare", "url"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str());

    let Some(video_id) = url.and_then(extract_video_id) else {
        return original.to_string();
    };

    let caption = caps
        .name("caption")
        .map(|m| inline_text(m.as_str()))
        .filter(|c| !c.is_empty());
    let title = caption.as_deref().unwrap_or(default_title);

    embed_markup(&video_id, title, caption.as_deref())
}

pub struct EmbedNormalizer {
    title: String,
}

impl EmbedNormalizer {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_EMBED_TITLE.to_string()
        } else {
            title
        };
        Self { title }
    }
}

impl Transformer for EmbedNormalizer {
    fn transform(&self, mut doc: PostDocument) -> Result<PostDocument> {
        doc.html = normalize_embeds_with_title(&doc.html, &self.title);
        Ok(doc)
    }
}
