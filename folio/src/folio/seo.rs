use serde::Serialize;

use crate::folio::config::SiteSettings;
use crate::folio::jsonld::{BlogPosting, Person, SCHEMA_CONTEXT};
use crate::folio::plugins::entities::decode_entities;
use crate::folio::plugins::text::inline_text;
use crate::folio::types::Post;

pub const DESCRIPTION_LIMIT: usize = 160;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PageSeo {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    pub robots: &'static str,
}

/// Merge the post's CMS overrides with values derived from its content.
pub fn page_seo(post: &Post, site: &SiteSettings, lead_image: Option<&str>) -> PageSeo {
    let overrides = &post.seo;

    let title = non_empty(overrides.title.as_deref())
        .map(decode_entities)
        .unwrap_or_else(|| {
            let post_title = inline_text(&post.title);
            if post_title.is_empty() {
                site.name.clone()
            } else {
                format!("{post_title} | {}", site.name)
            }
        });

    let description = non_empty(overrides.description.as_deref())
        .map(decode_entities)
        .unwrap_or_else(|| truncate_chars(&inline_text(&post.excerpt), DESCRIPTION_LIMIT));

    let canonical_url = non_empty(overrides.canonical_url.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| canonical_for(site, &post.slug));

    let og_image = non_empty(overrides.og_image.as_deref())
        .or_else(|| non_empty(post.featured_image.as_deref()))
        .or_else(|| non_empty(lead_image))
        .map(str::to_string);

    PageSeo {
        title,
        description,
        canonical_url,
        og_image,
        robots: if overrides.noindex {
            "noindex, nofollow"
        } else {
            "index, follow"
        },
    }
}

pub fn canonical_for(site: &SiteSettings, slug: &str) -> String {
    format!(
        "{}/blog/{}",
        site.base_url.trim_end_matches('/'),
        slug.trim_matches('/')
    )
}

pub fn blog_posting(post: &Post, seo: &PageSeo) -> BlogPosting {
    BlogPosting {
        context: SCHEMA_CONTEXT,
        kind: "BlogPosting",
        headline: inline_text(&post.title),
        description: Some(seo.description.clone()).filter(|d| !d.is_empty()),
        date_published: post.published.map(|d| d.to_rfc3339()),
        date_modified: post.modified.or(post.published).map(|d| d.to_rfc3339()),
        image: seo.og_image.clone(),
        main_entity_of_page: Some(seo.canonical_url.clone()),
        author: non_empty(post.author.as_deref()).map(Person::new),
    }
}

/// Cut `text` to at most `limit` characters, ending with an ellipsis on a
/// word boundary when something was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(1);
    let cut: String = text.chars().take(keep).collect();
    let at_boundary = text.chars().nth(keep).is_some_and(char::is_whitespace);
    let trimmed = match cut.rfind(' ') {
        Some(space) if !at_boundary && space > cut.len() / 2 => &cut[..space],
        _ => cut.as_str(),
    };
    format!(
        "{}…",
        trimmed.trim_end_matches(|c: char| matches!(c, ' ' | ',' | ';' | ':' | '.'))
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
