//! WordPress REST client. Fetches one post by slug, with embedded featured
//! media and author, and maps it onto [`Post`].

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::folio::config::CmsConfig;
use crate::folio::types::{Post, SeoOverrides};

#[derive(Debug, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Deserialize)]
pub struct WpPost {
    pub slug: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub modified_gmt: Option<String>,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    /// An object when the post has registered meta, `[]` otherwise.
    #[serde(default)]
    pub meta: Value,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<WpEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WpEmbedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<WpMedia>,
    #[serde(default)]
    pub author: Vec<WpAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct WpMedia {
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WpAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

pub struct WordPressClient {
    http: reqwest::Client,
    api_base: String,
}

impl WordPressClient {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("building cms http client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn posts_url(&self, slug: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/wp-json/wp/v2/posts", self.api_base))
            .with_context(|| format!("invalid cms api base {}", self.api_base))?;
        url.query_pairs_mut()
            .append_pair("slug", slug)
            .append_key_only("_embed");
        Ok(url)
    }

    /// Fetch a post by slug. `Ok(None)` means the CMS knows no such post.
    pub async fn fetch_post(&self, slug: &str) -> Result<Option<Post>> {
        let url = self.posts_url(slug)?;
        debug!("fetching {url}");

        let posts: Vec<WpPost> = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting post {slug}"))?
            .error_for_status()
            .with_context(|| format!("cms rejected post {slug}"))?
            .json()
            .await
            .with_context(|| format!("decoding post {slug}"))?;

        Ok(posts.into_iter().next().map(post_from_wp))
    }
}

pub fn post_from_wp(wp: WpPost) -> Post {
    let embedded = wp.embedded.unwrap_or_default();
    let featured_image = embedded
        .featured_media
        .into_iter()
        .find_map(|m| m.source_url)
        .filter(|src| !src.trim().is_empty());
    let author = embedded.author.into_iter().find_map(|a| a.name);

    let meta_str = |key: &str| {
        wp.meta
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let seo = SeoOverrides {
        title: meta_str("seo_title"),
        description: meta_str("seo_description"),
        canonical_url: meta_str("canonical_url"),
        og_image: meta_str("og_image"),
        noindex: meta_flag(wp.meta.get("noindex")),
    };

    let products = match wp.meta.get("category_products") {
        Some(Value::String(raw)) => Some(raw.clone()),
        Some(value @ Value::Array(_)) => Some(value.to_string()),
        _ => None,
    };

    Post {
        slug: wp.slug,
        title: wp.title.rendered,
        html: wp.content.rendered,
        excerpt: wp.excerpt.rendered,
        status: wp.status.unwrap_or_else(|| "publish".into()),
        published: wp.date_gmt.as_deref().and_then(parse_wp_date),
        modified: wp.modified_gmt.as_deref().and_then(parse_wp_date),
        author,
        featured_image,
        seo,
        products,
    }
}

/// WordPress `*_gmt` fields carry no offset.
fn parse_wp_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            warn!("unparseable cms date {raw:?}: {err}");
            None
        }
    }
}

fn meta_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "yes"),
        _ => false,
    }
}
