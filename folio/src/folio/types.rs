use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::folio::jsonld::FaqPage;
use crate::folio::promos::{BodyBlock, Product};
use crate::folio::seo::PageSeo;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TocItem {
    pub id: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TocResult {
    pub toc: Vec<TocItem>,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LeadingMedia {
    pub media_html: Option<String>,
    pub content_html: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ContentSection {
    pub html: String,
    pub insert_after: bool,
}

/// Per-post SEO fields editors can set in the CMS.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeoOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default)]
    pub noindex: bool,
}

/// A post as handed over by the content source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    /// Raw CMS body. Treated as untrusted markup by the rewriters, yet the
    /// result is injected unescaped into the page.
    pub html: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub seo: SeoOverrides,
    /// JSON array of `{name, price, image, link}` promo products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<String>,
}

fn default_status() -> String {
    "publish".into()
}

impl Post {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            html: html.into(),
            status: default_status(),
            ..Self::default()
        }
    }
}

/// Working state threaded through the transformer pipeline.
#[derive(Clone, Debug)]
pub struct PostDocument {
    pub post: Post,
    /// Body as rewritten so far; `post.html` keeps the source.
    pub html: String,
    pub toc: Vec<TocItem>,
    pub faq: Option<FaqPage>,
    pub leading_media: Option<String>,
    pub products: Vec<Product>,
    pub sections: Vec<ContentSection>,
}

impl PostDocument {
    pub fn new(post: Post) -> Self {
        let html = post.html.clone();
        Self {
            post,
            html,
            toc: Vec::new(),
            faq: None,
            leading_media: None,
            products: Vec::new(),
            sections: Vec::new(),
        }
    }
}

/// Everything the page template needs for one post.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedPost {
    pub slug: String,
    pub title: String,
    pub seo: PageSeo,
    /// Ready-to-inject `<script type="application/ld+json">` blocks.
    pub json_ld: Vec<String>,
    pub toc: Vec<TocItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq: Option<FaqPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_media: Option<String>,
    pub sections: Vec<ContentSection>,
    pub blocks: Vec<BodyBlock>,
    pub html: String,
}
