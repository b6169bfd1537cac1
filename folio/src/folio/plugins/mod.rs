pub mod embeds;
pub mod entities;
pub mod faq;
pub mod media;
pub mod sections;
pub mod text;
pub mod toc;
pub mod traits;

use anyhow::Result;
use log::debug;

use crate::folio::config::ContentConfig;
use crate::folio::types::{Post, PostDocument};

use self::embeds::EmbedNormalizer;
use self::faq::{FaqSchema, FaqSectionWrapper};
use self::media::LeadingMediaExtractor;
use self::sections::SectionSplitter;
use self::toc::TableOfContents;
use self::traits::{Filter, Transformer};

pub struct PluginRegistry {
    transformers: Vec<Box<dyn Transformer>>,
    filters: Vec<Box<dyn Filter>>,
}

impl PluginRegistry {
    pub fn post_pipeline(content: &ContentConfig) -> Self {
        Self {
            transformers: vec![
                Box::new(EmbedNormalizer::new(content.embed_title.clone())),
                Box::new(FaqSchema),
                Box::new(FaqSectionWrapper),
                Box::new(TableOfContents),
                Box::new(LeadingMediaExtractor),
                Box::new(SectionSplitter::new(content.max_promo_inserts)),
            ],
            filters: vec![],
        }
    }

    pub fn with_filters(mut self, filters: Vec<Box<dyn Filter>>) -> Self {
        self.filters = filters;
        self
    }

    /// Run every transformer in order. Returns `Ok(None)` when a filter
    /// excludes the post.
    pub fn transform(&self, post: Post) -> Result<Option<PostDocument>> {
        if !self.allow(&post) {
            debug!("post {} excluded by filters", post.slug);
            return Ok(None);
        }

        let mut doc = PostDocument::new(post);
        for transformer in &self.transformers {
            doc = transformer.transform(doc)?;
        }

        Ok(Some(doc))
    }

    pub fn allow(&self, post: &Post) -> bool {
        self.filters.iter().all(|f| f.include(post))
    }
}

/// Only published posts are rendered.
pub struct PublishedFilter;

impl Filter for PublishedFilter {
    fn include(&self, post: &Post) -> bool {
        post.status.eq_ignore_ascii_case("publish")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PluginRegistry {
        let content = ContentConfig {
            max_promo_inserts: 2,
            embed_title: "Video".into(),
        };
        PluginRegistry::post_pipeline(&content).with_filters(vec![Box::new(PublishedFilter)])
    }

    #[test]
    fn drafts_are_filtered_out() {
        let mut post = Post::new("draft", "Draft", "<p>wip</p>");
        post.status = "draft".into();
        assert!(registry().transform(post).unwrap().is_none());
    }

    #[test]
    fn runs_every_stage() {
        let html = "<p>https://youtu.be/dQw4w9WgXcQ</p>\
            <h2>Intro</h2><p>a</p>\
            <h2>FAQ</h2><h3>One?</h3><p>Yes one.</p><h3>Two?</h3><p>Yes two.</p>\
            <h2>End</h2><p>bye</p>";
        let mut post = Post::new("p", "P", html);
        post.products = Some(r#"[{"name":"Kit","link":"/kit"}]"#.into());

        let doc = registry().transform(post).unwrap().unwrap();

        assert_eq!(doc.faq.as_ref().map(|f| f.main_entity.len()), Some(2));
        let ids: Vec<&str> = doc.toc.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "faq", "end"]);
        let lead = doc.leading_media.as_deref().unwrap();
        assert!(lead.contains("youtube.com/embed/dQw4w9WgXcQ"));
        assert!(lead.contains(r#"title="Video""#));
        assert!(doc.html.contains(r#"<section class="faq-section"><h2 id="faq">FAQ</h2>"#));
        assert!(!doc.html.contains("video-embed"));
        assert_eq!(doc.products.len(), 1);
        assert_eq!(doc.sections.iter().filter(|s| s.insert_after).count(), 1);
        let joined: String = doc.sections.iter().map(|s| s.html.as_str()).collect();
        assert_eq!(joined, doc.html);
    }

    #[test]
    fn featured_image_keeps_media_in_body() {
        let mut post = Post::new("p", "P", "<p><img src=\"a.png\"></p><p>text</p>");
        post.featured_image = Some("https://cdn.example/hero.png".into());
        let doc = registry().transform(post).unwrap().unwrap();
        assert!(doc.leading_media.is_none());
        assert!(doc.html.contains("a.png"));
    }
}
