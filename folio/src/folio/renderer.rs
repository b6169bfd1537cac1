use anyhow::{Context, Result};
use log::debug;

use crate::folio::config::SiteConfig;
use crate::folio::jsonld;
use crate::folio::plugins::media::media_src;
use crate::folio::plugins::{PluginRegistry, PublishedFilter};
use crate::folio::promos;
use crate::folio::seo;
use crate::folio::types::{Post, RenderedPost};

/// Turns CMS posts into everything a page template needs.
pub struct PostRenderer {
    pub config: SiteConfig,
    registry: PluginRegistry,
}

impl PostRenderer {
    pub fn new(config: SiteConfig) -> Self {
        let registry = PluginRegistry::post_pipeline(&config.content)
            .with_filters(vec![Box::new(PublishedFilter)]);
        Self { config, registry }
    }

    /// Render a post. Returns `Ok(None)` when the post is filtered out
    /// (e.g. it is not published).
    pub fn render(&self, post: Post) -> Result<Option<RenderedPost>> {
        let slug = post.slug.clone();
        let Some(doc) = self
            .registry
            .transform(post)
            .with_context(|| format!("transforming post {slug}"))?
        else {
            return Ok(None);
        };

        let lead_src = doc.leading_media.as_deref().and_then(media_src);
        let page_seo = seo::page_seo(&doc.post, &self.config.site, lead_src.as_deref());

        let mut json_ld = vec![jsonld::to_script_tag(&seo::blog_posting(&doc.post, &page_seo))?];
        if let Some(faq) = &doc.faq {
            json_ld.push(jsonld::to_script_tag(faq)?);
        }

        let blocks = promos::interleave(&doc.sections, &doc.products);
        debug!(
            "rendered {slug}: {} toc entries, {} blocks",
            doc.toc.len(),
            blocks.len()
        );

        Ok(Some(RenderedPost {
            slug: doc.post.slug.clone(),
            title: doc.post.title.clone(),
            seo: page_seo,
            json_ld,
            toc: doc.toc,
            faq: doc.faq,
            featured_image: doc.post.featured_image.clone(),
            leading_media: doc.leading_media,
            sections: doc.sections,
            blocks,
            html: doc.html,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folio::promos::BodyBlock;

    #[test]
    fn renders_seo_schema_and_blocks() {
        let mut config = SiteConfig::default();
        config.site.name = "Acme".into();
        config.site.base_url = "https://acme.example".into();
        let renderer = PostRenderer::new(config);

        let mut post = Post::new(
            "guide",
            "Guide",
            "<p><img src=\"/lead.png\" alt=\"\"></p><h2>A</h2><p>a</p><h2>B</h2><p>b</p>\
             <h2>FAQ</h2><h3>Why?</h3><p>Because.</p><h3>How?</h3><p>Like so.</p>",
        );
        post.products = Some(r#"[{"name":"Kit","link":"/kit"}]"#.into());

        let rendered = renderer.render(post).unwrap().unwrap();
        assert_eq!(rendered.seo.title, "Guide | Acme");
        assert_eq!(rendered.seo.canonical_url, "https://acme.example/blog/guide");
        assert_eq!(rendered.seo.og_image.as_deref(), Some("/lead.png"));
        assert_eq!(rendered.json_ld.len(), 2);
        assert!(rendered.json_ld[0].contains(r#""@type":"BlogPosting""#));
        assert!(rendered.json_ld[1].contains(r#""@type":"FAQPage""#));
        assert!(!rendered.html.contains("lead.png"));
        assert_eq!(
            rendered
                .blocks
                .iter()
                .filter(|b| matches!(b, BodyBlock::Promo(_)))
                .count(),
            1
        );
    }

    #[test]
    fn unpublished_posts_render_nothing() {
        let renderer = PostRenderer::new(SiteConfig::default());
        let mut post = Post::new("x", "X", "<p>x</p>");
        post.status = "private".into();
        assert!(renderer.render(post).unwrap().is_none());
    }
}
