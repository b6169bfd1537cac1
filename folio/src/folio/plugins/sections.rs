use anyhow::Result;

use crate::folio::markup;
use crate::folio::promos;
use crate::folio::types::{ContentSection, PostDocument};

use super::traits::Transformer;

/// Cut the body after every second level-2 heading, at most `max_inserts`
/// times, flagging each cut as a promo insertion point.
///
/// Concatenating the returned `html` fields always reproduces `html`.
pub fn split_by_second_heading(html: &str, max_inserts: usize) -> Vec<ContentSection> {
    let mut sections = Vec::new();
    let mut cursor = 0;

    if max_inserts > 0 {
        for (i, heading) in markup::headings(html, &[2]).iter().enumerate() {
            if sections.len() >= max_inserts {
                break;
            }
            if (i + 1) % 2 == 0 {
                sections.push(ContentSection {
                    html: html[cursor..heading.end].to_string(),
                    insert_after: true,
                });
                cursor = heading.end;
            }
        }
    }

    let rest = &html[cursor..];
    if !rest.is_empty() {
        sections.push(ContentSection {
            html: rest.to_string(),
            insert_after: false,
        });
    }

    sections
}

pub struct SectionSplitter {
    max_inserts: usize,
}

impl SectionSplitter {
    pub fn new(max_inserts: usize) -> Self {
        Self { max_inserts }
    }
}

impl Transformer for SectionSplitter {
    fn transform(&self, mut doc: PostDocument) -> Result<PostDocument> {
        doc.products = promos::parse_products(doc.post.products.as_deref());
        let inserts = promos::insert_count(&doc.products, self.max_inserts);
        doc.sections = split_by_second_heading(&doc.html, inserts);
        Ok(doc)
    }
}
