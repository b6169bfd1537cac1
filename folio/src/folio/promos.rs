use log::warn;
use serde::{Deserialize, Serialize};

use crate::folio::types::ContentSection;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub link: String,
}

/// A body node the template walks: a slice of post markup or a promo card.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type", content = "value")]
pub enum BodyBlock {
    Html(String),
    Promo(Product),
}

/// Parse the JSON product list attached to a post's category.
///
/// Prices arrive as numbers or strings depending on the editor; both are kept
/// as text. Anything unparseable means no promos.
pub fn parse_products(raw: Option<&str>) -> Vec<Product> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(err) => {
            warn!("ignoring malformed category products: {err}");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| {
            let field = |key: &str| match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            Some(Product {
                name: field("name")?,
                price: field("price"),
                image: field("image"),
                link: field("link")?,
            })
        })
        .collect()
}

/// How many promo slots to ask the splitter for.
pub fn insert_count(products: &[Product], max_inserts: usize) -> usize {
    products.len().min(max_inserts)
}

/// Interleave content sections with promo cards, cycling through products.
pub fn interleave(sections: &[ContentSection], products: &[Product]) -> Vec<BodyBlock> {
    let mut blocks = Vec::with_capacity(sections.len() * 2);
    let mut next = products.iter().cycle();

    for section in sections {
        if !section.html.is_empty() {
            blocks.push(BodyBlock::Html(section.html.clone()));
        }
        if section.insert_after {
            if let Some(product) = next.next() {
                blocks.push(BodyBlock::Promo(product.clone()));
            }
        }
    }

    blocks
}
