//! schema.org structured data: the types we emit and detection of blocks
//! a post body already carries.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub const SCHEMA_CONTEXT: &str = "https://schema.org";

static LD_SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']?application/ld\+json["']?[^>]*>(.*?)</script\s*>"#)
        .expect("json-ld script regex")
});

static TYPE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""@type"\s*:\s*(?:\[[^\]]*?)?"([^"]+)""#).expect("type marker regex")
});

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FaqPage {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "mainEntity")]
    pub main_entity: Vec<FaqQuestion>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FaqQuestion {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(rename = "acceptedAnswer")]
    pub accepted_answer: FaqAnswer,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FaqAnswer {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub text: String,
}

impl FaqPage {
    pub fn new(main_entity: Vec<FaqQuestion>) -> Self {
        Self {
            context: SCHEMA_CONTEXT,
            kind: "FAQPage",
            main_entity,
        }
    }
}

impl FaqQuestion {
    pub fn new(name: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            kind: "Question",
            name: name.into(),
            accepted_answer: FaqAnswer {
                kind: "Answer",
                text: answer.into(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPosting {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_entity_of_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Person>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Person {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: "Person",
            name: name.into(),
        }
    }
}

/// Serialize `data` into a `<script type="application/ld+json">` block.
///
/// Every `<` becomes `\u003c` so text like `</script>` inside a string value
/// cannot close the element early.
pub fn to_script_tag<T: Serialize>(data: &T) -> Result<String> {
    let json = serde_json::to_string(data).context("serializing json-ld")?;
    Ok(format!(
        r#"<script type="application/ld+json">{}</script>"#,
        json.replace('<', "\\u003c")
    ))
}

/// Whether the document already embeds a JSON-LD block declaring `schema_type`.
pub fn contains_schema_type(html: &str, schema_type: &str) -> bool {
    LD_SCRIPT_RE.captures_iter(html).any(|caps| {
        let body = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if body.is_empty() {
            return false;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => value_declares_type(&value, schema_type),
            // CMS editors paste hand-written blocks that are not always valid JSON.
            Err(_) => TYPE_MARKER_RE
                .captures_iter(body)
                .any(|m| m.get(1).is_some_and(|t| t.as_str() == schema_type)),
        }
    })
}

fn value_declares_type(value: &Value, schema_type: &str) -> bool {
    match value {
        Value::Object(map) => {
            let declared = match map.get("@type") {
                Some(Value::String(t)) => t == schema_type,
                Some(Value::Array(types)) => types
                    .iter()
                    .any(|t| t.as_str().is_some_and(|t| t == schema_type)),
                _ => false,
            };
            declared || map.values().any(|v| value_declares_type(v, schema_type))
        }
        Value::Array(items) => items.iter().any(|v| value_declares_type(v, schema_type)),
        _ => false,
    }
}
