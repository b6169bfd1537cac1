use std::ops::Range;

use anyhow::Result;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::folio::jsonld::{self, FaqPage, FaqQuestion};
use crate::folio::markup::{self, Heading};
use crate::folio::types::{FaqItem, PostDocument};

use super::text::{inline_text, to_plain_text};
use super::traits::Transformer;

/// Class carried by the container [`wrap_faq_section`] adds.
pub const FAQ_WRAPPER_CLASS: &str = "faq-section";

/// Questions and answers shorter than this are treated as empty.
pub const MIN_FAQ_TEXT_LEN: usize = 3;

static FAQ_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:faqs?|frequently\s+asked\s+questions|häufige\s+fragen|häufig\s+gestellte\s+fragen|haeufige\s+fragen|haufige\s+fragen)\b",
    )
    .expect("faq heading regex")
});

static FAQ_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<[a-z][a-z0-9]*\b[^>]*?\sid\s*=\s*["']?[^"'\s>]*faq"#).expect("faq id regex")
});

static CLASS_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<[a-z][a-z0-9]*(?:\s[^>]*?)?\sclass\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s"'>]+))"#)
        .expect("class attribute regex")
});

static QUESTION_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:question|frage|q)\s*\d*\s*[:.)\-–]|\d+\s*[.):\-–])\s*")
        .expect("question prefix regex")
});

/// Where the FAQ block sits in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaqSection {
    /// The whole block, starting at the FAQ heading or element.
    pub span: Range<usize>,
    /// Offset just past the heading or opening tag that marked the block.
    pub body_start: usize,
}

/// Locate the FAQ block: the first level 1-3 heading whose text matches the
/// FAQ vocabulary, or the first element whose id contains "faq", whichever
/// comes first. The block runs to the next level 1-2 heading or the end.
pub fn locate_faq_section(html: &str) -> Option<FaqSection> {
    let by_heading = markup::headings(html, &[1, 2, 3])
        .into_iter()
        .find(|h| is_faq_heading(html, h))
        .map(|h| (h.start, h.end));

    let by_id = FAQ_ID_RE.find(html).and_then(|m| {
        let gt = html[m.end()..].find('>')?;
        Some((m.start(), m.end() + gt + 1))
    });

    let (start, body_start) = match (by_heading, by_id) {
        (Some(h), Some(i)) => {
            if i.0 < h.0 {
                i
            } else {
                h
            }
        }
        (Some(found), None) | (None, Some(found)) => found,
        (None, None) => return None,
    };

    let end = markup::headings_in(html, body_start..html.len(), &[1, 2])
        .first()
        .map(|h| h.start)
        .unwrap_or(html.len());

    Some(FaqSection {
        span: start..end,
        body_start,
    })
}

fn is_faq_heading(html: &str, heading: &Heading) -> bool {
    if FAQ_HEADING_RE.is_match(&inline_text(heading.inner(html))) {
        return true;
    }
    markup::attr_value(heading.attrs(html), "id")
        .is_some_and(|id| id.to_ascii_lowercase().contains("faq"))
}

/// Pair every level-3 heading inside the FAQ block with the markup that
/// follows it, up to the next level-3 heading or the end of the block.
///
/// Any level-3 heading in the block starts a new question, including one an
/// author meant as a sub-heading of an answer.
pub fn extract_faq_items(html: &str) -> Vec<FaqItem> {
    let Some(section) = locate_faq_section(html) else {
        return Vec::new();
    };

    let questions = markup::headings_in(html, section.body_start..section.span.end, &[3]);

    questions
        .iter()
        .enumerate()
        .filter_map(|(i, heading)| {
            let answer_end = questions
                .get(i + 1)
                .map(|next| next.start)
                .unwrap_or(section.span.end);

            let question = clean_question(heading.inner(html));
            let answer = to_plain_text(&html[heading.end..answer_end]);

            let valid = question.chars().count() >= MIN_FAQ_TEXT_LEN
                && answer.chars().count() >= MIN_FAQ_TEXT_LEN;
            valid.then_some(FaqItem { question, answer })
        })
        .collect()
}

/// Build a `FAQPage` object from the document's FAQ block.
///
/// Returns `None` when the document already embeds FAQPage JSON-LD or when
/// fewer than two usable question/answer pairs were found.
pub fn extract_faq_schema_from_html(html: &str) -> Option<FaqPage> {
    if jsonld::contains_schema_type(html, "FAQPage") {
        return None;
    }

    let items = extract_faq_items(html);
    if items.len() < 2 {
        return None;
    }

    Some(FaqPage::new(
        items
            .into_iter()
            .map(|item| FaqQuestion::new(item.question, item.answer))
            .collect(),
    ))
}

/// Wrap the FAQ block in `<section class="faq-section">`.
///
/// A document with an element already carrying the wrapper class is returned
/// unchanged, which makes the pass idempotent.
pub fn wrap_faq_section(html: &str) -> String {
    if has_wrapper_class(html) {
        return html.to_string();
    }

    let Some(section) = locate_faq_section(html) else {
        return html.to_string();
    };

    let mut out = String::with_capacity(html.len() + 48);
    out.push_str(&html[..section.span.start]);
    out.push_str(&format!(r#"<section class="{FAQ_WRAPPER_CLASS}">"#));
    out.push_str(&html[section.span.clone()]);
    out.push_str("</section>");
    out.push_str(&html[section.span.end..]);
    out
}

/// Whether any opening tag lists [`FAQ_WRAPPER_CLASS`] among its class tokens.
fn has_wrapper_class(html: &str) -> bool {
    CLASS_ATTR_RE.captures_iter(html).any(|caps| {
        caps.name("dq")
            .or_else(|| caps.name("sq"))
            .or_else(|| caps.name("bare"))
            .is_some_and(|classes| {
                classes
                    .as_str()
                    .split_ascii_whitespace()
                    .any(|class| class.eq_ignore_ascii_case(FAQ_WRAPPER_CLASS))
            })
    })
}

fn clean_question(inner: &str) -> String {
    let text = inline_text(inner);
    QUESTION_PREFIX_RE.replace(&text, "").trim().to_string()
}

/// Derives FAQPage structured data from the untouched source body.
pub struct FaqSchema;

impl Transformer for FaqSchema {
    fn transform(&self, mut doc: PostDocument) -> Result<PostDocument> {
        doc.faq = extract_faq_schema_from_html(&doc.post.html);
        if let Some(faq) = &doc.faq {
            debug!("{}: {} faq entries", doc.post.slug, faq.main_entity.len());
        }
        Ok(doc)
    }
}

pub struct FaqSectionWrapper;

impl Transformer for FaqSectionWrapper {
    fn transform(&self, mut doc: PostDocument) -> Result<PostDocument> {
        doc.html = wrap_faq_section(&doc.html);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = "<p>Intro</p>\
        <h2>Frequently Asked Questions</h2>\
        <h3>1. How long does shipping take?</h3><p>Usually 3-5 days.</p>\
        <h3>Q: Can I return items?</h3><p>Yes, within 30 days.</p>\
        <h2>Conclusion</h2><p>Bye</p>";

    #[test]
    fn locates_section_between_faq_heading_and_next_h2() {
        let section = locate_faq_section(TWO_QUESTIONS).unwrap();
        let block = &TWO_QUESTIONS[section.span.clone()];
        assert!(block.starts_with("<h2>Frequently Asked Questions</h2>"));
        assert!(block.ends_with("<p>Yes, within 30 days.</p>"));
        assert!(!block.contains("Conclusion"));
    }

    #[test]
    fn extracts_items_with_cleaned_questions() {
        let items = extract_faq_items(TWO_QUESTIONS);
        assert_eq!(
            items,
            vec![
                FaqItem {
                    question: "How long does shipping take?".into(),
                    answer: "Usually 3-5 days.".into(),
                },
                FaqItem {
                    question: "Can I return items?".into(),
                    answer: "Yes, within 30 days.".into(),
                },
            ]
        );
    }

    #[test]
    fn emits_schema_for_two_pairs() {
        let schema = extract_faq_schema_from_html(TWO_QUESTIONS).unwrap();
        assert_eq!(schema.kind, "FAQPage");
        assert_eq!(schema.main_entity.len(), 2);
        assert_eq!(schema.main_entity[1].accepted_answer.text, "Yes, within 30 days.");
    }

    #[test]
    fn single_pair_is_not_enough() {
        let html = "<h2>FAQ</h2><h3>Only question?</h3><p>Only answer.</p>";
        assert_eq!(extract_faq_items(html).len(), 1);
        assert!(extract_faq_schema_from_html(html).is_none());
    }

    #[test]
    fn existing_structured_data_suppresses_extraction() {
        let html = format!(
            r#"<script type="application/ld+json">{{"@type":"FAQPage"}}</script>{TWO_QUESTIONS}"#
        );
        assert!(extract_faq_schema_from_html(&html).is_none());
    }

    #[test]
    fn drops_pairs_with_empty_answers() {
        let html = "<h2>FAQs</h2>\
            <h3>Empty?</h3><p> </p>\
            <h3>Real one?</h3><p>Real answer.</p>\
            <h3>Another?</h3><p>Another answer.</p>";
        let items = extract_faq_items(html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].question, "Real one?");
    }

    #[test]
    fn matches_german_and_folded_headings() {
        for heading in ["Häufige Fragen", "HAEUFIGE FRAGEN", "Haufige Fragen zum Produkt"] {
            let html = format!("<h2>{heading}</h2><h3>Frage 1: Was?</h3><p>Das hier.</p>");
            let items = extract_faq_items(&html);
            assert_eq!(items.len(), 1, "heading {heading}");
            assert_eq!(items[0].question, "Was?");
        }
    }

    #[test]
    fn matches_element_id() {
        let html = r#"<div id="product-faq"><h3>Does it float?</h3><p>It does.</p><h3>Is it red?</h3><p>Only on Tuesdays.</p></div>"#;
        let section = locate_faq_section(html).unwrap();
        assert_eq!(section.span.start, 0);
        assert_eq!(extract_faq_items(html).len(), 2);
    }

    #[test]
    fn first_faq_heading_wins() {
        let html = "<h2>FAQ</h2><h3>First?</h3><p>One.</p><h2>More FAQ</h2><h3>Second?</h3><p>Two.</p>";
        let items = extract_faq_items(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "First?");
    }

    #[test]
    fn answers_are_plain_text_without_dividers() {
        let html = "<h2>FAQ</h2>\
            <h3>Why?</h3><p>First line.</p>&#8212;<p>Second line.</p>\
            <h3>How?</h3><ul><li>Step one</li><li>Step two</li></ul>";
        let items = extract_faq_items(html);
        assert_eq!(items[0].answer, "First line.\nSecond line.");
        assert_eq!(items[1].answer, "- Step one\n- Step two");
    }

    #[test]
    fn no_faq_section_means_nothing() {
        assert!(extract_faq_items("<h2>About</h2><h3>Us?</h3><p>We.</p>").is_empty());
        assert!(extract_faq_schema_from_html("").is_none());
        assert_eq!(wrap_faq_section(""), "");
    }

    #[test]
    fn wraps_only_the_faq_block() {
        let wrapped = wrap_faq_section(TWO_QUESTIONS);
        assert!(wrapped.starts_with("<p>Intro</p><section class=\"faq-section\"><h2>Frequently"));
        assert!(wrapped.contains("within 30 days.</p></section><h2>Conclusion</h2>"));
    }

    #[test]
    fn wrapping_is_idempotent() {
        let once = wrap_faq_section(TWO_QUESTIONS);
        assert_eq!(wrap_faq_section(&once), once);
        let plain = "<p>No questions here.</p>";
        assert_eq!(wrap_faq_section(plain), plain);
    }

    #[test]
    fn wraps_yoast_faq_blocks() {
        let html = r#"<h2>FAQ</h2><div class="schema-faq wp-block-yoast-faq-block"><div class="schema-faq-section"><strong class="schema-faq-question">Free?</strong><p class="schema-faq-answer">Yes.</p></div></div><h2>Next</h2>"#;
        let wrapped = wrap_faq_section(html);
        assert!(wrapped.starts_with(r#"<section class="faq-section"><h2>FAQ</h2>"#));
        assert!(wrapped.ends_with("</div></div></section><h2>Next</h2>"));
        assert_eq!(wrap_faq_section(&wrapped), wrapped);
    }

    #[test]
    fn wrapper_name_in_prose_does_not_block_wrapping() {
        let html = "<p>see faq-section docs</p><h2>FAQ</h2><h3>Why?</h3><p>Because.</p>";
        let wrapped = wrap_faq_section(html);
        assert!(wrapped.contains(r#"<section class="faq-section"><h2>FAQ</h2>"#));
    }

    #[test]
    fn existing_wrapper_among_other_classes_is_respected() {
        let other = r#"<div data-class="faq-section"></div><h2>FAQ</h2>"#;
        assert!(wrap_faq_section(other).contains(r#"<section class="faq-section">"#));

        let html = r#"<section class='post-block faq-section'><h2>FAQ</h2><h3>Why?</h3><p>Because.</p></section>"#;
        assert_eq!(wrap_faq_section(html), html);
    }

    #[test]
    fn any_h3_in_the_block_starts_a_question() {
        let html = "<h2>FAQ</h2>\
            <h3>How do I install it?</h3><p>Run the installer.</p>\
            <h3>Troubleshooting</h3><p>Check the logs.</p>\
            <h3>Is it free?</h3><p>Yes it is.</p>";
        let items = extract_faq_items(html);
        let questions: Vec<&str> = items.iter().map(|i| i.question.as_str()).collect();
        assert_eq!(questions, vec!["How do I install it?", "Troubleshooting", "Is it free?"]);
        assert_eq!(items[0].answer, "Run the installer.");
        assert_eq!(items[1].answer, "Check the logs.");
    }
}
