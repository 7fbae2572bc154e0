//! Heuristic mining of rendered pages into structured content.
//!
//! Services and testimonials are found by substring matches on class names,
//! so false positives and misses are expected. The only promise is a bounded,
//! deterministic output shape; missing elements produce empty lists.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

pub const MAX_HEADINGS: usize = 20;
pub const MAX_PARAGRAPHS: usize = 30;
pub const MAX_SERVICES: usize = 10;
pub const MAX_TESTIMONIALS: usize = 5;

const MIN_PARAGRAPH_CHARS: usize = 50;
const SERVICE_CHARS: (usize, usize) = (20, 500);
const MIN_TESTIMONIAL_CHARS: usize = 30;

const SERVICE_SELECTOR: &str = r#"[class*="service"], [class*="product"], [class*="offer"]"#;
const TESTIMONIAL_SELECTOR: &str =
    r#"[class*="testimonial"], [class*="review"], [class*="feedback"]"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub services: Vec<String>,
    pub testimonials: Vec<String>,
}

pub fn extract(html: &str) -> StructuredContent {
    let document = Html::parse_document(html);

    StructuredContent {
        headings: collect(&document, "h1, h2, h3", MAX_HEADINGS, |len| len > 0),
        paragraphs: collect(&document, "p", MAX_PARAGRAPHS, |len| {
            len > MIN_PARAGRAPH_CHARS
        }),
        services: collect(&document, SERVICE_SELECTOR, MAX_SERVICES, |len| {
            len > SERVICE_CHARS.0 && len < SERVICE_CHARS.1
        }),
        testimonials: collect(&document, TESTIMONIAL_SELECTOR, MAX_TESTIMONIALS, |len| {
            len > MIN_TESTIMONIAL_CHARS
        }),
    }
}

fn collect(
    document: &Html,
    selector: &str,
    cap: usize,
    keep: impl Fn(usize) -> bool,
) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|text| keep(text.chars().count()))
        .take(cap)
        .collect()
}

/// Element text with whitespace runs collapsed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(element.text())
}

pub(crate) fn collapse_whitespace<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in pieces.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
