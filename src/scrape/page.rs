use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet};

use super::{RenderedPage, ScrapedSite};
use crate::extractor::collapse_whitespace;

const HIDDEN_TAGS: [&str; 3] = ["script", "style", "noscript"];

pub(super) fn build_site(page: &RenderedPage, max_text_chars: usize, max_links: usize) -> ScrapedSite {
    let document = Html::parse_document(&page.html);

    ScrapedSite {
        url: page.url.to_string(),
        title: title(&document),
        meta: meta_tags(&document),
        text: visible_text(&document).chars().take(max_text_chars).collect(),
        links: outbound_links(&document, page, max_links),
        html: page.html.clone(),
    }
}

fn title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next().map(|t| collapse_whitespace(t.text())))
        .unwrap_or_default()
}

/// `name`/`property`/`http-equiv` → `content`; first occurrence wins
fn meta_tags(document: &Html) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();
    let Ok(selector) = Selector::parse("meta[content]") else {
        return meta;
    };

    for element in document.select(&selector) {
        let attrs = element.value();
        let key = attrs
            .attr("name")
            .or_else(|| attrs.attr("property"))
            .or_else(|| attrs.attr("http-equiv"));

        if let (Some(key), Some(content)) = (key, attrs.attr("content")) {
            meta.entry(key.to_ascii_lowercase())
                .or_insert_with(|| content.trim().to_string());
        }
    }

    meta
}

/// Body text with script/style/noscript content removed
fn visible_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let pieces = root.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        (!hidden).then_some(&**text)
    });

    collapse_whitespace(pieces)
}

fn outbound_links(document: &Html, page: &RenderedPage, max_links: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| page.url.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .take(max_links)
        .collect()
}
