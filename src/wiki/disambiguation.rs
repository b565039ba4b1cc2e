//! Candidate extraction from rendered disambiguation pages.

use scraper::{Html, Selector};

/// Extracts candidate article titles from a disambiguation page's HTML.
///
/// Every list item that contains a link contributes the text of its first link,
/// in document order. Table-of-contents entries are skipped.
pub(crate) fn extract_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_fragment(html);

    let (Ok(item_selector), Ok(link_selector)) = (Selector::parse("li"), Selector::parse("a"))
    else {
        return Vec::new();
    };

    document
        .select(&item_selector)
        .filter(|item| {
            !item
                .value()
                .classes()
                .any(|class| class.contains("tocsection"))
        })
        .filter_map(|item| {
            let link = item.select(&link_selector).next()?;
            let text = link.text().collect::<String>();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}
