// src/parse/listing.rs

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, trace};
use url::Url;

static LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector should parse"));

/// Every link on the listing page that points at a draw detail page.
///
/// Hrefs are resolved against `base` first, so relative links count too.
/// Order follows the document and duplicates are kept.
pub fn parse_listing(html: &str, base: &Url, detail_prefix: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let links: Vec<String> = doc
        .select(&LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|u| u.to_string())
        .filter(|u| u.starts_with(detail_prefix))
        .inspect(|u| trace!(url = %u, "detail link"))
        .collect();
    debug!(count = links.len(), "detail links on listing page");
    links
}

/// Sort, drop repeats and keep the `limit` greatest URLs (the newest draws).
pub fn select_recent(mut urls: Vec<String>, limit: usize) -> Vec<String> {
    urls.sort();
    urls.dedup();
    let skip = urls.len().saturating_sub(limit);
    urls.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = include_str!("../../tests/fixtures/listing.html");
    const PREFIX: &str = "https://kaijiang.500.com/shtml/ssq/";

    fn base() -> Url {
        Url::parse("http://kaijiang.500.com/shtml/ssq/19002.shtml").unwrap()
    }

    #[test]
    fn keeps_only_detail_links() {
        let links = parse_listing(LISTING, &base(), PREFIX);
        assert_eq!(
            links,
            vec![
                "https://kaijiang.500.com/shtml/ssq/19003.shtml",
                "https://kaijiang.500.com/shtml/ssq/19001.shtml",
                "https://kaijiang.500.com/shtml/ssq/19002.shtml",
                "https://kaijiang.500.com/shtml/ssq/19001.shtml",
            ]
        );
    }

    #[test]
    fn relative_links_are_resolved() {
        let html = r#"<a href="/shtml/ssq/18150.shtml">18150</a><a href="19001.shtml">x</a>"#;
        let base = Url::parse("https://kaijiang.500.com/shtml/ssq/19002.shtml").unwrap();
        let links = parse_listing(html, &base, PREFIX);
        assert_eq!(
            links,
            vec![
                "https://kaijiang.500.com/shtml/ssq/18150.shtml",
                "https://kaijiang.500.com/shtml/ssq/19001.shtml",
            ]
        );
    }

    #[test]
    fn select_recent_sorts_and_slices() {
        let urls = ["c", "a", "d", "b", "d"].map(String::from).to_vec();
        assert_eq!(select_recent(urls.clone(), 2), vec!["c", "d"]);
        assert_eq!(select_recent(urls, 10), vec!["a", "b", "c", "d"]);
        assert!(select_recent(Vec::new(), 3).is_empty());
    }
}
