/// Resolve one `href` the way a browser fills in `anchor.href`.
///
/// Absolute hrefs of any scheme are kept (fragments included); relative ones
/// are joined onto `base`. Returns `None` only when a relative href has no
/// usable base.
fn resolve_href(href: &str, base: Option<&url::Url>) -> Option<String> {
    let href = href.trim();
    let u = match url::Url::parse(href) {
        Ok(u) => u,
        Err(_) => base?.join(href).ok()?,
    };
    Some(u.to_string())
}

fn anchors(doc: &html_scraper::Html) -> Vec<html_scraper::ElementRef<'_>> {
    match html_scraper::Selector::parse("a[href]") {
        Ok(sel) => doc.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

/// Every anchor link on the page, in document order, duplicates kept.
///
/// This is the raw corpus for counting and relevance ranking: a link that
/// appears three times on a page is returned three times.
pub fn extract_page_links(html: &str, base_url: Option<&str>) -> Vec<String> {
    let base = base_url.and_then(|u| url::Url::parse(u).ok());
    let doc = html_scraper::Html::parse_document(html);
    anchors(&doc)
        .into_iter()
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_href(href, base.as_ref()))
        .collect()
}
