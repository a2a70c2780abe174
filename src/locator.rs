use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::client::HttpClient;
use crate::utils::resolve_url;

/// Substrings that mark a link as leading to a vehicle listing page
pub const INVENTORY_KEYWORDS: &[&str] = &[
    "inventory",
    "vehicles",
    "cars",
    "used-cars",
    "pre-owned",
    "search",
    "browse",
    "shop",
    "view-inventory",
    "vehicle-search",
    "used-vehicles",
    "auto-inventory",
    "car-search",
];

/// Conventional inventory paths, tried in priority order
pub const COMMON_INVENTORY_PATHS: &[&str] = &[
    "/inventory",
    "/vehicles",
    "/used-cars",
    "/search",
    "/browse",
    "/shop",
    "/cars",
    "/pre-owned",
    "/vehicle-search",
];

/// Finds the inventory page on a dealer site
pub struct InventoryLocator<'a> {
    client: &'a HttpClient,
}

impl<'a> InventoryLocator<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Resolve the inventory page for `base_url`.
    ///
    /// Returns `None` only when the homepage itself can't be fetched. Once it
    /// has been fetched the result is always a URL: a matching link, then the
    /// first conventional path that answers, then `base_url` itself.
    pub async fn locate(&self, base_url: &str) -> Option<String> {
        log::info!("Finding inventory page for {}", base_url);

        let page = match self.client.fetch(base_url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Failed to fetch dealer homepage {}: {:#}", base_url, e);
                return None;
            }
        };

        let candidates = find_inventory_links(&page.body, base_url);
        if let Some(first) = candidates.into_iter().next() {
            log::info!("Found inventory link: {}", first);
            return Some(first);
        }

        if let Some(found) = self.try_common_paths(base_url).await {
            log::info!("Found inventory at: {}", found);
            return Some(found);
        }

        log::info!("No inventory page found for {}, using homepage", base_url);
        Some(base_url.to_string())
    }

    async fn try_common_paths(&self, base_url: &str) -> Option<String> {
        let root = base_url.trim_end_matches('/');

        for path in COMMON_INVENTORY_PATHS {
            let candidate = format!("{}{}", root, path);
            if self.client.is_reachable(&candidate).await {
                return Some(candidate);
            }
        }

        None
    }
}

/// Absolute URLs of links whose href or text mentions an inventory keyword,
/// deduplicated and in document order
pub fn find_inventory_links(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    let mut seen = HashSet::new();

    for element in document.select(&selector) {
        let Some(raw_href) = element.value().attr("href") else {
            continue;
        };

        let href = raw_href.to_lowercase();
        let text = element.text().collect::<String>().trim().to_lowercase();

        let matched = INVENTORY_KEYWORDS
            .iter()
            .find(|keyword| href.contains(*keyword) || text.contains(*keyword));

        if let Some(keyword) = matched {
            let Some(absolute) = resolve_url(base_url, raw_href) else {
                continue;
            };

            if seen.insert(absolute.clone()) {
                log::debug!("Inventory candidate {} (keyword '{}')", absolute, keyword);
                links.push(absolute);
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> HttpClient {
        let config = ScraperConfig {
            timeout_secs: 5,
            user_agent: Some("dealer-scraper-test/0.1".to_string()),
            ..ScraperConfig::default()
        };
        HttpClient::new(&config).unwrap()
    }

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_string(format!("<html><body>{}</body></html>", body))
            .insert_header("content-type", "text/html")
    }

    #[test]
    fn test_links_matched_by_text_or_href_in_document_order() {
        let html = r#"
            <a href="/about">About us</a>
            <a href="/specials">Browse our deals</a>
            <a href="/inventory">Inventory</a>
            <a href="/specials">Specials again</a>
        "#;

        let links = find_inventory_links(html, "https://dealer.example/");
        assert_eq!(
            links,
            vec![
                "https://dealer.example/specials".to_string(),
                "https://dealer.example/inventory".to_string(),
            ]
        );
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let html = r#"<a href="/Used-Cars/All">See all</a><a href="/x">PRE-OWNED</a>"#;
        let links = find_inventory_links(html, "https://dealer.example");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "https://dealer.example/Used-Cars/All");
    }

    #[test]
    fn test_protocol_relative_link_keeps_base_scheme() {
        let html = r#"
            <a href="//dealer.example/inventory">Inventory</a>
            <a href="http://dealer.example/inventory">All inventory</a>
        "#;

        let links = find_inventory_links(html, "http://dealer.example/");
        assert_eq!(links, vec!["http://dealer.example/inventory".to_string()]);
    }

    #[test]
    fn test_no_keywords_yields_nothing() {
        let html = r#"<a href="/about">About</a><a href="/contact">Contact</a><a>No href</a>"#;
        assert!(find_inventory_links(html, "https://dealer.example").is_empty());
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let links = find_inventory_links("<a href='/inventory'<<div></a", "https://dealer.example");
        assert!(links.len() <= 1);
    }

    #[tokio::test]
    async fn test_locate_prefers_homepage_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(r#"<a href="/inventory">Browse Inventory</a>"#))
            .mount(&server)
            .await;
        // A conventional path that would also succeed must not be used
        Mock::given(method("GET"))
            .and(path("/vehicles"))
            .respond_with(html_page("vehicles"))
            .mount(&server)
            .await;

        let client = test_client();
        let base = format!("{}/", server.uri());
        let located = InventoryLocator::new(&client).locate(&base).await;

        assert_eq!(located, Some(format!("{}/inventory", server.uri())));
    }

    #[tokio::test]
    async fn test_locate_tries_paths_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(r#"<a href="/about">About</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(html_page("search"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cars"))
            .respond_with(html_page("cars"))
            .mount(&server)
            .await;

        let client = test_client();
        let located = InventoryLocator::new(&client).locate(&server.uri()).await;

        assert_eq!(located, Some(format!("{}/search", server.uri())));
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page("<p>Welcome</p>"))
            .mount(&server)
            .await;

        let client = test_client();
        let base = format!("{}/", server.uri());
        let located = InventoryLocator::new(&client).locate(&base).await;

        assert_eq!(located, Some(base));
    }

    #[tokio::test]
    async fn test_locate_none_when_homepage_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client();
        let located = InventoryLocator::new(&client).locate(&server.uri()).await;

        assert_eq!(located, None);
    }

    #[tokio::test]
    async fn test_locate_none_on_connection_error() {
        // Nothing listens on the discard port
        let client = test_client();
        let located = InventoryLocator::new(&client).locate("http://127.0.0.1:9/").await;

        assert_eq!(located, None);
    }
}
