use rand::Rng;
use url::Url;

/// Browser user agents rotated when no fixed agent is configured
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

pub fn get_random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    let index = rng.random_range(0..USER_AGENTS.len());
    USER_AGENTS[index]
}

/// Resolve `href` against `base_url`. Protocol-relative hrefs keep the base scheme.
pub fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Collapse runs of whitespace so text pulled from nested elements reads cleanly
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent() {
        let agent = get_random_user_agent();
        assert!(!agent.is_empty());
        assert!(USER_AGENTS.contains(&agent));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        assert_eq!(
            resolve_url("https://dealer.example/home", "/inventory").as_deref(),
            Some("https://dealer.example/inventory")
        );
        assert_eq!(
            resolve_url("https://dealer.example/", "https://other.example/cars").as_deref(),
            Some("https://other.example/cars")
        );
        assert_eq!(
            resolve_url("https://dealer.example/", "//cdn.example/a.jpg").as_deref(),
            Some("https://cdn.example/a.jpg")
        );
        assert_eq!(
            resolve_url("http://dealer.example/", "//cdn.example/a.jpg").as_deref(),
            Some("http://cdn.example/a.jpg")
        );
        assert_eq!(resolve_url("not a url", "/inventory"), None);
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  2019\n  Toyota\tCamry "), "2019 Toyota Camry");
    }
}
