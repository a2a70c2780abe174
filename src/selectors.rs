use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Ordered selector cascades, one list per extracted field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSelectors {
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub mileage: Vec<String>,
    pub images: Vec<String>,
}

impl Default for VehicleSelectors {
    fn default() -> Self {
        Self {
            title: vec![
                "h1".to_string(),
                ".vehicle-title".to_string(),
                ".car-title".to_string(),
                ".listing-title".to_string(),
                "title".to_string(),
            ],
            price: vec![
                ".price".to_string(),
                ".vehicle-price".to_string(),
                ".car-price".to_string(),
                ".listing-price".to_string(),
                "[class*='price']".to_string(),
                "[id*='price']".to_string(),
            ],
            mileage: vec![
                ".mileage".to_string(),
                ".vehicle-mileage".to_string(),
                ".car-mileage".to_string(),
                "[class*='mileage']".to_string(),
                "[id*='mileage']".to_string(),
            ],
            images: vec![
                ".vehicle-gallery img".to_string(),
                ".gallery img".to_string(),
                "[class*='photo'] img".to_string(),
                "[class*='slider'] img".to_string(),
                "img[data-src]".to_string(),
                "img[src]".to_string(),
            ],
        }
    }
}

/// Text content of an element, whitespace trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.trim().to_string()
}

/// Walk `selectors` in order, handing the first element each one matches to
/// `extract`. The first `Some` wins; later selectors are not tried.
///
/// Selectors that fail to parse are skipped like selectors that match nothing.
pub fn first_match<T, F>(document: &Html, selectors: &[String], mut extract: F) -> Option<T>
where
    F: FnMut(ElementRef<'_>) -> Option<T>,
{
    for selector_str in selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(selector) => selector,
            Err(_) => {
                log::debug!("Skipping unparseable selector: {}", selector_str);
                continue;
            }
        };

        if let Some(element) = document.select(&selector).next() {
            if let Some(value) = extract(element) {
                return Some(value);
            }
        }
    }

    None
}

/// Every element matched by any of `selectors`, in cascade order then document order
pub fn all_matches<'a>(document: &'a Html, selectors: &[String]) -> Vec<ElementRef<'a>> {
    let mut elements = Vec::new();

    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            elements.extend(document.select(&selector));
        }
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_stops_at_first_success() {
        let html = Html::parse_document(
            r#"<div class="a">one</div><div class="b">two</div><div class="c">three</div>"#,
        );
        let selectors = vec![".missing".to_string(), ".b".to_string(), ".c".to_string()];

        let mut tried = Vec::new();
        let found = first_match(&html, &selectors, |el| {
            let text = element_text(&el);
            tried.push(text.clone());
            Some(text)
        });

        assert_eq!(found.as_deref(), Some("two"));
        assert_eq!(tried, vec!["two"]);
    }

    #[test]
    fn test_first_match_falls_through_on_rejection() {
        let html = Html::parse_document(r#"<p class="a">n/a</p><p class="b">42</p>"#);
        let selectors = vec![".a".to_string(), ".b".to_string()];

        let found = first_match(&html, &selectors, |el| element_text(&el).parse::<u32>().ok());
        assert_eq!(found, Some(42));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let html = Html::parse_document(r#"<span class="price">$100</span>"#);
        let selectors = vec!["[[[".to_string(), ".price".to_string()];

        let found = first_match(&html, &selectors, |el| Some(element_text(&el)));
        assert_eq!(found.as_deref(), Some("$100"));
    }

    #[test]
    fn test_custom_selectors_from_toml() {
        let selectors: VehicleSelectors = toml::from_str(r#"price = [".sale-amount"]"#).unwrap();
        assert_eq!(selectors.price, vec![".sale-amount"]);
        assert_eq!(selectors.title, VehicleSelectors::default().title);
    }
}
