use regex::Regex;
use scraper::Html;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::client::HttpClient;
use crate::config::ScraperConfig;
use crate::models::{DealerInfo, ExtractedFields, UNKNOWN_MODEL, VehicleRecord};
use crate::selectors::{VehicleSelectors, all_matches, element_text, first_match};
use crate::utils::{resolve_url, squash_whitespace};

/// A manufacturer name as it may appear in a title, and the name stored on the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeEntry {
    pub pattern: &'static str,
    pub canonical: &'static str,
}

const fn make(name: &'static str) -> MakeEntry {
    MakeEntry {
        pattern: name,
        canonical: name,
    }
}

const fn alias(pattern: &'static str, canonical: &'static str) -> MakeEntry {
    MakeEntry { pattern, canonical }
}

/// Known makes. List order decides which one wins when a title mentions several.
pub const KNOWN_MAKES: &[MakeEntry] = &[
    make("Ford"),
    make("Toyota"),
    make("Honda"),
    make("Chevrolet"),
    alias("Chevy", "Chevrolet"),
    make("BMW"),
    make("Mercedes"),
    make("Audi"),
    make("Nissan"),
    make("Hyundai"),
    make("Kia"),
    make("Volkswagen"),
    alias("VW", "Volkswagen"),
    make("Mazda"),
    make("Subaru"),
    make("Lexus"),
    make("Acura"),
    make("Infiniti"),
    make("Cadillac"),
    make("Buick"),
    make("GMC"),
    make("Jeep"),
    make("Chrysler"),
    make("Dodge"),
    make("Ram"),
    make("Tesla"),
    make("Volvo"),
    make("Jaguar"),
    make("Land Rover"),
    make("Porsche"),
    make("Mini"),
];

pub const MAX_MODEL_LEN: usize = 30;

struct MakeMatcher {
    entry: MakeEntry,
    word: Regex,
    model: Regex,
}

static MAKE_MATCHERS: LazyLock<Vec<MakeMatcher>> = LazyLock::new(|| {
    KNOWN_MAKES
        .iter()
        .map(|entry| {
            let escaped = regex::escape(entry.pattern);
            MakeMatcher {
                entry: *entry,
                word: Regex::new(&format!(r"(?i)\b{}\b", escaped)).expect("valid make regex"),
                model: Regex::new(&format!(r"(?i){}\s+([A-Za-z0-9\s-]+)", escaped))
                    .expect("valid model regex"),
            }
        })
        .collect()
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex"));
static TRAILING_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\b(?:19|20)\d{2}\b.*").expect("valid regex"));
static TRAILING_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$.*").expect("valid regex"));
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+").expect("valid regex"));
static MILEAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*(?:miles|mi)").expect("valid regex"));

/// Per-call knobs for turning a detail page into a record
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub selectors: VehicleSelectors,
    pub collect_images: bool,
    pub max_images: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ScraperConfig::default())
    }
}

impl From<&ScraperConfig> for ExtractOptions {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            selectors: config.selectors.clone(),
            collect_images: config.collect_images,
            max_images: config.max_images,
        }
    }
}

/// Turns vehicle detail pages into [`VehicleRecord`]s
pub struct VehicleExtractor<'a> {
    client: &'a HttpClient,
    options: ExtractOptions,
}

impl<'a> VehicleExtractor<'a> {
    pub fn new(client: &'a HttpClient, options: ExtractOptions) -> Self {
        Self { client, options }
    }

    /// Fetch `detail_url` and build a record from it.
    ///
    /// `None` means the page could not be fetched. Any page that was fetched
    /// produces a complete record.
    pub async fn extract(&self, detail_url: &str, dealer: &DealerInfo) -> Option<VehicleRecord> {
        log::debug!("Scraping vehicle: {}", detail_url);

        let page = match self.client.fetch(detail_url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Skipping {}: {:#}", detail_url, e);
                return None;
            }
        };

        let record = parse_vehicle(&page.body, detail_url, dealer, &self.options);
        log::info!("Extracted {} from {}", record.headline(), detail_url);
        Some(record)
    }
}

/// Build a record from an already-fetched detail page
pub fn parse_vehicle(
    html: &str,
    detail_url: &str,
    dealer: &DealerInfo,
    options: &ExtractOptions,
) -> VehicleRecord {
    let fields = extract_fields(html, detail_url, options);
    VehicleRecord::from_fields(detail_url, dealer, fields)
}

/// Run every field heuristic over one parse of `html`
pub fn extract_fields(html: &str, detail_url: &str, options: &ExtractOptions) -> ExtractedFields {
    let document = Html::parse_document(html);
    let selectors = &options.selectors;

    let title = find_title(&document, selectors).unwrap_or_default();
    let title_fields = parse_title(&title);

    let price = first_match(&document, &selectors.price, |el| parse_price(&element_text(&el)));
    if price.is_none() {
        log::debug!("No price found on {}", detail_url);
    }

    let mileage = first_match(&document, &selectors.mileage, |el| {
        parse_mileage(&element_text(&el))
    });
    if mileage.is_none() {
        log::debug!("No mileage found on {}", detail_url);
    }

    let images = if options.collect_images {
        find_images(&document, detail_url, &selectors.images, options.max_images)
    } else {
        Vec::new()
    };

    ExtractedFields {
        year: title_fields.year,
        make: title_fields.make,
        model: title_fields.model,
        price,
        mileage,
        images,
    }
}

/// Text of the first element any title selector matches, even if blank
fn find_title(document: &Html, selectors: &VehicleSelectors) -> Option<String> {
    first_match(document, &selectors.title, |el| {
        let text: String = el.text().collect();
        Some(squash_whitespace(&text))
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleFields {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
}

/// Pull year, make and model out of a listing title
pub fn parse_title(title: &str) -> TitleFields {
    if title.is_empty() {
        return TitleFields::default();
    }

    let year = YEAR_RE
        .find(title)
        .and_then(|m| m.as_str().parse::<i32>().ok());

    let mut fields = TitleFields {
        year,
        ..TitleFields::default()
    };

    if let Some(matcher) = MAKE_MATCHERS.iter().find(|m| m.word.is_match(title)) {
        fields.make = Some(matcher.entry.canonical.to_string());
        fields.model = matcher
            .model
            .captures(title)
            .and_then(|caps| caps.get(1))
            .map(|capture| clean_model(capture.as_str()));
    }

    fields
}

/// Drop a trailing year or price from a model capture and cap its length
fn clean_model(raw: &str) -> String {
    let without_year = TRAILING_YEAR_RE.replace(raw.trim(), "");
    let without_price = TRAILING_PRICE_RE.replace(without_year.trim(), "");
    let cleaned = without_price.trim();

    if cleaned.is_empty() {
        return UNKNOWN_MODEL.to_string();
    }

    let capped: String = cleaned.chars().take(MAX_MODEL_LEN).collect();
    capped.trim_end().to_string()
}

/// First `$` amount in `text`, as a positive number
pub fn parse_price(text: &str) -> Option<f64> {
    let token = PRICE_RE.find(text)?;
    let digits = token.as_str().replace(['$', ','], "");
    digits.parse::<f64>().ok().filter(|price| *price > 0.0)
}

/// First number followed by "miles" or "mi"
pub fn parse_mileage(text: &str) -> Option<u32> {
    let caps = MILEAGE_RE.captures(text)?;
    caps.get(1)?.as_str().replace(',', "").parse::<u32>().ok()
}

fn find_images(document: &Html, base_url: &str, selectors: &[String], limit: usize) -> Vec<String> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();

    for element in all_matches(document, selectors) {
        if images.len() >= limit {
            break;
        }

        let src = element
            .value()
            .attr("data-src")
            .or_else(|| element.value().attr("data-lazy-src"))
            .or_else(|| element.value().attr("src"));

        let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        if src.starts_with("data:") {
            continue;
        }

        if let Some(absolute) = resolve_url(base_url, src) {
            if seen.insert(absolute.clone()) {
                images.push(absolute);
            }
        }
    }

    images
}
