// Dealer Scraper Library
//
// Finds the inventory page on a dealer website and turns vehicle detail pages
// into normalized listing records, falling back to defaults wherever a page
// doesn't yield a field.

pub mod api;
pub mod client;
pub mod config;
pub mod extractor;
pub mod harvester;
pub mod locator;
pub mod models;
pub mod selectors;
pub mod store;
pub mod utils;

// Re-export main types for convenience
pub use client::{FetchedPage, HttpClient};
pub use config::{DealerEntry, HarvestPlan, ScraperConfig};
pub use extractor::{
    ExtractOptions, KNOWN_MAKES, MakeEntry, VehicleExtractor, parse_mileage, parse_price,
    parse_title, parse_vehicle,
};
pub use harvester::{DealerOutcome, HarvestReport, Harvester};
pub use locator::{COMMON_INVENTORY_PATHS, INVENTORY_KEYWORDS, InventoryLocator, find_inventory_links};
pub use models::{DEFAULTS, DealerInfo, DealerRecord, VehicleDefaults, VehicleRecord};
pub use selectors::VehicleSelectors;
pub use store::VehicleStore;
