use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Literal fallbacks used when a field heuristic finds nothing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleDefaults {
    pub year: i32,
    pub make: &'static str,
    pub model: &'static str,
    pub price: f64,
    pub mileage: u32,
}

pub const DEFAULTS: VehicleDefaults = VehicleDefaults {
    year: 2020,
    make: "Ford",
    model: "Focus",
    price: 15000.0,
    mileage: 50000,
};

/// Model used when a make matched but nothing usable followed it
pub const UNKNOWN_MODEL: &str = "Unknown";

/// Placeholder for dealer city/state the caller didn't supply
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Dealer details supplied by the caller. Never inferred from the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerInfo {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl DealerInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            city: None,
            state: None,
            phone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingStatus::Active => f.write_str("active"),
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ListingStatus::Active),
            other => Err(format!("unknown listing status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Used,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Used => f.write_str("used"),
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "used" => Ok(Condition::Used),
            other => Err(format!("unknown condition '{}'", other)),
        }
    }
}

/// Fields pulled out of a detail page. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub mileage: Option<u32>,
    pub images: Vec<String>,
}

/// A normalized vehicle listing. Every field is populated, either from the
/// page or from [`DEFAULTS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    pub dealer_id: String,
    pub dealer_name: String,
    pub dealer_city: String,
    pub dealer_state: String,
    pub dealer_phone: String,
    pub source_url: String,
    pub scraped_at: String,
    pub created_at: String,
    pub updated_at: String,
    pub status: ListingStatus,
    pub condition: Condition,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub price: f64,
    pub mileage: u32,
    pub images: Vec<String>,
}

impl VehicleRecord {
    /// Build a record for `source_url`, filling any missing field from the defaults table
    pub fn from_fields(source_url: &str, dealer: &DealerInfo, fields: ExtractedFields) -> Self {
        let now = Utc::now().to_rfc3339();

        Self {
            id: Uuid::new_v4().to_string(),
            dealer_id: dealer.name.clone(),
            dealer_name: dealer.name.clone(),
            dealer_city: dealer
                .city
                .clone()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            dealer_state: dealer
                .state
                .clone()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            dealer_phone: dealer.phone.clone().unwrap_or_default(),
            source_url: source_url.to_string(),
            scraped_at: now.clone(),
            created_at: now.clone(),
            updated_at: now,
            status: ListingStatus::Active,
            condition: Condition::Used,
            year: fields.year.unwrap_or(DEFAULTS.year),
            make: fields.make.unwrap_or_else(|| DEFAULTS.make.to_string()),
            model: fields.model.unwrap_or_else(|| DEFAULTS.model.to_string()),
            price: fields.price.unwrap_or(DEFAULTS.price),
            mileage: fields.mileage.unwrap_or(DEFAULTS.mileage),
            images: fields.images,
        }
    }

    pub fn headline(&self) -> String {
        format!("{} {} {} - ${:.0}", self.year, self.make, self.model, self.price)
    }
}

/// Dealer metadata persisted alongside its vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerRecord {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub url: String,
    pub inventory_url: Option<String>,
    pub is_active: bool,
    pub vehicle_count: u32,
    pub created_at: String,
}

impl DealerRecord {
    pub fn new(dealer: &DealerInfo, inventory_url: Option<String>, vehicle_count: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: dealer.name.clone(),
            city: dealer
                .city
                .clone()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            state: dealer
                .state
                .clone()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            phone: dealer.phone.clone().unwrap_or_default(),
            url: dealer.url.clone(),
            is_active: inventory_url.is_some(),
            inventory_url,
            vehicle_count,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
