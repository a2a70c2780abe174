use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::client::HttpClient;
use crate::config::{DealerEntry, HarvestPlan, ScraperConfig};
use crate::extractor::{ExtractOptions, VehicleExtractor};
use crate::locator::InventoryLocator;
use crate::models::{DealerRecord, VehicleRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerOutcome {
    pub dealer_name: String,
    /// `None` when the dealer homepage could not be fetched
    pub inventory_url: Option<String>,
    pub listings_attempted: usize,
    pub vehicles_extracted: usize,
    pub listings_skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestReport {
    pub started_at: String,
    pub finished_at: String,
    pub outcomes: Vec<DealerOutcome>,
    pub dealers: Vec<DealerRecord>,
    pub vehicles: Vec<VehicleRecord>,
}

impl HarvestReport {
    pub fn total_skipped(&self) -> usize {
        self.outcomes.iter().map(|o| o.listings_skipped).sum()
    }
}

/// Drives locate and extract for every dealer in a plan.
///
/// Owns the HTTP handle for the batch; it is released when the harvester is dropped.
pub struct Harvester {
    client: HttpClient,
    options: ExtractOptions,
    max_concurrency: usize,
}

impl Harvester {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            options: ExtractOptions::from(config),
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    pub async fn harvest(&self, plan: &HarvestPlan) -> HarvestReport {
        let started_at = Utc::now().to_rfc3339();
        let mut outcomes = Vec::new();
        let mut dealers = Vec::new();
        let mut vehicles = Vec::new();

        for entry in &plan.dealers {
            let (outcome, mut found) = self.harvest_dealer(entry).await;

            dealers.push(DealerRecord::new(
                &entry.dealer,
                outcome.inventory_url.clone(),
                outcome.vehicles_extracted as u32,
            ));
            vehicles.append(&mut found);
            outcomes.push(outcome);
        }

        let report = HarvestReport {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            outcomes,
            dealers,
            vehicles,
        };

        log::info!(
            "Harvest complete: {} dealers, {} vehicles, {} listings skipped",
            report.dealers.len(),
            report.vehicles.len(),
            report.total_skipped()
        );

        report
    }

    /// Locate one dealer's inventory page, then extract its listings concurrently
    pub async fn harvest_dealer(&self, entry: &DealerEntry) -> (DealerOutcome, Vec<VehicleRecord>) {
        let dealer = &entry.dealer;
        log::info!("Processing dealer: {}", dealer.name);

        let locator = InventoryLocator::new(&self.client);
        let Some(inventory_url) = locator.locate(&dealer.url).await else {
            log::warn!("Skipping dealer {}: homepage unreachable", dealer.name);
            let outcome = DealerOutcome {
                dealer_name: dealer.name.clone(),
                inventory_url: None,
                listings_attempted: 0,
                vehicles_extracted: 0,
                listings_skipped: 0,
            };
            return (outcome, Vec::new());
        };

        let extractor = VehicleExtractor::new(&self.client, self.options.clone());
        let results: Vec<Option<VehicleRecord>> = stream::iter(&entry.listings)
            .map(|url| extractor.extract(url, dealer))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let attempted = results.len();
        let vehicles: Vec<VehicleRecord> = results.into_iter().flatten().collect();

        let outcome = DealerOutcome {
            dealer_name: dealer.name.clone(),
            inventory_url: Some(inventory_url),
            listings_attempted: attempted,
            vehicles_extracted: vehicles.len(),
            listings_skipped: attempted - vehicles.len(),
        };

        log::info!(
            "{}: {} of {} listings extracted",
            dealer.name,
            outcome.vehicles_extracted,
            outcome.listings_attempted
        );

        (outcome, vehicles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DealerInfo;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_harvester() -> Harvester {
        let config = ScraperConfig {
            timeout_secs: 5,
            user_agent: Some("dealer-scraper-test/0.1".to_string()),
            max_concurrency: 4,
            ..ScraperConfig::default()
        };
        Harvester::new(&config).unwrap()
    }

    fn listing(title: &str, price: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><h1>{}</h1><span class="price">{}</span></body></html>"#,
            title, price
        ))
    }

    #[tokio::test]
    async fn test_harvest_dealer_extracts_listings_and_skips_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/used-vehicles">Shop Used</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vehicle/1"))
            .respond_with(listing("2019 Toyota Camry LE", "$21,500"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vehicle/2"))
            .respond_with(listing("2020 Chevy Silverado 1500", "$34,900"))
            .mount(&server)
            .await;

        let entry = DealerEntry {
            dealer: DealerInfo::new("Peach State Auto", server.uri()),
            listings: vec![
                format!("{}/vehicle/1", server.uri()),
                format!("{}/vehicle/missing", server.uri()),
                format!("{}/vehicle/2", server.uri()),
            ],
        };

        let harvester = test_harvester();
        let (outcome, vehicles) = harvester.harvest_dealer(&entry).await;

        assert_eq!(
            outcome.inventory_url,
            Some(format!("{}/used-vehicles", server.uri()))
        );
        assert_eq!(outcome.listings_attempted, 3);
        assert_eq!(outcome.vehicles_extracted, 2);
        assert_eq!(outcome.listings_skipped, 1);

        assert_eq!(vehicles[0].make, "Toyota");
        assert_eq!(vehicles[0].price, 21500.0);
        assert_eq!(vehicles[1].make, "Chevrolet");
        assert_eq!(vehicles[1].model, "Silverado 1500");
    }

    #[tokio::test]
    async fn test_unreachable_dealer_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let plan = HarvestPlan {
            dealers: vec![DealerEntry {
                dealer: DealerInfo::new("Down Motors", server.uri()),
                listings: vec![format!("{}/vehicle/1", server.uri())],
            }],
        };

        let report = test_harvester().harvest(&plan).await;

        assert!(report.vehicles.is_empty());
        assert_eq!(report.outcomes[0].listings_attempted, 0);
        assert_eq!(report.dealers.len(), 1);
        assert!(!report.dealers[0].is_active);
    }
}
