use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dealer_scraper::{
    DealerInfo, ExtractOptions, HarvestPlan, Harvester, HttpClient, InventoryLocator,
    ScraperConfig, VehicleExtractor, VehicleStore, api,
};

#[derive(Parser)]
#[command(name = "dealer-scraper", version, about = "Dealer website inventory scraper")]
struct Cli {
    /// Scraper config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the health check service
    Serve {
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Find the inventory page on a dealer site
    Locate { url: String },
    /// Extract one vehicle detail page as JSON
    Extract {
        url: String,
        #[arg(long)]
        dealer_name: String,
        #[arg(long)]
        dealer_city: Option<String>,
        #[arg(long)]
        dealer_state: Option<String>,
        #[arg(long)]
        dealer_phone: Option<String>,
    },
    /// Harvest every dealer in a plan file and store the results
    Run {
        #[arg(long)]
        plan: PathBuf,
        #[arg(long, default_value = "vehicles.db")]
        db: PathBuf,
        /// Keep previously stored vehicles instead of replacing them
        #[arg(long)]
        append: bool,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };

    match cli.command {
        Command::Serve { host, port } => {
            api::serve(&host, port).await.context("Health service failed")?;
        }
        Command::Locate { url } => {
            let client = HttpClient::new(&config)?;
            match InventoryLocator::new(&client).locate(&url).await {
                Some(inventory) => println!("{}", inventory),
                None => anyhow::bail!("Could not fetch {}", url),
            }
        }
        Command::Extract {
            url,
            dealer_name,
            dealer_city,
            dealer_state,
            dealer_phone,
        } => {
            let dealer = DealerInfo {
                name: dealer_name,
                url: url.clone(),
                city: dealer_city,
                state: dealer_state,
                phone: dealer_phone,
            };

            let client = HttpClient::new(&config)?;
            let extractor = VehicleExtractor::new(&client, ExtractOptions::from(&config));
            match extractor.extract(&url, &dealer).await {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => anyhow::bail!("Could not fetch {}", url),
            }
        }
        Command::Run { plan, db, append } => {
            let plan = HarvestPlan::from_file(&plan)?;
            log::info!("Loaded plan with {} dealers", plan.dealers.len());

            let report = {
                let harvester = Harvester::new(&config)?;
                harvester.harvest(&plan).await
            };

            let mut store = VehicleStore::open(&db)?;
            store.upsert_dealers(&report.dealers)?;
            let written = if append {
                store.upsert_vehicles(&report.vehicles)?
            } else {
                store.replace_vehicles(&report.vehicles)?
            };

            println!(
                "Stored {} vehicles from {} dealers in {} ({} listings skipped)",
                written,
                report.dealers.len(),
                db.display(),
                report.total_skipped()
            );
        }
    }

    Ok(())
}
