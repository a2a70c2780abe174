use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::str::FromStr;

use crate::models::{DealerRecord, VehicleRecord};

const VEHICLE_COLUMNS: &str = "id, dealer_id, dealer_name, dealer_city, dealer_state, dealer_phone,
     source_url, scraped_at, created_at, updated_at, status, condition,
     year, make, model, price, mileage, images";

const DEALER_COLUMNS: &str =
    "id, name, city, state, phone, url, inventory_url, is_active, vehicle_count, created_at";

/// SQLite storage for harvested vehicles and dealer metadata
pub struct VehicleStore {
    conn: Connection,
}

impl VehicleStore {
    /// Open (or create) a database file and initialize schema
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open database connection")?;

        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;

        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS vehicles (
                id TEXT PRIMARY KEY,
                dealer_id TEXT NOT NULL,
                dealer_name TEXT NOT NULL,
                dealer_city TEXT NOT NULL,
                dealer_state TEXT NOT NULL,
                dealer_phone TEXT NOT NULL,
                source_url TEXT NOT NULL,
                scraped_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                status TEXT NOT NULL,
                condition TEXT NOT NULL,
                year INTEGER NOT NULL,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                price REAL NOT NULL,
                mileage INTEGER NOT NULL,
                images TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS idx_vehicles_dealer ON vehicles(dealer_id);
            CREATE INDEX IF NOT EXISTS idx_vehicles_make ON vehicles(make, model);

            CREATE TABLE IF NOT EXISTS dealers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                phone TEXT NOT NULL,
                url TEXT NOT NULL,
                inventory_url TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                vehicle_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );",
        )?;

        Ok(())
    }

    /// Drop every stored vehicle and write `vehicles` in their place
    pub fn replace_vehicles(&mut self, vehicles: &[VehicleRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM vehicles", [])?;
        let written = insert_vehicles(&tx, vehicles)?;
        tx.commit().context("Failed to commit vehicle replacement")?;

        log::info!("Replaced vehicle table with {} records", written);
        Ok(written)
    }

    /// Insert or overwrite vehicles by id
    pub fn upsert_vehicles(&mut self, vehicles: &[VehicleRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let written = insert_vehicles(&tx, vehicles)?;
        tx.commit().context("Failed to commit vehicle upsert")?;
        Ok(written)
    }

    /// Insert or overwrite dealers, keyed by name
    pub fn upsert_dealers(&mut self, dealers: &[DealerRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO dealers ({DEALER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(name) DO UPDATE SET
                    city = excluded.city,
                    state = excluded.state,
                    phone = excluded.phone,
                    url = excluded.url,
                    inventory_url = excluded.inventory_url,
                    is_active = excluded.is_active,
                    vehicle_count = excluded.vehicle_count"
            ))?;

            for dealer in dealers {
                stmt.execute(params![
                    dealer.id,
                    dealer.name,
                    dealer.city,
                    dealer.state,
                    dealer.phone,
                    dealer.url,
                    dealer.inventory_url,
                    dealer.is_active,
                    dealer.vehicle_count,
                    dealer.created_at,
                ])?;
            }
        }
        tx.commit().context("Failed to commit dealer upsert")?;

        Ok(dealers.len())
    }

    pub fn get_vehicle(&self, id: &str) -> Result<Option<VehicleRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = ?1"))?;

        let vehicle = stmt.query_row([id], vehicle_from_row).optional()?;
        Ok(vehicle)
    }

    /// All vehicles, grouped by dealer
    pub fn list_vehicles(&self) -> Result<Vec<VehicleRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY dealer_name, source_url"
        ))?;

        let vehicles = stmt
            .query_map([], vehicle_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    pub fn list_dealers(&self) -> Result<Vec<DealerRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DEALER_COLUMNS} FROM dealers ORDER BY name"))?;

        let dealers = stmt
            .query_map([], |row| {
                Ok(DealerRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    city: row.get(2)?,
                    state: row.get(3)?,
                    phone: row.get(4)?,
                    url: row.get(5)?,
                    inventory_url: row.get(6)?,
                    is_active: row.get(7)?,
                    vehicle_count: row.get(8)?,
                    created_at: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dealers)
    }

    pub fn count_vehicles(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vehicles", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn insert_vehicles(conn: &Connection, vehicles: &[VehicleRecord]) -> Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "INSERT OR REPLACE INTO vehicles ({VEHICLE_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
    ))?;

    for vehicle in vehicles {
        let images = serde_json::to_string(&vehicle.images)?;
        stmt.execute(params![
            vehicle.id,
            vehicle.dealer_id,
            vehicle.dealer_name,
            vehicle.dealer_city,
            vehicle.dealer_state,
            vehicle.dealer_phone,
            vehicle.source_url,
            vehicle.scraped_at,
            vehicle.created_at,
            vehicle.updated_at,
            vehicle.status.to_string(),
            vehicle.condition.to_string(),
            vehicle.year,
            vehicle.make,
            vehicle.model,
            vehicle.price,
            vehicle.mileage,
            images,
        ])
        .with_context(|| format!("Failed to store vehicle {}", vehicle.source_url))?;
    }

    Ok(vehicles.len())
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<VehicleRecord> {
    let images: String = row.get(17)?;

    Ok(VehicleRecord {
        id: row.get(0)?,
        dealer_id: row.get(1)?,
        dealer_name: row.get(2)?,
        dealer_city: row.get(3)?,
        dealer_state: row.get(4)?,
        dealer_phone: row.get(5)?,
        source_url: row.get(6)?,
        scraped_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        status: parse_column(row, 10)?,
        condition: parse_column(row, 11)?,
        year: row.get(12)?,
        make: row.get(13)?,
        model: row.get(14)?,
        price: row.get(15)?,
        mileage: row.get(16)?,
        images: serde_json::from_str(&images).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(17, Type::Text, Box::new(e))
        })?,
    })
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}
