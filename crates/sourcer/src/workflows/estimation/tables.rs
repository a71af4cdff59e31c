use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::domain::{Condition, PropertyType};
use super::repairs::Trade;

const MARKET_FILE: &str = "market_data.json";
const ZIP_COST_FILE: &str = "zip_costs.json";
const COMP_POOL_FILE: &str = "comp_pool.json";

const BUNDLED_MARKETS: &str = include_str!("../../../data/market_data.json");
const BUNDLED_ZIP_COSTS: &str = include_str!("../../../data/zip_costs.json");
const BUNDLED_COMP_POOL: &str = include_str!("../../../data/comp_pool.json");

/// Localized valuation assumptions for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketProfile {
    /// Market key; filled from the table key when loaded.
    #[serde(default)]
    pub name: String,
    pub price_per_sqft_turnkey: f64,
    pub condition_adjustment: BTreeMap<Condition, f64>,
    pub property_type_adjustment: BTreeMap<PropertyType, f64>,
    pub renovation_cost_per_sqft: BTreeMap<Condition, f64>,
    pub closing_cost_rate: f64,
    pub holding_cost_rate: f64,
    pub wholesale_fee_rate: f64,
    pub holding_months: f64,
    pub demand_index: f64,
}

impl MarketProfile {
    /// Text before the first comma, e.g. `"Austin"` for `"Austin, TX"`.
    pub fn name_prefix(&self) -> &str {
        self.name.split(',').next().unwrap_or_default().trim()
    }
}

/// Contractor pricing and turnover stats for one postal code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipCostProfile {
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub labor_rates: BTreeMap<Trade, f64>,
    #[serde(default)]
    pub material_rates: BTreeMap<Trade, f64>,
    pub dom_days: f64,
    pub discount_rate: f64,
    pub absorption_rate: f64,
    pub source: String,
}

/// Raw comparable sale as stored in the comp pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompSeed {
    pub address: String,
    pub postal_code: String,
    pub sold_price: f64,
    /// `YYYY-MM-DD`; parsed when comps are built.
    pub sold_date: String,
    pub square_feet: f64,
    pub beds: f64,
    pub baths: f64,
    pub distance_miles: f64,
    pub dom: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TableLoadError {
    #[error("failed to read lookup table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lookup table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only lookup tables the engine resolves against.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub markets: BTreeMap<String, MarketProfile>,
    pub zip_costs: BTreeMap<String, ZipCostProfile>,
    pub comp_pools: BTreeMap<String, Vec<CompSeed>>,
}

impl LookupTables {
    pub fn new(
        markets: BTreeMap<String, MarketProfile>,
        zip_costs: BTreeMap<String, ZipCostProfile>,
        comp_pools: BTreeMap<String, Vec<CompSeed>>,
    ) -> Self {
        let mut tables = Self {
            markets,
            zip_costs,
            comp_pools,
        };
        tables.fill_keys();
        tables
    }

    /// Tables compiled into the crate from `data/`.
    pub fn bundled() -> Result<Self, TableLoadError> {
        let markets = parse_table(BUNDLED_MARKETS, Path::new(MARKET_FILE))?;
        let zip_costs = parse_table(BUNDLED_ZIP_COSTS, Path::new(ZIP_COST_FILE))?;
        let comp_pools = parse_table(BUNDLED_COMP_POOL, Path::new(COMP_POOL_FILE))?;
        Ok(Self::new(markets, zip_costs, comp_pools))
    }

    /// Loads `market_data.json`, `zip_costs.json` and `comp_pool.json` from `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, TableLoadError> {
        let dir = dir.as_ref();
        let markets = read_table(&dir.join(MARKET_FILE))?;
        let zip_costs = read_table(&dir.join(ZIP_COST_FILE))?;
        let comp_pools = read_table(&dir.join(COMP_POOL_FILE))?;
        let tables = Self::new(markets, zip_costs, comp_pools);
        debug!(
            dir = %dir.display(),
            markets = tables.markets.len(),
            zip_profiles = tables.zip_costs.len(),
            "lookup tables loaded"
        );
        Ok(tables)
    }

    fn fill_keys(&mut self) {
        for (name, profile) in &mut self.markets {
            profile.name = name.clone();
        }
        for (postal_code, profile) in &mut self.zip_costs {
            profile.postal_code = postal_code.clone();
        }
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<T, TableLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TableLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&raw, path)
}

fn parse_table<T: DeserializeOwned>(raw: &str, path: &Path) -> Result<T, TableLoadError> {
    serde_json::from_str(raw).map_err(|source| TableLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
