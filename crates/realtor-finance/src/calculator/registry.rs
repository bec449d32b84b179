//! Read-only reference tables: provincial stamp-duty defaults and bank mortgage rates.
//!
//! The registry is assembled once during startup (built-in tables, optionally replaced by a
//! CSV export of bank rates) and then shared behind an `Arc`. Nothing in this module mutates a
//! registry after construction.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RegistryConfig;

/// A taxing jurisdiction with its default stamp-duty (sellos) rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub key: String,
    pub name: String,
    pub default_stamp_rate: f64,
}

/// Published nominal annual mortgage rate (TNA) for one lender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRate {
    pub bank: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_term_years: Option<u32>,
}

const PROVINCES: &[(&str, &str, f64)] = &[
    ("caba", "Ciudad Autónoma de Buenos Aires", 2.7),
    ("buenosaires", "Buenos Aires", 2.0),
    ("catamarca", "Catamarca", 1.5),
    ("chaco", "Chaco", 1.5),
    ("chubut", "Chubut", 1.0),
    ("cordoba", "Córdoba", 1.5),
    ("corrientes", "Corrientes", 1.5),
    ("entrerios", "Entre Ríos", 1.0),
    ("formosa", "Formosa", 1.2),
    ("jujuy", "Jujuy", 1.5),
    ("lapampa", "La Pampa", 1.0),
    ("larioja", "La Rioja", 1.0),
    ("mendoza", "Mendoza", 1.5),
    ("misiones", "Misiones", 1.5),
    ("neuquen", "Neuquén", 1.4),
    ("rionegro", "Río Negro", 1.0),
    ("salta", "Salta", 1.25),
    ("sanjuan", "San Juan", 1.0),
    ("sanluis", "San Luis", 1.2),
    ("santacruz", "Santa Cruz", 1.0),
    ("santafe", "Santa Fe", 1.2),
    ("santiagodelestero", "Santiago del Estero", 1.5),
    ("tierradelfuego", "Tierra del Fuego", 1.0),
    ("tucuman", "Tucumán", 1.5),
];

const BANK_RATES: &[(&str, f64, Option<u32>)] = &[
    ("Banco Nación", 4.5, Some(30)),
    ("Banco Ciudad", 4.75, Some(30)),
    ("Banco Provincia", 4.5, Some(30)),
    ("Banco Hipotecario", 4.25, Some(20)),
    ("Santander", 8.5, Some(30)),
    ("BBVA", 7.5, Some(20)),
    ("Galicia", 9.0, Some(20)),
    ("Macro", 7.0, Some(20)),
    ("ICBC", 6.5, Some(20)),
    ("Supervielle", 8.0, Some(15)),
];

/// Immutable lookup tables consulted by the commission pipeline and amortization engine.
#[derive(Debug, Clone)]
pub struct RateRegistry {
    provinces: Vec<Province>,
    province_index: HashMap<String, usize>,
    bank_rates: Vec<BankRate>,
    bank_index: HashMap<String, usize>,
}

impl Default for RateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RateRegistry {
    /// Registry seeded from the tables compiled into the binary.
    pub fn builtin() -> Self {
        let provinces = PROVINCES
            .iter()
            .map(|(key, name, rate)| Province {
                key: (*key).to_string(),
                name: (*name).to_string(),
                default_stamp_rate: *rate,
            })
            .collect();
        let bank_rates = BANK_RATES
            .iter()
            .map(|(bank, rate, max_term_years)| BankRate {
                bank: (*bank).to_string(),
                rate: *rate,
                max_term_years: *max_term_years,
            })
            .collect();

        Self::new(provinces, bank_rates)
    }

    pub fn new(mut provinces: Vec<Province>, mut bank_rates: Vec<BankRate>) -> Self {
        provinces.sort_by(|a, b| a.name.cmp(&b.name));
        bank_rates.sort_by(|a, b| a.rate.total_cmp(&b.rate).then_with(|| a.bank.cmp(&b.bank)));

        let province_index = provinces
            .iter()
            .enumerate()
            .map(|(idx, province)| (normalize_key(&province.key), idx))
            .collect();
        let bank_index = bank_rates
            .iter()
            .enumerate()
            .map(|(idx, rate)| (normalize_bank(&rate.bank), idx))
            .collect();

        Self {
            provinces,
            province_index,
            bank_rates,
            bank_index,
        }
    }

    /// Build the startup registry, replacing the bank table when a CSV export is configured.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let registry = Self::builtin();
        match &config.bank_rates_csv {
            Some(path) => registry.with_bank_rates_csv_path(path),
            None => Ok(registry),
        }
    }

    pub fn with_bank_rates_csv_path<P: AsRef<Path>>(self, path: P) -> Result<Self, RegistryError> {
        let file = std::fs::File::open(path.as_ref())?;
        let registry = self.with_bank_rates_csv(file)?;
        info!(
            path = %path.as_ref().display(),
            banks = registry.bank_rates.len(),
            "loaded bank rate table"
        );
        Ok(registry)
    }

    /// Replace the bank table with rows from a `Bank,Rate,Max Term Years` export.
    pub fn with_bank_rates_csv<R: Read>(self, reader: R) -> Result<Self, RegistryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut bank_rates = Vec::new();
        let mut seen = HashSet::new();

        for (idx, record) in csv_reader.deserialize::<BankRateRow>().enumerate() {
            let row = record?;
            // header is line 1
            let line = idx + 2;
            if row.bank.is_empty() {
                return Err(RegistryError::InvalidRow {
                    line,
                    message: "bank name is blank".to_string(),
                });
            }
            if !row.rate.is_finite() || !(0.0..=100.0).contains(&row.rate) {
                return Err(RegistryError::InvalidRow {
                    line,
                    message: format!("rate {} is outside 0..=100", row.rate),
                });
            }
            if row.max_term_years == Some(0) {
                return Err(RegistryError::InvalidRow {
                    line,
                    message: "max term must be positive".to_string(),
                });
            }
            if !seen.insert(normalize_bank(&row.bank)) {
                return Err(RegistryError::InvalidRow {
                    line,
                    message: format!("bank '{}' is listed more than once", row.bank),
                });
            }
            bank_rates.push(BankRate {
                bank: row.bank,
                rate: row.rate,
                max_term_years: row.max_term_years,
            });
        }

        Ok(Self::new(self.provinces, bank_rates))
    }

    /// Case-insensitive province lookup; `None` means "use the global default".
    pub fn province_by_key(&self, key: &str) -> Option<&Province> {
        self.province_index
            .get(&normalize_key(key))
            .map(|idx| &self.provinces[*idx])
    }

    pub fn bank_rate_by_name(&self, name: &str) -> Option<&BankRate> {
        self.bank_index
            .get(&normalize_bank(name))
            .map(|idx| &self.bank_rates[*idx])
    }

    /// Provinces ordered by display name.
    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    /// Bank rates ordered from cheapest to most expensive.
    pub fn bank_rates(&self) -> &[BankRate] {
        &self.bank_rates
    }
}

fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn normalize_bank(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Deserialize)]
struct BankRateRow {
    #[serde(rename = "Bank")]
    bank: String,
    #[serde(rename = "Rate")]
    rate: f64,
    #[serde(rename = "Max Term Years", default)]
    max_term_years: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read bank rate export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bank rate CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid bank rate on line {line}: {message}")]
    InvalidRow { line: usize, message: String },
}
