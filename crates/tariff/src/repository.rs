use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::error::Error;
use crate::table::{DEFAULT_REGION, TariffTable};

/// Tariff tables by region code.
///
/// Built-in tables are always present and cannot be replaced or removed.
/// [`resolve`](Self::resolve) never fails: unknown codes and invalid tables
/// fall back to the default region, and if that is unusable too, to the
/// built-in Seoul table.
#[derive(Debug, Clone)]
pub struct TariffRepository {
    default_region: String,
    built_in: BTreeMap<String, TariffTable>,
    custom: BTreeMap<String, TariffTable>,
    fallback: TariffTable,
}

impl Default for TariffRepository {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl TariffRepository {
    #[must_use]
    pub fn new(default_region: impl Into<String>) -> Self {
        let built_in =
            TariffTable::built_in().into_iter().map(|table| (table.code.clone(), table)).collect();
        Self {
            default_region: default_region.into(),
            built_in,
            custom: BTreeMap::new(),
            fallback: TariffTable::seoul(),
        }
    }

    #[must_use]
    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&TariffTable> {
        self.custom.get(code).or_else(|| self.built_in.get(code))
    }

    #[must_use]
    pub fn is_built_in(&self, code: &str) -> bool {
        self.built_in.contains_key(code)
    }

    /// All tables, built-in first.
    pub fn tables(&self) -> impl Iterator<Item = &TariffTable> {
        self.built_in.values().chain(self.custom.values())
    }

    /// Adds or replaces a user table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BuiltIn`] for a built-in code and
    /// [`Error::InvalidTable`] when the table fails validation.
    pub fn insert(&mut self, table: TariffTable) -> Result<(), Error> {
        if self.is_built_in(&table.code) {
            return Err(Error::BuiltIn(table.code));
        }
        let table = table.validated()?;
        debug!(code = %table.code, "tariff table stored");
        self.custom.insert(table.code.clone(), table);
        Ok(())
    }

    /// Removes a user table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BuiltIn`] for a built-in code and
    /// [`Error::UnknownRegion`] when no user table has that code.
    pub fn remove(&mut self, code: &str) -> Result<TariffTable, Error> {
        if self.is_built_in(code) {
            return Err(Error::BuiltIn(code.to_string()));
        }
        self.custom.remove(code).ok_or_else(|| Error::UnknownRegion(code.to_string()))
    }

    /// Loads a JSON array of user tables, returning how many were stored.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON cannot be decoded or any table is
    /// rejected by [`insert`](Self::insert). Tables before the failing one
    /// stay stored.
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let tables: Vec<TariffTable> =
            serde_json::from_str(json).map_err(Error::from).context("decoding tariff tables")?;

        let count = tables.len();
        for table in tables {
            let code = table.code.clone();
            self.insert(table).with_context(|| format!("storing tariff table {code}"))?;
        }
        Ok(count)
    }

    /// Table for `code`, falling back to the default region.
    #[must_use]
    pub fn resolve(&self, code: &str) -> &TariffTable {
        if let Some(table) = self.usable(code) {
            return table;
        }
        warn!(code = %code, default_region = %self.default_region, "tariff table unavailable, using default region");

        self.usable(&self.default_region).unwrap_or(&self.fallback)
    }

    fn usable(&self, code: &str) -> Option<&TariffTable> {
        self.get(code).filter(|table| table.is_valid())
    }
}
