//! # Store Configuration
//!
//! Runtime configuration for one store. Defaults match a Philippine
//! sari-sari store: 12% VAT, peso display handled by `sari_core::Money`.

use serde::{Deserialize, Serialize};

use sari_core::money::TaxRate;
use sari_core::validation::validate_tax_rate_bps;
use sari_core::{ValidationError, VAT_RATE_BPS};

/// Per-store engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Display name used in notification copy.
    pub store_name: String,

    /// Tax rate in basis points (1200 = 12% VAT).
    pub tax_rate_bps: u32,

    /// Default page size for recent sale listings.
    pub recent_sales_limit: u32,

    /// Default page size for notification feeds.
    pub notification_limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            store_name: "Sari POS".to_string(),
            tax_rate_bps: VAT_RATE_BPS,
            recent_sales_limit: 50,
            notification_limit: 50,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with the given store name and defaults
    /// for everything else.
    pub fn new(store_name: impl Into<String>) -> Self {
        StoreConfig {
            store_name: store_name.into(),
            ..StoreConfig::default()
        }
    }

    /// Sets the tax rate, rejecting rates above 100%.
    pub fn with_tax_rate_bps(mut self, bps: u32) -> Result<Self, ValidationError> {
        validate_tax_rate_bps(bps)?;
        self.tax_rate_bps = bps;
        Ok(self)
    }

    /// The tax rate as a typed value for money math.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}
