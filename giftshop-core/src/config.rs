// giftshop-core/src/config.rs

use chrono::Duration;

use crate::Error;

const MAX_IMMEDIATE_START_HOURS: i64 = 24;

/// Runtime knobs shared by the services. The server builds this from its CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopConfig {
    /// Ceiling for the sum of active roulette drop chances, in percent.
    pub max_total_drop_chance: f64,
    /// A task scheduled to start within this window is treated as immediate.
    pub immediate_start_window: Duration,
    /// Result cap for the admin gift picker.
    pub search_limit: i64,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            max_total_drop_chance: 100.0,
            immediate_start_window: Duration::seconds(30),
            search_limit: 20,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ShopConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.max_total_drop_chance.is_finite() || self.max_total_drop_chance <= 0.0 {
            return Err(Error::Config(format!(
                "max_total_drop_chance must be a positive number, got {}",
                self.max_total_drop_chance
            )));
        }
        if self.immediate_start_window < Duration::zero() {
            return Err(Error::Config("immediate_start_window must not be negative".into()));
        }
        if self.immediate_start_window > Duration::hours(MAX_IMMEDIATE_START_HOURS) {
            return Err(Error::Config(format!(
                "immediate_start_window must be at most {MAX_IMMEDIATE_START_HOURS}h"
            )));
        }
        if self.search_limit < 1 {
            return Err(Error::Config("search_limit must be at least 1".into()));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(Error::Config(format!(
                "default_page_size must be within 1..={}",
                self.max_page_size
            )));
        }
        Ok(())
    }

    /// Clamps a requested page size into `1..=max_page_size`; `None` picks the default.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}
