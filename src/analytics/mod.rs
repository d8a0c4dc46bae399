//! Dashboard analytics over the loaded dataset
//!
//! - [`aggregate`]: KPIs, top platforms, regional split and yearly sales
//! - [`filter_options`]: distinct values that drive the dashboard filters
//!
//! Both are pure functions of an immutable [`Dataset`](crate::dataset::Dataset).

mod aggregate;
mod catalog;

pub use aggregate::{
    aggregate, AggregateReport, Kpis, PlatformSales, RegionTotal, TimeSeriesPoint, TOP_PLATFORMS,
};
pub use catalog::{filter_options, FilterOptions};

use crate::error::{Result, VgSalesError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_START_YEAR: i32 = 1980;
pub const DEFAULT_END_YEAR: i32 = 2016;

/// Genre and release-year window applied before aggregating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Selected genres. An empty selection matches no rows.
    pub genres: Vec<String>,
    /// First release year, inclusive
    pub start: i32,
    /// Last release year, inclusive
    pub end: i32,
}

impl Default for FilterQuery {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            start: DEFAULT_START_YEAR,
            end: DEFAULT_END_YEAR,
        }
    }
}

impl FilterQuery {
    pub fn new(genres: Vec<String>, start: i32, end: i32) -> Self {
        Self { genres, start, end }
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(VgSalesError::Validation(format!(
                "start year {} is after end year {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Whether a row with this genre and year passes the filter.
    pub fn matches(&self, genre: &str, year: i32) -> bool {
        (self.start..=self.end).contains(&year) && self.genres.iter().any(|g| g == genre)
    }
}
