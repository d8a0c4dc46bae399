//! In-memory video-game sales table
//!
//! The table is loaded once at startup and never written back. Each row is a
//! typed [`GameRecord`]; `total_sales` is derived from the four regional
//! figures so it can never drift from their sum.

pub mod features;
mod loader;

pub use features::{classify_user_score, derive_features, platform_generation};
pub use loader::DatasetLoader;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sales region, in the fixed reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "Europe")]
    Europe,
    #[serde(rename = "Japan")]
    Japan,
    #[serde(rename = "Other")]
    Other,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::NorthAmerica, Region::Europe, Region::Japan, Region::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Japan => "Japan",
            Region::Other => "Other",
        }
    }

    /// Source column holding this region's sales
    pub fn column(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "na_sales",
            Region::Europe => "eu_sales",
            Region::Japan => "jp_sales",
            Region::Other => "other_sales",
        }
    }
}

/// Regional sales in millions of units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalSales {
    pub na: f64,
    pub eu: f64,
    pub jp: f64,
    pub other: f64,
}

impl RegionalSales {
    pub fn new(na: f64, eu: f64, jp: f64, other: f64) -> Self {
        Self { na, eu, jp, other }
    }

    pub fn get(&self, region: Region) -> f64 {
        match region {
            Region::NorthAmerica => self.na,
            Region::Europe => self.eu,
            Region::Japan => self.jp,
            Region::Other => self.other,
        }
    }

    pub fn total(&self) -> f64 {
        self.na + self.eu + self.jp + self.other
    }

    /// Component-wise sum
    pub fn add(&mut self, other: &RegionalSales) {
        self.na += other.na;
        self.eu += other.eu;
        self.jp += other.jp;
        self.other += other.other;
    }
}

/// One row of the games table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub videogame_name: Option<String>,
    pub platform: String,
    pub genre: String,
    pub rating_esrb: String,
    pub gen_platform: String,
    pub classification_user_score: String,
    pub year_of_release: i32,
    pub critic_score: Option<f64>,
    pub user_score: Option<f64>,
    pub sales: RegionalSales,
}

impl GameRecord {
    /// Create a record, deriving `gen_platform` and `classification_user_score`.
    pub fn new(
        platform: impl Into<String>,
        genre: impl Into<String>,
        year_of_release: i32,
        sales: RegionalSales,
    ) -> Self {
        let platform = platform.into();
        Self {
            videogame_name: None,
            gen_platform: platform_generation(&platform).to_string(),
            classification_user_score: classify_user_score(None).to_string(),
            platform,
            genre: genre.into(),
            rating_esrb: String::new(),
            year_of_release,
            critic_score: None,
            user_score: None,
            sales,
        }
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating_esrb = rating.into();
        self
    }

    /// Set critic (0-100) and user (0-10) scores; re-derives the user score class.
    pub fn with_scores(mut self, critic_score: Option<f64>, user_score: Option<f64>) -> Self {
        self.critic_score = critic_score;
        self.user_score = user_score;
        self.classification_user_score = classify_user_score(user_score).to_string();
        self
    }

    /// Sum of the four regional sales figures
    pub fn total_sales(&self) -> f64 {
        self.sales.total()
    }
}

/// Immutable games table
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<GameRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<GameRecord>) -> Self {
        Self { records }
    }

    /// Load the table from a CSV or Parquet file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        DatasetLoader::new().load(path)
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
