//! Aggregation engine

use crate::dataset::{Dataset, GameRecord, Region, RegionalSales};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::FilterQuery;

/// Maximum number of entries in [`AggregateReport::top_platforms`]
pub const TOP_PLATFORMS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_sales: f64,
    pub total_videogames: usize,
    pub total_platforms: usize,
    /// Mean over rows with a score, 0.0 when there are none
    pub avg_critic_score: f64,
    pub avg_user_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSales {
    pub platform: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: Region,
    pub sales: f64,
}

/// One (year, region) cell of the long-form sales table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub year: i32,
    pub region: Region,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// No row passed the filter. Not an error.
    pub empty_result: bool,
    pub kpis: Kpis,
    pub top_platforms: Vec<PlatformSales>,
    pub regional_split: Vec<RegionTotal>,
    /// Yearly sales over the whole dataset, ignoring the filter
    pub time_series: Vec<TimeSeriesPoint>,
}

/// Aggregate the rows selected by `filter`.
pub fn aggregate(dataset: &Dataset, filter: &FilterQuery) -> AggregateReport {
    let selected: Vec<&GameRecord> = dataset
        .records()
        .iter()
        .filter(|r| filter.matches(&r.genre, r.year_of_release))
        .collect();

    debug!(
        genres = filter.genres.len(),
        start = filter.start,
        end = filter.end,
        matched = selected.len(),
        "Aggregating"
    );

    AggregateReport {
        empty_result: selected.is_empty(),
        kpis: kpis(&selected),
        top_platforms: top_platforms(&selected),
        regional_split: regional_split(&selected),
        time_series: time_series(dataset.records()),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn kpis(rows: &[&GameRecord]) -> Kpis {
    let platforms: HashSet<&str> = rows.iter().map(|r| r.platform.as_str()).collect();
    Kpis {
        total_sales: rows.iter().map(|r| r.total_sales()).sum(),
        total_videogames: rows.len(),
        total_platforms: platforms.len(),
        avg_critic_score: mean(rows.iter().filter_map(|r| r.critic_score)),
        avg_user_score: mean(rows.iter().filter_map(|r| r.user_score)),
    }
}

/// Ties keep the order in which platforms first appear among the filtered
/// rows, not alphabetical order.
fn top_platforms(rows: &[&GameRecord]) -> Vec<PlatformSales> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<PlatformSales> = Vec::new();

    for row in rows {
        let idx = *position.entry(row.platform.as_str()).or_insert_with(|| {
            totals.push(PlatformSales {
                platform: row.platform.clone(),
                total_sales: 0.0,
            });
            totals.len() - 1
        });
        totals[idx].total_sales += row.total_sales();
    }

    totals.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    totals.truncate(TOP_PLATFORMS);
    totals
}

fn regional_split(rows: &[&GameRecord]) -> Vec<RegionTotal> {
    let mut sum = RegionalSales::default();
    for row in rows {
        sum.add(&row.sales);
    }
    Region::ALL
        .iter()
        .map(|&region| RegionTotal {
            region,
            sales: sum.get(region),
        })
        .collect()
}

/// Region-major, years ascending within each region.
fn time_series(records: &[GameRecord]) -> Vec<TimeSeriesPoint> {
    let mut by_year: BTreeMap<i32, RegionalSales> = BTreeMap::new();
    for record in records {
        by_year
            .entry(record.year_of_release)
            .or_default()
            .add(&record.sales);
    }

    Region::ALL
        .iter()
        .flat_map(|&region| {
            by_year.iter().map(move |(&year, sales)| TimeSeriesPoint {
                year,
                region,
                sales: sales.get(region),
            })
        })
        .collect()
}
