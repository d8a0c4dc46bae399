//! Filter catalog

use crate::dataset::{Dataset, GameRecord};
use crate::error::{Result, VgSalesError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sorted distinct values of each categorical column plus the year range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub ratings: Vec<String>,
    pub gen_platforms: Vec<String>,
    pub user_score_classes: Vec<String>,
    pub min_year: i32,
    pub max_year: i32,
}

fn distinct(records: &[GameRecord], field: impl Fn(&GameRecord) -> &str) -> Vec<String> {
    records
        .iter()
        .map(field)
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Build the catalog over the full dataset. Fails with [`VgSalesError::NoData`]
/// when there is nothing to describe.
pub fn filter_options(dataset: &Dataset) -> Result<FilterOptions> {
    let records = dataset.records();
    let years = records.iter().map(|r| r.year_of_release);
    let (min_year, max_year) = match (years.clone().min(), years.max()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(VgSalesError::NoData),
    };

    Ok(FilterOptions {
        genres: distinct(records, |r| r.genre.as_str()),
        platforms: distinct(records, |r| r.platform.as_str()),
        ratings: distinct(records, |r| r.rating_esrb.as_str()),
        gen_platforms: distinct(records, |r| r.gen_platform.as_str()),
        user_score_classes: distinct(records, |r| r.classification_user_score.as_str()),
        min_year,
        max_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RegionalSales;

    #[test]
    fn test_sorted_distinct_values() {
        let dataset = Dataset::from_records(vec![
            GameRecord::new("Wii", "Sports", 2006, RegionalSales::new(41.4, 29.0, 3.8, 8.5))
                .with_rating("E")
                .with_scores(Some(76.0), Some(8.0)),
            GameRecord::new("PS4", "Action", 2015, RegionalSales::new(1.0, 2.0, 0.1, 0.5))
                .with_rating("M")
                .with_scores(Some(90.0), Some(8.7)),
            GameRecord::new("Wii", "Action", 1998, RegionalSales::new(0.5, 0.1, 0.0, 0.0))
                .with_rating("E"),
        ]);

        let options = filter_options(&dataset).unwrap();
        assert_eq!(options.genres, vec!["Action", "Sports"]);
        assert_eq!(options.platforms, vec!["PS4", "Wii"]);
        assert_eq!(options.ratings, vec!["E", "M"]);
        assert_eq!(options.gen_platforms, vec!["7ª Gen", "8ª Gen"]);
        assert_eq!(options.user_score_classes, vec!["Excellent", "Good", "Without score"]);
        assert_eq!((options.min_year, options.max_year), (1998, 2015));
    }

    #[test]
    fn test_empty_dataset_is_no_data() {
        let dataset = Dataset::from_records(Vec::new());
        assert!(matches!(filter_options(&dataset), Err(VgSalesError::NoData)));
    }

    #[test]
    fn test_json_keys() {
        let dataset = Dataset::from_records(vec![GameRecord::new(
            "PC",
            "Strategy",
            2001,
            RegionalSales::new(0.0, 0.1, 0.0, 0.0),
        )]);
        let json = serde_json::to_value(filter_options(&dataset).unwrap()).unwrap();
        assert_eq!(json["genPlatforms"][0], "PC");
        assert_eq!(json["userScoreClasses"][0], "Without score");
        assert_eq!(json["minYear"], 2001);
        assert!(json["ratings"].as_array().unwrap().is_empty());
    }
}
