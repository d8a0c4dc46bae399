//! Integration test: aggregation properties over a polars-loaded dataset

use polars::prelude::*;
use vgsales::analytics::{aggregate, filter_options, FilterQuery, TOP_PLATFORMS};
use vgsales::dataset::{Dataset, DatasetLoader, Region};

fn sample_frame() -> DataFrame {
    let platforms = [
        "Wii", "NES", "GB", "DS", "X360", "PS3", "PS2", "SNES", "GBA", "PS4", "3DS", "N64", "PS", "XB", "PC",
    ];
    let genres = ["Action", "Sports", "Platform", "Racing"];
    let n = 60;

    let platform: Vec<&str> = (0..n).map(|i| platforms[i % platforms.len()]).collect();
    let genre: Vec<&str> = (0..n).map(|i| genres[i % genres.len()]).collect();
    let year: Vec<f64> = (0..n).map(|i| 1985.0 + (i % 30) as f64).collect();
    let na: Vec<f64> = (0..n).map(|i| (i % 7) as f64 * 0.75).collect();
    let eu: Vec<f64> = (0..n).map(|i| (i % 5) as f64 * 0.5).collect();
    let jp: Vec<f64> = (0..n).map(|i| (i % 3) as f64 * 0.25).collect();
    let other: Vec<f64> = (0..n).map(|i| (i % 2) as f64 * 0.1).collect();
    let critic: Vec<Option<f64>> = (0..n).map(|i| if i % 4 == 0 { None } else { Some(50.0 + i as f64 / 2.0) }).collect();
    let user: Vec<Option<f64>> = (0..n).map(|i| if i % 3 == 0 { None } else { Some((i % 10) as f64) }).collect();
    let rating: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "E" } else { "T" }).collect();

    df!(
        "platform" => platform,
        "genre" => genre,
        "rating_esrb" => rating,
        "year_of_release" => year,
        "critic_score" => critic,
        "user_score" => user,
        "na_sales" => na,
        "eu_sales" => eu,
        "jp_sales" => jp,
        "other_sales" => other,
    )
    .unwrap()
}

fn sample() -> Dataset {
    DatasetLoader::new().from_frame(&sample_frame()).unwrap()
}

fn all_genres(start: i32, end: i32) -> FilterQuery {
    FilterQuery::new(
        vec!["Action".into(), "Sports".into(), "Platform".into(), "Racing".into()],
        start,
        end,
    )
}

#[test]
fn test_top_platforms_never_exceed_ten() {
    let dataset = sample();
    let report = aggregate(&dataset, &all_genres(1980, 2016));
    assert!(report.top_platforms.len() <= TOP_PLATFORMS);
    assert_eq!(report.top_platforms.len(), TOP_PLATFORMS);
    assert!(report
        .top_platforms
        .windows(2)
        .all(|w| w[0].total_sales >= w[1].total_sales));
}

#[test]
fn test_regional_split_cross_checks_total() {
    let dataset = sample();
    for (start, end) in [(1980, 2016), (1990, 1995), (2000, 2000), (2010, 2016)] {
        let report = aggregate(&dataset, &all_genres(start, end));
        let split: f64 = report.regional_split.iter().map(|r| r.sales).sum();
        assert!(
            (split - report.kpis.total_sales).abs() < 1e-9,
            "{}-{}: split {} vs total {}",
            start,
            end,
            split,
            report.kpis.total_sales
        );
    }
}

#[test]
fn test_kpis_over_filtered_rows() {
    let dataset = sample();
    let query = FilterQuery::new(vec!["Sports".into()], 1980, 2016);
    let report = aggregate(&dataset, &query);

    let rows: Vec<_> = dataset.records().iter().filter(|r| r.genre == "Sports").collect();
    assert_eq!(report.kpis.total_videogames, rows.len());

    let critic: Vec<f64> = rows.iter().filter_map(|r| r.critic_score).collect();
    let expected = critic.iter().sum::<f64>() / critic.len() as f64;
    assert!((report.kpis.avg_critic_score - expected).abs() < 1e-9);
}

#[test]
fn test_time_series_independent_of_filter() {
    let dataset = sample();
    let baseline = aggregate(&dataset, &all_genres(1980, 2016)).time_series;
    for query in [
        FilterQuery::default(),
        FilterQuery::new(vec!["Racing".into()], 2001, 2003),
        FilterQuery::new(vec!["Nonexistent".into()], 1980, 2016),
    ] {
        assert_eq!(aggregate(&dataset, &query).time_series, baseline);
    }

    let years = 30;
    assert_eq!(baseline.len(), years * Region::ALL.len());
    let series_total: f64 = baseline.iter().map(|p| p.sales).sum();
    let dataset_total: f64 = dataset.records().iter().map(|r| r.total_sales()).sum();
    assert!((series_total - dataset_total).abs() < 1e-9);
}

#[test]
fn test_unmatched_filter_is_empty_not_error() {
    let dataset = sample();
    let report = aggregate(&dataset, &FilterQuery::new(vec!["Action".into()], 1970, 1979));
    assert!(report.empty_result);
    assert_eq!(report.kpis.total_sales, 0.0);
    assert_eq!(report.kpis.avg_user_score, 0.0);
    assert!(report.top_platforms.is_empty());
}

#[test]
fn test_catalog_covers_dataset() {
    let options = filter_options(&sample()).unwrap();
    assert_eq!(options.genres, vec!["Action", "Platform", "Racing", "Sports"]);
    assert_eq!(options.platforms.len(), 15);
    assert_eq!(options.ratings, vec!["E", "T"]);
    assert!(options.gen_platforms.contains(&"3ª Gen".to_string()));
    assert!(options.gen_platforms.contains(&"PC".to_string()));
    assert_eq!((options.min_year, options.max_year), (1985, 2014));
    assert!(options.platforms.windows(2).all(|w| w[0] < w[1]));
}
