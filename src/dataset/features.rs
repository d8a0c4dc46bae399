//! Derived categorical columns of the cleaned games table
//!
//! These are the rules the offline cleaning step applies to the raw sales
//! export. The loader reuses them when a file lacks the derived columns.

use crate::error::{Result, VgSalesError};
use polars::prelude::*;
use tracing::info;

/// Every value `platform_generation` can return
pub const PLATFORM_GENERATIONS: [&str; 8] = [
    "3ª Gen", "4ª Gen", "5ª Gen", "6ª Gen", "7ª Gen", "8ª Gen", "PC", "Otras/Retro",
];

/// Every value `classify_user_score` can return
pub const USER_SCORE_CLASSES: [&str; 5] = ["Excellent", "Good", "Regular", "Bad", "Without score"];

/// Group a platform code into its console generation.
pub fn platform_generation(platform: &str) -> &'static str {
    match platform {
        "NES" | "2600" | "TG16" => "3ª Gen",
        "SNES" | "GEN" | "GB" | "SCD" => "4ª Gen",
        "PS" | "N64" | "SAT" => "5ª Gen",
        "PS2" | "GC" | "XB" | "GBA" => "6ª Gen",
        "PS3" | "X360" | "Wii" | "PSP" | "DS" => "7ª Gen",
        "PS4" | "XOne" | "WiiU" | "3DS" | "PSV" => "8ª Gen",
        "PC" => "PC",
        _ => "Otras/Retro",
    }
}

/// Bucket a 0-10 user score into a rating class.
pub fn classify_user_score(score: Option<f64>) -> &'static str {
    match score {
        None => "Without score",
        Some(s) if s.is_nan() => "Without score",
        Some(s) if s >= 8.5 => "Excellent",
        Some(s) if s >= 7.0 => "Good",
        Some(s) if s >= 5.5 => "Regular",
        Some(_) => "Bad",
    }
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(name)
        .map_err(|_| VgSalesError::Data(format!("missing column: {}", name)))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}

/// Add `total_sales`, `gen_platform` and `classification_user_score` to a raw
/// sales frame, replacing any existing columns of the same name.
pub fn derive_features(mut df: DataFrame) -> Result<DataFrame> {
    info!(rows = df.height(), "Creating column total_sales");
    let na = f64_column(&df, "na_sales")?;
    let eu = f64_column(&df, "eu_sales")?;
    let jp = f64_column(&df, "jp_sales")?;
    let other = f64_column(&df, "other_sales")?;
    let total: Vec<Option<f64>> = na
        .into_iter()
        .zip(eu.into_iter())
        .zip(jp.into_iter())
        .zip(other.into_iter())
        .map(|(((na, eu), jp), other)| Some(na? + eu? + jp? + other?))
        .collect();
    df.with_column(Series::new("total_sales".into(), total))?;

    info!("Creating column gen_platform");
    let platforms = df
        .column("platform")
        .map_err(|_| VgSalesError::Data("missing column: platform".to_string()))?
        .as_materialized_series()
        .str()?
        .clone();
    let generations: Vec<Option<&str>> = platforms
        .into_iter()
        .map(|p| p.map(platform_generation))
        .collect();
    df.with_column(Series::new("gen_platform".into(), generations))?;

    info!("Creating column classification_user_score");
    let user_scores = f64_column(&df, "user_score")?;
    let classes: Vec<&str> = user_scores.into_iter().map(classify_user_score).collect();
    df.with_column(Series::new("classification_user_score".into(), classes))?;

    Ok(df)
}
