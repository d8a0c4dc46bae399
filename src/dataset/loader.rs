//! Games table loading

use super::{features, Dataset, GameRecord, RegionalSales};
use crate::error::{Result, VgSalesError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Allowed gap between a stored `total_sales` and the regional sum
const TOTAL_TOLERANCE: f64 = 1e-6;

const NAME_COLUMNS: [&str; 3] = ["videogame_name", "videogame_names", "name"];

/// Reads the cleaned games table into a [`Dataset`]
pub struct DatasetLoader {
    /// Rows used by polars to infer column types
    infer_schema_length: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Load a CSV or Parquet file, chosen by extension.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let shown = path.display().to_string();

        let file = File::open(path).map_err(|e| VgSalesError::unavailable(&shown, e))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let df = match ext {
            "parquet" => ParquetReader::new(file).finish(),
            _ => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(self.infer_schema_length))
                .into_reader_with_file_handle(file)
                .finish(),
        }
        .map_err(|e| VgSalesError::unavailable(&shown, e))?;

        let dataset = self
            .from_frame(&df)
            .map_err(|e| match e {
                VgSalesError::DataUnavailable(msg) => VgSalesError::unavailable(&shown, msg),
                other => VgSalesError::unavailable(&shown, other),
            })?;

        info!(
            path = %shown,
            rows = dataset.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded games dataset"
        );
        Ok(dataset)
    }

    /// Convert an already loaded frame into typed records.
    pub fn from_frame(&self, df: &DataFrame) -> Result<Dataset> {
        let n = df.height();

        let platform = required(string_column(df, "platform")?, "platform")?;
        let genre = required(string_column(df, "genre")?, "genre")?;
        let year = required(f64_column(df, "year_of_release")?, "year_of_release")?;
        let na = required(f64_column(df, "na_sales")?, "na_sales")?;
        let eu = required(f64_column(df, "eu_sales")?, "eu_sales")?;
        let jp = required(f64_column(df, "jp_sales")?, "jp_sales")?;
        let other = required(f64_column(df, "other_sales")?, "other_sales")?;

        let name = match NAME_COLUMNS.iter().find(|c| has_column(df, c)) {
            Some(c) => string_column(df, c)?,
            None => None,
        };
        let rating = string_column(df, "rating_esrb")?;
        let critic = f64_column(df, "critic_score")?;
        let user = f64_column(df, "user_score")?;
        let gen_platform = string_column(df, "gen_platform")?;
        let score_class = string_column(df, "classification_user_score")?;
        let stored_total = f64_column(df, "total_sales")?;

        let mut records = Vec::with_capacity(n);
        let mut total_mismatches = 0usize;

        for i in 0..n {
            let platform = str_at(&platform, i, "platform")?;
            let genre = str_at(&genre, i, "genre")?;
            let year_of_release = year_at(&year, i)?;
            let sales = RegionalSales::new(
                sales_at(&na, i, "na_sales")?,
                sales_at(&eu, i, "eu_sales")?,
                sales_at(&jp, i, "jp_sales")?,
                sales_at(&other, i, "other_sales")?,
            );

            let mut record = GameRecord::new(platform, genre, year_of_release, sales)
                .with_scores(
                    critic.as_ref().and_then(|c| c.get(i)).filter(|v| !v.is_nan()),
                    user.as_ref().and_then(|c| c.get(i)).filter(|v| !v.is_nan()),
                );
            record.videogame_name = name.as_ref().and_then(|c| c.get(i)).map(str::to_string);
            if let Some(ref rating) = rating {
                record.rating_esrb = str_at(rating, i, "rating_esrb")?.to_string();
            }
            if let Some(ref column) = gen_platform {
                record.gen_platform = str_at(column, i, "gen_platform")?.to_string();
            }
            if let Some(ref column) = score_class {
                record.classification_user_score =
                    str_at(column, i, "classification_user_score")?.to_string();
            }

            if let Some(stored) = stored_total.as_ref().and_then(|c| c.get(i)) {
                if (stored - record.total_sales()).abs() > TOTAL_TOLERANCE {
                    total_mismatches += 1;
                }
            }

            records.push(record);
        }

        if total_mismatches > 0 {
            warn!(
                rows = total_mismatches,
                "Stored total_sales differs from the regional sum; using the regional sum"
            );
        }
        if gen_platform.is_none() || score_class.is_none() {
            info!(
                platforms = features::PLATFORM_GENERATIONS.len(),
                score_classes = features::USER_SCORE_CLASSES.len(),
                "Derived categorical columns missing from file; computed on load"
            );
        }

        Ok(Dataset::from_records(records))
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn required<T>(column: Option<T>, name: &str) -> Result<T> {
    column.ok_or_else(|| VgSalesError::DataUnavailable(format!("missing required column: {}", name)))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Option<StringChunked>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    let series = df.column(name)?.as_materialized_series().cast(&DataType::String)?;
    Ok(Some(series.str()?.clone()))
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Option<Float64Chunked>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| VgSalesError::DataUnavailable(format!("column {} is not numeric: {}", name, e)))?;
    Ok(Some(series.f64()?.clone()))
}

fn str_at<'a>(column: &'a StringChunked, row: usize, name: &str) -> Result<&'a str> {
    column
        .get(row)
        .ok_or_else(|| VgSalesError::DataUnavailable(format!("row {}: null {}", row, name)))
}

fn year_at(column: &Float64Chunked, row: usize) -> Result<i32> {
    let value = column
        .get(row)
        .filter(|v| v.is_finite())
        .ok_or_else(|| VgSalesError::DataUnavailable(format!("row {}: null year_of_release", row)))?;
    if value.fract() != 0.0 {
        return Err(VgSalesError::DataUnavailable(format!(
            "row {}: year_of_release {} is not an integer",
            row, value
        )));
    }
    Ok(value as i32)
}

fn sales_at(column: &Float64Chunked, row: usize, name: &str) -> Result<f64> {
    match column.get(row) {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(VgSalesError::DataUnavailable(format!(
            "row {}: invalid {} value {}",
            row, name, v
        ))),
        None => Err(VgSalesError::DataUnavailable(format!("row {}: null {}", row, name))),
    }
}
