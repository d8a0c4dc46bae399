//! vgsales CLI Module
//!
//! Serves the API and acts as a terminal dashboard against a running server.

mod client;

pub use client::ApiClient;

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use crate::analytics::{AggregateReport, FilterOptions, FilterQuery, DEFAULT_END_YEAR, DEFAULT_START_YEAR};
use crate::dataset::{classify_user_score, derive_features, platform_generation, Region};
use crate::inference::PredictionRequest;
use crate::server::{run_server, ServerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width
const BAR: usize = 30;

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── Presentation formatting ───────────────────────────────────────────────────

/// Integer part with `,` every three digits.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Total sales KPI, e.g. `$8,920 M`
pub fn format_sales_total(millions: f64) -> String {
    format!("${} M", group_thousands(millions))
}

/// Average score KPI with one decimal
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Single prediction, e.g. `$ 1.23 M`
pub fn format_prediction(millions: f64) -> String {
    format!("$ {:.2} M", millions)
}

fn bar(value: f64, max: f64) -> String {
    let width = if max > 0.0 {
        ((value / max) * BAR as f64).round() as usize
    } else {
        0
    };
    "█".repeat(width.min(BAR))
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vgsales")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Video game sales analytics and prediction service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server (default)
    Serve {
        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Cleaned dataset (CSV or Parquet)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Fitted one-hot encoder (JSON)
        #[arg(long)]
        encoder: Option<PathBuf>,

        /// Fitted regression model (JSON)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Check that a running API is up
    Health {
        /// API base URL
        #[arg(long, env = "VGSALES_API", default_value = "http://localhost:8000")]
        api: String,
    },

    /// Print the dashboard filter options
    Filters {
        /// API base URL
        #[arg(long, env = "VGSALES_API", default_value = "http://localhost:8000")]
        api: String,
    },

    /// Show KPIs, top platforms, regional split and yearly sales
    Explore {
        /// API base URL
        #[arg(long, env = "VGSALES_API", default_value = "http://localhost:8000")]
        api: String,

        /// Genre to include (repeatable, default: all genres)
        #[arg(short, long = "genre")]
        genres: Vec<String>,

        /// First release year (default: earliest in the catalog)
        #[arg(long)]
        start: Option<i32>,

        /// Last release year (default: latest in the catalog)
        #[arg(long)]
        end: Option<i32>,
    },

    /// Predict global sales for one game
    Predict {
        /// API base URL
        #[arg(long, env = "VGSALES_API", default_value = "http://localhost:8000")]
        api: String,

        #[arg(long)]
        platform: String,

        #[arg(long)]
        genre: String,

        #[arg(long)]
        rating_esrb: String,

        /// Defaults to the generation of --platform
        #[arg(long)]
        gen_platform: Option<String>,

        /// Defaults to the class of --user-score
        #[arg(long)]
        classification_user_score: Option<String>,

        #[arg(long, default_value_t = 2010)]
        year: i32,

        #[arg(long, default_value_t = 8.0)]
        user_score: f64,

        #[arg(long, default_value_t = 80.0)]
        critic_score: f64,
    },

    /// Derive total_sales, gen_platform and classification_user_score
    Preprocess {
        /// Raw dataset (CSV or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Cleaned CSV output
        #[arg(short, long)]
        output: PathBuf,
    },
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &PathBuf) -> anyhow::Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let df = match ext {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?,
        "parquet" => ParquetReader::new(std::fs::File::open(path)?).finish()?,
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };

    Ok(df)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    let host = &config.host;
    let port = config.port;

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "vgsales".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API    ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Data   ", &config.data_path.display().to_string()));
    line_box(&kv("Model  ", &config.model_path.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

pub async fn cmd_health(api: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(api)?;
    step_run("Checking API");
    let start = Instant::now();
    let health = client.health().await?;
    step_done(&format!("{:?}", start.elapsed()));

    section("Health");
    println!("  {:<12} {}", muted("Status"), health.status.green());
    println!("  {:<12} {}", muted("Records"), group_thousands(health.records as f64));
    println!("  {:<12} {}", muted("Features"), health.features);
    println!();
    Ok(())
}

pub async fn cmd_filters(api: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(api)?;
    let options = client.filter_options().await?;

    section("Filters");
    let rows: [(&str, &[String]); 5] = [
        ("Genres", options.genres.as_slice()),
        ("Platforms", options.platforms.as_slice()),
        ("Ratings", options.ratings.as_slice()),
        ("Generations", options.gen_platforms.as_slice()),
        ("User score", options.user_score_classes.as_slice()),
    ];
    for (name, values) in rows {
        println!("  {:<12} {}", muted(name), values.join(", "));
    }
    println!("  {:<12} {} - {}", muted("Years"), options.min_year, options.max_year);
    println!();
    Ok(())
}

/// Fill unset explore filters from the catalog: every genre and its full year range.
pub fn explore_filter(
    genres: Vec<String>,
    start: Option<i32>,
    end: Option<i32>,
    catalog: Option<&FilterOptions>,
) -> FilterQuery {
    let genres = match catalog {
        Some(options) if genres.is_empty() => options.genres.clone(),
        _ => genres,
    };
    let start = start
        .or(catalog.map(|o| o.min_year))
        .unwrap_or(DEFAULT_START_YEAR);
    let end = end.or(catalog.map(|o| o.max_year)).unwrap_or(DEFAULT_END_YEAR);
    FilterQuery::new(genres, start, end)
}

pub async fn cmd_explore(
    api: &str,
    genres: Vec<String>,
    start: Option<i32>,
    end: Option<i32>,
) -> anyhow::Result<()> {
    let client = ApiClient::new(api)?;

    let catalog = if genres.is_empty() || start.is_none() || end.is_none() {
        Some(client.filter_options().await?)
    } else {
        None
    };
    let filter = explore_filter(genres, start, end, catalog.as_ref());

    let started = Instant::now();
    let report = client.aggregate(&filter).await?;

    print_kpis(&report, &filter);
    if report.empty_result {
        println!("  {}", "No games match the selected filters".yellow());
        println!();
    } else {
        print_top_platforms(&report);
        print_regional_split(&report);
    }
    print_time_series(&report);
    println!("  {}", dim(&format!("fetched in {:?}", started.elapsed())));
    println!();
    Ok(())
}

fn print_kpis(report: &AggregateReport, filter: &FilterQuery) {
    let kpis = &report.kpis;
    println!();
    line_box_top();
    line_box_center(&format!("{}", "Sales overview".white().bold()));
    line_box_center(&format!(
        "{}",
        dim(&format!("{} genres · {} - {}", filter.genres.len(), filter.start, filter.end))
    ));
    line_box_sep();
    line_box(&kv("Total sales     ", &format_sales_total(kpis.total_sales)));
    line_box(&kv("Games           ", &kpis.total_videogames.to_string()));
    line_box(&kv("Platforms       ", &kpis.total_platforms.to_string()));
    line_box(&kv("Avg critic score", &format_score(kpis.avg_critic_score)));
    line_box(&kv("Avg user score  ", &format_score(kpis.avg_user_score)));
    line_box_bottom();
}

fn print_top_platforms(report: &AggregateReport) {
    section("Top platforms");
    let max = report
        .top_platforms
        .first()
        .map(|p| p.total_sales)
        .unwrap_or(0.0);
    for entry in &report.top_platforms {
        println!(
            "  {:<8} {:<30} {:>9.2}",
            entry.platform,
            accent(&bar(entry.total_sales, max)),
            entry.total_sales
        );
    }
}

fn print_regional_split(report: &AggregateReport) {
    section("Sales by region");
    let total: f64 = report.regional_split.iter().map(|r| r.sales).sum();
    for entry in &report.regional_split {
        let pct = if total > 0.0 { entry.sales / total * 100.0 } else { 0.0 };
        println!(
            "  {:<14} {:>9.2}  {}",
            entry.region.label(),
            entry.sales,
            muted(&format!("{:>5.1}%", pct))
        );
    }
}

fn print_time_series(report: &AggregateReport) {
    section("Sales per year (all games)");

    let mut by_year: BTreeMap<i32, [f64; 4]> = BTreeMap::new();
    for point in &report.time_series {
        let slot = Region::ALL.iter().position(|r| *r == point.region).unwrap_or(0);
        by_year.entry(point.year).or_default()[slot] = point.sales;
    }

    print!("  {:<6}", muted("Year"));
    for region in Region::ALL {
        print!(" {:>14}", muted(region.label()));
    }
    println!();
    println!("  {}", dim(&"─".repeat(66)));
    for (year, sales) in by_year {
        print!("  {:<6}", year);
        for value in sales {
            print!(" {:>14.2}", value);
        }
        println!();
    }
    println!();
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_predict(
    api: &str,
    platform: String,
    genre: String,
    rating_esrb: String,
    gen_platform: Option<String>,
    classification_user_score: Option<String>,
    year: i32,
    user_score: f64,
    critic_score: f64,
) -> anyhow::Result<()> {
    let request = PredictionRequest {
        gen_platform: gen_platform.unwrap_or_else(|| platform_generation(&platform).to_string()),
        classification_user_score: classification_user_score
            .unwrap_or_else(|| classify_user_score(Some(user_score)).to_string()),
        platform,
        genre,
        rating_esrb,
        year_of_release: year,
        user_score,
        critic_score,
    };

    let client = ApiClient::new(api)?;
    step_run("Predicting");
    let start = Instant::now();
    let outcome = client.predict(&request).await?;
    step_done(&format!("{:?}", start.elapsed()));

    section("Estimated global sales");
    println!("  {:<16} {}", muted("Platform"), request.platform);
    println!("  {:<16} {}", muted("Genre"), request.genre);
    println!("  {:<16} {}", muted("Year"), request.year_of_release);
    println!();
    println!("  {:<16} {}", muted("Prediction"), format_prediction(outcome.prediction).white().bold());
    for unknown in &outcome.unknown_categories {
        println!(
            "  {} {}",
            "!".yellow(),
            format!("{} {:?} was not seen in training, encoded as all zeros", unknown.feature, unknown.value).yellow()
        );
    }
    println!();
    Ok(())
}

pub fn cmd_preprocess(input: &PathBuf, output: &PathBuf) -> anyhow::Result<()> {
    section("Preprocess");

    step_run("Loading data");
    let start = Instant::now();
    let df = load_data(input)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    step_run("Deriving features");
    let mut processed = derive_features(df)?;
    step_done(&format!("{} cols", processed.width()));

    step_run(&format!("Saving → {}", output.display()));
    let mut file = std::fs::File::create(output)?;
    CsvWriter::new(&mut file).finish(&mut processed)?;
    step_done(&format!("{} rows × {} cols", processed.height(), processed.width()));

    println!();
    Ok(())
}
