use anyhow::Context;
use backtester::BacktestService;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Settings, load_settings};
use core_types::{BacktestRequest, DataField, WeightTable};
use data_provider::{GeneratorConfig, ParquetProvider, generate_all};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use web_server::schema::{BacktestRequestBody, BacktestResponseBody};

/// The main entry point for the Keel backtesting service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; settings fall back to config.toml and defaults.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    let _log_guard = configuration::init_tracing(&settings.logging)?;
    tracing::debug!(config = %cli.config.display(), "Settings loaded.");

    match cli.command {
        Commands::Serve(args) => handle_serve(args, settings).await,
        Commands::GenerateData(args) => handle_generate(args, settings),
        Commands::Backtest(args) => handle_backtest(args, settings),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Rule-based portfolio backtesting over (date x security) datasets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML settings file. Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve(ServeArgs),
    /// Write dummy parquet datasets for every data field.
    GenerateData(GenerateArgs),
    /// Run a single backtest request from a JSON file.
    Backtest(BacktestArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct GenerateArgs {
    /// Output directory (defaults to `data.data_dir`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Number of securities per dataset.
    #[arg(long)]
    securities: Option<usize>,

    /// Seed for reproducible data.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser)]
struct BacktestArgs {
    /// JSON file holding the request body, as sent to `POST /v1/backtest`.
    #[arg(long)]
    request: PathBuf,

    /// Print the JSON response instead of a summary table.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    web_server::run_server(settings).await
}

fn handle_generate(args: GenerateArgs, settings: Settings) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::from(&settings.data);
    if let Some(securities) = args.securities {
        config.securities = securities;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let out = args.out.unwrap_or(settings.data.data_dir);

    println!(
        "Generating {} securities from {} to {} into {}",
        config.securities,
        config.start_date,
        config.end_date,
        out.display()
    );

    let progress_bar = ProgressBar::new(DataField::ALL.len() as u64);
    let template = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(template)?
            .progress_chars("#>-"),
    );

    let written = generate_all(&config, &out, |field, _| {
        progress_bar.inc(1);
        progress_bar.set_message(format!("Done {field}!"));
    })?;

    progress_bar.finish_with_message("Generation complete!");
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

fn handle_backtest(args: BacktestArgs, settings: Settings) -> anyhow::Result<()> {
    let request = read_request(&args.request)?;

    let provider = ParquetProvider::from_settings(&settings.data);
    let service = BacktestService::new(Arc::new(provider));
    let response = BacktestResponseBody::from(service.run(&request)?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", summary_table(&response.weights));
        println!(
            "{} dates in {:.3} ms",
            response.weights.len(),
            response.execution_time * 1000.0
        );
    }
    Ok(())
}

/// Parses and validates a request file with the same rules as the HTTP API.
fn read_request(path: &Path) -> anyhow::Result<BacktestRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let body: BacktestRequestBody =
        serde_json::from_str(&raw).context("request file is not a valid backtest request")?;

    body.validate().map_err(|errors| {
        let details: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        anyhow::anyhow!("invalid request: {}", details.join("; "))
    })
}

/// One line per date: how many securities are held and how the weight is spread.
fn summary_table(weights: &WeightTable) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Date", "Securities", "Total Weight", "Min Weight", "Max Weight"]);

    for (date, row) in weights.iter() {
        let total = row.values().fold(0.0, |acc, w| acc + w);
        let min = row.values().copied().fold(f64::INFINITY, f64::min);
        let max = row.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let (min, max) = if row.is_empty() {
            ("-".to_string(), "-".to_string())
        } else {
            (format!("{min:.4}"), format!("{max:.4}"))
        };
        table.add_row(vec![
            date.to_string(),
            row.len().to_string(),
            format!("{total:.4}"),
            min,
            max,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{CalendarRule, FilterRule, WeightRow, WeightingRule};
    use std::fs;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn cells(table: &Table, index: usize) -> Vec<String> {
        table
            .row_iter()
            .nth(index)
            .unwrap()
            .cell_iter()
            .map(|cell| cell.content())
            .collect()
    }

    #[test]
    fn summary_table_has_one_row_per_date() {
        let held: WeightRow = [("1".to_string(), 0.25), ("2".to_string(), 0.75)].into();
        let weights: WeightTable = [(day(2), held), (day(3), WeightRow::new())]
            .into_iter()
            .collect();

        let table = summary_table(&weights);
        assert_eq!(table.row_iter().count(), 2);
        assert_eq!(cells(&table, 0), ["2020-01-02", "2", "1.0000", "0.2500", "0.7500"]);
        assert_eq!(cells(&table, 1), ["2020-01-03", "0", "0.0000", "-", "-"]);
        assert!(table.to_string().contains("Max Weight"));
    }

    #[test]
    fn summary_table_of_empty_result_has_only_a_header() {
        let table = summary_table(&WeightTable::new());
        assert_eq!(table.row_iter().count(), 0);
    }

    #[test]
    fn request_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        fs::write(
            &path,
            r#"{
                "data_field": "prices",
                "calendar_rule": "quarterly_dates",
                "filter_type": "filter_by_value",
                "weighting_method": "optimized_weight",
                "initial_date": "2020-01-01",
                "end_date": "2020-01-03",
                "filter_value": 5.0,
                "weighting_minimum": 0.1,
                "weighting_maximum": 0.6
            }"#,
        )
        .unwrap();

        let request = read_request(&path).unwrap();
        assert_eq!(request.data_field, DataField::Prices);
        assert_eq!(request.calendar, CalendarRule::quarterly_range(day(1), Some(day(3))));
        assert_eq!(request.filter, FilterRule::ByValue { threshold: 5.0 });
        assert_eq!(
            request.weighting,
            WeightingRule::OptimizedWeight {
                min_weight: 0.1,
                max_weight: 0.6
            }
        );
    }

    #[test]
    fn invalid_request_file_lists_every_field_problem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        fs::write(
            &path,
            r#"{
                "data_field": "prices",
                "calendar_rule": "customer_dates",
                "filter_type": "top_n_securities",
                "weighting_method": "equal_weight",
                "list_of_dates": [],
                "top_n": 0
            }"#,
        )
        .unwrap();

        let message = read_request(&path).unwrap_err().to_string();
        assert!(message.starts_with("invalid request:"), "{message}");
        assert!(message.contains("list_of_dates"), "{message}");
        assert!(message.contains("top_n"), "{message}");
    }

    #[test]
    fn malformed_or_missing_request_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        assert!(read_request(&path).is_err());

        fs::write(&path, "{ not json").unwrap();
        let err = read_request(&path).unwrap_err();
        assert!(err.to_string().contains("not a valid backtest request"));
    }
}
