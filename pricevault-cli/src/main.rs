//! PriceVault CLI: fetch one ticker, save it as CSV, upload it to S3.
//!
//! Meant to be run by an external scheduler. Exit status is 0 when the
//! snapshot was uploaded (or written, with `--no-upload`), 1 otherwise.
//!
//! Credentials, region, bucket, and endpoint come from `AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`, `AWS_REGION`,
//! `AWS_S3_BUCKET`, and `AWS_ENDPOINT_URL`.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use pricevault_core::data::{DataProvider, SyntheticProvider, YahooProvider};
use pricevault_core::{
    Pipeline, PipelineOutcome, PipelineRequest, S3Connector, StorageConfig, TracingSink,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pricevault",
    about = "Fetch daily prices for one ticker, save as CSV, upload to object storage"
)]
struct Cli {
    /// Ticker symbol to fetch (e.g., AAPL).
    #[arg(default_value = "AAPL")]
    ticker: String,

    /// Start date (YYYY-MM-DD).
    #[arg(long, default_value = "2023-01-01", value_parser = parse_date)]
    start: NaiveDate,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long, default_value = "2023-12-31", value_parser = parse_date)]
    end: NaiveDate,

    /// Destination bucket. Defaults to $AWS_S3_BUCKET.
    #[arg(long)]
    bucket: Option<String>,

    /// Label embedded in the CSV file name.
    #[arg(long, default_value = "latest")]
    prefix: String,

    /// Destination folder in the bucket. Only `latest` is archived.
    #[arg(long, default_value = "latest")]
    folder: String,

    /// Directory the CSV is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Use deterministic synthetic data instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Write the CSV but skip the upload.
    #[arg(long, default_value_t = false)]
    no_upload: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn main() {
    init_tracing();

    let code = match run(Cli::parse()) {
        Ok(outcome) => report(&outcome),
        Err(err) => {
            tracing::error!("pipeline aborted: {err:#}");
            1
        }
    };

    std::process::exit(code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<PipelineOutcome> {
    let ticker = cli.ticker.trim().to_string();
    if ticker.is_empty() {
        bail!("ticker must not be empty");
    }
    // The ticker becomes part of the CSV file name.
    if ticker.contains(['/', '\\']) || ticker.contains("..") {
        bail!("ticker {ticker:?} must not contain path separators or '..'");
    }

    let storage = StorageConfig::from_env();
    let bucket = cli.bucket.unwrap_or_else(|| storage.bucket.clone());

    let yahoo;
    let synthetic = SyntheticProvider::new();
    let provider: &dyn DataProvider = if cli.synthetic {
        tracing::warn!("using synthetic data for {ticker}");
        &synthetic
    } else {
        yahoo = YahooProvider::new().context("failed to set up Yahoo Finance client")?;
        &yahoo
    };

    let request = PipelineRequest {
        symbol: ticker,
        start: cli.start,
        end: cli.end,
        prefix: cli.prefix,
        bucket,
        folder: cli.folder,
        output_dir: cli.output_dir,
        upload: !cli.no_upload,
    };

    let sink = TracingSink;
    let connector = S3Connector;
    let pipeline = Pipeline::new(provider, &connector, storage, &sink);

    pipeline
        .run(&request)
        .context("failed to save price data locally")
}

fn report(outcome: &PipelineOutcome) -> i32 {
    match outcome {
        PipelineOutcome::NoData => {
            tracing::error!("no data fetched, nothing to save");
        }
        PipelineOutcome::Written { artifact } => {
            tracing::info!(
                "data saved to {} ({} rows), upload skipped",
                artifact.path.display(),
                artifact.rows
            );
        }
        PipelineOutcome::Uploaded { artifact, receipt } => {
            tracing::info!(
                "pipeline complete: {} -> s3://{}/{}",
                artifact.path.display(),
                receipt.bucket,
                receipt.key
            );
        }
        PipelineOutcome::UploadFailed { artifact } => {
            tracing::error!(
                "upload failed, local copy kept at {}",
                artifact.path.display()
            );
        }
    }
    outcome.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_run() {
        let cli = Cli::try_parse_from(["pricevault"]).unwrap();
        assert_eq!(cli.ticker, "AAPL");
        assert_eq!(cli.start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(cli.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(cli.prefix, "latest");
        assert_eq!(cli.folder, "latest");
        assert!(cli.bucket.is_none());
        assert!(!cli.no_upload);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "pricevault",
            "MSFT",
            "--start",
            "2024-01-01",
            "--end",
            "2024-06-30",
            "--bucket",
            "prices",
            "--folder",
            "manual",
            "--synthetic",
            "--no-upload",
        ])
        .unwrap();
        assert_eq!(cli.ticker, "MSFT");
        assert_eq!(cli.bucket.as_deref(), Some("prices"));
        assert_eq!(cli.folder, "manual");
        assert!(cli.synthetic);
        assert!(cli.no_upload);
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["pricevault", "--start", "01/02/2023"]).is_err());
    }

    #[test]
    fn empty_ticker_is_an_error() {
        let cli = Cli::try_parse_from(["pricevault", "  "]).unwrap();
        assert!(run(cli).is_err());
    }

    #[test]
    fn ticker_with_path_components_is_an_error() {
        for ticker in ["../AAPL", "a/b", "a\\b", ".."] {
            let cli = Cli::try_parse_from(["pricevault", ticker, "--synthetic", "--no-upload"])
                .unwrap();
            let err = run(cli).unwrap_err();
            assert!(err.to_string().contains("path separators"), "{ticker}: {err}");
        }
    }

    #[test]
    fn synthetic_run_without_upload_writes_a_csv() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "pricevault",
            "spy",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--synthetic",
            "--no-upload",
            "--output-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        let outcome = run(cli).unwrap();

        let artifact = outcome.artifact().unwrap();
        assert!(artifact.file_name().unwrap().starts_with("spy_latest_"));
        assert!(artifact.path.starts_with(dir.path()));
        assert_eq!(artifact.rows, 23);
        assert_eq!(report(&outcome), 0);
    }
}
