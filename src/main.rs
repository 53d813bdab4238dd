//! # Newsdesk Scraper
//!
//! Searches a news site for a phrase within one site section, walks the
//! result pages newest first until it reaches a lookback cutoff, and writes
//! an Excel report plus every result's thumbnail.
//!
//! ## Usage
//!
//! ```sh
//! newsdesk_scraper --topic "automation" --category "Business" --months 2
//! newsdesk_scraper --work-items items.json
//! ```
//!
//! A WebDriver server (chromedriver or a Selenium container) must be running
//! at `--webdriver-url`.
//!
//! ## Architecture
//!
//! 1. **Intake**: Load payloads and validate each into a typed search request
//! 2. **Search**: Drive a browser session to the filtered, newest-first results
//! 3. **Paging**: Extract a record per card until the cutoff or the last page
//! 4. **Output**: Rewrite `output.xlsx` after each item and record its outcome
//!    in `work_items.json`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod errors;
mod extract;
mod images;
mod models;
mod outputs;
mod pager;
mod retry;
mod runner;
mod site;
mod utils;
mod validation;
mod window;

use cli::Cli;
use images::HttpImageDownloader;
use outputs::json;
use pager::PagerConfig;
use runner::{RunSettings, Runner};
use site::SiteConfig;
use utils::reset_output_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsdesk_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let payloads = args.payloads().await?;

    let site = match &args.site_config {
        Some(path) => SiteConfig::load(path).await?,
        None => SiteConfig::default(),
    };

    // Output is reset once per run, before any item
    if let Err(e) = reset_output_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory could not be prepared (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let mut pager = PagerConfig::new(args.output_dir.join("images"));
    pager.delay = args.delay();
    pager.on_malformed_date = args.malformed_date_policy();
    pager.on_missing_image = args.missing_image_policy();

    let settings = RunSettings {
        output_dir: args.output_dir.clone(),
        webdriver_url: args.webdriver_url.clone(),
        headless: args.headless,
        site,
        pager,
        today: Local::now().date_naive(),
    };
    let downloader = HttpImageDownloader::new(Duration::from_secs(args.image_timeout_secs))?;

    let mut runner = Runner::new(settings, downloader);
    let outcomes = runner.run_all(payloads).await;

    if let Err(e) = json::write_outcomes(&outcomes, &args.output_dir).await {
        error!(error = %e, "Failed to write work-item ledger");
    }

    let done = outcomes.iter().filter(|o| o.is_done()).count();
    let failed = outcomes.len() - done;
    if !runner::all_done(&outcomes) {
        warn!(failed, "Some work items failed; see work_items.json");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        items = outcomes.len(),
        done,
        failed,
        report = %runner.report_path().display(),
        "Execution complete"
    );

    Ok(())
}
