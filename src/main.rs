//! # Bodega
//!
//! A search robot for a news site: it opens the site in a real browser,
//! runs an operator-configured search, narrows it by date, section and
//! category, clicks "show more" until the listing is complete, and turns
//! what it finds into an Excel report plus a zip of article images.
//!
//! ## Features
//!
//! - Configured entirely from a JSON work item payload or environment
//!   variables (search term, month window, section and category filters)
//! - Survives the listing's flaky "show more" pagination: drifted
//!   locations, intercepted clicks, stale buttons and vanished controls
//!   are classified and recovered instead of killing the run
//! - Flags rows whose text mentions an amount of money and counts the
//!   search phrase occurrences per row
//! - Downloads every article image with a bounded retry loop and zips
//!   the results
//!
//! ## Usage
//!
//! ```sh
//! bodega --payload ./work-item.json -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Configure**: Resolve the work item payload, compute the date window
//! 2. **Drive**: Open the site, search, filter, expand every result page
//! 3. **Scrape**: Read title, date, description and image from each card
//! 4. **Enrich**: Money detection, phrase counts, image name cleanup
//! 5. **Output**: Write the spreadsheet, download and archive the images

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod browser;
mod cli;
mod config;
mod dates;
mod enrich;
mod models;
mod outputs;
mod tasks;
mod utils;

use browser::webdriver::WebdriverSession;
use browser::BrowserSession;
use cli::Cli;
use config::RunConfig;
use dates::compute_window;
use models::DateWindow;
use outputs::images::{download_and_archive, HttpImageFetcher, ImageFetcher};
use outputs::spreadsheet::write_report;
use tasks::pagination::PaginationDriver;
use utils::{prepare_output_area, screenshot_filename, OutputPaths};

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
    info!("bodega starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.webdriver_url, ?args.output_dir, "Parsed CLI arguments");

    // ---- Configuration ----
    let config = RunConfig::load(args.payload.as_deref().map(Path::new))?;
    let window = compute_window(config.months, Local::now().date_naive())?;
    info!(
        search = %config.search,
        months = config.months,
        start = %window.start,
        end = %window.end,
        sections = config.sections.len(),
        categories = config.categories.len(),
        "Run configured"
    );

    let paths = prepare_output_area(Path::new(&args.output_dir))?;

    // ---- Browser session ----
    let session = WebdriverSession::connect(&args.webdriver_url, args.headless).await?;

    let outcome = run_robot(&session, &HttpImageFetcher::new(), &config, &window, &paths).await;

    if let Err(ref e) = outcome {
        error!(error = %e, "Run failed, saving a screenshot of the page");
        save_failure_screenshot(&session, &paths).await;
    }

    if let Err(e) = session.close().await {
        warn!(error = %e, "Browser session did not shut down cleanly");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    outcome
}

/// Drive one complete run against an open browser session.
///
/// Every page interaction, the scrape and both outputs happen here, so a
/// failure at any stage surfaces as a single error the caller can
/// screenshot against whatever the page looked like at that moment.
#[instrument(level = "info", skip_all, fields(search = %config.search))]
async fn run_robot<B: BrowserSession, F: ImageFetcher>(
    session: &B,
    fetcher: &F,
    config: &RunConfig,
    window: &DateWindow,
    paths: &OutputPaths,
) -> Result<(), Box<dyn Error>> {
    // ---- Drive the listing ----
    tasks::open_site(session).await?;
    tasks::search::search_news(session, &config.search).await?;
    tasks::filters::apply_filters(session, &config.sections, &config.categories, window).await?;

    let origin = session.current_location().await?;
    let mut pager = PaginationDriver::new(origin);
    let total = pager.expand_all(session).await?;
    info!(total, "Result listing fully expanded");

    // ---- Scrape and enrich ----
    let records = tasks::scrape::collect_records(session).await?;
    let (rows, manifest) = enrich::enrich(&records, &config.search);
    info!(
        rows = rows.len(),
        images = manifest.len(),
        "Listing scraped and enriched"
    );

    // ---- Outputs ----
    let report = write_report(&rows, &config.search, &paths.root)?;
    info!(path = %report.display(), "Spreadsheet written");

    let archive = download_and_archive(fetcher, &manifest, paths).await?;
    info!(path = %archive.display(), "Image archive written");

    Ok(())
}

/// Capture the page for the postmortem. Never fails the run.
async fn save_failure_screenshot<B: BrowserSession>(session: &B, paths: &OutputPaths) {
    match session.screenshot().await {
        Ok(bytes) => {
            let path = paths.root.join(screenshot_filename(Local::now()));
            match tokio::fs::write(&path, bytes).await {
                Ok(()) => info!(path = %path.display(), "Failure screenshot saved"),
                Err(e) => warn!(error = %e, "Could not write the failure screenshot"),
            }
        }
        Err(e) => warn!(error = %e, "Could not capture the page"),
    }
}
