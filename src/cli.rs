//! Command-line interface definitions for the search robot.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection details can be provided via command-line flags or environment
//! variables, so the binary drops into a scheduler without a wrapper script.

use clap::Parser;

/// Command-line arguments for a robot run.
///
/// This struct defines all configuration options that can be passed to the
/// application at runtime. The search itself (term, date range, filters) is
/// configured through the work item payload or environment variables, not
/// here; these options only place the run and point it at a browser.
///
/// # Examples
///
/// ```sh
/// # Run against a local chromedriver with the default output directory
/// bodega
///
/// # Point at a remote WebDriver and a custom output area
/// bodega --webdriver-url http://selenium:4444 -o /data/run42
///
/// # Read the work item payload from a file instead of the environment
/// bodega --payload ./work-item.json --headless
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// WebDriver endpoint the browser session connects to
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Output directory for the report, the images and their archive
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Optional path to a JSON work item payload
    #[arg(short, long)]
    pub payload: Option<String>,

    /// Run the browser without a visible window
    #[arg(long)]
    pub headless: bool,
}
