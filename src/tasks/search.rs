//! Search step: open the site's search widget and submit the term.

use tracing::{info, instrument};

use crate::browser::{BrowserError, BrowserSession};

const SEARCH_OPEN_BUTTON: &str = "//button[contains(@class, 'css-tkwi90')]";
const SEARCH_INPUT: &str = "//input[@data-testid='search-input']";
const SEARCH_SUBMIT: &str = "//button[@data-test-id='search-submit']";

/// Search the site for `term`.
///
/// Opens the header search widget, types the term once the input is
/// visible, and submits. The resulting listing URL becomes the anchor for
/// the expansion loop, so callers read the location after this returns.
#[instrument(level = "info", skip_all, fields(%term))]
pub async fn search_news<B: BrowserSession>(session: &B, term: &str) -> Result<(), BrowserError> {
    session.click(SEARCH_OPEN_BUTTON).await?;
    session.fill_when_visible(SEARCH_INPUT, term).await?;
    session.click_when_visible(SEARCH_SUBMIT).await?;
    info!(term, "Submitted search");
    Ok(())
}
