//! The page-driving steps of the robot, in pipeline order.
//!
//! Each submodule owns one stage and its selectors:
//!
//! 1. [`search`]: open the search widget and submit the term
//! 2. [`filters`]: date window, newest-first ordering, section/category picks
//! 3. [`pagination`]: click "show more" until the listing stops growing
//! 4. [`scrape`]: read every result card into a [`RawArticleRecord`]
//!
//! All steps are generic over [`BrowserSession`] so they run identically
//! against a live WebDriver endpoint and the scripted test fake.
//!
//! [`RawArticleRecord`]: crate::models::RawArticleRecord

pub mod filters;
pub mod pagination;
pub mod scrape;
pub mod search;

use tracing::{info, instrument};

use crate::browser::{BrowserError, BrowserSession};

/// Front page the run starts from.
pub const SITE_URL: &str = "https://www.nytimes.com/";

/// Open the news site's front page.
#[instrument(level = "info", skip_all)]
pub async fn open_site<B: BrowserSession>(session: &B) -> Result<(), BrowserError> {
    session.goto(SITE_URL).await?;
    info!(url = SITE_URL, "Opened news site");
    Ok(())
}
