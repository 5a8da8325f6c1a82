//! Result expansion: click "show more" until the listing is complete.
//!
//! The search listing loads one page of cards at a time behind a show-more
//! button, and that button is flaky in several distinct ways. Each poll of
//! the page is reduced to a [`PollOutcome`], and a single transition table
//! decides what to do about it:
//!
//! | Outcome | Recovery |
//! |---------|----------|
//! | `Progressed` | record the new count, keep clicking |
//! | `Stagnant` | jittered pause, poll again without clicking |
//! | `LocationDrifted` | navigate back, reset the click streak |
//! | `ClickBlocked` | reload, forget everything including the count |
//! | `Stale` | reload, keep the last seen count |
//! | `Vanished` | reload, change nothing |
//! | `NoMoreResults` | done, report the final count |
//!
//! Only those transient conditions are absorbed; any other driver failure
//! propagates to the caller. There is deliberately no iteration ceiling:
//! the loop ends exactly when the button is gone while the page is still on
//! the listing, which is the only signal the site gives that every result
//! is loaded.

use std::time::Duration;

use rand::{rng, Rng};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::browser::{BrowserError, BrowserSession};
use crate::tasks::scrape::RESULT_CARD;

pub(crate) const SHOW_MORE_BUTTON: &str = "//button[@data-testid='search-show-more-button']";

/// Base pause before re-polling a listing that has not grown yet.
const STAGNATION_DELAY: Duration = Duration::from_millis(500);
/// Upper bound of the random extra pause added to each stagnation wait.
const STAGNATION_JITTER_MS: u64 = 250;

/// What one poll of the listing concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollOutcome {
    /// The card count moved and the show-more button was clicked.
    Progressed { count: usize },
    /// Nothing changed since the last poll.
    Stagnant,
    /// The page navigated somewhere other than the listing.
    LocationDrifted,
    /// Another element swallowed the show-more click.
    ClickBlocked,
    /// The button handle went invalid mid-interaction.
    Stale,
    /// The button disappeared between the presence check and the click.
    Vanished,
    /// The button is gone for good; the listing is fully expanded.
    NoMoreResults { count: usize },
}

/// Drives the show-more loop for one search listing.
///
/// `origin` anchors the expansion: every poll verifies the page is still at
/// that URL before trusting anything else it sees.
pub struct PaginationDriver {
    origin: String,
    last_count: usize,
    clicks: u32,
    reloads: u32,
    stagnant_polls: u32,
    poll_delay: Option<Duration>,
}

impl PaginationDriver {
    /// Anchor a new driver at the listing URL the expansion must stay on.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            last_count: 0,
            clicks: 0,
            reloads: 0,
            stagnant_polls: 0,
            poll_delay: None,
        }
    }

    /// Replace the jittered stagnation pause with a fixed one.
    #[cfg(test)]
    fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    /// Click through every "show more" page until the listing is complete.
    ///
    /// # Returns
    ///
    /// The number of result cards present when expansion finished, or the
    /// first non-transient driver failure.
    #[instrument(level = "info", skip_all)]
    pub async fn expand_all<B: BrowserSession>(
        &mut self,
        session: &B,
    ) -> Result<usize, BrowserError> {
        loop {
            match self.poll(session).await? {
                PollOutcome::Progressed { count } => {
                    self.clicks += 1;
                    self.stagnant_polls = 0;
                    self.last_count = count;
                    debug!(count, clicks = self.clicks, "Listing grew, clicked show more");
                }
                PollOutcome::Stagnant => {
                    self.stagnant_polls += 1;
                    debug!(polls = self.stagnant_polls, "Listing unchanged, waiting");
                    self.pause().await;
                }
                PollOutcome::LocationDrifted => {
                    warn!("Page drifted off the results listing, going back");
                    session.back().await?;
                    self.clicks = 0;
                    self.stagnant_polls = 0;
                }
                PollOutcome::ClickBlocked => {
                    warn!("Show-more click was intercepted, reloading");
                    session.reload().await?;
                    self.reloads += 1;
                    self.clicks = 0;
                    self.stagnant_polls = 0;
                    self.last_count = 0;
                }
                PollOutcome::Stale => {
                    warn!("Stale element handle, reloading");
                    session.reload().await?;
                    self.reloads += 1;
                    self.clicks = 0;
                    self.stagnant_polls = 0;
                }
                PollOutcome::Vanished => {
                    warn!("Show-more button vanished mid-poll, reloading");
                    session.reload().await?;
                    self.reloads += 1;
                }
                PollOutcome::NoMoreResults { count } => {
                    info!(
                        count,
                        clicks = self.clicks,
                        reloads = self.reloads,
                        "Listing fully expanded"
                    );
                    return Ok(count);
                }
            }
        }
    }

    /// Inspect the listing once and, when it grew, press show-more.
    ///
    /// Checks run in a fixed order: card count, location, button presence,
    /// then the count comparison. The location check comes before the
    /// presence check so a drifted page is never mistaken for a finished
    /// listing.
    async fn poll<B: BrowserSession>(&self, session: &B) -> Result<PollOutcome, BrowserError> {
        let count = session.count_elements(RESULT_CARD).await?;

        match session.require_location(&self.origin).await {
            Ok(()) => {}
            Err(BrowserError::LocationMismatch { .. }) => {
                return Ok(PollOutcome::LocationDrifted)
            }
            Err(other) => return Err(other),
        }

        if !session.element_present(SHOW_MORE_BUTTON).await? {
            return Ok(PollOutcome::NoMoreResults { count });
        }

        if count == self.last_count {
            return Ok(PollOutcome::Stagnant);
        }

        match press_show_more(session).await {
            Ok(()) => Ok(PollOutcome::Progressed { count }),
            Err(BrowserError::ClickIntercepted(_)) => Ok(PollOutcome::ClickBlocked),
            Err(BrowserError::Stale) => Ok(PollOutcome::Stale),
            Err(BrowserError::NotFound(_)) => Ok(PollOutcome::Vanished),
            Err(other) => Err(other),
        }
    }

    async fn pause(&self) {
        let delay = match self.poll_delay {
            Some(fixed) => fixed,
            None => {
                let jitter_ms: u64 = rng().random_range(0..=STAGNATION_JITTER_MS);
                STAGNATION_DELAY + Duration::from_millis(jitter_ms)
            }
        };
        sleep(delay).await;
    }
}

async fn press_show_more<B: BrowserSession>(session: &B) -> Result<(), BrowserError> {
    session.wait_visible(SHOW_MORE_BUTTON).await?;
    session.click(SHOW_MORE_BUTTON).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::ScriptedBrowser;

    const ORIGIN: &str = "https://example.org/search?query=economy";

    fn driver() -> PaginationDriver {
        PaginationDriver::new(ORIGIN).with_poll_delay(Duration::ZERO)
    }

    fn clicks(browser: &ScriptedBrowser) -> usize {
        browser.calls_matching(&format!("click:{SHOW_MORE_BUTTON}"))
    }

    #[tokio::test]
    async fn clicks_until_the_button_disappears() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 20, 20]);
        browser.push_presence(true);
        browser.push_presence(true);

        let count = driver().expand_all(&browser).await.unwrap();

        assert_eq!(count, 20);
        assert_eq!(clicks(&browser), 2);
        assert_eq!(browser.calls_matching("reload"), 0);
    }

    #[tokio::test]
    async fn unchanged_count_waits_instead_of_clicking() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 10, 10]);
        browser.push_presence(true);
        browser.push_presence(true);

        let count = driver().expand_all(&browser).await.unwrap();

        assert_eq!(count, 10);
        assert_eq!(clicks(&browser), 1);
    }

    #[tokio::test]
    async fn absent_button_finishes_without_any_clicks() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_count(0);

        let count = driver().expand_all(&browser).await.unwrap();

        assert_eq!(count, 0);
        assert_eq!(clicks(&browser), 0);
    }

    #[tokio::test]
    async fn intercepted_click_reloads_and_forgets_the_count() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 20, 10, 10]);
        browser.push_presence(true);
        browser.push_presence(true);
        browser.push_presence(true);
        browser.push_click(Ok(()));
        browser.push_click(Err(BrowserError::ClickIntercepted("overlay".to_string())));

        let count = driver().expand_all(&browser).await.unwrap();

        // After the reload the old count of 10 reads as fresh progress and
        // gets a third click, which only happens if the remembered count
        // was dropped to zero.
        assert_eq!(count, 10);
        assert_eq!(clicks(&browser), 3);
        assert_eq!(browser.calls_matching("reload"), 1);
    }

    #[tokio::test]
    async fn drifted_location_goes_back_and_keeps_the_count() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 20, 10, 10]);
        browser.push_location(ORIGIN);
        browser.push_location("https://example.org/some-article");
        browser.push_presence(true);
        browser.push_presence(true);

        let count = driver().expand_all(&browser).await.unwrap();

        // The post-recovery poll sees 10 again and stays quiet, which only
        // happens if the remembered count survived the drift.
        assert_eq!(count, 10);
        assert_eq!(clicks(&browser), 1);
        assert_eq!(browser.calls_matching("back"), 1);
        assert_eq!(browser.calls_matching("reload"), 0);
    }

    #[tokio::test]
    async fn stale_element_reloads_and_keeps_the_count() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 20, 10, 10]);
        browser.push_presence(true);
        browser.push_presence(true);
        browser.push_presence(true);
        browser.push_click(Ok(()));
        browser.push_click(Err(BrowserError::Stale));

        let count = driver().expand_all(&browser).await.unwrap();

        assert_eq!(count, 10);
        assert_eq!(clicks(&browser), 2);
        assert_eq!(browser.calls_matching("reload"), 1);
    }

    #[tokio::test]
    async fn vanished_button_reloads_and_tries_again() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 10, 10]);
        browser.push_presence(true);
        browser.push_presence(true);
        browser.push_wait(Err(BrowserError::NotFound(SHOW_MORE_BUTTON.to_string())));

        let count = driver().expand_all(&browser).await.unwrap();

        assert_eq!(count, 10);
        assert_eq!(clicks(&browser), 1);
        assert_eq!(browser.calls_matching("reload"), 1);
    }

    #[tokio::test]
    async fn driver_failures_are_not_absorbed() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_count(10);
        browser.push_presence(true);
        browser.push_click(Err(BrowserError::Driver("connection reset".to_string())));

        let err = driver().expand_all(&browser).await.unwrap_err();
        assert!(matches!(err, BrowserError::Driver(_)));
    }

    #[tokio::test]
    async fn location_is_checked_before_the_button_lookup() {
        let browser = ScriptedBrowser::at(ORIGIN);
        browser.push_counts(&[10, 10, 10]);
        browser.push_location("https://example.org/interstitial");
        browser.push_presence(true);

        let count = driver().expand_all(&browser).await.unwrap();

        // The drifted first poll must not consume the one scripted presence
        // answer; the second poll still sees it and clicks. If presence were
        // read first the answer would be gone and nothing would be clicked.
        assert_eq!(count, 10);
        assert_eq!(browser.calls_matching("back"), 1);
        assert_eq!(clicks(&browser), 1);
    }
}
