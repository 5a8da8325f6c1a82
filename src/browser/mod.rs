//! Browser capability behind a trait.
//!
//! Everything the robot does to a page goes through [`BrowserSession`], so
//! the pipeline stays generic over how the page is actually driven. The one
//! real implementation is [`webdriver::WebdriverSession`] (fantoccini over a
//! WebDriver endpoint); tests drive the same code with a scripted fake.
//!
//! Failures that the result-expansion loop knows how to recover from get
//! their own [`BrowserError`] variants; everything else is an opaque
//! [`BrowserError::Driver`].

pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

/// Page-driving failures, split by how the caller reacts to them.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No element matched the selector (or it never appeared in time).
    #[error("element not found: {0}")]
    NotFound(String),
    /// The element went invalid between lookup and use.
    #[error("stale element reference")]
    Stale,
    /// Another element would have received the click.
    #[error("element click intercepted: {0}")]
    ClickIntercepted(String),
    /// The page is not where the caller expected it to be.
    #[error("location should have been {expected}, was {actual}")]
    LocationMismatch { expected: String, actual: String },
    /// Anything else the driver reported.
    #[error("webdriver failure: {0}")]
    Driver(String),
}

/// One live browser page and the operations the robot needs from it.
///
/// Selectors are XPath expressions throughout. Element handles are opaque
/// to callers; they only flow back into [`find_child`], [`text_of`] and
/// [`attribute`].
///
/// [`find_child`]: BrowserSession::find_child
/// [`text_of`]: BrowserSession::text_of
/// [`attribute`]: BrowserSession::attribute
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Clone + Send + Sync;

    async fn goto(&self, url: &str) -> Result<(), BrowserError>;
    async fn current_location(&self) -> Result<String, BrowserError>;
    async fn back(&self) -> Result<(), BrowserError>;
    async fn reload(&self) -> Result<(), BrowserError>;

    async fn count_elements(&self, selector: &str) -> Result<usize, BrowserError>;
    async fn element_present(&self, selector: &str) -> Result<bool, BrowserError>;
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, BrowserError>;
    async fn find_child(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Self::Element, BrowserError>;
    async fn text_of(&self, element: &Self::Element) -> Result<String, BrowserError>;
    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;
    /// Clear the matched input and type `text` into it.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError>;
    async fn press_enter(&self, selector: &str) -> Result<(), BrowserError>;
    async fn select_by_value(&self, selector: &str, value: &str) -> Result<(), BrowserError>;
    /// Block until the matched element exists and is displayed.
    async fn wait_visible(&self, selector: &str) -> Result<(), BrowserError>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;

    /// Fail with [`BrowserError::LocationMismatch`] unless the page is at
    /// `expected`.
    async fn require_location(&self, expected: &str) -> Result<(), BrowserError> {
        let actual = self.current_location().await?;
        if actual != expected {
            return Err(BrowserError::LocationMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    async fn click_when_visible(&self, selector: &str) -> Result<(), BrowserError> {
        self.wait_visible(selector).await?;
        self.click(selector).await
    }

    async fn fill_when_visible(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.wait_visible(selector).await?;
        self.fill(selector, text).await
    }
}
