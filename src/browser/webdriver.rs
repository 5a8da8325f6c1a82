//! Fantoccini-backed [`BrowserSession`].
//!
//! Connects to an already-running WebDriver endpoint (chromedriver or a
//! Selenium grid) and maps the wire-level failures onto [`BrowserError`]
//! variants the pipeline can react to. The W3C wire protocol reports the
//! interesting conditions as error strings, so classification goes by
//! message where fantoccini has no dedicated variant.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::key::Key;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map};
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::{BrowserError, BrowserSession};

/// How long element waits and visibility polls may run.
const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause between visibility re-checks.
const VISIBILITY_POLL: Duration = Duration::from_millis(250);

/// A live WebDriver session.
pub struct WebdriverSession {
    client: Client,
}

impl WebdriverSession {
    /// Open a fresh browser session against `webdriver_url`.
    ///
    /// # Arguments
    ///
    /// * `webdriver_url` - Address of the WebDriver endpoint, for example
    ///   `http://localhost:9515`.
    /// * `headless` - Run the browser without a visible window.
    #[instrument(level = "info", skip_all)]
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, BrowserError> {
        let mut chrome_args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if headless {
            chrome_args.push("--headless=new".to_string());
        }

        let mut capabilities = Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": chrome_args }),
        );

        let client = ClientBuilder::rustls()
            .map_err(|err| BrowserError::Driver(err.to_string()))?
            .capabilities(capabilities)
            .connect(webdriver_url)
            .await
            .map_err(|err| BrowserError::Driver(err.to_string()))?;

        debug!(url = webdriver_url, headless, "WebDriver session established");
        Ok(Self { client })
    }

    /// End the session, closing the browser window.
    pub async fn close(self) -> Result<(), BrowserError> {
        self.client.close().await.map_err(classify)
    }

    async fn find(&self, selector: &str) -> Result<Element, BrowserError> {
        self.client
            .find(Locator::XPath(selector))
            .await
            .map_err(classify)
    }
}

/// Map a fantoccini failure onto the variant the pipeline dispatches on.
fn classify(err: CmdError) -> BrowserError {
    if matches!(err, CmdError::WaitTimeout) {
        return BrowserError::NotFound(err.to_string());
    }
    classify_message(err.to_string())
}

/// Pick a variant from the wire-level error text.
fn classify_message(message: String) -> BrowserError {
    if message.contains("stale element reference") {
        BrowserError::Stale
    } else if message.contains("element click intercepted") {
        BrowserError::ClickIntercepted(message)
    } else if message.contains("no such element") {
        BrowserError::NotFound(message)
    } else {
        BrowserError::Driver(message)
    }
}

#[async_trait]
impl BrowserSession for WebdriverSession {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.client.goto(url).await.map_err(classify)
    }

    async fn current_location(&self) -> Result<String, BrowserError> {
        let url = self.client.current_url().await.map_err(classify)?;
        Ok(url.to_string())
    }

    async fn back(&self) -> Result<(), BrowserError> {
        self.client.back().await.map_err(classify)
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        self.client.refresh().await.map_err(classify)
    }

    async fn count_elements(&self, selector: &str) -> Result<usize, BrowserError> {
        let found = self
            .client
            .find_all(Locator::XPath(selector))
            .await
            .map_err(classify)?;
        Ok(found.len())
    }

    async fn element_present(&self, selector: &str) -> Result<bool, BrowserError> {
        let found = self
            .client
            .find_all(Locator::XPath(selector))
            .await
            .map_err(classify)?;
        Ok(!found.is_empty())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.client
            .find_all(Locator::XPath(selector))
            .await
            .map_err(classify)
    }

    async fn find_child(
        &self,
        parent: &Element,
        selector: &str,
    ) -> Result<Element, BrowserError> {
        parent
            .find(Locator::XPath(selector))
            .await
            .map_err(classify)
    }

    async fn text_of(&self, element: &Element) -> Result<String, BrowserError> {
        element.text().await.map_err(classify)
    }

    async fn attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        element.attr(name).await.map_err(classify)
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        element.click().await.map_err(classify)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        element.clear().await.map_err(classify)?;
        element.send_keys(text).await.map_err(classify)
    }

    async fn press_enter(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        let enter = char::from(Key::Enter).to_string();
        element.send_keys(&enter).await.map_err(classify)
    }

    async fn select_by_value(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        element.select_by_value(value).await.map_err(classify)
    }

    async fn wait_visible(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .client
            .wait()
            .at_most(WAIT_TIMEOUT)
            .for_element(Locator::XPath(selector))
            .await
            .map_err(classify)?;

        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            if element.is_displayed().await.map_err(classify)? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::NotFound(format!(
                    "element never became visible: {selector}"
                )));
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.client.screenshot().await.map_err(classify)
    }
}
