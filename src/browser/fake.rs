//! Scripted in-memory session for exercising the pipeline without a browser.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{BrowserError, BrowserSession};
use crate::tasks::scrape;

/// One listing card the fake will present.
#[derive(Debug, Clone)]
pub(crate) struct CardSpec {
    pub title: String,
    pub date: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl CardSpec {
    pub fn new(title: &str, date: &str, description: Option<&str>, image: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            date: date.to_string(),
            description: description.map(str::to_string),
            image: image.map(str::to_string),
        }
    }
}

/// Opaque node handle the fake hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeNode {
    Card(usize),
    Title(usize),
    Date(usize),
    Description(usize),
    Image(usize),
}

/// Scripted [`BrowserSession`].
///
/// Each queue feeds one trait method; when a queue runs dry the method falls
/// back to a steady-state answer derived from the configured cards: counts
/// come from the card list, the location is `origin`, clicks and waits
/// succeed, and the presence check reports absent (so expansion loops wind
/// down instead of spinning). Every interesting call is appended to `calls`
/// so tests can assert on ordering and recovery actions.
pub(crate) struct ScriptedBrowser {
    origin: String,
    cards: Vec<CardSpec>,
    counts: Mutex<VecDeque<usize>>,
    presence: Mutex<VecDeque<bool>>,
    locations: Mutex<VecDeque<String>>,
    click_results: Mutex<VecDeque<Result<(), BrowserError>>>,
    wait_results: Mutex<VecDeque<Result<(), BrowserError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    pub fn at(origin: &str) -> Self {
        Self::with_cards(origin, Vec::new())
    }

    pub fn with_cards(origin: &str, cards: Vec<CardSpec>) -> Self {
        Self {
            origin: origin.to_string(),
            cards,
            counts: Mutex::new(VecDeque::new()),
            presence: Mutex::new(VecDeque::new()),
            locations: Mutex::new(VecDeque::new()),
            click_results: Mutex::new(VecDeque::new()),
            wait_results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_count(&self, count: usize) {
        self.counts.lock().expect("counts lock").push_back(count);
    }

    pub fn push_counts(&self, counts: &[usize]) {
        for count in counts {
            self.push_count(*count);
        }
    }

    pub fn push_presence(&self, present: bool) {
        self.presence
            .lock()
            .expect("presence lock")
            .push_back(present);
    }

    pub fn push_location(&self, location: &str) {
        self.locations
            .lock()
            .expect("locations lock")
            .push_back(location.to_string());
    }

    pub fn push_click(&self, result: Result<(), BrowserError>) {
        self.click_results
            .lock()
            .expect("clicks lock")
            .push_back(result);
    }

    pub fn push_wait(&self, result: Result<(), BrowserError>) {
        self.wait_results
            .lock()
            .expect("waits lock")
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn log(&self, entry: String) {
        self.calls.lock().expect("calls lock").push(entry);
    }

    fn card(&self, index: usize) -> &CardSpec {
        &self.cards[index]
    }
}

fn pop<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue.lock().expect("queue lock").pop_front()
}

#[async_trait]
impl BrowserSession for ScriptedBrowser {
    type Element = FakeNode;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.log(format!("goto:{url}"));
        Ok(())
    }

    async fn current_location(&self) -> Result<String, BrowserError> {
        self.log("location".to_string());
        Ok(pop(&self.locations).unwrap_or_else(|| self.origin.clone()))
    }

    async fn back(&self) -> Result<(), BrowserError> {
        self.log("back".to_string());
        Ok(())
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        self.log("reload".to_string());
        Ok(())
    }

    async fn count_elements(&self, selector: &str) -> Result<usize, BrowserError> {
        self.log(format!("count:{selector}"));
        if let Some(scripted) = pop(&self.counts) {
            return Ok(scripted);
        }
        let count = match selector {
            scrape::LISTING_IMAGES => self.cards.iter().filter(|c| c.image.is_some()).count(),
            scrape::LISTING_DESCRIPTIONS => self
                .cards
                .iter()
                .filter(|c| c.description.is_some())
                .count(),
            _ => self.cards.len(),
        };
        Ok(count)
    }

    async fn element_present(&self, selector: &str) -> Result<bool, BrowserError> {
        self.log(format!("present:{selector}"));
        Ok(pop(&self.presence).unwrap_or(false))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeNode>, BrowserError> {
        self.log(format!("find_all:{selector}"));
        if selector == scrape::RESULT_CARD {
            return Ok((0..self.cards.len()).map(FakeNode::Card).collect());
        }
        Ok(Vec::new())
    }

    async fn find_child(
        &self,
        parent: &FakeNode,
        selector: &str,
    ) -> Result<FakeNode, BrowserError> {
        let index = match parent {
            FakeNode::Card(index) => *index,
            other => {
                return Err(BrowserError::Driver(format!(
                    "child lookup on a leaf node: {other:?}"
                )))
            }
        };
        match selector {
            scrape::CARD_TITLE => Ok(FakeNode::Title(index)),
            scrape::CARD_DATE => Ok(FakeNode::Date(index)),
            scrape::CARD_DESCRIPTION if self.card(index).description.is_some() => {
                Ok(FakeNode::Description(index))
            }
            scrape::CARD_IMAGE if self.card(index).image.is_some() => Ok(FakeNode::Image(index)),
            other => Err(BrowserError::NotFound(other.to_string())),
        }
    }

    async fn text_of(&self, element: &FakeNode) -> Result<String, BrowserError> {
        match element {
            FakeNode::Title(index) => Ok(self.card(*index).title.clone()),
            FakeNode::Date(index) => Ok(self.card(*index).date.clone()),
            FakeNode::Description(index) => Ok(self
                .card(*index)
                .description
                .clone()
                .expect("description was scripted")),
            other => Err(BrowserError::Driver(format!("no text on {other:?}"))),
        }
    }

    async fn attribute(
        &self,
        element: &FakeNode,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        match (element, name) {
            (FakeNode::Image(index), "src") => Ok(self.card(*index).image.clone()),
            _ => Ok(None),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.log(format!("click:{selector}"));
        pop(&self.click_results).unwrap_or(Ok(()))
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.log(format!("fill:{selector}:{text}"));
        Ok(())
    }

    async fn press_enter(&self, selector: &str) -> Result<(), BrowserError> {
        self.log(format!("enter:{selector}"));
        Ok(())
    }

    async fn select_by_value(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.log(format!("select:{selector}:{value}"));
        Ok(())
    }

    async fn wait_visible(&self, selector: &str) -> Result<(), BrowserError> {
        self.log(format!("wait:{selector}"));
        pop(&self.wait_results).unwrap_or(Ok(()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.log("screenshot".to_string());
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
