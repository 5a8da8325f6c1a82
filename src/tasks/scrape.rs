//! Scrape step: read every result card off the expanded listing.

use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::browser::{BrowserError, BrowserSession};
use crate::models::{RawArticleRecord, NOT_AVAILABLE};

pub(crate) const RESULT_CARD: &str = "//li[@data-testid='search-bodega-result']";
pub(crate) const LISTING_IMAGES: &str = "//li[@data-testid='search-bodega-result']//img";
pub(crate) const LISTING_DESCRIPTIONS: &str =
    "//li[@data-testid='search-bodega-result']//p[@class='css-16nhkrn']";
pub(crate) const CARD_TITLE: &str = ".//h4";
pub(crate) const CARD_DATE: &str = ".//span[@data-testid='todays-date']";
pub(crate) const CARD_DESCRIPTION: &str = ".//p[@class='css-16nhkrn']";
pub(crate) const CARD_IMAGE: &str = ".//img[@class='css-rq4mmj']";

/// Read every result card into a [`RawArticleRecord`].
///
/// Title and date badge are required card children; a card without them
/// fails the scrape. Description and image are frequently absent on real
/// listings and fall back to `"N/A"`. Exact duplicate cards (the listing
/// repeats some across show-more pages) are dropped, keeping the first
/// occurrence.
#[instrument(level = "info", skip_all)]
pub async fn collect_records<B: BrowserSession>(
    session: &B,
) -> Result<Vec<RawArticleRecord>, BrowserError> {
    let card_count = session.count_elements(RESULT_CARD).await?;
    let image_count = session.count_elements(LISTING_IMAGES).await?;
    let description_count = session.count_elements(LISTING_DESCRIPTIONS).await?;
    debug!(
        cards = card_count,
        missing_images = card_count.saturating_sub(image_count),
        missing_descriptions = card_count.saturating_sub(description_count),
        "Listing inventory"
    );

    let cards = session.find_all(RESULT_CARD).await?;
    let mut records = Vec::with_capacity(cards.len());
    for card in &cards {
        records.push(read_card(session, card).await?);
    }

    let records: Vec<RawArticleRecord> = records.into_iter().unique().collect();
    info!(count = records.len(), "Collected result cards");
    Ok(records)
}

async fn read_card<B: BrowserSession>(
    session: &B,
    card: &B::Element,
) -> Result<RawArticleRecord, BrowserError> {
    let title_node = session.find_child(card, CARD_TITLE).await?;
    let date_node = session.find_child(card, CARD_DATE).await?;
    let title = session.text_of(&title_node).await?;
    let published = session.text_of(&date_node).await?;

    let description = match session.find_child(card, CARD_DESCRIPTION).await {
        Ok(node) => session.text_of(&node).await?,
        Err(BrowserError::NotFound(_)) => NOT_AVAILABLE.to_string(),
        Err(other) => return Err(other),
    };

    let image_url = match session.find_child(card, CARD_IMAGE).await {
        Ok(node) => session
            .attribute(&node, "src")
            .await?
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        Err(BrowserError::NotFound(_)) => NOT_AVAILABLE.to_string(),
        Err(other) => return Err(other),
    };

    Ok(RawArticleRecord {
        title,
        published,
        description,
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{CardSpec, ScriptedBrowser};

    #[tokio::test]
    async fn complete_cards_are_read_in_listing_order() {
        let browser = ScriptedBrowser::with_cards(
            "https://example.org/search?query=a",
            vec![
                CardSpec::new(
                    "Fed raises rates",
                    "April 18",
                    Some("Markets wobbled."),
                    Some("https://img.example.org/a/rates.png?w=600"),
                ),
                CardSpec::new(
                    "Rates fall again",
                    "April 17",
                    Some("Or did they."),
                    Some("https://img.example.org/a/fall.png"),
                ),
            ],
        );

        let records = collect_records(&browser).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Fed raises rates");
        assert_eq!(records[0].published, "April 18");
        assert_eq!(records[0].description, "Markets wobbled.");
        assert_eq!(
            records[0].image_url,
            "https://img.example.org/a/rates.png?w=600"
        );
        assert_eq!(records[1].title, "Rates fall again");
    }

    #[tokio::test]
    async fn missing_description_and_image_fall_back_to_the_sentinel() {
        let browser = ScriptedBrowser::with_cards(
            "https://example.org/search?query=a",
            vec![CardSpec::new("Bare card", "April 16", None, None)],
        );

        let records = collect_records(&browser).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, NOT_AVAILABLE);
        assert_eq!(records[0].image_url, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn exact_duplicates_are_dropped_keeping_first_occurrence() {
        let repeated = CardSpec::new(
            "Shown twice",
            "April 15",
            Some("Same card on two pages."),
            Some("https://img.example.org/twice.png"),
        );
        let browser = ScriptedBrowser::with_cards(
            "https://example.org/search?query=a",
            vec![
                repeated.clone(),
                CardSpec::new("Unique", "April 14", None, None),
                repeated,
            ],
        );

        let records = collect_records(&browser).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Shown twice");
        assert_eq!(records[1].title, "Unique");
    }
}
