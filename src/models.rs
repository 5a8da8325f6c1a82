//! Data models for scraped listings and their derived representations.
//!
//! This module defines the core data structures used throughout the run:
//! - [`RawArticleRecord`]: one result card exactly as scraped from the page
//! - [`EnrichedArticleRecord`]: a raw record plus the derived money flag,
//!   phrase count, and normalized image filename
//! - [`ImageManifestEntry`]: one distinct image to download, keyed by its
//!   normalized filename
//! - [`DateWindow`]: the month-aligned date range typed into the site's
//!   "Specific Dates" filter
//!
//! Missing card children (description, image) are carried as the literal
//! string [`NOT_AVAILABLE`] rather than `Option`, because that sentinel is
//! what lands in the spreadsheet and what the image loop filters on.

use serde::Serialize;

/// Sentinel stored wherever the page had no value to offer.
pub const NOT_AVAILABLE: &str = "N/A";

/// A single search-result card as scraped from the listing.
///
/// Produced by the scrape step and never mutated afterwards; enrichment
/// builds new records instead. Derives `Eq + Hash` so identical cards
/// (the site occasionally repeats one across "show more" pages) can be
/// deduplicated while preserving first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawArticleRecord {
    /// The headline text of the card.
    pub title: String,
    /// The date badge text, verbatim (e.g. "April 18").
    pub published: String,
    /// The teaser paragraph, or [`NOT_AVAILABLE`] when the card has none.
    pub description: String,
    /// The article image URL, or [`NOT_AVAILABLE`] when the card has none.
    pub image_url: String,
}

/// A raw record with the derived columns filled in.
///
/// Derived deterministically from one [`RawArticleRecord`] and the search
/// term; it has no identity of its own and can always be rebuilt from its
/// source. One spreadsheet row per value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedArticleRecord {
    pub title: String,
    pub published: String,
    pub description: String,
    /// Normalized image filename, or [`NOT_AVAILABLE`].
    pub image_name: String,
    /// Whether title+description mention a monetary amount.
    pub contains_money: bool,
    /// Non-overlapping, case-insensitive occurrences of the search term.
    pub search_phrase_count: usize,
}

/// One distinct image referenced by the scraped records.
///
/// The manifest holds at most one entry per normalized filename; when two
/// cards reference the same filename through different query strings, the
/// first URL seen wins and later ones are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageManifestEntry {
    /// Normalized filename, unique within the manifest.
    pub image_name: String,
    /// The URL the bytes are fetched from.
    pub image_url: String,
}

/// Start/end dates for the site's specific-dates filter.
///
/// `end` is always "today"; `start` is the first day of a month
/// determined by the configured month count. Both are pre-formatted as
/// `MM/DD/YYYY` because they are typed into the page's inputs verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct DateWindow {
    pub start: String,
    pub end: String,
}
