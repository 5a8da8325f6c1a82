//! Derived-column computation for scraped records.
//!
//! Everything in this module is pure: the money classifier, the phrase
//! counter, the image-URL normalizer, and [`enrich`], which runs all three
//! over a batch of raw records and splits out the deduplicated image
//! manifest as a side product.
//!
//! # Money matching
//!
//! A text blob "contains money" when any of these shapes appears anywhere
//! in it:
//! - `$` followed by digits/commas, optional 1–2 decimals, optional
//!   trailing ` USD` or ` dollars` (e.g. `$11.1`, `$111,111.11 USD`)
//! - `$` followed by plain digits
//! - a bare integer, whitespace, then the word `dollars` or `USD`
//!   (word-boundary delimited, literal case)
//!
//! The classifier only answers yes/no; it never locates or counts matches.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{EnrichedArticleRecord, ImageManifestEntry, RawArticleRecord, NOT_AVAILABLE};

static MONEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\$[\d,]+(\.\d{1,2})?( USD| dollars)?",
        r"|\$\d+",
        r"|(\b\d+\s+dollars\b)|(\b\d+\s+USD\b)",
    ))
    .expect("money pattern compiles")
});

/// Report whether `text` mentions a monetary amount.
pub fn contains_money(text: &str) -> bool {
    MONEY_PATTERN.is_match(text)
}

/// Count non-overlapping, case-insensitive occurrences of `phrase` in `text`.
///
/// Both inputs are lowercased before scanning, and the scan resumes past
/// each match: `count_phrase("aaaa", "aa")` is 2, not 3.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    text.to_lowercase()
        .matches(&phrase.to_lowercase())
        .count()
}

/// Reduce an image URL to a bare filename.
///
/// Takes the last `/`-delimited segment and strips everything from the
/// first `?` on, so CDN sizing parameters don't produce distinct names
/// for the same picture. The [`NOT_AVAILABLE`] sentinel passes through
/// untouched.
///
/// ```ignore
/// assert_eq!(clean_image_url("https://x.com/a/b.png?quality=75"), "b.png");
/// assert_eq!(clean_image_url("N/A"), "N/A");
/// ```
pub fn clean_image_url(image_url: &str) -> String {
    if image_url == NOT_AVAILABLE {
        return image_url.to_string();
    }
    let filename = image_url.rsplit('/').next().unwrap_or(image_url);
    let filename = filename.split('?').next().unwrap_or(filename);
    filename.to_string()
}

/// Derive the enriched records and the image manifest from a scraped batch.
///
/// For each raw record, in input order, the title and description are
/// concatenated (no separator) and the money flag and phrase count are
/// computed over that blob. The image URL is normalized to a filename;
/// the first record to produce a given non-[`NOT_AVAILABLE`] filename
/// contributes a manifest entry, and later records producing the same
/// filename are silently skipped even when their URLs differ by query
/// string.
///
/// Empty input yields empty outputs; this function never fails.
pub fn enrich(
    records: &[RawArticleRecord],
    search_term: &str,
) -> (Vec<EnrichedArticleRecord>, Vec<ImageManifestEntry>) {
    let mut enriched = Vec::with_capacity(records.len());
    let mut manifest = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for record in records {
        let blob = format!("{}{}", record.title, record.description);
        let image_name = clean_image_url(&record.image_url);

        enriched.push(EnrichedArticleRecord {
            title: record.title.clone(),
            published: record.published.clone(),
            description: record.description.clone(),
            image_name: image_name.clone(),
            contains_money: contains_money(&blob),
            search_phrase_count: count_phrase(&blob, search_term),
        });

        if image_name != NOT_AVAILABLE && seen_names.insert(image_name.clone()) {
            manifest.push(ImageManifestEntry {
                image_name,
                image_url: record.image_url.clone(),
            });
        }
    }

    debug!(
        records = enriched.len(),
        images = manifest.len(),
        "Enriched scraped records"
    );
    (enriched, manifest)
}
