//! Filter step: date window, result ordering, and category selection.
//!
//! The listing offers two filter drop-downs, "section" and "type". The
//! operator supplies a wish list for each; only one of the two is actually
//! applied per run (the longer list wins, sections on a tie), except when
//! both are empty, in which case "Any" is picked in both drop-downs. That
//! selection rule is pure ([`plan_selection`]) and tested apart from any
//! page driving.

use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::browser::{BrowserError, BrowserSession};
use crate::models::DateWindow;

const DATE_DROPDOWN: &str = "//button[@data-testid='search-date-dropdown-a']";
const SPECIFIC_DATES_BUTTON: &str = "//button[@type='button'][text()='Specific Dates']";
const START_DATE_INPUT: &str = "//input[@data-testid='DateRange-startDate']";
const END_DATE_INPUT: &str = "//input[@data-testid='DateRange-endDate']";
const SORT_SELECT: &str = "//select[@data-testid='SearchForm-sortBy']";
const SECTION_DROPDOWN: &str = "//div[@data-testid='section']//button";
const TYPE_DROPDOWN: &str = "//div[@data-testid='type']//button";
const FILTER_OPTION_LABELS: &str = "//ul[@class='css-64f9ga']//label/span";
const FILTER_OPTION_COUNTS: &str = "//ul[@class='css-64f9ga']//label/span/span";

/// The two filter drop-downs on the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterGroup {
    Section,
    Type,
}

impl FilterGroup {
    fn button(self) -> &'static str {
        match self {
            FilterGroup::Section => SECTION_DROPDOWN,
            FilterGroup::Type => TYPE_DROPDOWN,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FilterGroup::Section => "section",
            FilterGroup::Type => "type",
        }
    }
}

/// Which drop-down(s) to touch, decided from the two requested lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPlan {
    /// Neither list was given; pick "Any" in both drop-downs.
    BothAny,
    Sections(Vec<String>),
    Categories(Vec<String>),
}

/// Decide which requested list gets applied.
pub fn plan_selection(sections: &[String], categories: &[String]) -> SelectionPlan {
    if sections.is_empty() && categories.is_empty() {
        SelectionPlan::BothAny
    } else if sections.len() >= categories.len() {
        SelectionPlan::Sections(sections.to_vec())
    } else {
        SelectionPlan::Categories(categories.to_vec())
    }
}

/// Strip the article-count suffix the site appends to each filter label.
///
/// The drop-down's first option ("Any") carries no count span, so the
/// count list is offset by one: label `i` pairs with `counts[i - 1]`.
/// Labels without a matching count entry are kept whole.
pub fn strip_count_suffixes(labels: &[String], counts: &[String]) -> Vec<String> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            if index == 0 {
                return label.clone();
            }
            match counts.get(index - 1) {
                Some(count) => label.replace(count.as_str(), ""),
                None => label.clone(),
            }
        })
        .collect()
}

/// Requested items that the drop-down actually offers, deduplicated,
/// in the order the operator listed them.
fn intersect(requested: &[String], available: &[String]) -> Vec<String> {
    requested
        .iter()
        .unique()
        .filter(|item| available.contains(*item))
        .cloned()
        .collect()
}

/// Apply the date window, newest-first ordering, and the operator's
/// section/category wishes to the listing.
#[instrument(level = "info", skip_all)]
pub async fn apply_filters<B: BrowserSession>(
    session: &B,
    sections: &[String],
    categories: &[String],
    window: &DateWindow,
) -> Result<(), BrowserError> {
    filter_by_dates(session, window).await?;
    sort_newest(session).await?;

    let section_options = read_group_options(session, FilterGroup::Section).await?;
    let type_options = read_group_options(session, FilterGroup::Type).await?;

    match plan_selection(sections, categories) {
        SelectionPlan::BothAny => {
            let any = vec!["Any".to_string()];
            apply_group_filter(session, FilterGroup::Section, &section_options, &any).await?;
            apply_group_filter(session, FilterGroup::Type, &type_options, &any).await?;
        }
        SelectionPlan::Sections(requested) => {
            apply_group_filter(session, FilterGroup::Section, &section_options, &requested)
                .await?;
        }
        SelectionPlan::Categories(requested) => {
            apply_group_filter(session, FilterGroup::Type, &type_options, &requested).await?;
        }
    }
    Ok(())
}

/// Open the date drop-down and type the window into the specific-dates
/// inputs. Submitting with Enter on the end date applies the range.
async fn filter_by_dates<B: BrowserSession>(
    session: &B,
    window: &DateWindow,
) -> Result<(), BrowserError> {
    session.click(DATE_DROPDOWN).await?;
    session.click_when_visible(SPECIFIC_DATES_BUTTON).await?;
    session
        .fill_when_visible(START_DATE_INPUT, &window.start)
        .await?;
    session
        .fill_when_visible(END_DATE_INPUT, &window.end)
        .await?;
    session.press_enter(END_DATE_INPUT).await?;
    info!(start = %window.start, end = %window.end, "Applied date window");
    Ok(())
}

async fn sort_newest<B: BrowserSession>(session: &B) -> Result<(), BrowserError> {
    session.select_by_value(SORT_SELECT, "newest").await
}

/// Read the labels one drop-down offers, with count suffixes stripped.
async fn read_group_options<B: BrowserSession>(
    session: &B,
    group: FilterGroup,
) -> Result<Vec<String>, BrowserError> {
    session.click(group.button()).await?;

    let label_nodes = session.find_all(FILTER_OPTION_LABELS).await?;
    let count_nodes = session.find_all(FILTER_OPTION_COUNTS).await?;

    let mut labels = Vec::with_capacity(label_nodes.len());
    for node in &label_nodes {
        labels.push(session.text_of(node).await?);
    }
    let mut counts = Vec::with_capacity(count_nodes.len());
    for node in &count_nodes {
        counts.push(session.text_of(node).await?);
    }

    let options = strip_count_suffixes(&labels, &counts);
    debug!(group = group.name(), options = ?options, "Read filter options");
    Ok(options)
}

/// Click the checkbox for every requested item the drop-down offers.
async fn apply_group_filter<B: BrowserSession>(
    session: &B,
    group: FilterGroup,
    available: &[String],
    requested: &[String],
) -> Result<(), BrowserError> {
    let chosen = intersect(requested, available);
    session.click(group.button()).await?;

    for item in &chosen {
        let checkbox = format!("//label[@class='css-1a8ayg6']//span[contains(text(), '{item}')]");
        session.click(&checkbox).await?;
    }

    info!(
        group = group.name(),
        requested = requested.len(),
        applied = chosen.len(),
        "Applied filter selections"
    );
    Ok(())
}
