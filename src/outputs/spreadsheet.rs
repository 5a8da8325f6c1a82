//! Spreadsheet report for the enriched records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::{info, instrument};

use crate::models::EnrichedArticleRecord;

/// Column headers, in sheet order.
const HEADERS: [&str; 6] = [
    "title",
    "date",
    "description",
    "image name",
    "contains money",
    "count search phrase",
];

/// Report filename for a run happening at `now`.
pub fn report_filename(now: DateTime<Local>) -> String {
    format!(
        "searching_results_{}.xlsx",
        now.format("%m_%d_%Y__%H_%M_%S")
    )
}

/// Write the records to a timestamped workbook in `output_dir`.
///
/// The single worksheet is titled with the search term, so a term the
/// spreadsheet format cannot accept as a sheet name (too long, or with
/// characters like `[`) fails the write.
///
/// # Returns
///
/// The path of the file that was written.
#[instrument(level = "info", skip_all)]
pub fn write_report(
    records: &[EnrichedArticleRecord],
    search: &str,
    output_dir: &Path,
) -> Result<PathBuf, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(search)?;

    for (column, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, column as u16, *header)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &record.title)?;
        worksheet.write_string(row, 1, &record.published)?;
        worksheet.write_string(row, 2, &record.description)?;
        worksheet.write_string(row, 3, &record.image_name)?;
        worksheet.write_boolean(row, 4, record.contains_money)?;
        worksheet.write_number(row, 5, record.search_phrase_count as f64)?;
    }

    let path = output_dir.join(report_filename(Local::now()));
    workbook.save(&path)?;

    info!(rows = records.len(), path = %path.display(), "Report written");
    Ok(path)
}
