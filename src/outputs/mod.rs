//! Output generation: the spreadsheet report and the image archive.
//!
//! Everything a run leaves behind lands in one output directory:
//!
//! ```text
//! output/
//! ├── searching_results_04_18_2024__14_03_51.xlsx
//! ├── images.zip
//! └── images/
//!     ├── rates.png
//!     └── fall.png
//! ```
//!
//! # Submodules
//!
//! - [`spreadsheet`]: Writes the enriched records to a timestamped `.xlsx`
//! - [`images`]: Downloads every manifest image with bounded retries, then
//!   zips the directory
//!
//! A failure screenshot (`screenshot_<DDMMYYYY_HHMMSS>_page.png`) may also
//! appear next to these; that one is written by the top level on the way
//! out, not by this module.

pub mod images;
pub mod spreadsheet;
