//! Output generation for the Excel report and the work-item ledger.
//!
//! # Submodules
//!
//! - [`xlsx`]: Writes the [`ReportTable`](crate::models::ReportTable) as a workbook
//! - [`json`]: Writes one acknowledgement per work item
//!
//! # Output Structure
//!
//! ```text
//! output/
//! ├── images/
//! │   └── <last segment of each image URL>
//! ├── output.xlsx
//! ├── work_items.json
//! └── error_screenshot.png   # only after a failed item
//! ```

pub mod json;
pub mod xlsx;
