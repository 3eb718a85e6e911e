//! xlmerge - consolidate many XLSX workbooks into one formatted sheet
//!
//! Every input sheet contributes its data rows to a single sheet named
//! `Consolidated`:
//! - Header rows are taken once, from the first sheet
//! - `TOTAL` rows are kept or dropped, subtotal-shaped rows with them
//! - The first signature section found is appended once at the end
//! - Values, styles, column widths, row heights and merges carry over
//!
//! # Usage
//!
//! ```no_run
//! use xlmerge::{merge_workbooks, MergeConfig};
//!
//! let a = std::fs::read("north.xlsx")?;
//! let b = std::fs::read("south.xlsx")?;
//! let merged = merge_workbooks(&[a, b], &MergeConfig::default())?;
//! std::fs::write("merged.xlsx", merged)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Workbook reading
pub mod cell_ref;
pub mod color;
pub mod error;
pub mod parser;
pub mod rich_text;
pub mod styles;
pub mod types;
pub mod xml_helpers;

// Merge engine
pub mod classify;
pub mod config;
pub mod copy;
pub mod merge;
pub mod value;

// Output
pub mod export;
pub mod transport;

pub use config::{ColumnWindow, MergeConfig, OutputBase};
pub use error::{Result, XlmergeError};
pub use merge::{
    merge_to_workbook, merge_workbooks, write_with_fallback, MergeOutcome, MergeSummary,
    SignatureOrigin, CONSOLIDATED_SHEET,
};
pub use transport::{handle_merge_request, MergeRequest, MergeResponse, UploadedFile};
pub use types::*;
