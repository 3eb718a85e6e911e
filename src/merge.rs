//! Merge orchestration.
//!
//! Walks every input workbook in order and stitches the selected rows into a
//! single sheet named [`CONSOLIDATED_SHEET`]. Header rows come from the first
//! processed sheet, data and total rows follow in source order, and the first
//! signature section seen is appended once at the very end.

use std::fmt;

use crate::classify::{is_subtotal_row, SheetMarkers};
use crate::config::{ColumnWindow, MergeConfig, OutputBase};
use crate::copy::{copy_column_widths, copy_merged_ranges, copy_row};
use crate::error::{Result, XlmergeError};
use crate::export::{values_only, write_workbook};
use crate::parser;
use crate::types::{Sheet, Workbook};

/// Name of the output sheet. Input sheets with this name are never read.
pub const CONSOLIDATED_SHEET: &str = "Consolidated";

/// Where the appended signature section came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOrigin {
    /// 0-based position of the file in the input list.
    pub file_index: usize,
    pub sheet_name: String,
    pub first_row: u32,
}

/// Counters describing one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files_read: usize,
    pub sheets_merged: usize,
    pub sheets_skipped: usize,
    pub header_rows: u32,
    pub data_rows: u32,
    pub total_rows_copied: u32,
    pub total_rows_dropped: u32,
    pub subtotal_rows_skipped: u32,
    pub signature_rows: u32,
    pub signature_origin: Option<SignatureOrigin>,
    /// Last row written to the consolidated sheet.
    pub output_rows: u32,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s), {} sheet(s) merged, {} skipped; {} header, {} data, {} total row(s) \
             ({} dropped), {} subtotal row(s) skipped",
            self.files_read,
            self.sheets_merged,
            self.sheets_skipped,
            self.header_rows,
            self.data_rows,
            self.total_rows_copied,
            self.total_rows_dropped,
            self.subtotal_rows_skipped,
        )?;
        match &self.signature_origin {
            Some(origin) => write!(
                f,
                "; {} signature row(s) from file #{} sheet '{}' row {}",
                self.signature_rows,
                origin.file_index + 1,
                origin.sheet_name,
                origin.first_row
            ),
            None => f.write_str("; no signature section"),
        }
    }
}

/// The merged model before serialization.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub workbook: Workbook,
    pub summary: MergeSummary,
}

impl MergeOutcome {
    pub fn consolidated(&self) -> Option<&Sheet> {
        self.workbook.sheet(CONSOLIDATED_SHEET)
    }
}

/// Owned snapshot of a signature section, kept at its source row numbers.
#[derive(Debug)]
struct CapturedSection {
    rows: Sheet,
    first_row: u32,
    last_row: u32,
    origin: SignatureOrigin,
}

impl CapturedSection {
    fn capture(
        source: &Sheet,
        first_row: u32,
        window: ColumnWindow,
        file_index: usize,
    ) -> Self {
        let last_row = source.last_row().max(first_row);
        let mut rows = Sheet::new(source.name.clone());
        for row in first_row..=last_row {
            copy_row(source, row, &mut rows, row, window);
        }
        copy_merged_ranges(source, &mut rows, first_row, last_row, first_row, window);
        Self {
            rows,
            first_row,
            last_row,
            origin: SignatureOrigin {
                file_index,
                sheet_name: source.name.clone(),
                first_row,
            },
        }
    }

    fn len(&self) -> u32 {
        self.last_row - self.first_row + 1
    }
}

/// Consecutive source rows that landed on consecutive output rows.
#[derive(Debug, Clone, Copy)]
struct CopiedRun {
    source_start: u32,
    source_end: u32,
    target_start: u32,
}

/// Mutable state of one merge call.
struct Merger<'a> {
    config: &'a MergeConfig,
    window: ColumnWindow,
    output: Sheet,
    /// Next output row to write.
    cursor: u32,
    header_done: bool,
    template_done: bool,
    signature: Option<CapturedSection>,
    run: Option<CopiedRun>,
    summary: MergeSummary,
}

impl<'a> Merger<'a> {
    fn new(config: &'a MergeConfig, window: ColumnWindow) -> Self {
        Self {
            config,
            window,
            output: Sheet::new(CONSOLIDATED_SHEET),
            cursor: 1,
            header_done: false,
            template_done: false,
            signature: None,
            run: None,
            summary: MergeSummary::default(),
        }
    }

    fn merge_sheet(&mut self, sheet: &Sheet, file_index: usize) {
        if sheet.name == CONSOLIDATED_SHEET {
            log::debug!("file #{}: skipping existing '{}' sheet", file_index + 1, sheet.name);
            self.summary.sheets_skipped += 1;
            return;
        }

        if !self.template_done {
            copy_column_widths(sheet, &mut self.output, self.window);
            self.output.default_col_width = sheet.default_col_width;
            self.output.default_row_height = sheet.default_row_height;
            self.template_done = true;
        }

        let markers = SheetMarkers::scan(sheet, self.window);
        log::debug!(
            "file #{} sheet '{}': total row {:?}, signature row {:?}, last row {}",
            file_index + 1,
            sheet.name,
            markers.total_row,
            markers.signature_row,
            sheet.last_row()
        );

        let first_data_row = if self.header_done {
            self.config.start_row.saturating_add(1)
        } else {
            self.copy_header(sheet);
            self.config.start_row
        };

        for row in first_data_row..=sheet.last_row() {
            if markers.total_row == Some(row) {
                if self.config.include_total {
                    self.copy_data_row(sheet, row);
                    self.summary.total_rows_copied += 1;
                } else {
                    self.break_run(sheet);
                    self.summary.total_rows_dropped += 1;
                }
                continue;
            }

            if let Some(signature_row) = markers.signature_row.filter(|s| row >= *s) {
                if self.config.include_signature && self.signature.is_none() {
                    let section =
                        CapturedSection::capture(sheet, signature_row, self.window, file_index);
                    log::debug!(
                        "captured signature rows {}..={} from sheet '{}'",
                        section.first_row,
                        section.last_row,
                        sheet.name
                    );
                    self.signature = Some(section);
                }
                break;
            }

            if !self.config.include_total && is_subtotal_row(sheet, row, self.window) {
                log::debug!("sheet '{}' row {}: skipping subtotal row", sheet.name, row);
                self.break_run(sheet);
                self.summary.subtotal_rows_skipped += 1;
                continue;
            }

            self.copy_data_row(sheet, row);
            self.summary.data_rows += 1;
        }

        self.break_run(sheet);
        self.summary.sheets_merged += 1;
    }

    /// Rows above the configured start row of the first processed sheet.
    fn copy_header(&mut self, sheet: &Sheet) {
        let header_rows = self.config.start_row.saturating_sub(1);
        if header_rows > 0 {
            for row in 1..=header_rows {
                copy_row(sheet, row, &mut self.output, self.cursor + row - 1, self.window);
            }
            copy_merged_ranges(sheet, &mut self.output, 1, header_rows, self.cursor, self.window);
            self.cursor += header_rows;
        }
        self.summary.header_rows = header_rows;
        self.header_done = true;
    }

    fn copy_data_row(&mut self, sheet: &Sheet, row: u32) {
        let target = self.cursor;
        copy_row(sheet, row, &mut self.output, target, self.window);
        self.cursor += 1;

        match &mut self.run {
            // Skipped rows close the run, so a source-contiguous row is
            // also target-contiguous.
            Some(run) if run.source_end + 1 == row => run.source_end = row,
            _ => {
                self.break_run(sheet);
                self.run = Some(CopiedRun {
                    source_start: row,
                    source_end: row,
                    target_start: target,
                });
            }
        }
    }

    /// Close the current run, recreating the merges it fully contains.
    fn break_run(&mut self, sheet: &Sheet) {
        if let Some(run) = self.run.take() {
            copy_merged_ranges(
                sheet,
                &mut self.output,
                run.source_start,
                run.source_end,
                run.target_start,
                self.window,
            );
        }
    }

    fn append_signature(&mut self) {
        let Some(section) = self.signature.take() else {
            return;
        };
        for row in section.first_row..=section.last_row {
            let target = self.cursor + (row - section.first_row);
            copy_row(&section.rows, row, &mut self.output, target, self.window);
        }
        copy_merged_ranges(
            &section.rows,
            &mut self.output,
            section.first_row,
            section.last_row,
            self.cursor,
            self.window,
        );
        self.cursor += section.len();
        self.summary.signature_rows = section.len();
        self.summary.signature_origin = Some(section.origin);
    }

    fn finish(mut self) -> (Sheet, MergeSummary) {
        self.append_signature();
        self.summary.output_rows = self.cursor - 1;
        (self.output, self.summary)
    }
}

/// Merge the given `.xlsx` buffers into a workbook model.
///
/// Every buffer is parsed before it is consumed; the first parse failure
/// aborts the whole merge.
pub fn merge_to_workbook<S: AsRef<[u8]>>(sources: &[S], config: &MergeConfig) -> Result<MergeOutcome> {
    if sources.is_empty() {
        return Err(XlmergeError::NoInput);
    }
    config.validate()?;
    let window = config.column_window()?;

    let mut merger = Merger::new(config, window);
    let mut base: Option<Workbook> = None;
    let mut date1904 = None;

    for (file_index, source) in sources.iter().enumerate() {
        let workbook = parser::parse(source.as_ref())?;
        merger.summary.files_read += 1;

        match date1904 {
            None => date1904 = Some(workbook.date1904),
            Some(first) if first != workbook.date1904 => log::warn!(
                "file #{} uses a different date system; its date serials are copied unchanged",
                file_index + 1
            ),
            Some(_) => {}
        }

        for sheet in &workbook.sheets {
            merger.merge_sheet(sheet, file_index);
        }

        if file_index == 0 && config.output_base == OutputBase::FirstInput {
            base = Some(workbook);
        }
    }

    let (consolidated, summary) = merger.finish();

    let mut workbook = base.unwrap_or_default();
    workbook.remove_sheet(CONSOLIDATED_SHEET);
    workbook.sheets.push(consolidated);
    workbook.date1904 = date1904.unwrap_or(false);

    log::info!("merge complete: {summary}");
    Ok(MergeOutcome { workbook, summary })
}

/// Merge the given `.xlsx` buffers and serialize the result.
///
/// If the merged workbook cannot be written as-is, it is rebuilt once with
/// every formula replaced by its cached value and written again.
pub fn merge_workbooks<S: AsRef<[u8]>>(sources: &[S], config: &MergeConfig) -> Result<Vec<u8>> {
    let outcome = merge_to_workbook(sources, config)?;
    write_with_fallback(&outcome.workbook)
}

/// Write `workbook`, retrying once with formulas flattened to values.
pub fn write_with_fallback(workbook: &Workbook) -> Result<Vec<u8>> {
    match write_workbook(workbook) {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            log::warn!("writing merged workbook failed ({err}); retrying with values only");
            write_workbook(&values_only(workbook))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{Cell, CellValue, MergeRange};

    fn text(sheet: &mut Sheet, row: u32, col: u32, s: &str) {
        *sheet.cell_mut(row, col) = Cell::with_value(CellValue::Text(s.into()));
    }

    fn column_a(sheet: &Sheet) -> Vec<(u32, String)> {
        sheet
            .rows
            .iter()
            .filter_map(|(&r, row)| match row.cells.get(&1)?.value.as_ref()? {
                CellValue::Text(s) => Some((r, s.clone())),
                _ => None,
            })
            .collect()
    }

    fn run(config: &MergeConfig, sheets: &[Sheet]) -> (Sheet, MergeSummary) {
        let mut merger = Merger::new(config, config.column_window().unwrap());
        for (i, sheet) in sheets.iter().enumerate() {
            merger.merge_sheet(sheet, i);
        }
        merger.finish()
    }

    fn report(prefix: &str) -> Sheet {
        let mut sheet = Sheet::new(prefix);
        text(&mut sheet, 1, 1, "Title");
        text(&mut sheet, 2, 1, "Item");
        text(&mut sheet, 3, 1, &format!("{prefix}-a"));
        text(&mut sheet, 4, 1, &format!("{prefix}-b"));
        text(&mut sheet, 5, 1, "Total");
        text(&mut sheet, 7, 1, "Người nhận");
        text(&mut sheet, 8, 1, &format!("{prefix}-sign"));
        sheet
    }

    #[test]
    fn rows_follow_file_then_row_order() {
        let config = MergeConfig::default();
        let (out, summary) = run(&config, &[report("x"), report("y")]);
        let labels: Vec<String> = column_a(&out).into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            labels,
            ["Title", "Item", "x-a", "x-b", "Total", "y-a", "y-b", "Total", "Người nhận", "x-sign"]
        );
        assert_eq!(summary.header_rows, 1);
        assert_eq!(summary.total_rows_copied, 2);
        assert_eq!(summary.signature_origin.unwrap().sheet_name, "x");
    }

    #[test]
    fn spacer_rows_keep_their_slot() {
        let config = MergeConfig {
            include_signature: false,
            ..Default::default()
        };
        let (out, summary) = run(&config, &[report("x")]);
        // row 6 is blank in the source and still occupies an output row
        assert_eq!(column_a(&out).last().unwrap(), &(5, "Total".to_string()));
        assert_eq!(summary.output_rows, 6);
        assert_eq!(summary.signature_rows, 0);
    }

    #[test]
    fn dropped_total_breaks_merge_run() {
        let mut sheet = report("x");
        sheet.merges = vec![
            MergeRange { start_row: 3, start_col: 1, end_row: 4, end_col: 1 },
            MergeRange { start_row: 4, start_col: 2, end_row: 5, end_col: 2 },
        ];
        let config = MergeConfig {
            include_total: false,
            ..Default::default()
        };
        let (out, summary) = run(&config, &[sheet]);
        assert_eq!(summary.total_rows_dropped, 1);
        assert_eq!(
            out.merges,
            vec![MergeRange { start_row: 3, start_col: 1, end_row: 4, end_col: 1 }]
        );
    }

    #[test]
    fn consolidated_input_sheet_is_skipped() {
        let mut stale = Sheet::new(CONSOLIDATED_SHEET);
        text(&mut stale, 3, 1, "stale");
        let config = MergeConfig::default();
        let (out, summary) = run(&config, &[stale, report("x")]);
        assert_eq!(summary.sheets_skipped, 1);
        assert_eq!(column_a(&out)[0], (1, "Title".to_string()));
        assert!(column_a(&out).iter().all(|(_, s)| s != "stale"));
    }

    #[test]
    fn summary_display_mentions_origin() {
        let config = MergeConfig::default();
        let (_, summary) = run(&config, &[report("x")]);
        let line = summary.to_string();
        assert!(line.contains("sheet 'x' row 7"), "{line}");
    }
}
