use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use tracing::debug;

use super::{Sheet, SheetStore, Workbook};
use crate::error::{Error, Result};

/// `.xlsx` files: read through calamine, written through rust_xlsxwriter.
///
/// Loading keeps only cell text; styles and formulas are not carried over
/// when a workbook is rewritten.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxStore;

impl SheetStore for XlsxStore {
    fn load(&self, path: &Path) -> Result<Workbook> {
        let read_err = |source| Error::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut xlsx: Xlsx<_> = open_workbook(path).map_err(read_err)?;

        let mut workbook = Workbook::new();
        for name in xlsx.sheet_names() {
            let range = xlsx.worksheet_range(&name).map_err(read_err)?;
            let (row_off, col_off) = range.start().unwrap_or((0, 0));

            let mut sheet = Sheet::new(name.clone());
            sheet.rows.resize(row_off as usize, Vec::new());
            for cells in range.rows() {
                let mut row: Vec<String> = std::iter::repeat(String::new())
                    .take(col_off as usize)
                    .chain(cells.iter().map(cell_text))
                    .collect();
                while row.last().is_some_and(String::is_empty) {
                    row.pop();
                }
                sheet.rows.push(row);
            }
            debug!(sheet = %name, rows = sheet.rows.len(), "loaded sheet");
            workbook.put_sheet(sheet);
        }
        Ok(workbook)
    }

    fn save(&self, workbook: &Workbook, path: &Path) -> Result<()> {
        let mut out = rust_xlsxwriter::Workbook::new();
        for sheet in workbook.sheets() {
            let ws = out.add_worksheet();
            ws.set_name(&sheet.name)?;
            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    if cell.is_empty() {
                        continue;
                    }
                    ws.write_string(r as u32, c as u16, cell)?;
                }
            }
        }
        out.save(path)?;
        Ok(())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
