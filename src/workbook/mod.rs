pub mod xlsx;

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::sheet::naming::same_sheet_name;

pub use xlsx::XlsxStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }
}

/// Ordered set of sheets, unique by case-insensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| same_sheet_name(&s.name, name))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> + Clone {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<Sheet> {
        let idx = self.sheets.iter().position(|s| same_sheet_name(&s.name, name))?;
        Some(self.sheets.remove(idx))
    }

    /// Append `sheet`, replacing any sheet with the same name.
    pub fn put_sheet(&mut self, sheet: Sheet) {
        self.remove(&sheet.name);
        self.sheets.push(sheet);
    }

    /// Insert `sheet` at `index` (clamped), replacing any sheet with the same name.
    pub fn put_sheet_at(&mut self, index: usize, sheet: Sheet) {
        self.remove(&sheet.name);
        let index = index.min(self.sheets.len());
        self.sheets.insert(index, sheet);
    }
}

/// Where workbooks are loaded from and saved to.
pub trait SheetStore {
    fn load(&self, path: &Path) -> Result<Workbook>;
    fn save(&self, workbook: &Workbook, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, cell: &str) -> Sheet {
        let mut s = Sheet::new(name);
        s.push([cell]);
        s
    }

    #[test]
    fn put_replaces_same_name() {
        let mut wb = Workbook::new();
        wb.put_sheet(sheet("A", "old"));
        wb.put_sheet(sheet("B", "b"));
        wb.put_sheet(sheet("A", "new"));
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(wb.sheet("A").unwrap().rows, vec![vec!["new"]]);
    }

    #[test]
    fn put_replaces_name_differing_in_case() {
        let mut wb = Workbook::new();
        wb.put_sheet(sheet("UST-001_Login", "old"));
        wb.put_sheet(sheet("UST-001_login", "new"));
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["UST-001_login"]);
        assert_eq!(wb.sheet("ust-001_LOGIN").unwrap().rows, vec![vec!["new"]]);
    }

    #[test]
    fn put_at_front() {
        let mut wb = Workbook::new();
        wb.put_sheet(sheet("A", "a"));
        wb.put_sheet(sheet("選択範囲", "old"));
        wb.put_sheet_at(0, sheet("選択範囲", "new"));
        wb.put_sheet_at(99, sheet("Z", "z"));
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["選択範囲", "A", "Z"]);
        assert_eq!(wb.sheets().len(), 3);
    }
}
