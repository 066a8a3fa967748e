use std::collections::HashMap;

use super::naming::{sanitize_sheet_name, unique_sheet_name};
use crate::parser::blocks::TableRecord;
use crate::parser::sections::{BucketKey, Buckets};
use crate::workbook::Sheet;

pub const NO_SECTION_TABLES: &str = "(No tables found in this section)";
pub const NO_TEST_CASE_TABLES: &str = "(No tables found)";
const CONTENT_HEADER: &str = "content";
const DEFAULT_HEADING: &str = "Table";

pub fn selection_sheet<S: AsRef<str>>(name: &str, lines: &[S]) -> Sheet {
    let mut sheet = Sheet::new(sanitize_sheet_name(name));
    sheet.push([CONTENT_HEADER]);
    for line in lines {
        sheet.push([line.as_ref()]);
    }
    sheet
}

/// Numbered table blocks separated by a blank row.
fn push_tables(sheet: &mut Sheet, tables: &[TableRecord]) {
    for (idx, table) in tables.iter().enumerate() {
        sheet.push([format!("Table {}", idx + 1)]);
        sheet.push(table.header.iter().cloned());
        for row in &table.rows {
            sheet.push(row.iter().cloned());
        }
        sheet.push([""]);
    }
}

pub fn section_sheet(title: &str, tables: &[TableRecord]) -> Sheet {
    let mut sheet = Sheet::new(sanitize_sheet_name(title));
    sheet.push([title]);
    sheet.push([""]);
    if tables.is_empty() {
        sheet.push([NO_SECTION_TABLES]);
    } else {
        push_tables(&mut sheet, tables);
    }
    sheet
}

pub fn test_case_sheet(name: &str, tables: &[TableRecord]) -> Sheet {
    let mut sheet = Sheet::new(sanitize_sheet_name(name));
    if tables.is_empty() {
        sheet.push([NO_TEST_CASE_TABLES]);
    } else {
        push_tables(&mut sheet, tables);
    }
    sheet
}

/// Sheet for one bucket. `selection` supplies the raw lines for `BucketKey::Selection`.
pub fn bucket_sheet(
    key: &BucketKey,
    buckets: &Buckets,
    selection: (&str, &[String]),
) -> Option<Sheet> {
    match key {
        BucketKey::Selection => Some(selection_sheet(selection.0, selection.1)),
        BucketKey::Section(k) => buckets.section(k).map(|s| section_sheet(&s.title, &s.tables)),
        BucketKey::TestCase(name) => buckets
            .test_case(name)
            .map(|t| test_case_sheet(&t.name, &t.tables)),
    }
}

/// Keys in sheet order: sections as configured, then test cases as encountered.
pub fn bucket_keys(buckets: &Buckets) -> Vec<BucketKey> {
    buckets
        .sections
        .iter()
        .map(|s| BucketKey::Section(s.key.clone()))
        .chain(
            buckets
                .test_cases
                .iter()
                .map(|t| BucketKey::TestCase(t.name.clone())),
        )
        .collect()
}

/// One sheet per table, named after its heading (`heading_2` etc. when a heading
/// owns several). Every row is padded to the table's widest row.
pub fn per_heading_sheets(tables: &[TableRecord]) -> Vec<Sheet> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&TableRecord>> = HashMap::new();
    for table in tables {
        let heading = table.heading.as_deref().unwrap_or(DEFAULT_HEADING);
        let group = groups.entry(heading).or_default();
        if group.is_empty() {
            order.push(heading);
        }
        group.push(table);
    }

    let mut sheets: Vec<Sheet> = Vec::new();
    for heading in order {
        let group = &groups[heading];
        for (idx, table) in group.iter().enumerate() {
            let base = if group.len() == 1 {
                heading.to_string()
            } else {
                format!("{heading}_{}", idx + 1)
            };
            let name = unique_sheet_name(&base, sheets.iter().map(|s| s.name.as_str()));
            let width = table.width();
            let mut sheet = Sheet::new(name);
            for row in std::iter::once(&table.header).chain(&table.rows) {
                let mut cells = row.clone();
                cells.resize(width, String::new());
                sheet.push(cells);
            }
            sheets.push(sheet);
        }
    }
    sheets
}

/// Fallback when a document has no tables at all.
pub fn content_sheet<S: AsRef<str>>(lines: &[S]) -> Sheet {
    selection_sheet("Content", lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(heading: Option<&str>, header: &[&str], rows: &[&[&str]]) -> TableRecord {
        TableRecord {
            heading: heading.map(str::to_string),
            header: header.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn section_layout() {
        let t = table(Some("3.1"), &["ID", "Step"], &[&["UST-001", "Open page"]]);
        let sheet = section_sheet("3.1 一般ユーザーシナリオ", &[t.clone(), t]);
        assert_eq!(sheet.name, "3.1 一般ユーザーシナリオ");
        assert_eq!(sheet.rows[0], vec!["3.1 一般ユーザーシナリオ"]);
        assert_eq!(sheet.rows[1], vec![""]);
        assert_eq!(sheet.rows[2], vec!["Table 1"]);
        assert_eq!(sheet.rows[3], vec!["ID", "Step"]);
        assert_eq!(sheet.rows[4], vec!["UST-001", "Open page"]);
        assert_eq!(sheet.rows[5], vec![""]);
        assert_eq!(sheet.rows[6], vec!["Table 2"]);
        assert_eq!(sheet.rows.len(), 10);
    }

    #[test]
    fn empty_buckets_get_placeholders() {
        let sec = section_sheet("3.2 管理ユーザーシナリオ", &[]);
        assert_eq!(sec.rows.last().unwrap(), &vec![NO_SECTION_TABLES.to_string()]);
        let tc = test_case_sheet("AST-001_登録", &[]);
        assert_eq!(tc.rows, vec![vec![NO_TEST_CASE_TABLES.to_string()]]);
    }

    #[test]
    fn selection_layout() {
        let sheet = selection_sheet("選択範囲", &["# Title", ""]);
        assert_eq!(sheet.rows, vec![vec!["content"], vec!["# Title"], vec![""]]);
    }

    #[test]
    fn per_heading_names_and_padding() {
        let tables = vec![
            table(Some("概要"), &["A"], &[&["1", "2"]]),
            table(None, &["B"], &[]),
            table(Some("手順"), &["C"], &[]),
            table(Some("手順"), &["D"], &[]),
        ];
        let sheets = per_heading_sheets(&tables);
        let names: Vec<_> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["概要", "Table", "手順_1", "手順_2"]);
        assert_eq!(sheets[0].rows, vec![vec!["A", ""], vec!["1", "2"]]);
    }

    #[test]
    fn per_heading_collisions_are_suffixed() {
        let tables = vec![
            table(Some("Spec: A"), &["x"], &[]),
            table(Some("Spec/ A"), &["y"], &[]),
        ];
        let sheets = per_heading_sheets(&tables);
        assert_eq!(sheets[0].name, "Spec_ A");
        assert_eq!(sheets[1].name, "Spec_ A_2");

        let tables = vec![table(Some("Login"), &["x"], &[]), table(Some("login"), &["y"], &[])];
        let names: Vec<_> = per_heading_sheets(&tables).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Login", "login_2"]);
    }
}
