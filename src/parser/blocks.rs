use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s*(.*)$").unwrap());
// Checked against the line with spaces removed.
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s|:\-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `| a | b |` rows under a `|---|---|` separator.
    #[default]
    Pipe,
    /// Tab-delimited rows, as produced by `convert`.
    Tab,
}

impl Dialect {
    pub fn delimiter(self) -> char {
        match self {
            Dialect::Pipe => '|',
            Dialect::Tab => '\t',
        }
    }

    /// Lines before the first data row: header plus separator for pipe tables.
    pub fn body_offset(self) -> usize {
        match self {
            Dialect::Pipe => 2,
            Dialect::Tab => 1,
        }
    }
}

/// What to do with data rows narrower than the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Append empty cells up to the header width.
    #[default]
    Pad,
    /// Leave rows exactly as split.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    /// Nearest heading above the table, if any.
    pub heading: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableRecord {
    /// Widest row, header included.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    fn apply(&mut self, policy: RowPolicy) {
        if policy == RowPolicy::Keep {
            return;
        }
        let width = self.header.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Table(TableRecord),
}

/// Lazy scan over document lines yielding headings and tables in order.
pub struct Blocks<'a, S> {
    lines: &'a [S],
    pos: usize,
    heading: Option<String>,
    dialect: Dialect,
    policy: RowPolicy,
}

impl<'a, S: AsRef<str>> Blocks<'a, S> {
    pub fn new(lines: &'a [S], dialect: Dialect, policy: RowPolicy) -> Self {
        Blocks {
            lines,
            pos: 0,
            heading: None,
            dialect,
            policy,
        }
    }

    /// Only the tables, each tagged with its heading context.
    pub fn tables(self) -> impl Iterator<Item = TableRecord> + 'a
    where
        S: 'a,
    {
        self.filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Heading { .. } => None,
        })
    }

    fn line(&self, idx: usize) -> Option<&'a str> {
        self.lines.get(idx).map(AsRef::as_ref)
    }
}

impl<'a, S: AsRef<str>> Iterator for Blocks<'a, S> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        while let Some(line) = self.line(self.pos) {
            if let Some(caps) = HEADING_RE.captures(line) {
                let text = caps[2].trim().to_string();
                self.heading = Some(text.clone());
                self.pos += 1;
                return Some(Block::Heading {
                    level: caps[1].len() as u8,
                    text,
                });
            }

            if let Some(span) = table_span(self.lines, self.pos, self.dialect) {
                let start = self.pos;
                self.pos += span;
                return Some(Block::Table(self.build_table(start, span)));
            }

            self.pos += 1;
        }
        None
    }
}

impl<'a, S: AsRef<str>> Blocks<'a, S> {
    fn build_table(&self, start: usize, span: usize) -> TableRecord {
        let delim = self.dialect.delimiter();
        let header = split_row(self.lines[start].as_ref(), delim);
        // every spanned line holds a delimiter, so none is blank
        let rows = self.lines[start + self.dialect.body_offset()..start + span]
            .iter()
            .map(|r| split_row(r.as_ref(), delim))
            .collect();

        let mut table = TableRecord {
            heading: self.heading.clone(),
            header,
            rows,
        };
        table.apply(self.policy);
        table
    }
}

/// Number of lines (header, separator, rows) of the table starting at `pos`,
/// if one starts there. Rows run until a line without the delimiter or a heading.
pub fn table_span<S: AsRef<str>>(lines: &[S], pos: usize, dialect: Dialect) -> Option<usize> {
    let line = |idx: usize| lines.get(idx).map(AsRef::as_ref);
    let delim = dialect.delimiter();
    let header = line(pos)?;
    if !header.contains(delim) || is_heading(header) {
        return None;
    }
    if dialect == Dialect::Pipe && !is_separator_row(line(pos + 1)?) {
        return None;
    }
    let mut end = pos + dialect.body_offset();
    while let Some(row) = line(end) {
        if !row.contains(delim) || is_heading(row) {
            break;
        }
        end += 1;
    }
    Some(end - pos)
}

pub fn is_heading(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

/// `|---|:---:|` style row. Spaces are ignored; an empty line is not a separator.
pub fn is_separator_row(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| *c != ' ').collect();
    SEPARATOR_RE.is_match(&compact)
}

/// Split a row into trimmed cells. Pipe rows are stripped and lose one outer
/// delimiter on each end; tab rows split as-is so empty edge cells survive.
pub fn split_row(line: &str, delim: char) -> Vec<String> {
    let r = if delim == '\t' {
        line
    } else {
        let r = line.trim();
        let r = r.strip_prefix(delim).unwrap_or(r);
        r.strip_suffix(delim).unwrap_or(r)
    };
    r.split(delim).map(|c| c.trim().to_string()).collect()
}

// ── Tests ──
