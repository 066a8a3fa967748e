use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::blocks::{Block, TableRecord};
use crate::error::Result;
use crate::settings::Settings;
use crate::sheet::naming::{same_sheet_name, sanitize_sheet_name};

/// A top-level section that gets its own sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTarget {
    pub key: String,
    pub title: String,
}

impl SectionTarget {
    pub fn new(key: &str, title: &str) -> Self {
        SectionTarget {
            key: key.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionMatch {
    /// Heading starts with the key, e.g. `3.1` matches `3.1 ...` and `3.1.2 ...`.
    #[default]
    Key,
    /// Heading starts with the full title.
    Title,
}

/// What an unrecognized heading does to the active section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionReset {
    /// Always drop back to no context.
    #[default]
    Always,
    /// Return to the last section entered, if any.
    Never,
    /// Reset on headings at this level or shallower, otherwise like `Never`.
    /// `at_level = 2` also resets on `#` headings, not only on `##` ones.
    AtLevel(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketKey {
    Selection,
    Section(String),
    TestCase(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    NoContext,
    /// Index into the configured targets.
    InSection(usize),
    /// Index into `Buckets::test_cases`.
    InTestCase(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionBucket {
    pub key: String,
    pub title: String,
    pub tables: Vec<TableRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestCaseBucket {
    /// e.g. `UST-001`
    pub code: String,
    /// Sanitized sheet name, `code_title` or just `code`.
    pub name: String,
    pub tables: Vec<TableRecord>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Buckets {
    pub sections: Vec<SectionBucket>,
    pub test_cases: Vec<TestCaseBucket>,
}

impl Buckets {
    pub fn section(&self, key: &str) -> Option<&SectionBucket> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn test_case(&self, name: &str) -> Option<&TestCaseBucket> {
        self.test_cases.iter().find(|t| same_sheet_name(&t.name, name))
    }

    pub fn table_count(&self) -> usize {
        self.sections.iter().map(|s| s.tables.len()).sum::<usize>()
            + self.test_cases.iter().map(|t| t.tables.len()).sum::<usize>()
    }
}

/// Heading classification rules compiled from settings.
#[derive(Debug, Clone)]
pub struct BucketRules {
    targets: Vec<SectionTarget>,
    matching: SectionMatch,
    reset: SectionReset,
    /// `None` when no prefixes are configured, which disables test-case buckets.
    test_case_re: Option<Regex>,
}

impl BucketRules {
    pub fn new(
        targets: Vec<SectionTarget>,
        matching: SectionMatch,
        reset: SectionReset,
        prefixes: &[String],
    ) -> Result<Self> {
        let alternation = prefixes
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        let test_case_re = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"^(?:{alternation})-\d{{3}}"))?)
        };
        Ok(BucketRules {
            targets,
            matching,
            reset,
            test_case_re,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.sections.clone(),
            settings.section_match,
            settings.section_reset,
            &settings.test_case_prefixes,
        )
    }

    /// `(code, sheet name)` when the heading names a test case.
    pub fn match_test_case(&self, heading: &str) -> Option<(String, String)> {
        let m = self.test_case_re.as_ref()?.find(heading)?;
        let rest = &heading[m.end()..];
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let code = m.as_str().to_string();
        let title = rest.trim_matches(|c: char| matches!(c, ' ' | ':' | '-' | '_'));
        let name = if title.is_empty() {
            sanitize_sheet_name(&code)
        } else {
            sanitize_sheet_name(&format!("{code}_{title}"))
        };
        Some((code, name))
    }

    /// Index of the section target the heading belongs to.
    pub fn match_section(&self, heading: &str) -> Option<usize> {
        match self.matching {
            SectionMatch::Title => self
                .targets
                .iter()
                .position(|t| heading.starts_with(t.title.as_str())),
            SectionMatch::Key => self
                .targets
                .iter()
                .enumerate()
                .filter(|(_, t)| key_matches(heading, &t.key))
                .max_by_key(|(_, t)| t.key.len())
                .map(|(i, _)| i),
        }
    }
}

/// `3.1` matches `3.1 Foo`, `3.1.2 Foo` and `3.1`, but not `3.10 Foo`.
fn key_matches(heading: &str, key: &str) -> bool {
    match heading.strip_prefix(key) {
        Some(rest) => !rest.starts_with(|c: char| c.is_ascii_digit()),
        None => false,
    }
}

/// Single-owner state machine assigning tables to buckets by heading context.
pub struct Bucketer<'r> {
    rules: &'r BucketRules,
    state: ScanState,
    last_section: Option<usize>,
    buckets: Buckets,
}

impl<'r> Bucketer<'r> {
    pub fn new(rules: &'r BucketRules) -> Self {
        let sections = rules
            .targets
            .iter()
            .map(|t| SectionBucket {
                key: t.key.clone(),
                title: t.title.clone(),
                tables: Vec::new(),
            })
            .collect();
        Bucketer {
            rules,
            state: ScanState::NoContext,
            last_section: None,
            buckets: Buckets {
                sections,
                test_cases: Vec::new(),
            },
        }
    }

    /// Key of the bucket tables currently land in, if any.
    pub fn active_key(&self) -> Option<BucketKey> {
        match self.state {
            ScanState::NoContext => None,
            ScanState::InSection(i) => Some(BucketKey::Section(self.buckets.sections[i].key.clone())),
            ScanState::InTestCase(i) => {
                Some(BucketKey::TestCase(self.buckets.test_cases[i].name.clone()))
            }
        }
    }

    pub fn feed(&mut self, block: Block) {
        match block {
            Block::Heading { level, text } => self.enter_heading(level, &text),
            Block::Table(table) => self.push_table(table),
        }
    }

    fn enter_heading(&mut self, level: u8, text: &str) {
        self.state = if let Some((code, name)) = self.rules.match_test_case(text) {
            ScanState::InTestCase(self.test_case_slot(code, name))
        } else if let Some(idx) = self.rules.match_section(text) {
            self.last_section = Some(idx);
            ScanState::InSection(idx)
        } else {
            let reset = match self.rules.reset {
                SectionReset::Always => true,
                SectionReset::Never => false,
                SectionReset::AtLevel(max) => level <= max,
            };
            if reset {
                self.last_section = None;
            }
            self.last_section.map_or(ScanState::NoContext, ScanState::InSection)
        };
        debug!(heading = text, level, bucket = ?self.active_key(), "heading transition");
    }

    fn test_case_slot(&mut self, code: String, name: String) -> usize {
        let existing = self
            .buckets
            .test_cases
            .iter()
            .position(|t| same_sheet_name(&t.name, &name));
        if let Some(idx) = existing {
            return idx;
        }
        self.buckets.test_cases.push(TestCaseBucket {
            code,
            name,
            tables: Vec::new(),
        });
        self.buckets.test_cases.len() - 1
    }

    fn push_table(&mut self, table: TableRecord) {
        match self.state {
            ScanState::InTestCase(i) => self.buckets.test_cases[i].tables.push(table),
            ScanState::InSection(i) => self.buckets.sections[i].tables.push(table),
            ScanState::NoContext => {
                debug!(heading = ?table.heading, "table outside a recognized heading dropped");
            }
        }
    }

    pub fn finish(self) -> Buckets {
        self.buckets
    }
}

/// Scan and bucket a whole document in one pass.
pub fn bucket_document<I>(rules: &BucketRules, blocks: I) -> Buckets
where
    I: IntoIterator<Item = Block>,
{
    let mut bucketer = Bucketer::new(rules);
    for block in blocks {
        bucketer.feed(block);
    }
    bucketer.finish()
}

/// The selection bucket: the first `count` raw lines, untouched.
pub fn select_lines<S: AsRef<str>>(lines: &[S], count: usize) -> Vec<String> {
    lines
        .iter()
        .take(count)
        .map(|l| l.as_ref().to_string())
        .collect()
}

// ── Tests ──
