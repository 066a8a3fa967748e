use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parser::blocks::RowPolicy;
use crate::parser::sections::{SectionMatch, SectionReset, SectionTarget};

const DEFAULT_CONFIG_FILE: &str = "spec_sheets.toml";
const ENV_PREFIX: &str = "SPEC_SHEETS";

/// Run-wide settings. Defaults match the system test specification layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How many leading lines go verbatim into the selection sheet.
    pub selection_lines: usize,
    pub selection_sheet: String,
    pub sections: Vec<SectionTarget>,
    pub section_match: SectionMatch,
    pub section_reset: SectionReset,
    pub test_case_prefixes: Vec<String>,
    pub row_policy: RowPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            selection_lines: 67,
            selection_sheet: "選択範囲".to_string(),
            sections: vec![
                SectionTarget::new("3.1", "3.1 一般ユーザーシナリオ"),
                SectionTarget::new("3.2", "3.2 管理ユーザーシナリオ"),
                SectionTarget::new("3.3", "3.3 エラーハンドリングシナリオ"),
            ],
            section_match: SectionMatch::Key,
            section_reset: SectionReset::Always,
            test_case_prefixes: vec!["UST".into(), "AST".into(), "EST".into()],
            row_policy: RowPolicy::Pad,
        }
    }
}

impl Settings {
    /// Layer an optional TOML file and `SPEC_SHEETS__*` environment variables
    /// over the defaults. An explicit `path` must exist; the default file may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

// ── Tests ──
