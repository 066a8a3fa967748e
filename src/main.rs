mod convert;
mod error;
mod parser;
mod settings;
mod sheet;
mod workbook;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use parser::blocks::{Blocks, Dialect};
use parser::sections::{select_lines, BucketKey, BucketRules, Buckets};
use settings::Settings;
use sheet::layout;
use workbook::{SheetStore, Workbook, XlsxStore};

#[derive(Parser)]
#[command(name = "spec_sheets", about = "Markdown test-specification tables to workbook sheets")]
struct Cli {
    /// Settings file (default: ./spec_sheets.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One sheet per table, named after the nearest heading
    Tables { input: PathBuf, output: PathBuf },
    /// One sheet per configured section
    Sections {
        input: PathBuf,
        output: PathBuf,
        /// Replace the section sheets inside an existing workbook
        #[arg(long)]
        update: bool,
    },
    /// Selection, section and per-test-case sheets in a fresh workbook
    Workbook {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = Dialect::Pipe)]
        dialect: Dialect,
    },
    /// Put the leading lines of the document into the first sheet of an existing workbook
    Selection { input: PathBuf, output: PathBuf },
    /// Rewrite pipe tables as tab-delimited rows
    Convert {
        input: PathBuf,
        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print sheet names and the first rows of each sheet
    Inspect {
        workbook: PathBuf,
        #[arg(short = 'n', long, default_value = "5")]
        rows: usize,
    },
    /// Print the bucketed tables as JSON
    Extract {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = Dialect::Pipe)]
        dialect: Dialect,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let store = XlsxStore;

    match cli.command {
        Commands::Tables { input, output } => {
            let lines = read_lines(&input)?;
            let (wb, tables) = tables_workbook(&lines, &settings);
            store.save(&wb, &output)?;
            if tables == 0 {
                println!("No markdown tables found.");
                println!("Wrote full content to {}", output.display());
            } else {
                println!("Wrote {} tables to {}", tables, output.display());
            }
        }
        Commands::Sections { input, output, update } => {
            let lines = read_lines(&input)?;
            let mut wb = if update {
                error::require_output(&output)?;
                store.load(&output)?
            } else {
                Workbook::new()
            };
            let buckets = bucket_lines(&lines, Dialect::Pipe, &settings)?;
            put_section_sheets(&mut wb, &buckets);
            store.save(&wb, &output)?;
            let titles: Vec<_> = buckets.sections.iter().map(|s| s.title.as_str()).collect();
            println!("Wrote section sheets for {:?} into {}", titles, output.display());
        }
        Commands::Workbook { input, output, dialect } => {
            let lines = read_lines(&input)?;
            let (wb, buckets) = full_workbook(&lines, dialect, &settings)?;
            store.save(&wb, &output)?;
            println!(
                "Created workbook: {} ({} + {} sections + {} individual test sheets)",
                output.display(),
                settings.selection_sheet,
                buckets.sections.len(),
                buckets.test_cases.len()
            );
        }
        Commands::Selection { input, output } => {
            let lines = read_lines(&input)?;
            error::require_output(&output)?;
            let mut wb = store.load(&output)?;
            let selected = select_lines(&lines, settings.selection_lines);
            wb.put_sheet_at(0, layout::selection_sheet(&settings.selection_sheet, &selected));
            store.save(&wb, &output)?;
            println!(
                "Wrote {} lines to sheet \"{}\" in {}",
                selected.len(),
                settings.selection_sheet,
                output.display()
            );
        }
        Commands::Convert { input, output } => {
            error::require_input(&input)?;
            let source = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let lines: Vec<&str> = source.lines().collect();
            let mut text = convert::tables_to_tabs(&lines).join("\n");
            if source.ends_with('\n') {
                text.push('\n');
            }
            let target = output.unwrap_or(input);
            std::fs::write(&target, text)
                .with_context(|| format!("writing {}", target.display()))?;
            println!("Converted markdown tables to tabs in {}", target.display());
        }
        Commands::Inspect { workbook, rows } => {
            error::require_output(&workbook)?;
            let wb = store.load(&workbook)?;
            print!("{}", inspect_report(&wb, rows));
        }
        Commands::Extract { input, dialect } => {
            let lines = read_lines(&input)?;
            let buckets = bucket_lines(&lines, dialect, &settings)?;
            println!("{}", serde_json::to_string_pretty(&buckets)?);
        }
    }

    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    error::require_input(path)?;
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn bucket_lines(lines: &[String], dialect: Dialect, settings: &Settings) -> Result<Buckets> {
    let rules = BucketRules::from_settings(settings)?;
    let buckets = parser::parse_document(lines, dialect, settings.row_policy, &rules);
    info!(
        sections = buckets.sections.len(),
        test_cases = buckets.test_cases.len(),
        tables = buckets.table_count(),
        "bucketed document"
    );
    Ok(buckets)
}

/// Per-heading workbook and the number of tables in it. A document without
/// tables gets a single content sheet instead.
fn tables_workbook(lines: &[String], settings: &Settings) -> (Workbook, usize) {
    let tables: Vec<_> = Blocks::new(lines, Dialect::Pipe, settings.row_policy)
        .tables()
        .collect();
    let mut wb = Workbook::new();
    if tables.is_empty() {
        warn!("no markdown tables found, writing raw content");
        wb.put_sheet(layout::content_sheet(lines));
    } else {
        for sheet in layout::per_heading_sheets(&tables) {
            wb.put_sheet(sheet);
        }
    }
    (wb, tables.len())
}

fn put_section_sheets(wb: &mut Workbook, buckets: &Buckets) {
    for section in &buckets.sections {
        if section.tables.is_empty() {
            warn!(section = %section.key, "no tables found in section");
        }
        wb.put_sheet(layout::section_sheet(&section.title, &section.tables));
    }
}

fn full_workbook(
    lines: &[String],
    dialect: Dialect,
    settings: &Settings,
) -> Result<(Workbook, Buckets)> {
    let buckets = bucket_lines(lines, dialect, settings)?;
    let selected = select_lines(lines, settings.selection_lines);

    let selection = (settings.selection_sheet.as_str(), selected.as_slice());

    let mut wb = Workbook::new();
    let keys = std::iter::once(BucketKey::Selection).chain(layout::bucket_keys(&buckets));
    for key in keys {
        if let Some(sheet) = layout::bucket_sheet(&key, &buckets, selection) {
            wb.put_sheet(sheet);
        }
    }
    Ok((wb, buckets))
}

fn inspect_report(wb: &Workbook, rows: usize) -> String {
    let mut out = String::from("SHEET_NAMES:\n");
    for sheet in wb.sheets() {
        out.push_str(&format!("- {}\n", sheet.name));
        for row in sheet.rows.iter().take(rows) {
            out.push_str(&format!("   {row:?}\n"));
        }
        out.push('\n');
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_lines() -> Vec<String> {
        std::fs::read_to_string("tests/fixtures/system_test_specification.md")
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn full_workbook_sheet_order() {
        let settings = Settings::default();
        let (wb, buckets) = full_workbook(&fixture_lines(), Dialect::Pipe, &settings).unwrap();
        let names: Vec<_> = wb.sheet_names().collect();
        assert_eq!(names[0], "選択範囲");
        assert_eq!(names[1], "3.1 一般ユーザーシナリオ");
        assert_eq!(names[2], "3.2 管理ユーザーシナリオ");
        assert_eq!(names[3], "3.3 エラーハンドリングシナリオ");
        assert_eq!(names.len(), 4 + buckets.test_cases.len());
        assert!(names.iter().any(|n| n.starts_with("UST-001")));

        let selection = wb.sheet("選択範囲").unwrap();
        assert_eq!(selection.rows[0], vec!["content"]);
        assert_eq!(selection.rows.len(), 1 + settings.selection_lines.min(fixture_lines().len()));
    }

    #[test]
    fn tab_dialect_after_convert_matches_pipe() {
        let settings = Settings::default();
        let lines = fixture_lines();
        let converted = convert::tables_to_tabs(&lines);
        let (pipe, _) = full_workbook(&lines, Dialect::Pipe, &settings).unwrap();
        let (tab, _) = full_workbook(&converted, Dialect::Tab, &settings).unwrap();
        // the selection sheet holds raw lines, which differ after conversion
        assert_eq!(pipe.sheets()[1..], tab.sheets()[1..]);
    }

    #[test]
    fn tables_workbook_without_tables() {
        let lines = vec!["# Title".to_string(), "no tables".to_string()];
        let (wb, n) = tables_workbook(&lines, &Settings::default());
        assert_eq!(n, 0);
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["Content"]);
        assert_eq!(wb.sheet("Content").unwrap().rows.len(), 3);
    }

    #[test]
    fn section_update_replaces_sheets_in_place_of_old() {
        let settings = Settings::default();
        let buckets = bucket_lines(&fixture_lines(), Dialect::Pipe, &settings).unwrap();
        let mut wb = Workbook::new();
        let mut stale = workbook::Sheet::new("3.1 一般ユーザーシナリオ");
        stale.push(["stale"]);
        wb.put_sheet(stale);
        wb.put_sheet(workbook::Sheet::new("other"));

        put_section_sheets(&mut wb, &buckets);
        let names: Vec<_> = wb.sheet_names().collect();
        assert_eq!(names.len(), 4);
        assert_eq!(names[0], "other");
        assert_ne!(wb.sheet("3.1 一般ユーザーシナリオ").unwrap().rows[0], vec!["stale"]);
    }

    #[test]
    fn missing_input_is_reported() {
        let err = read_lines(Path::new("tests/fixtures/does_not_exist.md")).unwrap_err();
        assert!(err.to_string().contains("Input md not found"));
    }

    #[test]
    fn missing_workbook_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.xlsx");
        let input = PathBuf::from("tests/fixtures/system_test_specification.md");

        let commands = [
            Commands::Selection { input: input.clone(), output: missing.clone() },
            Commands::Sections { input, output: missing.clone(), update: true },
            Commands::Inspect { workbook: missing.clone(), rows: 5 },
        ];
        for command in commands {
            let err = run(Cli { config: None, command }).unwrap_err();
            assert!(err.to_string().contains("Output xlsx not found"), "got: {err:#}");
        }
        assert!(!missing.exists());
    }

    #[test]
    fn inspect_limits_rows() {
        let mut wb = Workbook::new();
        let mut s = workbook::Sheet::new("A");
        for i in 0..10 {
            s.push([i.to_string()]);
        }
        wb.put_sheet(s);
        let report = inspect_report(&wb, 5);
        assert!(report.starts_with("SHEET_NAMES:\n- A\n"));
        assert_eq!(report.lines().filter(|l| l.starts_with("   ")).count(), 5);
    }
}
