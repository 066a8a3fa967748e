use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input md not found: {}", .0.display())]
    MissingInputFile(PathBuf),

    #[error("Output xlsx not found: {}", .0.display())]
    MissingOutputTarget(PathBuf),

    #[error("invalid test-case prefix pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to read workbook {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),
}

/// Fails with `MissingInputFile` unless `path` exists.
pub fn require_input(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::MissingInputFile(path.to_path_buf()))
    }
}

/// Fails with `MissingOutputTarget` unless `path` exists.
pub fn require_output(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::MissingOutputTarget(path.to_path_buf()))
    }
}
