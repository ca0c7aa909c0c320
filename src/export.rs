//! CSV export of the current result's equity curve.

use crate::model::BacktestResult;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const CSV_MIME: &str = "text/csv";

/// A file ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

/// Replace every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn sanitize_date_part(date: &str) -> String {
    date.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Header plus one `date,equity` row per portfolio point, in series order.
pub fn build_csv(result: &BacktestResult) -> String {
    let p = &result.portfolio;
    let mut out = String::from("date,equity\n");
    for (date, equity) in p.dates.iter().zip(&p.equity) {
        out.push_str(&format!("{date},{equity}\n"));
    }
    out
}

pub fn file_name(result: &BacktestResult) -> String {
    format!(
        "{}_equity_{}_{}.csv",
        sanitize_file_stem(&result.fund_name),
        sanitize_date_part(&result.effective_start),
        sanitize_date_part(&result.effective_end)
    )
}

/// Build the export for the current result; `None` when nothing is cached.
pub fn artifact(current: Option<&BacktestResult>) -> Option<CsvArtifact> {
    let result = current?;
    Some(CsvArtifact {
        file_name: file_name(result),
        mime_type: CSV_MIME,
        contents: build_csv(result),
    })
}

impl CsvArtifact {
    /// Write into `dir` and return the absolute path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create export directory {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)
            .with_context(|| format!("write {}", path.display()))?;
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        tracing::info!(path = %path.display(), mime = self.mime_type, "exported csv");
        Ok(path)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.contents).with_context(|| format!("write {}", path.display()))
    }
}

/// The user's download directory, or the working directory when there is none.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_result;

    #[test]
    fn no_result_means_no_artifact() {
        assert!(artifact(None).is_none());
    }

    #[test]
    fn monthly_series_yields_header_plus_rows() {
        let r = sample_result(24);
        let a = artifact(Some(&r)).unwrap();
        let lines: Vec<&str> = a.contents.lines().collect();
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[0], "date,equity");
        assert_eq!(a.mime_type, "text/csv");
    }

    #[test]
    fn rows_reproduce_series_positionally() {
        let r = sample_result(12);
        let csv = build_csv(&r);
        for (i, line) in csv.lines().skip(1).enumerate() {
            let (date, equity) = line.split_once(',').unwrap();
            assert_eq!(date, r.portfolio.dates[i]);
            assert_eq!(equity.parse::<f64>().unwrap(), r.portfolio.equity[i]);
        }
    }

    #[test]
    fn file_name_sanitizes_fund_name() {
        let r = sample_result(3);
        assert_eq!(
            file_name(&r),
            "Fund_1___Core_Income__low_risk__equity_2020-01-01_2020-03-01.csv"
        );
    }

    #[test]
    fn file_name_never_carries_path_separators() {
        let mut r = sample_result(3);
        r.effective_end = "../../evil".into();
        let name = file_name(&r);
        assert_eq!(
            name,
            "Fund_1___Core_Income__low_risk__equity_2020-01-01_______evil.csv"
        );

        let dir = tempfile::tempdir().unwrap();
        let path = artifact(Some(&r)).unwrap().write_to_dir(dir.path()).unwrap();
        let dir_path = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(path.parent(), Some(dir_path.as_path()));
    }

    #[test]
    fn writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let a = artifact(Some(&sample_result(2))).unwrap();
        let path = a.write_to_dir(&dir.path().join("nested")).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "date,equity\n2020-01-01,1\n2020-02-01,1.01\n");
    }
}
