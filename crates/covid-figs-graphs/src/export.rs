//! Output file naming and CSV snapshots of rendered series.

use crate::series::NamedSeries;
use chrono::NaiveDate;
use covid_figs_common::{file_slug, FigsError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header of the date column in CSV snapshots.
pub const DATE_COLUMN: &str = "data";

/// A dated output file and the undated copy that always holds the latest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPair {
    pub dated: PathBuf,
    pub latest: PathBuf,
}

impl OutputPair {
    /// `{slug}-{kind}-{YYYYMMDD}.{ext}` and `{slug}-{kind}.{ext}` inside `folder`.
    pub fn new(folder: Option<&Path>, name: &str, kind: &str, date: NaiveDate, ext: &str) -> Self {
        let slug = file_slug(name);
        let dated = format!("{slug}-{kind}-{}.{ext}", date.format("%Y%m%d"));
        let latest = format!("{slug}-{kind}.{ext}");
        match folder {
            Some(folder) => Self {
                dated: folder.join(dated),
                latest: folder.join(latest),
            },
            None => Self {
                dated: PathBuf::from(dated),
                latest: PathBuf::from(latest),
            },
        }
    }

    /// Copy the dated file over the latest one.
    pub fn promote(&self) -> Result<()> {
        fs::copy(&self.dated, &self.latest)?;
        Ok(())
    }
}

/// Write `first` and `others`, which share one date index, as CSV columns.
///
/// NaN is written as an empty cell.
pub fn write_series_csv(path: &Path, first: &NamedSeries, others: &[&NamedSeries]) -> Result<()> {
    if let Some(other) = others.iter().find(|s| s.dates() != first.dates()) {
        return Err(FigsError::validation(format!(
            "Series '{}' does not share the date index of '{}'",
            other.name(),
            first.name()
        )));
    }

    let mut writer = csv::Writer::from_path(path).map_err(std::io::Error::from)?;
    let mut header = vec![DATE_COLUMN.to_string(), first.name().to_string()];
    header.extend(others.iter().map(|s| s.name().to_string()));
    writer.write_record(&header).map_err(std::io::Error::from)?;

    for (i, date) in first.dates().iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(
            std::iter::once(first)
                .chain(others.iter().copied())
                .map(|s| format_cell(s.values()[i])),
        );
        writer.write_record(&record).map_err(std::io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Read a CSV snapshot back into one series per value column.
pub fn load_series_csv(path: &Path) -> Result<Vec<NamedSeries>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.first().map(String::as_str) != Some(DATE_COLUMN) {
        return Err(FigsError::source_data(format!(
            "{} does not start with a '{DATE_COLUMN}' column",
            path.display()
        )));
    }

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len() - 1];
    for record in reader.records() {
        let record = record?;
        let date = NaiveDate::parse_from_str(&record[0], "%Y-%m-%d").map_err(|e| {
            FigsError::source_data_with_source(format!("Invalid date '{}'", &record[0]), e)
        })?;
        dates.push(date);
        for (column, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse().map_err(|e| {
                    FigsError::source_data_with_source(format!("Invalid value '{cell}'"), e)
                })?
            };
            column.push(value);
        }
    }

    headers
        .into_iter()
        .skip(1)
        .zip(columns)
        .map(|(name, values)| NamedSeries::new(name, dates.clone(), values))
        .collect()
}

/// Write a CSV snapshot under its dated name, then copy it to the latest name.
pub fn save_csv(pair: &OutputPair, first: &NamedSeries, others: &[&NamedSeries]) -> Result<()> {
    write_series_csv(&pair.dated, first, others)?;
    pair.promote()?;
    info!(
        "Data saved to {} and {}",
        pair.dated.display(),
        pair.latest.display()
    );
    Ok(())
}
