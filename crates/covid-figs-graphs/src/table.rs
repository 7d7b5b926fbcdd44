//! In-memory CSV table indexed by a timestamp column.

use crate::series::NamedSeries;
use chrono::{NaiveDate, NaiveDateTime};
use covid_figs_common::{parse_timestamp, FigsError, Result};
use std::collections::BTreeMap;
use std::io::Read;

/// Columns parsed as timestamps and the one used as row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    pub date_columns: Vec<String>,
    pub index_column: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            date_columns: vec!["data".to_string()],
            index_column: "data".to_string(),
        }
    }
}

/// One row: its parsed index and the raw cells in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub index: NaiveDateTime,
    pub cells: Vec<String>,
}

/// Rows of a CSV file, stably sorted by their timestamp index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    headers: Vec<String>,
    index_column: String,
    rows: Vec<TableRow>,
}

impl DataTable {
    /// Parse CSV text with a header row.
    pub fn from_csv_str(text: &str, options: &TableOptions) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes(), options)
    }

    /// Parse CSV from any reader with a header row.
    ///
    /// Every configured date column must parse as a timestamp on every row.
    pub fn from_csv_reader<R: Read>(reader: R, options: &TableOptions) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let position = |column: &str| {
            headers.iter().position(|h| h == column).ok_or_else(|| {
                FigsError::source_data(format!("Missing column '{column}' in CSV header"))
            })
        };
        let index_pos = position(&options.index_column)?;
        let date_positions = options
            .date_columns
            .iter()
            .map(|c| position(c))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            for &pos in &date_positions {
                if parse_timestamp(&cells[pos]).is_none() {
                    return Err(FigsError::source_data(format!(
                        "Row {}: '{}' in column '{}' is not a date",
                        line + 1,
                        cells[pos],
                        headers[pos]
                    )));
                }
            }
            let index = parse_timestamp(&cells[index_pos]).ok_or_else(|| {
                FigsError::source_data(format!("Row {}: missing index value", line + 1))
            })?;
            rows.push(TableRow { index, cells });
        }
        rows.sort_by_key(|row| row.index);

        Ok(Self {
            headers,
            index_column: options.index_column.clone(),
            rows,
        })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Name of the index column.
    pub fn index_column(&self) -> &str {
        &self.index_column
    }

    /// Rows in index order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header.
    pub fn column_position(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| FigsError::source_data(format!("Missing column '{column}'")))
    }

    /// Range of the index, if any rows exist.
    pub fn index_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.rows.first()?.index, self.rows.last()?.index))
    }

    /// Rows whose `column` cell equals `value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Self> {
        let pos = self.column_position(column)?;
        Ok(Self {
            headers: self.headers.clone(),
            index_column: self.index_column.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row.cells[pos] == value)
                .cloned()
                .collect(),
        })
    }

    /// One row per calendar day between the first and last indexed day.
    ///
    /// Each cell holds the last non-empty value seen that day; days without
    /// rows become rows of empty cells. Resampled rows are indexed at midnight.
    #[must_use]
    pub fn resample_daily(&self) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
        for row in &self.rows {
            let cells = days
                .entry(row.index.date())
                .or_insert_with(|| vec![String::new(); self.headers.len()]);
            for (slot, cell) in cells.iter_mut().zip(&row.cells) {
                if !cell.trim().is_empty() {
                    slot.clone_from(cell);
                }
            }
        }

        let bounds = days.keys().next().copied().zip(days.keys().next_back().copied());
        let rows = match bounds {
            Some((first, last)) => first
                .iter_days()
                .take_while(|d| *d <= last)
                .map(|day| TableRow {
                    index: day.and_time(chrono::NaiveTime::MIN),
                    cells: days
                        .remove(&day)
                        .unwrap_or_else(|| vec![String::new(); self.headers.len()]),
                })
                .collect(),
            None => Vec::new(),
        };

        Self {
            headers: self.headers.clone(),
            index_column: self.index_column.clone(),
            rows,
        }
    }

    /// Numeric observations of `column`, paired with the row index.
    ///
    /// Empty cells become NaN; any other unparseable cell is an error.
    pub fn column_values(&self, column: &str) -> Result<Vec<(NaiveDateTime, f64)>> {
        let pos = self.column_position(column)?;
        self.rows
            .iter()
            .map(|row| {
                let cell = row.cells[pos].trim();
                if cell.is_empty() {
                    return Ok((row.index, f64::NAN));
                }
                cell.parse::<f64>().map(|v| (row.index, v)).map_err(|e| {
                    FigsError::source_data_with_source(
                        format!("'{cell}' in column '{column}' at {} is not a number", row.index),
                        e,
                    )
                })
            })
            .collect()
    }

    /// Daily-resampled series of a numeric column.
    pub fn daily_series(&self, column: &str, name: impl Into<String>) -> Result<NamedSeries> {
        Ok(NamedSeries::from_observations(name, self.column_values(column)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covid_figs_common::test_utils::feed_fixtures::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
    }

    #[test]
    fn test_parse_regional_feed() {
        let csv = regional_csv(
            start(),
            &[("Lombardia", increasing_counts(3)), ("Veneto", increasing_counts(3))],
        );
        let table = DataTable::from_csv_str(&csv, &TableOptions::default()).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.headers()[0], "data");
        assert_eq!(table.index_column(), "data");

        let lombardia = table.filter_eq("denominazione_regione", "Lombardia").unwrap();
        assert_eq!(lombardia.len(), 3);
        let totals = lombardia.daily_series("totale_casi", "totali Lombardia").unwrap();
        assert_eq!(totals.values(), &[100.0, 115.0, 150.0]);
    }

    #[test]
    fn test_rows_sorted_stably() {
        let csv = "data,v\n2020-03-02T18:00:00,b\n2020-03-01T18:00:00,a\n2020-03-02T18:00:00,c\n";
        let table = DataTable::from_csv_str(csv, &TableOptions::default()).unwrap();
        let cells: Vec<&str> = table.rows().iter().map(|r| r.cells[1].as_str()).collect();
        assert_eq!(cells, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_index_column() {
        let err = DataTable::from_csv_str("date,v\n2020-03-01,1\n", &TableOptions::default())
            .unwrap_err();
        assert!(matches!(err, FigsError::Source { .. }));
    }

    #[test]
    fn test_bad_date_rejected() {
        let err =
            DataTable::from_csv_str("data,v\nyesterday,1\n", &TableOptions::default()).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = DataTable::from_csv_str("data,v\n2020-03-01,1,2\n", &TableOptions::default())
            .unwrap_err();
        assert!(matches!(err, FigsError::Source { .. }));
    }

    #[test]
    fn test_resample_fills_missing_days() {
        let csv = "data,v,w\n\
                   2020-03-01T09:00:00,1,x\n\
                   2020-03-01T18:00:00,2,\n\
                   2020-03-03T18:00:00,3,y\n";
        let table = DataTable::from_csv_str(csv, &TableOptions::default())
            .unwrap()
            .resample_daily();

        assert_eq!(table.len(), 3);
        let rows = table.rows();
        assert_eq!(rows[0].index, start().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(rows[0].cells[1..], ["2".to_string(), "x".to_string()]);
        assert!(rows[1].cells.iter().all(String::is_empty));
        assert_eq!(rows[2].cells[1], "3");
    }

    #[test]
    fn test_empty_cells_become_nan() {
        let csv = "data,v\n2020-03-01,1\n2020-03-02,\n";
        let table = DataTable::from_csv_str(csv, &TableOptions::default()).unwrap();
        let values = table.column_values("v").unwrap();
        assert_eq!(values[0].1, 1.0);
        assert!(values[1].1.is_nan());

        let err = DataTable::from_csv_str("data,v\n2020-03-01,abc\n", &TableOptions::default())
            .unwrap()
            .column_values("v")
            .unwrap_err();
        assert!(matches!(err, FigsError::Source { .. }));
    }

    #[test]
    fn test_filter_unknown_column() {
        let table = DataTable::from_csv_str("data,v\n2020-03-01,1\n", &TableOptions::default())
            .unwrap();
        assert!(table.filter_eq("regione", "Lombardia").is_err());
        assert_eq!(table.filter_eq("v", "2").unwrap().len(), 0);
    }
}
