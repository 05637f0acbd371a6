//! CSV input and augmented CSV output
//!
//! The input table is read whole, the channel URL column is located, and the
//! rows become batch items. After the run the same rows are written back with
//! one column per link category plus a status column.

use crate::crawler::{BatchItem, ItemReport};
use crate::url::Category;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Status column appended to the output table
pub const STATUS_COLUMN: &str = "Processing Status";

/// Header fragments that mark a channel URL column
const URL_HEADER_HINTS: &[&str] = &["url", "link", "channel"];

/// Rows sampled when falling back to value-based detection
const DETECTION_SAMPLE: usize = 10;

/// Errors that can occur reading or writing tables
#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Column '{name}' not found. Available columns: {}", available.join(", "))]
    MissingColumn { name: String, available: Vec<String> },

    #[error("Could not detect URL column. Please specify the column name.")]
    NoUrlColumn,
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// An input table with its channel URL column located
#[derive(Debug, Clone)]
pub struct InputTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    url_column: usize,
    limit_note: Option<String>,
}

impl InputTable {
    /// Reads a CSV file
    ///
    /// # Arguments
    ///
    /// * `path` - The CSV file
    /// * `url_column` - Explicit URL column name, or `None` to detect it
    /// * `max_rows` - Keep only the first N data rows
    pub fn read(path: &Path, url_column: Option<&str>, max_rows: Option<usize>) -> TableResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, url_column, max_rows)
    }

    /// Reads CSV text from any reader
    pub fn from_reader<R: Read>(
        reader: R,
        url_column: Option<&str>,
        max_rows: Option<usize>,
    ) -> TableResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }

        let limit_note = match max_rows {
            Some(limit) if rows.len() > limit => {
                tracing::info!("Input has {} rows, keeping the first {}", rows.len(), limit);
                rows.truncate(limit);
                Some(format!("Processing limited to first {} rows", limit))
            }
            _ => None,
        };

        let url_column = match url_column {
            Some(name) => headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::MissingColumn {
                    name: name.to_string(),
                    available: headers.clone(),
                })?,
            None => detect_url_column(&headers, &rows).ok_or(TableError::NoUrlColumn)?,
        };

        tracing::debug!("Using '{}' as the channel URL column", headers[url_column]);

        Ok(Self {
            headers,
            rows,
            url_column,
            limit_note,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn url_column_name(&self) -> &str {
        &self.headers[self.url_column]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// "Processing limited to first N rows" if the input was truncated
    pub fn limit_note(&self) -> Option<&str> {
        self.limit_note.as_deref()
    }

    /// One batch item per data row, blank URL cells included
    pub fn batch_items(&self) -> Vec<BatchItem> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let cell = row.get(self.url_column).map(String::as_str).unwrap_or("");
                BatchItem::new(index, cell.trim())
            })
            .collect()
    }

    /// Writes the augmented table to a file
    pub fn write_augmented(&self, reports: &[ItemReport], path: &Path) -> TableResult<()> {
        let file = File::create(path)?;
        self.write_augmented_to(reports, file)
    }

    /// Writes the input rows plus category and status columns
    ///
    /// Columns already named like a category or the status column are
    /// reused in place; the rest are appended in category order. Link cells
    /// are only written for rows that produced links, so a failed or skipped
    /// row keeps whatever its input had.
    pub fn write_augmented_to<W: Write>(&self, reports: &[ItemReport], writer: W) -> TableResult<()> {
        let mut headers = self.headers.clone();
        let mut column_of = |name: &str| match headers.iter().position(|h| h == name) {
            Some(position) => position,
            None => {
                headers.push(name.to_string());
                headers.len() - 1
            }
        };

        let category_columns: Vec<(Category, usize)> = Category::ALL
            .iter()
            .map(|category| (*category, column_of(category.column_name())))
            .collect();
        let status_column = column_of(STATUS_COLUMN);

        let by_index: HashMap<usize, &ItemReport> = reports.iter().map(|r| (r.index, r)).collect();

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&headers)?;

        for (index, row) in self.rows.iter().enumerate() {
            let mut out = row.clone();
            out.resize(headers.len().max(out.len()), String::new());

            if let Some(report) = by_index.get(&index) {
                if let Some(links) = &report.links {
                    for (category, column) in &category_columns {
                        out[*column] = links.joined(*category);
                    }
                }
                out[status_column] = report.message.clone();
            }

            csv_writer.write_record(&out)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Finds the channel URL column
///
/// A header containing "url", "link" or "channel" (any case) wins; otherwise
/// the first column whose sampled values start with an http(s) scheme.
pub fn detect_url_column(headers: &[String], rows: &[Vec<String>]) -> Option<usize> {
    if let Some(position) = headers.iter().position(|header| {
        let lowered = header.to_lowercase();
        URL_HEADER_HINTS.iter().any(|hint| lowered.contains(hint))
    }) {
        return Some(position);
    }

    (0..headers.len()).find(|&column| {
        rows.iter().take(DETECTION_SAMPLE).any(|row| {
            row.get(column)
                .map(|cell| {
                    let cell = cell.trim();
                    cell.starts_with("http://") || cell.starts_with("https://")
                })
                .unwrap_or(false)
        })
    })
}
