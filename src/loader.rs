use crate::errors::{FormatError, LoadError, SchemaError};
use csv::Trim;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Cell contents that are read as "no value" rather than as a number. These
/// cells contribute nothing to a column sum.
const MISSING_VALUES: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

#[derive(Clone, Debug, PartialEq)]
pub struct LoadOptions {
    /// The single byte separating fields within a record.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// An AllocationTable holds the numeric dollar columns of one delimited
/// allocation file, one value per (location, [contract]) row.
///
/// Only the columns requested at load time are parsed and exposed; every
/// other column is known by its header name alone.
#[derive(Debug, PartialEq)]
pub struct AllocationTable {
    label: String,
    headers: Vec<String>,
    columns: HashMap<String, Vec<Option<f64>>>,
    row_count: usize,
}

impl AllocationTable {
    /// Reads the table at `path`, parsing each of `columns` as a numeric
    /// column.
    ///
    /// Fails with `LoadError::NotFound` when the path cannot be opened or
    /// read, `LoadError::Schema` when a requested column is absent or
    /// ambiguous, and `LoadError::Format` on the first malformed row.
    pub fn load(path: &Path, columns: &[&str], options: &LoadOptions) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|err| LoadError::NotFound {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let table = Self::from_reader(file, path.display().to_string(), columns, options)?;
        info!(
            table = %table.label,
            rows = table.row_count,
            "loaded allocation table"
        );
        Ok(table)
    }

    /// Reads a table from any byte source. `label` names the source in
    /// errors and log records.
    pub fn from_reader<R: Read>(
        reader: R,
        label: impl Into<String>,
        columns: &[&str],
        options: &LoadOptions,
    ) -> Result<Self, LoadError> {
        let label = label.into();

        // Note: the csv library wraps the reader in its own buffer, so there
        // is no need for an io::BufReader here.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .delimiter(options.delimiter)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|err| read_error(&label, err))?
            .iter()
            .map(|header| String::from_utf8_lossy(header).into_owned())
            .collect();

        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let index =
                column_index(&headers, column).map_err(|err| LoadError::schema(&label, err))?;
            indices.push((*column, index));
        }

        let mut parsed: Vec<Vec<Option<f64>>> = vec![Vec::new(); indices.len()];
        let mut row_count = 0;

        // Only the requested columns are decoded, so identifier columns in
        // other encodings don't stop the load.
        for record in reader.byte_records() {
            let record = record.map_err(|err| read_error(&label, err))?;
            let line = record.position().map(|pos| pos.line()).unwrap_or(0);

            for ((column, index), values) in indices.iter().zip(parsed.iter_mut()) {
                // Every record has as many fields as the header; the reader
                // rejects anything else.
                let value = decode_cell(record.get(*index).unwrap_or(&b""[..]), line, column)
                    .and_then(|raw| parse_amount(raw, line, column))
                    .map_err(|err| LoadError::format(&label, err))?;
                values.push(value);
            }
            row_count += 1;
        }

        let mut table = Self {
            label,
            headers,
            columns: HashMap::with_capacity(indices.len()),
            row_count,
        };
        for ((column, _), values) in indices.into_iter().zip(parsed) {
            let missing = values.iter().filter(|value| value.is_none()).count();
            if missing > 0 {
                warn!(
                    table = %table.label,
                    column,
                    missing,
                    "cells without a value will not contribute to the total"
                );
            }
            debug!(table = %table.label, column, rows = values.len(), "parsed numeric column");
            table.columns.insert(column.to_string(), values);
        }

        Ok(table)
    }

    /// The path or name this table was loaded from.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the values of a column parsed at load time, `None` marking a
    /// cell without a value.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>], LoadError> {
        self.columns.get(name).map(Vec::as_slice).ok_or_else(|| {
            LoadError::schema(
                &self.label,
                SchemaError::MissingColumn {
                    column: name.to_string(),
                    available: self.headers.clone(),
                },
            )
        })
    }

    /// The number of cells without a value in the named column.
    pub fn missing(&self, name: &str) -> Result<usize, LoadError> {
        Ok(self.column(name)?.iter().filter(|value| value.is_none()).count())
    }
}

fn column_index(headers: &[String], column: &str) -> Result<usize, SchemaError> {
    let mut matching = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| header.as_str() == column)
        .map(|(index, _)| index);

    match (matching.next(), matching.next()) {
        (Some(index), None) => Ok(index),
        (Some(_), Some(_)) => Err(SchemaError::DuplicateColumn(column.to_string())),
        (None, _) => Err(SchemaError::MissingColumn {
            column: column.to_string(),
            available: headers.to_vec(),
        }),
    }
}

fn decode_cell<'a>(bytes: &'a [u8], line: u64, column: &str) -> Result<&'a str, FormatError> {
    std::str::from_utf8(bytes).map_err(|err| FormatError::Malformed {
        line,
        message: format!("column '{}' is not valid UTF-8: {}", column, err),
    })
}

fn parse_amount(raw: &str, line: u64, column: &str) -> Result<Option<f64>, FormatError> {
    if MISSING_VALUES.contains(&raw) {
        return Ok(None);
    }

    let value: f64 = raw.parse().map_err(|_| FormatError::InvalidNumber {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })?;

    if !value.is_finite() {
        return Err(FormatError::NonFinite {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        });
    }

    Ok(Some(value))
}

fn read_error(label: &str, err: csv::Error) -> LoadError {
    let line = err.position().map(|pos| pos.line()).unwrap_or(0);
    match err.kind() {
        csv::ErrorKind::Io(io) => LoadError::NotFound {
            path: PathBuf::from(label),
            reason: io.to_string(),
        },
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => LoadError::format(
            label,
            FormatError::UnequalLengths {
                line,
                expected: *expected_len,
                found: *len,
            },
        ),
        _ => LoadError::format(
            label,
            FormatError::Malformed {
                line,
                message: err.to_string(),
            },
        ),
    }
}
