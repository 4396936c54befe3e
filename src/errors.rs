use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::path::PathBuf;

/// Problems with the header of an allocation table.
#[derive(Debug, PartialEq)]
pub enum SchemaError {
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    DuplicateColumn(String),
}

/// Problems with an individual row or cell of an allocation table.
#[derive(Debug, PartialEq)]
pub enum FormatError {
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
    NonFinite {
        line: u64,
        column: String,
        value: String,
    },
    /// Every cell was finite but their sum is not.
    TotalOverflow {
        column: String,
    },
    UnequalLengths {
        line: u64,
        expected: u64,
        found: u64,
    },
    Malformed {
        line: u64,
        message: String,
    },
}

#[derive(Debug, PartialEq)]
pub enum LoadError {
    /// The input path does not exist or could not be opened or read.
    NotFound { path: PathBuf, reason: String },
    Schema { table: String, error: SchemaError },
    Format { table: String, error: FormatError },
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Read { path: PathBuf, reason: String },
    Parse(String),
    Validation(String),
}

/// Any failure that aborts a reconciliation run.
#[derive(Debug, PartialEq)]
pub enum ReconcileError {
    Config(ConfigError),
    Load(LoadError),
}

impl LoadError {
    pub fn schema(table: impl Into<String>, error: SchemaError) -> Self {
        LoadError::Schema {
            table: table.into(),
            error,
        }
    }

    pub fn format(table: impl Into<String>, error: FormatError) -> Self {
        LoadError::Format {
            table: table.into(),
            error,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::MissingColumn { column, available } => {
                if available.is_empty() {
                    write!(f, "missing column '{}', the table has no header", column)
                } else {
                    write!(
                        f,
                        "missing column '{}', available columns are: {}",
                        column,
                        available.join(", ")
                    )
                }
            }
            SchemaError::DuplicateColumn(column) => {
                write!(f, "column '{}' appears more than once in the header", column)
            }
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidNumber {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}: cannot parse '{}' in column '{}' as a number",
                line, value, column
            ),
            FormatError::NonFinite {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}: value '{}' in column '{}' is not a finite amount",
                line, value, column
            ),
            FormatError::TotalOverflow { column } => write!(
                f,
                "the total of column '{}' is too large to represent",
                column
            ),
            FormatError::UnequalLengths {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {}: expected {} fields but found {}",
                line, expected, found
            ),
            FormatError::Malformed { line, message } => {
                write!(f, "line {}: malformed record: {}", line, message)
            }
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound { path, reason } => {
                write!(f, "unable to read table {}: {}", path.display(), reason)
            }
            LoadError::Schema { table, error } => {
                write!(f, "schema error in table {}: {}", table, error)
            }
            LoadError::Format { table, error } => {
                write!(f, "format error in table {}: {}", table, error)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, reason } => {
                write!(f, "unable to read config {}: {}", path.display(), reason)
            }
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Config(err) => write!(f, "{}", err),
            ReconcileError::Load(err) => write!(f, "{}", err),
        }
    }
}

impl From<ConfigError> for ReconcileError {
    fn from(err: ConfigError) -> Self {
        ReconcileError::Config(err)
    }
}

impl From<LoadError> for ReconcileError {
    fn from(err: LoadError) -> Self {
        ReconcileError::Load(err)
    }
}

impl Error for SchemaError {}
impl Error for FormatError {}
impl Error for LoadError {}
impl Error for ConfigError {}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReconcileError::Config(err) => Some(err),
            ReconcileError::Load(err) => Some(err),
        }
    }
}
