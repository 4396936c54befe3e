use crate::errors::ConfigError;
use crate::loader::LoadOptions;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The default accepted difference between a variant total and its expected
/// value, in currency units.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_delimiter() -> String {
    String::from(",")
}

/// ReconcileConfig describes every dataset variant taking part in a run,
/// where its tables live, and what its total is expected to be.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// The expected total for any variant that doesn't set its own.
    #[serde(default)]
    pub expected: Option<f64>,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default, rename = "variant")]
    pub variants: Vec<VariantConfig>,
}

/// A named pair of headquarters and satellite tables sharing one dollar
/// column.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    pub name: String,

    /// The dollar column summed for this variant, e.g. `Dollars_Per_Location`
    /// for Map2 or `Dollars_Per_Contract_Per_Location` for Map2b.
    pub column: String,

    pub hq: PathBuf,
    pub satellites: PathBuf,

    #[serde(default)]
    pub expected: Option<f64>,
}

impl ReconcileConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: ReconcileConfig =
            toml::from_str(input).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variants.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[variant]] is required".into(),
            ));
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Validation(format!(
                "tolerance must be a non-negative amount, got {}",
                self.tolerance
            )));
        }

        if self.delimiter.len() != 1 || !self.delimiter.is_ascii() {
            return Err(ConfigError::Validation(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }

        if let Some(expected) = self.expected {
            if !expected.is_finite() {
                return Err(ConfigError::Validation(
                    "expected total must be a finite amount".into(),
                ));
            }
        }

        let mut names = HashSet::new();
        for variant in &self.variants {
            if variant.name.trim().is_empty() {
                return Err(ConfigError::Validation("variant name must not be empty".into()));
            }
            if !names.insert(variant.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "variant '{}' is defined more than once",
                    variant.name
                )));
            }
            if variant.column.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "variant '{}': column must not be empty",
                    variant.name
                )));
            }
            if let Some(expected) = variant.expected {
                if !expected.is_finite() {
                    return Err(ConfigError::Validation(format!(
                        "variant '{}': expected total must be a finite amount",
                        variant.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Keeps only the named variants, preserving their configured order. An
    /// empty list of names keeps every variant.
    pub fn select(mut self, names: &[String]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(self);
        }

        if let Some(unknown) = names
            .iter()
            .find(|name| !self.variants.iter().any(|variant| &variant.name == *name))
        {
            return Err(ConfigError::Validation(format!(
                "unknown variant '{}'",
                unknown
            )));
        }

        self.variants.retain(|variant| names.contains(&variant.name));
        Ok(self)
    }

    /// Makes every relative table path relative to `base` instead of the
    /// working directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        for variant in &mut self.variants {
            if variant.hq.is_relative() {
                variant.hq = base.join(&variant.hq);
            }
            if variant.satellites.is_relative() {
                variant.satellites = base.join(&variant.satellites);
            }
        }
    }

    /// The expected total for a variant, falling back to the top-level one.
    pub fn expected_for(&self, variant: &VariantConfig) -> Option<f64> {
        variant.expected.or(self.expected)
    }

    pub fn load_options(&self) -> LoadOptions {
        let delimiter = self
            .delimiter
            .as_bytes()
            .first()
            .copied()
            .unwrap_or(LoadOptions::default().delimiter);
        LoadOptions { delimiter }
    }
}

impl TryFrom<PathBuf> for ReconcileConfig {
    type Error = ConfigError;

    /// Reads and validates the config file at the provided path. Relative
    /// table paths in the file are taken relative to the file itself.
    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        let input = fs::read_to_string(&path).map_err(|err| ConfigError::Read {
            path: path.clone(),
            reason: err.to_string(),
        })?;

        let mut config = Self::from_toml(&input)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        Ok(config)
    }
}
