use crate::config::{ReconcileConfig, VariantConfig};
use crate::errors::{FormatError, LoadError, ReconcileError};
use crate::loader::{AllocationTable, LoadOptions};
use tracing::{debug, info, warn};

/// A running sum with Neumaier compensation, so that adding hundreds of
/// thousands of currency amounts does not accumulate rounding error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for CompensatedSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Self::default();
        sum.extend(iter);
        sum
    }
}

/// The sum of one table's dollar column.
#[derive(Clone, Debug, PartialEq)]
pub struct Subtotal {
    pub rows: usize,

    /// Rows whose dollar cell held no value.
    pub missing: usize,

    pub total: f64,
}

impl Subtotal {
    pub fn of(table: &AllocationTable, column: &str) -> Result<Self, LoadError> {
        let sum: CompensatedSum = table.column(column)?.iter().flatten().copied().collect();
        let total = sum.value();
        if !total.is_finite() {
            return Err(overflow(table.label(), column));
        }

        Ok(Self {
            rows: table.row_count(),
            missing: table.missing(column)?,
            total,
        })
    }
}

fn overflow(table: &str, column: &str) -> LoadError {
    LoadError::format(
        table,
        FormatError::TotalOverflow {
            column: column.to_string(),
        },
    )
}

/// The headquarters and satellite subtotals of one dataset variant.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantTotal {
    pub variant: String,
    pub column: String,
    pub hq: Subtotal,
    pub satellites: Subtotal,
}

impl VariantTotal {
    pub fn total(&self) -> f64 {
        self.hq.total + self.satellites.total
    }
}

/// Sums `column` over every row of both tables. Only totals within a single
/// variant are ever added together.
pub fn compute_variant_total(
    variant: &str,
    hq: &AllocationTable,
    satellites: &AllocationTable,
    column: &str,
) -> Result<VariantTotal, LoadError> {
    let hq = Subtotal::of(hq, column)?;
    debug!(variant, rows = hq.rows, total = hq.total, "summed headquarters table");

    let satellites = Subtotal::of(satellites, column)?;
    debug!(
        variant,
        rows = satellites.rows,
        total = satellites.total,
        "summed satellite table"
    );

    let totals = VariantTotal {
        variant: variant.to_string(),
        column: column.to_string(),
        hq,
        satellites,
    };
    if !totals.total().is_finite() {
        return Err(overflow(variant, column));
    }

    Ok(totals)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No expected total was configured.
    Unchecked,
    WithinTolerance,
    Mismatch,
}

/// Compares two amounts, allowing for the representation error of values
/// the size of `scale` on top of the configured tolerance.
fn within_tolerance(difference: f64, tolerance: f64, scale: f64) -> bool {
    difference.abs() <= tolerance + 4.0 * f64::EPSILON * scale.abs().max(1.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantReconciliation {
    pub totals: VariantTotal,
    pub expected: Option<f64>,
    pub tolerance: f64,
}

impl VariantReconciliation {
    pub fn name(&self) -> &str {
        &self.totals.variant
    }

    pub fn total(&self) -> f64 {
        self.totals.total()
    }

    /// The variant total minus its expected total.
    pub fn difference(&self) -> Option<f64> {
        self.expected.map(|expected| self.total() - expected)
    }

    pub fn verdict(&self) -> Verdict {
        match self.expected {
            None => Verdict::Unchecked,
            Some(expected) => {
                let difference = self.total() - expected;
                if within_tolerance(difference, self.tolerance, expected) {
                    Verdict::WithinTolerance
                } else {
                    Verdict::Mismatch
                }
            }
        }
    }
}

/// The difference between the totals of two variants.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossDifference {
    pub left: String,
    pub right: String,
    pub difference: f64,
    pub tolerance: f64,
    scale: f64,
}

impl CrossDifference {
    pub fn within_tolerance(&self) -> bool {
        within_tolerance(self.difference, self.tolerance, self.scale)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reconciliation {
    pub variants: Vec<VariantReconciliation>,
    pub tolerance: f64,
}

impl Reconciliation {
    /// Compares every variant after the first against the first.
    pub fn cross_differences(&self) -> Vec<CrossDifference> {
        let (first, rest) = match self.variants.split_first() {
            Some(split) => split,
            None => return Vec::new(),
        };

        rest.iter()
            .map(|other| CrossDifference {
                left: first.name().to_string(),
                right: other.name().to_string(),
                difference: first.total() - other.total(),
                tolerance: self.tolerance,
                scale: first.total().abs().max(other.total().abs()),
            })
            .collect()
    }

    /// True when no variant misses its expected total and all variants agree
    /// with each other.
    pub fn is_consistent(&self) -> bool {
        self.variants
            .iter()
            .all(|variant| variant.verdict() != Verdict::Mismatch)
            && self
                .cross_differences()
                .iter()
                .all(CrossDifference::within_tolerance)
    }
}

/// A Reconciler loads each configured variant's tables and totals them.
/// Tables are loaded fresh on every run and dropped once summed.
pub struct Reconciler {
    config: ReconcileConfig,
    options: LoadOptions,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        let options = config.load_options();
        Self { config, options }
    }

    /// Reconciles every variant in configured order. The first load error
    /// aborts the run; no partial result is returned.
    pub fn run(&self) -> Result<Reconciliation, ReconcileError> {
        let mut variants = Vec::with_capacity(self.config.variants.len());
        for variant in &self.config.variants {
            variants.push(self.reconcile_variant(variant)?);
        }

        Ok(Reconciliation {
            variants,
            tolerance: self.config.tolerance,
        })
    }

    pub fn reconcile_variant(
        &self,
        variant: &VariantConfig,
    ) -> Result<VariantReconciliation, LoadError> {
        let columns = [variant.column.as_str()];
        let hq = AllocationTable::load(&variant.hq, &columns, &self.options)?;
        let satellites = AllocationTable::load(&variant.satellites, &columns, &self.options)?;

        let totals = compute_variant_total(&variant.name, &hq, &satellites, &variant.column)?;
        let reconciliation = VariantReconciliation {
            totals,
            expected: self.config.expected_for(variant),
            tolerance: self.config.tolerance,
        };

        info!(
            variant = %variant.name,
            total = reconciliation.total(),
            "computed variant total"
        );
        if reconciliation.verdict() == Verdict::Mismatch {
            warn!(
                variant = %variant.name,
                total = reconciliation.total(),
                expected = reconciliation.expected,
                tolerance = reconciliation.tolerance,
                "variant total is outside the tolerance of its expected total"
            );
        }

        Ok(reconciliation)
    }
}
