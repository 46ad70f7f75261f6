//! Differentially private histogram query.
//!
//! The exact histogram is computed with [`crate::queries::binning`], then
//! each bin count is perturbed independently with a
//! [`BoundedGeometricMechanism`]. One record can change at most one bin's
//! exact count by at most 1, so the per-bin mechanisms cover disjoint data
//! partitions and the whole histogram satisfies ε-differential privacy at
//! the per-call ε (parallel composition) — the budget is charged once, not
//! once per bin.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::budget::accountant::{BudgetAccountant, BudgetError};
use crate::mechanisms::geometric::{BoundedGeometricMechanism, Bounds};
use crate::mechanisms::traits::{Mechanism, MechanismError};
use crate::queries::binning::{
    bin_edges, exact_histogram, resolve_range, BinSpec, BinningError,
};
use crate::rng::Prng;

/// Non-fatal advisory raised during a histogram call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Advisory {
    /// The range was taken from the data itself; data-derived bin
    /// boundaries are not covered by the privacy guarantee.
    PrivacyLeak,
}

/// Error returned by [`histogram`].
#[derive(Error, Debug)]
pub enum HistogramError {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Binning(#[from] BinningError),

    #[error(transparent)]
    Mechanism(#[from] MechanismError),
}

/// One differentially private histogram query. Transient: build one per
/// call.
#[derive(Debug, Clone)]
pub struct HistogramRequest<'a> {
    /// Input data; the histogram is computed over this sample.
    pub sample: &'a [f64],

    /// Privacy parameter ε to spend on this call.
    pub epsilon: f64,

    /// Bin count or explicit edge sequence.
    pub bins: BinSpec,

    /// Lower and upper range of the bins. Must be supplied independently
    /// of the data to avoid the privacy-leak advisory.
    pub range: Option<(f64, f64)>,

    /// Per-sample weights, same length as the sample.
    pub weights: Option<&'a [f64]>,

    /// Return a probability density instead of counts.
    pub density: bool,

    /// Seed for deterministic randomisation.
    pub seed: Option<u64>,

    /// Accountant charged for this call; resolved via
    /// [`BudgetAccountant::resolve`] when absent.
    pub accountant: Option<Arc<BudgetAccountant>>,
}

impl<'a> HistogramRequest<'a> {
    pub fn new(sample: &'a [f64]) -> Self {
        Self {
            sample,
            epsilon: 1.0,
            bins: BinSpec::default(),
            range: None,
            weights: None,
            density: false,
            seed: None,
            accountant: None,
        }
    }
}

/// Noisy histogram values: raw integer counts, or a density normalized so
/// the integral over the range is 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HistogramValues {
    Counts(Vec<i64>),
    Density(Vec<f64>),
}

/// Result of a differentially private histogram call.
#[derive(Debug, Clone, Serialize)]
pub struct NoisyHistogram {
    pub values: HistogramValues,
    /// Bin edges, one longer than the values.
    pub bin_edges: Vec<f64>,
    /// Advisories raised during the call; never fatal.
    pub advisories: Vec<Advisory>,
}

/// Computes the differentially private histogram of a sample.
///
/// The budget is checked before any computation and spent only after every
/// bin has been randomised; no failure path commits a partial spend.
pub fn histogram(
    request: HistogramRequest<'_>,
) -> Result<NoisyHistogram, HistogramError> {
    let prng = Prng::resolve(request.seed);
    let accountant = BudgetAccountant::resolve(request.accountant.clone());
    accountant.check(request.epsilon, 0.0)?;

    let mut advisories = Vec::new();
    if request.range.is_none() {
        warn!(
            "Range parameter has not been specified. Falling back to taking \
             range from the data. To ensure differential privacy, and no \
             additional privacy leakage, the range must be specified \
             independently of the data (i.e., using domain knowledge)."
        );
        advisories.push(Advisory::PrivacyLeak);
    }

    let range = resolve_range(request.sample, request.range)?;
    let edges = bin_edges(&request.bins, range)?;
    let exact = exact_histogram(request.sample, &edges, request.weights)?;
    debug!(
        "Exact histogram over {} bins, {} samples",
        exact.counts.len(),
        request.sample.len()
    );

    // Adding or removing one record moves exactly one bin count by at most
    // 1, so sensitivity 1 suffices for the whole histogram.
    let bounds = Bounds::new(0, i64::MAX)?;
    let mut mechanism =
        BoundedGeometricMechanism::new(request.epsilon, 1, bounds, prng)?;

    // Ascending bin order: a fixed seed reproduces the histogram exactly.
    let noisy_counts: Vec<i64> = exact
        .counts
        .iter()
        .map(|&count| mechanism.randomise(count as i64))
        .collect();

    // All bins randomised; only now is the spend committed.
    accountant.spend(request.epsilon, 0.0)?;

    let values = if request.density {
        let total: i64 = noisy_counts.iter().sum();
        let total = if total == 0 { 1.0 } else { total as f64 };
        let density = noisy_counts
            .iter()
            .zip(edges.windows(2))
            .map(|(&count, edge)| count as f64 / (edge[1] - edge[0]) / total)
            .collect();
        HistogramValues::Density(density)
    } else {
        HistogramValues::Counts(noisy_counts)
    };

    Ok(NoisyHistogram {
        values,
        bin_edges: edges,
        advisories,
    })
}
