//! Exact (non-private) histogram binning.
//!
//! All bins are half-open except the last, which is closed on both ends:
//! with edges `[1, 2, 3, 4]` the first bin is `[1, 2)` and the last is
//! `[3, 4]`. Samples outside `[first_edge, last_edge]` are dropped.

use thiserror::Error;

/// Bin specification: an equal-width bin count over the range, or an
/// explicit monotonically increasing edge sequence.
#[derive(Debug, Clone)]
pub enum BinSpec {
    Count(usize),
    Edges(Vec<f64>),
}

impl Default for BinSpec {
    fn default() -> Self {
        BinSpec::Count(10)
    }
}

/// Error returned when validating binning inputs.
#[derive(Error, Debug)]
pub enum BinningError {
    #[error("range lower {0} exceeds range upper {1}")]
    InvalidRange(f64, f64),

    #[error("bin edges must be finite and strictly increasing")]
    NonMonotonicEdges,

    #[error("sample and range values must be finite numbers")]
    NonFiniteSample,

    #[error("weights length {0} does not match sample length {1}")]
    WeightsMismatch(usize, usize),

    #[error("histogram needs at least one bin")]
    ZeroBins,
}

/// Exact histogram: strictly increasing edges plus per-bin weighted counts.
#[derive(Debug, Clone)]
pub struct RawHistogram {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<f64>,
}

/// Resolves the binning range from an explicit request or the data.
///
/// An empty sample without an explicit range falls back to `(0, 1)`; a
/// degenerate equal-endpoint range is widened by 0.5 on each side.
pub fn resolve_range(
    sample: &[f64],
    range: Option<(f64, f64)>,
) -> Result<(f64, f64), BinningError> {
    let (lower, upper) = match range {
        Some((lower, upper)) => {
            if !lower.is_finite() || !upper.is_finite() {
                return Err(BinningError::NonFiniteSample);
            }
            if lower > upper {
                return Err(BinningError::InvalidRange(lower, upper));
            }
            (lower, upper)
        }
        None if sample.is_empty() => (0.0, 1.0),
        None => {
            let lower = sample.iter().cloned().fold(f64::INFINITY, f64::min);
            let upper =
                sample.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if !lower.is_finite() || !upper.is_finite() {
                return Err(BinningError::NonFiniteSample);
            }
            (lower, upper)
        }
    };
    if lower == upper {
        Ok((lower - 0.5, upper + 0.5))
    } else {
        Ok((lower, upper))
    }
}

/// Builds the edge sequence for a bin specification over a resolved range.
pub fn bin_edges(
    spec: &BinSpec,
    range: (f64, f64),
) -> Result<Vec<f64>, BinningError> {
    match spec {
        BinSpec::Count(0) => Err(BinningError::ZeroBins),
        BinSpec::Count(k) => {
            let (lower, upper) = range;
            let width = (upper - lower) / *k as f64;
            let mut edges: Vec<f64> =
                (0..*k).map(|i| lower + i as f64 * width).collect();
            // Exact last edge, unpolluted by accumulated rounding.
            edges.push(upper);
            Ok(edges)
        }
        BinSpec::Edges(edges) => {
            if edges.len() < 2 {
                return Err(BinningError::ZeroBins);
            }
            let monotonic = edges
                .windows(2)
                .all(|w| w[0].is_finite() && w[1].is_finite() && w[0] < w[1]);
            if !monotonic {
                return Err(BinningError::NonMonotonicEdges);
            }
            Ok(edges.clone())
        }
    }
}

/// Computes the exact histogram of `sample` over `edges`.
///
/// Each sample contributes its weight (1 if no weights are given) to the
/// bin containing it; out-of-range samples contribute nothing.
pub fn exact_histogram(
    sample: &[f64],
    edges: &[f64],
    weights: Option<&[f64]>,
) -> Result<RawHistogram, BinningError> {
    if let Some(weights) = weights {
        if weights.len() != sample.len() {
            return Err(BinningError::WeightsMismatch(
                weights.len(),
                sample.len(),
            ));
        }
    }

    let k = edges.len() - 1;
    let mut counts = vec![0.0; k];
    for (i, &value) in sample.iter().enumerate() {
        if !value.is_finite() {
            return Err(BinningError::NonFiniteSample);
        }
        let Some(bin) = find_bin(edges, value) else {
            continue;
        };
        counts[bin] += weights.map_or(1.0, |w| w[i]);
    }

    Ok(RawHistogram {
        bin_edges: edges.to_vec(),
        counts,
    })
}

/// Bin index for `value`, or None when it falls outside the edges.
fn find_bin(edges: &[f64], value: f64) -> Option<usize> {
    let k = edges.len() - 1;
    if value < edges[0] || value > edges[k] {
        return None;
    }
    if value == edges[k] {
        // Last bin is closed on the right.
        return Some(k - 1);
    }
    Some(edges.partition_point(|&e| e <= value) - 1)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn two_bin_example_counts_exactly() -> Result<(), anyhow::Error> {
        let sample = [1.0, 5.0, 5.0, 9.0];
        let edges = bin_edges(&BinSpec::Count(2), (0.0, 10.0))?;
        assert_eq!(edges, vec![0.0, 5.0, 10.0]);

        let hist = exact_histogram(&sample, &edges, None)?;
        // 1 lands in [0, 5); 5, 5 and 9 land in [5, 10].
        assert_eq!(hist.counts, vec![1.0, 3.0]);
        Ok(())
    }

    #[test]
    fn last_bin_is_closed() -> Result<(), anyhow::Error> {
        let edges = vec![1.0, 2.0, 3.0, 4.0];
        let hist = exact_histogram(&[2.0, 4.0, 4.0], &edges, None)?;
        assert_eq!(hist.counts, vec![0.0, 1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn out_of_range_samples_are_dropped() -> Result<(), anyhow::Error> {
        let edges = vec![0.0, 1.0, 2.0];
        let hist = exact_histogram(&[-0.1, 0.5, 2.1], &edges, None)?;
        assert_eq!(hist.counts, vec![1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn weights_replace_unit_counts() -> Result<(), anyhow::Error> {
        let edges = vec![0.0, 1.0, 2.0];
        let hist = exact_histogram(
            &[0.5, 0.6, 1.5],
            &edges,
            Some(&[2.0, 0.25, 1.5]),
        )?;
        assert_relative_eq!(hist.counts[0], 2.25);
        assert_relative_eq!(hist.counts[1], 1.5);
        Ok(())
    }

    #[test]
    fn mismatched_weights_fail() {
        let edges = vec![0.0, 1.0];
        let result = exact_histogram(&[0.5], &edges, Some(&[1.0, 2.0]));
        assert!(matches!(result, Err(BinningError::WeightsMismatch(2, 1))));
    }

    #[test]
    fn non_finite_sample_fails() {
        let edges = vec![0.0, 1.0];
        let result = exact_histogram(&[f64::NAN], &edges, None);
        assert!(matches!(result, Err(BinningError::NonFiniteSample)));
    }

    #[test]
    fn explicit_edges_must_increase() {
        let spec = BinSpec::Edges(vec![0.0, 2.0, 1.0]);
        assert!(matches!(
            bin_edges(&spec, (0.0, 0.0)),
            Err(BinningError::NonMonotonicEdges)
        ));
    }

    #[test]
    fn range_resolution_fallbacks() -> Result<(), anyhow::Error> {
        assert_eq!(resolve_range(&[], None)?, (0.0, 1.0));
        assert_eq!(resolve_range(&[3.0, 3.0], None)?, (2.5, 3.5));
        assert_eq!(resolve_range(&[1.0, 9.0], None)?, (1.0, 9.0));
        assert_eq!(resolve_range(&[1.0], Some((0.0, 10.0)))?, (0.0, 10.0));
        assert!(matches!(
            resolve_range(&[], Some((5.0, 1.0))),
            Err(BinningError::InvalidRange(..))
        ));
        Ok(())
    }
}
