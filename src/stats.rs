//! Descriptive building blocks for the hypothesis tests.
//!
//! All functions are defined over plain `f64` slices that have already had
//! missing values removed. Summation is compensated and variances come from
//! Welford's recurrence, so group means and sums of squares stay accurate
//! even for large offsets (e.g. timestamps or sensor readings near 1e9).
//!
//! # Algorithms
//!
//! - **Sums**: Neumaier-compensated summation.
//! - **Variance / sums of squares**: Welford (1962), *Technometrics* 4(3).
//! - **Ranks**: average ranks for ties ("fractional ranking"), with the tie
//!   group sizes kept for the usual `Σ(t³ − t)` corrections.

use std::cmp::Ordering;

/// Arithmetic mean, or `None` for empty input or any non-finite value.
///
/// # Examples
/// ```
/// use u_analysis::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Sample variance (denominator `n − 1`).
///
/// # Returns
/// `None` if `data.len() < 2` or contains NaN/Inf.
///
/// # Examples
/// ```
/// use u_analysis::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 4.571428571428571).abs() < 1e-10);
/// ```
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    WelfordAccumulator::from_slice(data).sample_variance()
}

/// Sum of squared deviations from the mean, `Σ(xᵢ − x̄)²`.
///
/// Returns `None` for empty input or non-finite values. A single
/// observation yields `Some(0.0)`.
pub fn sum_squared_deviations(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    Some(WelfordAccumulator::from_slice(data).m2)
}

/// Centred cross-product sum `Σ(xᵢ − x̄)(yᵢ − ȳ)`.
///
/// Returns `None` when the lengths differ, the input is empty, or any value
/// is non-finite.
///
/// # Examples
/// ```
/// use u_analysis::stats::sum_cross_deviations;
/// let sxy = sum_cross_deviations(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
/// assert!((sxy - 4.0).abs() < 1e-12);
/// ```
pub fn sum_cross_deviations(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n == 0 || n != y.len() {
        return None;
    }
    if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        return None;
    }
    let mean_x = kahan_sum(x) / n as f64;
    let mean_y = kahan_sum(y) / n as f64;
    let products: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
        .collect();
    Some(kahan_sum(&products))
}

/// Neumaier compensated summation.
///
/// Reference: Neumaier (1974), *ZAMM* 54(1), pp. 39–51.
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

// ---------------------------------------------------------------------------
// Welford accumulator
// ---------------------------------------------------------------------------

/// Streaming mean / variance accumulator (Welford's recurrence).
///
/// # Examples
/// ```
/// use u_analysis::stats::WelfordAccumulator;
/// let mut acc = WelfordAccumulator::new();
/// for &x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     acc.update(x);
/// }
/// assert!((acc.mean().unwrap() - 5.0).abs() < 1e-15);
/// assert!((acc.sum_squared_deviations() - 32.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WelfordAccumulator {
    count: u64,
    mean_acc: f64,
    m2: f64,
}

impl WelfordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(data: &[f64]) -> Self {
        let mut acc = Self::new();
        for &x in data {
            acc.update(x);
        }
        acc
    }

    pub fn update(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.mean_acc = value;
            return;
        }
        let delta = value - self.mean_acc;
        self.mean_acc += delta / self.count as f64;
        self.m2 += delta * (value - self.mean_acc);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean_acc)
    }

    /// `Σ(xᵢ − x̄)²` over the samples seen so far.
    pub fn sum_squared_deviations(&self) -> f64 {
        self.m2
    }

    /// Sample variance, or `None` with fewer than two samples.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count >= 2).then(|| self.m2 / (self.count - 1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Ranks
// ---------------------------------------------------------------------------

/// Average ranks of a sample together with its tie structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// 1-based average rank of each input value, in input order.
    pub ranks: Vec<f64>,
    /// Sizes of every group of tied values (only groups of size ≥ 2).
    pub tie_sizes: Vec<usize>,
}

impl Ranking {
    /// `Σ(t³ − t)` over tie groups.
    pub fn tie_sum(&self) -> f64 {
        self.tie_sizes
            .iter()
            .map(|&t| {
                let t = t as f64;
                t * t * t - t
            })
            .sum()
    }

    pub fn has_ties(&self) -> bool {
        !self.tie_sizes.is_empty()
    }
}

/// Assigns 1-based average ranks; tied values share the mean of the ranks
/// they span.
///
/// NaN values must be removed by the caller; they compare as equal here.
///
/// # Examples
/// ```
/// use u_analysis::stats::average_ranks;
/// let r = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
/// assert_eq!(r.ranks, vec![1.5, 3.0, 1.5, 4.0]);
/// assert_eq!(r.tie_sizes, vec![2]);
/// ```
pub fn average_ranks(data: &[f64]) -> Ranking {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].partial_cmp(&data[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end.
        let shared = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        if end - start > 1 {
            tie_sizes.push(end - start);
        }
        start = end;
    }
    Ranking { ranks, tie_sizes }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[5.0]), Some(5.0));
        assert_eq!(mean(&[1.0, f64::NAN]), None);
        assert!((mean(&[0.1; 10]).unwrap() - 0.1).abs() < 1e-16);
    }

    #[test]
    fn test_mean_large_offset() {
        let data: Vec<f64> = (0..1000).map(|i| 1e9 + i as f64).collect();
        assert!((mean(&data).unwrap() - (1e9 + 499.5)).abs() < 1e-6);
    }

    #[test]
    fn test_variance_edges() {
        assert_eq!(variance(&[1.0]), None);
        assert_eq!(variance(&[3.0, 3.0, 3.0]), Some(0.0));
        assert!((variance(&[1.0, 2.0]).unwrap() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_variance_catastrophic_cancellation() {
        let data = [1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0];
        assert!((variance(&data).unwrap() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_sum_squared_deviations() {
        assert_eq!(sum_squared_deviations(&[]), None);
        assert_eq!(sum_squared_deviations(&[4.0]), Some(0.0));
        let ss = sum_squared_deviations(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((ss - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sum_cross_deviations() {
        assert_eq!(sum_cross_deviations(&[1.0], &[1.0, 2.0]), None);
        let sxy = sum_cross_deviations(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]).unwrap();
        assert!((sxy + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_kahan_sum_compensates() {
        let data = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(kahan_sum(&data), 2.0);
    }

    #[test]
    fn test_welford_matches_two_pass() {
        let data = [2.5, 3.7, 1.2, 8.8, 4.4, 6.1];
        let acc = WelfordAccumulator::from_slice(&data);
        let m = data.iter().sum::<f64>() / data.len() as f64;
        let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
        assert_eq!(acc.count(), 6);
        assert!((acc.mean().unwrap() - m).abs() < 1e-12);
        assert!((acc.sum_squared_deviations() - ss).abs() < 1e-10);
        assert!(WelfordAccumulator::new().mean().is_none());
    }

    #[test]
    fn test_ranks_without_ties() {
        let r = average_ranks(&[3.0, 1.0, 2.0]);
        assert_eq!(r.ranks, vec![3.0, 1.0, 2.0]);
        assert!(!r.has_ties());
        assert_eq!(r.tie_sum(), 0.0);
    }

    #[test]
    fn test_ranks_with_ties() {
        let r = average_ranks(&[1.0, 2.0, 2.0, 2.0, 5.0, 5.0]);
        assert_eq!(r.ranks, vec![1.0, 3.0, 3.0, 3.0, 5.5, 5.5]);
        assert_eq!(r.tie_sizes, vec![3, 2]);
        // (27 − 3) + (8 − 2)
        assert_eq!(r.tie_sum(), 30.0);
    }

    #[test]
    fn test_ranks_empty() {
        let r = average_ranks(&[]);
        assert!(r.ranks.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn ranks_sum_to_triangular_number(data in proptest::collection::vec(-100_i32..100, 1..60)) {
            let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
            let r = average_ranks(&values);
            let n = values.len() as f64;
            let total: f64 = r.ranks.iter().sum();
            prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
        }

        #[test]
        fn variance_is_non_negative(data in proptest::collection::vec(-1e6_f64..1e6, 2..100)) {
            prop_assert!(variance(&data).unwrap() >= 0.0);
        }

        #[test]
        fn welford_agrees_with_kahan_mean(data in proptest::collection::vec(-1e3_f64..1e3, 1..100)) {
            let acc = WelfordAccumulator::from_slice(&data);
            let m = mean(&data).unwrap();
            prop_assert!((acc.mean().unwrap() - m).abs() < 1e-9);
        }
    }
}
