//! Null distributions of the test statistics.
//!
//! Each type validates its parameters once at construction and then exposes
//! the tail probabilities the hypothesis tests need. Two-sided p-values are
//! computed from the upper tail of `|statistic|` and capped at 1.
//!
//! | Distribution | Parameters | Used by |
//! |---|---|---|
//! | [`StudentT`] | df | one-sample / two-sample t, correlation, slope |
//! | [`FisherF`] | df₁, df₂ | one-way ANOVA |
//! | [`ChiSquared`] | k | contingency tables, Kruskal-Wallis |
//! | [`StandardNormal`] | none | rank-sum, large-sample signed-rank |
//! | [`SignedRank`] | n | exact Wilcoxon signed-rank |

use crate::special;

/// Error type for invalid distribution parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// Parameters violate distribution constraints.
    InvalidParameters(String),
}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionError::InvalidParameters(msg) => {
                write!(f, "invalid distribution parameters: {msg}")
            }
        }
    }
}

impl std::error::Error for DistributionError {}

fn positive_df(name: &str, df: f64) -> Result<f64, DistributionError> {
    if df.is_finite() && df > 0.0 {
        Ok(df)
    } else {
        Err(DistributionError::InvalidParameters(format!(
            "{name} requires finite degrees of freedom > 0, got {df}"
        )))
    }
}

// ============================================================================
// Student's t
// ============================================================================

/// Student's t-distribution with `df` degrees of freedom.
///
/// Tail via the incomplete beta function:
/// `P(|T| > t) = I_{df/(df+t²)}(df/2, 1/2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentT {
    df: f64,
}

impl StudentT {
    /// # Errors
    /// Returns `Err` unless `df` is finite and positive.
    pub fn new(df: f64) -> Result<Self, DistributionError> {
        Ok(Self {
            df: positive_df("StudentT", df)?,
        })
    }

    pub fn df(&self) -> f64 {
        self.df
    }

    /// CDF `P(T ≤ t)`.
    pub fn cdf(&self, t: f64) -> f64 {
        if t.is_nan() {
            return f64::NAN;
        }
        let half_tail = 0.5 * self.two_sided_p(t);
        if t >= 0.0 {
            1.0 - half_tail
        } else {
            half_tail
        }
    }

    /// Two-sided p-value `P(|T| ≥ |t|)`.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::distributions::StudentT;
    /// let t = StudentT::new(10.0).unwrap();
    /// assert!((t.two_sided_p(0.0) - 1.0).abs() < 1e-12);
    /// // t₀.₉₇₅(10) ≈ 2.228
    /// assert!((t.two_sided_p(2.228) - 0.05).abs() < 1e-3);
    /// ```
    pub fn two_sided_p(&self, t: f64) -> f64 {
        if t.is_nan() {
            return f64::NAN;
        }
        if t.is_infinite() {
            return 0.0;
        }
        let x = self.df / (self.df + t * t);
        special::regularized_incomplete_beta(x, self.df / 2.0, 0.5).min(1.0)
    }
}

// ============================================================================
// Fisher's F
// ============================================================================

/// F-distribution with `(df1, df2)` degrees of freedom.
///
/// Upper tail: `P(F > x) = I_{df2/(df2+df1·x)}(df2/2, df1/2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FisherF {
    df1: f64,
    df2: f64,
}

impl FisherF {
    pub fn new(df1: f64, df2: f64) -> Result<Self, DistributionError> {
        Ok(Self {
            df1: positive_df("FisherF numerator", df1)?,
            df2: positive_df("FisherF denominator", df2)?,
        })
    }

    pub fn df1(&self) -> f64 {
        self.df1
    }

    pub fn df2(&self) -> f64 {
        self.df2
    }

    pub fn cdf(&self, x: f64) -> f64 {
        1.0 - self.sf(x)
    }

    /// Survival function `P(F > x)`.
    pub fn sf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= 0.0 {
            return 1.0;
        }
        if x.is_infinite() {
            return 0.0;
        }
        let y = self.df2 / (self.df2 + self.df1 * x);
        special::regularized_incomplete_beta(y, self.df2 / 2.0, self.df1 / 2.0)
    }
}

// ============================================================================
// Chi-squared
// ============================================================================

/// χ² distribution with `k` degrees of freedom.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquared {
    k: f64,
}

impl ChiSquared {
    pub fn new(k: f64) -> Result<Self, DistributionError> {
        Ok(Self {
            k: positive_df("ChiSquared", k)?,
        })
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// CDF `P(X ≤ x) = P(k/2, x/2)`.
    pub fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        special::regularized_lower_gamma(self.k / 2.0, x / 2.0)
    }

    /// Survival function `P(X > x) = Q(k/2, x/2)`.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::distributions::ChiSquared;
    /// let chi = ChiSquared::new(1.0).unwrap();
    /// assert!((chi.sf(3.841) - 0.05).abs() < 1e-3);
    /// ```
    pub fn sf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x.is_infinite() {
            return 0.0;
        }
        special::regularized_upper_gamma(self.k / 2.0, x / 2.0)
    }
}

// ============================================================================
// Standard normal
// ============================================================================

/// Standard normal distribution N(0, 1).
///
/// Tails use `P(|Z| > z) = Q(1/2, z²/2)`, i.e. `erfc(|z|/√2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardNormal;

impl StandardNormal {
    pub fn cdf(&self, z: f64) -> f64 {
        if z.is_nan() {
            return f64::NAN;
        }
        let half_tail = 0.5 * self.two_sided_p(z);
        if z >= 0.0 {
            1.0 - half_tail
        } else {
            half_tail
        }
    }

    /// Two-sided p-value `P(|Z| ≥ |z|)`.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::distributions::StandardNormal;
    /// assert!((StandardNormal.two_sided_p(1.959964) - 0.05).abs() < 1e-6);
    /// ```
    pub fn two_sided_p(&self, z: f64) -> f64 {
        if z.is_nan() {
            return f64::NAN;
        }
        if z.is_infinite() {
            return 0.0;
        }
        special::regularized_upper_gamma(0.5, 0.5 * z * z).min(1.0)
    }
}

// ============================================================================
// Exact Wilcoxon signed-rank
// ============================================================================

/// Exact null distribution of the Wilcoxon signed-rank statistic `W⁺`
/// for `n` untied, non-zero differences.
///
/// Under H₀ each rank `1..=n` enters `W⁺` independently with probability
/// 1/2, so the count of subsets summing to `w` follows from the subset-sum
/// recurrence. Counts are held as `f64`; for `n ≤ 1000` they are exact up
/// to 2⁵³ and scaled by 2⁻ⁿ afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRank {
    n: usize,
    /// `pmf[w] = P(W⁺ = w)` for `w ∈ 0..=n(n+1)/2`.
    pmf: Vec<f64>,
}

impl SignedRank {
    /// Largest `n` accepted; beyond this callers use the normal approximation.
    pub const MAX_N: usize = 1000;

    pub fn new(n: usize) -> Result<Self, DistributionError> {
        if n == 0 || n > Self::MAX_N {
            return Err(DistributionError::InvalidParameters(format!(
                "SignedRank requires 1 ≤ n ≤ {}, got {n}",
                Self::MAX_N
            )));
        }
        let max_sum = n * (n + 1) / 2;
        let mut counts = vec![0.0_f64; max_sum + 1];
        counts[0] = 1.0;
        let mut reach = 0;
        for rank in 1..=n {
            reach += rank;
            for w in (rank..=reach).rev() {
                counts[w] += counts[w - rank];
            }
        }
        let scale = 0.5_f64.powi(n as i32);
        let pmf = counts.into_iter().map(|c| c * scale).collect();
        Ok(Self { n, pmf })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Lower tail `P(W⁺ ≤ w)`.
    pub fn cdf(&self, w: f64) -> f64 {
        if w < 0.0 {
            return 0.0;
        }
        let upto = (w.floor() as usize).min(self.pmf.len() - 1);
        self.pmf[..=upto].iter().sum::<f64>().min(1.0)
    }

    /// Two-sided p-value for an observed statistic `min(W⁺, W⁻)`.
    ///
    /// The distribution is symmetric, so the p-value is `2·P(W⁺ ≤ w)`.
    ///
    /// # Examples
    /// ```
    /// use u_analysis::distributions::SignedRank;
    /// // n = 5, all differences positive: W⁻ = 0, p = 2/32.
    /// let d = SignedRank::new(5).unwrap();
    /// assert!((d.two_sided_p(0.0) - 0.0625).abs() < 1e-12);
    /// ```
    pub fn two_sided_p(&self, w: f64) -> f64 {
        (2.0 * self.cdf(w)).min(1.0)
    }
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn t_p_value_in_unit_interval(t in -50.0_f64..50.0, df in 1.0_f64..200.0) {
            let p = StudentT::new(df).unwrap().two_sided_p(t);
            prop_assert!((0.0..=1.0).contains(&p), "p={p}");
        }

        #[test]
        fn t_p_value_decreases_with_magnitude(a in 0.0_f64..10.0, b in 0.0_f64..10.0, df in 1.0_f64..60.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let dist = StudentT::new(df).unwrap();
            prop_assert!(dist.two_sided_p(lo) + 1e-12 >= dist.two_sided_p(hi));
        }

        #[test]
        fn chi_squared_tails_complement(x in 0.01_f64..100.0, k in 1.0_f64..30.0) {
            let c = ChiSquared::new(k).unwrap();
            prop_assert!((c.cdf(x) + c.sf(x) - 1.0).abs() < 1e-9);
        }

        #[test]
        fn f_sf_in_unit_interval(x in 0.0_f64..100.0, d1 in 1.0_f64..20.0, d2 in 1.0_f64..100.0) {
            let s = FisherF::new(d1, d2).unwrap().sf(x);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn signed_rank_cdf_monotonic(n in 1_usize..40) {
            let d = SignedRank::new(n).unwrap();
            let max = (n * (n + 1) / 2) as f64;
            let mut prev = 0.0;
            let mut w = 0.0;
            while w <= max {
                let c = d.cdf(w);
                prop_assert!(c + 1e-15 >= prev);
                prev = c;
                w += 1.0;
            }
            prop_assert!((prev - 1.0).abs() < 1e-12);
        }
    }
}
