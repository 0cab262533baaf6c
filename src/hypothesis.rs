//! Statistical procedures over plain, missing-free `f64` samples.
//!
//! # Implemented procedures
//!
//! - **One-sample t-test** ([`ttest_one_sample`]):
//!   `t = (x̄ − μ₀) / (s / √n)`, df = n − 1.
//! - **Pooled two-sample t-test** ([`ttest_pooled`]): equal-variance Student
//!   test, `t = (x̄₁ − x̄₂) / √(s²ₚ (1/n₁ + 1/n₂))`, df = n₁ + n₂ − 2.
//! - **One-way ANOVA** ([`f_oneway`]): `F = MSB / MSW`, df = (k − 1, N − k).
//! - **Kruskal-Wallis** ([`kruskal`]): tie-corrected `H`, χ²(k − 1) tail.
//! - **Wilcoxon signed-rank** ([`wilcoxon_signed_rank`]): paired, zero
//!   differences dropped, statistic `min(W⁺, W⁻)`; exact null distribution
//!   for small untied samples, normal approximation otherwise.
//! - **Wilcoxon rank-sum** ([`rank_sum`]): two independent samples,
//!   tie-corrected normal `z`.
//! - **Pearson correlation** ([`pearson`]): `r`, with `t = r√((n−2)/(1−r²))`.
//! - **Simple linear regression** ([`linear_regression`]): OLS slope,
//!   intercept, R² and the slope's two-sided p-value.
//! - **χ² test of independence** ([`chi_square_independence`]): Pearson
//!   statistic without continuity correction.
//!
//! All p-values are two-sided (or upper-tail for F, H and χ²). Failures are
//! reported as [`AnalysisError::DegenerateInput`] (zero variance, all ties,
//! no usable differences) or [`AnalysisError::InsufficientData`]; no
//! procedure returns NaN or a partially filled result.

use crate::distributions::{ChiSquared, FisherF, SignedRank, StandardNormal, StudentT};
use crate::error::{AnalysisError, Result};
use crate::stats::{
    average_ranks, kahan_sum, mean, sum_cross_deviations, sum_squared_deviations,
    WelfordAccumulator,
};
use tracing::debug;

/// Statistic and p-value of a hypothesis test, unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// Largest number of non-zero differences for which the exact signed-rank
/// distribution is used.
pub const EXACT_SIGNED_RANK_LIMIT: usize = 50;

fn require_finite(context: &str, data: &[f64]) -> Result<()> {
    if data.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AnalysisError::ComputationFailure(format!(
            "{context}: non-finite value in sample"
        )))
    }
}

// ============================================================================
// t-tests
// ============================================================================

/// One-sample t-test of `H₀: μ = popmean`.
///
/// # Errors
/// `DegenerateInput` with fewer than two observations or zero variance.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::ttest_one_sample;
/// let out = ttest_one_sample(&[1.2, 1.5, 1.3, 1.4, 1.6], 1.0).unwrap();
/// assert!(out.statistic > 0.0 && out.p_value < 0.05);
/// ```
pub fn ttest_one_sample(data: &[f64], popmean: f64) -> Result<TestOutcome> {
    require_finite("one-sample t-test", data)?;
    let n = data.len();
    if n < 2 {
        return Err(AnalysisError::DegenerateInput(format!(
            "one-sample t-test needs at least 2 observations, got {n}"
        )));
    }
    let acc = WelfordAccumulator::from_slice(data);
    let (m, var) = match (acc.mean(), acc.sample_variance()) {
        (Some(m), Some(v)) => (m, v),
        _ => {
            return Err(AnalysisError::ComputationFailure(
                "one-sample t-test: moments unavailable".into(),
            ))
        }
    };
    if var <= 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "one-sample t-test: sample has zero variance".into(),
        ));
    }

    let nf = n as f64;
    let t = (m - popmean) / (var / nf).sqrt();
    let p_value = StudentT::new(nf - 1.0)?.two_sided_p(t);
    Ok(TestOutcome {
        statistic: t,
        p_value,
    })
}

/// Independent two-sample t-test assuming equal variances.
///
/// # Errors
/// `DegenerateInput` when either sample is empty, when `n₁ + n₂ ≤ 2`, or
/// when the pooled variance is zero.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::ttest_pooled;
/// let out = ttest_pooled(&[1.0, 2.0], &[10.0, 11.0]).unwrap();
/// assert!((out.statistic + 12.7279).abs() < 1e-3);
/// assert!(out.p_value < 0.01);
/// ```
pub fn ttest_pooled(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    require_finite("two-sample t-test", a)?;
    require_finite("two-sample t-test", b)?;
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return Err(AnalysisError::DegenerateInput(
            "two-sample t-test: a group has no observations".into(),
        ));
    }
    if n1 + n2 <= 2 {
        return Err(AnalysisError::DegenerateInput(format!(
            "two-sample t-test needs more than 2 observations in total, got {}",
            n1 + n2
        )));
    }

    let acc_a = WelfordAccumulator::from_slice(a);
    let acc_b = WelfordAccumulator::from_slice(b);
    let df = (n1 + n2 - 2) as f64;
    let pooled = (acc_a.sum_squared_deviations() + acc_b.sum_squared_deviations()) / df;
    if pooled <= 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "two-sample t-test: pooled variance is zero".into(),
        ));
    }

    let (m1, m2) = match (acc_a.mean(), acc_b.mean()) {
        (Some(m1), Some(m2)) => (m1, m2),
        _ => {
            return Err(AnalysisError::ComputationFailure(
                "two-sample t-test: group means unavailable".into(),
            ))
        }
    };
    let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    let t = (m1 - m2) / se;
    let p_value = StudentT::new(df)?.two_sided_p(t);
    Ok(TestOutcome {
        statistic: t,
        p_value,
    })
}

// ============================================================================
// k-sample tests
// ============================================================================

/// One-way between-groups ANOVA.
///
/// # Errors
/// - `InsufficientData` with fewer than two non-empty groups.
/// - `DegenerateInput` when every group has a single observation
///   (`N = k`) or the within-group variance is zero.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::f_oneway;
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [2.0, 3.0, 4.0, 5.0, 6.0];
/// let c = [10.0, 11.0, 12.0, 13.0, 14.0];
/// let out = f_oneway(&[&a[..], &b[..], &c[..]]).unwrap();
/// assert!(out.statistic > 1.0 && out.p_value < 0.01);
/// ```
pub fn f_oneway(groups: &[&[f64]]) -> Result<TestOutcome> {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "ANOVA needs at least 2 non-empty groups, got {k}"
        )));
    }
    for g in &groups {
        require_finite("ANOVA", g)?;
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n_total = all.len();
    if n_total <= k {
        return Err(AnalysisError::DegenerateInput(
            "ANOVA: every group has a single observation".into(),
        ));
    }
    let grand = kahan_sum(&all) / n_total as f64;

    let mut between_terms = Vec::with_capacity(k);
    let mut within_terms = Vec::with_capacity(k);
    for g in &groups {
        let acc = WelfordAccumulator::from_slice(g);
        let m = acc.mean().unwrap_or(grand);
        between_terms.push(g.len() as f64 * (m - grand).powi(2));
        within_terms.push(acc.sum_squared_deviations());
    }
    let ss_between = kahan_sum(&between_terms);
    let ss_within = kahan_sum(&within_terms);

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;
    let ms_within = ss_within / df_within;
    if ms_within <= 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "ANOVA: within-group variance is zero".into(),
        ));
    }
    let f = (ss_between / df_between) / ms_within;
    let p_value = FisherF::new(df_between, df_within)?.sf(f);
    Ok(TestOutcome {
        statistic: f,
        p_value,
    })
}

/// Kruskal-Wallis H-test with tie correction.
///
/// # Errors
/// - `InsufficientData` with fewer than two non-empty groups.
/// - `DegenerateInput` when all observations are tied.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::kruskal;
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [10.0, 11.0, 12.0, 13.0, 14.0];
/// let out = kruskal(&[&a[..], &b[..]]).unwrap();
/// assert!(out.statistic > 0.0 && out.p_value < 0.05);
/// ```
pub fn kruskal(groups: &[&[f64]]) -> Result<TestOutcome> {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "Kruskal-Wallis needs at least 2 non-empty groups, got {k}"
        )));
    }
    for g in &groups {
        require_finite("Kruskal-Wallis", g)?;
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let ranking = average_ranks(&all);
    let n = all.len() as f64;

    let correction = 1.0 - ranking.tie_sum() / (n * n * n - n);
    if correction <= 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "Kruskal-Wallis: all observations are tied".into(),
        ));
    }

    let mut offset = 0;
    let mut weighted = 0.0;
    for g in &groups {
        let rank_sum = kahan_sum(&ranking.ranks[offset..offset + g.len()]);
        weighted += rank_sum * rank_sum / g.len() as f64;
        offset += g.len();
    }
    let h = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / correction;
    let p_value = ChiSquared::new((k - 1) as f64)?.sf(h);
    Ok(TestOutcome {
        statistic: h,
        p_value,
    })
}

// ============================================================================
// Rank tests for two samples
// ============================================================================

/// Wilcoxon signed-rank test on paired samples `x` and `y`.
///
/// Zero differences are discarded before ranking. With at most
/// [`EXACT_SIGNED_RANK_LIMIT`] differences, no ties and no zeros the exact
/// null distribution is used; otherwise the tie-corrected normal
/// approximation.
///
/// # Errors
/// - `ComputationFailure` if the samples differ in length.
/// - `DegenerateInput` if every difference is zero.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::wilcoxon_signed_rank;
/// let before = [10.0, 12.0, 11.0, 14.0, 13.0, 15.0];
/// let after = [11.0, 14.0, 14.0, 18.0, 18.0, 21.0];
/// let out = wilcoxon_signed_rank(&before, &after).unwrap();
/// assert_eq!(out.statistic, 0.0);
/// assert!((out.p_value - 0.03125).abs() < 1e-12);
/// ```
pub fn wilcoxon_signed_rank(x: &[f64], y: &[f64]) -> Result<TestOutcome> {
    if x.len() != y.len() {
        return Err(AnalysisError::ComputationFailure(format!(
            "signed-rank test requires equal-length samples, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    require_finite("signed-rank test", x)?;
    require_finite("signed-rank test", y)?;

    let diffs: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    let nonzero: Vec<f64> = diffs.iter().copied().filter(|d| *d != 0.0).collect();
    let zeros = diffs.len() - nonzero.len();
    let n = nonzero.len();
    if n == 0 {
        return Err(AnalysisError::DegenerateInput(
            "signed-rank test: all paired differences are zero".into(),
        ));
    }

    let magnitudes: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let ranking = average_ranks(&magnitudes);
    let w_plus: f64 = nonzero
        .iter()
        .zip(&ranking.ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| *r)
        .sum();
    let nf = n as f64;
    let w_minus = nf * (nf + 1.0) / 2.0 - w_plus;
    let statistic = w_plus.min(w_minus);

    let exact = n <= EXACT_SIGNED_RANK_LIMIT && zeros == 0 && !ranking.has_ties();
    let p_value = if exact {
        debug!(n, "signed-rank test: exact null distribution");
        SignedRank::new(n)?.two_sided_p(statistic)
    } else {
        debug!(n, zeros, "signed-rank test: normal approximation");
        let expected = nf * (nf + 1.0) / 4.0;
        let var = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - ranking.tie_sum() / 48.0;
        if var <= 0.0 {
            return Err(AnalysisError::DegenerateInput(
                "signed-rank test: null variance is zero".into(),
            ));
        }
        StandardNormal.two_sided_p((statistic - expected) / var.sqrt())
    };
    Ok(TestOutcome { statistic, p_value })
}

/// Wilcoxon rank-sum test for two independent samples.
///
/// The statistic is the standardized rank sum of `a`,
/// `z = (R₁ − n₁(N+1)/2) / σ`, referred to N(0, 1), with the tie-corrected
/// variance `σ² = n₁n₂/12 · ((N+1) − Σ(t³−t)/(N(N−1)))`.
///
/// # Errors
/// - `InsufficientData` if either sample is empty.
/// - `DegenerateInput` if every observation is tied.
pub fn rank_sum(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    if a.is_empty() || b.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "rank-sum test needs observations in both groups".into(),
        ));
    }
    require_finite("rank-sum test", a)?;
    require_finite("rank-sum test", b)?;

    let combined: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranking = average_ranks(&combined);
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let n = n1 + n2;

    let variance = n1 * n2 / 12.0 * ((n + 1.0) - ranking.tie_sum() / (n * (n - 1.0)));
    if variance <= 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "rank-sum test: all observations are tied".into(),
        ));
    }

    let r1 = kahan_sum(&ranking.ranks[..a.len()]);
    let expected = n1 * (n + 1.0) / 2.0;
    let z = (r1 - expected) / variance.sqrt();
    Ok(TestOutcome {
        statistic: z,
        p_value: StandardNormal.two_sided_p(z),
    })
}

// ============================================================================
// Association
// ============================================================================

/// Pearson correlation coefficient with its two-sided p-value.
///
/// # Errors
/// - `ComputationFailure` on length mismatch.
/// - `InsufficientData` with fewer than 3 pairs.
/// - `DegenerateInput` if either variable is constant.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::pearson;
/// let out = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
/// assert!((out.statistic - 1.0).abs() < 1e-12);
/// assert_eq!(out.p_value, 0.0);
/// ```
pub fn pearson(x: &[f64], y: &[f64]) -> Result<TestOutcome> {
    if x.len() != y.len() {
        return Err(AnalysisError::ComputationFailure(format!(
            "correlation requires equal-length samples, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData(format!(
            "correlation needs at least 3 paired observations, got {n}"
        )));
    }
    let (sxx, syy, sxy) = centred_sums(x, y, "correlation")?;

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let one_minus_r2 = 1.0 - r * r;
    let p_value = if one_minus_r2 <= 0.0 {
        0.0
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / one_minus_r2).sqrt();
        StudentT::new(df)?.two_sided_p(t)
    };
    Ok(TestOutcome {
        statistic: r,
        p_value,
    })
}

/// Ordinary least-squares fit of `y = intercept + slope·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Two-sided p-value of `H₀: slope = 0`.
    pub p_value: f64,
}

/// Simple linear regression of `y` on `x`.
///
/// With exactly two points the line interpolates them and the slope
/// p-value is reported as 0.
///
/// # Errors
/// - `ComputationFailure` on length mismatch.
/// - `InsufficientData` with fewer than 2 pairs.
/// - `DegenerateInput` if `x` or `y` is constant.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::linear_regression;
/// let fit = linear_regression(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
/// assert!((fit.slope - 2.0).abs() < 1e-12);
/// assert!(fit.intercept.abs() < 1e-12);
/// assert!((fit.r_squared - 1.0).abs() < 1e-12);
/// ```
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearRegression> {
    if x.len() != y.len() {
        return Err(AnalysisError::ComputationFailure(format!(
            "regression requires equal-length samples, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "regression needs at least 2 paired observations, got {n}"
        )));
    }
    let (sxx, syy, sxy) = centred_sums(x, y, "regression")?;

    let (mean_x, mean_y) = match (mean(x), mean(y)) {
        (Some(mx), Some(my)) => (mx, my),
        _ => {
            return Err(AnalysisError::ComputationFailure(
                "regression: means unavailable".into(),
            ))
        }
    };
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = (sxy * sxy / (sxx * syy)).min(1.0);

    let ss_residual = (syy - slope * sxy).max(0.0);
    let p_value = if n == 2 || ss_residual <= 0.0 {
        0.0
    } else {
        let df = (n - 2) as f64;
        let se = (ss_residual / df / sxx).sqrt();
        StudentT::new(df)?.two_sided_p(slope / se)
    };
    Ok(LinearRegression {
        slope,
        intercept,
        r_squared,
        p_value,
    })
}

fn centred_sums(x: &[f64], y: &[f64], context: &str) -> Result<(f64, f64, f64)> {
    require_finite(context, x)?;
    require_finite(context, y)?;
    let failure = || AnalysisError::ComputationFailure(format!("{context}: empty sample"));
    let sxx = sum_squared_deviations(x).ok_or_else(failure)?;
    let syy = sum_squared_deviations(y).ok_or_else(failure)?;
    let sxy = sum_cross_deviations(x, y).ok_or_else(failure)?;
    if sxx <= 0.0 {
        return Err(AnalysisError::DegenerateInput(format!(
            "{context}: independent variable has zero variance"
        )));
    }
    if syy <= 0.0 {
        return Err(AnalysisError::DegenerateInput(format!(
            "{context}: dependent variable has zero variance"
        )));
    }
    Ok((sxx, syy, sxy))
}

// ============================================================================
// Contingency tables
// ============================================================================

/// Cross-tabulation of two label columns.
///
/// Row and column labels appear in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `counts[i][j]` = rows with `row_labels[i]` and `col_labels[j]`.
    pub counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Builds the table from paired label sequences.
    ///
    /// # Errors
    /// `ComputationFailure` if the sequences differ in length.
    pub fn from_pairs<S: AsRef<str>>(rows: &[S], cols: &[S]) -> Result<Self> {
        if rows.len() != cols.len() {
            return Err(AnalysisError::ComputationFailure(format!(
                "cross-tabulation requires equal-length columns, got {} and {}",
                rows.len(),
                cols.len()
            )));
        }
        let mut row_labels: Vec<String> = Vec::new();
        let mut col_labels: Vec<String> = Vec::new();
        let mut cells: Vec<(usize, usize)> = Vec::with_capacity(rows.len());
        for (r, c) in rows.iter().zip(cols) {
            let i = position_or_push(&mut row_labels, r.as_ref());
            let j = position_or_push(&mut col_labels, c.as_ref());
            cells.push((i, j));
        }
        let mut counts = vec![vec![0.0; col_labels.len()]; row_labels.len()];
        for (i, j) in cells {
            counts[i][j] += 1.0;
        }
        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }

    pub fn row_totals(&self) -> Vec<f64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<f64> {
        (0..self.col_labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }
}

fn position_or_push(labels: &mut Vec<String>, label: &str) -> usize {
    match labels.iter().position(|l| l == label) {
        Some(i) => i,
        None => {
            labels.push(label.to_string());
            labels.len() - 1
        }
    }
}

/// Pearson χ² test of independence (no Yates correction).
///
/// # Errors
/// `DegenerateInput` if the table has fewer than two rows or columns.
///
/// # Examples
/// ```
/// use u_analysis::hypothesis::{chi_square_independence, ContingencyTable};
/// let table = ContingencyTable::from_pairs(&["1", "1", "2", "2"], &["1", "1", "2", "2"]).unwrap();
/// let out = chi_square_independence(&table).unwrap();
/// assert!((out.statistic - 4.0).abs() < 1e-12);
/// assert!(out.p_value < 0.05);
/// ```
pub fn chi_square_independence(table: &ContingencyTable) -> Result<TestOutcome> {
    let (r, c) = (table.row_labels.len(), table.col_labels.len());
    if r < 2 || c < 2 {
        return Err(AnalysisError::DegenerateInput(format!(
            "χ² test needs at least a 2×2 table, got {r}×{c}"
        )));
    }
    let total = table.total();
    let row_totals = table.row_totals();
    let col_totals = table.col_totals();

    let mut terms = Vec::with_capacity(r * c);
    for (i, row) in table.counts.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            terms.push((observed - expected).powi(2) / expected);
        }
    }
    let statistic = kahan_sum(&terms);
    let df = ((r - 1) * (c - 1)) as f64;
    let p_value = ChiSquared::new(df)?.sf(statistic);
    Ok(TestOutcome { statistic, p_value })
}

// ============================================================================
// Tests
// ============================================================================
