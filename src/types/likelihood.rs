//! Log-space likelihood accumulation
//!
//! A [`Likelihood`] starts at probability one and folds in named factors.
//! Every factor is kept, in insertion order, so the final weight of a
//! candidate can be traced back to the rules that produced it.

use core::fmt;
use std::borrow::Cow;

use tracing::warn;

/// A named probability built from ordered, named factors.
///
/// Values are held as natural-log probabilities. A factor of probability
/// zero drives the total to `-inf`, which absorbs every later AND factor;
/// no combination produces NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Likelihood {
    name: Cow<'static, str>,
    log_probability: f64,
    factors: Vec<Likelihood>,
}

impl Likelihood {
    /// Creates an empty result with probability one.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::from_log(name, 0.0)
    }

    /// Creates a leaf result from a log-probability.
    pub fn from_log(name: impl Into<Cow<'static, str>>, log_probability: f64) -> Self {
        Self {
            name: name.into(),
            log_probability: sanitize_log(log_probability),
            factors: Vec::new(),
        }
    }

    /// Creates a leaf result from a linear probability.
    pub fn from_probability(name: impl Into<Cow<'static, str>>, probability: f64) -> Self {
        Self::from_log(name, probability_to_log(probability))
    }

    /// Name of this result.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Combined probability, `exp(total_log_probability)`.
    pub fn total_probability(&self) -> f64 {
        self.log_probability.exp()
    }

    /// Combined natural-log probability.
    pub fn total_log_probability(&self) -> f64 {
        self.log_probability
    }

    /// True once a zero-probability factor has been combined by AND.
    pub fn is_zero(&self) -> bool {
        self.log_probability == f64::NEG_INFINITY
    }

    /// The ordered contributions folded into this result.
    pub fn factors(&self) -> &[Likelihood] {
        &self.factors
    }

    /// ANDs in a linear-space probability.
    pub fn add_factor_and(&mut self, name: impl Into<Cow<'static, str>>, probability: f64) -> &mut Self {
        self.add_result_and(Likelihood::from_probability(name, probability))
    }

    /// ANDs in a log-space probability.
    pub fn add_log_factor_and(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        log_probability: f64,
    ) -> &mut Self {
        self.add_result_and(Likelihood::from_log(name, log_probability))
    }

    /// ANDs in a complete sub-result, keeping it as a nested factor.
    pub fn add_result_and(&mut self, result: Likelihood) -> &mut Self {
        // -inf + finite stays -inf; +inf never reaches here
        self.log_probability += result.log_probability;
        self.factors.push(result);
        self
    }

    /// ORs in a linear-space probability.
    pub fn add_factor_or(&mut self, name: impl Into<Cow<'static, str>>, probability: f64) -> &mut Self {
        self.add_result_or(Likelihood::from_probability(name, probability))
    }

    /// ORs in a log-space probability.
    pub fn add_log_factor_or(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        log_probability: f64,
    ) -> &mut Self {
        self.add_result_or(Likelihood::from_log(name, log_probability))
    }

    /// ORs in a complete sub-result: `p = 1 - (1 - a)(1 - b)`.
    ///
    /// Only meaningful for probabilities in `[0, 1]`.
    pub fn add_result_or(&mut self, result: Likelihood) -> &mut Self {
        self.log_probability = log_or(self.log_probability, result.log_probability);
        self.factors.push(result);
        self
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{} = {:.6e} (log {:.4})",
            "",
            self.name,
            self.total_probability(),
            self.log_probability,
            indent = depth * 2
        )?;
        for factor in &self.factors {
            factor.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Natural log of a probability; zero and negative inputs map to `-inf`.
fn probability_to_log(probability: f64) -> f64 {
    if probability.is_nan() {
        warn!("NaN probability treated as zero");
        return f64::NEG_INFINITY;
    }
    if probability <= 0.0 {
        f64::NEG_INFINITY
    } else {
        probability.ln()
    }
}

fn sanitize_log(log_probability: f64) -> f64 {
    if log_probability.is_nan() || log_probability == f64::INFINITY {
        warn!(log_probability, "invalid log-probability treated as zero probability");
        f64::NEG_INFINITY
    } else {
        log_probability
    }
}

/// `ln(1 - (1 - e^a)(1 - e^b))` without leaving log space for small values.
fn log_or(a: f64, b: f64) -> f64 {
    // (1 - p) = -expm1(ln p)
    let miss = (-a.exp_m1()) * (-b.exp_m1());
    if miss >= 1.0 {
        f64::NEG_INFINITY
    } else {
        (-miss).ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_one() {
        let l = Likelihood::new("pState");
        assert_eq!(l.total_probability(), 1.0);
        assert_eq!(l.total_log_probability(), 0.0);
        assert!(l.factors().is_empty());
    }

    #[test]
    fn test_and_sums_logs_in_any_order() {
        let logs = [-1.0, -2.0, -0.5];
        let orders = [[0, 1, 2], [2, 1, 0], [1, 2, 0], [2, 0, 1]];
        for order in orders {
            let mut l = Likelihood::new("root");
            for i in order {
                l.add_log_factor_and("f", logs[i]);
            }
            assert!((l.total_log_probability() + 3.5).abs() < 1e-12);
            assert_eq!(l.factors().len(), 3);
        }
    }

    #[test]
    fn test_zero_factor_dominates() {
        let mut l = Likelihood::new("root");
        l.add_factor_and("a", 0.3)
            .add_factor_and("zero", 0.0)
            .add_factor_and("b", 0.9)
            .add_log_factor_and("c", -1e300);
        assert!(l.is_zero());
        assert_eq!(l.total_probability(), 0.0);
        assert!(!l.total_log_probability().is_nan());
    }

    #[test]
    fn test_nan_inputs_never_leak() {
        let mut l = Likelihood::new("root");
        l.add_factor_and("nan", f64::NAN).add_log_factor_and("inf", f64::INFINITY);
        assert!(l.is_zero());
        assert!(!l.total_log_probability().is_nan());
    }

    #[test]
    fn test_or_combination() {
        let mut l = Likelihood::from_probability("root", 0.5);
        l.add_factor_or("b", 0.5);
        assert!((l.total_probability() - 0.75).abs() < 1e-12);

        let mut z = Likelihood::from_probability("root", 0.0);
        z.add_factor_or("zero", 0.0);
        assert!(z.is_zero());

        let mut one = Likelihood::from_probability("root", 0.2);
        one.add_factor_or("certain", 1.0);
        assert!((one.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nested_results_keep_provenance() {
        let mut schedule = Likelihood::new("pSchedule");
        schedule.add_log_factor_and("in progress", -1.25);

        let mut root = Likelihood::new("vehicle state");
        root.add_result_and(schedule);
        root.add_factor_and("other", 0.5);

        assert_eq!(root.factors()[0].name(), "pSchedule");
        assert_eq!(root.factors()[0].factors()[0].name(), "in progress");
        let expected = -1.25 + 0.5_f64.ln();
        assert!((root.total_log_probability() - expected).abs() < 1e-12);

        let rendered = root.to_string();
        assert!(rendered.contains("  pSchedule"));
        assert!(rendered.contains("    in progress"));
    }

    proptest! {
        #[test]
        fn and_is_order_independent(mut logs in prop::collection::vec(-50.0f64..0.0, 1..12)) {
            let mut forward = Likelihood::new("forward");
            for &l in &logs {
                forward.add_log_factor_and("f", l);
            }
            let expected: f64 = logs.iter().sum();

            logs.reverse();
            let mut backward = Likelihood::new("backward");
            for &l in &logs {
                backward.add_log_factor_and("f", l);
            }

            prop_assert!((forward.total_log_probability() - expected).abs() < 1e-9);
            prop_assert!((backward.total_log_probability() - expected).abs() < 1e-9);
        }
    }
}
