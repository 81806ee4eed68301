//! Univariate distributions used by the sensor rules
//!
//! Densities are evaluated in log space where possible. The special
//! functions are the usual rational/series approximations; their accuracy is
//! far beyond what a likelihood weight needs.

use num_traits::Float;

use crate::{Result, TrackphaseError};

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

#[inline]
fn lit<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::nan)
}

/// Evaluates a polynomial with coefficients ordered from highest degree.
#[inline]
fn horner<T: Float>(coeffs: &[f64], x: T) -> T {
    coeffs
        .iter()
        .fold(T::zero(), |acc, &c| acc * x + lit::<T>(c))
}

fn check_positive<T: Float>(name: &str, value: T) -> Result<()> {
    if value > T::zero() && value.is_finite() {
        Ok(())
    } else {
        Err(TrackphaseError::InvalidConfig {
            details: format!("{name} must be positive and finite"),
        })
    }
}

fn check_finite<T: Float>(name: &str, value: T) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrackphaseError::InvalidConfig {
            details: format!("{name} must be finite"),
        })
    }
}

// ============================================================================
// Special Functions
// ============================================================================

/// Natural log of the gamma function (Lanczos, g = 7).
pub fn ln_gamma<T: Float>(x: T) -> T {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    let pi = lit::<T>(core::f64::consts::PI);
    if x < lit(0.5) {
        // Reflection formula
        return (pi / (pi * x).sin()).abs().ln() - ln_gamma(T::one() - x);
    }

    let x = x - T::one();
    let mut a = lit::<T>(COEFFS[0]);
    let t = x + lit(G + 0.5);
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        a = a + lit::<T>(c) / (x + lit(i as f64));
    }

    lit::<T>(LN_SQRT_2PI) + (x + lit(0.5)) * t.ln() - t + a.ln()
}

/// Error function (Abramowitz & Stegun 7.1.26, |error| < 1.5e-7).
pub fn erf<T: Float>(x: T) -> T {
    const POLY: [f64; 5] = [
        1.061_405_429,
        -1.453_152_027,
        1.421_413_741,
        -0.284_496_736,
        0.254_829_592,
    ];
    let sign = if x < T::zero() { -T::one() } else { T::one() };
    let x = x.abs();
    let t = T::one() / (T::one() + lit::<T>(0.327_591_1) * x);
    let y = T::one() - horner(&POLY, t) * t * (-x * x).exp();
    sign * y
}

/// Inverse of the standard normal CDF (Acklam's algorithm).
pub fn standard_normal_quantile<T: Float>(p: T) -> T {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 6] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
        1.0,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 5] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
        1.0,
    ];
    const P_LOW: f64 = 0.024_25;

    if p.is_nan() {
        return p;
    }
    if p <= T::zero() {
        return T::neg_infinity();
    }
    if p >= T::one() {
        return T::infinity();
    }

    let two = lit::<T>(2.0);
    if p < lit(P_LOW) {
        let q = (-two * p.ln()).sqrt();
        horner(&C, q) / horner(&D, q)
    } else if p <= lit(1.0 - P_LOW) {
        let q = p - lit(0.5);
        let r = q * q;
        horner(&A, r) * q / horner(&B, r)
    } else {
        let q = (-two * (T::one() - p).ln()).sqrt();
        -horner(&C, q) / horner(&D, q)
    }
}

// ============================================================================
// Student-t
// ============================================================================

/// Location-scale Student-t distribution.
///
/// Heavy tailed, so a single wildly off schedule estimate does not collapse a
/// candidate's weight the way a Gaussian would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentT<T> {
    dof: T,
    location: T,
    scale: T,
    log_norm: T,
}

impl<T: Float> StudentT<T> {
    /// Creates a Student-t with `dof` degrees of freedom.
    pub fn new(dof: T, location: T, scale: T) -> Result<Self> {
        check_positive("degrees of freedom", dof)?;
        check_finite("location", location)?;
        check_positive("scale", scale)?;

        let half = lit::<T>(0.5);
        let pi = lit::<T>(core::f64::consts::PI);
        let log_norm = ln_gamma((dof + T::one()) * half)
            - ln_gamma(dof * half)
            - half * (dof * pi).ln()
            - scale.ln();

        Ok(Self {
            dof,
            location,
            scale,
            log_norm,
        })
    }

    /// Degrees of freedom.
    pub fn dof(&self) -> T {
        self.dof
    }

    /// Center of the distribution.
    pub fn location(&self) -> T {
        self.location
    }

    /// Scale parameter (not the standard deviation).
    pub fn scale(&self) -> T {
        self.scale
    }

    /// Log density at `x`.
    pub fn ln_pdf(&self, x: T) -> T {
        let z = (x - self.location) / self.scale;
        let half = lit::<T>(0.5);
        self.log_norm - (self.dof + T::one()) * half * (z * z / self.dof).ln_1p()
    }

    /// Density at `x`.
    pub fn pdf(&self, x: T) -> T {
        self.ln_pdf(x).exp()
    }
}

// ============================================================================
// Normal
// ============================================================================

/// Gaussian distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal<T> {
    mean: T,
    std_dev: T,
}

impl<T: Float> Normal<T> {
    /// Creates a normal distribution.
    pub fn new(mean: T, std_dev: T) -> Result<Self> {
        check_finite("mean", mean)?;
        check_positive("standard deviation", std_dev)?;
        Ok(Self { mean, std_dev })
    }

    /// Mean.
    pub fn mean(&self) -> T {
        self.mean
    }

    /// Standard deviation.
    pub fn std_dev(&self) -> T {
        self.std_dev
    }

    /// Log density at `x`.
    pub fn ln_pdf(&self, x: T) -> T {
        let z = (x - self.mean) / self.std_dev;
        -lit::<T>(0.5) * z * z - lit::<T>(LN_SQRT_2PI) - self.std_dev.ln()
    }

    /// Density at `x`.
    pub fn pdf(&self, x: T) -> T {
        self.ln_pdf(x).exp()
    }

    /// Cumulative distribution at `x`.
    pub fn cdf(&self, x: T) -> T {
        let z = (x - self.mean) / (self.std_dev * lit(core::f64::consts::SQRT_2));
        lit::<T>(0.5) * (T::one() + erf(z))
    }

    /// Quantile function.
    pub fn inverse_cdf(&self, p: T) -> T {
        self.mean + self.std_dev * standard_normal_quantile(p)
    }
}

// ============================================================================
// Folded Normal
// ============================================================================

/// Distribution of `|X|` for `X ~ Normal(mean, std_dev)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldedNormal<T> {
    inner: Normal<T>,
}

impl<T: Float> FoldedNormal<T> {
    /// Creates a folded normal from the parameters of the unfolded Gaussian.
    pub fn new(mean: T, std_dev: T) -> Result<Self> {
        Ok(Self {
            inner: Normal::new(mean, std_dev)?,
        })
    }

    /// Cumulative distribution at `x` (zero for negative `x`).
    pub fn cdf(&self, x: T) -> T {
        if x < T::zero() {
            return T::zero();
        }
        let mirrored = Normal {
            mean: -self.inner.mean,
            std_dev: self.inner.std_dev,
        };
        self.inner.cdf(x) + mirrored.cdf(x) - T::one()
    }

    /// Quantile function.
    ///
    /// Closed form for a zero mean (half-normal), bisection otherwise.
    pub fn inverse_cdf(&self, p: T) -> T {
        if p.is_nan() || p < T::zero() || p > T::one() {
            return T::nan();
        }
        if p == T::one() {
            return T::infinity();
        }
        let half = lit::<T>(0.5);
        if self.inner.mean == T::zero() {
            return self.inner.std_dev * standard_normal_quantile((T::one() + p) * half);
        }

        let mut lo = T::zero();
        let mut hi = self.inner.mean.abs() + lit::<T>(40.0) * self.inner.std_dev;
        for _ in 0..200 {
            let mid = (lo + hi) * half;
            if self.cdf(mid) < p {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) * half
    }
}
