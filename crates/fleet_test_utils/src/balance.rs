//! Win-rate tolerance checks for Monte Carlo tests.
//!
//! A win fraction from N trials is a noisy estimate, so tests compare it
//! against an expected value with a tolerance band instead of equality.

/// Expected win fraction with an allowed deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinRateBand {
    /// Expected fraction (0.0 to 1.0).
    pub expected: f64,
    /// Allowed absolute deviation.
    pub tolerance: f64,
}

impl WinRateBand {
    /// Create a band around `expected`.
    #[must_use]
    pub fn new(expected: f64, tolerance: f64) -> Self {
        Self {
            expected,
            tolerance,
        }
    }

    /// Band of `sigmas` standard errors around `expected` for `trials` samples.
    #[must_use]
    pub fn from_sigmas(expected: f64, trials: u64, sigmas: f64) -> Self {
        Self::new(expected, sigmas * standard_error(expected, trials))
    }

    /// Check if a measured fraction lies within the band.
    #[must_use]
    pub fn contains(&self, fraction: f64) -> bool {
        (fraction - self.expected).abs() <= self.tolerance
    }

    /// Assert that a measured fraction lies within the band.
    ///
    /// # Panics
    ///
    /// Panics if the fraction is outside the band or not a number.
    pub fn assert_contains(&self, fraction: f64) {
        assert!(
            fraction.is_finite() && self.contains(fraction),
            "Win fraction {:.4} outside {:.4} ± {:.4}",
            fraction,
            self.expected,
            self.tolerance
        );
    }
}

/// Standard error of a Bernoulli fraction estimated from `trials` samples.
#[must_use]
pub fn standard_error(probability: f64, trials: u64) -> f64 {
    if trials == 0 {
        return f64::INFINITY;
    }
    (probability * (1.0 - probability) / trials as f64).sqrt()
}
