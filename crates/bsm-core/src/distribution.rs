//! Standard normal distribution primitive shared by both pricing engines.
//!
//! Backed by `statrs`, whose erfc-based CDF is accurate to well below 1e-8
//! across the range d1/d2 take in practice. Outside [-CDF_SATURATION,
//! CDF_SATURATION] the CDF is pinned to exactly 0 or 1.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

/// |x| beyond which N(x) is indistinguishable from 0 or 1 in f64.
pub const CDF_SATURATION: f64 = 38.5;

/// Standard normal CDF: N(x) = P(Z <= x).
pub fn norm_cdf(x: f64) -> f64 {
    if x <= -CDF_SATURATION {
        return 0.0;
    }
    if x >= CDF_SATURATION {
        return 1.0;
    }
    Normal::standard().cdf(x).clamp(0.0, 1.0)
}

/// Standard normal PDF: n(x) = exp(-x^2/2) / sqrt(2*pi)
pub fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_cdf_reference_values() {
        // Reference values from Abramowitz & Stegun Table 26.1 (15 digits)
        let table = [
            (0.0, 0.5),
            (0.5, 0.691462461274013),
            (1.0, 0.841344746068543),
            (1.96, 0.975002104851780),
            (2.0, 0.977249868051821),
            (3.0, 0.998650101968370),
            (-1.0, 0.158655253931457),
            (-2.5, 0.006209665325776),
            (-5.0, 2.866515718791939e-7),
        ];
        for (x, expected) in table {
            assert_abs_diff_eq!(norm_cdf(x), expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pdf_reference_values() {
        assert_abs_diff_eq!(norm_pdf(0.0), 0.398942280401433, epsilon = 1e-12);
        assert_abs_diff_eq!(norm_pdf(1.0), 0.241970724519143, epsilon = 1e-12);
        assert_abs_diff_eq!(norm_pdf(-1.0), norm_pdf(1.0), epsilon = 1e-15);
    }

    #[test]
    fn test_cdf_saturates_without_panicking() {
        assert_eq!(norm_cdf(-40.0), 0.0);
        assert_eq!(norm_cdf(40.0), 1.0);
        assert_eq!(norm_cdf(f64::NEG_INFINITY), 0.0);
        assert_eq!(norm_cdf(f64::INFINITY), 1.0);
        assert!(norm_cdf(-10.0) < 1e-22);
        assert!(norm_cdf(10.0) > 1.0 - 1e-15);
    }

    #[test]
    fn test_pdf_far_tails_are_zero_not_negative() {
        assert_eq!(norm_pdf(60.0), 0.0);
        assert_eq!(norm_pdf(-60.0), 0.0);
    }

    proptest! {
        #[test]
        fn test_cdf_bounded(x in -50.0f64..50.0) {
            let c = norm_cdf(x);
            prop_assert!((0.0..=1.0).contains(&c));
        }

        #[test]
        fn test_pdf_non_negative(x in -50.0f64..50.0) {
            prop_assert!(norm_pdf(x) >= 0.0);
        }

        #[test]
        fn test_cdf_non_decreasing(x in -12.0f64..12.0, step in 0.0f64..1.0) {
            prop_assert!(norm_cdf(x) <= norm_cdf(x + step));
        }

        #[test]
        fn test_cdf_symmetry(x in -10.0f64..10.0) {
            prop_assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-12);
        }
    }
}
