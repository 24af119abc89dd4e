//! Special functions and log densities used by the priors and proposals.

use std::f64::consts::PI;

/// Natural log of the gamma function for `x > 0`.
///
/// Lanczos approximation (g = 7, n = 9) with the reflection formula below
/// one half; relative error is around 1e-15 over the range used here.
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507343278686905,
        -0.13857109526572012,
        9.984_369_578_019_572e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        let log_pi_over_sin = (PI / (PI * x).sin()).ln();
        log_pi_over_sin - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut ag = 0.999_999_999_999_809_9_f64;
        for (i, &c) in COEFFS.iter().enumerate() {
            ag += c / (x + i as f64 + 1.0);
        }
        let t = x + 7.5;
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + ag.ln()
    }
}

/// Log density of `x` under a Dirichlet distribution with concentration `alpha`.
///
/// Returns `-inf` when `x` lies outside the simplex interior.
pub fn log_dirichlet_density(alpha: &[f64], x: &[f64]) -> f64 {
    debug_assert_eq!(alpha.len(), x.len());
    if x.iter().any(|&xi| xi <= 0.0) {
        return f64::NEG_INFINITY;
    }
    let alpha_sum: f64 = alpha.iter().sum();
    let mut log_density = ln_gamma(alpha_sum);
    for (&a, &xi) in alpha.iter().zip(x) {
        log_density += (a - 1.0) * xi.ln() - ln_gamma(a);
    }
    log_density
}

/// Log density of `x` under Beta(a, b); `-inf` outside (0, 1).
pub fn log_beta_density(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        return f64::NEG_INFINITY;
    }
    (a - 1.0) * x.ln() + (b - 1.0) * (1.0 - x).ln() + ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn ln_gamma_integers() {
        assert!(ln_gamma(1.0).abs() < TOL);
        assert!(ln_gamma(2.0).abs() < TOL);
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < TOL);
        assert!((ln_gamma(7.0) - 720.0_f64.ln()).abs() < TOL);
    }

    #[test]
    fn ln_gamma_half() {
        assert!((ln_gamma(0.5) - 0.5 * PI.ln()).abs() < 1e-9);
    }

    #[test]
    fn flat_dirichlet_is_constant() {
        let alpha = [1.0, 1.0, 1.0, 1.0];
        let a = log_dirichlet_density(&alpha, &[0.1, 0.2, 0.3, 0.4]);
        let b = log_dirichlet_density(&alpha, &[0.25, 0.25, 0.25, 0.25]);
        assert!((a - b).abs() < TOL);
        assert!((a - 6.0_f64.ln()).abs() < TOL);
    }

    #[test]
    fn dirichlet_outside_simplex() {
        let alpha = [2.0, 2.0];
        assert_eq!(log_dirichlet_density(&alpha, &[0.0, 1.0]), f64::NEG_INFINITY);
    }

    #[test]
    fn beta_support() {
        assert_eq!(log_beta_density(1.0, 1.0, 1.2), f64::NEG_INFINITY);
        assert_eq!(log_beta_density(1.0, 1.0, -0.1), f64::NEG_INFINITY);
        assert!(log_beta_density(1.0, 1.0, 0.3).abs() < TOL);
    }
}
