use super::constants::DPI;
use crate::airmass_errors::AirmassError;
use std::f64::consts::PI;

/// Return the principal value of an angle in radians, in [0, 2π).
pub(crate) fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Solve Kepler's equation `E − e·sin E = M` for the eccentric anomaly with Newton's method.
///
/// Arguments
/// -----------------
/// * `mean_anomaly`: mean anomaly M, radians (any range).
/// * `eccentricity`: eccentricity e, `0 ≤ e < 1`.
///
/// Return
/// ----------
/// * The eccentric anomaly E in [0, 2π), or [`AirmassError::KeplerNotConverged`] if the
///   iteration does not settle.
///
/// The starting guess is `M` for moderate eccentricities and `π` above 0.8, which keeps the
/// iteration monotone near perihelion of very eccentric orbits.
pub fn solve_kepler_equation(mean_anomaly: f64, eccentricity: f64) -> Result<f64, AirmassError> {
    const ITX: usize = 50;
    let contr = 100.0 * f64::EPSILON;

    let ell = principal_angle(mean_anomaly);
    let mut u = if eccentricity > 0.8 { PI } else { ell };

    for _ in 0..ITX {
        let du = -(u - eccentricity * u.sin() - ell) / (1.0 - eccentricity * u.cos());
        u += du;
        if du.abs() < contr * 1e3 {
            return Ok(principal_angle(u));
        }
    }

    Err(AirmassError::KeplerNotConverged {
        mean_anomaly,
        eccentricity,
    })
}

#[cfg(test)]
mod kepler_test {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_principal_angle() {
        assert_relative_eq!(principal_angle(-0.5), DPI - 0.5);
        assert_relative_eq!(principal_angle(7.0), 7.0 - DPI);
    }

    #[test]
    fn test_circular_orbit() {
        let u = solve_kepler_equation(1.234, 0.0).unwrap();
        assert_relative_eq!(u, 1.234, epsilon = 1e-14);
    }

    #[test]
    fn test_solve_kepler_equation() {
        for &(m, e) in &[(0.3, 0.1), (2.9, 0.5), (-1.0, 0.28359959913734450), (0.01, 0.97)] {
            let u = solve_kepler_equation(m, e).unwrap();
            let wrapped = principal_angle(u - e * u.sin() - m);
            let residual = wrapped.min(DPI - wrapped);
            assert!(residual.abs() < 1e-12, "M = {m}, e = {e}, residual = {residual}");
        }
    }

    #[test]
    fn test_apsides() {
        assert_relative_eq!(solve_kepler_equation(0.0, 0.6).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(solve_kepler_equation(PI, 0.6).unwrap(), PI, epsilon = 1e-12);
    }
}
