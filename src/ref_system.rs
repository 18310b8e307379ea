//! # Reference frames
//!
//! Rotations between the frames used by the position pipeline:
//!
//! - **ecliptic of an equinox → equatorial of the same equinox**, through the mean obliquity
//!   ([`obleq`], [`ecliptic_to_equatorial`]),
//! - **mean equator J2000 → mean equator of date**, through the IAU 1976 precession
//!   ([`precession_from_j2000`]),
//! - **equatorial of date → local horizontal**, through the hour angle
//!   ([`equatorial_to_horizontal`]).
//!
//! Nutation is neglected: its amplitude (< 20″) is far below what an airmass plot resolves.
//!
//! All matrices are built from [`rotmt`], an active rotation of a vector about a principal
//! axis. With that convention the passive change of basis "rotate the frame by α about k"
//! is `rotmt(-α, k)`.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI, RADEG, RADSEC, T2000};

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 / Lieske).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT).
///
/// Returns
/// --------
/// * Mean obliquity ε in radians.
///
/// The polynomial is evaluated with Horner's method:
///
/// ```text
/// ε(T) = ε₀ + ε₁·T + ε₂·T² + ε₃·T³,   T = (tjm − T2000) / 36525
/// ```
pub fn obleq(tjm: f64) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Construct a right-handed 3×3 rotation matrix around one of the principal axes.
///
/// The matrix performs an **active rotation** of a vector by `alpha` (counter-clockwise when
/// looking down the axis toward the origin), so that the rotated vector is `x' = R · x`.
///
/// # Arguments
///
/// * `alpha` - Rotation angle in radians.
/// * `k` - Axis index: `0` → X, `1` → Y, `2` → Z.
///
/// # Panics
///
/// Panics if `k > 2`. Callers in this crate only use literal axis indices.
pub fn rotmt(alpha: f64, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("rotmt: invalid axis index {k} (must be 0, 1 or 2)"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotation from ecliptic coordinates to equatorial coordinates of the same mean equinox.
///
/// Arguments
/// ---------
/// * `tjm`: epoch of the equinox, MJD (TT).
///
/// Returns
/// --------
/// * Matrix `R` such that `x_equ = R · x_ecl`.
pub fn ecliptic_to_equatorial(tjm: f64) -> Matrix3<f64> {
    rotmt(obleq(tjm), 0)
}

/// Precession matrix from the J2000 mean equator and equinox to the mean equator and equinox
/// of `tjm` (IAU 1976, Astronomical Almanac 1987 B18).
///
/// Returns
/// --------
/// * Matrix `P` such that `x_date = P · x_J2000`. Its transpose performs the inverse.
///
/// Method
/// ------
/// As a change of basis, `P = R3(−z) · R2(θ) · R3(−ζ)` with the passive rotations `Rk`.
/// With the active [`rotmt`] this reads `rotmt(z, 2) · rotmt(−θ, 1) · rotmt(ζ, 2)`, where
///
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// θ(T) = (0.5567530 − 0.0001185·T − 0.0000116·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// ```
pub fn precession_from_j2000(tjm: f64) -> Matrix3<f64> {
    let t = (tjm - T2000) / 36525.0;

    let zeta = ((0.0000050 * t + 0.0000839) * t + 0.6406161) * t * RADEG;
    let z = ((0.0000051 * t + 0.0003041) * t + 0.6406161) * t * RADEG;
    let theta = ((-0.0000116 * t - 0.0001185) * t + 0.5567530) * t * RADEG;

    rotmt(z, 2) * rotmt(-theta, 1) * rotmt(zeta, 2)
}

/// Convert a 3D Cartesian position vector to right ascension and declination.
///
/// Arguments
/// ---------
/// * `cartesian_position`: position vector in an equatorial frame (any length unit).
///
/// Returns
/// --------
/// * Tuple `(α, δ, ρ)`: right ascension in radians in `[0, 2π)`, declination in radians in
///   `[−π/2, π/2]` and the norm of the vector.
///
/// Remarks
/// -------
/// * A null vector yields `(0, 0, 0)`.
pub fn cartesian_to_radec(cartesian_position: &Vector3<f64>) -> (Radian, Radian, f64) {
    let pos_norm = cartesian_position.norm();
    if pos_norm == 0. {
        return (0.0, 0.0, pos_norm);
    }

    let delta = (cartesian_position.z / pos_norm).clamp(-1.0, 1.0).asin();
    let alpha = cartesian_position
        .y
        .atan2(cartesian_position.x)
        .rem_euclid(DPI);

    (alpha, delta, pos_norm)
}

/// Unit vector pointing to `(ra, dec)`, both in radians.
pub fn radec_to_unit(ra: Radian, dec: Radian) -> Vector3<f64> {
    let (sin_dec, cos_dec) = dec.sin_cos();
    let (sin_ra, cos_ra) = ra.sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Convert an hour angle and declination into horizontal coordinates.
///
/// Arguments
/// ---------
/// * `hour_angle`: local hour angle `H = LST − α`, radians.
/// * `dec`: declination of date, radians.
/// * `latitude`: geodetic latitude of the observer, radians.
///
/// Returns
/// --------
/// * `(altitude, azimuth)` in radians; azimuth is counted from North through East in
///   `[0, 2π)`.
pub fn equatorial_to_horizontal(hour_angle: Radian, dec: Radian, latitude: Radian) -> (Radian, Radian) {
    let (sin_h, cos_h) = hour_angle.sin_cos();
    let (sin_d, cos_d) = dec.sin_cos();
    let (sin_p, cos_p) = latitude.sin_cos();

    let sin_alt = (sin_p * sin_d + cos_p * cos_d * cos_h).clamp(-1.0, 1.0);
    let altitude = sin_alt.asin();

    let azimuth = (-cos_d * sin_h)
        .atan2(sin_d * cos_p - cos_d * cos_h * sin_p)
        .rem_euclid(DPI);

    (altitude, azimuth)
}

#[cfg(test)]
mod ref_system_test {

    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_obliquity() {
        let obl = obleq(T2000);
        assert_eq!(obl, 0.40909280422232897)
    }

    #[test]
    fn test_ecliptic_to_equatorial_j2000() {
        // inverse of the J2000 equatorial → ecliptic rotation
        let rot = ecliptic_to_equatorial(T2000);
        let reference = Matrix3::new(
            1.0,
            0.0,
            0.0,
            0.0,
            0.9174820620691818,
            -0.3977771559319137,
            0.0,
            0.3977771559319137,
            0.9174820620691818,
        );
        assert_relative_eq!(rot, reference, epsilon = 1e-15);

        // the ecliptic pole lies at RA 18h, Dec 90° − ε
        let pole = rot * Vector3::z();
        let (ra, dec, _) = cartesian_to_radec(&pole);
        assert_relative_eq!(ra, 1.5 * std::f64::consts::PI, epsilon = 1e-12);
        assert_relative_eq!(dec, FRAC_PI_2 - obleq(T2000), epsilon = 1e-12);
    }

    #[test]
    fn test_precession_identity_at_j2000() {
        let p = precession_from_j2000(T2000);
        assert_relative_eq!(p, Matrix3::identity(), epsilon = 1e-15);
    }

    #[test]
    fn test_precession_half_century() {
        // the J2000 equinox, seen 50 years later, moves by ζ + z in RA and θ in Dec
        let p = precession_from_j2000(T2000 + 36525.0 / 2.0);
        let (ra, dec, norm) = cartesian_to_radec(&(p * Vector3::x()));

        assert_relative_eq!(ra / RADEG, 0.6407, epsilon = 1e-3);
        assert_relative_eq!(dec / RADEG, 0.2783, epsilon = 1e-3);
        assert_relative_eq!(norm, 1.0, epsilon = 1e-14);

        // orthonormal
        assert_relative_eq!(p * p.transpose(), Matrix3::identity(), epsilon = 1e-14);
    }

    #[test]
    fn test_cartesian_to_radec() {
        let (ra, dec, norm) = cartesian_to_radec(&Vector3::new(0.0, -2.0, 0.0));
        assert_relative_eq!(ra, 1.5 * std::f64::consts::PI);
        assert_eq!(dec, 0.0);
        assert_eq!(norm, 2.0);

        assert_eq!(cartesian_to_radec(&Vector3::zeros()), (0.0, 0.0, 0.0));

        let unit = radec_to_unit(1.2, -0.4);
        let (ra, dec, norm) = cartesian_to_radec(&unit);
        assert_relative_eq!(ra, 1.2, epsilon = 1e-14);
        assert_relative_eq!(dec, -0.4, epsilon = 1e-14);
        assert_relative_eq!(norm, 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_equatorial_to_horizontal() {
        let lat = 30.0 * RADEG;

        // on the meridian: altitude = 90° − |φ − δ|, due South
        let (alt, az) = equatorial_to_horizontal(0.0, 10.0 * RADEG, lat);
        assert_relative_eq!(alt / RADEG, 70.0, epsilon = 1e-10);
        assert_relative_eq!(az / RADEG, 180.0, epsilon = 1e-10);

        // the celestial pole is at altitude φ, due North
        let (alt, az) = equatorial_to_horizontal(1.0, FRAC_PI_2, lat);
        assert_relative_eq!(alt, lat, epsilon = 1e-10);
        assert_relative_eq!(az.cos(), 1.0, epsilon = 1e-10);

        // six hours east of the meridian on the equator: rising due East
        let (alt, az) = equatorial_to_horizontal(-FRAC_PI_2, 0.0, lat);
        assert_relative_eq!(alt, 0.0, epsilon = 1e-12);
        assert_relative_eq!(az / RADEG, 90.0, epsilon = 1e-10);
    }
}
