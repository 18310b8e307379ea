use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    airmass_errors::AirmassError,
    constants::{Degree, DEFAULT_ELEMENT_EPOCH, GAUSS_GRAV, MJD, RADEG},
    kepler::{principal_angle, solve_kepler_equation},
    ref_system::{ecliptic_to_equatorial, precession_from_j2000, rotmt},
    time::jd_to_mjd,
};

/// Orbital element fields as carried by a target record.
///
/// Every field is optional. Angles are in degrees, the semi-major axis in AU, and both epochs
/// are Julian Dates. Unset fields resolve to zero, and unset epochs to
/// [`DEFAULT_ELEMENT_EPOCH`] (2000-01-01 00:00), when converted into [`KeplerianElements`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElementFields {
    pub inclination: Option<Degree>,
    pub lng_asc_node: Option<Degree>,
    pub arg_of_perihelion: Option<Degree>,
    pub semimajor_axis: Option<f64>,
    pub mean_anomaly: Option<Degree>,
    /// Epoch of the mean anomaly, JD
    pub ephemeris_epoch: Option<f64>,
    /// Epoch of the equinox the angles refer to, JD
    pub epoch: Option<f64>,
    pub eccentricity: Option<f64>,
}

/// Keplerian orbital elements
/// Units:
/// * `reference_epoch`: MJD (epoch of the mean anomaly)
/// * `equinox`: MJD (equinox and ecliptic of the angular elements)
/// * `semi_major_axis`: AU (Astronomical Units)
/// * `eccentricity`: unitless
/// * `inclination`: radians
/// * `ascending_node_longitude`: radians
/// * `periapsis_argument`: radians
/// * `mean_anomaly`: radians
#[derive(Debug, Clone, PartialEq)]
pub struct KeplerianElements {
    pub reference_epoch: MJD,
    pub equinox: MJD,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub periapsis_argument: f64,
    pub mean_anomaly: f64,
}

impl KeplerianElements {
    /// Check that the elements describe a bound orbit this crate can propagate.
    ///
    /// Return
    /// ----------
    /// * [`AirmassError::InvalidOrbit`] unless `0 ≤ e < 1` and `a > 0`.
    pub fn validate(&self) -> Result<(), AirmassError> {
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(AirmassError::InvalidOrbit(format!(
                "only elliptic orbits are supported, got eccentricity {}",
                self.eccentricity
            )));
        }
        if !(self.semi_major_axis > 0.0) {
            return Err(AirmassError::InvalidOrbit(format!(
                "semi-major axis must be strictly positive, got {} AU",
                self.semi_major_axis
            )));
        }
        Ok(())
    }

    /// Mean motion in radians per day, from the Gaussian gravitational constant.
    pub fn mean_motion(&self) -> f64 {
        GAUSS_GRAV / self.semi_major_axis.powf(1.5)
    }

    /// Solve the two-body problem at `t1`.
    ///
    /// Arguments
    /// -----------------
    /// * `t1`: propagation epoch, MJD (TT).
    ///
    /// Return
    /// ----------
    /// * The heliocentric position in AU, in the ecliptic frame of [`Self::equinox`].
    pub fn solve_two_body_problem(&self, t1: MJD) -> Result<Vector3<f64>, AirmassError> {
        let mean_anomaly_t1 =
            principal_angle(self.mean_anomaly + self.mean_motion() * (t1 - self.reference_epoch));
        let eccentric_anomaly = solve_kepler_equation(mean_anomaly_t1, self.eccentricity)?;

        let (sin_u, cos_u) = eccentric_anomaly.sin_cos();
        let a = self.semi_major_axis;
        let in_plane = Vector3::new(
            a * (cos_u - self.eccentricity),
            a * (1.0 - self.eccentricity.powi(2)).sqrt() * sin_u,
            0.0,
        );

        Ok(self.orbital_plane_to_ecliptic() * in_plane)
    }

    /// Heliocentric position at `t1` (MJD TT) in the J2000 mean equatorial frame, AU.
    pub fn heliocentric_j2000(&self, t1: MJD) -> Result<Vector3<f64>, AirmassError> {
        let ecliptic = self.solve_two_body_problem(t1)?;
        let equatorial = ecliptic_to_equatorial(self.equinox) * ecliptic;
        Ok(precession_from_j2000(self.equinox).transpose() * equatorial)
    }

    fn orbital_plane_to_ecliptic(&self) -> Matrix3<f64> {
        rotmt(self.ascending_node_longitude, 2)
            * rotmt(self.inclination, 0)
            * rotmt(self.periapsis_argument, 2)
    }
}

impl TryFrom<&OrbitalElementFields> for KeplerianElements {
    type Error = AirmassError;

    fn try_from(fields: &OrbitalElementFields) -> Result<Self, Self::Error> {
        let angle = |value: Option<Degree>| value.unwrap_or(0.0) * RADEG;
        let epoch = |value: Option<f64>| value.map(jd_to_mjd).unwrap_or(DEFAULT_ELEMENT_EPOCH);

        let elements = KeplerianElements {
            reference_epoch: epoch(fields.ephemeris_epoch),
            equinox: epoch(fields.epoch),
            semi_major_axis: fields.semimajor_axis.unwrap_or(0.0),
            eccentricity: fields.eccentricity.unwrap_or(0.0),
            inclination: angle(fields.inclination),
            ascending_node_longitude: angle(fields.lng_asc_node),
            periapsis_argument: angle(fields.arg_of_perihelion),
            mean_anomaly: angle(fields.mean_anomaly),
        };
        elements.validate()?;
        Ok(elements)
    }
}

#[cfg(test)]
mod keplerian_element_test {
    use super::*;
    use crate::constants::DPI;
    use approx::assert_relative_eq;

    fn ceres_like() -> OrbitalElementFields {
        OrbitalElementFields {
            inclination: Some(10.5868),
            lng_asc_node: Some(80.2550),
            arg_of_perihelion: Some(73.4237),
            semimajor_axis: Some(2.7658),
            mean_anomaly: Some(291.3778),
            ephemeris_epoch: Some(2459600.5),
            epoch: Some(2451545.0),
            eccentricity: Some(0.0785),
        }
    }

    #[test]
    fn test_defaults() {
        let fields = OrbitalElementFields {
            semimajor_axis: Some(1.0),
            ..Default::default()
        };
        let kepler = KeplerianElements::try_from(&fields).unwrap();

        assert_eq!(kepler.reference_epoch, DEFAULT_ELEMENT_EPOCH);
        assert_eq!(kepler.equinox, DEFAULT_ELEMENT_EPOCH);
        assert_eq!(kepler.eccentricity, 0.0);
        assert_eq!(kepler.inclination, 0.0);
    }

    #[test]
    fn test_unbound_orbits_are_rejected() {
        let hyperbolic = OrbitalElementFields {
            eccentricity: Some(1.2),
            ..ceres_like()
        };
        assert!(matches!(
            KeplerianElements::try_from(&hyperbolic),
            Err(AirmassError::InvalidOrbit(_))
        ));

        // every field unset: a = 0
        assert!(matches!(
            KeplerianElements::try_from(&OrbitalElementFields::default()),
            Err(AirmassError::InvalidOrbit(_))
        ));
    }

    #[test]
    fn test_two_body_problem() {
        let kepler = KeplerianElements::try_from(&ceres_like()).unwrap();

        // one full period brings the body back to the same place
        let period = DPI / kepler.mean_motion();
        let t0 = kepler.reference_epoch;
        let p0 = kepler.solve_two_body_problem(t0).unwrap();
        let p1 = kepler.solve_two_body_problem(t0 + period).unwrap();
        assert_relative_eq!(p0, p1, epsilon = 1e-9);

        // heliocentric distance stays between perihelion and aphelion
        for k in 0..20 {
            let r = kepler
                .solve_two_body_problem(t0 + k as f64 * 50.0)
                .unwrap()
                .norm();
            assert!(r >= 2.7658 * (1.0 - 0.0785) - 1e-12);
            assert!(r <= 2.7658 * (1.0 + 0.0785) + 1e-12);
        }

        // the height above the ecliptic never exceeds r·sin(i)
        let p = kepler.solve_two_body_problem(t0 + 123.0).unwrap();
        assert!(p.z.abs() <= p.norm() * kepler.inclination.sin() + 1e-12);
    }

    #[test]
    fn test_circular_equatorial_orbit() {
        // i = 0, Ω = ω = 0, M = 90° at the reference epoch: body on the ecliptic +Y axis
        let fields = OrbitalElementFields {
            semimajor_axis: Some(2.0),
            mean_anomaly: Some(90.0),
            ..Default::default()
        };
        let kepler = KeplerianElements::try_from(&fields).unwrap();
        let p = kepler
            .solve_two_body_problem(kepler.reference_epoch)
            .unwrap();
        assert_relative_eq!(p, Vector3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }
}
