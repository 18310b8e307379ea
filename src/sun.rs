//! Low-precision geocentric Sun.
//!
//! Mean longitude, mean anomaly and the two-term equation of center give the apparent
//! ecliptic longitude to about 0.01° over 1950–2050, which is what the night model needs:
//! 0.01° in solar altitude moves a sunrise by a few seconds at most.

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::airmass_errors::AirmassError;
use crate::body::SkyBody;
use crate::constants::{JDTOMJD, RADEG};
use crate::ref_system::{ecliptic_to_equatorial, precession_from_j2000};

/// Julian Date of J2000.0
const JD2000: f64 = 2451545.0;

/// The Sun as a reference body for rise/set computations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sun;

impl Sun {
    /// Apparent ecliptic longitude (radians, equinox of date) and distance (AU).
    pub fn ecliptic_longitude_distance(mjd_tt: f64) -> (f64, f64) {
        let n = mjd_tt + JDTOMJD - JD2000;

        let mean_longitude = (280.460 + 0.9856474 * n).rem_euclid(360.0);
        let g = ((357.528 + 0.9856003 * n).rem_euclid(360.0)) * RADEG;

        let lambda = (mean_longitude + 1.915 * g.sin() + 0.020 * (2.0 * g).sin()) * RADEG;
        let distance = 1.00014 - 0.01671 * g.cos() - 0.00014 * (2.0 * g).cos();

        (lambda, distance)
    }
}

impl SkyBody for Sun {
    fn geocentric_j2000(&self, epoch: &Epoch) -> Result<Vector3<f64>, AirmassError> {
        let tt = epoch.to_mjd_tt_days();
        let (lambda, distance) = Sun::ecliptic_longitude_distance(tt);

        let ecliptic = distance * Vector3::new(lambda.cos(), lambda.sin(), 0.0);
        let of_date = ecliptic_to_equatorial(tt) * ecliptic;

        Ok(precession_from_j2000(tt).transpose() * of_date)
    }
}
