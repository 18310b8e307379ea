//! # Observing sites and facilities
//!
//! This module gathers the **ground-site geometry** the visibility engine needs:
//!
//! - [`ObservingSite`] stores a site code, geodetic coordinates and the precomputed
//!   **geocentric parallax constants** (ρ·cosφ, ρ·sinφ), and places the site in the mean
//!   equatorial frame of date ([`ObservingSite::position_of_date`]).
//! - [`ObservingFacility`] is the seam through which the facility registry hands its sites to
//!   the engine. [`Facility`] is the plain in-memory implementation, built directly or from
//!   configuration ([`SiteDescriptor`]).
//! - [`geodetic_to_parallax`] / [`lat_alt_to_parallax`] convert geodetic latitude and height to
//!   normalized parallax coordinates, accounting for Earth oblateness.
//!
//! ## Units
//!
//! - Longitudes and latitudes: **degrees** (longitude east positive).
//! - Elevation: **meters** above the reference ellipsoid.
//! - Parallax constants: **Earth radii**.
//! - Positions: **AU**.
//!
//! ## Geocentric reference observer
//!
//! [`ObservingSite::geocentric`] builds the site at longitude 0, latitude 0 and elevation
//! `−EARTH_MAJOR_AXIS`. Both parallax constants vanish, so the "topocentric" place seen from it
//! is the geocentric one. Sky arcs are sampled from this observer.
//!
//! ## See also
//! ------------
//! * [`crate::time::gmst`] – Greenwich sidereal time used for the local sidereal time.
//! * [`crate::body::SkyBody`] – Consumes sites to produce topocentric and horizontal places.

use std::collections::BTreeMap;

use hifitime::Epoch;
use nalgebra::Vector3;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::airmass_errors::AirmassError;
use crate::constants::{Degree, Meter, Radian, SiteCode, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS};
use crate::constants::{DPI, ERAU, RADEG};
use crate::time::gmst;

/// MPC code of the geocenter
pub const GEOCENTER_CODE: &str = "500";

/// Site record as supplied by a facility: `{sitecode, longitude, latitude, elevation}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub sitecode: SiteCode,
    pub longitude: Degree,
    pub latitude: Degree,
    #[serde(default)]
    pub elevation: Meter,
}

/// A ground observing site with precomputed geocentric parallax constants.
///
/// Units
/// -----
/// * `longitude`, `latitude`: degrees (longitude east positive).
/// * `elevation`: meters.
/// * `rho_cos_phi`, `rho_sin_phi`: Earth radii (ρ times the trigonometric functions of the
///   geocentric latitude φ).
///
/// See also
/// ------------
/// * [`geodetic_to_parallax`] – Converts geodetic latitude/elevation to (ρ·cosφ, ρ·sinφ).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ObservingSite {
    /// Identifier of the site, keys the tabulated ephemerides.
    pub code: SiteCode,

    /// Geodetic longitude in **degrees** east of Greenwich.
    pub longitude: NotNan<f64>,

    /// Geodetic latitude in **degrees**.
    pub latitude: NotNan<f64>,

    /// Height above the reference ellipsoid in **meters**.
    pub elevation: NotNan<f64>,

    rho_cos_phi: NotNan<f64>,
    rho_sin_phi: NotNan<f64>,
}

impl ObservingSite {
    /// Create a new site from geodetic coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `code`: site code.
    /// * `longitude`: geodetic longitude in **degrees** (east positive).
    /// * `latitude`: geodetic latitude in **degrees**.
    /// * `elevation`: height above the reference ellipsoid in **meters**.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::NaNValue`] if any input is NaN.
    /// * [`AirmassError::InvalidParameter`] if the latitude lies outside [−90°, 90°].
    pub fn new(
        code: impl Into<SiteCode>,
        longitude: Degree,
        latitude: Degree,
        elevation: Meter,
    ) -> Result<ObservingSite, AirmassError> {
        let code = code.into();
        if latitude.abs() > 90.0 {
            return Err(AirmassError::InvalidParameter(format!(
                "latitude of site {code} must lie in [-90, 90], got {latitude}"
            )));
        }

        let (rho_cos_phi, rho_sin_phi) = geodetic_to_parallax(latitude, elevation);

        Ok(ObservingSite {
            code,
            longitude: NotNan::new(longitude)?,
            latitude: NotNan::new(latitude)?,
            elevation: NotNan::new(elevation)?,
            rho_cos_phi: NotNan::new(rho_cos_phi)?,
            rho_sin_phi: NotNan::new(rho_sin_phi)?,
        })
    }

    /// The geocentric reference observer, see the module documentation.
    pub fn geocentric() -> Result<ObservingSite, AirmassError> {
        ObservingSite::new(GEOCENTER_CODE, 0.0, 0.0, -EARTH_MAJOR_AXIS)
    }

    /// Geocentric parallax constants `(ρ·cosφ, ρ·sinφ)` in Earth radii.
    pub fn parallax(&self) -> (f64, f64) {
        (self.rho_cos_phi.into_inner(), self.rho_sin_phi.into_inner())
    }

    /// Geodetic latitude in radians.
    pub fn latitude_rad(&self) -> Radian {
        self.latitude.into_inner() * RADEG
    }

    /// Local mean sidereal time at `epoch`, radians in [0, 2π).
    ///
    /// UTC stands in for UT1.
    pub fn local_sidereal_time(&self, epoch: &Epoch) -> Radian {
        (gmst(epoch.to_mjd_utc_days()) + self.longitude.into_inner() * RADEG).rem_euclid(DPI)
    }

    /// Geocentric position of the site in the mean equatorial frame of date, AU.
    ///
    /// Polar motion and nutation are neglected: the site's body-fixed vector is rotated by the
    /// local sidereal time around the pole.
    pub fn position_of_date(&self, epoch: &Epoch) -> Vector3<f64> {
        let (sin_lst, cos_lst) = self.local_sidereal_time(epoch).sin_cos();
        let (rho_cos_phi, rho_sin_phi) = self.parallax();

        ERAU * Vector3::new(rho_cos_phi * cos_lst, rho_cos_phi * sin_lst, rho_sin_phi)
    }
}

impl TryFrom<&SiteDescriptor> for ObservingSite {
    type Error = AirmassError;

    fn try_from(site: &SiteDescriptor) -> Result<Self, Self::Error> {
        ObservingSite::new(
            site.sitecode.clone(),
            site.longitude,
            site.latitude,
            site.elevation,
        )
    }
}

/// A source of observing sites.
///
/// Implementors are observatories or networks of telescopes; sites are keyed by a site name
/// that is unique within the facility.
pub trait ObservingFacility: Send + Sync {
    /// Facility name, used as the `(facility)` prefix of visibility keys.
    fn name(&self) -> &str;

    /// Sites of the facility, keyed by site name.
    fn observing_sites(&self) -> &BTreeMap<String, ObservingSite>;
}

/// In-memory facility.
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    name: String,
    sites: BTreeMap<String, ObservingSite>,
}

impl Facility {
    pub fn new(
        name: impl Into<String>,
        sites: impl IntoIterator<Item = (String, ObservingSite)>,
    ) -> Self {
        Facility {
            name: name.into(),
            sites: sites.into_iter().collect(),
        }
    }

    /// Build a facility from site descriptors keyed by site name.
    pub fn from_descriptors(
        name: impl Into<String>,
        descriptors: &BTreeMap<String, SiteDescriptor>,
    ) -> Result<Self, AirmassError> {
        let sites = descriptors
            .iter()
            .map(|(site_name, descriptor)| {
                ObservingSite::try_from(descriptor).map(|site| (site_name.clone(), site))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Facility {
            name: name.into(),
            sites,
        })
    }
}

impl ObservingFacility for Facility {
    fn name(&self) -> &str {
        &self.name
    }

    fn observing_sites(&self) -> &BTreeMap<String, ObservingSite> {
        &self.sites
    }
}

/// Convert geodetic latitude (radians) and height (meters) into normalized parallax
/// coordinates.
///
/// Arguments
/// ---------
/// * `lat` - Geodetic latitude of the observer in **radians**.
/// * `height` - Observer's altitude above the reference ellipsoid in **meters**.
///
/// Returns
/// -------
/// A tuple `(rho_cos_phi, rho_sin_phi)`, the observer's distance projected on the equatorial
/// plane and on the polar axis, in Earth equatorial radii.
///
/// Details
/// -------
/// ```text
/// u = atan( (sin φ * (b/a)) / cos φ )
/// ρ_sinφ = (b/a) * sin u + (h/a) * sin φ
/// ρ_cosφ = cos u + (h/a) * cos φ
/// ```
///
/// where `a` and `b` are the Earth's semi-major and semi-minor axes.
pub fn lat_alt_to_parallax(lat: f64, height: f64) -> (f64, f64) {
    let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;

    // parametric latitude
    let u = (lat.sin() * axis_ratio).atan2(lat.cos());

    let rho_sin_phi = axis_ratio * u.sin() + (height / EARTH_MAJOR_AXIS) * lat.sin();
    let rho_cos_phi = u.cos() + (height / EARTH_MAJOR_AXIS) * lat.cos();

    (rho_cos_phi, rho_sin_phi)
}

/// Same as [`lat_alt_to_parallax`] with the latitude in **degrees**.
pub fn geodetic_to_parallax(lat: f64, height: f64) -> (f64, f64) {
    lat_alt_to_parallax(lat.to_radians(), height)
}
