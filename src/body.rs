//! # Targets and sky bodies
//!
//! ## Overview
//!
//! A [`Target`] is the record handed over by the target store: a name, a [`TargetType`], the
//! name of the scheme its data follows, orbital element fields and, for tabulated objects, a
//! serialized ephemeris. [`Body::for_target`] resolves it once into a positional model:
//!
//! - [`Body::Orbital`]: two-body Keplerian elements ([`KeplerianElements`]),
//! - [`Body::Tabulated`]: per-site `(time, RA, Dec)` tables ([`EphemerisTable`]).
//!
//! [`SkyBody`] is the common seam of everything with a computable geocentric position
//! (orbital elements and the [`Sun`](crate::sun::Sun)). Its provided methods derive
//! topocentric, astrometric and horizontal places from that single vector.
//!
//! ## Frames
//!
//! ```text
//! geocentric J2000 --(precession)--> equator of date --(− site vector)--> topocentric of date
//!                                                                     \--(hour angle)--> alt/az
//! ```
//!
//! Refraction is not modeled: altitudes are geometric.

use hifitime::{Duration, Epoch};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::airmass_errors::AirmassError;
use crate::config::{SchemeKind, SchemeRegistry};
use crate::constants::{Degree, RADEG, VLIGHT_AU};
use crate::ephemeris::EphemerisTable;
use crate::keplerian_element::{KeplerianElements, OrbitalElementFields};
use crate::observers::ObservingSite;
use crate::ref_system::{
    cartesian_to_radec, equatorial_to_horizontal, precession_from_j2000, radec_to_unit,
};
use crate::sun::Sun;

/// Number of light-time iterations for orbital bodies
const LIGHT_TIME_ITERATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Sidereal,
    NonSidereal,
}

/// Target descriptor as stored by the target database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    /// Scheme of the orbital data, e.g. `MPC_MINOR_PLANET` or `EPHEMERIS`
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(flatten)]
    pub elements: OrbitalElementFields,
    /// Serialized ephemeris table, see [`EphemerisTable::from_json`]
    #[serde(default)]
    pub eph_json: Option<String>,
    /// Fixed position of sidereal targets, degrees
    #[serde(default)]
    pub ra: Option<Degree>,
    #[serde(default)]
    pub dec: Option<Degree>,
}

impl Target {
    /// A non-sidereal target carrying orbital elements.
    pub fn orbital(
        name: impl Into<String>,
        scheme: impl Into<String>,
        elements: OrbitalElementFields,
    ) -> Self {
        Target {
            name: name.into(),
            target_type: TargetType::NonSidereal,
            scheme: Some(scheme.into()),
            elements,
            eph_json: None,
            ra: None,
            dec: None,
        }
    }

    /// A non-sidereal target carrying a serialized ephemeris.
    pub fn tabulated(
        name: impl Into<String>,
        scheme: impl Into<String>,
        eph_json: impl Into<String>,
    ) -> Self {
        Target {
            name: name.into(),
            target_type: TargetType::NonSidereal,
            scheme: Some(scheme.into()),
            elements: OrbitalElementFields::default(),
            eph_json: Some(eph_json.into()),
            ra: None,
            dec: None,
        }
    }

    /// A sidereal target at a fixed position.
    pub fn sidereal(name: impl Into<String>, ra: Degree, dec: Degree) -> Self {
        Target {
            name: name.into(),
            target_type: TargetType::Sidereal,
            scheme: None,
            elements: OrbitalElementFields::default(),
            eph_json: None,
            ra: Some(ra),
            dec: Some(dec),
        }
    }

    pub fn is_non_sidereal(&self) -> bool {
        self.target_type == TargetType::NonSidereal
    }
}

/// Something with a computable geocentric position.
///
/// Implementors only provide [`SkyBody::geocentric_j2000`]; every other place is derived from
/// it. Angles returned by the provided methods are in degrees.
pub trait SkyBody {
    /// Geocentric position at `epoch` in the J2000 mean equatorial frame, AU.
    fn geocentric_j2000(&self, epoch: &Epoch) -> Result<Vector3<f64>, AirmassError>;

    /// Topocentric position in the mean equatorial frame of date, AU.
    fn topocentric_of_date(
        &self,
        site: &ObservingSite,
        epoch: &Epoch,
    ) -> Result<Vector3<f64>, AirmassError> {
        let precession = precession_from_j2000(epoch.to_mjd_tt_days());
        Ok(precession * self.geocentric_j2000(epoch)? - site.position_of_date(epoch))
    }

    /// Topocentric right ascension and declination, J2000 frame.
    fn topocentric_radec(
        &self,
        site: &ObservingSite,
        epoch: &Epoch,
    ) -> Result<(Degree, Degree), AirmassError> {
        let precession = precession_from_j2000(epoch.to_mjd_tt_days());
        let j2000 = precession.transpose() * self.topocentric_of_date(site, epoch)?;
        let (ra, dec, _) = cartesian_to_radec(&j2000);
        Ok((ra / RADEG, dec / RADEG))
    }

    /// Astrometric right ascension and declination, J2000 frame.
    ///
    /// Light time is accounted for by the implementor; with
    /// [`ObservingSite::geocentric`] this is the geocentric astrometric place.
    fn astrometric_radec(
        &self,
        site: &ObservingSite,
        epoch: &Epoch,
    ) -> Result<(Degree, Degree), AirmassError> {
        self.topocentric_radec(site, epoch)
    }

    /// Geometric altitude and azimuth (North through East).
    fn alt_az(&self, site: &ObservingSite, epoch: &Epoch) -> Result<(Degree, Degree), AirmassError> {
        Ok(horizontal_coordinates(
            site,
            epoch,
            &self.topocentric_of_date(site, epoch)?,
        ))
    }
}

/// Altitude and azimuth, degrees, of a direction given in the mean equatorial frame of date.
pub fn horizontal_coordinates(
    site: &ObservingSite,
    epoch: &Epoch,
    direction_of_date: &Vector3<f64>,
) -> (Degree, Degree) {
    let (ra, dec, _) = cartesian_to_radec(direction_of_date);
    let hour_angle = site.local_sidereal_time(epoch) - ra;
    let (alt, az) = equatorial_to_horizontal(hour_angle, dec, site.latitude_rad());
    (alt / RADEG, az / RADEG)
}

/// Altitude and azimuth, degrees, of a J2000 position `(ra, dec)` in degrees seen from `site`.
///
/// The position is taken as already topocentric, which is how site-specific ephemerides are
/// tabulated.
pub fn alt_az_from_radec(site: &ObservingSite, epoch: &Epoch, ra: Degree, dec: Degree) -> (Degree, Degree) {
    let precession = precession_from_j2000(epoch.to_mjd_tt_days());
    let direction = precession * radec_to_unit(ra * RADEG, dec * RADEG);
    horizontal_coordinates(site, epoch, &direction)
}

impl SkyBody for KeplerianElements {
    /// Light-time corrected geocentric position: the body is taken where it was when the light
    /// reaching the Earth at `epoch` left it.
    fn geocentric_j2000(&self, epoch: &Epoch) -> Result<Vector3<f64>, AirmassError> {
        let tt = epoch.to_mjd_tt_days();
        let sun = Sun.geocentric_j2000(epoch)?;

        let mut geocentric = self.heliocentric_j2000(tt)? + sun;
        for _ in 0..LIGHT_TIME_ITERATIONS {
            let light_time = geocentric.norm() / VLIGHT_AU;
            geocentric = self.heliocentric_j2000(tt - light_time)? + sun;
        }
        Ok(geocentric)
    }
}

/// Positional model of a non-sidereal target.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Orbital(KeplerianElements),
    Tabulated(EphemerisTable),
}

impl Body {
    /// Resolve a target into its positional model.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: the target descriptor.
    /// * `schemes`: the scheme → handler registry.
    ///
    /// Return
    /// ----------
    /// * The [`Body`] matching the handler registered for the target's scheme.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::UnsupportedObjectType`] for sidereal targets, targets without a scheme
    ///   and tabulated targets without an ephemeris.
    /// * [`AirmassError::UnknownScheme`] if no handler is registered for the scheme.
    /// * [`AirmassError::InvalidOrbit`] / [`AirmassError::EphemerisParse`] for malformed data.
    pub fn for_target(target: &Target, schemes: &SchemeRegistry) -> Result<Body, AirmassError> {
        if !target.is_non_sidereal() {
            return Err(AirmassError::UnsupportedObjectType(format!(
                "{} is sidereal",
                target.name
            )));
        }
        let scheme = target.scheme.as_deref().ok_or_else(|| {
            AirmassError::UnsupportedObjectType(format!("{} has no orbital scheme", target.name))
        })?;

        match schemes.resolve(scheme)? {
            SchemeKind::Orbital => Ok(Body::Orbital(KeplerianElements::try_from(
                &target.elements,
            )?)),
            SchemeKind::Tabulated => {
                let eph_json = target.eph_json.as_deref().ok_or_else(|| {
                    AirmassError::UnsupportedObjectType(format!(
                        "{} follows the {scheme} scheme but carries no ephemeris",
                        target.name
                    ))
                })?;
                Ok(Body::Tabulated(EphemerisTable::from_json(eph_json)?))
            }
        }
    }
}

/// Advance `epoch` by a number of days.
pub(crate) fn shift_days(epoch: &Epoch, days: f64) -> Epoch {
    *epoch + Duration::from_days(days)
}
