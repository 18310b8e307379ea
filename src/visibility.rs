//! # Airmass sampling
//!
//! ## Overview
//!
//! [`compute_visibility`] samples the airmass of a non-sidereal target from every site of a set
//! of facilities over a [`VisibilityRequest`]. For each site:
//!
//! 1. the night model is built: the Sun's rise/set intervals over the window
//!    ([`compute_rise_sets`]),
//! 2. the target's altitude is computed on a uniform grid, from the orbital model or from the
//!    site's interpolated ephemeris,
//! 3. each altitude becomes an airmass `1 / sin(alt)`, kept only when the Sun is down and
//!    `1 < airmass ≤ limit`; every other sample is `None`.
//!
//! Results are keyed `"(facility) site"` in a [`BTreeMap`]. Sites are independent and
//! processed in parallel with rayon.
//!
//! ## Failure policy
//!
//! Data problems stay local to a site: a site absent from a tabulated ephemeris is left out of
//! the result, and a window that does not overlap the table gives an empty series. Invalid
//! requests, unsupported targets and orbit failures abort the whole computation.
//!
//! ## Sampling grid
//!
//! See [`TimeWindow::grid`]. Tabulated targets are sampled on the interpolated track instead,
//! which is the same grid clamped to the table's span.

use std::collections::BTreeMap;

use hifitime::Epoch;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::ser::{Serialize, Serializer};

use crate::airmass_errors::AirmassError;
use crate::body::{alt_az_from_radec, Body, SkyBody, Target};
use crate::config::{SchemeRegistry, Settings};
use crate::constants::{Airmass, Degree, DEFAULT_AIRMASS_LIMIT};
use crate::observers::{ObservingFacility, ObservingSite};
use crate::rise_set::{compute_rise_sets, RiseSetSeries};
use crate::sun::Sun;
use crate::time::{epoch_to_iso, TimeWindow};

/// Parameters of a visibility computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityRequest {
    pub window: TimeWindow,
    /// Sampling step, minutes
    pub interval_minutes: f64,
    /// Upper airmass bound; `None` or zero falls back to the configured limit
    pub airmass_limit: Option<Airmass>,
}

impl VisibilityRequest {
    pub fn new(window: TimeWindow, interval_minutes: f64, airmass_limit: Option<Airmass>) -> Self {
        VisibilityRequest {
            window,
            interval_minutes,
            airmass_limit,
        }
    }

    /// Build a request from query-string parameters.
    ///
    /// Arguments
    /// -----------------
    /// * `start`, `end`: civil timestamps, see [`crate::time::parse_timestamp`].
    /// * `interval`: sampling step in minutes; absent or blank means
    ///   [`Settings::interval_minutes`].
    /// * `airmass`: airmass limit; absent or blank means no explicit limit.
    /// * `settings`: engine settings supplying the defaults.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::InvalidTimestamp`] / [`AirmassError::InvalidWindow`] for bad bounds.
    /// * [`AirmassError::InvalidParameter`] if a number does not parse or is negative.
    pub fn from_query(
        start: &str,
        end: &str,
        interval: Option<&str>,
        airmass: Option<&str>,
        settings: &Settings,
    ) -> Result<Self, AirmassError> {
        let window = TimeWindow::parse(start, end)?;

        let interval_minutes = match parse_number("interval", interval)? {
            None => settings.interval_minutes,
            Some(value) if value == 0.0 => {
                warn!(
                    "zero sampling interval requested, using {} minutes",
                    settings.interval_minutes
                );
                settings.interval_minutes
            }
            Some(value) => value,
        };

        Ok(VisibilityRequest {
            window,
            interval_minutes,
            airmass_limit: parse_number("airmass", airmass)?,
        })
    }

    /// Request covering the plan length from `now`, sampled at the plan interval.
    pub fn observation_plan(
        now: Epoch,
        airmass_limit: Option<Airmass>,
        settings: &Settings,
    ) -> Result<Self, AirmassError> {
        Ok(VisibilityRequest {
            window: TimeWindow::starting_at(now, settings.plan_length_days)?,
            interval_minutes: settings.plan_interval_minutes,
            airmass_limit,
        })
    }

    /// The airmass limit in force: the request's if strictly positive, else the configured one,
    /// else [`DEFAULT_AIRMASS_LIMIT`].
    pub fn effective_limit(&self, settings: &Settings) -> Airmass {
        self.airmass_limit
            .filter(|limit| *limit > 0.0)
            .or(Some(settings.airmass_limit).filter(|limit| *limit > 0.0))
            .unwrap_or(DEFAULT_AIRMASS_LIMIT)
    }
}

fn parse_number(name: &str, value: Option<&str>) -> Result<Option<f64>, AirmassError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let number: f64 = raw.parse().map_err(|_| {
        AirmassError::InvalidParameter(format!("{name} must be a number, got '{raw}'"))
    })?;
    if !(number >= 0.0) {
        return Err(AirmassError::InvalidParameter(format!(
            "{name} must not be negative, got {number}"
        )));
    }
    Ok(Some(number))
}

/// Airmass samples of one site; `airmass[i]` belongs to `times[i]`.
///
/// Serializes as the pair `[times, airmass]`, times as naive ISO UTC strings and invalid
/// samples as `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirmassSeries {
    pub times: Vec<Epoch>,
    pub airmass: Vec<Option<Airmass>>,
}

impl AirmassSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of valid samples.
    pub fn valid_count(&self) -> usize {
        self.airmass.iter().flatten().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Epoch, Option<Airmass>)> {
        self.times.iter().zip(self.airmass.iter().copied())
    }
}

impl Serialize for AirmassSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let times: Vec<String> = self.times.iter().map(epoch_to_iso).collect();
        (times, &self.airmass).serialize(serializer)
    }
}

/// Secant of the zenith angle for an altitude in degrees.
pub fn airmass_from_altitude(altitude: Degree) -> Airmass {
    1.0 / altitude.to_radians().sin()
}

/// `true` if `airmass` lies in `(1, limit]`.
pub fn is_valid_airmass(airmass: Airmass, limit: Airmass) -> bool {
    airmass > 1.0 && airmass <= limit
}

/// The airmass to record for one sample.
fn night_airmass(altitude: Degree, sun_up: bool, limit: Airmass) -> Option<Airmass> {
    let airmass = airmass_from_altitude(altitude);
    (!sun_up && is_valid_airmass(airmass, limit)).then_some(airmass)
}

/// Key of a site in the visibility mapping.
pub fn site_key(facility: &str, site: &str) -> String {
    format!("({facility}) {site}")
}

/// Compute the airmass of a target from every site of `facilities`.
///
/// Arguments
/// -----------------
/// * `target`: a non-sidereal target.
/// * `facilities`: the facilities whose sites are sampled.
/// * `request`: window, sampling step and airmass limit.
/// * `schemes`: the scheme → handler registry resolving the target.
/// * `settings`: engine settings (rise/set search, default limit).
///
/// Return
/// ----------
/// * The airmass series of each site, keyed `"(facility) site"`. Sites absent from a
///   tabulated ephemeris are left out.
///
/// Errors
/// ----------
/// * [`AirmassError::UnsupportedObjectType`] / [`AirmassError::UnknownScheme`] if the target
///   cannot be resolved into a positional model.
/// * [`AirmassError::InvalidParameter`] if the sampling interval is not strictly positive.
/// * [`AirmassError::InvalidConfiguration`] if `settings` do not validate.
/// * Orbit model failures.
pub fn compute_visibility<F: ObservingFacility>(
    target: &Target,
    facilities: &[F],
    request: &VisibilityRequest,
    schemes: &SchemeRegistry,
    settings: &Settings,
) -> Result<BTreeMap<String, AirmassSeries>, AirmassError> {
    settings.validate()?;
    if !(request.interval_minutes > 0.0) {
        return Err(AirmassError::InvalidParameter(format!(
            "sampling interval must be strictly positive, got {} minutes",
            request.interval_minutes
        )));
    }

    let body = Body::for_target(target, schemes)?;
    let limit = request.effective_limit(settings);

    let sites: Vec<(String, &ObservingSite)> = facilities
        .iter()
        .flat_map(|facility| {
            facility
                .observing_sites()
                .iter()
                .map(move |(name, site)| (site_key(facility.name(), name), site))
        })
        .collect();

    let visibility = sites
        .par_iter()
        .map(|(key, site)| {
            site_visibility(&body, site, request, limit, settings)
                .map(|series| series.map(|series| (key.clone(), series)))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect::<BTreeMap<_, _>>();

    info!(
        "visibility of {} computed for {} of {} sites",
        target.name,
        visibility.len(),
        sites.len()
    );

    Ok(visibility)
}

/// Airmass series of one site, `None` if the site has no ephemeris.
fn site_visibility(
    body: &Body,
    site: &ObservingSite,
    request: &VisibilityRequest,
    limit: Airmass,
    settings: &Settings,
) -> Result<Option<AirmassSeries>, AirmassError> {
    match body {
        Body::Orbital(elements) => {
            let night = compute_rise_sets(site, &Sun, &request.window, settings)?;
            let times = request.window.grid(request.interval_minutes)?;
            let airmass = sample(&times, &night, limit, |epoch| {
                elements.alt_az(site, epoch).map(|(alt, _)| alt)
            })?;
            Ok(Some(AirmassSeries { times, airmass }))
        }
        Body::Tabulated(table) => {
            let Some(track) = table.interpolate(&site.code, &request.window, request.interval_minutes)?
            else {
                debug!("no ephemeris for site {}, skipped", site.code);
                return Ok(None);
            };
            if track.is_empty() {
                debug!("ephemeris of site {} does not overlap the window", site.code);
                return Ok(Some(AirmassSeries::default()));
            }

            let night = compute_rise_sets(site, &Sun, &request.window, settings)?;
            let times = track.epochs();
            let airmass = times
                .iter()
                .zip(track.ra.iter().zip(&track.dec))
                .map(|(epoch, (&ra, &dec))| {
                    let (alt, _) = alt_az_from_radec(site, epoch, ra, dec);
                    night_airmass(alt, night.is_up(epoch), limit)
                })
                .collect();
            Ok(Some(AirmassSeries { times, airmass }))
        }
    }
}

fn sample(
    times: &[Epoch],
    night: &RiseSetSeries,
    limit: Airmass,
    altitude: impl Fn(&Epoch) -> Result<Degree, AirmassError>,
) -> Result<Vec<Option<Airmass>>, AirmassError> {
    times
        .iter()
        .map(|epoch| Ok(night_airmass(altitude(epoch)?, night.is_up(epoch), limit)))
        .collect()
}
