//! # Tabulated ephemerides
//!
//! ## Overview
//!
//! Objects following the tabulated scheme carry, for each site code, a time-tagged list of
//! topocentric `(RA, Dec)` positions, serialized as JSON:
//!
//! ```json
//! {"ogg": [{"t": 59000.0, "R": 123.4, "D": -5.6}, {"t": 59000.5, "R": 123.9, "D": -5.4}]}
//! ```
//!
//! with `t` in MJD (UTC) and angles in degrees. [`EphemerisTable`] holds the parsed table with
//! every site's samples sorted by time, and resamples a site onto a uniform grid by linear
//! interpolation ([`EphemerisTable::interpolate`]).
//!
//! ## Interpolation rules
//!
//! - The requested window is **clamped** to the span of the table; values are never
//!   extrapolated.
//! - RA and Dec are interpolated independently. RA is unwrapped across the 0°/360° seam and the
//!   result normalized to [0°, 360°).
//! - A clamped span of zero or negative length yields an empty track.
//!
//! ## See also
//! ------------
//! * [`crate::visibility::compute_visibility`] – Samples airmass along interpolated tracks.
//! * [`crate::arc::compute_arc`] – Resamples the first site's table to draw a sky arc.

use std::collections::BTreeMap;

use hifitime::Epoch;
use itertools::{izip, Itertools};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::airmass_errors::AirmassError;
use crate::constants::{Degree, SiteCode, MJD};
use crate::time::{mjd_grid, TimeWindow};

/// One tabulated position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSample {
    /// Epoch, MJD (UTC)
    #[serde(rename = "t")]
    pub mjd: MJD,
    /// Right ascension, degrees
    #[serde(rename = "R")]
    pub ra: Degree,
    /// Declination, degrees
    #[serde(rename = "D")]
    pub dec: Degree,
}

/// Positions resampled on a uniform grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolatedTrack {
    pub mjd: Vec<MJD>,
    pub ra: Vec<Degree>,
    pub dec: Vec<Degree>,
}

impl InterpolatedTrack {
    pub fn len(&self) -> usize {
        self.mjd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mjd.is_empty()
    }

    /// Grid instants as UTC epochs.
    pub fn epochs(&self) -> Vec<Epoch> {
        self.mjd.iter().map(|&mjd| Epoch::from_mjd_utc(mjd)).collect()
    }

    /// Iterate over `(mjd, ra, dec)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (MJD, Degree, Degree)> + '_ {
        izip!(&self.mjd, &self.ra, &self.dec).map(|(&t, &ra, &dec)| (t, ra, dec))
    }

    fn from_samples(samples: &[EphemerisSample]) -> Self {
        InterpolatedTrack {
            mjd: samples.iter().map(|s| s.mjd).collect(),
            ra: samples.iter().map(|s| s.ra).collect(),
            dec: samples.iter().map(|s| s.dec).collect(),
        }
    }
}

/// Per-site tabulated ephemeris, samples sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<SiteCode, Vec<EphemerisSample>>")]
#[serde(into = "BTreeMap<SiteCode, Vec<EphemerisSample>>")]
pub struct EphemerisTable {
    sites: BTreeMap<SiteCode, Vec<EphemerisSample>>,
}

impl From<BTreeMap<SiteCode, Vec<EphemerisSample>>> for EphemerisTable {
    fn from(mut sites: BTreeMap<SiteCode, Vec<EphemerisSample>>) -> Self {
        for (code, samples) in sites.iter_mut() {
            if !samples.iter().tuple_windows().all(|(a, b)| a.mjd <= b.mjd) {
                warn!("ephemeris samples for site {code} are not time-ordered, sorting them");
                samples.sort_by(|a, b| a.mjd.total_cmp(&b.mjd));
            }
        }
        EphemerisTable { sites }
    }
}

impl From<EphemerisTable> for BTreeMap<SiteCode, Vec<EphemerisSample>> {
    fn from(table: EphemerisTable) -> Self {
        table.sites
    }
}

impl EphemerisTable {
    /// Parse the JSON serialization of a table.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::EphemerisParse`] if the document does not follow the
    ///   `{"<site>": [{"t", "R", "D"}, ...]}` layout.
    pub fn from_json(json: &str) -> Result<Self, AirmassError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AirmassError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Site codes in lexicographic order.
    pub fn site_codes(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    pub fn samples(&self, site_code: &str) -> Option<&[EphemerisSample]> {
        self.sites.get(site_code).map(Vec::as_slice)
    }

    /// Time span `(first, last)` of a site's samples, MJD.
    pub fn span(&self, site_code: &str) -> Option<(MJD, MJD)> {
        let samples = self.samples(site_code)?;
        Some((samples.first()?.mjd, samples.last()?.mjd))
    }

    /// Interpolated position of a site at `mjd`, `None` outside the tabulated span.
    pub fn position_at(&self, site_code: &str, mjd: MJD) -> Option<(Degree, Degree)> {
        let samples = self.samples(site_code)?;
        let (first, last) = (samples.first()?, samples.last()?);
        if mjd < first.mjd || mjd > last.mjd {
            return None;
        }
        Some(interpolate_at(samples, mjd))
    }

    /// Resample a site's positions over a time window.
    ///
    /// Arguments
    /// -----------------
    /// * `site_code`: site whose table is used.
    /// * `window`: requested window, clamped to the site's span.
    /// * `interval_minutes`: grid step, strictly positive.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` if the table has no samples for the site.
    /// * `Ok(Some(track))` otherwise; the track is empty when the clamped span is degenerate.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::InvalidParameter`] if `interval_minutes` is not strictly positive.
    pub fn interpolate(
        &self,
        site_code: &str,
        window: &TimeWindow,
        interval_minutes: f64,
    ) -> Result<Option<InterpolatedTrack>, AirmassError> {
        let (start, end) = window.mjd_bounds();
        self.resample(site_code, start, end, interval_minutes)
    }

    /// Same as [`EphemerisTable::interpolate`], with the two data problems reported as errors.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::MissingEphemerisSite`] if the table has no samples for the site.
    /// * [`AirmassError::DegenerateInterpolationSpan`] if the clamped span is empty.
    pub fn interpolate_strict(
        &self,
        site_code: &str,
        window: &TimeWindow,
        interval_minutes: f64,
    ) -> Result<InterpolatedTrack, AirmassError> {
        let (start, end) = window.mjd_bounds();
        let (min, max) = self
            .clamped_span(site_code, start, end)
            .ok_or_else(|| AirmassError::MissingEphemerisSite(site_code.to_string()))?;

        if min >= max {
            return Err(AirmassError::DegenerateInterpolationSpan {
                site: site_code.to_string(),
                min,
                max,
            });
        }

        self.resample(site_code, start, end, interval_minutes)?
            .ok_or_else(|| AirmassError::MissingEphemerisSite(site_code.to_string()))
    }

    /// Resample a site's positions over `[lo, hi]` (MJD) clamped to the site's span.
    pub(crate) fn resample(
        &self,
        site_code: &str,
        lo: MJD,
        hi: MJD,
        interval_minutes: f64,
    ) -> Result<Option<InterpolatedTrack>, AirmassError> {
        let Some(samples) = self.samples(site_code).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let Some((min, max)) = self.clamped_span(site_code, lo, hi) else {
            return Ok(None);
        };

        if min >= max {
            return Ok(Some(InterpolatedTrack::default()));
        }

        let grid = mjd_grid(min, max, interval_minutes)?;
        let (ra, dec): (Vec<_>, Vec<_>) = grid
            .iter()
            .map(|&mjd| interpolate_at(samples, mjd))
            .unzip();

        Ok(Some(InterpolatedTrack { mjd: grid, ra, dec }))
    }

    /// The whole table of a site as a track.
    pub(crate) fn full_track(&self, site_code: &str) -> Option<InterpolatedTrack> {
        self.samples(site_code).map(InterpolatedTrack::from_samples)
    }

    fn clamped_span(&self, site_code: &str, lo: MJD, hi: MJD) -> Option<(MJD, MJD)> {
        let (first, last) = self.span(site_code)?;
        Some((first.max(lo), last.min(hi)))
    }
}

/// Linear interpolation of RA/Dec at `mjd`, which must lie within the samples' span.
fn interpolate_at(samples: &[EphemerisSample], mjd: MJD) -> (Degree, Degree) {
    // index of the first sample strictly after mjd
    let upper = samples.partition_point(|s| s.mjd <= mjd);
    if upper == 0 {
        return (samples[0].ra, samples[0].dec);
    }
    if upper == samples.len() {
        let last = samples[upper - 1];
        return (last.ra, last.dec);
    }

    let (a, b) = (samples[upper - 1], samples[upper]);
    let dt = b.mjd - a.mjd;
    if dt <= 0.0 {
        return (a.ra, a.dec);
    }
    let f = (mjd - a.mjd) / dt;

    let delta_ra = (b.ra - a.ra + 180.0).rem_euclid(360.0) - 180.0;
    let ra = (a.ra + f * delta_ra).rem_euclid(360.0);
    let dec = a.dec + f * (b.dec - a.dec);

    (ra, dec)
}
