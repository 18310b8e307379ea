//! # Time handling
//!
//! Instants are carried as [`hifitime::Epoch`] values in the UTC scale. Request timestamps are
//! civil, timezone-naive strings (`YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` or a bare date)
//! and are interpreted as UTC.
//!
//! This module provides:
//!
//! - [`parse_timestamp`] and [`epoch_to_iso`] to move between strings and epochs,
//! - [`jd_to_mjd`] / [`mjd_to_jd`] scalar conversions,
//! - [`gmst`] for the sidereal time needed by every horizontal-coordinate computation,
//! - [`TimeWindow`], the validated `[start, end]` pair and its uniform sampling grid.

use hifitime::{Duration, Epoch};
use std::str::FromStr;

use crate::airmass_errors::AirmassError;
use crate::constants::{DPI, JDTOMJD, MINUTES_PER_DAY, MJD, SIDEREAL_RATE, T2000};

/// Parse a civil timestamp into a UTC [`Epoch`].
///
/// Accepted layouts are the ISO form `2024-01-01T00:00:00` (fractional seconds allowed),
/// the same with a blank separator `2024-01-01 00:00:00`, and a bare date `2024-01-01`
/// (midnight). Strings carrying an explicit time scale (`... UTC`, `... TT`) are handed to
/// hifitime unchanged.
///
/// Arguments
/// -----------------
/// * `value`: the timestamp string.
///
/// Return
/// ----------
/// * The corresponding [`Epoch`], or [`AirmassError::InvalidTimestamp`] if hifitime rejects it.
pub fn parse_timestamp(value: &str) -> Result<Epoch, AirmassError> {
    let trimmed = value.trim();

    let normalized = if trimmed.len() == 10 {
        format!("{trimmed}T00:00:00")
    } else if trimmed.len() > 10 && trimmed.as_bytes()[10] == b' ' {
        format!("{}T{}", &trimmed[..10], &trimmed[11..])
    } else {
        trimmed.to_string()
    };

    Ok(Epoch::from_str(&normalized)?)
}

/// Format an epoch as a naive ISO timestamp in UTC, `YYYY-MM-DDTHH:MM:SS`.
pub fn epoch_to_iso(epoch: &Epoch) -> String {
    let (y, m, d, h, min, s, _) = epoch.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02}T{h:02}:{min:02}:{s:02}")
}

/// Transformation from julian date (JD) in modified julian date (MJD)
pub fn jd_to_mjd(jd: f64) -> MJD {
    jd - JDTOMJD
}

/// Transformation from modified julian date (MJD) in julian date (JD)
pub fn mjd_to_jd(mjd: MJD) -> f64 {
    mjd + JDTOMJD
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale). UTC is an adequate
///   substitute at the precision targeted by this crate (|UT1 − UTC| < 0.9 s).
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # Details
/// The GMST is computed in two steps:
/// 1. Use a cubic polynomial (coefficients C0–C3) to get GMST at 0h UT1
///    in seconds for the given date.
/// 2. Add the contribution of Earth's rotation during the fractional day
///    using the factor [`SIDEREAL_RATE`], which converts solar days to sidereal days.
///
/// # References
/// * IAU 1982, IERS Conventions 1996/2000.
/// * Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(tjm: f64) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Extract the integer MJD (0h UT1) and compute centuries since J2000.0
    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    // GMST at 0h UT1, seconds → radians
    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    // Rotation accumulated during the fraction of the day
    let h = (tjm - itjm) * DPI;

    (gmst0 + h * SIDEREAL_RATE).rem_euclid(DPI)
}

/// A validated `[start, end]` time window, both bounds in UTC.
///
/// The invariant `end >= start` is enforced at construction: a reversed window is an
/// error, never silently swapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: Epoch,
    end: Epoch,
}

impl TimeWindow {
    /// Build a window from two epochs.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::InvalidWindow`] if `end < start`.
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, AirmassError> {
        if end < start {
            return Err(AirmassError::InvalidWindow {
                start: epoch_to_iso(&start),
                end: epoch_to_iso(&end),
            });
        }
        Ok(TimeWindow { start, end })
    }

    /// Build a window from two civil timestamps, see [`parse_timestamp`].
    pub fn parse(start: &str, end: &str) -> Result<Self, AirmassError> {
        TimeWindow::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Build a window of `length_days` starting at `start`.
    pub fn starting_at(start: Epoch, length_days: f64) -> Result<Self, AirmassError> {
        TimeWindow::new(start, start + Duration::from_days(length_days))
    }

    pub fn start(&self) -> Epoch {
        self.start
    }

    pub fn end(&self) -> Epoch {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Window bounds expressed in MJD (UTC).
    pub fn mjd_bounds(&self) -> (MJD, MJD) {
        (self.start.to_mjd_utc_days(), self.end.to_mjd_utc_days())
    }

    /// `true` if `epoch` lies within the closed window.
    pub fn contains(&self, epoch: &Epoch) -> bool {
        *epoch >= self.start && *epoch <= self.end
    }

    /// Uniform sampling grid from `start` to `end` at `interval_minutes` spacing.
    ///
    /// The grid always starts at `start`. The last sample is `end` itself when the window
    /// length is an exact multiple of the interval, otherwise the last grid point before
    /// `end`; no partial step beyond it is emitted. Samples are computed as
    /// `start + k·interval` so rounding does not accumulate along the grid.
    ///
    /// Arguments
    /// -----------------
    /// * `interval_minutes`: strictly positive sampling step in minutes.
    ///
    /// Return
    /// ----------
    /// * The ordered list of sampling epochs, or [`AirmassError::InvalidParameter`] when the
    ///   step is not strictly positive.
    pub fn grid(&self, interval_minutes: f64) -> Result<Vec<Epoch>, AirmassError> {
        let n_samples = sample_count(
            self.duration().to_seconds() / 60.0,
            interval_minutes,
        )?;
        let step_seconds = interval_minutes * 60.0;

        Ok((0..n_samples)
            .map(|k| self.start + Duration::from_seconds(step_seconds * k as f64))
            .collect())
    }
}

/// Uniform MJD grid over `[lo, hi]` at `interval_minutes` spacing, same endpoint policy as
/// [`TimeWindow::grid`].
pub(crate) fn mjd_grid(lo: MJD, hi: MJD, interval_minutes: f64) -> Result<Vec<MJD>, AirmassError> {
    let n_samples = sample_count((hi - lo) * MINUTES_PER_DAY, interval_minutes)?;
    let step_days = interval_minutes / MINUTES_PER_DAY;

    Ok((0..n_samples).map(|k| lo + step_days * k as f64).collect())
}

/// Number of samples of a closed span of `span_minutes` stepped by `interval_minutes`.
fn sample_count(span_minutes: f64, interval_minutes: f64) -> Result<usize, AirmassError> {
    if !(interval_minutes > 0.0) {
        return Err(AirmassError::InvalidParameter(format!(
            "sampling interval must be strictly positive, got {interval_minutes} minutes"
        )));
    }
    if span_minutes < 0.0 {
        return Ok(0);
    }

    // a relative tolerance keeps exact multiples inclusive despite float rounding
    let steps = (span_minutes / interval_minutes + 1e-9).floor();
    Ok(steps as usize + 1)
}
