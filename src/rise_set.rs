//! # Rise/set intervals and the day/night classifier
//!
//! ## Overview
//!
//! [`compute_rise_sets`] lists the intervals during which a body (in practice the
//! [`Sun`](crate::sun::Sun)) is above the horizon of a site over a time window. The result, a
//! [`RiseSetSeries`], is time-ordered and non-overlapping, and answers "is the body up at
//! `t`?" by binary search ([`RiseSetSeries::is_up`]).
//!
//! ## Series construction
//!
//! 1. Starting from `window.start`, the previous setting and previous rising are searched
//!    backward. If the rising is the more recent one the body is already up: the interval
//!    `(previous rising, next setting)` is emitted and the cursor moves one second past that
//!    setting.
//! 2. Then, repeatedly, the next rising after the cursor is searched. A rising strictly inside
//!    `(cursor, window.end)` emits `(rising, following setting)`; the cursor moves one second
//!    past that setting until it reaches `window.end`.
//!
//! Intervals may therefore start before `window.start` and end after `window.end`.
//!
//! ## Events
//!
//! An event is a crossing of the body's geometric altitude through the horizon altitude `h0`
//! ([`Settings::sun_horizon_deg`], −0.8333° by default: upper limb on the horizon with
//! standard refraction). Crossings are bracketed by a coarse scan
//! ([`Settings::scan_step_minutes`]) and refined by bisection below one second. Searches never
//! go further than [`Settings::search_horizon_days`] beyond the window:
//!
//! - a body that stays up (circumpolar) gets one interval spanning the whole search bound,
//! - a body that never rises gets no interval.

use hifitime::{Duration, Epoch};
use log::debug;

use crate::airmass_errors::AirmassError;
use crate::body::SkyBody;
use crate::config::Settings;
use crate::constants::Degree;
use crate::observers::ObservingSite;
use crate::time::TimeWindow;

/// Bisection stops once the bracket is shorter than this, seconds
const EVENT_PRECISION_SECONDS: f64 = 0.5;

/// One period above the horizon, `rise < set`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiseSetInterval {
    pub rise: Epoch,
    pub set: Epoch,
}

impl RiseSetInterval {
    /// `true` if `epoch` lies strictly inside the interval.
    pub fn contains(&self, epoch: &Epoch) -> bool {
        self.rise < *epoch && *epoch < self.set
    }
}

/// Time-ordered, non-overlapping rise/set intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiseSetSeries {
    intervals: Vec<RiseSetInterval>,
}

impl RiseSetSeries {
    /// Build a series, ordering the intervals by rise time.
    pub fn new(mut intervals: Vec<RiseSetInterval>) -> Self {
        intervals.sort_by_key(|iv| iv.rise);
        RiseSetSeries { intervals }
    }

    pub fn intervals(&self) -> &[RiseSetInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Whether the body is up at `epoch`.
    ///
    /// The interval with the greatest rise not after `epoch` is located by binary search; the
    /// body is up iff `epoch` lies strictly inside it. Before the first rise, and after the
    /// last set, the body is down. O(log n).
    pub fn is_up(&self, epoch: &Epoch) -> bool {
        let idx = self.intervals.partition_point(|iv| iv.rise <= *epoch);
        idx > 0 && self.intervals[idx - 1].contains(epoch)
    }

    /// The interval of the last rise strictly before `epoch`.
    pub fn last_rise_set_pair(&self, epoch: &Epoch) -> Option<&RiseSetInterval> {
        let idx = self.intervals.partition_point(|iv| iv.rise < *epoch);
        idx.checked_sub(1).map(|i| &self.intervals[i])
    }

    /// The interval of the first rise at or after `epoch`.
    pub fn next_rise_set_pair(&self, epoch: &Epoch) -> Option<&RiseSetInterval> {
        let idx = self.intervals.partition_point(|iv| iv.rise < *epoch);
        self.intervals.get(idx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crossing {
    Rising,
    Setting,
}

impl Crossing {
    /// `true` if `height` (altitude minus horizon) is on the side the crossing leads to.
    fn reached(self, height: f64) -> bool {
        match self {
            Crossing::Rising => height > 0.0,
            Crossing::Setting => height <= 0.0,
        }
    }

    fn between(self, before: f64, after: f64) -> bool {
        !self.reached(before) && self.reached(after)
    }
}

/// Horizon crossing search for one body at one site.
struct HorizonSearch<'a, B: SkyBody + ?Sized> {
    body: &'a B,
    site: &'a ObservingSite,
    horizon: Degree,
    step: Duration,
}

impl<B: SkyBody + ?Sized> HorizonSearch<'_, B> {
    /// Altitude above the horizon altitude, degrees.
    fn height(&self, epoch: &Epoch) -> Result<f64, AirmassError> {
        let (alt, _) = self.body.alt_az(self.site, epoch)?;
        Ok(alt - self.horizon)
    }

    /// First crossing after `from`, not later than `limit`.
    fn next(&self, kind: Crossing, from: Epoch, limit: Epoch) -> Result<Option<Epoch>, AirmassError> {
        let mut t0 = from;
        let mut h0 = self.height(&t0)?;

        while t0 < limit {
            let t1 = if t0 + self.step < limit { t0 + self.step } else { limit };
            let h1 = self.height(&t1)?;
            if kind.between(h0, h1) {
                return self.refine(kind, t0, t1).map(Some);
            }
            t0 = t1;
            h0 = h1;
        }
        Ok(None)
    }

    /// Last crossing before `from`, not earlier than `limit`.
    fn previous(
        &self,
        kind: Crossing,
        from: Epoch,
        limit: Epoch,
    ) -> Result<Option<Epoch>, AirmassError> {
        let mut t1 = from;
        let mut h1 = self.height(&t1)?;

        while t1 > limit {
            let t0 = if t1 - self.step > limit { t1 - self.step } else { limit };
            let h0 = self.height(&t0)?;
            if kind.between(h0, h1) {
                return self.refine(kind, t0, t1).map(Some);
            }
            t1 = t0;
            h1 = h0;
        }
        Ok(None)
    }

    /// Bisect a bracket `[before, after]` of a crossing down to the event precision.
    ///
    /// Returns the first instant found on the far side of the crossing.
    fn refine(&self, kind: Crossing, before: Epoch, after: Epoch) -> Result<Epoch, AirmassError> {
        let precision = Duration::from_seconds(EVENT_PRECISION_SECONDS);
        let (mut lo, mut hi) = (before, after);

        while hi - lo > precision {
            let mid = lo + (hi - lo) * 0.5;
            if kind.reached(self.height(&mid)?) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }
}

/// Compute the rise/set intervals of `body` seen from `site` over `window`.
///
/// Arguments
/// -----------------
/// * `site`: the observing site.
/// * `body`: the reference body, usually the Sun.
/// * `window`: the time window.
/// * `settings`: horizon altitude, scan step and search bound.
///
/// Return
/// ----------
/// * A [`RiseSetSeries`]. If the body is up at `window.start` the first interval rises at or
///   before it; if up at `window.end` the last one sets at or after it.
///
/// Errors
/// ----------
/// * [`AirmassError::InvalidConfiguration`] if `settings` do not validate.
/// * Errors of the body's position model.
pub fn compute_rise_sets<B: SkyBody + ?Sized>(
    site: &ObservingSite,
    body: &B,
    window: &TimeWindow,
    settings: &Settings,
) -> Result<RiseSetSeries, AirmassError> {
    settings.validate()?;

    let search = HorizonSearch {
        body,
        site,
        horizon: settings.sun_horizon_deg,
        step: Duration::from_seconds(settings.scan_step_minutes * 60.0),
    };
    let bound = Duration::from_days(settings.search_horizon_days);
    let one_second = Duration::from_seconds(1.0);

    let (start, end) = (window.start(), window.end());
    let set_limit = end + bound;

    let previous_setting = search.previous(Crossing::Setting, start, start - bound)?;
    let previous_rising = search.previous(Crossing::Rising, start, start - bound)?;

    let up_at_start = match (previous_rising, previous_setting) {
        (Some(rise), Some(set)) => rise > set,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => search.height(&start)? > 0.0,
    };

    let mut intervals = Vec::new();
    let mut cursor = start;

    if up_at_start {
        let rise = previous_rising.unwrap_or_else(|| {
            debug!(
                "no rising found within {} days before {start} at site {}, body up since the bound",
                settings.search_horizon_days, site.code
            );
            start - bound
        });
        let set = search
            .next(Crossing::Setting, start, set_limit)?
            .unwrap_or_else(|| {
                debug!(
                    "no setting found within {} days after {end} at site {}, body up until the bound",
                    settings.search_horizon_days, site.code
                );
                set_limit
            });
        intervals.push(RiseSetInterval { rise, set });
        cursor = set + one_second;
    }

    while cursor < end {
        let Some(rise) = search.next(Crossing::Rising, cursor, end)? else {
            break;
        };
        let set = search
            .next(Crossing::Setting, rise, set_limit)?
            .unwrap_or(set_limit);

        if rise > cursor && rise < end {
            intervals.push(RiseSetInterval { rise, set });
        }
        if set + one_second <= cursor {
            break;
        }
        cursor = set + one_second;
    }

    if intervals.is_empty() {
        debug!("body never rises over site {} between {start} and {end}", site.code);
    }

    Ok(RiseSetSeries::new(intervals))
}
