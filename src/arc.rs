//! # Sky arcs
//!
//! A [`SkyArc`] is a coarse path of a target on the sky, drawn on map-style displays:
//!
//! - orbital targets are sampled every [`Settings::arc_step_days`] from an anchor instant,
//!   [`Settings::arc_points`] times, at their geocentric astrometric place;
//! - tabulated targets use the table of their first site code, resampled uniformly at the same
//!   spacing over its whole span. Tables too short for two resampled points are returned as
//!   they are.
//!
//! [`target_distribution`] also places sidereal targets, each as a one-point arc at its fixed
//! catalogue position.

use hifitime::Epoch;
use log::debug;
use serde::Serialize;

use crate::airmass_errors::AirmassError;
use crate::body::{shift_days, Body, SkyBody, Target};
use crate::config::{SchemeRegistry, Settings};
use crate::constants::{Degree, MINUTES_PER_DAY};
use crate::ephemeris::EphemerisTable;
use crate::keplerian_element::KeplerianElements;
use crate::observers::ObservingSite;

/// Right ascension and declination of a path, degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkyArc {
    pub ra: Vec<Degree>,
    pub dec: Vec<Degree>,
}

impl SkyArc {
    pub fn len(&self) -> usize {
        self.ra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ra.is_empty()
    }

    /// Iterate over `(ra, dec)` points.
    pub fn points(&self) -> impl Iterator<Item = (Degree, Degree)> + '_ {
        self.ra.iter().copied().zip(self.dec.iter().copied())
    }
}

/// Compute the sky arc of a target.
///
/// Arguments
/// -----------------
/// * `target`: a non-sidereal target.
/// * `schemes`: the scheme → handler registry.
/// * `settings`: arc length and spacing.
/// * `anchor`: first instant of an orbital arc; tabulated arcs ignore it.
///
/// Errors
/// ----------
/// * [`AirmassError::InvalidConfiguration`] if `settings` do not validate.
/// * [`AirmassError::UnsupportedObjectType`] / [`AirmassError::UnknownScheme`] if the target
///   cannot be resolved.
/// * Orbit model failures.
pub fn compute_arc(
    target: &Target,
    schemes: &SchemeRegistry,
    settings: &Settings,
    anchor: &Epoch,
) -> Result<SkyArc, AirmassError> {
    settings.validate()?;
    match Body::for_target(target, schemes)? {
        Body::Orbital(elements) => orbital_arc(&elements, settings, anchor),
        Body::Tabulated(table) => tabulated_arc(&table, settings),
    }
}

/// [`compute_arc`] anchored at the current time.
pub fn compute_arc_now(
    target: &Target,
    schemes: &SchemeRegistry,
    settings: &Settings,
) -> Result<SkyArc, AirmassError> {
    compute_arc(target, schemes, settings, &Epoch::now()?)
}

/// Sky positions of a list of targets, in list order.
///
/// Non-sidereal targets get their [`compute_arc`] path. Sidereal targets get a single point at
/// their fixed RA/Dec; one without coordinates is left out.
pub fn target_distribution(
    targets: &[Target],
    schemes: &SchemeRegistry,
    settings: &Settings,
    anchor: &Epoch,
) -> Result<Vec<(String, SkyArc)>, AirmassError> {
    let mut arcs = Vec::with_capacity(targets.len());
    for target in targets {
        let arc = if target.is_non_sidereal() {
            compute_arc(target, schemes, settings, anchor)?
        } else if let (Some(ra), Some(dec)) = (target.ra, target.dec) {
            SkyArc {
                ra: vec![ra],
                dec: vec![dec],
            }
        } else {
            debug!("sidereal target {} has no coordinates, skipped", target.name);
            continue;
        };
        arcs.push((target.name.clone(), arc));
    }
    Ok(arcs)
}

fn orbital_arc(
    elements: &KeplerianElements,
    settings: &Settings,
    anchor: &Epoch,
) -> Result<SkyArc, AirmassError> {
    let geocenter = ObservingSite::geocentric()?;

    let (ra, dec) = (0..settings.arc_points)
        .map(|k| {
            let epoch = shift_days(anchor, k as f64 * settings.arc_step_days);
            elements.astrometric_radec(&geocenter, &epoch)
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();

    Ok(SkyArc { ra, dec })
}

fn tabulated_arc(table: &EphemerisTable, settings: &Settings) -> Result<SkyArc, AirmassError> {
    let Some(code) = table.site_codes().next() else {
        debug!("empty ephemeris table, no arc");
        return Ok(SkyArc::default());
    };
    let Some((first, last)) = table.span(code) else {
        return Ok(SkyArc::default());
    };

    let track = match table.resample(code, first, last, settings.arc_step_days * MINUTES_PER_DAY)? {
        Some(track) if track.len() >= 2 => track,
        _ => {
            debug!("ephemeris of site {code} too short to resample, using it whole");
            table.full_track(code).unwrap_or_default()
        }
    };

    Ok(SkyArc {
        ra: track.ra,
        dec: track.dec,
    })
}

#[cfg(test)]
mod arc_test {
    use super::*;
    use crate::keplerian_element::OrbitalElementFields;
    use approx::assert_relative_eq;

    fn orbital_target() -> Target {
        Target::orbital(
            "2000 SG344",
            "MPC_MINOR_PLANET",
            OrbitalElementFields {
                inclination: Some(0.111),
                lng_asc_node: Some(191.9),
                arg_of_perihelion: Some(275.3),
                semimajor_axis: Some(0.977),
                mean_anomaly: Some(100.0),
                eccentricity: Some(0.067),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_orbital_arc() {
        let anchor = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
        let arc = compute_arc(
            &orbital_target(),
            &SchemeRegistry::default(),
            &Settings::default(),
            &anchor,
        )
        .unwrap();

        assert_eq!(arc.ra.len(), 38);
        assert_eq!(arc.dec.len(), 38);
        assert!(arc.points().all(|(ra, dec)| (0.0..360.0).contains(&ra) && dec.abs() <= 90.0));
    }

    #[test]
    fn test_tabulated_arc_resampled() {
        // 30 days of samples at two sites, "coj" comes first
        let samples = |offset: f64| {
            (0..=30)
                .map(|d| format!(r#"{{"t": {}, "R": {}, "D": -10.0}}"#, 59000.0 + d as f64, offset + d as f64))
                .collect::<Vec<_>>()
                .join(",")
        };
        let json = format!(r#"{{"ogg": [{}], "coj": [{}]}}"#, samples(100.0), samples(200.0));
        let target = Target::tabulated("comet", "EPHEMERIS", json);

        let arc = compute_arc(
            &target,
            &SchemeRegistry::default(),
            &Settings::default(),
            &Epoch::from_mjd_utc(59000.0),
        )
        .unwrap();

        assert_eq!(arc.len(), 4);
        assert_relative_eq!(arc.ra[0], 200.0, epsilon = 1e-9);
        assert_relative_eq!(arc.ra[3], 230.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_table_returned_whole() {
        let target = Target::tabulated(
            "comet",
            "EPHEMERIS",
            r#"{"ogg": [{"t": 59000.0, "R": 10.0, "D": 1.0}, {"t": 59001.0, "R": 11.0, "D": 2.0}]}"#,
        );
        let arc = compute_arc(
            &target,
            &SchemeRegistry::default(),
            &Settings::default(),
            &Epoch::from_mjd_utc(59000.0),
        )
        .unwrap();

        assert_eq!(arc.ra, vec![10.0, 11.0]);
        assert_eq!(arc.dec, vec![1.0, 2.0]);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = Settings {
            arc_step_days: 0.0,
            ..Settings::default()
        };
        assert!(matches!(
            compute_arc(
                &orbital_target(),
                &SchemeRegistry::default(),
                &settings,
                &Epoch::from_gregorian_utc_at_midnight(2024, 1, 1),
            ),
            Err(AirmassError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_target_distribution_places_sidereal_targets() {
        let no_coordinates = Target {
            ra: None,
            ..Target::sidereal("unplaced", 0.0, 0.0)
        };
        let targets = vec![
            Target::sidereal("M31", 10.68, 41.27),
            no_coordinates,
            orbital_target(),
        ];
        let arcs = target_distribution(
            &targets,
            &SchemeRegistry::default(),
            &Settings::default(),
            &Epoch::from_gregorian_utc_at_midnight(2024, 1, 1),
        )
        .unwrap();

        assert_eq!(arcs.len(), 2);
        assert_eq!(arcs[0].0, "M31");
        assert_eq!(arcs[0].1.ra, vec![10.68]);
        assert_eq!(arcs[0].1.dec, vec![41.27]);
        assert_eq!(arcs[1].0, "2000 SG344");
        assert_eq!(arcs[1].1.len(), 38);
    }
}
