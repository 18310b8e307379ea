#![allow(dead_code)]

use hifitime::Epoch;
use nonsidereal_airmass::body::Target;
use nonsidereal_airmass::keplerian_element::OrbitalElementFields;
use nonsidereal_airmass::observers::{Facility, ObservingSite};
use nonsidereal_airmass::rise_set::RiseSetSeries;

pub fn maui() -> ObservingSite {
    ObservingSite::new("ogg", -156.2569, 20.7075, 3055.0).unwrap()
}

pub fn siding_spring() -> ObservingSite {
    ObservingSite::new("coj", 149.0708, -31.2728, 1116.0).unwrap()
}

pub fn cerro_tololo() -> ObservingSite {
    ObservingSite::new("lsc", -70.8049, -30.1673, 2198.0).unwrap()
}

/// Three-site network, one site per continent.
pub fn lco() -> Facility {
    Facility::new(
        "LCO",
        [
            ("Maui".to_string(), maui()),
            ("Siding Spring".to_string(), siding_spring()),
            ("Cerro Tololo".to_string(), cerro_tololo()),
        ],
    )
}

/// Ceres-like orbit, mean anomaly at JD 2460600.5.
pub fn ceres() -> Target {
    Target::orbital(
        "Ceres",
        "MPC_MINOR_PLANET",
        OrbitalElementFields {
            inclination: Some(10.588),
            lng_asc_node: Some(80.25),
            arg_of_perihelion: Some(73.29),
            semimajor_axis: Some(2.7656),
            mean_anomaly: Some(188.7),
            ephemeris_epoch: Some(2460600.5),
            epoch: Some(2451545.0),
            eccentricity: Some(0.0796),
        },
    )
}

/// Tabulated ephemeris at hourly steps over `[first, last]` (MJD), fixed position, for the
/// given site codes.
pub fn fixed_ephemeris_json(sites: &[&str], first: f64, last: f64, ra: f64, dec: f64) -> String {
    let n_hours = ((last - first) * 24.0).round() as usize;
    let samples = (0..=n_hours)
        .map(|h| {
            format!(
                r#"{{"t": {}, "R": {ra}, "D": {dec}}}"#,
                first + h as f64 / 24.0
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let tables = sites
        .iter()
        .map(|site| format!(r#""{site}": [{samples}]"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{tables}}}")
}

/// Object near opposition in early January 2024, tabulated for Maui and Siding Spring.
pub fn opposition_comet() -> Target {
    Target::tabulated(
        "C/2024 opposition",
        "EPHEMERIS",
        fixed_ephemeris_json(&["coj", "ogg"], 60308.0, 60316.0, 101.0, 23.0),
    )
}

/// Linear scan equivalent of [`RiseSetSeries::is_up`].
pub fn is_up_linear(series: &RiseSetSeries, epoch: &Epoch) -> bool {
    series
        .intervals()
        .iter()
        .any(|iv| iv.rise < *epoch && *epoch < iv.set)
}

/// Number of runs of consecutive valid samples.
pub fn valid_runs(airmass: &[Option<f64>]) -> usize {
    airmass
        .iter()
        .zip(std::iter::once(&None).chain(airmass.iter()))
        .filter(|(current, previous)| current.is_some() && previous.is_none())
        .count()
}
