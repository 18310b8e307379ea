use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nonsidereal_airmass::body::Target;
use nonsidereal_airmass::config::{SchemeRegistry, Settings};
use nonsidereal_airmass::keplerian_element::OrbitalElementFields;
use nonsidereal_airmass::observers::{Facility, ObservingSite};
use nonsidereal_airmass::time::TimeWindow;
use nonsidereal_airmass::visibility::{compute_visibility, VisibilityRequest};

fn network() -> Facility {
    Facility::new(
        "LCO",
        [
            (
                "Maui".to_string(),
                ObservingSite::new("ogg", -156.2569, 20.7075, 3055.0).unwrap(),
            ),
            (
                "Siding Spring".to_string(),
                ObservingSite::new("coj", 149.0708, -31.2728, 1116.0).unwrap(),
            ),
            (
                "Cerro Tololo".to_string(),
                ObservingSite::new("lsc", -70.8049, -30.1673, 2198.0).unwrap(),
            ),
        ],
    )
}

fn ceres() -> Target {
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

/// One-day and one-week requests over a three-site network.
fn bench_orbital_visibility(c: &mut Criterion) {
    let facilities = [network()];
    let target = ceres();
    let schemes = SchemeRegistry::default();
    let settings = Settings::default();

    for (label, end) in [("one_day", "2024-01-02T00:00:00"), ("one_week", "2024-01-08T00:00:00")] {
        let window = TimeWindow::parse("2024-01-01T00:00:00", end).unwrap();
        let request = VisibilityRequest::new(window, settings.interval_minutes, None);

        c.bench_function(&format!("visibility/orbital_{label}"), |b| {
            b.iter(|| {
                let visibility = compute_visibility(
                    black_box(&target),
                    &facilities,
                    black_box(&request),
                    &schemes,
                    &settings,
                );
                black_box(visibility.ok());
            })
        });
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_orbital_visibility
);
criterion_main!(benches);
