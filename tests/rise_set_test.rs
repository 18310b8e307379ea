mod common;

use hifitime::{Duration, Epoch};
use nonsidereal_airmass::body::SkyBody;
use nonsidereal_airmass::config::Settings;
use nonsidereal_airmass::rise_set::compute_rise_sets;
use nonsidereal_airmass::sun::Sun;
use nonsidereal_airmass::time::TimeWindow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{cerro_tololo, is_up_linear, maui, siding_spring};

#[test]
fn test_series_is_ordered_and_disjoint() {
    let settings = Settings::default();
    let window = TimeWindow::parse("2024-03-01T00:00:00", "2024-03-08T00:00:00").unwrap();

    for site in [maui(), siding_spring(), cerro_tololo()] {
        let series = compute_rise_sets(&site, &Sun, &window, &settings).unwrap();

        // one day per calendar day, give or take the window edges
        assert!((7..=8).contains(&series.len()), "{}: {}", site.code, series.len());

        for interval in series.intervals() {
            assert!(interval.rise < interval.set);
            let hours = (interval.set - interval.rise).to_seconds() / 3600.0;
            assert!((10.0..14.0).contains(&hours), "{}: {hours} h of daylight", site.code);
        }
        for (previous, next) in series
            .intervals()
            .iter()
            .zip(series.intervals().iter().skip(1))
        {
            assert!(previous.set < next.rise);
        }
    }
}

#[test]
fn test_events_lie_on_the_horizon() {
    let settings = Settings::default();
    let site = siding_spring();
    let window = TimeWindow::parse("2024-01-01T00:00:00", "2024-01-03T00:00:00").unwrap();

    let series = compute_rise_sets(&site, &Sun, &window, &settings).unwrap();
    for interval in series.intervals() {
        for event in [interval.rise, interval.set] {
            let (alt, _) = Sun.alt_az(&site, &event).unwrap();
            // the Sun moves by less than 0.01 degree in one second
            assert!((alt - settings.sun_horizon_deg).abs() < 0.01, "altitude {alt}");
        }
    }
}

#[test]
fn test_in_progress_day_is_kept() {
    let settings = Settings::default();
    let site = maui();
    // 22:00 UTC is noon in Hawaii
    let window = TimeWindow::parse("2024-01-01T22:00:00", "2024-01-02T22:00:00").unwrap();

    let series = compute_rise_sets(&site, &Sun, &window, &settings).unwrap();
    let first = series.intervals()[0];
    assert!(first.rise <= window.start());
    assert!(first.set > window.start());

    // up at the window end as well: the last day runs past it
    let last = series.intervals()[series.len() - 1];
    assert!(last.rise < window.end());
    assert!(last.set >= window.end());
}

#[test]
fn test_classifier_matches_linear_scan() {
    let settings = Settings::default();
    let site = cerro_tololo();
    let window = TimeWindow::parse("2024-05-01T00:00:00", "2024-05-11T00:00:00").unwrap();
    let series = compute_rise_sets(&site, &Sun, &window, &settings).unwrap();

    let mut rng = StdRng::seed_from_u64(42_u64);
    let start = window.start() - Duration::from_days(2.0);
    let span_seconds = (window.duration() + Duration::from_days(4.0)).to_seconds();

    for _ in 0..1000 {
        let epoch = start + Duration::from_seconds(rng.random_range(0.0..span_seconds));
        assert_eq!(
            series.is_up(&epoch),
            is_up_linear(&series, &epoch),
            "disagreement at {epoch}"
        );
    }

    // exact bounds are down
    for interval in series.intervals() {
        assert!(!series.is_up(&interval.rise));
        assert!(!series.is_up(&interval.set));
    }
}

#[test]
fn test_classifier_agrees_with_sun_altitude() {
    let settings = Settings::default();
    let site = maui();
    let window = TimeWindow::parse("2024-09-10T00:00:00", "2024-09-12T00:00:00").unwrap();
    let series = compute_rise_sets(&site, &Sun, &window, &settings).unwrap();

    for epoch in window.grid(7.0).unwrap() {
        let (alt, _) = Sun.alt_az(&site, &epoch).unwrap();
        // skip the seconds around an event
        if (alt - settings.sun_horizon_deg).abs() < 0.05 {
            continue;
        }
        assert_eq!(series.is_up(&epoch), alt > settings.sun_horizon_deg, "at {epoch}");
    }
}

#[test]
fn test_after_last_set_is_down() {
    let settings = Settings::default();
    let window = TimeWindow::parse("2024-01-01T00:00:00", "2024-01-02T00:00:00").unwrap();
    let series = compute_rise_sets(&maui(), &Sun, &window, &settings).unwrap();

    let last_set = series.intervals()[series.len() - 1].set;
    let later: Epoch = last_set + Duration::from_days(3.0) + Duration::from_seconds(43200.0);
    assert!(!series.is_up(&later));
    assert!(series.last_rise_set_pair(&later).is_some());
    assert!(series.next_rise_set_pair(&later).is_none());
}
