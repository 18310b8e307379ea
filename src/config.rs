//! # Configuration
//!
//! Engine settings, the scheme → handler registry and facility declarations, all loadable from
//! one TOML document:
//!
//! ```toml
//! [settings]
//! interval_minutes = 10.0
//! airmass_limit = 10.0
//!
//! [schemes]
//! MPC_MINOR_PLANET = "orbital"
//! EPHEMERIS = "tabulated"
//!
//! [[facility]]
//! name = "LCO"
//! [facility.sites.Maui]
//! sitecode = "ogg"
//! longitude = -156.2569
//! latitude = 20.7075
//! elevation = 3055.0
//! ```
//!
//! Every section is optional. Missing settings take their [`Default`] value and a missing
//! `[schemes]` table yields [`SchemeRegistry::default`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::airmass_errors::AirmassError;
use crate::constants::{
    Airmass, Degree, DEFAULT_AIRMASS_LIMIT, DEFAULT_INTERVAL_MINUTES, SUN_HORIZON,
};
use crate::observers::{Facility, SiteDescriptor};

/// Tunable parameters of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sampling step of visibility requests that leave it unset, minutes
    pub interval_minutes: f64,
    /// Upper airmass bound of requests that leave it unset or zero
    pub airmass_limit: Airmass,
    /// Altitude of the Sun's center at sunrise and sunset, degrees
    pub sun_horizon_deg: Degree,
    /// Coarse step of the rise/set crossing scan, minutes
    pub scan_step_minutes: f64,
    /// How far beyond the window the rise/set search looks, days
    pub search_horizon_days: f64,
    /// Number of points of an orbital sky arc
    pub arc_points: usize,
    /// Spacing of sky arc points, days
    pub arc_step_days: f64,
    /// Length of observation plans, days
    pub plan_length_days: f64,
    /// Sampling step of observation plans, minutes
    pub plan_interval_minutes: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            airmass_limit: DEFAULT_AIRMASS_LIMIT,
            sun_horizon_deg: SUN_HORIZON,
            scan_step_minutes: 10.0,
            search_horizon_days: 2.0,
            arc_points: 38,
            arc_step_days: 10.0,
            plan_length_days: 7.0,
            plan_interval_minutes: 60.0,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), AirmassError> {
        let positive = [
            ("interval_minutes", self.interval_minutes),
            ("scan_step_minutes", self.scan_step_minutes),
            ("search_horizon_days", self.search_horizon_days),
            ("arc_step_days", self.arc_step_days),
            ("plan_length_days", self.plan_length_days),
            ("plan_interval_minutes", self.plan_interval_minutes),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, value)| !(*value > 0.0)) {
            return Err(AirmassError::InvalidConfiguration(format!(
                "{name} must be strictly positive, got {value}"
            )));
        }
        if self.airmass_limit < 0.0 {
            return Err(AirmassError::InvalidConfiguration(format!(
                "airmass_limit must not be negative, got {}",
                self.airmass_limit
            )));
        }
        if self.arc_points == 0 {
            return Err(AirmassError::InvalidConfiguration(
                "arc_points must be at least 1".into(),
            ));
        }
        if self.sun_horizon_deg.abs() >= 90.0 {
            return Err(AirmassError::InvalidConfiguration(format!(
                "sun_horizon_deg must lie in (-90, 90), got {}",
                self.sun_horizon_deg
            )));
        }
        Ok(())
    }
}

/// How the positional data of a scheme is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    /// Keplerian orbital elements
    Orbital,
    /// Per-site tabulated ephemeris
    Tabulated,
}

impl FromStr for SchemeKind {
    type Err = AirmassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orbital" => Ok(SchemeKind::Orbital),
            "tabulated" => Ok(SchemeKind::Tabulated),
            other => Err(AirmassError::InvalidConfiguration(format!(
                "unknown scheme handler '{other}' (expected 'orbital' or 'tabulated')"
            ))),
        }
    }
}

/// Registry mapping a target scheme name to its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeRegistry {
    handlers: BTreeMap<String, SchemeKind>,
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        SchemeRegistry {
            handlers: BTreeMap::from([
                ("MPC_MINOR_PLANET".to_string(), SchemeKind::Orbital),
                ("EPHEMERIS".to_string(), SchemeKind::Tabulated),
            ]),
        }
    }
}

impl SchemeRegistry {
    /// Build a registry from `scheme name → handler name` pairs.
    ///
    /// Errors
    /// ----------
    /// * [`AirmassError::InvalidConfiguration`] if a handler name is not recognized. The whole
    ///   registry is rejected: a scheme is never silently dropped.
    pub fn from_handlers<K, V>(
        handlers: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, AirmassError>
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let handlers = handlers
            .into_iter()
            .map(|(scheme, handler)| -> Result<(String, SchemeKind), AirmassError> {
                Ok((scheme.into(), handler.as_ref().parse()?))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(SchemeRegistry { handlers })
    }

    /// Handler registered for `scheme`, or [`AirmassError::UnknownScheme`].
    pub fn resolve(&self, scheme: &str) -> Result<SchemeKind, AirmassError> {
        self.handlers
            .get(scheme)
            .copied()
            .ok_or_else(|| AirmassError::UnknownScheme(scheme.to_string()))
    }

    pub fn schemes(&self) -> impl Iterator<Item = (&str, SchemeKind)> {
        self.handlers.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FacilityConfig {
    name: String,
    #[serde(default)]
    sites: BTreeMap<String, SiteDescriptor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    schemes: Option<BTreeMap<String, String>>,
    #[serde(default)]
    facility: Vec<FacilityConfig>,
}

/// Validated configuration: settings, scheme registry and facilities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub settings: Settings,
    pub schemes: SchemeRegistry,
    pub facilities: Vec<Facility>,
}

impl EngineConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, AirmassError> {
        let raw: ConfigFile = toml::from_str(content)?;
        raw.settings.validate()?;

        let schemes = match raw.schemes {
            Some(handlers) => SchemeRegistry::from_handlers(handlers)?,
            None => {
                debug!("no [schemes] table, using the default scheme handlers");
                SchemeRegistry::default()
            }
        };

        let facilities = raw
            .facility
            .iter()
            .map(|facility| Facility::from_descriptors(facility.name.clone(), &facility.sites))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "configuration loaded: {} schemes, {} facilities",
            schemes.schemes().count(),
            facilities.len()
        );

        Ok(EngineConfig {
            settings: raw.settings,
            schemes,
            facilities,
        })
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AirmassError> {
        let content = fs::read_to_string(path.as_ref())?;
        EngineConfig::from_toml_str(&content)
    }
}
