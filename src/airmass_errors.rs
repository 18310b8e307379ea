use thiserror::Error;

use crate::constants::MJD;

#[derive(Error, Debug)]
pub enum AirmassError {
    #[error("Invalid time window: end ({end}) is before start ({start})")]
    InvalidWindow { start: String, end: String },

    #[error("Object type is unsupported for visibility calculations: {0}")]
    UnsupportedObjectType(String),

    #[error("No ephemeris samples for site code: {0}")]
    MissingEphemerisSite(String),

    #[error("Degenerate interpolation span for site {site}: [{min}, {max}]")]
    DegenerateInterpolationSpan { site: String, min: MJD, max: MJD },

    #[error("No handler registered for target scheme: {0}")]
    UnknownScheme(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid orbit: {0}")]
    InvalidOrbit(String),

    #[error("Kepler equation did not converge (M = {mean_anomaly}, e = {eccentricity})")]
    KeplerNotConverged {
        mean_anomaly: f64,
        eccentricity: f64,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] hifitime::HifitimeError),

    #[error("Unable to parse the ephemeris table: {0}")]
    EphemerisParse(#[from] serde_json::Error),

    #[error("Unable to parse the configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("NaN value encountered: {0}")]
    NaNValue(#[from] ordered_float::FloatIsNan),
}

impl PartialEq for AirmassError {
    fn eq(&self, other: &Self) -> bool {
        use AirmassError::*;
        match (self, other) {
            (
                InvalidWindow { start: s1, end: e1 },
                InvalidWindow { start: s2, end: e2 },
            ) => s1 == s2 && e1 == e2,
            (UnsupportedObjectType(a), UnsupportedObjectType(b)) => a == b,
            (MissingEphemerisSite(a), MissingEphemerisSite(b)) => a == b,
            (
                DegenerateInterpolationSpan {
                    site: s1,
                    min: min1,
                    max: max1,
                },
                DegenerateInterpolationSpan {
                    site: s2,
                    min: min2,
                    max: max2,
                },
            ) => s1 == s2 && min1 == min2 && max1 == max2,
            (UnknownScheme(a), UnknownScheme(b)) => a == b,
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidOrbit(a), InvalidOrbit(b)) => a == b,
            (
                KeplerNotConverged {
                    mean_anomaly: m1,
                    eccentricity: e1,
                },
                KeplerNotConverged {
                    mean_anomaly: m2,
                    eccentricity: e2,
                },
            ) => m1 == m2 && e1 == e2,

            // Wrapped library errors are not comparable: same variant is enough
            (InvalidTimestamp(_), InvalidTimestamp(_)) => true,
            (EphemerisParse(_), EphemerisParse(_)) => true,
            (ConfigParse(_), ConfigParse(_)) => true,
            (IoError(_), IoError(_)) => true,
            (NaNValue(_), NaNValue(_)) => true,

            _ => false,
        }
    }
}
