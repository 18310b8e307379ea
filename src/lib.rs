pub mod airmass_errors;
pub mod arc;
pub mod body;
pub mod config;
pub mod constants;
pub mod ephemeris;
mod kepler;
pub mod keplerian_element;
pub mod observers;
mod ref_system;
pub mod rise_set;
pub mod sun;
pub mod time;
pub mod visibility;
