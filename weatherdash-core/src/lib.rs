//! Core library for the `weatherdash` terminal dashboard.
//!
//! This crate defines:
//! - The weather snapshot model and error taxonomy
//! - A location-keyed snapshot cache
//! - The provider client
//! - A session that orchestrates cache and provider per location change
//! - Unit conversion and heat-risk classification
//!
//! It is used by `weatherdash-cli`, but the session works with any
//! [`WeatherFetcher`] and [`LocationCache`], so other front ends can reuse it.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod session;
pub mod units;

pub use cache::{FileCache, LocationCache, MemoryCache};
pub use config::Config;
pub use error::{ErrorKind, WeatherError};
pub use model::{CacheEntry, CurrentConditions, Day, Hour, WeatherSnapshot};
pub use provider::{WeatherFetcher, visualcrossing::VisualCrossingFetcher};
pub use session::{CachePolicy, Ticket, WeatherSession, WeatherState};
pub use units::{RiskLevel, TemperatureUnit};
