//! Temperature unit conversion and heat-risk classification.
//!
//! Snapshots always hold °F. Everything here is pure and is applied at
//! display time only.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggle(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Unrounded display value of a native (°F) reading in this unit.
    pub fn from_fahrenheit(self, f: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => fahrenheit_to_celsius_exact(f),
            TemperatureUnit::Fahrenheit => f,
        }
    }

    /// Bounds used to scale proportional bars.
    fn bar_range(self) -> (f64, f64) {
        match self {
            TemperatureUnit::Celsius => (-20.0, 50.0),
            TemperatureUnit::Fahrenheit => (-4.0, 122.0),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Use 'c' or 'f'."
            )),
        }
    }
}

pub fn fahrenheit_to_celsius_exact(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Whole-degree Celsius, rounding half away from zero.
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    fahrenheit_to_celsius_exact(f).round()
}

/// Rounds to two decimals, the precision used for chart points.
pub fn round_hundredths(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Heat-risk classification of a temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Normal,
    Caution,
    ExtremeCaution,
    Danger,
    ExtremeDanger,
}

/// Lower bounds in °F, highest first.
const RISK_THRESHOLDS_F: [(f64, RiskLevel); 4] = [
    (125.0, RiskLevel::ExtremeDanger),
    (103.0, RiskLevel::Danger),
    (90.0, RiskLevel::ExtremeCaution),
    (80.0, RiskLevel::Caution),
];

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Normal,
        RiskLevel::Caution,
        RiskLevel::ExtremeCaution,
        RiskLevel::Danger,
        RiskLevel::ExtremeDanger,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Normal => "Normal",
            RiskLevel::Caution => "Caution",
            RiskLevel::ExtremeCaution => "Extreme Caution",
            RiskLevel::Danger => "Danger",
            RiskLevel::ExtremeDanger => "Extreme Danger",
        }
    }

    /// Range shown in the legend next to the label.
    pub fn legend(self) -> &'static str {
        match self {
            RiskLevel::Normal => "27°C or below",
            RiskLevel::Caution => "27°C - 32°C",
            RiskLevel::ExtremeCaution => "32°C - 39°C",
            RiskLevel::Danger => "39°C - 51°C",
            RiskLevel::ExtremeDanger => "51°C or above",
        }
    }
}

/// Classifies `temp`, expressed in `unit`.
///
/// Celsius bounds are the exact conversions of the Fahrenheit ones
/// (26.67, 32.22, 39.44, 51.67 to two places), so a reading classifies the
/// same in both units.
pub fn risk_bucket(temp: f64, unit: TemperatureUnit) -> RiskLevel {
    RISK_THRESHOLDS_F
        .iter()
        .find(|(bound_f, _)| temp >= unit.from_fahrenheit(*bound_f))
        .map(|(_, level)| *level)
        .unwrap_or(RiskLevel::Normal)
}

/// Position of `temp` within the unit's bar range, as a percentage in `0..=100`.
pub fn width_percent(temp: f64, unit: TemperatureUnit) -> f64 {
    let (min, max) = unit.bar_range();
    (((temp - min) / (max - min)) * 100.0).clamp(0.0, 100.0)
}
