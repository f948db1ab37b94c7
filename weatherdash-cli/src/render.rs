//! Plain-text dashboard rendering.
//!
//! Every view here is pure: it takes the session state and a display
//! unit and writes text. Missing values render as `--`.

use std::fmt::{self, Write};

use weatherdash_core::{
    Day, TemperatureUnit, WeatherSnapshot, WeatherState,
    units::{self, RiskLevel},
};

const MISSING: &str = "--";
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_CELLS: usize = 20;

/// Provider icon codes to terminal glyphs.
const ICONS: &[(&str, &str)] = &[
    ("snow", "❄"),
    ("rain", "☂"),
    ("fog", "≋"),
    ("wind", "≈"),
    ("cloudy", "☁"),
    ("partly-cloudy-day", "⛅"),
    ("partly-cloudy-night", "☁"),
    ("clear-day", "☀"),
    ("clear-night", "☾"),
];

pub fn icon_glyph(code: &str) -> &'static str {
    ICONS.iter().find(|(name, _)| *name == code).map(|(_, glyph)| *glyph).unwrap_or("·")
}

/// Whole-degree value as shown on cards and the feels-like line.
fn whole_degrees(f: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => units::fahrenheit_to_celsius(f),
        TemperatureUnit::Fahrenheit => f.round(),
    }
}

fn chart_value(f: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => units::round_hundredths(unit.from_fahrenheit(f)),
        TemperatureUnit::Fahrenheit => f,
    }
}

pub fn sparkline(values: &[f64]) -> String {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return String::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARKS[SPARKS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARKS.len() - 1) as f64).round() as usize;
                SPARKS[idx.min(SPARKS.len() - 1)]
            }
        })
        .collect()
}

/// Proportional bar for `temp` in `unit`.
pub fn bar(temp: f64, unit: TemperatureUnit) -> String {
    let filled = (units::width_percent(temp, unit) / 100.0 * BAR_CELLS as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

fn risk_marker(level: RiskLevel) -> char {
    match level {
        RiskLevel::Normal => '○',
        RiskLevel::Caution => '◔',
        RiskLevel::ExtremeCaution => '◑',
        RiskLevel::Danger => '◕',
        RiskLevel::ExtremeDanger => '●',
    }
}

/// The whole dashboard for one session state, rendered through `Display`.
pub struct Dashboard<'a> {
    pub state: &'a WeatherState,
    pub unit: TemperatureUnit,
}

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        if state.loading {
            let location = state.location.as_deref().unwrap_or(MISSING);
            writeln!(f, "Loading weather for {location}...")?;
        }

        if let Some(err) = &state.error {
            writeln!(f, "{}", err.user_message())?;
        }

        match &state.data {
            Some(snapshot) => snapshot_view(f, snapshot, self.unit),
            None if !state.loading && state.error.is_none() => {
                writeln!(f, "Search for a location to see its forecast.")
            }
            None => Ok(()),
        }
    }
}

pub fn dashboard(state: &WeatherState, unit: TemperatureUnit) -> String {
    Dashboard { state, unit }.to_string()
}

fn snapshot_view(
    out: &mut impl Write,
    snapshot: &WeatherSnapshot,
    unit: TemperatureUnit,
) -> fmt::Result {
    let current = &snapshot.current_conditions;
    let today = snapshot.today();
    let date = today.map(|d| d.datetime.format("%B %-d, %Y").to_string());

    writeln!(out, "WEATHER FORECAST")?;
    writeln!(out, "{}", current.conditions)?;
    writeln!(
        out,
        "{} {}, {}",
        icon_glyph(&current.icon),
        snapshot.resolved_address,
        date.as_deref().unwrap_or(MISSING)
    )?;
    if let Some(description) = snapshot.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "{description}")?;
    }
    writeln!(out)?;

    let now = unit.from_fahrenheit(current.temp);
    let precip = today
        .and_then(|d| d.precipprob)
        .map(|p| format!("{p}%"))
        .unwrap_or_else(|| MISSING.to_string());

    writeln!(out, "  {now:.1}{unit}")?;
    writeln!(
        out,
        "  Feels like {}{unit}   Precipitation: {precip}",
        whole_degrees(current.feelslike, unit)
    )?;
    writeln!(out, "  Humidity {}%   Wind: {} mph", current.humidity, current.windspeed)?;

    let level = units::risk_bucket(now, unit);
    writeln!(out, "  Heat risk: {} {}", risk_marker(level), level.label())?;
    writeln!(out)?;

    hourly_view(out, today, unit)?;
    daily_view(out, &snapshot.days, unit)?;
    legend_view(out)
}

fn hourly_view(out: &mut impl Write, today: Option<&Day>, unit: TemperatureUnit) -> fmt::Result {
    let hours = today.map(|d| d.hours.as_slice()).unwrap_or_default();
    if hours.is_empty() {
        return Ok(());
    }

    let values: Vec<f64> = hours.iter().map(|h| chart_value(h.temp, unit)).collect();
    let first = hours.first().map(|h| h.datetime.format("%I:%M %p").to_string());
    let last = hours.last().map(|h| h.datetime.format("%I:%M %p").to_string());

    writeln!(out, "Today")?;
    writeln!(out, "  {}", sparkline(&values))?;
    writeln!(
        out,
        "  {} .. {}   low {:.2}{unit}  high {:.2}{unit}",
        first.as_deref().unwrap_or(MISSING),
        last.as_deref().unwrap_or(MISSING),
        values.iter().copied().fold(f64::INFINITY, f64::min),
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    )?;
    writeln!(out)
}

fn daily_view(out: &mut impl Write, days: &[Day], unit: TemperatureUnit) -> fmt::Result {
    if days.is_empty() {
        return Ok(());
    }

    let values: Vec<f64> = days.iter().map(|d| chart_value(d.temp, unit)).collect();
    writeln!(out, "Next {} days", days.len())?;
    writeln!(out, "  {}", sparkline(&values))?;
    writeln!(out)?;

    for day in days {
        writeln!(
            out,
            "  {:<8} {:>6}{unit}  max {} {:>5}  min {} {:>5}",
            day.datetime.format("%b %-d").to_string(),
            whole_degrees(day.temp, unit),
            bar(unit.from_fahrenheit(day.tempmax), unit),
            whole_degrees(day.tempmax, unit),
            bar(unit.from_fahrenheit(day.tempmin), unit),
            whole_degrees(day.tempmin, unit),
        )?;
    }
    writeln!(out)
}

fn legend_view(out: &mut impl Write) -> fmt::Result {
    let entries: Vec<String> = RiskLevel::ALL
        .iter()
        .map(|level| format!("{} {} ({})", risk_marker(*level), level.label(), level.legend()))
        .collect();
    writeln!(out, "{}", entries.join("  "))
}
