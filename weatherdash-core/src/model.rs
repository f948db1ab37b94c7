use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Current observation, in the provider's native units (°F, mph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feelslike: f64,
    pub conditions: String,
    pub icon: String,
    pub humidity: f64,
    pub windspeed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hour {
    pub datetime: NaiveTime,
    pub temp: f64,
}

/// One day of the multi-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub datetime: NaiveDate,
    pub temp: f64,
    pub tempmin: f64,
    pub tempmax: f64,
    #[serde(default)]
    pub precipprob: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hours: Vec<Hour>,
}

/// One fetched weather payload for a single location.
///
/// Snapshots are never patched: a later fetch replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub current_conditions: CurrentConditions,
    pub days: Vec<Day>,
    pub resolved_address: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WeatherSnapshot {
    /// The first forecast day, which the provider reports as "today" in `timezone`.
    pub fn today(&self) -> Option<&Day> {
        self.days.first()
    }
}

/// A snapshot as persisted by a [`LocationCache`](crate::cache::LocationCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub snapshot: WeatherSnapshot,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self { snapshot, stored_at: Utc::now() }
    }

    /// Age of the entry relative to `now`. Entries stamped in the future count as zero.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.stored_at).max(chrono::Duration::zero())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A small snapshot in the provider's native units.
    pub fn snapshot(address: &str, temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            current_conditions: CurrentConditions {
                temp,
                feelslike: temp + 2.0,
                conditions: "Partially cloudy".to_string(),
                icon: "partly-cloudy-day".to_string(),
                humidity: 71.5,
                windspeed: 9.2,
            },
            days: vec![Day {
                datetime: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date"),
                temp,
                tempmin: temp - 8.0,
                tempmax: temp + 6.0,
                precipprob: Some(40.0),
                description: "Partly cloudy throughout the day.".to_string(),
                hours: vec![
                    Hour { datetime: NaiveTime::from_hms_opt(0, 0, 0).expect("valid time"), temp: temp - 5.0 },
                    Hour { datetime: NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"), temp },
                ],
            }],
            resolved_address: address.to_string(),
            timezone: "Asia/Manila".to_string(),
            description: None,
        }
    }

    pub fn provider_json(address: &str, temp: f64) -> serde_json::Value {
        serde_json::json!({
            "queryCost": 1,
            "latitude": 14.5995,
            "longitude": 120.9842,
            "resolvedAddress": address,
            "address": address,
            "timezone": "Asia/Manila",
            "tzoffset": 8.0,
            "days": [{
                "datetime": "2024-07-01",
                "datetimeEpoch": 1719763200,
                "tempmax": temp + 6.0,
                "tempmin": temp - 8.0,
                "temp": temp,
                "precipprob": 40.0,
                "description": "Partly cloudy throughout the day.",
                "hours": [
                    { "datetime": "00:00:00", "temp": temp - 5.0, "icon": "clear-night" },
                    { "datetime": "12:00:00", "temp": temp, "icon": "partly-cloudy-day" }
                ]
            }],
            "currentConditions": {
                "datetime": "10:00:00",
                "temp": temp,
                "feelslike": temp + 2.0,
                "humidity": 71.5,
                "windspeed": 9.2,
                "conditions": "Partially cloudy",
                "icon": "partly-cloudy-day"
            }
        })
    }
}
