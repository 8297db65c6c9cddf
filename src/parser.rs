//! JSON parser for the public device feed.
//!
//! The feed is loosely typed: fields come and go depending on the sensors a
//! station has, and occasionally carry strings or nulls. Everything that is
//! not a finite number is treated as a missing field rather than an error.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::components::Quantity;

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    data: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    #[serde(rename = "lastData")]
    last_data: Option<LastData>,
}

/// High and low of the current period for one field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HighLow {
    #[serde(default, deserialize_with = "number")]
    pub h: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub l: Option<f64>,
}

/// Most recent reading of one station.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LastData {
    #[serde(default, deserialize_with = "number")]
    pub tempf: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub windspeedmph: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub windgustmph: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub hourlyrainin: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub dailyrainin: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub eventrainin: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub baromrelin: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    pub winddir: Option<f64>,
    /// Observation time in epoch milliseconds.
    #[serde(default, deserialize_with = "number")]
    pub dateutc: Option<f64>,
    #[serde(default, deserialize_with = "high_lows")]
    pub hl: HashMap<String, HighLow>,
}

impl LastData {
    pub fn current(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::Temperature => self.tempf,
            Quantity::WindSpeed => self.windspeedmph,
            Quantity::WindGust => self.windgustmph,
            Quantity::HourlyRain => self.hourlyrainin,
            Quantity::DailyRain => self.dailyrainin,
            Quantity::EventRain => self.eventrainin,
            Quantity::Pressure => self.baromrelin,
        }
    }

    pub fn high_low(&self, quantity: Quantity) -> Option<&HighLow> {
        self.hl.get(quantity.key())
    }

    pub fn low(&self, quantity: Quantity) -> Option<f64> {
        self.high_low(quantity).and_then(|hl| hl.l)
    }

    pub fn high(&self, quantity: Quantity) -> Option<f64> {
        self.high_low(quantity).and_then(|hl| hl.h)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dateutc
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
    }
}

/// Extracts the `lastData` record of the first device in a feed response.
///
/// # Errors
///
/// Returns an error if the body is not JSON, the `data` array is empty, or
/// the first device carries no `lastData` record.
pub fn parse_last_data(bytes: &[u8]) -> Result<LastData> {
    let response: DevicesResponse = serde_json::from_slice(bytes)?;
    let device = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("feed contains no devices"))?;
    device
        .last_data
        .ok_or_else(|| anyhow!("device has no lastData record"))
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|v| v.is_finite()))
}

fn high_lows<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, HighLow>, D::Error> {
    let Some(Value::Object(map)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(HashMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| {
            serde_json::from_value::<HighLow>(value)
                .ok()
                .map(|hl| (key, hl))
        })
        .collect())
}
