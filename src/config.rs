//! Persisted configuration
//!
//! The stored record keeps every field as text, as the web interface and
//! older firmware expect. Reading is defensive per field: a missing or
//! unparsable field falls back to that field's default and leaves the
//! others alone.

use alloc::string::{String, ToString};
use core::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::StorageError;
use crate::storage::ConfigStorage;

pub const DEFAULT_SPEED_LIMIT: u8 = 255;
pub const DEFAULT_LED_COUNT: usize = 8;
pub const DEFAULT_LED_BRIGHTNESS: u8 = 255;
pub const DEFAULT_TIME_ZONE_OFFSET: i8 = 1;

/// Longest supported shift-register chain
pub const MAX_LED_COUNT: usize = 1024;

/// Supported time zone offsets in hours
pub const TIME_ZONE_OFFSET_RANGE: core::ops::RangeInclusive<i8> = -12..=14;

const FIELD_SPEED_LIMIT: &str = "speedLimit";
const FIELD_LED_COUNT: &str = "ledCount";
const FIELD_LED_BRIGHTNESS: &str = "ledBrightness";
const FIELD_TIME_ZONE_OFFSET: &str = "timeZoneOffset";

/// Typed engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Upper bound of the track speed
    pub speed_limit: u8,
    /// Number of fixtures in the chain
    pub led_count: usize,
    /// Global fixture brightness (0-255)
    pub led_brightness: u8,
    /// Local time offset from the synchronized clock, in hours
    pub time_zone_offset: i8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed_limit: DEFAULT_SPEED_LIMIT,
            led_count: DEFAULT_LED_COUNT,
            led_brightness: DEFAULT_LED_BRIGHTNESS,
            time_zone_offset: DEFAULT_TIME_ZONE_OFFSET,
        }
    }
}

/// Persisted form of [`Config`], every field as text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigRecord {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub speed_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub led_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub led_brightness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub time_zone_offset: Option<String>,
}

/// Accept a string or a number; anything else counts as missing
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

impl ConfigRecord {
    /// Parse a stored JSON object
    ///
    /// Numbers are accepted in place of strings; any other field type is
    /// treated as missing. Returns `None` if `json` is not an object.
    pub fn from_json(json: &str) -> Option<Self> {
        let value = serde_json::from_str::<Value>(json).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|err| StorageError::Encoding(err.to_string()))
    }
}

/// Parse one textual field, falling back to `default`
fn parse_field<T>(value: Option<&str>, name: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Copy + core::fmt::Debug,
{
    let Some(text) = value else {
        return default;
    };
    match text.trim().parse::<T>() {
        Ok(parsed) if valid(&parsed) => parsed,
        _ => {
            warn!("[Config] invalid {name} {text:?}, using {default:?}");
            default
        }
    }
}

impl Config {
    /// Build a config from a record, field by field
    pub fn from_record(record: &ConfigRecord) -> Self {
        let defaults = Self::default();
        Self {
            speed_limit: parse_field(
                record.speed_limit.as_deref(),
                FIELD_SPEED_LIMIT,
                defaults.speed_limit,
                |_| true,
            ),
            led_count: parse_field(
                record.led_count.as_deref(),
                FIELD_LED_COUNT,
                defaults.led_count,
                |&count| (1..=MAX_LED_COUNT).contains(&count),
            ),
            led_brightness: parse_field(
                record.led_brightness.as_deref(),
                FIELD_LED_BRIGHTNESS,
                defaults.led_brightness,
                |_| true,
            ),
            time_zone_offset: parse_field(
                record.time_zone_offset.as_deref(),
                FIELD_TIME_ZONE_OFFSET,
                defaults.time_zone_offset,
                |offset| TIME_ZONE_OFFSET_RANGE.contains(offset),
            ),
        }
    }

    pub fn to_record(&self) -> ConfigRecord {
        ConfigRecord {
            speed_limit: Some(self.speed_limit.to_string()),
            led_count: Some(self.led_count.to_string()),
            led_brightness: Some(self.led_brightness.to_string()),
            time_zone_offset: Some(self.time_zone_offset.to_string()),
        }
    }

    /// Parse stored JSON, `None` if it is not a JSON object
    pub fn from_json(json: &str) -> Option<Self> {
        ConfigRecord::from_json(json).map(|record| Self::from_record(&record))
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        self.to_record().to_json()
    }

    /// Load the config at boot
    ///
    /// Never fails: unreadable or malformed storage yields the defaults,
    /// which are then written back on a best-effort basis.
    pub fn load<S: ConfigStorage + ?Sized>(storage: &mut S) -> Self {
        let stored = match storage.read() {
            Ok(json) => Self::from_json(&json).or_else(|| {
                warn!("[Config.load] stored config is not a JSON object");
                None
            }),
            Err(err) => {
                warn!("[Config.load] failed to read config: {err}");
                None
            }
        };

        if let Some(config) = stored {
            info!("[Config.load] loaded {config:?}");
            return config;
        }

        let config = Self::default();
        info!("[Config.load] using defaults {config:?}");
        if let Err(err) = config.save(storage) {
            warn!("[Config.load] failed to persist defaults: {err}");
        }
        config
    }

    /// Write the config to storage
    pub fn save<S: ConfigStorage + ?Sized>(&self, storage: &mut S) -> Result<(), StorageError> {
        let json = self.to_json()?;
        storage.write(&json)
    }
}
