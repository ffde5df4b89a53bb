use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Identifier assigned by the service when an observation is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub u64);

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObservationId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ObservationId)
    }
}

/// A single weather observation as exchanged with the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<ObservationId>,

    #[serde(serialize_with = "compact_number", deserialize_with = "lenient_number")]
    pub latitude: f64,

    #[serde(serialize_with = "compact_number", deserialize_with = "lenient_number")]
    pub longitude: f64,

    pub sky_condition: SkyCondition,

    #[serde(serialize_with = "compact_number", deserialize_with = "lenient_number")]
    pub air_temperature: f64,

    pub air_temperature_unit: TemperatureUnit,

    /// Service-maintained timestamps. Read for display, never sent back.
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Weather-station sky condition classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkyCondition {
    Cloudless,
    SomeClouds,
    CloudCovered,
    Foggy,
    Raining,
    Snowing,
    Hailing,
    Thunderstorms,
}

impl SkyCondition {
    pub const fn code(&self) -> u16 {
        match self {
            SkyCondition::Cloudless => 100,
            SkyCondition::SomeClouds => 101,
            SkyCondition::CloudCovered => 102,
            SkyCondition::Foggy => 103,
            SkyCondition::Raining => 104,
            SkyCondition::Snowing => 106,
            SkyCondition::Hailing => 108,
            SkyCondition::Thunderstorms => 109,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkyCondition::Cloudless => "Cloudless",
            SkyCondition::SomeClouds => "Some clouds",
            SkyCondition::CloudCovered => "Cloud covered",
            SkyCondition::Foggy => "Foggy",
            SkyCondition::Raining => "Raining",
            SkyCondition::Snowing => "Snowing",
            SkyCondition::Hailing => "Hailing",
            SkyCondition::Thunderstorms => "Thunderstorms",
        }
    }

    pub const fn all() -> &'static [SkyCondition] {
        &[
            SkyCondition::Cloudless,
            SkyCondition::SomeClouds,
            SkyCondition::CloudCovered,
            SkyCondition::Foggy,
            SkyCondition::Raining,
            SkyCondition::Snowing,
            SkyCondition::Hailing,
            SkyCondition::Thunderstorms,
        ]
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::all().iter().copied().find(|sky| sky.code() == code)
    }
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SkyCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .ok()
            .and_then(SkyCondition::from_code)
            .ok_or_else(|| format!("unknown sky condition code '{s}'"))
    }
}

impl Serialize for SkyCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for SkyCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Code {
            Number(u16),
            Text(String),
        }

        match Code::deserialize(deserializer)? {
            Code::Number(code) => SkyCondition::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown sky condition code {code}"))),
            Code::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" | "c" => Ok(TemperatureUnit::Celsius),
            "F" | "f" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(format!("unknown temperature unit '{other}'")),
        }
    }
}

/// Writes whole numbers as JSON integers so `45.0` goes out as `45`.
fn compact_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Decimal columns often come back as strings; accept both.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Value(f64),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Value(n) => Ok(n),
        Number::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a number, got '{text}'"))),
    }
}
