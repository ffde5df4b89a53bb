use serde::Deserialize;
use serde_json::Value;
use std::{fmt, ops::RangeInclusive, str::FromStr};
use thiserror::Error;

use crate::model::{Observation, ObservationId, SkyCondition, TemperatureUnit};

/// One input of the observation form, named as the service names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Latitude,
    Longitude,
    SkyCondition,
    AirTemperature,
    AirTemperatureUnit,
}

/// A selectable value for an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub value: String,
    pub label: &'static str,
}

impl fmt::Display for FieldOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

impl Field {
    pub const fn all() -> &'static [Field] {
        &[
            Field::Latitude,
            Field::Longitude,
            Field::AirTemperature,
            Field::AirTemperatureUnit,
            Field::SkyCondition,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::SkyCondition => "sky_condition",
            Field::AirTemperature => "air_temperature",
            Field::AirTemperatureUnit => "air_temperature_unit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
            Field::SkyCondition => "Sky conditions",
            Field::AirTemperature => "Air Temperature",
            Field::AirTemperatureUnit => "Air Temperature Unit",
        }
    }

    /// Accepted range for numeric fields.
    pub fn range(&self) -> Option<RangeInclusive<f64>> {
        match self {
            Field::Latitude => Some(-90.0..=90.0),
            Field::Longitude => Some(-180.0..=180.0),
            Field::AirTemperature => Some(-50.0..=107.0),
            Field::SkyCondition | Field::AirTemperatureUnit => None,
        }
    }

    pub fn hint(&self) -> Option<String> {
        self.range()
            .map(|range| format!("Enter a value between {} and {}.", range.start(), range.end()))
    }

    /// Choices for enumerated fields; empty for numeric ones.
    pub fn options(&self) -> Vec<FieldOption> {
        match self {
            Field::SkyCondition => SkyCondition::all()
                .iter()
                .map(|sky| FieldOption { value: sky.code().to_string(), label: sky.label() })
                .collect(),
            Field::AirTemperatureUnit => TemperatureUnit::all()
                .iter()
                .map(|unit| FieldOption { value: unit.as_str().to_string(), label: unit.label() })
                .collect(),
            Field::Latitude | Field::Longitude | Field::AirTemperature => Vec::new(),
        }
    }

    /// Applies the input constraints of this field to raw text.
    pub fn check(&self, raw: &str) -> Result<(), Violation> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Violation::Missing);
        }

        match self.range() {
            Some(range) => {
                let value: f64 = raw.parse().map_err(|_| Violation::NotANumber)?;
                if !value.is_finite() {
                    return Err(Violation::NotANumber);
                }
                if !range.contains(&value) {
                    return Err(Violation::OutOfRange { min: *range.start(), max: *range.end() });
                }
                Ok(())
            }
            None if self.options().iter().any(|opt| opt.value == raw) => Ok(()),
            None => Err(Violation::UnknownOption),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown form field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::all()
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Violation {
    #[error("is required")]
    Missing,
    #[error("must be a number")]
    NotANumber,
    #[error("must be between {min} and {max}")]
    OutOfRange { min: f64, max: f64 },
    #[error("must be one of the listed options")]
    UnknownOption,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("{field} {violation}")]
pub struct FieldViolation {
    pub field: Field,
    pub violation: Violation,
}

/// Raw text of every input plus the id captured when editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub observation_id: Option<ObservationId>,
    pub latitude: String,
    pub longitude: String,
    pub sky_condition: String,
    pub air_temperature: String,
    pub air_temperature_unit: String,
}

impl Draft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Latitude => &self.latitude,
            Field::Longitude => &self.longitude,
            Field::SkyCondition => &self.sky_condition,
            Field::AirTemperature => &self.air_temperature,
            Field::AirTemperatureUnit => &self.air_temperature_unit,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Latitude => &mut self.latitude,
            Field::Longitude => &mut self.longitude,
            Field::SkyCondition => &mut self.sky_condition,
            Field::AirTemperature => &mut self.air_temperature,
            Field::AirTemperatureUnit => &mut self.air_temperature_unit,
        }
    }

    /// Checks every field and builds the observation to send.
    ///
    /// All violations are collected, in form order.
    pub fn validate(&self) -> Result<Observation, Vec<FieldViolation>> {
        let violations: Vec<FieldViolation> = Field::all()
            .iter()
            .filter_map(|&field| {
                let violation = field.check(self.get(field)).err()?;
                Some(FieldViolation { field, violation })
            })
            .collect();

        if !violations.is_empty() {
            return Err(violations);
        }

        // Every field passed `check`, so these parses cannot fail.
        let number = |field: Field| self.get(field).trim().parse::<f64>().unwrap_or_default();
        let invalid =
            |field: Field| vec![FieldViolation { field, violation: Violation::UnknownOption }];

        Ok(Observation {
            observation_id: self.observation_id,
            latitude: number(Field::Latitude),
            longitude: number(Field::Longitude),
            sky_condition: self.sky_condition.parse().map_err(|_| invalid(Field::SkyCondition))?,
            air_temperature: number(Field::AirTemperature),
            air_temperature_unit: self
                .air_temperature_unit
                .parse()
                .map_err(|_| invalid(Field::AirTemperatureUnit))?,
            created_at: None,
            updated_at: None,
        })
    }

    /// Draft holding each field's text exactly as the service returned it.
    ///
    /// `"45.000"` stays `"45.000"`; numbers keep their JSON spelling.
    pub fn from_record(record: &Value) -> Self {
        let text = |field: Field| match record.get(field.name()) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Self {
            observation_id: record
                .get("observation_id")
                .and_then(|id| ObservationId::deserialize(id).ok()),
            latitude: text(Field::Latitude),
            longitude: text(Field::Longitude),
            sky_condition: text(Field::SkyCondition),
            air_temperature: text(Field::AirTemperature),
            air_temperature_unit: text(Field::AirTemperatureUnit),
        }
    }
}

/// Returns a copy of `draft` with exactly one field replaced.
pub fn apply_field_change(draft: &Draft, field: Field, value: impl Into<String>) -> Draft {
    let mut next = draft.clone();
    *next.slot_mut(field) = value.into();
    next
}
