use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Coordinates;

pub const MAX_NAME_LENGTH: usize = 100;

pub type LocationId = i64;

/// A stored location record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    pub fn lookup(&self) -> Lookup {
        Lookup::new(&self.name, self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationName(String);

#[derive(Error, Debug)]
pub enum NameParseError {
    #[error("name is empty")]
    Empty,
    #[error("name is too long")]
    TooLong,
}

impl LocationName {
    pub fn parse(input: &str) -> Result<Self, NameParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(NameParseError::Empty);
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(NameParseError::TooLong);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocationName {
    type Error = NameParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Validated record contents, used for both inserts and full rewrites
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFields {
    pub name: LocationName,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationFields {
    pub fn lookup(&self) -> Lookup {
        Lookup::new(self.name.as_str(), self.latitude, self.longitude)
    }
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub name: Option<LocationName>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationPatch {
    pub fn apply(self, current: &Location) -> LocationFields {
        LocationFields {
            name: self
                .name
                .unwrap_or_else(|| LocationName(current.name.clone())),
            latitude: self.latitude.or(current.latitude),
            longitude: self.longitude.or(current.longitude),
        }
    }
}

/// What the weather service is asked about: the coordinate pair when the
/// record has one, otherwise its name.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Coordinates(Coordinates),
    Name(String),
}

impl Lookup {
    pub fn new(name: &str, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::Coordinates(Coordinates::new(lat, lon)),
            _ => Self::Name(name.to_string()),
        }
    }

    pub fn cache_key(&self) -> String {
        match self {
            Self::Coordinates(coords) => coords.key().into_string(),
            Self::Name(name) => format!("name_{}", name.to_lowercase()),
        }
    }
}

impl From<Coordinates> for Lookup {
    fn from(coords: Coordinates) -> Self {
        Self::Coordinates(coords)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(latitude: Option<f64>, longitude: Option<f64>) -> Location {
        Location {
            id: 7,
            name: "Bengaluru".to_string(),
            latitude,
            longitude,
        }
    }

    #[test]
    fn allowed_names() {
        let names = ["Bengaluru", "  New Location ", "São Paulo", "a"];
        for name in names {
            let result = LocationName::parse(name);
            assert!(
                result.is_ok(),
                "{} should be allowed, instead: {:?}",
                name,
                result
            );
        }
        assert_eq!(
            LocationName::parse("  New Location ").unwrap().as_str(),
            "New Location"
        );
    }

    #[test]
    fn disallowed_names() {
        let too_long = "x".repeat(MAX_NAME_LENGTH + 1);
        let names = ["", "   ", "\t\n", too_long.as_str()];
        for name in names {
            let result = LocationName::parse(name);
            assert!(
                result.is_err(),
                "{:?} should not be allowed, instead: {:?}",
                name,
                result
            );
        }
    }

    #[test]
    fn lookup_prefers_coordinates() {
        let lookup = record(Some(12.9716), Some(77.5946)).lookup();
        assert_eq!(lookup, Lookup::Coordinates(Coordinates::new(12.9716, 77.5946)));
        assert_eq!(lookup.cache_key(), "12.9716_77.5946");
    }

    #[test]
    fn lookup_falls_back_to_name() {
        for (lat, lon) in [(None, None), (Some(1.0), None), (None, Some(1.0))] {
            let lookup = record(lat, lon).lookup();
            assert_eq!(lookup, Lookup::Name("Bengaluru".to_string()));
            assert_eq!(lookup.cache_key(), "name_bengaluru");
        }
    }

    #[test]
    fn patch_merges_onto_current() {
        let current = record(Some(1.0), Some(1.0));

        let patch = LocationPatch {
            latitude: Some(2.0),
            ..Default::default()
        };
        let fields = patch.apply(&current);
        assert_eq!(fields.name.as_str(), "Bengaluru");
        assert_eq!(fields.latitude, Some(2.0));
        assert_eq!(fields.longitude, Some(1.0));

        let fields = LocationPatch::default().apply(&current);
        assert_eq!(fields.lookup(), current.lookup());
        assert_eq!(fields.name.as_str(), current.name);
    }
}
