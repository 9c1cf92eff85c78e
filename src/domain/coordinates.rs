use std::fmt;

/// A latitude/longitude pair as stored on a location record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::make(self.latitude, self.longitude)
    }
}

/// Cache key derived from a coordinate pair, formatted as `"<lat>_<lon>"`.
///
/// Each component uses the shortest decimal text that round-trips the `f64`,
/// so `12.9716` stays `12.9716` and `1.0` becomes `1`. Negative zero is folded
/// into zero so both signs land on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoordinateKey(String);

impl CoordinateKey {
    pub fn make(latitude: f64, longitude: f64) -> Self {
        Self(format!(
            "{}_{}",
            canonical(latitude),
            canonical(longitude)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_format() {
        let cases = [
            ((12.9716, 77.5946), "12.9716_77.5946"),
            ((1.0, 1.0), "1_1"),
            ((3.0, 3.0), "3_3"),
            ((-33.8688, 151.2093), "-33.8688_151.2093"),
            ((12.9715987, 77.5945627), "12.9715987_77.5945627"),
        ];

        for ((lat, lon), expected) in cases {
            assert_eq!(
                CoordinateKey::make(lat, lon).as_str(),
                expected,
                "unexpected key for ({lat}, {lon})"
            );
        }
    }

    #[test]
    fn key_is_deterministic() {
        let pairs = [(0.5, -0.25), (89.999999, -179.000001), (45.0, 90.0)];

        for (lat, lon) in pairs {
            assert_eq!(CoordinateKey::make(lat, lon), CoordinateKey::make(lat, lon));
            assert_eq!(
                Coordinates::new(lat, lon).key(),
                CoordinateKey::make(lat, lon)
            );
        }
    }

    #[test]
    fn negative_zero_folds() {
        assert_eq!(CoordinateKey::make(-0.0, -0.0).as_str(), "0_0");
        assert_eq!(CoordinateKey::make(-0.0, 0.0), CoordinateKey::make(0.0, 0.0));
    }

    #[test]
    fn trailing_zeros_do_not_matter() {
        let a: f64 = "12.97160".parse().unwrap();
        let b: f64 = "12.9716".parse().unwrap();
        assert_eq!(CoordinateKey::make(a, 1.0), CoordinateKey::make(b, 1.0));
    }

    #[test]
    fn distinct_pairs_distinct_keys() {
        assert_ne!(CoordinateKey::make(1.0, 2.0), CoordinateKey::make(2.0, 1.0));
        assert_ne!(
            CoordinateKey::make(12.9716, 77.5946),
            CoordinateKey::make(12.97161, 77.5946)
        );
    }
}
