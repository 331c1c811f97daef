//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Decimal places kept when bucketing coordinates for cache keys (~110 m).
pub const BUCKET_PRECISION: u32 = 3;

/// GPS coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
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

    /// Build coordinates from optional halves.
    ///
    /// Both present gives `Ok(Some(..))`, both absent gives `Ok(None)`.
    /// A half-set pair is rejected.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, &'static str> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Ok(Some(Self::new(lat, lon))),
            (None, None) => Ok(None),
            _ => Err("Latitude and longitude must be provided together"),
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn bucket(&self) -> CoordinateBucket {
        CoordinateBucket::from(*self)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Coordinates rounded to [`BUCKET_PRECISION`] decimals, stored as scaled
/// integers so the bucket can be hashed and compared exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateBucket {
    lat_milli: i64,
    lon_milli: i64,
}

impl CoordinateBucket {
    fn scale() -> f64 {
        10f64.powi(BUCKET_PRECISION as i32)
    }

    /// Centre of the bucket, used when a single representative point is needed
    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            self.lat_milli as f64 / Self::scale(),
            self.lon_milli as f64 / Self::scale(),
        )
    }
}

impl From<Coordinates> for CoordinateBucket {
    fn from(c: Coordinates) -> Self {
        Self {
            lat_milli: (c.latitude * Self::scale()).round() as i64,
            lon_milli: (c.longitude * Self::scale()).round() as i64,
        }
    }
}

impl std::fmt::Display for CoordinateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.center();
        write!(f, "{:.3},{:.3}", c.latitude, c.longitude)
    }
}

/// How a location is identified when asking an upstream for weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherLocator {
    Coordinates(Coordinates),
    Address(String),
}

impl std::fmt::Display for WeatherLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherLocator::Coordinates(c) => write!(f, "{}", c),
            WeatherLocator::Address(a) => write!(f, "{}", a),
        }
    }
}

/// Normalize a free-text address for use as a cache key.
///
/// Trims, collapses runs of whitespace to one space and lowercases.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_rounds_to_three_decimals() {
        let a = Coordinates::new(18.78831, 98.98529);
        let b = Coordinates::new(18.78849, 98.98549);
        assert_eq!(a.bucket(), b.bucket());

        let c = Coordinates::new(18.7886, 98.9853);
        assert_ne!(a.bucket(), c.bucket());
    }

    #[test]
    fn test_bucket_center() {
        let bucket = Coordinates::new(-33.86882, 151.20929).bucket();
        let center = bucket.center();
        assert!((center.latitude - -33.869).abs() < 1e-9);
        assert!((center.longitude - 151.209).abs() < 1e-9);
        assert_eq!(bucket.to_string(), "-33.869,151.209");
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            Coordinates::from_parts(Some(1.0), Some(2.0)),
            Ok(Some(Coordinates::new(1.0, 2.0)))
        );
        assert_eq!(Coordinates::from_parts(None, None), Ok(None));
        assert!(Coordinates::from_parts(Some(1.0), None).is_err());
        assert!(Coordinates::from_parts(None, Some(2.0)).is_err());
    }

    #[test]
    fn test_range_check() {
        assert!(Coordinates::new(90.0, 180.0).is_in_range());
        assert!(Coordinates::new(-90.0, -180.0).is_in_range());
        assert!(!Coordinates::new(90.1, 0.0).is_in_range());
        assert!(!Coordinates::new(0.0, -180.5).is_in_range());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_in_range());
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("  12 Farm   Road,\tSpringfield  "),
            "12 farm road, springfield"
        );
        assert_eq!(normalize_address("AMES, Iowa"), normalize_address("ames,  iowa"));
    }
}
