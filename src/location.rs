//! Best-effort geolocation. A missing position never blocks attendance.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Stored instead of coordinates when the position cannot be determined.
pub const LOCATION_UNAVAILABLE: &str = "Lokasi tidak dapat dideteksi";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(LocationError::OutOfRange {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LocationError {
    #[error("position unavailable")]
    Unavailable,
    #[error("coordinates out of range: {latitude}, {longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
}

#[allow(async_fn_in_trait)]
pub trait LocationProvider {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// A position known up front: reported by a browser with the request, or
/// configured for a fixed kiosk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(Option<(f64, f64)>);

impl FixedLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(Some((latitude, longitude)))
    }

    pub fn unknown() -> Self {
        Self(None)
    }

    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => Self::unknown(),
        }
    }
}

impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let (lat, lon) = self.0.ok_or(LocationError::Unavailable)?;
        Coordinates::new(lat, lon)
    }
}

pub async fn resolve_location<L: LocationProvider>(provider: &L) -> String {
    match provider.locate().await {
        Ok(coords) => coords.to_string(),
        Err(e) => {
            warn!(error = %e, "Location lookup failed, using placeholder");
            LOCATION_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn formats_with_four_decimals() {
        let coords = Coordinates::new(-6.200_012, 106.816_66).unwrap();
        assert_eq!(coords.to_string(), "-6.2000, 106.8167");
    }

    #[rstest]
    #[case(FixedLocation::unknown())]
    #[case(FixedLocation::from_parts(Some(1.0), None))]
    #[case(FixedLocation::new(91.0, 0.0))]
    #[case(FixedLocation::new(f64::NAN, 0.0))]
    #[tokio::test]
    async fn failures_fall_back_to_placeholder(#[case] provider: FixedLocation) {
        assert_eq!(resolve_location(&provider).await, LOCATION_UNAVAILABLE);
    }

    #[tokio::test]
    async fn known_position_is_formatted() {
        let provider = FixedLocation::new(1.5, -2.25);
        assert_eq!(resolve_location(&provider).await, "1.5000, -2.2500");
    }
}
