//! Geographic area-of-interest type.

use serde::{Deserialize, Serialize};

use crate::error::{VizError, VizResult};

/// A geographic bounding box in degrees.
///
/// West/east may exceed the [-180, 180] range (up to a full wrap either
/// way) so that areas spanning the antimeridian can be expressed, but
/// latitudes are hard-bounded and south must lie strictly below north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoArea {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl GeoArea {
    /// Create a validated area of interest.
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> VizResult<Self> {
        if !(-360.0..=360.0).contains(&west) {
            return Err(VizError::InvalidArea(format!("west={}", west)));
        }
        if !(-360.0..=360.0).contains(&east) {
            return Err(VizError::InvalidArea(format!("east={}", east)));
        }
        if south < -90.0 {
            return Err(VizError::InvalidArea(format!("south={}", south)));
        }
        if north > 90.0 {
            return Err(VizError::InvalidArea(format!("north={}", north)));
        }
        if south >= north {
            return Err(VizError::InvalidArea(format!(
                "south={}, north={}",
                south, north
            )));
        }
        Ok(Self {
            west,
            east,
            south,
            north,
        })
    }

    /// Longitudinal extent in degrees.
    pub fn lon_width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitudinal extent in degrees.
    pub fn lat_height(&self) -> f64 {
        self.north - self.south
    }

    /// Centroid of the area, (lon, lat) in degrees.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Check if a geographic point falls inside the area.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        // Accept either the raw longitude or its 360-degree alias, since
        // west/east may be expressed outside [-180, 180].
        (lon >= self.west && lon <= self.east)
            || (lon + 360.0 >= self.west && lon + 360.0 <= self.east)
            || (lon - 360.0 >= self.west && lon - 360.0 <= self.east)
    }
}
