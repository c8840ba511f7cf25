//! Transverse Mercator projection (spherical form).
//!
//! Conformal projection defined by a central meridian and an origin
//! latitude; here both come from the centroid of the area being mapped,
//! which keeps distortion negligible across a regional area of interest.
//!
//! Forward maps geographic degrees to meters east/north of the origin;
//! inverse maps back. Formulas follow Snyder, "Map Projections: A
//! Working Manual", eq. 8-1..8-10 (sphere).

use std::f64::consts::PI;

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in radians
    lon0: f64,
    /// Origin latitude in radians
    lat0: f64,
    /// Scale factor along the central meridian
    k0: f64,
    /// Earth radius (meters)
    earth_radius: f64,
}

impl TransverseMercator {
    /// Mean Earth radius in meters.
    pub const EARTH_RADIUS: f64 = 6_371_000.0;

    /// Create a projection centered on the given origin (degrees).
    pub fn centered_on(origin_lon_deg: f64, origin_lat_deg: f64) -> Self {
        let to_rad = PI / 180.0;
        Self {
            lon0: origin_lon_deg * to_rad,
            lat0: origin_lat_deg * to_rad,
            k0: 1.0,
            earth_radius: Self::EARTH_RADIUS,
        }
    }

    /// Origin of the projection, (lon, lat) in degrees.
    pub fn origin(&self) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        (self.lon0 * to_deg, self.lat0 * to_deg)
    }

    /// Project geographic coordinates (degrees) to (x, y) in meters
    /// east/north of the origin.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let lon = lon_deg * to_rad;

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let b = lat.cos() * dlon.sin();
        // Clamp away from ±1; the singular points are 90° from the
        // central meridian and never inside a regional area.
        let b = b.clamp(-0.999_999_999, 0.999_999_999);

        let x = 0.5 * self.earth_radius * self.k0 * ((1.0 + b) / (1.0 - b)).ln();
        let y = self.earth_radius
            * self.k0
            * ((lat.tan() / dlon.cos()).atan() - self.lat0);

        (x, y)
    }

    /// Inverse projection: (x, y) meters back to (lon, lat) degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;

        let d = y / (self.earth_radius * self.k0) + self.lat0;
        let xr = x / (self.earth_radius * self.k0);

        let lat = (d.sin() / xr.cosh()).asin();
        let lon = self.lon0 + xr.sinh().atan2(d.cos());

        (lon * to_deg, lat * to_deg)
    }

    /// Projected extents of a geographic rectangle, sampling the edges
    /// since projected edges are curved.
    ///
    /// Returns (min_x, max_x, min_y, max_y) in meters.
    pub fn projected_extents(
        &self,
        west: f64,
        east: f64,
        south: f64,
        north: f64,
    ) -> (f64, f64, f64, f64) {
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        const STEPS: usize = 16;
        for t in 0..=STEPS {
            let frac = t as f64 / STEPS as f64;
            let lon = west + frac * (east - west);
            let lat = south + frac * (north - south);

            for (plon, plat) in [
                (lon, south), // bottom edge
                (lon, north), // top edge
                (west, lat),  // left edge
                (east, lat),  // right edge
            ] {
                let (x, y) = self.forward(plon, plat);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }

        (min_x, max_x, min_y, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = TransverseMercator::centered_on(-155.25, 19.75);
        let (x, y) = proj.forward(-155.25, 19.75);
        assert!(x.abs() < 1e-6, "x should be ~0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be ~0, got {}", y);
    }

    #[test]
    fn test_roundtrip() {
        let proj = TransverseMercator::centered_on(-155.25, 19.75);
        let (x, y) = proj.forward(-154.8, 20.1);
        let (lon, lat) = proj.inverse(x, y);
        assert!((lon - -154.8).abs() < 1e-9, "lon roundtrip: {}", lon);
        assert!((lat - 20.1).abs() < 1e-9, "lat roundtrip: {}", lat);
    }

    #[test]
    fn test_one_degree_latitude_is_about_111km() {
        let proj = TransverseMercator::centered_on(-155.25, 19.75);
        let (_, y) = proj.forward(-155.25, 20.75);
        let km = y / 1000.0;
        assert!(
            (km - 111.2).abs() < 1.0,
            "1° of latitude should be ~111 km, got {}",
            km
        );
    }

    #[test]
    fn test_axes_orientation() {
        let proj = TransverseMercator::centered_on(-155.25, 19.75);
        let (east_x, _) = proj.forward(-154.25, 19.75);
        let (_, north_y) = proj.forward(-155.25, 20.75);
        assert!(east_x > 0.0, "east of origin should be +x");
        assert!(north_y > 0.0, "north of origin should be +y");
    }

    #[test]
    fn test_extents_cover_corners() {
        let proj = TransverseMercator::centered_on(-155.25, 19.75);
        let (min_x, max_x, min_y, max_y) =
            proj.projected_extents(-156.0, -154.5, 19.0, 20.5);
        for (lon, lat) in [(-156.0, 19.0), (-154.5, 20.5)] {
            let (x, y) = proj.forward(lon, lat);
            assert!(x >= min_x - 1.0 && x <= max_x + 1.0);
            assert!(y >= min_y - 1.0 && y <= max_y + 1.0);
        }
        assert!(max_x > min_x && max_y > min_y);
    }

    #[test]
    fn test_wraparound_central_meridian() {
        // Area straddling the antimeridian, origin expressed at 185°
        let proj = TransverseMercator::centered_on(185.0, -15.0);
        let (x, _) = proj.forward(-175.0, -15.0); // alias of 185.0
        assert!(x.abs() < 1e-6, "aliased origin lon should be x=0, got {}", x);
    }
}
