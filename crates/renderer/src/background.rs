//! Background raster providers for map rendering.
//!
//! The map renderer asks a provider for an RGBA tile covering the
//! drawable box; the provider resamples its imagery through the inverse
//! projection so the background lines up with projected labels and
//! graticule lines.

use image::RgbaImage;
use projection::TransverseMercator;
use tracing::warn;
use viz_common::VizResult;

/// Projected extents of the drawable box: (min_x, max_x, min_y, max_y)
/// in meters.
pub type Extents = (f64, f64, f64, f64);

/// Source of background imagery for map rendering.
pub trait BackgroundProvider: Send + Sync {
    /// Produce an RGBA buffer (width*height*4) covering the given
    /// projected extents, or `None` if no imagery covers the area.
    fn render(
        &self,
        proj: &TransverseMercator,
        extents: Extents,
        width: u32,
        height: u32,
    ) -> Option<Vec<u8>>;
}

/// Flat shaded background used when no imagery is configured or none
/// covers the requested area. Light ocean tone with a subtle vertical
/// gradient so the drawable box reads as a map, not a blank panel.
#[derive(Debug, Default)]
pub struct SyntheticBackground;

impl BackgroundProvider for SyntheticBackground {
    fn render(
        &self,
        _proj: &TransverseMercator,
        _extents: Extents,
        width: u32,
        height: u32,
    ) -> Option<Vec<u8>> {
        let mut buf = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let t = y as f32 / height.max(1) as f32;
            let r = (168.0 + 20.0 * t) as u8;
            let g = (208.0 + 16.0 * t) as u8;
            let b = (232.0 + 12.0 * t) as u8;
            for _ in 0..width {
                buf.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Some(buf)
    }
}

/// Equirectangular imagery loaded from a file, resampled per pixel
/// through the inverse projection.
pub struct FileBackground {
    image: RgbaImage,
    /// Geographic bounds of the image: west, east, south, north.
    west: f64,
    east: f64,
    south: f64,
    north: f64,
}

impl FileBackground {
    /// Load an equirectangular image covering the given geographic
    /// bounds (e.g. a whole-world basemap with bounds -180..180,
    /// -90..90).
    pub fn load(
        path: &std::path::Path,
        west: f64,
        east: f64,
        south: f64,
        north: f64,
    ) -> VizResult<Self> {
        let image = image::open(path)
            .map_err(|e| {
                viz_common::VizError::Config(format!(
                    "cannot load background imagery {}: {}",
                    path.display(),
                    e
                ))
            })?
            .to_rgba8();
        Ok(Self {
            image,
            west,
            east,
            south,
            north,
        })
    }

    /// Nearest-pixel sample at a geographic position.
    fn sample(&self, lon: f64, lat: f64) -> Option<[u8; 4]> {
        // Alias longitudes into the image's frame
        let mut lon = lon;
        if lon < self.west {
            lon += 360.0;
        } else if lon > self.east {
            lon -= 360.0;
        }
        if lon < self.west || lon > self.east || lat < self.south || lat > self.north {
            return None;
        }

        let u = (lon - self.west) / (self.east - self.west);
        let v = (self.north - lat) / (self.north - self.south);
        let x = ((u * (self.image.width() - 1) as f64).round() as u32).min(self.image.width() - 1);
        let y = ((v * (self.image.height() - 1) as f64).round() as u32).min(self.image.height() - 1);
        Some(self.image.get_pixel(x, y).0)
    }
}

impl BackgroundProvider for FileBackground {
    fn render(
        &self,
        proj: &TransverseMercator,
        extents: Extents,
        width: u32,
        height: u32,
    ) -> Option<Vec<u8>> {
        let (min_x, max_x, min_y, max_y) = extents;
        if width == 0 || height == 0 || max_x <= min_x || max_y <= min_y {
            warn!(width, height, "degenerate background request");
            return None;
        }

        let mut buf = vec![0u8; (width * height * 4) as usize];
        let mut covered = false;

        for py in 0..height {
            // Pixel row 0 is the top of the box, i.e. max_y in meters
            let y = max_y - (py as f64 + 0.5) / height as f64 * (max_y - min_y);
            for px in 0..width {
                let x = min_x + (px as f64 + 0.5) / width as f64 * (max_x - min_x);
                let (lon, lat) = proj.inverse(x, y);
                if let Some(rgba) = self.sample(lon, lat) {
                    let off = ((py * width + px) * 4) as usize;
                    buf[off..off + 4].copy_from_slice(&rgba);
                    covered = true;
                }
            }
        }

        if covered {
            Some(buf)
        } else {
            None
        }
    }
}
