//! Raster composition for volcano-viz.
//!
//! The map renderer projects an area of interest through a conformal
//! projection, composes a background, graticule, scale bar, and point
//! labels onto a `tiny_skia` pixmap, and encodes the result as PNG. The
//! series renderer draws simple time/value polyline plots.

pub mod background;
pub mod labels;
pub mod map;
pub mod png;
pub mod series;
pub mod text;

pub use background::{BackgroundProvider, FileBackground, SyntheticBackground};
pub use labels::{GeoLabel, LabelSet};
pub use map::{MapOptions, MapRenderer};
pub use png::encode_rgba;
pub use series::{SeriesPoint, SeriesRenderer};
