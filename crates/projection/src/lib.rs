//! Map projections for volcano-viz.
//!
//! Currently a single conformal projection: Transverse Mercator, the
//! standard choice for regional volcano-monitoring maps. Conformality
//! keeps local angular relationships accurate at those scales.

pub mod transverse_mercator;

pub use transverse_mercator::TransverseMercator;
