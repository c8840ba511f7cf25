//! Shared types for the volcano-viz workspace.

pub mod artifact;
pub mod channel;
pub mod error;
pub mod geo;
pub mod params;

pub use artifact::{Artifact, RenderOutput};
pub use channel::Channel;
pub use error::{VizError, VizResult};
pub use geo::GeoArea;
pub use params::RequestParams;
