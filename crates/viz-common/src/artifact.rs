//! Produced artifacts and renderer outputs.

use serde::{Deserialize, Serialize};

/// Metadata for a rendered raster artifact.
///
/// Handed to the (external) result-serialization layer; the raster file
/// itself lives on durable storage under `filename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Filename on durable storage, unique per request.
    pub filename: String,
    /// Retrieval URL for the excluded web layer.
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Whether the underlying data may be exported by the caller.
    pub exportable: bool,
    /// Whether this plot may be merged with other plot artifacts.
    pub combinable: bool,
}

/// Result of a renderer invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderOutput {
    /// A rendered raster artifact.
    Plot(Artifact),
    /// A menu-style listing, ordered as received from the backend.
    Menu(Vec<String>),
}

impl RenderOutput {
    pub fn as_plot(&self) -> Option<&Artifact> {
        match self {
            RenderOutput::Plot(a) => Some(a),
            RenderOutput::Menu(_) => None,
        }
    }
}
