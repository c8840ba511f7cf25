//! Time series renderer: fetches ordered time/value samples from the
//! backing source and draws them as a polyline plot.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use backend_client::BackendClient;
use renderer::{encode_rgba, SeriesPoint, SeriesRenderer};
use viz_common::{Artifact, RenderOutput, RequestParams, VizError, VizResult};

use crate::context::ArtifactStore;
use crate::registry::DataSourceDescriptor;

use super::RendererPlugin;

pub struct TimeSeriesRenderer {
    descriptor: Arc<DataSourceDescriptor>,
}

impl TimeSeriesRenderer {
    pub fn new(descriptor: Arc<DataSourceDescriptor>) -> Self {
        Self { descriptor }
    }

    /// Requested plot box, checked against the renderer's minimums up
    /// front so an undersized request never reaches a pool.
    fn box_geometry(params: &RequestParams) -> VizResult<(u32, u32)> {
        let box_width = params.u32_or("w", 1000)?;
        if box_width < 64 {
            return Err(VizError::InvalidParameter {
                param: "w".into(),
                message: format!("box width must be at least 64 pixels, got {}", box_width),
            });
        }
        let box_height = params.u32_or("h", 250)?;
        if box_height < 48 {
            return Err(VizError::InvalidParameter {
                param: "h".into(),
                message: format!("box height must be at least 48 pixels, got {}", box_height),
            });
        }
        Ok((box_width, box_height))
    }
}

#[async_trait]
impl RendererPlugin for TimeSeriesRenderer {
    fn actions(&self) -> &'static [&'static str] {
        &["plot"]
    }

    fn validate(&self, _action: &str, params: &RequestParams) -> VizResult<()> {
        Self::box_geometry(params)?;
        Ok(())
    }

    async fn handle(
        &self,
        client: &mut BackendClient,
        _action: &str,
        params: &RequestParams,
        store: &ArtifactStore,
    ) -> VizResult<RenderOutput> {
        let (box_width, box_height) = Self::box_geometry(params)?;

        // Forward everything except our own sizing knobs so the
        // backend sees time windows, channel filters, and the rest.
        let forwarded: RequestParams = params
            .iter()
            .filter(|(k, _)| *k != "w" && *k != "h")
            .collect();

        let lines = client
            .get_text(&self.descriptor.source_id, "data", &forwarded)
            .await?;

        // A malformed sample means the backend and this process
        // disagree about the wire format; do not render a lie.
        let points = lines
            .iter()
            .map(|line| SeriesPoint::parse(line))
            .collect::<VizResult<Vec<_>>>()
            .map_err(|e| VizError::Transport(format!("bad series line: {}", e)))?;
        debug!(points = points.len(), "series payload");

        let plot = SeriesRenderer::new(box_width, box_height)?;
        let pixmap = plot.render(&points)?;

        let (width, height) = plot.panel_size();
        let png = encode_rgba(pixmap.data(), width as usize, height as usize)
            .map_err(VizError::Render)?;
        let (filename, url) = store.store_png(&png)?;

        Ok(RenderOutput::Plot(Artifact {
            filename,
            url,
            width,
            height,
            title: self.descriptor.name.clone(),
            exportable: true,
            combinable: true,
        }))
    }
}
