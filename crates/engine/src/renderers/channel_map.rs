//! Channel map renderer: a projected map of an area of interest with
//! the data source's channels marked on it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use backend_client::BackendClient;
use renderer::{encode_rgba, BackgroundProvider, LabelSet, MapOptions, MapRenderer};
use viz_common::{
    Artifact, Channel, GeoArea, RenderOutput, RequestParams, VizError, VizResult,
};

use crate::context::ArtifactStore;
use crate::registry::DataSourceDescriptor;

use super::RendererPlugin;

pub struct ChannelMapRenderer {
    descriptor: Arc<DataSourceDescriptor>,
    background: Arc<dyn BackgroundProvider>,
    /// When set, a failed channel catalog fetch fails the whole
    /// request instead of degrading to an unlabeled map.
    strict_catalog: bool,
}

impl ChannelMapRenderer {
    pub fn new(
        descriptor: Arc<DataSourceDescriptor>,
        background: Arc<dyn BackgroundProvider>,
    ) -> Self {
        let strict_catalog = descriptor.params.get("catalog_failure") == Some("fail");
        Self {
            descriptor,
            background,
            strict_catalog,
        }
    }

    fn area_from(params: &RequestParams) -> VizResult<GeoArea> {
        GeoArea::new(
            params.require_f64("west")?,
            params.require_f64("east")?,
            params.require_f64("south")?,
            params.require_f64("north")?,
        )
    }

    /// Requested drawable box geometry, checked against the renderer's
    /// minimums up front so an undersized request never reaches a pool.
    fn box_geometry(params: &RequestParams) -> VizResult<(u32, u32)> {
        let box_width = params.u32_or("w", 1000)?;
        if box_width < 64 {
            return Err(VizError::InvalidParameter {
                param: "w".into(),
                message: format!("box width must be at least 64 pixels, got {}", box_width),
            });
        }
        let max_box_height = params.u32_or("mh", 600)?;
        if max_box_height < 64 {
            return Err(VizError::InvalidParameter {
                param: "mh".into(),
                message: format!(
                    "box height must be at least 64 pixels, got {}",
                    max_box_height
                ),
            });
        }
        Ok((box_width, max_box_height))
    }

    fn options_from(params: &RequestParams) -> VizResult<MapOptions> {
        let d = MapOptions::default();
        Ok(MapOptions {
            x_tick_marks: params.bool_or("xTickMarks", d.x_tick_marks)?,
            x_tick_values: params.bool_or("xTickValues", d.x_tick_values)?,
            x_units: params.bool_or("xUnits", d.x_units)?,
            x_label: params.bool_or("xLabel", d.x_label)?,
            y_tick_marks: params.bool_or("yTickMarks", d.y_tick_marks)?,
            y_tick_values: params.bool_or("yTickValues", d.y_tick_values)?,
            y_units: params.bool_or("yUnits", d.y_units)?,
            y_label: params.bool_or("yLabel", d.y_label)?,
        })
    }

    /// Fetch and parse the channel catalog. Malformed lines are
    /// skipped; a transport failure degrades to an empty catalog
    /// unless the descriptor asks for strict behavior.
    async fn fetch_catalog(&self, client: &mut BackendClient) -> VizResult<Vec<Channel>> {
        let lines = match client
            .get_text(&self.descriptor.source_id, "channels", &RequestParams::new())
            .await
        {
            Ok(lines) => lines,
            Err(e) if !self.strict_catalog => {
                warn!(source = %self.descriptor.name, error = %e,
                      "channel catalog unavailable, rendering without labels");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut channels = Vec::with_capacity(lines.len());
        for line in &lines {
            match Channel::parse(line) {
                Ok(ch) => channels.push(ch),
                Err(e) => warn!(%line, error = %e, "skipping malformed channel line"),
            }
        }
        Ok(channels)
    }
}

#[async_trait]
impl RendererPlugin for ChannelMapRenderer {
    fn actions(&self) -> &'static [&'static str] {
        &["map"]
    }

    fn validate(&self, _action: &str, params: &RequestParams) -> VizResult<()> {
        Self::area_from(params)?;
        Self::options_from(params)?;
        Self::box_geometry(params)?;
        params.id_set("ch")?;
        Ok(())
    }

    async fn handle(
        &self,
        client: &mut BackendClient,
        _action: &str,
        params: &RequestParams,
        store: &ArtifactStore,
    ) -> VizResult<RenderOutput> {
        let area = Self::area_from(params)?;
        let opts = Self::options_from(params)?;
        let (box_width, max_box_height) = Self::box_geometry(params)?;
        let selected = params.id_set("ch")?;

        let catalog = self.fetch_catalog(client).await?;
        let labels = LabelSet::from_catalog(&catalog, &selected).subset(&area);
        debug!(catalog = catalog.len(), shown = labels.len(), "channel labels");

        let map = MapRenderer::new(area, opts, box_width, max_box_height)?;
        let pixmap = map.render(&labels, self.background.as_ref())?;

        let (width, height) = map.panel_size();
        let png = encode_rgba(pixmap.data(), width as usize, height as usize)
            .map_err(VizError::Render)?;
        let (filename, url) = store.store_png(&png)?;

        Ok(RenderOutput::Plot(Artifact {
            filename,
            url,
            width,
            height,
            title: format!("Map: {}", self.descriptor.name),
            exportable: false,
            combinable: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_validate_rejects_inverted_area() {
        let p = params(&[
            ("west", "-156.0"),
            ("east", "-154.0"),
            ("south", "20.0"),
            ("north", "19.0"),
        ]);
        let d = Arc::new(DataSourceDescriptor {
            name: "hvo_seismic_map".into(),
            backend: "hvo".into(),
            source_id: "hvo_seismic".into(),
            renderer: crate::renderers::RendererKind::ChannelMap,
            params: RequestParams::new(),
        });
        let r = ChannelMapRenderer::new(d, Arc::new(renderer::SyntheticBackground));
        let err = r.validate("map", &p).unwrap_err();
        assert_eq!(err.kind(), "InvalidArea");
    }

    #[test]
    fn test_options_default_to_historical_behavior() {
        let opts = ChannelMapRenderer::options_from(&RequestParams::new()).unwrap();
        assert!(opts.x_tick_marks && opts.x_tick_values && opts.x_units);
        assert!(!opts.x_label && !opts.y_label);
    }

    #[test]
    fn test_options_parse_booleans() {
        let p = params(&[("xUnits", "false"), ("yLabel", "1")]);
        let opts = ChannelMapRenderer::options_from(&p).unwrap();
        assert!(!opts.x_units);
        assert!(opts.y_label);
    }
}
