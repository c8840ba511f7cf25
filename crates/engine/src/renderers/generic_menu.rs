//! Menu renderer: passes the backing source's listing through as
//! ordered lines, untouched.

use std::sync::Arc;

use async_trait::async_trait;

use backend_client::BackendClient;
use viz_common::{RenderOutput, RequestParams, VizResult};

use crate::context::ArtifactStore;
use crate::registry::DataSourceDescriptor;

use super::RendererPlugin;

pub struct GenericMenuRenderer {
    descriptor: Arc<DataSourceDescriptor>,
}

impl GenericMenuRenderer {
    pub fn new(descriptor: Arc<DataSourceDescriptor>) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl RendererPlugin for GenericMenuRenderer {
    fn actions(&self) -> &'static [&'static str] {
        &["menu"]
    }

    async fn handle(
        &self,
        client: &mut BackendClient,
        _action: &str,
        params: &RequestParams,
        _store: &ArtifactStore,
    ) -> VizResult<RenderOutput> {
        let lines = client
            .get_text(&self.descriptor.source_id, "channels", params)
            .await?;
        Ok(RenderOutput::Menu(lines))
    }
}
