//! Request dispatch.
//!
//! One `dispatch` call serves one request end to end. The ordering is
//! load-bearing: the data source and action are resolved and the
//! request validated before any pooled client is touched, so a request
//! that cannot possibly succeed never consumes a pool slot. Once a
//! client is acquired its release is owned by the guard's drop, which
//! runs on success, error, and panic alike.

use std::sync::Arc;

use tracing::{debug, instrument};

use viz_common::{RenderOutput, RequestParams, VizError, VizResult};

use crate::context::AppContext;
use crate::renderers::RendererPlugin;

pub struct Dispatcher {
    ctx: Arc<AppContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Serve one request against a named data source.
    #[instrument(skip(self, params), fields(%source, %action))]
    pub async fn dispatch(
        &self,
        source: &str,
        action: &str,
        params: &RequestParams,
    ) -> VizResult<RenderOutput> {
        let descriptor = self.ctx.sources.resolve(source)?;

        let renderer: Arc<dyn RendererPlugin> =
            self.ctx.renderers.get_or_build(&descriptor.name, || {
                descriptor
                    .renderer
                    .build(descriptor.clone(), self.ctx.background.clone())
            });

        if !renderer.actions().contains(&action) {
            return Err(VizError::UnknownAction {
                data_source: source.to_string(),
                action: action.to_string(),
            });
        }
        renderer.validate(action, params)?;

        let pool = self.ctx.pools.resolve(&descriptor.backend)?;
        let mut client = pool.acquire().await?;
        debug!(pool = pool.name(), "client acquired");

        renderer.handle(&mut client, action, params, &self.ctx.store).await
    }
}
