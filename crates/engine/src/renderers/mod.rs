//! Renderer plugins and their closed kind registry.
//!
//! The set of renderer kinds is fixed at build time; configuration maps
//! each data source to one kind by name, and a typo fails configuration
//! load rather than a later request. Instances are constructed lazily,
//! once per data source, and shared by all subsequent requests, so a
//! plugin must keep no per-request mutable state.

mod channel_map;
mod generic_menu;
mod time_series;

pub use channel_map::ChannelMapRenderer;
pub use generic_menu::GenericMenuRenderer;
pub use time_series::TimeSeriesRenderer;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use backend_client::BackendClient;
use renderer::BackgroundProvider;
use viz_common::{RenderOutput, RequestParams, VizError, VizResult};

use crate::context::ArtifactStore;
use crate::registry::DataSourceDescriptor;

/// Closed set of renderer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    TimeSeriesPlot,
    GenericMenu,
    ChannelMap,
}

impl RendererKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RendererKind::TimeSeriesPlot => "time_series",
            RendererKind::GenericMenu => "generic_menu",
            RendererKind::ChannelMap => "channel_map",
        }
    }

    /// Static factory: build the plugin for a descriptor.
    pub fn build(
        &self,
        descriptor: Arc<DataSourceDescriptor>,
        background: Arc<dyn BackgroundProvider>,
    ) -> Arc<dyn RendererPlugin> {
        match self {
            RendererKind::TimeSeriesPlot => Arc::new(TimeSeriesRenderer::new(descriptor)),
            RendererKind::GenericMenu => Arc::new(GenericMenuRenderer::new(descriptor)),
            RendererKind::ChannelMap => {
                Arc::new(ChannelMapRenderer::new(descriptor, background))
            }
        }
    }
}

impl FromStr for RendererKind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_series" => Ok(RendererKind::TimeSeriesPlot),
            "generic_menu" => Ok(RendererKind::GenericMenu),
            "channel_map" => Ok(RendererKind::ChannelMap),
            other => Err(VizError::UnknownRendererKind(other.to_string())),
        }
    }
}

/// One renderer bound to a data source.
#[async_trait]
pub trait RendererPlugin: Send + Sync {
    /// Actions this renderer serves; checked by the dispatcher.
    fn actions(&self) -> &'static [&'static str];

    /// Request validation run before any pooled client is acquired.
    /// Must reject anything that would fail without needing the
    /// backend, so invalid requests never tie up a pool slot.
    fn validate(&self, _action: &str, _params: &RequestParams) -> VizResult<()> {
        Ok(())
    }

    /// Serve one request with an already-acquired client.
    async fn handle(
        &self,
        client: &mut BackendClient,
        action: &str,
        params: &RequestParams,
        store: &ArtifactStore,
    ) -> VizResult<RenderOutput>;
}

/// Memoized per-data-source plugin instances.
///
/// Construction happens while the map lock is held, so two requests
/// racing on first use collapse to a single construction.
#[derive(Default)]
pub struct RendererCache {
    inner: Mutex<HashMap<String, Arc<dyn RendererPlugin>>>,
}

impl RendererCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &self,
        source_name: &str,
        build: impl FnOnce() -> Arc<dyn RendererPlugin>,
    ) -> Arc<dyn RendererPlugin> {
        let mut cache = self.inner.lock().expect("renderer cache lock poisoned");
        cache
            .entry(source_name.to_string())
            .or_insert_with(build)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullRenderer;

    #[async_trait]
    impl RendererPlugin for NullRenderer {
        fn actions(&self) -> &'static [&'static str] {
            &[]
        }
        async fn handle(
            &self,
            _client: &mut BackendClient,
            _action: &str,
            _params: &RequestParams,
            _store: &ArtifactStore,
        ) -> VizResult<RenderOutput> {
            Ok(RenderOutput::Menu(Vec::new()))
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            RendererKind::TimeSeriesPlot,
            RendererKind::GenericMenu,
            RendererKind::ChannelMap,
        ] {
            assert_eq!(kind.as_str().parse::<RendererKind>().unwrap(), kind);
        }
        assert_eq!(
            "Plotter".parse::<RendererKind>().unwrap_err().kind(),
            "UnknownRendererKind"
        );
    }

    #[tokio::test]
    async fn test_cache_builds_at_most_once_under_contention() {
        let cache = Arc::new(RendererCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let builds = builds.clone();
            tasks.push(tokio::spawn(async move {
                cache.get_or_build("hvo_seismic_map", || {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Arc::new(NullRenderer) as Arc<dyn RendererPlugin>
                });
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_is_keyed_by_source_name() {
        let cache = RendererCache::new();
        let a = cache.get_or_build("a", || Arc::new(NullRenderer) as _);
        let a2 = cache.get_or_build("a", || Arc::new(NullRenderer) as _);
        let b = cache.get_or_build("b", || Arc::new(NullRenderer) as _);
        assert!(Arc::ptr_eq(&a, &a2));
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
