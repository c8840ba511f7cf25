//! Read-only registries built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use backend_client::ClientPool;
use viz_common::{RequestParams, VizError, VizResult};

use crate::renderers::RendererKind;

/// Everything needed to serve one configured data source.
#[derive(Debug, Clone)]
pub struct DataSourceDescriptor {
    pub name: String,
    /// Backend binding name, resolved through the pool registry.
    pub backend: String,
    /// Remote source identifier handed to the backend verbatim.
    pub source_id: String,
    pub renderer: RendererKind,
    /// Renderer-specific configuration parameters.
    pub params: RequestParams,
}

/// Backend binding name → client pool. Built at startup, read-only
/// while serving traffic, so lookups take no lock.
pub struct PoolRegistry {
    pools: HashMap<String, Arc<ClientPool>>,
}

impl PoolRegistry {
    pub fn new(pools: HashMap<String, Arc<ClientPool>>) -> Self {
        Self { pools }
    }

    pub fn resolve(&self, backend: &str) -> VizResult<&Arc<ClientPool>> {
        self.pools
            .get(backend)
            .ok_or_else(|| VizError::UnknownBackend(backend.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Data-source name → descriptor. Built at startup, read-only.
pub struct DataSourceRegistry {
    sources: HashMap<String, Arc<DataSourceDescriptor>>,
}

impl DataSourceRegistry {
    pub fn new(descriptors: impl IntoIterator<Item = DataSourceDescriptor>) -> Self {
        Self {
            sources: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), Arc::new(d)))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> VizResult<Arc<DataSourceDescriptor>> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| VizError::UnknownDataSource(name.to_string()))
    }

    /// All configured descriptors, for discovery/menu callers.
    pub fn list(&self) -> Vec<Arc<DataSourceDescriptor>> {
        let mut all: Vec<_> = self.sources.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}
