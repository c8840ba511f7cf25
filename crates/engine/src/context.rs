//! Shared per-process state assembled from configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use backend_client::{ClientPool, Connector, TcpConnector};
use renderer::{BackgroundProvider, FileBackground, SyntheticBackground};
use viz_common::{RequestParams, VizError, VizResult};

use crate::config::Config;
use crate::registry::{DataSourceDescriptor, DataSourceRegistry, PoolRegistry};
use crate::renderers::RendererCache;

/// Writes rendered PNG artifacts to disk and hands back the filename
/// plus the URL a client fetches it under.
pub struct ArtifactStore {
    dir: PathBuf,
    base_url: String,
}

impl ArtifactStore {
    pub fn new(dir: PathBuf, base_url: String) -> VizResult<Self> {
        std::fs::create_dir_all(&dir).map_err(|e| {
            VizError::Config(format!(
                "cannot create artifact directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir, base_url })
    }

    /// Store one PNG under a fresh random name.
    pub fn store_png(&self, png: &[u8]) -> VizResult<(String, String)> {
        let filename = format!("{}.png", Uuid::new_v4());
        let path = self.dir.join(&filename);
        std::fs::write(&path, png).map_err(|e| {
            VizError::Render(format!("cannot write artifact {}: {}", path.display(), e))
        })?;
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), filename);
        Ok((filename, url))
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

/// Everything the dispatcher needs, built once at startup.
pub struct AppContext {
    pub pools: PoolRegistry,
    pub sources: DataSourceRegistry,
    pub renderers: RendererCache,
    pub background: Arc<dyn BackgroundProvider>,
    pub store: ArtifactStore,
}

impl AppContext {
    /// Build the full context with real TCP connectors.
    pub fn from_config(config: &Config) -> VizResult<Self> {
        Self::from_config_with(config, |b| {
            Arc::new(TcpConnector::new(b.host.clone(), b.port)) as Arc<dyn Connector>
        })
    }

    /// Build with a caller-supplied connector per backend binding.
    /// Tests use this to point pools at in-process fakes.
    pub fn from_config_with(
        config: &Config,
        mut connector_for: impl FnMut(&crate::config::BackendConfig) -> Arc<dyn Connector>,
    ) -> VizResult<Self> {
        let mut pools = HashMap::new();
        for b in &config.backends {
            let pool = ClientPool::new(
                b.name.clone(),
                b.pool_size,
                Duration::from_secs(b.acquire_timeout_secs),
                connector_for(b),
            );
            pools.insert(b.name.clone(), pool);
        }

        let descriptors = config
            .sources
            .iter()
            .map(|s| {
                Ok(DataSourceDescriptor {
                    name: s.name.clone(),
                    backend: s.backend.clone(),
                    source_id: s.source_id.clone(),
                    renderer: s.renderer.parse()?,
                    params: s.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<RequestParams>(),
                })
            })
            .collect::<VizResult<Vec<_>>>()?;

        let background: Arc<dyn BackgroundProvider> = match &config.background {
            Some(bg) => {
                info!(image = %bg.image.display(), "loading background imagery");
                Arc::new(FileBackground::load(
                    &bg.image, bg.west, bg.east, bg.south, bg.north,
                )?)
            }
            None => Arc::new(SyntheticBackground),
        };

        Ok(Self {
            pools: PoolRegistry::new(pools),
            sources: DataSourceRegistry::new(descriptors),
            renderers: RendererCache::new(),
            background,
            store: ArtifactStore::new(
                config.artifacts.dir.clone(),
                config.artifacts.base_url.clone(),
            )?,
        })
    }
}
