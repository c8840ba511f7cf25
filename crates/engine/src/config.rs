//! Startup configuration.
//!
//! One YAML document lists backend bindings, data-source definitions,
//! and artifact storage. Load is fail-fast: the first malformed or
//! inconsistent entry aborts startup with a `Config` error; renderer
//! kinds are parsed here so a typo in a kind string can never surface
//! at request time.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use viz_common::{VizError, VizResult};

use crate::renderers::RendererKind;

const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

fn default_acquire_timeout() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

/// One remote data server endpoint with its pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

/// One named data source bound to a backend and a renderer kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub backend: String,
    pub source_id: String,
    pub renderer: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Where rendered artifacts land and how they are retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub base_url: String,
}

/// Optional background imagery for map rendering; equirectangular
/// image plus its geographic bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub image: PathBuf,
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backends: Vec<BackendConfig>,
    pub sources: Vec<SourceConfig>,
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub background: Option<BackgroundConfig>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> VizResult<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| VizError::Config(format!("cannot parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> VizResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            VizError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Cross-field validation; runs as part of every load.
    fn validate(&self) -> VizResult<()> {
        if self.backends.is_empty() {
            return Err(VizError::Config("no backends configured".into()));
        }

        let mut backend_names = HashSet::new();
        for b in &self.backends {
            if b.name.is_empty() || b.host.is_empty() {
                return Err(VizError::Config(format!(
                    "backend {:?} needs a name and host",
                    b.name
                )));
            }
            if b.pool_size == 0 {
                return Err(VizError::Config(format!(
                    "backend '{}' has pool_size 0",
                    b.name
                )));
            }
            if b.acquire_timeout_secs == 0 {
                return Err(VizError::Config(format!(
                    "backend '{}' has acquire_timeout_secs 0",
                    b.name
                )));
            }
            if !backend_names.insert(b.name.as_str()) {
                return Err(VizError::Config(format!(
                    "duplicate backend name '{}'",
                    b.name
                )));
            }
        }

        let mut source_names = HashSet::new();
        for s in &self.sources {
            if s.name.is_empty() || s.source_id.is_empty() {
                return Err(VizError::Config(format!(
                    "source {:?} needs a name and source_id",
                    s.name
                )));
            }
            if !backend_names.contains(s.backend.as_str()) {
                return Err(VizError::Config(format!(
                    "source '{}' references unknown backend '{}'",
                    s.name, s.backend
                )));
            }
            // Unknown renderer kinds die here, not at request time
            s.renderer.parse::<RendererKind>()?;
            if !source_names.insert(s.name.as_str()) {
                return Err(VizError::Config(format!(
                    "duplicate source name '{}'",
                    s.name
                )));
            }
        }

        if self.artifacts.base_url.is_empty() {
            return Err(VizError::Config("artifacts.base_url is empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> String {
        r#"
backends:
  - name: hvo
    host: vdx.example.org
    port: 16050
    pool_size: 4
sources:
  - name: hvo_seismic_map
    backend: hvo
    source_id: hvo_seismic
    renderer: channel_map
    params:
      catalog_failure: degrade
  - name: hvo_rsam
    backend: hvo
    source_id: hvo_rsam
    renderer: time_series
artifacts:
  dir: /var/spool/volcano-viz/plots
  base_url: /plots
"#
        .to_string()
    }

    #[test]
    fn test_loads_sample() {
        let config = Config::from_yaml(&sample_yaml()).unwrap();
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].acquire_timeout_secs, 30);
        assert_eq!(config.sources[0].params["catalog_failure"], "degrade");
    }

    #[test]
    fn test_unknown_renderer_kind_fails_load() {
        let yaml = sample_yaml().replace("channel_map", "hologram");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert_eq!(err.kind(), "UnknownRendererKind");
    }

    #[test]
    fn test_unknown_backend_reference_fails_load() {
        let yaml = sample_yaml().replace("backend: hvo\n    source_id: hvo_seismic", "backend: avo\n    source_id: hvo_seismic");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("unknown backend"));
    }

    #[test]
    fn test_zero_pool_size_fails_load() {
        let yaml = sample_yaml().replace("pool_size: 4", "pool_size: 0");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_duplicate_source_name_fails_load() {
        let yaml = sample_yaml().replace("hvo_rsam\n", "hvo_seismic_map\n");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_malformed_yaml_fails_load() {
        assert!(Config::from_yaml("backends: [").is_err());
    }
}
