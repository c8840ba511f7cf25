//! Request routing engine.
//!
//! Wires the pieces together: configuration load, one client pool per
//! backend binding, the data-source registry, lazily constructed
//! renderer plugins, and the dispatcher that guarantees pooled clients
//! are released exactly once per request.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod registry;
pub mod renderers;

pub use config::Config;
pub use context::{AppContext, ArtifactStore};
pub use dispatch::Dispatcher;
pub use registry::{DataSourceDescriptor, DataSourceRegistry, PoolRegistry};
pub use renderers::RendererKind;
