//! Template-driven rendering of an application into Kubernetes manifests.

pub mod context;
pub mod error;
pub mod renderer;
pub mod templates;

pub use error::RenderError;
pub use renderer::{
    config_map_manifest_name, deployment_manifest_name, ordered_manifest_names,
    persistent_volume_manifest_name, service_manifest_name, ManifestSet, Renderer,
    DOCUMENT_SEPARATOR, INDEX_MANIFEST, MANIFEST_EXTENSION, SERVICE_ACCOUNT_MANIFEST,
};
pub use templates::{TemplateKind, TemplateStore};
