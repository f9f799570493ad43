//! Renders an application into a named set of manifest documents.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use super::context::{
    referenced_volumes, ApplicationContext, ConfigMapContext, DeploymentContext, IndexContext,
    PersistentVolumeContext, ServiceAccountContext, ServiceContext, ServiceView,
};
use super::error::{RenderError, Result};
use super::templates::{TemplateKind, TemplateStore};
use crate::application::{Application, Spec};

pub const MANIFEST_EXTENSION: &str = "yaml";
pub const SERVICE_ACCOUNT_MANIFEST: &str = "service-account.yaml";
pub const INDEX_MANIFEST: &str = "kustomization.yaml";
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Rendered documents keyed by output file name.
pub type ManifestSet = BTreeMap<String, String>;

pub fn service_manifest_name(service: &str) -> String {
    format!("service-{}.{}", service, MANIFEST_EXTENSION)
}

pub fn deployment_manifest_name(service: &str) -> String {
    format!("deployment-{}.{}", service, MANIFEST_EXTENSION)
}

pub fn config_map_manifest_name(name: &str) -> String {
    format!("configmap-{}.{}", name, MANIFEST_EXTENSION)
}

pub fn persistent_volume_manifest_name(name: &str) -> String {
    format!("persistent-volume-{}.{}", name, MANIFEST_EXTENSION)
}

/// Output names in concatenation order: the service account, each
/// component's service and deployment, then config maps and persistent
/// volumes in declaration order. The index is not included.
pub fn ordered_manifest_names(app: &Application) -> Vec<String> {
    let mut names = vec![SERVICE_ACCOUNT_MANIFEST.to_string()];
    let Some(spec) = app.spec.as_ref() else {
        return names;
    };

    for service in spec.components.iter().filter_map(|c| c.service.as_ref()) {
        names.push(service_manifest_name(&service.name));
        names.push(deployment_manifest_name(&service.name));
    }
    names.extend(spec.config_maps.iter().map(|c| config_map_manifest_name(&c.name)));
    names.extend(
        spec.persistent_volumes
            .iter()
            .map(|p| persistent_volume_manifest_name(&p.name)),
    );
    names
}

/// Renders manifests from a [`TemplateStore`].
#[derive(Debug)]
pub struct Renderer {
    store: TemplateStore,
}

impl Renderer {
    /// Opens the template directory and compiles every template.
    pub fn new(template_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_store(TemplateStore::open(template_dir)?))
    }

    pub fn from_store(store: TemplateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Renders every manifest of `app`, plus the index listing them.
    ///
    /// Any template failure aborts the whole call; no partial set is returned.
    pub fn render_manifests(&self, app: &Application) -> Result<ManifestSet> {
        let app_context = ApplicationContext::from_application(app)?;
        let spec: &Spec = app.spec.as_ref().ok_or(RenderError::Incomplete("spec"))?;
        info!(application = app_context.name, "Rendering manifests");

        let mut manifests = ManifestSet::new();

        manifests.insert(
            SERVICE_ACCOUNT_MANIFEST.to_string(),
            self.store.render(
                TemplateKind::ServiceAccount,
                &ServiceAccountContext {
                    app: app_context.clone(),
                },
            )?,
        );

        // Every deployment declares every mounted volume, whichever component mounts it.
        let volumes = referenced_volumes(spec.components.iter().flat_map(|c| &c.containers));

        for (index, component) in spec.components.iter().enumerate() {
            let service = component
                .service
                .as_ref()
                .ok_or(RenderError::MissingService { index })?;

            let service_doc = self.store.render(
                TemplateKind::Service,
                &ServiceContext {
                    app: app_context.clone(),
                    service: ServiceView::new(service),
                },
            )?;
            manifests.insert(service_manifest_name(&service.name), service_doc);

            let deployment_doc = self.store.render(
                TemplateKind::Deployment,
                &DeploymentContext::new(app_context.clone(), component, service, &volumes),
            )?;
            manifests.insert(deployment_manifest_name(&service.name), deployment_doc);
        }

        for config_map in &spec.config_maps {
            let doc = self.store.render(
                TemplateKind::ConfigMap,
                &ConfigMapContext::new(app_context.clone(), config_map),
            )?;
            manifests.insert(config_map_manifest_name(&config_map.name), doc);
        }

        for volume in &spec.persistent_volumes {
            let doc = self.store.render(
                TemplateKind::PersistentVolumeClaim,
                &PersistentVolumeContext::new(app_context.clone(), volume)?,
            )?;
            manifests.insert(persistent_volume_manifest_name(&volume.name), doc);
        }

        let names: Vec<&str> = manifests.keys().map(String::as_str).collect();
        debug!(manifests = ?names, "Rendered manifest files");
        let index = self.build_index(&names)?;
        manifests.insert(INDEX_MANIFEST.to_string(), index);

        Ok(manifests)
    }

    /// Renders `app` into a single multi-document manifest in fixed order.
    pub fn render_application(&self, app: &Application) -> Result<String> {
        let manifests = self.render_manifests(app)?;

        let mut documents = Vec::new();
        for name in ordered_manifest_names(app) {
            let mut document = manifests
                .get(&name)
                .cloned()
                .ok_or(RenderError::MissingManifest(name))?;
            if !document.ends_with('\n') {
                document.push('\n');
            }
            documents.push(document);
        }

        Ok(documents.join(DOCUMENT_SEPARATOR))
    }

    /// Renders the kustomization index listing `names`.
    pub fn build_index<S: AsRef<str>>(&self, names: &[S]) -> Result<String> {
        let context = IndexContext {
            resources: names.iter().map(AsRef::as_ref).collect(),
        };
        self.store.render(TemplateKind::Kustomization, &context)
    }
}
