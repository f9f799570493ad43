//! Template store: the fixed set of manifest templates loaded from a directory.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::{debug, info};

use super::error::{describe_tera_error, RenderError, Result};

/// Logical manifest kinds, each backed by exactly one template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateKind {
    ServiceAccount,
    Service,
    Deployment,
    ConfigMap,
    PersistentVolumeClaim,
    Kustomization,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::ServiceAccount,
        TemplateKind::Service,
        TemplateKind::Deployment,
        TemplateKind::ConfigMap,
        TemplateKind::PersistentVolumeClaim,
        TemplateKind::Kustomization,
    ];

    /// File the template is read from, relative to the template directory.
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::ServiceAccount => "service-account.yaml",
            TemplateKind::Service => "service.yaml",
            TemplateKind::Deployment => "deployment.yaml",
            TemplateKind::ConfigMap => "configmap.yaml",
            TemplateKind::PersistentVolumeClaim => "persistent-volume-claim.yaml",
            TemplateKind::Kustomization => "kustomization.yaml",
        }
    }

    pub fn logical_name(self) -> &'static str {
        match self {
            TemplateKind::ServiceAccount => "service-account",
            TemplateKind::Service => "service",
            TemplateKind::Deployment => "deployment",
            TemplateKind::ConfigMap => "configmap",
            TemplateKind::PersistentVolumeClaim => "persistentvolumeclaim",
            TemplateKind::Kustomization => "kustomization",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    /// Accepts either the logical name or the template file name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|kind| kind.logical_name() == s || kind.file_name() == s)
            .ok_or_else(|| format!("unknown template kind: {}", s))
    }
}

/// Compiled manifest templates, keyed by [`TemplateKind`].
///
/// Every template is read and parsed when the store is opened, so a store
/// that exists can always render.
pub struct TemplateStore {
    dir: PathBuf,
    sources: HashMap<TemplateKind, String>,
    tera: Tera,
}

impl fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl TemplateStore {
    /// Returns true if `dir` exists and is a directory.
    pub fn exists(dir: &Path) -> bool {
        dir.is_dir()
    }

    /// Loads and compiles every template in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        info!(template_dir = %dir.display(), "Opening template store");

        if !Self::exists(&dir) {
            return Err(RenderError::TemplateDirNotFound { path: dir });
        }

        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());

        let mut sources = HashMap::new();
        for kind in TemplateKind::ALL {
            let path = dir.join(kind.file_name());
            let source =
                std::fs::read_to_string(&path).map_err(|e| RenderError::ReadTemplate {
                    template: kind.file_name(),
                    path: path.clone(),
                    source: e,
                })?;

            tera.add_raw_template(kind.file_name(), &source)
                .map_err(|e| RenderError::ParseTemplate {
                    template: kind.file_name(),
                    message: describe_tera_error(&e),
                })?;

            debug!(template = kind.file_name(), "Loaded template");
            sources.insert(kind, source);
        }

        Ok(Self { dir, sources, tera })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the raw body of a template.
    pub fn load(&self, kind: TemplateKind) -> &str {
        self.sources.get(&kind).map(String::as_str).unwrap_or_default()
    }

    /// Renders a template against a serializable context object.
    pub fn render<C: Serialize>(&self, kind: TemplateKind, context: &C) -> Result<String> {
        let context = Context::from_serialize(context).map_err(|e| RenderError::Context {
            template: kind.file_name(),
            message: describe_tera_error(&e),
        })?;

        self.tera
            .render(kind.file_name(), &context)
            .map_err(|e| RenderError::Execute {
                template: kind.file_name(),
                message: describe_tera_error(&e),
            })
    }
}
