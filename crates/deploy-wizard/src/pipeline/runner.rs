use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span};

use crate::application::{
    parse_application, validate_application, Application, Defaults, ErrorTree,
};
use crate::config::Config;
use crate::git::{RepositoryBackend, RepositoryPublisher, Signature};
use crate::render::{ManifestSet, Renderer};

use super::error::{ReleaseError, Result};

/// Outcome of a successful release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReport {
    pub application: String,
    pub version: String,
    pub commit_id: String,
    /// Repository paths written by the commit.
    pub files: Vec<String>,
}

pub fn release_message(app: &Application) -> String {
    format!("release for {}:{}", app.name(), app.version())
}

/// Validate, default, render and publish one application per call.
pub struct Pipeline {
    renderer: Renderer,
    defaults: Defaults,
    author: Signature,
}

impl Pipeline {
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            defaults: Defaults::default(),
            author: Signature::default(),
        }
    }

    /// Production constructor: opens the template directory and takes the
    /// defaults and commit author from the config.
    pub fn from_config(config: &Config) -> crate::error::Result<Self> {
        let renderer = Renderer::new(&config.template_dir)?;
        Ok(Self::new(renderer)
            .with_defaults(config.defaults.clone())
            .with_author(config.git.author.clone()))
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_author(mut self, author: Signature) -> Self {
        self.author = author;
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Applies defaults, then validates. An empty tree means the payload is valid.
    pub fn check(&self, payload: &Value) -> ErrorTree {
        match self.decode(payload) {
            Ok(app) => validate_application(&app),
            Err(errors) => errors,
        }
    }

    /// Decodes, defaults and validates a payload.
    pub fn prepare(&self, payload: &Value) -> Result<Application> {
        let _step = info_span!("validate").entered();

        let app = self.decode(payload).map_err(ReleaseError::Validation)?;
        let errors = validate_application(&app);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "Application failed validation");
            return Err(ReleaseError::Validation(errors));
        }
        Ok(app)
    }

    fn decode(&self, payload: &Value) -> std::result::Result<Application, ErrorTree> {
        let mut app = parse_application(payload)?;
        self.defaults.apply(&mut app);
        Ok(app)
    }

    /// Renders every manifest of a valid payload, keyed by file name.
    pub fn render(&self, payload: &Value) -> Result<ManifestSet> {
        let app = self.prepare(payload)?;
        let _step = info_span!("render").entered();
        Ok(self.renderer.render_manifests(&app)?)
    }

    /// Renders a valid payload as one multi-document text.
    pub fn preview(&self, payload: &Value) -> Result<String> {
        let app = self.prepare(payload)?;
        let _step = info_span!("render").entered();
        Ok(self.renderer.render_application(&app)?)
    }

    /// Runs the whole pipeline: validate, render, clone, commit, push.
    ///
    /// Nothing is retried here; see [`ReleaseError::is_retryable`].
    pub fn release<B: RepositoryBackend>(
        &self,
        payload: &Value,
        backend: B,
    ) -> Result<ReleaseReport> {
        let app = self.prepare(payload)?;
        let _release_span = info_span!("release",
            application = %app.name(),
            version = %app.version(),
        )
        .entered();

        let manifests = {
            let _step = info_span!("render").entered();
            self.renderer.render_manifests(&app)?
        };

        let destination = app.destination().ok_or_else(|| {
            ReleaseError::Validation(ErrorTree::root("\"destination\" is a required field"))
        })?;
        let mut publisher =
            RepositoryPublisher::new(backend, destination).with_author(self.author.clone());

        {
            let _step = info_span!("clone").entered();
            publisher.clone_remote()?;
        }

        for (name, content) in manifests {
            publisher.stage(name, content);
        }
        let files = publisher.staged_paths();

        let commit_id = {
            let _step = info_span!("commit").entered();
            publisher.commit(&release_message(&app))?
        };

        {
            let _step = info_span!("push").entered();
            publisher.push()?;
        }

        info!(commit = %commit_id, files = files.len(), "Release published");

        Ok(ReleaseReport {
            application: app.name().to_string(),
            version: app.version().to_string(),
            commit_id,
            files,
        })
    }
}
