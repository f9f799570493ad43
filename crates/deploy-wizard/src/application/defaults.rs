//! Fills unset optional fields of an application with configured defaults.

use serde::{Deserialize, Serialize};

use super::model::{Application, Protocol, PullPolicy, ServiceType};

pub const DEFAULT_TARGET_REVISION: &str = "HEAD";
pub const DEFAULT_PATH: &str = "/";

/// Values written into fields the payload left unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    pub target_revision: String,
    pub path: String,
    pub service_type: ServiceType,
    pub protocol: Protocol,
    pub image_pull_policy: PullPolicy,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            target_revision: DEFAULT_TARGET_REVISION.to_string(),
            path: DEFAULT_PATH.to_string(),
            service_type: ServiceType::ClusterIP,
            protocol: Protocol::Tcp,
            image_pull_policy: PullPolicy::IfNotPresent,
        }
    }
}

impl Defaults {
    /// Fills empty fields in place. Existing values are never overwritten,
    /// so applying twice is the same as applying once.
    pub fn apply(&self, app: &mut Application) {
        let Some(spec) = app.spec.as_mut() else {
            return;
        };

        if let Some(destination) = spec.destination.as_mut() {
            if destination.target_revision.is_empty() {
                destination.target_revision = self.target_revision.clone();
            }
            if destination.path.is_empty() {
                destination.path = self.path.clone();
            }
        }

        for component in &mut spec.components {
            if let Some(service) = component.service.as_mut() {
                service.service_type.get_or_insert_with(|| self.service_type.clone());
                for port in &mut service.ports {
                    port.protocol.get_or_insert_with(|| self.protocol.clone());
                }
            }
            for container in &mut component.containers {
                container.image_pull_policy.get_or_insert_with(|| self.image_pull_policy.clone());
            }
        }
    }
}

/// Applies the built-in defaults and returns the completed application.
pub fn apply_defaults(mut app: Application) -> Application {
    Defaults::default().apply(&mut app);
    app
}
