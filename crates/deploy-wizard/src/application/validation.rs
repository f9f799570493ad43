//! Structural and referential validation of an application payload.
//!
//! Validation never fails with an `Err`: every defect is recorded in an
//! [`ErrorTree`] keyed by field path, and an empty tree means the payload is
//! valid. Only two conditions stop the pass early: a payload that is not an
//! application object at all, and a missing `metadata` or `spec`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::model::{
    AccessMode, Application, Component, ConfigMap, Container, Destination, Ingress, IngressPath,
    IntOrString, Labels, Metadata, PersistentVolume, Protocol, PullPolicy, Service, ServicePort,
    ServiceType, Spec, VolumeMount, VolumeType,
};

static RE_DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-zA-Z0-9_]{1}[a-zA-Z0-9_-]{0,62}){1}(\.[a-zA-Z0-9_]{1}[a-zA-Z0-9_-]{0,62})*[\._]?$",
    )
    .unwrap()
});

/// Key under which payload-level errors are recorded.
pub const ROOT_KEY: &str = "";

pub const NOT_AN_APPLICATION: &str = "not an application object";

const MAX_DNS_NAME_LENGTH: usize = 255;

/// One entry of an [`ErrorTree`]: a message, or a nested tree of field errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorNode {
    Leaf(String),
    Node(ErrorTree),
}

/// Validation errors keyed by field name; collection elements are keyed by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorTree(BTreeMap<String, ErrorNode>);

impl ErrorTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree holding a single payload-level error.
    pub fn root(message: impl Into<String>) -> Self {
        let mut tree = Self::new();
        tree.leaf(ROOT_KEY, message);
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the payload-level error, if any.
    pub fn root_error(&self) -> Option<&str> {
        match self.0.get(ROOT_KEY) {
            Some(ErrorNode::Leaf(message)) => Some(message),
            _ => None,
        }
    }

    /// Records a message for `key`, replacing any earlier entry.
    pub fn leaf(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), ErrorNode::Leaf(message.into()));
    }

    /// Attaches a nested tree under `key` unless it is empty.
    pub fn nest(&mut self, key: impl Into<String>, tree: ErrorTree) {
        if !tree.is_empty() {
            self.0.insert(key.into(), ErrorNode::Node(tree));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorNode)> {
        self.0.iter()
    }

    /// Looks up a node by path, e.g. `spec.components[0].service.name`
    /// or `spec.components.0.service.name`.
    pub fn get(&self, path: &str) -> Option<&ErrorNode> {
        if path.is_empty() {
            return self.0.get(ROOT_KEY);
        }
        let normalized = path.replace('[', ".").replace(']', "");
        let mut segments = normalized.split('.').filter(|s| !s.is_empty());
        let mut node = self.0.get(segments.next()?)?;
        for segment in segments {
            match node {
                ErrorNode::Node(tree) => node = tree.0.get(segment)?,
                ErrorNode::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// Returns the message stored at `path`, if that path holds a leaf.
    pub fn message(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            ErrorNode::Leaf(message) => Some(message),
            ErrorNode::Node(_) => None,
        }
    }

    /// Lists every message with its full field path.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for (key, node) in &self.0 {
            let path = join_path(prefix, key);
            match node {
                ErrorNode::Leaf(message) => out.push((path, message.clone())),
                ErrorNode::Node(tree) => tree.flatten_into(&path, out),
            }
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .flatten()
            .into_iter()
            .map(|(path, message)| {
                if path.is_empty() {
                    message
                } else {
                    format!("{}: {}", path, message)
                }
            })
            .collect();
        write!(f, "{}", entries.join("; "))
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if key.is_empty() {
        prefix.to_string()
    } else if key.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}[{}]", prefix, key)
    } else if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn required(field: &str) -> String {
    format!("{:?} is a required field", field)
}

fn already_used(name: &str, kind: &str) -> String {
    format!("{:?} is already used by another {}", name, kind)
}

fn not_a_valid(value: &str, kind: &str) -> String {
    format!("{:?} is not a valid {}", value, kind)
}

fn unknown_port(port_name: &str, service_name: &str) -> String {
    format!(
        "{:?} does not match a port of service {:?}",
        port_name, service_name
    )
}

/// Returns true for a syntactically valid DNS host name that is not an IP literal.
pub fn is_valid_dns_name(host: &str) -> bool {
    if host.is_empty() || host.replace('.', "").len() > MAX_DNS_NAME_LENGTH {
        return false;
    }
    host.parse::<IpAddr>().is_err() && RE_DNS_NAME.is_match(host)
}

/// Decodes an untyped payload into an [`Application`].
///
/// Anything that is not an application object yields a single root error.
pub fn parse_application(payload: &Value) -> Result<Application, ErrorTree> {
    if !payload.is_object() {
        warn!(kind = json_kind(payload), "{}", NOT_AN_APPLICATION);
        return Err(ErrorTree::root(NOT_AN_APPLICATION));
    }
    Application::deserialize(payload).map_err(|e| {
        warn!(error = %e, "{}", NOT_AN_APPLICATION);
        ErrorTree::root(NOT_AN_APPLICATION)
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decodes and validates an untyped payload as-is, without applying defaults.
pub fn validate_payload(payload: &Value) -> ErrorTree {
    match parse_application(payload) {
        Ok(app) => validate_application(&app),
        Err(errors) => errors,
    }
}

/// Validates a decoded application and returns every defect found.
pub fn validate_application(app: &Application) -> ErrorTree {
    let metadata = match &app.metadata {
        Some(metadata) => metadata,
        None => return ErrorTree::root(required("metadata")),
    };
    let spec = match &app.spec {
        Some(spec) => spec,
        None => return ErrorTree::root(required("spec")),
    };

    let mut errors = ErrorTree::new();
    errors.nest("metadata", validate_metadata(metadata));
    errors.nest("spec", SpecValidator::new(spec).validate());
    errors
}

fn validate_metadata(metadata: &Metadata) -> ErrorTree {
    let mut errors = ErrorTree::new();
    if metadata.name.is_empty() {
        errors.leaf("name", required("name"));
    }
    if metadata.namespace.is_empty() {
        errors.leaf("namespace", required("namespace"));
    }
    match &metadata.labels {
        Some(labels) => errors.nest("labels", validate_labels(labels)),
        None => errors.leaf("labels", required("labels")),
    }
    errors
}

fn validate_labels(labels: &Labels) -> ErrorTree {
    let mut errors = ErrorTree::new();
    for (field, value) in [
        ("version", &labels.version),
        ("team", &labels.team),
        ("environment", &labels.environment),
        ("region", &labels.region),
    ] {
        if value.is_empty() {
            errors.leaf(field, required(field));
        }
    }
    errors
}

fn validate_destination(destination: &Destination) -> ErrorTree {
    let mut errors = ErrorTree::new();
    if destination.url.is_empty() {
        errors.leaf("url", required("url"));
    } else if url::Url::parse(&destination.url).is_err() {
        errors.leaf("url", format!("{:?} must be a valid URI", destination.url));
    }
    if destination.path.is_empty() {
        errors.leaf("path", required("path"));
    }
    if destination.target_revision.is_empty() {
        errors.leaf("targetRevision", required("targetRevision"));
    }
    errors
}

fn validate_each<'a, T>(items: &'a [T], mut check: impl FnMut(&'a T) -> ErrorTree) -> ErrorTree {
    let mut errors = ErrorTree::new();
    for (index, item) in items.iter().enumerate() {
        errors.nest(index.to_string(), check(item));
    }
    errors
}

/// Validates a spec with lookup tables for cross-entity references.
struct SpecValidator<'a> {
    spec: &'a Spec,
    services: HashMap<&'a str, &'a Service>,
    config_maps: HashSet<&'a str>,
    persistent_volumes: HashSet<&'a str>,
}

impl<'a> SpecValidator<'a> {
    fn new(spec: &'a Spec) -> Self {
        let mut services = HashMap::new();
        for service in spec.components.iter().filter_map(|c| c.service.as_ref()) {
            if !service.name.is_empty() {
                services.entry(service.name.as_str()).or_insert(service);
            }
        }
        let config_maps = spec.config_maps.iter().map(|c| c.name.as_str()).collect();
        let persistent_volumes = spec
            .persistent_volumes
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        Self {
            spec,
            services,
            config_maps,
            persistent_volumes,
        }
    }

    fn validate(&self) -> ErrorTree {
        let mut errors = ErrorTree::new();

        match &self.spec.destination {
            Some(destination) => errors.nest("destination", validate_destination(destination)),
            None => errors.leaf("destination", required("destination")),
        }

        if self.spec.components.is_empty() {
            errors.leaf("components", required("components"));
        } else {
            let mut seen = HashSet::new();
            errors.nest(
                "components",
                validate_each(&self.spec.components, |component| {
                    self.validate_component(component, &mut seen)
                }),
            );
        }

        let mut seen = HashSet::new();
        errors.nest(
            "configMaps",
            validate_each(&self.spec.config_maps, |config_map| {
                validate_config_map(config_map, &mut seen)
            }),
        );

        let mut seen = HashSet::new();
        errors.nest(
            "persistentVolumes",
            validate_each(&self.spec.persistent_volumes, |volume| {
                validate_persistent_volume(volume, &mut seen, &self.config_maps)
            }),
        );

        errors
    }

    fn validate_component(
        &self,
        component: &'a Component,
        seen_services: &mut HashSet<&'a str>,
    ) -> ErrorTree {
        let mut errors = ErrorTree::new();

        let service = component.service.as_ref();
        match service {
            Some(service) => errors.nest("service", validate_service(service, seen_services)),
            None => errors.leaf("service", required("service")),
        }

        // Cross-references are only checked against a service that can be named.
        let own_service = service.filter(|s| !s.name.is_empty());

        errors.nest(
            "containers",
            validate_each(&component.containers, |container| {
                self.validate_container(container, own_service)
            }),
        );
        errors.nest(
            "ingresses",
            validate_each(&component.ingresses, |ingress| {
                self.validate_ingress(ingress, own_service)
            }),
        );

        errors
    }

    fn validate_container(&self, container: &Container, service: Option<&Service>) -> ErrorTree {
        let mut errors = ErrorTree::new();

        for (field, value) in [
            ("name", &container.name),
            ("image", &container.image),
            ("imageTag", &container.image_tag),
        ] {
            if value.is_empty() {
                errors.leaf(field, required(field));
            }
        }

        if let Some(PullPolicy::Unknown(value)) = &container.image_pull_policy {
            errors.leaf("imagePullPolicy", not_a_valid(value, "image pull policy"));
        }

        if container.port_names.is_empty() {
            errors.leaf("portNames", required("portNames"));
        } else if let Some(service) = service {
            let mut port_errors = ErrorTree::new();
            for (index, port_name) in container.port_names.iter().enumerate() {
                if service.port(port_name).is_none() {
                    port_errors.leaf(index.to_string(), unknown_port(port_name, &service.name));
                }
            }
            errors.nest("portNames", port_errors);
        }

        errors.nest(
            "volumes",
            validate_each(&container.volumes, |mount| self.validate_volume_mount(mount)),
        );

        errors
    }

    fn validate_volume_mount(&self, mount: &VolumeMount) -> ErrorTree {
        let mut errors = ErrorTree::new();

        if mount.name.is_empty() {
            errors.leaf("name", required("name"));
        } else {
            let unresolved = match &mount.volume_type {
                Some(VolumeType::ConfigMap) if !self.config_maps.contains(mount.name.as_str()) => {
                    Some("config map")
                }
                Some(VolumeType::PersistentVolume)
                    if !self.persistent_volumes.contains(mount.name.as_str()) =>
                {
                    Some("persistent volume")
                }
                _ => None,
            };
            if let Some(kind) = unresolved {
                errors.leaf(
                    "name",
                    format!("{:?} does not match an existing {}", mount.name, kind),
                );
            }
        }

        match &mount.volume_type {
            None => errors.leaf("type", required("type")),
            Some(VolumeType::Unknown(value)) => {
                errors.leaf("type", not_a_valid(value, "volume type"))
            }
            Some(_) => {}
        }
        if mount.mount_path.is_empty() {
            errors.leaf("mountPath", required("mountPath"));
        }

        errors
    }

    fn validate_ingress(&self, ingress: &Ingress, own_service: Option<&'a Service>) -> ErrorTree {
        let mut errors = ErrorTree::new();

        if ingress.host.is_empty() {
            errors.leaf("host", required("host"));
        } else if !is_valid_dns_name(&ingress.host) {
            errors.leaf("host", format!("{:?} must be a valid host name", ingress.host));
        }

        let target = match ingress.service_name.as_deref() {
            None => own_service,
            Some("") => {
                errors.leaf("serviceName", required("serviceName"));
                None
            }
            Some(name) => {
                let found = self.services.get(name).copied();
                if found.is_none() {
                    errors.leaf(
                        "serviceName",
                        format!("{:?} does not match an existing service", name),
                    );
                }
                found
            }
        };

        errors.nest(
            "paths",
            validate_each(&ingress.paths, |path| validate_ingress_path(path, target)),
        );

        errors
    }
}

fn validate_service<'a>(service: &'a Service, seen: &mut HashSet<&'a str>) -> ErrorTree {
    let mut errors = ErrorTree::new();

    if service.name.is_empty() {
        errors.leaf("name", required("name"));
    } else if !seen.insert(service.name.as_str()) {
        errors.leaf("name", already_used(&service.name, "service"));
    }

    match &service.service_type {
        None => errors.leaf("type", required("type")),
        Some(ServiceType::Unknown(value)) => {
            errors.leaf("type", not_a_valid(value, "service type"))
        }
        Some(_) => {}
    }

    if service.ports.is_empty() {
        errors.leaf("ports", required("ports"));
    } else {
        let mut seen_ports = HashSet::new();
        errors.nest(
            "ports",
            validate_each(&service.ports, |port| {
                validate_service_port(port, &mut seen_ports)
            }),
        );
    }

    errors
}

fn validate_service_port<'a>(port: &'a ServicePort, seen: &mut HashSet<&'a str>) -> ErrorTree {
    let mut errors = ErrorTree::new();

    if port.name.is_empty() {
        errors.leaf("name", required("name"));
    } else if !seen.insert(port.name.as_str()) {
        errors.leaf("name", already_used(&port.name, "port"));
    }

    if !is_valid_port(port.port) {
        errors.leaf("port", format!("{} is not a valid port number", port.port));
    }

    match &port.protocol {
        None => errors.leaf("protocol", required("protocol")),
        Some(Protocol::Unknown(value)) => {
            errors.leaf("protocol", not_a_valid(value, "protocol"))
        }
        Some(_) => {}
    }

    match &port.target_port {
        Some(IntOrString::Int(n)) if !is_valid_port(*n) => {
            errors.leaf("targetPort", format!("{} is not a valid port number", n));
        }
        Some(IntOrString::String(s)) if s.is_empty() => {
            errors.leaf("targetPort", required("targetPort"));
        }
        _ => {}
    }

    errors
}

fn is_valid_port(port: i64) -> bool {
    (1..=65535).contains(&port)
}

fn validate_ingress_path(path: &IngressPath, service: Option<&Service>) -> ErrorTree {
    let mut errors = ErrorTree::new();

    if path.path.is_empty() {
        errors.leaf("path", required("path"));
    }

    if path.port_name.is_empty() {
        errors.leaf("portName", required("portName"));
    } else if let Some(service) = service {
        if service.port(&path.port_name).is_none() {
            errors.leaf("portName", unknown_port(&path.port_name, &service.name));
        }
    }

    errors
}

fn validate_config_map<'a>(config_map: &'a ConfigMap, seen: &mut HashSet<&'a str>) -> ErrorTree {
    let mut errors = ErrorTree::new();

    if config_map.name.is_empty() {
        errors.leaf("name", required("name"));
    } else if !seen.insert(config_map.name.as_str()) {
        errors.leaf("name", already_used(&config_map.name, "config map"));
    }

    if config_map.data.is_empty() {
        errors.leaf("data", required("data"));
    }

    errors
}

/// Persistent volumes share the pod volume namespace with config maps, so a
/// name may not be used by both.
fn validate_persistent_volume<'a>(
    volume: &'a PersistentVolume,
    seen: &mut HashSet<&'a str>,
    config_maps: &HashSet<&str>,
) -> ErrorTree {
    let mut errors = ErrorTree::new();

    if volume.name.is_empty() {
        errors.leaf("name", required("name"));
    } else if !seen.insert(volume.name.as_str()) {
        errors.leaf("name", already_used(&volume.name, "persistent volume"));
    } else if config_maps.contains(volume.name.as_str()) {
        errors.leaf("name", already_used(&volume.name, "config map"));
    }

    if volume.capacity <= 0 {
        errors.leaf("capacity", "capacity must be greater than 0");
    }

    match &volume.access_mode {
        None => errors.leaf("accessMode", required("accessMode")),
        Some(AccessMode::Unknown(value)) => {
            errors.leaf("accessMode", not_a_valid(value, "access mode"))
        }
        Some(_) => {}
    }

    if volume.storage_class_name.is_empty() {
        errors.leaf("storageClassName", required("storageClassName"));
    }

    errors
}
