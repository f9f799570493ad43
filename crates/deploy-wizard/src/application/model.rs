//! Application specification types.
//!
//! Every field is optional or defaulted on the wire so that an incomplete
//! payload still deserializes and the validator can report each missing
//! field instead of failing on the first one.

use serde::{Deserialize, Deserializer, Serialize};

/// Reads `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Declares a string-valued enum that keeps unrecognized values as
/// `Unknown(text)`, so a bad value is reported at its field instead of
/// failing the whole payload.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$variant_meta])* $variant,)+
            Unknown(String),
        }

        impl $name {
            /// The raw text of an unrecognized value.
            pub fn unknown(&self) -> Option<&str> {
                match self {
                    $name::Unknown(text) => Some(text),
                    _ => None,
                }
            }
        }

        impl From<String> for $name {
            fn from(text: String) -> Self {
                let known = match text.as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                };
                known.unwrap_or_else(|| $name::Unknown(text))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => f.write_str($text),)+
                    $name::Unknown(text) => f.write_str(text),
                }
            }
        }
    };
}

/// Root of a deployable system description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub metadata: Option<Metadata>,
    pub spec: Option<Spec>,
}

impl Application {
    /// Returns the application name, or an empty string when metadata is absent.
    pub fn name(&self) -> &str {
        self.metadata.as_ref().map(|m| m.name.as_str()).unwrap_or_default()
    }

    /// Returns the release version label, or an empty string when unset.
    pub fn version(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.labels.as_ref())
            .map(|l| l.version.as_str())
            .unwrap_or_default()
    }

    /// Returns the publish destination, if declared.
    pub fn destination(&self) -> Option<&Destination> {
        self.spec.as_ref().and_then(|s| s.destination.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace: String,

    pub labels: Option<Labels>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Labels {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub team: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub destination: Option<Destination>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub config_maps: Vec<ConfigMap>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub persistent_volumes: Vec<PersistentVolume>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<Component>,
}

/// Git coordinates the rendered manifests are published to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Remote repository URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    /// Directory inside the repository that receives the manifests.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    /// Branch to publish to; `HEAD` means the remote's default branch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_revision: String,
}

/// One deployable unit: a service, the containers behind it and its ingress rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub service: Option<Service>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub containers: Vec<Container>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ingresses: Vec<Ingress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "type")]
    pub service_type: Option<ServiceType>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<ServicePort>,
}

impl Service {
    /// Finds a port by name.
    pub fn port(&self, name: &str) -> Option<&ServicePort> {
        self.ports.iter().find(|p| p.name == name)
    }
}

string_enum! {
    #[derive(Default)]
    ServiceType {
        #[default]
        ClusterIP => "ClusterIP",
        ExternalName => "ExternalName",
        LoadBalancer => "LoadBalancer",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub port: i64,

    pub protocol: Option<Protocol>,

    pub target_port: Option<IntOrString>,
}

impl ServicePort {
    /// Port number the container listens on: a numeric `targetPort` wins over `port`.
    pub fn container_port(&self) -> i64 {
        match &self.target_port {
            Some(IntOrString::Int(n)) => *n,
            Some(IntOrString::String(s)) => s.parse().unwrap_or(self.port),
            None => self.port,
        }
    }
}

string_enum! {
    #[derive(Default)]
    Protocol {
        #[default]
        Tcp => "TCP",
        Udp => "UDP",
    }
}

/// Kubernetes int-or-string value, used for `targetPort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i64),
    String(String),
}

impl std::fmt::Display for IntOrString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntOrString::Int(n) => write!(f, "{}", n),
            IntOrString::String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub image_tag: String,

    pub image_pull_policy: Option<PullPolicy>,

    /// Names of the component's service ports this container exposes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub port_names: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub volumes: Vec<VolumeMount>,
}

string_enum! {
    #[derive(Default)]
    PullPolicy {
        Always => "Always",
        #[default]
        IfNotPresent => "IfNotPresent",
    }
}

/// Mount of a spec-level config map or persistent volume into a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "type")]
    pub volume_type: Option<VolumeType>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub mount_path: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub read_only: bool,
}

string_enum! {
    VolumeType {
        ConfigMap => "ConfigMap",
        PersistentVolume => "PersistentVolume",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,

    /// Service the paths route to; the component's own service when unset.
    pub service_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub paths: Vec<IngressPath>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressPath {
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub port_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Requested size in GiB.
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: i64,

    pub access_mode: Option<AccessMode>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_class_name: String,
}

string_enum! {
    AccessMode {
        ReadWriteOnce => "ReadWriteOnce",
        ReadOnlyMany => "ReadOnlyMany",
        ReadWriteMany => "ReadWriteMany",
    }
}
