//! Typed context objects handed to each template.
//!
//! Templates only ever see these views, never the raw model, so enum values
//! are already spelled the way manifests expect them and container ports are
//! already resolved against the component's service.

use std::collections::BTreeSet;

use serde::Serialize;

use super::error::{RenderError, Result};
use crate::application::{
    Application, Component, ConfigMap, Container, IntOrString, PersistentVolume, Service,
    ServicePort, VolumeType,
};

/// Application-wide values used by the label scheme.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationContext<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub version: &'a str,
    pub team: &'a str,
    pub environment: &'a str,
    pub region: &'a str,
}

impl<'a> ApplicationContext<'a> {
    pub fn from_application(app: &'a Application) -> Result<Self> {
        let metadata = app
            .metadata
            .as_ref()
            .ok_or(RenderError::Incomplete("metadata"))?;
        let labels = metadata.labels.as_ref();

        Ok(Self {
            name: &metadata.name,
            namespace: &metadata.namespace,
            version: labels.map(|l| l.version.as_str()).unwrap_or_default(),
            team: labels.map(|l| l.team.as_str()).unwrap_or_default(),
            environment: labels.map(|l| l.environment.as_str()).unwrap_or_default(),
            region: labels.map(|l| l.region.as_str()).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePortView<'a> {
    pub name: &'a str,
    pub port: i64,
    pub protocol: String,
    pub target_port: Option<&'a IntOrString>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceView<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub service_type: String,
    pub ports: Vec<ServicePortView<'a>>,
}

impl<'a> ServiceView<'a> {
    pub fn new(service: &'a Service) -> Self {
        Self {
            name: &service.name,
            service_type: service.service_type.clone().unwrap_or_default().to_string(),
            ports: service
                .ports
                .iter()
                .map(|port| ServicePortView {
                    name: &port.name,
                    port: port.port,
                    protocol: port.protocol.clone().unwrap_or_default().to_string(),
                    target_port: port.target_port.as_ref(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPortView<'a> {
    pub name: &'a str,
    pub container_port: i64,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMountView<'a> {
    pub name: &'a str,
    pub mount_path: &'a str,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerView<'a> {
    pub name: &'a str,
    pub image: &'a str,
    pub image_tag: &'a str,
    pub image_pull_policy: String,
    pub ports: Vec<ContainerPortView<'a>>,
    pub volumes: Vec<VolumeMountView<'a>>,
}

impl<'a> ContainerView<'a> {
    /// Builds the view, exposing the service ports named in `portNames`
    /// (every service port when the list is empty).
    pub fn new(container: &'a Container, service: &'a Service) -> Self {
        let port_view = |port: &'a ServicePort| ContainerPortView {
            name: &port.name,
            container_port: port.container_port(),
            protocol: port.protocol.clone().unwrap_or_default().to_string(),
        };

        let ports = if container.port_names.is_empty() {
            service.ports.iter().map(port_view).collect()
        } else {
            container
                .port_names
                .iter()
                .filter_map(|name| service.port(name))
                .map(port_view)
                .collect()
        };

        Self {
            name: &container.name,
            image: &container.image,
            image_tag: &container.image_tag,
            image_pull_policy: container.image_pull_policy.clone().unwrap_or_default().to_string(),
            ports,
            volumes: container
                .volumes
                .iter()
                .map(|mount| VolumeMountView {
                    name: &mount.name,
                    mount_path: &mount.mount_path,
                    read_only: mount.read_only,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceAccountContext<'a> {
    pub app: ApplicationContext<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceContext<'a> {
    pub app: ApplicationContext<'a>,
    pub service: ServiceView<'a>,
}

/// Context for one deployment: the component's containers plus the
/// volumes every deployment of the application declares.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentContext<'a> {
    pub app: ApplicationContext<'a>,
    pub service: ServiceView<'a>,
    pub containers: Vec<ContainerView<'a>>,
    pub config_maps: BTreeSet<&'a str>,
    pub persistent_volumes: BTreeSet<&'a str>,
}

impl<'a> DeploymentContext<'a> {
    pub fn new(
        app: ApplicationContext<'a>,
        component: &'a Component,
        service: &'a Service,
        volumes: &ReferencedVolumes<'a>,
    ) -> Self {
        Self {
            app,
            service: ServiceView::new(service),
            containers: component
                .containers
                .iter()
                .map(|container| ContainerView::new(container, service))
                .collect(),
            config_maps: volumes.config_maps.clone(),
            persistent_volumes: volumes.persistent_volumes.clone(),
        }
    }
}

/// Distinct config map and persistent volume names mounted by a set of containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedVolumes<'a> {
    pub config_maps: BTreeSet<&'a str>,
    pub persistent_volumes: BTreeSet<&'a str>,
}

/// Collects the volumes mounted by `containers`. Mounts with a missing or
/// unrecognized type are skipped.
pub fn referenced_volumes<'a, I>(containers: I) -> ReferencedVolumes<'a>
where
    I: IntoIterator<Item = &'a Container>,
{
    let mut volumes = ReferencedVolumes::default();
    for mount in containers.into_iter().flat_map(|c| &c.volumes) {
        match &mount.volume_type {
            Some(VolumeType::ConfigMap) => {
                volumes.config_maps.insert(mount.name.as_str());
            }
            Some(VolumeType::PersistentVolume) => {
                volumes.persistent_volumes.insert(mount.name.as_str());
            }
            _ => {}
        }
    }
    volumes
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigMapView<'a> {
    pub name: &'a str,
    pub data: &'a str,
    pub lines: Vec<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigMapContext<'a> {
    pub app: ApplicationContext<'a>,
    pub config_map: ConfigMapView<'a>,
}

impl<'a> ConfigMapContext<'a> {
    pub fn new(app: ApplicationContext<'a>, config_map: &'a ConfigMap) -> Self {
        Self {
            app,
            config_map: ConfigMapView {
                name: &config_map.name,
                data: &config_map.data,
                lines: config_map.data.lines().collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeView<'a> {
    pub name: &'a str,
    pub capacity: i64,
    pub access_mode: String,
    pub storage_class_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistentVolumeContext<'a> {
    pub app: ApplicationContext<'a>,
    pub persistent_volume: PersistentVolumeView<'a>,
}

impl<'a> PersistentVolumeContext<'a> {
    pub fn new(app: ApplicationContext<'a>, volume: &'a PersistentVolume) -> Result<Self> {
        let access_mode = volume
            .access_mode
            .as_ref()
            .ok_or(RenderError::Incomplete("persistent volume access mode"))?;
        Ok(Self {
            app,
            persistent_volume: PersistentVolumeView {
                name: &volume.name,
                capacity: volume.capacity,
                access_mode: access_mode.to_string(),
                storage_class_name: &volume.storage_class_name,
            },
        })
    }
}

/// Context for the kustomization index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexContext<'a> {
    pub resources: Vec<&'a str>,
}
