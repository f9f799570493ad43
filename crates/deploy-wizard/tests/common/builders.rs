//! Builders for untyped Application payloads, as a client would send them.

#![allow(dead_code)]

use serde_json::{json, Value};

/// Builder for a whole Application payload.
pub struct ApplicationBuilder {
    name: String,
    namespace: String,
    version: String,
    destination: Value,
    components: Vec<Value>,
    config_maps: Vec<Value>,
    persistent_volumes: Vec<Value>,
}

impl ApplicationBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: "team1".to_string(),
            version: "v1".to_string(),
            destination: json!({"url": "https://git.example.com/deploy.git"}),
            components: vec![],
            config_maps: vec![],
            persistent_volumes: vec![],
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Sets the destination; `path` and `targetRevision` are left to the defaults.
    pub fn destination(mut self, url: &str) -> Self {
        self.destination = json!({"url": url});
        self
    }

    pub fn destination_path(mut self, path: &str) -> Self {
        self.destination["path"] = json!(path);
        self
    }

    pub fn component(mut self, component: ComponentBuilder) -> Self {
        self.components.push(component.build());
        self
    }

    pub fn config_map(mut self, name: &str, data: &str) -> Self {
        self.config_maps.push(json!({"name": name, "data": data}));
        self
    }

    pub fn persistent_volume(mut self, name: &str, capacity: i64) -> Self {
        self.persistent_volumes.push(json!({
            "name": name,
            "capacity": capacity,
            "accessMode": "ReadWriteOnce",
            "storageClassName": "standard"
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "metadata": {
                "name": self.name,
                "namespace": self.namespace,
                "labels": {
                    "version": self.version,
                    "team": "team1",
                    "environment": "Dev",
                    "region": "STL"
                }
            },
            "spec": {
                "destination": self.destination,
                "components": self.components,
                "configMaps": self.config_maps,
                "persistentVolumes": self.persistent_volumes
            }
        })
    }
}

/// Builder for one component: a service, its containers and ingresses.
pub struct ComponentBuilder {
    service: String,
    ports: Vec<Value>,
    containers: Vec<Value>,
    ingresses: Vec<Value>,
}

impl ComponentBuilder {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            ports: vec![],
            containers: vec![],
            ingresses: vec![],
        }
    }

    pub fn port(mut self, name: &str, port: i64) -> Self {
        self.ports.push(json!({"name": name, "port": port}));
        self
    }

    pub fn port_with_target(mut self, name: &str, port: i64, target_port: i64) -> Self {
        self.ports.push(json!({
            "name": name,
            "port": port,
            "protocol": "TCP",
            "targetPort": target_port
        }));
        self
    }

    /// Adds a container; mounts are `(name, type, mountPath)`.
    pub fn container(
        mut self,
        name: &str,
        port_names: &[&str],
        mounts: &[(&str, &str, &str)],
    ) -> Self {
        let volumes: Vec<Value> = mounts
            .iter()
            .map(|(name, kind, path)| json!({"name": name, "type": kind, "mountPath": path}))
            .collect();
        self.containers.push(json!({
            "name": name,
            "image": format!("registry.example.com/{}", name),
            "imageTag": "1.0.0",
            "portNames": port_names,
            "volumes": volumes
        }));
        self
    }

    /// Adds an ingress; paths are `(path, portName)`.
    pub fn ingress(
        mut self,
        host: &str,
        service_name: Option<&str>,
        paths: &[(&str, &str)],
    ) -> Self {
        let paths: Vec<Value> = paths
            .iter()
            .map(|(path, port)| json!({"path": path, "portName": port}))
            .collect();
        let mut ingress = json!({"host": host, "paths": paths});
        if let Some(service_name) = service_name {
            ingress["serviceName"] = json!(service_name);
        }
        self.ingresses.push(ingress);
        self
    }

    pub fn build(self) -> Value {
        json!({
            "service": {"name": self.service, "ports": self.ports},
            "containers": self.containers,
            "ingresses": self.ingresses
        })
    }
}

/// One component `app1` with ports `http:8080` and `metrics:8081->8090/TCP`.
pub fn single_component_app() -> Value {
    ApplicationBuilder::new("app1")
        .component(
            ComponentBuilder::new("app1")
                .port("http", 8080)
                .port_with_target("metrics", 8081, 8090)
                .container("app1", &["http", "metrics"], &[]),
        )
        .build()
}

/// Two components sharing config maps and a volume, declared out of alphabetical order.
pub fn multi_component_app() -> Value {
    ApplicationBuilder::new("shop")
        .version("2.3.1")
        .component(
            ComponentBuilder::new("web")
                .port("http", 80)
                .container(
                    "web",
                    &["http"],
                    &[
                        ("settings", "ConfigMap", "/etc/web"),
                        ("assets", "PersistentVolume", "/srv/assets"),
                    ],
                )
                .container(
                    "sidecar",
                    &["http"],
                    &[
                        ("settings", "ConfigMap", "/etc/sidecar"),
                        ("assets", "PersistentVolume", "/srv/assets"),
                    ],
                )
                .ingress("shop.example.com", None, &[("/", "http")]),
        )
        .component(
            ComponentBuilder::new("api")
                .port("grpc", 9090)
                .container("api", &["grpc"], &[("settings", "ConfigMap", "/etc/api")]),
        )
        .config_map("settings", "LOG_LEVEL=info\nFEATURE_X=on")
        .config_map("certs", "ca.crt=placeholder")
        .persistent_volume("assets", 10)
        .build()
}
