//! Validating payloads through the pipeline, defaults included.

mod common;

use serde_json::json;

use common::*;
use deploy_wizard::{apply_defaults, parse_application, validate_payload};

#[test]
fn test_built_payloads_are_valid() {
    for payload in [single_component_app(), multi_component_app()] {
        let errors = pipeline().check(&payload);
        assert!(errors.is_empty(), "unexpected errors: {}", errors);
    }
}

#[test]
fn test_unknown_ingress_service() {
    let payload = ApplicationBuilder::new("app1")
        .component(
            ComponentBuilder::new("app1")
                .port("http", 8080)
                .container("app1", &["http"], &[])
                .ingress("app1.example.com", Some("frontend"), &[("/", "http")]),
        )
        .build();

    let errors = pipeline().check(&payload);

    assert_eq!(
        errors.flatten(),
        vec![(
            "spec.components[0].ingresses[0].serviceName".to_string(),
            "\"frontend\" does not match an existing service".to_string()
        )]
    );
    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({
            "spec": {
                "components": {
                    "0": {
                        "ingresses": {
                            "0": {"serviceName": "\"frontend\" does not match an existing service"}
                        }
                    }
                }
            }
        })
    );
    assert!(errors.get("metadata").is_none());
}

#[test]
fn test_errors_in_independent_branches_accumulate() {
    let payload = ApplicationBuilder::new("app1")
        .destination("not a url")
        .component(
            ComponentBuilder::new("app1")
                .port("http", 8080)
                .container("app1", &["http"], &[("missing", "ConfigMap", "/etc/app")])
                .ingress("app1.example.com", None, &[("/", "admin")]),
        )
        .persistent_volume("data", 0)
        .build();

    let errors = pipeline().check(&payload);
    let paths: Vec<String> = errors.flatten().into_iter().map(|(path, _)| path).collect();

    assert_eq!(
        paths,
        vec![
            "spec.components[0].containers[0].volumes[0].name",
            "spec.components[0].ingresses[0].paths[0].portName",
            "spec.destination.url",
            "spec.persistentVolumes[0].capacity",
        ]
    );
}

#[test]
fn test_missing_metadata_stops_at_root() {
    let mut payload = single_component_app();
    payload.as_object_mut().unwrap().remove("metadata");
    payload["spec"]["components"] = json!("not a list");

    let errors = pipeline().check(&payload);
    assert_eq!(errors.len(), 1);
    assert!(errors.root_error().is_some());
}

#[test]
fn test_defaults_are_applied_before_validation() {
    let payload = single_component_app();

    let raw = validate_payload(&payload);
    assert!(raw.message("spec.destination.targetRevision").is_some(), "{}", raw);
    assert!(raw.message("spec.components[0].service.type").is_some(), "{}", raw);

    assert!(pipeline().check(&payload).is_empty());
}

#[test]
fn test_defaulting_is_idempotent() {
    let app = parse_application(&multi_component_app()).unwrap();
    let once = apply_defaults(app);
    let twice = apply_defaults(once.clone());
    assert_eq!(once, twice);
}
