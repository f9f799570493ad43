use std::path::Path;

use tracing::debug;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Loads a YAML or JSON config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), "Loading config");
    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    // YAML is a superset of JSON, so one parser covers both formats.
    let json_value: serde_json::Value = serde_yaml::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.template_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "templateDir must not be empty".to_string(),
        });
    }

    let author = &config.git.author;
    if !author.email.contains('@') {
        return Err(ConfigError::Validation {
            message: format!("git author email {:?} must contain '@'", author.email),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{Protocol, ServiceType};
    use assert_fs::prelude::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.template_dir, Path::new("templates"));
        assert_eq!(
            config.git.credentials.password_env_var,
            "DEPLOY_WIZARD_GIT_PASSWORD"
        );
    }

    #[test]
    fn test_yaml_config() {
        let config = load_config_from_str(
            r#"
templateDir: /etc/deploy-wizard/templates
git:
  insecureSkipVerify: true
  author:
    name: Release Bot
    email: release@example.com
  credentials:
    username: deployer
    passwordFile: /run/secrets/git-password
defaults:
  targetRevision: main
  serviceType: LoadBalancer
  protocol: UDP
"#,
        )
        .unwrap();

        assert_eq!(config.template_dir, Path::new("/etc/deploy-wizard/templates"));
        assert!(config.git.insecure_skip_verify);
        assert_eq!(config.git.author.name, "Release Bot");
        assert_eq!(config.git.credentials.username.as_deref(), Some("deployer"));
        assert_eq!(config.defaults.target_revision, "main");
        assert_eq!(config.defaults.path, "/");
        assert_eq!(config.defaults.service_type, ServiceType::LoadBalancer);
        assert_eq!(config.defaults.protocol, Protocol::Udp);
    }

    #[test]
    fn test_json_config() {
        let config = load_config_from_str(r#"{"git": {"author": {"name": "ci"}}}"#).unwrap();
        assert_eq!(config.git.author.name, "ci");
        assert_eq!(config.git.author.email, "deploy-wizard@localhost");
    }

    #[test]
    fn test_schema_rejects_unknown_and_invalid_fields() {
        let err = load_config_from_str("templateDirectory: x\ndefaults:\n  protocol: SCTP\n")
            .unwrap_err();
        match err {
            ConfigError::SchemaValidation { errors } => {
                assert!(errors.contains("templateDirectory"), "{}", errors);
                assert!(errors.contains("SCTP"), "{}", errors);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_schema_rejects_non_object() {
        let err = load_config_from_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = load_config_from_str("git: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("deploy-wizard.yaml");
        file.write_str("templateDir: ./tpl\n").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.template_dir, Path::new("./tpl"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/deploy-wizard.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_author_email_must_look_like_an_address() {
        let err = load_config_from_str("git:\n  author:\n    email: nobody\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
