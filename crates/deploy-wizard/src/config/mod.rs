//! Service configuration: template location, git access and payload defaults.

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{Config, GitCredentialSettings, GitSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings() -> GitCredentialSettings {
        GitCredentialSettings {
            username_env_var: "DEPLOY_WIZARD_TEST_GIT_USER".to_string(),
            password_env_var: "DEPLOY_WIZARD_TEST_GIT_PASS".to_string(),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_no_credentials_is_anonymous() {
        std::env::remove_var("DEPLOY_WIZARD_TEST_GIT_USER");
        std::env::remove_var("DEPLOY_WIZARD_TEST_GIT_PASS");

        assert!(settings().resolve().unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_credentials_from_env() {
        std::env::set_var("DEPLOY_WIZARD_TEST_GIT_USER", "deployer");
        std::env::set_var("DEPLOY_WIZARD_TEST_GIT_PASS", "s3cret");

        let credentials = settings().resolve().unwrap().unwrap();
        assert_eq!(credentials.username, "deployer");
        assert_eq!(credentials.password.expose_secret(), "s3cret");

        std::env::remove_var("DEPLOY_WIZARD_TEST_GIT_USER");
        std::env::remove_var("DEPLOY_WIZARD_TEST_GIT_PASS");
    }

    #[test]
    #[serial]
    fn test_direct_username_with_password_file() {
        std::env::remove_var("DEPLOY_WIZARD_TEST_GIT_PASS");
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();

        let credentials = GitCredentialSettings {
            username: Some("deployer".to_string()),
            password_file: Some(file.path().to_str().unwrap().to_string()),
            ..settings()
        }
        .resolve()
        .unwrap()
        .unwrap();
        assert_eq!(credentials.password.expose_secret(), "from-file");
    }

    #[test]
    #[serial]
    fn test_partial_credentials_are_rejected() {
        std::env::remove_var("DEPLOY_WIZARD_TEST_GIT_PASS");
        let err = GitCredentialSettings {
            username: Some("deployer".to_string()),
            ..settings()
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_unreadable_password_file() {
        let err = GitCredentialSettings {
            username: Some("deployer".to_string()),
            password_file: Some("/nonexistent/password".to_string()),
            ..settings()
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Secret {
                field: "password",
                ..
            }
        ));
    }
}
