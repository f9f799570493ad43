use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use deploy_wizard::{Config, ErrorTree, MemoryBackend, Pipeline, ReleaseError};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Exit status for payloads that fail validation.
const EXIT_INVALID: u8 = 2;

/// Exit status for render and repository failures.
const EXIT_RELEASE_FAILED: u8 = 3;

#[derive(Serialize)]
struct FailureResponse<'a> {
    code: Option<u16>,
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ErrorTree>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            deploy_wizard::load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

/// Reads a JSON or YAML payload into an untyped value.
fn read_payload(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse payload {}", path.display()))
}

fn pipeline(config: &Config) -> Result<Pipeline> {
    Pipeline::from_config(config).with_context(|| {
        format!(
            "failed to open templates in {}",
            config.template_dir.display()
        )
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_errors(errors: &ErrorTree) {
    for (path, message) in errors.flatten() {
        if path.is_empty() {
            eprintln!("{}", message);
        } else {
            eprintln!("{}: {}", path, message);
        }
    }
}

pub fn validate(config: &Config, payload: &Path) -> Result<ExitCode> {
    let payload = read_payload(payload)?;
    let errors = pipeline(config)?.check(&payload);

    if errors.is_empty() {
        println!("{{}}");
        return Ok(ExitCode::SUCCESS);
    }

    print_json(&errors)?;
    print_errors(&errors);
    Ok(ExitCode::from(EXIT_INVALID))
}

pub fn preview(config: &Config, payload: &Path) -> Result<ExitCode> {
    let payload = read_payload(payload)?;
    match pipeline(config)?.preview(&payload) {
        Ok(document) => {
            print!("{}", document);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report_failure(&e),
    }
}

pub fn release(config: &Config, payload: &Path, dry_run: bool) -> Result<ExitCode> {
    let payload = read_payload(payload)?;
    let pipeline = pipeline(config)?;

    let result = if dry_run {
        let mut backend = MemoryBackend::new();
        let report = pipeline.release(&payload, &mut backend);
        if report.is_ok() {
            for (path, content) in backend.files() {
                info!(path = %path, bytes = content.len(), "Would publish");
            }
        }
        report
    } else {
        let backend = config
            .git
            .backend()
            .context("failed to resolve git credentials")?;
        pipeline.release(&payload, backend)
    };

    match result {
        Ok(report) => {
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report_failure(&e),
    }
}

fn report_failure(error: &ReleaseError) -> Result<ExitCode> {
    print_json(&FailureResponse {
        code: error.code(),
        message: error.to_string(),
        retryable: error.is_retryable(),
        errors: error.validation_errors(),
    })?;

    match error.validation_errors() {
        Some(errors) => {
            print_errors(errors);
            Ok(ExitCode::from(EXIT_INVALID))
        }
        None => Ok(ExitCode::from(EXIT_RELEASE_FAILED)),
    }
}
