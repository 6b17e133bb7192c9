use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub mod schema;
pub mod validation;

pub use schema::{HostSpec, ImageConfig};
pub use validation::ValidationError;

/// Load and parse an input document
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ImageConfig> {
    let path = path.as_ref();
    info!("Loading configuration from {}", path.display());

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: ImageConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON in config file: {}", path.display()))?;

    debug!("Loaded configuration with {} host(s)", config.hosts.len());
    Ok(config)
}

/// Load a document and run the license and address checks without
/// touching any image
pub fn validate_config_file<P: AsRef<Path>>(path: P) -> Result<ImageConfig> {
    let path = path.as_ref();
    let config = load_config(path)?;

    validation::check_license(&config)?;

    let violations = validation::report_violations(&config);
    if violations > 0 {
        return Err(ValidationError::InvalidDocument(violations))
            .with_context(|| format!("Invalid configuration in file: {}", path.display()));
    }

    info!("Configuration file is valid");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_document(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config() {
        let file = write_document(
            r#"{"esxiIsoFileName": "base.iso", "isoMdSum": "abc",
                "AcceptEsxiLicenseAgreement": "Yes", "hosts": []}"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.esxi_iso_file_name, "base.iso");
    }

    #[test]
    fn test_load_config_rejects_malformed_json() {
        let file = write_document("{ not json");

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_validate_config_file_rejects_license() {
        let file = write_document(
            r#"{"esxiIsoFileName": "base.iso", "isoMdSum": "abc",
                "AcceptEsxiLicenseAgreement": "No", "hosts": []}"#,
        );

        let err = validate_config_file(file.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::LicenseNotAccepted)
        );
    }

    #[test]
    fn test_validate_config_file_rejects_bad_address() {
        let file = write_document(
            r#"{"esxiIsoFileName": "base.iso", "isoMdSum": "abc",
                "AcceptEsxiLicenseAgreement": "Yes", "dns": ["1.2.3"], "hosts": []}"#,
        );

        let err = validate_config_file(file.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::InvalidDocument(1))
        );
    }
}
