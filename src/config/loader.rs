//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::CompileError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Route compilation failed: {0}")]
    Compile(#[from] CompileError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{PathMatchType, PrecedencePolicy};
    use std::io::Write;

    const MATCHING_ACROSS_ROUTES: &str = r#"
        [listener]
        bind_address = "127.0.0.1:8080"

        [matching]
        precedence = "path-first"

        [[backends]]
        name = "infra-backend-v1"
        namespace = "gateway-conformance-infra"
        address = "127.0.0.1:3001"

        [[backends]]
        name = "infra-backend-v2"
        namespace = "gateway-conformance-infra"
        address = "127.0.0.1:3002"

        [[routes]]
        name = "matching-part1"
        namespace = "gateway-conformance-infra"
        hostnames = ["example.com", "example.net"]

        [[routes.rules]]
        backend = { name = "infra-backend-v1" }

        [[routes.rules.matches]]
        path = { type = "PathPrefix", value = "/" }

        [[routes.rules.matches]]
        headers = [{ name = "version", value = "one" }]

        [[routes]]
        name = "matching-part2"
        namespace = "gateway-conformance-infra"
        hostnames = ["example.com"]

        [[routes.rules]]
        backend = { name = "infra-backend-v2" }

        [[routes.rules.matches]]
        path = { type = "PathPrefix", value = "/v2" }

        [[routes.rules.matches]]
        headers = [{ name = "version", value = "two" }]
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(MATCHING_ACROSS_ROUTES).unwrap();
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.matching.precedence, PrecedencePolicy::PathFirst);

        let part1 = &config.routes[0];
        assert_eq!(part1.rules[0].matches.len(), 2);
        assert_eq!(
            part1.rules[0].matches[0].path.as_ref().unwrap().match_type,
            PathMatchType::PathPrefix
        );
        assert!(part1.rules[0].matches[1].path.is_none());
        assert_eq!(part1.rules[0].backend.namespace, None);

        // Untouched sections keep their defaults.
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.admin.enabled);
    }

    #[test]
    fn test_unrecognized_match_type_rejected() {
        let content = MATCHING_ACROSS_ROUTES.replace("\"PathPrefix\", value = \"/v2\"", "\"RegularExpression\", value = \"/v2\"");
        assert!(matches!(parse_config(&content), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_failure_surfaces_all_errors() {
        let content = MATCHING_ACROSS_ROUTES
            .replace("name = \"infra-backend-v2\" }", "name = \"infra-backend-v3\" }")
            .replace("value = \"/v2\"", "value = \"v2\"");
        match parse_config(&content) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MATCHING_ACROSS_ROUTES.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backends.len(), 2);

        let missing = load_config(Path::new("/nonexistent/gateway.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
