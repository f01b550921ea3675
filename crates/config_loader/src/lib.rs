//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON route files
//! - Collect route files from directories and merge them
//! - Validate configuration legality
//! - Generate `RouteBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("routes.toml")).unwrap();
//! println!("Routes: {}", blueprint.routes.len());
//! ```

mod parser;
mod validator;

pub use contracts::RouteBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::{Path, PathBuf};

/// Blueprint merged from one or more route files
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Merged and validated blueprint
    pub blueprint: RouteBlueprint,

    /// Files that contributed to the blueprint, in merge order
    pub sources: Vec<PathBuf>,
}

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RouteBlueprint, ContractError> {
        let blueprint = Self::parse_file(path)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RouteBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load and merge every route file found at the given locations
    ///
    /// A location is either a file or a directory; a directory contributes
    /// its `.toml` / `.json` files in lexical order (not recursive). The
    /// merged blueprint is validated as a whole, so a component declared in
    /// one file can be used by a route in a later one.
    ///
    /// # Errors
    /// - Location missing or containing no route files
    /// - Any file failing to parse
    /// - Validation failure of the merged blueprint
    pub fn load_from_locations(locations: &[PathBuf]) -> Result<LoadedConfig, ContractError> {
        let sources = Self::collect_sources(locations)?;

        let mut blueprint = RouteBlueprint::default();
        for source in &sources {
            blueprint.merge(Self::parse_file(source)?);
        }
        validator::validate(&blueprint)?;

        Ok(LoadedConfig { blueprint, sources })
    }

    /// Validate an already built blueprint
    pub fn validate(blueprint: &RouteBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize RouteBlueprint to TOML string
    pub fn to_toml(blueprint: &RouteBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RouteBlueprint to JSON string
    pub fn to_json(blueprint: &RouteBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_file(path: &Path) -> Result<RouteBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        parser::parse(&content, format).map_err(|e| match e {
            ContractError::ConfigParse { message, source } => ContractError::ConfigParse {
                message: format!("{}: {message}", path.display()),
                source,
            },
            other => other,
        })
    }

    /// Expand locations into the ordered list of route files
    fn collect_sources(locations: &[PathBuf]) -> Result<Vec<PathBuf>, ContractError> {
        let mut sources = Vec::new();
        for location in locations {
            if location.is_dir() {
                let mut found: Vec<PathBuf> = std::fs::read_dir(location)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| {
                        path.is_file()
                            && path
                                .extension()
                                .and_then(|e| e.to_str())
                                .and_then(ConfigFormat::from_extension)
                                .is_some()
                    })
                    .collect();
                found.sort();
                if found.is_empty() {
                    return Err(ContractError::config_parse(format!(
                        "no route files (.toml/.json) found in {}",
                        location.display()
                    )));
                }
                sources.extend(found);
            } else if location.is_file() {
                sources.push(location.clone());
            } else {
                return Err(ContractError::config_parse(format!(
                    "configuration location not found: {}",
                    location.display()
                )));
            }
        }
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ComponentRegistration;

    const MINIMAL_TOML: &str = r#"
[[components]]
name = "log"
label = "log"

[[components]]
name = "lll"
alias_of = "log"
label = "aaa"

[[routes]]
id = "js"
from = "timer:js?period=1s"
body = "js"
to = ["log:js", "lll:js"]
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.routes[0].id, "js");
        assert_eq!(
            bp.components[1].registration(),
            ComponentRegistration::Alias("log")
        );
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.routes[0].from, bp2.routes[0].from);
        assert_eq!(bp.components.len(), bp2.components.len());
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.routes[0].to, bp2.routes[0].to);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[routes]]
id = "js"
from = "timer:js?period=1s"
body = "js"
to = ["lll:js"]
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.js");
        std::fs::write(&path, "from('timer:js')").unwrap();
        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"), "got: {err}");
    }

    #[test]
    fn test_load_from_locations_merges_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("10-components.toml"),
            r#"
[[components]]
name = "lll"
kind = "log"
label = "aaa"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("20-routes.json"),
            r#"{ "routes": [{ "id": "js", "from": "timer:js?period=1s", "body": "js", "to": ["log:js", "lll:js"] }] }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let loaded = ConfigLoader::load_from_locations(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(loaded.sources.len(), 2);
        assert!(loaded.sources[0].ends_with("10-components.toml"));
        assert_eq!(loaded.blueprint.components.len(), 1);
        assert_eq!(loaded.blueprint.routes.len(), 1);
    }

    #[test]
    fn test_load_from_locations_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_locations(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("no route files"), "got: {err}");
    }

    #[test]
    fn test_load_from_locations_missing_path() {
        let err =
            ConfigLoader::load_from_locations(&[PathBuf::from("/definitely/not/here.toml")])
                .unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }
}
