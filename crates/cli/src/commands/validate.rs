//! `validate` command implementation.

use std::collections::HashSet;

use anyhow::{Context, Result};
use contracts::{Endpoint, RouteBlueprint, BUILTIN_LOG_COMPONENT};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    locations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    component_count: usize,
    route_count: usize,
    binding_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(locations = ?args.config, "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let locations = args
        .config
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    match load_config(&args.config) {
        Ok(loaded) => {
            let blueprint = &loaded.blueprint;
            let warnings = collect_warnings(blueprint);

            ValidationResult {
                valid: true,
                locations,
                sources: loaded
                    .sources
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect(),
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    component_count: blueprint.components.len(),
                    route_count: blueprint.routes.len(),
                    binding_count: blueprint.routes.iter().map(|r| r.to.len()).sum(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            locations,
            sources: Vec::new(),
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RouteBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.routes.is_empty() {
        warnings.push("No routes configured - nothing will run".to_string());
    }

    let mut used = HashSet::new();
    for route in &blueprint.routes {
        let mut seen = HashSet::new();
        for uri in &route.to {
            if !seen.insert(uri.as_str()) {
                warnings.push(format!(
                    "Route '{}' delivers to '{}' more than once",
                    route.id, uri
                ));
            }
            if let Ok(endpoint) = uri.parse::<Endpoint>() {
                used.insert(endpoint.scheme);
            }
        }
    }

    for component in &blueprint.components {
        if component.name != BUILTIN_LOG_COMPONENT && !used.contains(&component.name) {
            warnings.push(format!(
                "Component '{}' is not used by any route",
                component.name
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    let locations = result.locations.join(", ");
    if result.valid {
        println!("✓ Configuration is valid: {}", locations);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Files: {}", result.sources.len());
            println!("  Components: {}", summary.component_count);
            println!("  Routes: {}", summary.route_count);
            println!("  Sink bindings: {}", summary.binding_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", locations);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
