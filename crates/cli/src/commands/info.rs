//! `info` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use contracts::{RouteBlueprint, RouteConfig, BUILTIN_LOG_COMPONENT};
use serde::Serialize;
use tracing::info;

use super::load_config;
use super::run::describe_registration;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sources: Vec<String>,
    components: Vec<ComponentInfo>,
    routes: Vec<RouteInfo>,
}

#[derive(Serialize)]
struct ComponentInfo {
    name: String,
    registration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

#[derive(Serialize)]
struct RouteInfo {
    id: String,
    from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    period_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_count: Option<u64>,
    body: String,
    header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dispatch_timeout_ms: Option<u64>,
    to: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(locations = ?args.config, "Loading configuration info");

    let loaded = load_config(&args.config).context("Failed to load configuration")?;
    let sources: Vec<String> = loaded
        .sources
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    if args.json {
        let info = build_config_info(&loaded.blueprint, sources);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&loaded.blueprint, &sources);
    }

    Ok(())
}

fn build_config_info(blueprint: &RouteBlueprint, sources: Vec<String>) -> ConfigInfo {
    let mut components = Vec::with_capacity(blueprint.components.len() + 1);
    if !blueprint
        .components
        .iter()
        .any(|c| c.name == BUILTIN_LOG_COMPONENT)
    {
        components.push(ComponentInfo {
            name: BUILTIN_LOG_COMPONENT.to_string(),
            registration: "builtin".to_string(),
            label: Some(BUILTIN_LOG_COMPONENT.to_string()),
            params: HashMap::new(),
        });
    }
    components.extend(blueprint.components.iter().map(|c| ComponentInfo {
        name: c.name.clone(),
        registration: describe_registration(c),
        label: c.label.clone(),
        params: c.params.clone(),
    }));

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sources,
        components,
        routes: blueprint.routes.iter().map(route_info).collect(),
    }
}

fn route_info(route: &RouteConfig) -> RouteInfo {
    let timer = route.timer_spec().ok();
    RouteInfo {
        id: route.id.clone(),
        from: route.from.clone(),
        period_ms: timer.as_ref().map(|t| t.period.as_millis() as u64),
        delay_ms: timer.as_ref().map(|t| t.delay.as_millis() as u64),
        repeat_count: timer.as_ref().map(|t| t.repeat_count),
        body: route.body.clone(),
        header: route.header.clone(),
        seed: route.seed,
        dispatch_timeout_ms: route.dispatch_timeout_ms,
        to: route.to.clone(),
    }
}

fn print_config_info(blueprint: &RouteBlueprint, sources: &[String]) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Timer Route Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📄 Files ({})", sources.len());
    for (i, source) in sources.iter().enumerate() {
        let prefix = if i == sources.len() - 1 { "└─" } else { "├─" };
        println!("   {} {}", prefix, source);
    }

    let info = build_config_info(blueprint, Vec::new());

    println!("\n🧩 Components ({})", info.components.len());
    for (i, component) in info.components.iter().enumerate() {
        let prefix = if i == info.components.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} ({}, label={})",
            prefix,
            component.name,
            component.registration,
            component.label.as_deref().unwrap_or(&component.name)
        );
    }

    println!("\n⏱  Routes ({})", info.routes.len());
    for (i, route) in info.routes.iter().enumerate() {
        let is_last = i == info.routes.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, route.id, route.from);
        println!(
            "   {}  ├─ body={}, header={}, seed={}",
            child_prefix,
            route.body,
            route.header,
            route
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string())
        );
        println!("   {}  └─ to: {}", child_prefix, route.to.join(" -> "));
    }

    println!();
}
